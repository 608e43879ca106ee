use futures::future::BoxFuture;
use tracing::warn;

use crate::{
    config::JudgeConfig,
    judge::{Judge, JudgeError, JudgeJob, JudgeVerdict},
};

/// Judge backend talking to a sandbox service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpJudge {
    client: reqwest::Client,
    execute_url: String,
}

impl HttpJudge {
    /// Build a client from the judge configuration. The configured timeout
    /// bounds the whole round trip, connection included.
    pub fn new(config: &JudgeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let execute_url = format!("{}/execute", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            execute_url,
        })
    }
}

impl Judge for HttpJudge {
    fn execute(&self, job: JudgeJob) -> BoxFuture<'static, Result<JudgeVerdict, JudgeError>> {
        let client = self.client.clone();
        let url = self.execute_url.clone();

        Box::pin(async move {
            let response = client
                .post(&url)
                .json(&job)
                .send()
                .await
                .map_err(classify_send_error)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(%status, "judge returned an error response");
                return Err(JudgeError::Rejected(format!("status {status}: {body}")));
            }

            response
                .json::<JudgeVerdict>()
                .await
                .map_err(|err| JudgeError::Rejected(format!("malformed verdict: {err}")))
        })
    }
}

fn classify_send_error(err: reqwest::Error) -> JudgeError {
    if err.is_timeout() {
        JudgeError::Timeout
    } else {
        JudgeError::Unreachable(err.to_string())
    }
}
