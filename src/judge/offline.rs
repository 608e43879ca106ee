use futures::future::BoxFuture;

use crate::judge::{CaseResult, Judge, JudgeError, JudgeJob, JudgeVerdict};

/// Judge stand-in returning a canned all-pass verdict for every job.
///
/// Selected only through explicit configuration, for environments where no
/// sandbox is reachable. Never a silent fallback: the HTTP judge surfaces its
/// errors instead of degrading to this.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineJudge;

impl Judge for OfflineJudge {
    fn execute(&self, job: JudgeJob) -> BoxFuture<'static, Result<JudgeVerdict, JudgeError>> {
        let total = job.test_cases.len();
        let results = job
            .test_cases
            .into_iter()
            .map(|case| CaseResult {
                passed: true,
                output: Some(case.expected_output),
                error: None,
            })
            .collect();

        Box::pin(async move {
            Ok(JudgeVerdict {
                num_correct: total,
                num_test_cases: total,
                runtime_ms: Some(0.0),
                compilation_error: None,
                results,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeTestCase;

    #[tokio::test]
    async fn returns_full_marks_for_any_job() {
        let job = JudgeJob {
            code: "whatever".into(),
            language: "python".into(),
            test_cases: vec![
                JudgeTestCase {
                    input: "1".into(),
                    expected_output: "1".into(),
                },
                JudgeTestCase {
                    input: "2".into(),
                    expected_output: "4".into(),
                },
            ],
        };

        let verdict = OfflineJudge.execute(job).await.unwrap();
        assert_eq!(verdict.num_correct, 2);
        assert_eq!(verdict.num_test_cases, 2);
        assert!(verdict.results.iter().all(|result| result.passed));
    }
}
