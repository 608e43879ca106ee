pub mod http;
pub mod offline;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// One test case as shipped to the sandbox. Deliberately carries only the
/// input/output data; problem identity and metadata are stripped before the
/// job leaves the process.
#[derive(Debug, Clone, Serialize)]
pub struct JudgeTestCase {
    /// Program stdin.
    pub input: String,
    /// Expected stdout; empty for ad-hoc dry runs.
    pub expected_output: String,
}

/// A grading request for one piece of code.
#[derive(Debug, Clone, Serialize)]
pub struct JudgeJob {
    /// Source code to compile and run.
    pub code: String,
    /// Language identifier understood by the judge.
    pub language: String,
    /// Cases the code is graded against.
    pub test_cases: Vec<JudgeTestCase>,
}

/// Outcome of one test case.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseResult {
    /// Whether the produced output matched the expected output.
    pub passed: bool,
    /// Captured stdout, when the judge reports it.
    pub output: Option<String>,
    /// Runtime error output, when the case crashed.
    pub error: Option<String>,
}

/// Aggregated grading outcome for one job.
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeVerdict {
    /// Number of cases that passed.
    pub num_correct: usize,
    /// Total number of graded cases.
    pub num_test_cases: usize,
    /// Total runtime, when reported.
    pub runtime_ms: Option<f64>,
    /// Compiler output when the code failed to build.
    pub compilation_error: Option<String>,
    /// Per-case outcomes, in job order.
    pub results: Vec<CaseResult>,
}

/// Errors surfaced by a judge backend. All of them are retryable from the
/// caller's point of view; no state is mutated when one is returned.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// The judge could not be reached.
    #[error("judge unreachable: {0}")]
    Unreachable(String),
    /// The round trip exceeded the configured timeout.
    #[error("judge request timed out")]
    Timeout,
    /// The judge answered with an error.
    #[error("judge rejected the request: {0}")]
    Rejected(String),
}

/// Abstraction over the external code-grading service.
pub trait Judge: Send + Sync {
    /// Grade `job`, returning the verdict or a retryable error.
    fn execute(&self, job: JudgeJob) -> BoxFuture<'static, Result<JudgeVerdict, JudgeError>>;
}
