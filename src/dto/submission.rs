use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::format_system_time,
    judge::{CaseResult, JudgeVerdict},
    state::session::Submission,
};

/// Payload used to submit a solution for grading.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitRequest {
    /// Submitting player.
    pub user_id: Uuid,
    /// Index of the attempted problem.
    pub problem_index: usize,
    /// Source code to grade.
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    /// Language identifier.
    #[validate(length(min = 1, message = "language must not be empty"))]
    pub language: String,
}

/// Payload used for an ad-hoc dry run against a single custom input.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RunRequest {
    /// Requesting player.
    pub user_id: Uuid,
    /// Index of the problem the run relates to.
    pub problem_index: usize,
    /// Source code to run.
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    /// Language identifier.
    #[validate(length(min = 1, message = "language must not be empty"))]
    pub language: String,
    /// Custom stdin for the dry run.
    #[serde(default)]
    pub input: String,
}

/// Public projection of one graded attempt.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionDto {
    /// Index of the attempted problem.
    pub problem_index: usize,
    /// Language the code was graded as.
    pub language: String,
    /// Number of test cases passed.
    pub num_correct: usize,
    /// Total number of graded test cases.
    pub num_test_cases: usize,
    /// Runtime reported by the judge, when available.
    pub runtime_ms: Option<f64>,
    /// Compiler output when the code failed to build.
    pub compilation_error: Option<String>,
    /// Per-case outcomes. Hidden cases appear without revealing their input.
    pub results: Vec<CaseResult>,
    /// When the attempt was recorded, RFC 3339.
    pub submitted_at: String,
}

impl From<&Submission> for SubmissionDto {
    fn from(submission: &Submission) -> Self {
        Self {
            problem_index: submission.problem_index,
            language: submission.language.clone(),
            num_correct: submission.num_correct,
            num_test_cases: submission.num_test_cases,
            runtime_ms: submission.runtime_ms,
            compilation_error: submission.compilation_error.clone(),
            results: submission.results.clone(),
            submitted_at: format_system_time(submission.submitted_at),
        }
    }
}

/// Result of an ad-hoc dry run. Nothing is recorded on the player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunResultDto {
    /// Outcome of the single dry-run case.
    pub results: Vec<CaseResult>,
    /// Runtime reported by the judge, when available.
    pub runtime_ms: Option<f64>,
    /// Compiler output when the code failed to build.
    pub compilation_error: Option<String>,
}

impl From<JudgeVerdict> for RunResultDto {
    fn from(verdict: JudgeVerdict) -> Self {
        Self {
            results: verdict.results,
            runtime_ms: verdict.runtime_ms,
            compilation_error: verdict.compilation_error,
        }
    }
}
