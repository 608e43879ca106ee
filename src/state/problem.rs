use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Difficulty bucket a problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Entry-level problems.
    Easy,
    /// Mid-tier problems.
    Medium,
    /// Hard problems.
    Hard,
    /// Any difficulty; used by room settings to disable filtering.
    Random,
}

impl Difficulty {
    /// Whether a problem of difficulty `other` satisfies this requested bucket.
    pub fn accepts(&self, other: Difficulty) -> bool {
        matches!(self, Difficulty::Random) || *self == other
    }
}

/// A single input/output pair a submission is graded against.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestCase {
    /// Input fed to the submitted program on stdin.
    pub input: String,
    /// Expected stdout for a correct solution.
    pub expected_output: String,
    /// Hidden cases are graded but never shown to players.
    #[serde(default)]
    pub hidden: bool,
}

/// A problem from the bank, with its full (hidden + visible) test-case set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    /// Stable identifier of the problem.
    pub id: Uuid,
    /// Short display name.
    pub name: String,
    /// Full problem statement.
    pub description: String,
    /// Difficulty bucket.
    pub difficulty: Difficulty,
    /// Graded test cases, visible ones first by convention.
    pub test_cases: Vec<TestCase>,
}

impl Problem {
    /// Test cases that may be shown to players.
    pub fn visible_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.test_cases.iter().filter(|case| !case.hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_accepts_everything() {
        assert!(Difficulty::Random.accepts(Difficulty::Easy));
        assert!(Difficulty::Random.accepts(Difficulty::Hard));
        assert!(Difficulty::Medium.accepts(Difficulty::Medium));
        assert!(!Difficulty::Medium.accepts(Difficulty::Hard));
    }
}
