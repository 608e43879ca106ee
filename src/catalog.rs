//! Problem bank collaborator: supplies problems for new matches.

use dashmap::DashMap;
use futures::future::BoxFuture;
use rand::seq::IteratorRandom;
use thiserror::Error;
use uuid::Uuid;

use crate::state::problem::{Difficulty, Problem};

/// Errors returned by a problem bank.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The bank cannot supply the requested number of problems.
    #[error("insufficient problems: requested {requested}, only {available} available")]
    Insufficient {
        /// How many problems the caller asked for.
        requested: usize,
        /// How many matching problems the bank holds.
        available: usize,
    },
    /// An explicitly selected problem does not exist.
    #[error("problem `{0}` not found")]
    NotFound(Uuid),
}

/// Abstraction over the problem bank.
pub trait Catalog: Send + Sync {
    /// Pick `count` random problems matching the requested difficulty.
    fn pick_random(
        &self,
        difficulty: Difficulty,
        count: usize,
    ) -> BoxFuture<'static, Result<Vec<Problem>, CatalogError>>;

    /// Resolve an explicit selection, preserving the given order.
    fn find_many(&self, ids: Vec<Uuid>) -> BoxFuture<'static, Result<Vec<Problem>, CatalogError>>;
}

/// Problem bank held in process memory, seeded at startup.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    problems: DashMap<Uuid, Problem>,
}

impl InMemoryCatalog {
    /// Create a bank seeded with the given problems.
    pub fn with_problems(problems: Vec<Problem>) -> Self {
        let catalog = Self::default();
        for problem in problems {
            catalog.problems.insert(problem.id, problem);
        }
        catalog
    }

    /// Add or replace a problem in the bank.
    pub fn insert(&self, problem: Problem) {
        self.problems.insert(problem.id, problem);
    }

    /// Number of problems currently held.
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// Whether the bank holds no problems.
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn pick_random(
        &self,
        difficulty: Difficulty,
        count: usize,
    ) -> BoxFuture<'static, Result<Vec<Problem>, CatalogError>> {
        let matching: Vec<Problem> = self
            .problems
            .iter()
            .filter(|entry| difficulty.accepts(entry.difficulty))
            .map(|entry| entry.value().clone())
            .collect();

        let result = if matching.len() < count {
            Err(CatalogError::Insufficient {
                requested: count,
                available: matching.len(),
            })
        } else {
            let mut rng = rand::rng();
            Ok(matching.into_iter().choose_multiple(&mut rng, count))
        };

        Box::pin(async move { result })
    }

    fn find_many(&self, ids: Vec<Uuid>) -> BoxFuture<'static, Result<Vec<Problem>, CatalogError>> {
        let result = ids
            .into_iter()
            .map(|id| {
                self.problems
                    .get(&id)
                    .map(|entry| entry.value().clone())
                    .ok_or(CatalogError::NotFound(id))
            })
            .collect::<Result<Vec<Problem>, CatalogError>>();

        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::problem::TestCase;

    fn problem(difficulty: Difficulty) -> Problem {
        Problem {
            id: Uuid::new_v4(),
            name: "sum".into(),
            description: "add two numbers".into(),
            difficulty,
            test_cases: vec![TestCase {
                input: "1 2".into(),
                expected_output: "3".into(),
                hidden: false,
            }],
        }
    }

    #[tokio::test]
    async fn pick_random_respects_difficulty() {
        let catalog = InMemoryCatalog::with_problems(vec![
            problem(Difficulty::Easy),
            problem(Difficulty::Hard),
        ]);

        let picked = catalog.pick_random(Difficulty::Easy, 1).await.unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].difficulty, Difficulty::Easy);
    }

    #[tokio::test]
    async fn pick_random_reports_shortfall() {
        let catalog = InMemoryCatalog::with_problems(vec![problem(Difficulty::Easy)]);

        let err = catalog.pick_random(Difficulty::Easy, 3).await.unwrap_err();
        match err {
            CatalogError::Insufficient {
                requested,
                available,
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_many_preserves_selection_order() {
        let first = problem(Difficulty::Easy);
        let second = problem(Difficulty::Medium);
        let ids = vec![second.id, first.id];
        let catalog = InMemoryCatalog::with_problems(vec![first, second]);

        let found = catalog.find_many(ids.clone()).await.unwrap();
        assert_eq!(
            found.iter().map(|p| p.id).collect::<Vec<_>>(),
            ids,
        );

        let missing = catalog.find_many(vec![Uuid::new_v4()]).await;
        assert!(matches!(missing, Err(CatalogError::NotFound(_))));
    }
}
