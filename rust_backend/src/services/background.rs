//! Off-thread grid evaluation for async hosts.
//!
//! Evaluation is CPU-bound, so it runs on tokio's blocking pool. Cancelling
//! means dropping or aborting the returned handle and discarding the result;
//! a task that already started runs to completion.

use tokio::task::JoinHandle;

use crate::cache::SharedContributionCache;
use crate::core::LightSource;
use crate::services::grid_field::{GridEvaluator, GridField};

/// Evaluates `sources` on the blocking pool.
pub fn spawn_grid_evaluation(
    evaluator: GridEvaluator,
    sources: Vec<LightSource>,
) -> JoinHandle<GridField> {
    tokio::task::spawn_blocking(move || evaluator.evaluate(&sources))
}

/// Evaluates `sources` on the blocking pool through a shared cache.
pub fn spawn_cached_grid_evaluation(
    evaluator: GridEvaluator,
    sources: Vec<LightSource>,
    cache: SharedContributionCache,
) -> JoinHandle<GridField> {
    tokio::task::spawn_blocking(move || {
        let mut cache = cache;
        evaluator.evaluate_cached(&sources, &mut cache)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ContributionCache;
    use crate::core::{GrowArea, Point};

    fn fixtures() -> Vec<LightSource> {
        vec![
            LightSource::new(1, Point::new(2.0, 2.0), 2.0, 900.0),
            LightSource::new(2, Point::new(6.0, 2.0), 2.0, 900.0),
        ]
    }

    #[tokio::test]
    async fn test_background_matches_inline() {
        let evaluator = GridEvaluator::new(GrowArea::new(8.0, 4.0), 0.5).unwrap();
        let inline = evaluator.evaluate(&fixtures());
        let field = spawn_grid_evaluation(evaluator, fixtures()).await.unwrap();
        assert_eq!(field.values(), inline.values());
    }

    #[tokio::test]
    async fn test_parallel_candidates_share_cache() {
        let evaluator = GridEvaluator::new(GrowArea::new(8.0, 4.0), 1.0).unwrap();
        let cache = SharedContributionCache::new();

        let first = spawn_cached_grid_evaluation(evaluator, fixtures(), cache.clone());
        let second = spawn_cached_grid_evaluation(evaluator, fixtures(), cache.clone());
        let (a, b) = (first.await.unwrap(), second.await.unwrap());

        assert_eq!(a.values(), b.values());
        assert_eq!(cache.len(), 64);
    }

    #[tokio::test]
    async fn test_aborted_evaluation_is_discarded() {
        let evaluator = GridEvaluator::new(GrowArea::new(8.0, 4.0), 1.0).unwrap();
        let handle = spawn_grid_evaluation(evaluator, fixtures());
        handle.abort();
        // Either it finished before the abort or it reports cancellation.
        match handle.await {
            Ok(field) => assert_eq!(field.values().len(), 32),
            Err(e) => assert!(e.is_cancelled()),
        }
    }
}
