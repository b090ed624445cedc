//! Parallel execution of independent recompute jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{catch_abort, SkuFinanceError};
use crate::SkuFinanceResult;

/// Shared flag that aborts a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Limits applied to one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker threads; `None` uses the rayon global pool
    pub max_parallelism: Option<usize>,
    /// Largest accepted batch; `None` uses `EngineConfig::max_batch_runs`
    pub max_runs: Option<usize>,
    pub cancel: Option<CancellationToken>,
}

impl BatchOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_parallelism: config.max_parallelism,
            max_runs: Some(config.max_batch_runs),
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

/// Run `job` over every item, in parallel, returning one outcome per item in
/// input order.
///
/// A batch larger than the run budget is rejected before anything runs. A
/// cancelled batch yields `Cancelled` and discards whatever had finished. A
/// job that fails or panics only fails its own outcome.
pub fn run_batch<J, R, F>(
    label: &str,
    items: &[J],
    options: &BatchOptions,
    config: &EngineConfig,
    job: F,
) -> SkuFinanceResult<Vec<SkuFinanceResult<R>>>
where
    J: Sync,
    R: Send,
    F: Fn(&J) -> SkuFinanceResult<R> + Sync + Send,
{
    let budget = options.max_runs.unwrap_or(config.max_batch_runs);
    if items.len() > budget {
        return Err(SkuFinanceError::InvalidInput {
            field: "max_runs".into(),
            reason: format!("{label} needs {} runs, budget is {budget}", items.len()),
        });
    }

    let start = Instant::now();
    let guarded = |item: &J| -> Option<SkuFinanceResult<R>> {
        if options.is_cancelled() {
            None
        } else {
            Some(catch_abort(label, || job(item)))
        }
    };

    let results: Vec<Option<SkuFinanceResult<R>>> =
        match options.max_parallelism.or(config.max_parallelism) {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads.max(1))
                    .build()
                    .map_err(|e| SkuFinanceError::ThreadPool(e.to_string()))?;
                pool.install(|| items.par_iter().map(guarded).collect())
            }
            None => items.par_iter().map(guarded).collect(),
        };

    if options.is_cancelled() {
        info!(batch = label, "batch cancelled");
        return Err(SkuFinanceError::Cancelled);
    }

    let out: Vec<SkuFinanceResult<R>> = results.into_iter().flatten().collect();
    info!(
        batch = label,
        runs = out.len(),
        failures = out.iter().filter(|r| r.is_err()).count(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "batch finished"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_preserved() {
        let items: Vec<u32> = (0..200).collect();
        let options = BatchOptions {
            max_parallelism: Some(4),
            ..BatchOptions::default()
        };
        let out = run_batch("square", &items, &options, &EngineConfig::default(), |x| Ok(x * x))
            .unwrap();
        let squares: Vec<u32> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(squares, items.iter().map(|x| x * x).collect::<Vec<_>>());
    }

    #[test]
    fn test_budget_rejected_up_front() {
        let items = vec![1, 2, 3];
        let options = BatchOptions {
            max_runs: Some(2),
            ..BatchOptions::default()
        };
        let err = run_batch("too_big", &items, &options, &EngineConfig::default(), |x| Ok(*x))
            .unwrap_err();
        assert!(matches!(err, SkuFinanceError::InvalidInput { .. }));
    }

    #[test]
    fn test_cancelled_batch_is_all_or_nothing() {
        let token = CancellationToken::new();
        let options = BatchOptions::default().with_cancel(token.clone());
        let items: Vec<u32> = (0..50).collect();
        let result = run_batch("cancel", &items, &options, &EngineConfig::default(), |x| {
            if *x == 10 {
                token.cancel();
            }
            Ok(*x)
        });
        assert_eq!(result.unwrap_err(), SkuFinanceError::Cancelled);
    }

    #[test]
    fn test_panicking_job_fails_alone() {
        let items: Vec<u32> = (0..8).collect();
        let out = run_batch("mixed", &items, &BatchOptions::default(), &EngineConfig::default(), |x| {
            if *x == 3 {
                panic!("Multiplication overflowed");
            }
            Ok(*x * 10)
        })
        .unwrap();
        assert_eq!(out.len(), 8);
        match &out[3] {
            Err(SkuFinanceError::Aborted { context, message }) => {
                assert_eq!(context, "mixed");
                assert!(message.contains("overflowed"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(out[7], Ok(70));
        assert_eq!(out.iter().filter(|r| r.is_ok()).count(), 7);
    }
}
