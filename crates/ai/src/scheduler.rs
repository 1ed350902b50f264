use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::job::AiJob;
use crate::result::ForecastError;

/// Scheduler/executor for AI jobs.
///
/// This is intentionally minimal and storage/runtime agnostic. Results come
/// back in submission order.
pub trait AiScheduler: Send + Sync + 'static {
    fn run<J: AiJob>(&self, job: J) -> Result<J::Output, ForecastError> {
        job.run()
    }

    fn run_all<J: AiJob>(&self, jobs: Vec<J>) -> Vec<Result<J::Output, ForecastError>> {
        jobs.iter().map(J::run).collect()
    }
}

/// Simple synchronous scheduler that runs jobs immediately in-process.
#[derive(Debug, Copy, Clone, Default)]
pub struct LocalAiScheduler;

impl LocalAiScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl AiScheduler for LocalAiScheduler {}

/// Runs independent jobs on up to `workers` scoped threads.
///
/// Each job owns its model state, so workers share nothing except the job
/// queue index.
#[derive(Debug, Copy, Clone)]
pub struct ThreadedAiScheduler {
    workers: usize,
}

impl ThreadedAiScheduler {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// One worker per available CPU.
    pub fn from_available_parallelism() -> Self {
        Self::new(thread::available_parallelism().map_or(1, |n| n.get()))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl AiScheduler for ThreadedAiScheduler {
    fn run_all<J: AiJob>(&self, jobs: Vec<J>) -> Vec<Result<J::Output, ForecastError>> {
        let workers = self.workers.min(jobs.len());
        if workers <= 1 {
            return jobs.iter().map(J::run).collect();
        }

        let next = AtomicUsize::new(0);
        let slots: Vec<Mutex<Option<Result<J::Output, ForecastError>>>> =
            jobs.iter().map(|_| Mutex::new(None)).collect();

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(job) = jobs.get(i) else {
                            break;
                        };
                        let result = job.run();
                        *slots[i].lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                    }
                });
            }
        });

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.into_inner()
                    .unwrap_or_else(PoisonError::into_inner)
                    .unwrap_or_else(|| {
                        Err(ForecastError::Internal(format!("job {i} produced no result")))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demandcast_core::ProductId;

    /// Job that doubles its input, or fails on negative input.
    #[derive(Debug)]
    struct DoubleJob {
        product_id: ProductId,
        value: i64,
    }

    impl AiJob for DoubleJob {
        type Input = i64;
        type Output = i64;

        fn product_id(&self) -> ProductId {
            self.product_id
        }

        fn input(&self) -> &i64 {
            &self.value
        }

        fn run(&self) -> Result<i64, ForecastError> {
            if self.value < 0 {
                return Err(ForecastError::invalid_config("negative"));
            }
            Ok(self.value * 2)
        }
    }

    fn jobs(values: &[i64]) -> Vec<DoubleJob> {
        values
            .iter()
            .map(|&value| DoubleJob {
                product_id: ProductId::new(),
                value,
            })
            .collect()
    }

    #[test]
    fn local_scheduler_runs_in_order() {
        let results = LocalAiScheduler::new().run_all(jobs(&[1, 2, 3]));
        assert_eq!(results, vec![Ok(2), Ok(4), Ok(6)]);
    }

    #[test]
    fn threaded_scheduler_preserves_submission_order() {
        let values: Vec<i64> = (0..50).collect();
        let results = ThreadedAiScheduler::new(4).run_all(jobs(&values));
        let expected: Vec<Result<i64, ForecastError>> = values.iter().map(|v| Ok(v * 2)).collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn failures_are_isolated_per_job() {
        let results = ThreadedAiScheduler::new(3).run_all(jobs(&[5, -1, 7]));
        assert_eq!(results[0], Ok(10));
        assert!(matches!(results[1], Err(ForecastError::InvalidConfig(_))));
        assert_eq!(results[2], Ok(14));
    }

    #[test]
    fn empty_batch_yields_no_results() {
        let results = ThreadedAiScheduler::new(8).run_all(Vec::<DoubleJob>::new());
        assert!(results.is_empty());
    }

    #[test]
    fn worker_count_is_at_least_one() {
        assert_eq!(ThreadedAiScheduler::new(0).workers(), 1);
        let single = ThreadedAiScheduler::new(1).run(DoubleJob {
            product_id: ProductId::new(),
            value: 21,
        });
        assert_eq!(single, Ok(42));
    }
}
