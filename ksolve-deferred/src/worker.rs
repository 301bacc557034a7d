//! Worker loop: one engine, one attempt at a time

use crate::job::{Job, SolvedResult};
use crate::shutdown::LoopHandle;
use crate::stats::PoolStats;
use crossbeam_channel::{Receiver, Sender, select};
use ksolve_engine::{CancelToken, SolverEngine};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Drive `engine` through seed, reset and bounded search for one job.
///
/// Returns the result to publish when the outcome counts as solved.
pub(crate) fn attempt<E: SolverEngine>(
    engine: &mut E,
    job: Job,
    budget: u64,
    cancel: &CancelToken,
) -> Option<SolvedResult> {
    engine.set_draw_count(job.draw_count);
    engine.seed(job.seed);
    engine.reset_to_initial_deal();

    let outcome = engine.attempt_bounded_search(budget, cancel);
    if !outcome.is_solved() {
        trace!(seed = job.seed, draw_count = %job.draw_count, %outcome, "attempt discarded");
        return None;
    }

    trace!(
        seed = job.seed,
        solved_cards = engine.solved_card_count(),
        "attempt solved"
    );
    Some(SolvedResult {
        seed: job.seed,
        draw_count: job.draw_count,
        moves: engine.describe_moves(),
    })
}

/// One slot of the worker pool
pub(crate) struct Worker<E> {
    id: usize,
    engine: E,
    search_budget: u64,
    jobs: Receiver<Job>,
    results: Sender<SolvedResult>,
    stats: Arc<PoolStats>,
}

impl<E: SolverEngine> Worker<E> {
    pub(crate) fn new(
        id: usize,
        engine: E,
        search_budget: u64,
        jobs: Receiver<Job>,
        results: Sender<SolvedResult>,
        stats: Arc<PoolStats>,
    ) -> Self {
        Self {
            id,
            engine,
            search_budget,
            jobs,
            results,
            stats,
        }
    }

    /// Pull jobs until shutdown; the handle acknowledges when this returns
    pub(crate) fn run(mut self, handle: LoopHandle) {
        let LoopHandle { signal, ack } = handle;
        debug!(worker = self.id, "worker started");

        loop {
            let job = select! {
                recv(signal.closed()) -> _ => break,
                recv(self.jobs) -> job => match job {
                    Ok(job) => job,
                    Err(_) => {
                        warn!(worker = self.id, "job queue closed, worker exiting");
                        break;
                    }
                },
            };
            // Both arms may be ready at once; never start a search after stop.
            if signal.is_requested() {
                break;
            }

            let solved = attempt(&mut self.engine, job, self.search_budget, signal.token());
            self.stats.record_attempt(solved.is_some());

            if let Some(result) = solved {
                debug!(worker = self.id, seed = result.seed, draw_count = %result.draw_count, "deal solved");
                if self.results.send(result).is_err() {
                    warn!(worker = self.id, "result queue closed, worker exiting");
                    break;
                }
            }
        }

        debug!(loop_id = %ack.id(), "worker exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::{LoopId, ShutdownCoordinator};
    use crossbeam_channel::unbounded;
    use ksolve_engine::{DrawCount, SolveOutcome};
    use std::thread;
    use std::time::Duration;

    /// Engine whose outcome is `seed % 5 - 2` as a raw code
    #[derive(Default)]
    struct CodeEngine {
        draw_count: DrawCount,
        seed: i64,
        calls: Vec<&'static str>,
    }

    impl SolverEngine for CodeEngine {
        fn set_draw_count(&mut self, draw_count: DrawCount) {
            self.calls.push("draw");
            self.draw_count = draw_count;
        }
        fn draw_count(&self) -> DrawCount {
            self.draw_count
        }
        fn seed(&mut self, seed: i64) -> i64 {
            self.calls.push("seed");
            self.seed = seed;
            seed
        }
        fn reset_to_initial_deal(&mut self) {
            self.calls.push("reset");
        }
        fn attempt_bounded_search(&mut self, _budget: u64, _cancel: &CancelToken) -> SolveOutcome {
            self.calls.push("search");
            SolveOutcome::from_code((self.seed % 5) as i32 - 2)
        }
        fn describe_moves(&self) -> String {
            format!("moves for {}", self.seed)
        }
        fn render_initial_diagram(&self) -> String {
            format!("deal {}", self.seed)
        }
        fn solved_card_count(&self) -> u32 {
            52
        }
    }

    fn job(seed: i64, draw: u8) -> Job {
        Job {
            seed,
            draw_count: DrawCount::new(draw).unwrap(),
        }
    }

    #[test]
    fn test_attempt_call_order() {
        let mut engine = CodeEngine::default();
        attempt(&mut engine, job(3, 2), 10, &CancelToken::new());
        assert_eq!(engine.calls, vec!["draw", "seed", "reset", "search"]);
        assert_eq!(engine.draw_count.get(), 2);
    }

    #[test]
    fn test_attempt_accepts_only_unit_magnitude() {
        let mut engine = CodeEngine::default();
        // seed % 5 - 2: 0 -> -2, 1 -> -1, 2 -> 0, 3 -> 1, 4 -> 2
        let accepted: Vec<i64> = (0..5)
            .filter(|&seed| attempt(&mut engine, job(seed, 1), 10, &CancelToken::new()).is_some())
            .collect();
        assert_eq!(accepted, vec![1, 3]);
    }

    #[test]
    fn test_attempt_result_matches_job() {
        let mut engine = CodeEngine::default();
        let result = attempt(&mut engine, job(8, 3), 10, &CancelToken::new()).unwrap();
        assert_eq!(result.seed, 8);
        assert_eq!(result.draw_count.get(), 3);
        assert_eq!(result.moves, "moves for 8");
    }

    #[test]
    fn test_worker_publishes_solved_and_stops() {
        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let stats = Arc::new(PoolStats::default());
        let (mut coordinator, mut handles) = ShutdownCoordinator::new([LoopId::Worker(0)]);
        let worker = Worker::new(
            0,
            CodeEngine::default(),
            10,
            job_rx,
            result_tx,
            Arc::clone(&stats),
        );
        let handle = handles.remove(0);
        let thread = thread::spawn(move || worker.run(handle));

        // The last job is solvable, so its result implies every attempt ran.
        for seed in 0..9 {
            job_tx.send(job(seed, 1)).unwrap();
        }
        let seeds: Vec<i64> = (0..4)
            .map(|_| result_rx.recv_timeout(Duration::from_secs(5)).unwrap().seed)
            .collect();
        assert_eq!(seeds, vec![1, 3, 6, 8]);

        coordinator.stop();
        thread.join().unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.solved, 4);
        assert_eq!(snapshot.attempts, 9);
        assert_eq!(snapshot.discarded, 5);
    }

    #[test]
    fn test_no_attempt_after_stop_requested() {
        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let stats = Arc::new(PoolStats::default());
        let (mut coordinator, mut handles) = ShutdownCoordinator::new([LoopId::Worker(0)]);
        for seed in 0..5 {
            job_tx.send(job(seed * 5 + 1, 1)).unwrap();
        }
        let pending = job_rx.clone();

        coordinator.request_stop();
        let worker = Worker::new(
            0,
            CodeEngine::default(),
            10,
            job_rx,
            result_tx,
            Arc::clone(&stats),
        );
        let handle = handles.remove(0);
        thread::spawn(move || worker.run(handle)).join().unwrap();
        coordinator.stop();

        // Every queued job is solvable, so any attempt would have published.
        assert_eq!(stats.snapshot().attempts, 0);
        assert!(result_rx.is_empty());
        assert!(pending.len() >= 4);
    }

    #[test]
    fn test_idle_worker_stops_promptly() {
        let (_job_tx, job_rx) = unbounded::<Job>();
        let (result_tx, _result_rx) = unbounded();
        let (mut coordinator, mut handles) = ShutdownCoordinator::new([LoopId::Worker(0)]);
        let worker = Worker::new(
            0,
            CodeEngine::default(),
            10,
            job_rx,
            result_tx,
            Arc::new(PoolStats::default()),
        );
        let handle = handles.remove(0);
        let thread = thread::spawn(move || worker.run(handle));

        coordinator.stop();
        thread.join().unwrap();
        assert_eq!(coordinator.state(), crate::ShutdownState::AllAcknowledged);
    }
}
