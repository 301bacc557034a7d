//! Job generation with result-depth throttling

use crate::job::{Job, MAX_SEED, SolvedResult};
use crate::shutdown::LoopHandle;
use crate::stats::PoolStats;
use crossbeam_channel::{Receiver, Sender, select};
use ksolve_engine::DrawCount;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Decides whether the generator may submit another job
#[derive(Debug, Clone, Copy)]
pub(crate) struct Throttle {
    limit: usize,
}

impl Throttle {
    pub(crate) fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Submit only while fewer than `limit` results are waiting and no job is queued.
    ///
    /// The empty-queue guard keeps at most one job in the queue, so slow
    /// workers never build up a backlog for draw counts already oversupplied.
    pub(crate) fn should_submit(&self, results_pending: usize, jobs_empty: bool) -> bool {
        results_pending < self.limit && jobs_empty
    }
}

/// The single background loop feeding the job queue
pub(crate) struct Generator {
    draw_counts: Vec<DrawCount>,
    next: usize,
    throttle: Throttle,
    idle: Duration,
    jobs: Sender<Job>,
    results: Receiver<SolvedResult>,
    stats: Arc<PoolStats>,
}

impl Generator {
    pub(crate) fn new(
        draw_counts: Vec<DrawCount>,
        throttle: Throttle,
        idle: Duration,
        jobs: Sender<Job>,
        results: Receiver<SolvedResult>,
        stats: Arc<PoolStats>,
    ) -> Self {
        Self {
            draw_counts,
            next: 0,
            throttle,
            idle,
            jobs,
            results,
            stats,
        }
    }

    /// Next job: uniformly random seed, draw counts in round-robin order
    fn next_job<R: Rng>(&mut self, rng: &mut R) -> Job {
        let draw_count = self.draw_counts[self.next];
        self.next = (self.next + 1) % self.draw_counts.len();
        Job {
            seed: rng.random_range(0..=MAX_SEED),
            draw_count,
        }
    }

    /// Run until the shutdown channel closes, then acknowledge by dropping the handle
    pub(crate) fn run(mut self, handle: LoopHandle) {
        let LoopHandle { signal, ack } = handle;
        let mut rng = rand::rng();
        debug!(draw_counts = self.draw_counts.len(), "generator started");

        loop {
            if self
                .throttle
                .should_submit(self.results.len(), self.jobs.is_empty())
            {
                let job = self.next_job(&mut rng);
                if self.jobs.send(job).is_err() {
                    warn!("job queue closed, generator exiting");
                    break;
                }
                self.stats.record_job();
                trace!(seed = job.seed, draw_count = %job.draw_count, "job enqueued");
            }

            select! {
                recv(signal.closed()) -> _ => break,
                default(self.idle) => {}
            }
        }

        debug!(loop_id = %ack.id(), "generator exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::{LoopId, ShutdownCoordinator};
    use crossbeam_channel::unbounded;
    use std::thread;

    fn draw_counts(values: &[u8]) -> Vec<DrawCount> {
        values.iter().map(|&v| DrawCount::new(v).unwrap()).collect()
    }

    struct Harness {
        coordinator: ShutdownCoordinator,
        jobs: Receiver<Job>,
        results: Sender<SolvedResult>,
        stats: Arc<PoolStats>,
        thread: thread::JoinHandle<()>,
    }

    fn spawn_generator(values: &[u8], limit: usize) -> Harness {
        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let stats = Arc::new(PoolStats::default());
        let (coordinator, mut handles) = ShutdownCoordinator::new([LoopId::Generator]);
        let generator = Generator::new(
            draw_counts(values),
            Throttle::new(limit),
            Duration::from_millis(1),
            job_tx,
            result_rx,
            Arc::clone(&stats),
        );
        let handle = handles.remove(0);
        let thread = thread::spawn(move || generator.run(handle));

        Harness {
            coordinator,
            jobs: job_rx,
            results: result_tx,
            stats,
            thread,
        }
    }

    #[test]
    fn test_throttle_policy() {
        let throttle = Throttle::new(4);
        assert!(throttle.should_submit(0, true));
        assert!(throttle.should_submit(3, true));
        assert!(!throttle.should_submit(4, true));
        assert!(!throttle.should_submit(0, false));
    }

    #[test]
    fn test_round_robin_and_seed_range() {
        let (job_tx, _job_rx) = unbounded();
        let (_result_tx, result_rx) = unbounded();
        let mut generator = Generator::new(
            draw_counts(&[1, 3, 7]),
            Throttle::new(1),
            Duration::from_millis(1),
            job_tx,
            result_rx,
            Arc::new(PoolStats::default()),
        );
        let mut rng = rand::rng();

        let jobs: Vec<_> = (0..7).map(|_| generator.next_job(&mut rng)).collect();
        let order: Vec<u8> = jobs.iter().map(|j| j.draw_count.get()).collect();
        assert_eq!(order, vec![1, 3, 7, 1, 3, 7, 1]);
        assert!(jobs.iter().all(|j| (0..=MAX_SEED).contains(&j.seed)));
    }

    #[test]
    fn test_generator_alternates_draw_counts() {
        let mut harness = spawn_generator(&[1, 3], 10);

        let order: Vec<u8> = (0..6)
            .map(|_| {
                harness
                    .jobs
                    .recv_timeout(Duration::from_secs(5))
                    .unwrap()
                    .draw_count
                    .get()
            })
            .collect();
        assert_eq!(order, vec![1, 3, 1, 3, 1, 3]);

        harness.coordinator.stop();
        harness.thread.join().unwrap();
    }

    #[test]
    fn test_single_job_in_queue() {
        let mut harness = spawn_generator(&[1], 10);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(harness.jobs.len(), 1);
        assert_eq!(harness.stats.snapshot().jobs_generated, 1);

        harness.coordinator.stop();
        harness.thread.join().unwrap();
    }

    #[test]
    fn test_throttled_by_pending_results() {
        let mut harness = spawn_generator(&[1, 3], 2);
        for seed in 0..2 {
            harness
                .results
                .send(SolvedResult {
                    seed,
                    draw_count: DrawCount::new(1).unwrap(),
                    moves: String::new(),
                })
                .unwrap();
        }
        // The generator may have submitted one job before the results landed.
        thread::sleep(Duration::from_millis(20));
        let _ = harness.jobs.try_recv();

        thread::sleep(Duration::from_millis(50));
        assert!(harness.jobs.is_empty());

        harness.coordinator.stop();
        harness.thread.join().unwrap();
    }
}
