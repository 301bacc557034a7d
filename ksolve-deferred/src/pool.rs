//! The deferred solver: wiring, consumer API and teardown

use crate::cache::ResultCache;
use crate::config::{PoolConfig, ValidatedConfig};
use crate::error::PoolError;
use crate::generator::{Generator, Throttle};
use crate::job::SolvedGame;
use crate::shutdown::{LoopId, ShutdownCoordinator, ShutdownState};
use crate::stats::{PoolStats, StatsSnapshot};
use crate::worker::Worker;
use crossbeam_channel::{Receiver, unbounded};
use ksolve_engine::{DrawCount, EngineFactory, SolverEngine};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Background thread pool plus the channel its exit handler reports on
struct PoolThreads {
    pool: rayon::ThreadPool,
    exited: Receiver<usize>,
    count: usize,
}

impl PoolThreads {
    fn build(count: usize) -> Result<Self, PoolError> {
        let (exit_tx, exited) = unbounded();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(count)
            .thread_name(|i| format!("ksolve-pool-{}", i))
            .panic_handler(|payload| {
                error!(panic = %panic_message(&*payload), "background loop panicked");
            })
            .exit_handler(move |i| {
                let _ = exit_tx.send(i);
            })
            .build()
            .map_err(|e| PoolError::ThreadPool(e.to_string()))?;

        Ok(Self {
            pool,
            exited,
            count,
        })
    }

    /// Tear the pool down and block until every thread has exited
    fn join(self) {
        let Self {
            pool,
            exited,
            count,
        } = self;
        drop(pool);

        for _ in 0..count {
            match exited.recv() {
                Ok(i) => debug!(thread = i, "pool thread exited"),
                // The handler is dropped with the last thread.
                Err(_) => break,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// A warm pool of solved Klondike deals, one bucket per draw count.
///
/// Construction starts a generator loop and `workers` worker loops in the
/// background. Each worker owns its own engine; the consumer owns one more,
/// used to render diagrams for results as they are drained.
///
/// ```no_run
/// use ksolve_deferred::{DeferredSolver, PoolConfig};
/// # use ksolve_engine::{CancelToken, DrawCount, SolveOutcome, SolverEngine};
/// # #[derive(Default)]
/// # struct MyEngine;
/// # impl SolverEngine for MyEngine {
/// #     fn set_draw_count(&mut self, _: DrawCount) {}
/// #     fn draw_count(&self) -> DrawCount { DrawCount::default() }
/// #     fn seed(&mut self, seed: i64) -> i64 { seed }
/// #     fn reset_to_initial_deal(&mut self) {}
/// #     fn attempt_bounded_search(&mut self, _: u64, _: &CancelToken) -> SolveOutcome {
/// #         SolveOutcome::SolvedMinimal
/// #     }
/// #     fn describe_moves(&self) -> String { String::new() }
/// #     fn render_initial_diagram(&self) -> String { String::new() }
/// #     fn solved_card_count(&self) -> u32 { 52 }
/// # }
///
/// let config = PoolConfig::default().with_draw_counts([1, 3]).with_workers(2);
/// let mut solver = DeferredSolver::new(config, MyEngine::default)?;
///
/// let game = solver.get_solved(3)?;
/// println!("deal {}\n{}\n{}", game.seed, game.diagram, game.moves);
///
/// solver.stop();
/// # Ok::<(), ksolve_deferred::PoolError>(())
/// ```
pub struct DeferredSolver<E> {
    config: ValidatedConfig,
    cache: ResultCache<E>,
    stats: Arc<PoolStats>,
    coordinator: ShutdownCoordinator,
    threads: Option<PoolThreads>,
}

impl<E: SolverEngine> DeferredSolver<E> {
    /// Validate `config` and start the background loops.
    ///
    /// Nothing is spawned if validation fails.
    pub fn new<F>(config: PoolConfig, factory: F) -> Result<Self, PoolError>
    where
        F: EngineFactory<Engine = E>,
        E: 'static,
    {
        let config = config.validate()?;
        let threads = PoolThreads::build(config.workers() + 1)?;

        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let stats = Arc::new(PoolStats::default());

        let ids = std::iter::once(LoopId::Generator).chain((0..config.workers()).map(LoopId::Worker));
        let (coordinator, handles) = ShutdownCoordinator::new(ids);

        let cache = ResultCache::new(
            factory.create(),
            config.draw_counts(),
            result_rx.clone(),
            Arc::clone(&stats),
        );

        let mut generator = Some(Generator::new(
            config.draw_counts().to_vec(),
            Throttle::new(config.throttle_limit()),
            config.generator_idle(),
            job_tx,
            result_rx,
            Arc::clone(&stats),
        ));
        let factory = Arc::new(factory);

        for handle in handles {
            match handle.ack.id() {
                LoopId::Generator => {
                    if let Some(generator) = generator.take() {
                        threads.pool.spawn(move || generator.run(handle));
                    }
                }
                LoopId::Worker(id) => {
                    let factory = Arc::clone(&factory);
                    let jobs = job_rx.clone();
                    let results = result_tx.clone();
                    let stats = Arc::clone(&stats);
                    let budget = config.search_budget();
                    threads.pool.spawn(move || {
                        let engine = factory.create();
                        Worker::new(id, engine, budget, jobs, results, stats).run(handle);
                    });
                }
            }
        }

        info!(
            draw_counts = ?config.draw_counts().iter().map(|dc| dc.get()).collect::<Vec<_>>(),
            cache_target = config.cache_target(),
            workers = config.workers(),
            search_budget = config.search_budget(),
            "deferred solver started"
        );

        Ok(Self {
            config,
            cache,
            stats,
            coordinator,
            threads: Some(threads),
        })
    }

    fn checked(&self, draw_count: u8) -> Result<DrawCount, PoolError> {
        let draw_count = self
            .config
            .lookup(draw_count)
            .ok_or(PoolError::UnknownDrawCount(draw_count))?;
        if self.coordinator.state() != ShutdownState::Running {
            return Err(PoolError::Stopped);
        }
        Ok(draw_count)
    }

    /// Oldest solved deal for `draw_count`, blocking until one is available
    pub fn get_solved(&mut self, draw_count: u8) -> Result<SolvedGame, PoolError> {
        let draw_count = self.checked(draw_count)?;
        self.cache.take(draw_count, None)
    }

    /// Like [`get_solved`](Self::get_solved), giving up after `timeout`.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn get_solved_timeout(
        &mut self,
        draw_count: u8,
        timeout: Duration,
    ) -> Result<SolvedGame, PoolError> {
        let draw_count = self.checked(draw_count)?;
        self.cache.take(draw_count, Instant::now().checked_add(timeout))
    }

    /// Solved deals already materialized for `draw_count`
    pub fn cached(&self, draw_count: u8) -> usize {
        self.config
            .lookup(draw_count)
            .map_or(0, |dc| self.cache.len(dc))
    }

    /// Current pipeline counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Configured draw counts in round-robin order
    pub fn draw_counts(&self) -> &[DrawCount] {
        self.config.draw_counts()
    }

    /// Where the pool is in its shutdown sequence
    pub fn shutdown_state(&self) -> ShutdownState {
        self.coordinator.state()
    }

    /// Signal shutdown and block until every loop and pool thread is gone.
    ///
    /// A search already in progress is not interrupted beyond what the engine
    /// does with its cancel token, so this can take up to one full search
    /// budget. Calling it again is a no-op.
    pub fn stop(&mut self) {
        let Some(threads) = self.threads.take() else {
            return;
        };
        info!("stopping deferred solver");
        self.coordinator.stop();
        threads.join();

        let stats = self.stats.snapshot();
        if stats.solved > stats.materialized {
            warn!(
                undrained = stats.solved - stats.materialized,
                "solved results discarded at shutdown"
            );
        }
        info!(?stats, "deferred solver stopped");
    }
}

impl<E> Drop for DeferredSolver<E> {
    fn drop(&mut self) {
        if let Some(threads) = self.threads.take() {
            self.coordinator.stop();
            threads.join();
        }
    }
}
