//! Consumer-side cache of solved deals, bucketed by draw count

use crate::error::PoolError;
use crate::job::{SolvedGame, SolvedResult};
use crate::stats::PoolStats;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use ksolve_engine::{DrawCount, SolverEngine};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Solved deals drained from the result queue, oldest first per draw count.
///
/// Owned by the consumer thread only. Diagrams are not carried through the
/// queue; each drained result is replayed through a private engine to render
/// its initial layout.
pub(crate) struct ResultCache<E> {
    engine: E,
    buckets: HashMap<DrawCount, VecDeque<SolvedGame>>,
    results: Receiver<SolvedResult>,
    stats: Arc<PoolStats>,
}

impl<E: SolverEngine> ResultCache<E> {
    pub(crate) fn new(
        engine: E,
        draw_counts: &[DrawCount],
        results: Receiver<SolvedResult>,
        stats: Arc<PoolStats>,
    ) -> Self {
        Self {
            engine,
            buckets: draw_counts.iter().map(|&dc| (dc, VecDeque::new())).collect(),
            results,
            stats,
        }
    }

    /// Entries currently materialized for `draw_count`
    pub(crate) fn len(&self, draw_count: DrawCount) -> usize {
        self.buckets.get(&draw_count).map_or(0, VecDeque::len)
    }

    /// Pop the oldest entry for `draw_count`, draining the result queue until one exists.
    ///
    /// Results for other draw counts drained along the way are kept in their
    /// own buckets. With a deadline, gives up with [`PoolError::Timeout`].
    pub(crate) fn take(
        &mut self,
        draw_count: DrawCount,
        deadline: Option<Instant>,
    ) -> Result<SolvedGame, PoolError> {
        loop {
            if let Some(game) = self
                .buckets
                .get_mut(&draw_count)
                .and_then(VecDeque::pop_front)
            {
                return Ok(game);
            }

            let result = match deadline {
                None => self.results.recv().map_err(|_| PoolError::Disconnected)?,
                Some(deadline) => self.results.recv_deadline(deadline).map_err(|e| match e {
                    RecvTimeoutError::Timeout => PoolError::Timeout,
                    RecvTimeoutError::Disconnected => PoolError::Disconnected,
                })?,
            };
            self.materialize(result);
        }
    }

    fn materialize(&mut self, result: SolvedResult) {
        self.engine.set_draw_count(result.draw_count);
        self.engine.seed(result.seed);
        self.engine.reset_to_initial_deal();
        let diagram = self.engine.render_initial_diagram();

        debug!(seed = result.seed, draw_count = %result.draw_count, "result materialized");
        self.stats.record_materialized();
        self.buckets
            .entry(result.draw_count)
            .or_default()
            .push_back(SolvedGame {
                seed: result.seed,
                diagram,
                moves: result.moves,
            });
    }
}
