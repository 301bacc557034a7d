//! Shutdown coordination between the consumer and the background loops
//!
//! Stopping is cooperative. The coordinator cancels a shared [`CancelToken`]
//! and closes a shutdown channel that every loop selects on, so blocked loops
//! wake immediately. Each loop owns an [`Acknowledgement`] that reports its
//! exit when dropped, which also covers loops that unwind from a panic.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use ksolve_engine::CancelToken;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Identifies one background loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LoopId {
    Generator,
    Worker(usize),
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generator => write!(f, "generator"),
            Self::Worker(id) => write!(f, "worker {}", id),
        }
    }
}

/// Lifecycle of the pool as seen by [`DeferredSolver::stop`](crate::DeferredSolver::stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Background loops are running
    Running,
    /// Stop was signalled; some loops have not acknowledged yet
    StopRequested,
    /// Every loop acknowledged termination
    AllAcknowledged,
}

/// Read side of the stop signal, cloned into every loop
#[derive(Debug, Clone)]
pub(crate) struct ShutdownSignal {
    token: CancelToken,
    closed: Receiver<()>,
}

impl ShutdownSignal {
    /// Token passed down into engine searches
    pub(crate) fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Channel that disconnects once stop is requested; meant for `select!`
    pub(crate) fn closed(&self) -> &Receiver<()> {
        &self.closed
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Reports a loop's termination when dropped
#[derive(Debug)]
pub(crate) struct Acknowledgement {
    id: LoopId,
    tx: Sender<LoopId>,
}

impl Acknowledgement {
    pub(crate) fn id(&self) -> LoopId {
        self.id
    }
}

impl Drop for Acknowledgement {
    fn drop(&mut self) {
        let _ = self.tx.send(self.id);
    }
}

/// Everything one background loop needs to take part in shutdown
#[derive(Debug)]
pub(crate) struct LoopHandle {
    pub(crate) signal: ShutdownSignal,
    pub(crate) ack: Acknowledgement,
}

/// Owned by the consumer; broadcasts stop and waits for acknowledgements
#[derive(Debug)]
pub(crate) struct ShutdownCoordinator {
    token: CancelToken,
    close_tx: Option<Sender<()>>,
    ack_rx: Receiver<LoopId>,
    expected: HashSet<LoopId>,
    acknowledged: HashSet<LoopId>,
    state: ShutdownState,
}

impl ShutdownCoordinator {
    /// Create a coordinator and one handle per loop in `ids`
    pub(crate) fn new(ids: impl IntoIterator<Item = LoopId>) -> (Self, Vec<LoopHandle>) {
        let token = CancelToken::new();
        // Nothing is ever sent: dropping the sender is the broadcast.
        let (close_tx, close_rx) = bounded(0);
        let (ack_tx, ack_rx) = unbounded();

        let handles: Vec<LoopHandle> = ids
            .into_iter()
            .map(|id| LoopHandle {
                signal: ShutdownSignal {
                    token: token.clone(),
                    closed: close_rx.clone(),
                },
                ack: Acknowledgement {
                    id,
                    tx: ack_tx.clone(),
                },
            })
            .collect();
        let expected = handles.iter().map(|h| h.ack.id()).collect();

        let coordinator = Self {
            token,
            close_tx: Some(close_tx),
            ack_rx,
            expected,
            acknowledged: HashSet::new(),
            state: ShutdownState::Running,
        };
        (coordinator, handles)
    }

    pub(crate) fn state(&self) -> ShutdownState {
        self.state
    }

    /// Signal every loop without waiting
    pub(crate) fn request_stop(&mut self) {
        if self.state == ShutdownState::Running {
            self.token.cancel();
            self.close_tx.take();
            self.state = ShutdownState::StopRequested;
        }
    }

    /// Signal every loop and block until all of them acknowledged.
    ///
    /// Returns immediately once every loop has acknowledged before.
    pub(crate) fn stop(&mut self) {
        if self.state == ShutdownState::AllAcknowledged {
            return;
        }
        self.request_stop();

        while self.acknowledged.len() < self.expected.len() {
            match self.ack_rx.recv() {
                Ok(id) => {
                    debug!(loop_id = %id, "loop acknowledged shutdown");
                    self.acknowledged.insert(id);
                }
                Err(_) => {
                    // Every handle is gone, so nothing is left running.
                    warn!(
                        outstanding = self.expected.len() - self.acknowledged.len(),
                        "acknowledgement channel closed early"
                    );
                    break;
                }
            }
        }
        self.state = ShutdownState::AllAcknowledged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn ids(workers: usize) -> Vec<LoopId> {
        std::iter::once(LoopId::Generator)
            .chain((0..workers).map(LoopId::Worker))
            .collect()
    }

    #[test]
    fn test_signal_reaches_every_handle() {
        let (mut coordinator, handles) = ShutdownCoordinator::new(ids(2));
        assert_eq!(handles.len(), 3);
        assert!(handles.iter().all(|h| !h.signal.is_requested()));
        assert!(handles[0].signal.closed().try_recv().is_err());

        coordinator.request_stop();
        assert_eq!(coordinator.state(), ShutdownState::StopRequested);
        for handle in &handles {
            assert!(handle.signal.is_requested());
            assert!(handle.signal.token().is_cancelled());
            assert!(handle.signal.closed().recv().is_err());
        }
    }

    #[test]
    fn test_stop_waits_for_every_acknowledgement() {
        let (mut coordinator, handles) = ShutdownCoordinator::new(ids(3));

        let threads: Vec<_> = handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| {
                thread::spawn(move || {
                    let _ = handle.signal.closed().recv();
                    thread::sleep(Duration::from_millis(5 * i as u64));
                    drop(handle.ack);
                })
            })
            .collect();

        coordinator.stop();
        assert_eq!(coordinator.state(), ShutdownState::AllAcknowledged);
        assert_eq!(coordinator.acknowledged.len(), 4);

        for t in threads {
            t.join().unwrap();
        }
    }

    #[test]
    fn test_stop_twice_is_noop() {
        let (mut coordinator, handles) = ShutdownCoordinator::new(ids(1));
        drop(handles);

        coordinator.stop();
        coordinator.stop();
        assert_eq!(coordinator.state(), ShutdownState::AllAcknowledged);
    }

    #[test]
    fn test_acknowledgement_on_panic() {
        let (mut coordinator, mut handles) = ShutdownCoordinator::new(ids(0));
        let handle = handles.remove(0);

        let joined = thread::spawn(move || {
            let _ack = handle.ack;
            panic!("loop failed");
        })
        .join();
        assert!(joined.is_err());

        coordinator.stop();
        assert!(coordinator.acknowledged.contains(&LoopId::Generator));
    }
}
