//! One-at-a-time refresh gate with fan-out to late joiners.

use parking_lot::Mutex;
use schoolhouse_session::SessionError;
use tokio::sync::oneshot;

/// Outcome shared with every request waiting on a refresh.
pub(crate) type RefreshOutcome = Result<String, SessionError>;

#[derive(Debug, Default)]
struct GateState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Refresh-in-progress flag plus the queue of requests waiting on it.
///
/// The lock is only held to flip the flag or move senders in and out, never
/// across an await point.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
    state: Mutex<GateState>,
}

/// What a caller must do after entering the gate.
pub(crate) enum Turn<'a> {
    /// No refresh was running: the caller performs it.
    Lead(RefreshLease<'a>),
    /// A refresh is running: the caller awaits its outcome.
    Wait(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshGate {
    /// Check-and-set the flag, or join the queue if it is already set.
    pub(crate) fn enter(&self) -> Turn<'_> {
        let mut state = self.state.lock();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            Turn::Wait(rx)
        } else {
            state.refreshing = true;
            Turn::Lead(RefreshLease {
                gate: self,
                settled: false,
            })
        }
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    pub(crate) fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Clear the flag and hand the outcome to every queued waiter.
    fn release(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.state.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        let count = waiters.len();
        for waiter in waiters {
            // A waiter that went away does not care.
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

/// Held by the one caller performing a refresh.
///
/// Dropping an unsettled lease (e.g. the refreshing future was cancelled)
/// still clears the flag and fails every waiter.
pub(crate) struct RefreshLease<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Publish the outcome. Returns how many waiters were released.
    pub(crate) fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.gate.release(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.gate.release(&Err(SessionError::Interrupted));
        }
    }
}
