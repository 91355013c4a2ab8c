use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Waiting,
    Confirmed,
    /// The wait ended unconfirmed. Signals are refused from here on.
    Closed,
}

/// A flag set once by an external confirmation and awaited by the saga.
///
/// The flag lives in a watch channel, so a waiter that subscribes after the
/// flag flipped still sees it and a signal sent while nobody waits is kept.
/// Once the wait ends the gate settles: a later signal cannot change the
/// result the saga acted on.
#[derive(Debug)]
pub struct ConfirmationGate {
    state: watch::Sender<GateState>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Waiting);
        Self { state }
    }

    /// Sets the flag. Returns false if it was already set or the gate closed.
    pub fn signal(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == GateState::Waiting {
                *state = GateState::Confirmed;
                true
            } else {
                false
            }
        })
    }

    pub fn is_confirmed(&self) -> bool {
        *self.state.borrow() == GateState::Confirmed
    }

    pub fn is_closed(&self) -> bool {
        *self.state.borrow() == GateState::Closed
    }

    /// Refuses further signals unless already confirmed. Returns whether the
    /// gate ended confirmed.
    pub fn close(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == GateState::Waiting {
                *state = GateState::Closed;
                true
            } else {
                false
            }
        });
        self.is_confirmed()
    }

    /// Waits for the flag for at most `timeout`, then closes the gate and
    /// returns whether it was set.
    pub async fn await_until(&self, timeout: Duration) -> bool {
        let mut receiver = self.state.subscribe();
        let wait = receiver.wait_for(|state| *state != GateState::Waiting);
        // an elapsed timeout or a closed channel both fall through to close
        let _ = tokio::time::timeout(timeout, wait).await;
        self.close()
    }
}
