//! Write-operation state machine
//!
//! One gate per contract client serializes its write path:
//!
//! ```text
//! Idle -> Submitting -> AwaitingConfirmation -> Succeeded | Failed
//! ```
//!
//! Succeeded and Failed are settled states; the next `begin` treats them
//! as idle. A `begin` while a write is pending fails fast with
//! `WriteInFlight` instead of queueing, so a second action cannot race a
//! pending confirmation.

use crate::error::{NodeError, NodeResult};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Idle,
    Submitting,
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct WriteGate {
    state: Mutex<WriteState>,
}

impl Default for WriteGate {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WriteState::Idle),
        }
    }

    /// Claim the gate for a new write. Fails while a write is pending.
    pub fn begin(&self) -> NodeResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        match *state {
            WriteState::Submitting | WriteState::AwaitingConfirmation => {
                Err(NodeError::WriteInFlight)
            }
            _ => {
                *state = WriteState::Submitting;
                Ok(())
            }
        }
    }

    /// The transaction was accepted by the wallet; now waiting on the chain.
    pub fn confirming(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if *state == WriteState::Submitting {
            *state = WriteState::AwaitingConfirmation;
        }
    }

    /// Record the outcome and release the gate.
    pub fn settle(&self, ok: bool) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        *state = if ok {
            WriteState::Succeeded
        } else {
            WriteState::Failed
        };
    }

    pub fn state(&self) -> WriteState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_claims_idle_gate() {
        let gate = WriteGate::new();
        assert_eq!(gate.state(), WriteState::Idle);
        gate.begin().expect("begin");
        assert_eq!(gate.state(), WriteState::Submitting);
    }

    #[test]
    fn second_begin_fails_while_pending() {
        let gate = WriteGate::new();
        gate.begin().expect("begin");
        assert!(matches!(gate.begin(), Err(NodeError::WriteInFlight)));

        gate.confirming();
        assert_eq!(gate.state(), WriteState::AwaitingConfirmation);
        assert!(matches!(gate.begin(), Err(NodeError::WriteInFlight)));
    }

    #[test]
    fn settled_gate_accepts_new_write() {
        let gate = WriteGate::new();
        gate.begin().expect("begin");
        gate.confirming();
        gate.settle(true);
        assert_eq!(gate.state(), WriteState::Succeeded);
        gate.begin().expect("begin after success");

        gate.settle(false);
        assert_eq!(gate.state(), WriteState::Failed);
        gate.begin().expect("begin after failure");
    }

    #[test]
    fn confirming_only_moves_from_submitting() {
        let gate = WriteGate::new();
        gate.confirming();
        assert_eq!(gate.state(), WriteState::Idle);
    }
}
