//! Session state registry.

use parking_lot::Mutex;
use rats_core::types::SessionState;

/// The overall state of one session.
#[derive(Debug, Default)]
pub struct SessionStateRegistry {
    state: Mutex<SessionState>,
}

impl SessionStateRegistry {
    /// Create a registry in `Pending`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn get(&self) -> SessionState {
        *self.state.lock()
    }

    /// Set the state, returning the previous one.
    pub fn set(&self, state: SessionState) -> SessionState {
        std::mem::replace(&mut *self.state.lock(), state)
    }

    /// Whether the session is `Running`.
    pub fn is_running(&self) -> bool {
        self.get() == SessionState::Running
    }
}
