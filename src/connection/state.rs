use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle of the one connection a handler establishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    NotConnected,
    Connecting,
    Connected,
}

/// Shared state cell, written by the connection worker and read by the caller.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateCell {
    inner: Arc<Mutex<ConnectionState>>,
}

impl StateCell {
    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Connection state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        *self.lock()
    }

    /// Moves to `Connecting` unless an attempt is already in flight.
    /// Returns false (and changes nothing) in that case.
    pub(crate) fn begin_attempt(&self) -> bool {
        let mut state = self.lock();
        if *state == ConnectionState::Connecting {
            return false;
        }
        *state = ConnectionState::Connecting;
        true
    }

    pub(crate) fn mark_connected(&self) {
        *self.lock() = ConnectionState::Connected;
    }

    pub(crate) fn reset(&self) {
        *self.lock() = ConnectionState::NotConnected;
    }
}

/// Resets the state if an attempt ends without reporting an outcome,
/// e.g. when its task is aborted.
///
/// `disarmed=false` → Drop resets to `NotConnected`.
pub(crate) struct AttemptGuard {
    state: StateCell,
    disarmed: bool,
}

impl AttemptGuard {
    pub(crate) fn new(state: StateCell) -> Self {
        Self {
            state,
            disarmed: false,
        }
    }

    pub(crate) fn disarm(&mut self) {
        self.disarmed = true;
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        if !self.disarmed {
            tracing::debug!("connection attempt dropped before completing");
            self.state.reset();
        }
    }
}
