//! Ready/Executing gate shared by a session's reader and engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Admits at most one submitted line per Ready period.
///
/// The connection's reader thread calls [`InputGate::try_admit`] for every
/// line it receives. The first admitted line flips the gate to Executing, and
/// later lines are refused until the engine calls [`InputGate::reopen`] right
/// before it emits the next prompt.
#[derive(Debug, Clone, Default)]
pub struct InputGate {
    ready: Arc<AtomicBool>,
}

impl InputGate {
    /// Creates a closed gate. Sessions open it with their first prompt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves Ready to Executing. Returns `false` when the session is busy.
    pub fn try_admit(&self) -> bool {
        self.ready
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Moves to Ready so the next submitted line is admitted.
    pub fn reopen(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Whether a line would be admitted right now.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_one_line_per_ready_period() {
        let gate = InputGate::new();
        assert!(!gate.try_admit(), "closed until the first prompt");

        gate.reopen();
        assert!(gate.try_admit());
        assert!(!gate.try_admit(), "second line refused while executing");

        gate.reopen();
        assert!(gate.clone().try_admit(), "clones share state");
        assert!(!gate.is_ready());
    }
}
