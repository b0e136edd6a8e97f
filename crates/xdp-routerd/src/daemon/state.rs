//! Daemon lifecycle states.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Loaded,
    Attached,
    ConfigApplied,
    Polling,
    ShuttingDown,
    Terminated,
}

impl LifecycleState {
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Loaded => "loaded",
            LifecycleState::Attached => "attached",
            LifecycleState::ConfigApplied => "config-applied",
            LifecycleState::Polling => "polling",
            LifecycleState::ShuttingDown => "shutting-down",
            LifecycleState::Terminated => "terminated",
        }
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, Loaded)
                | (Uninitialized, Terminated)
                | (Loaded, Attached)
                | (Loaded, ShuttingDown)
                | (Attached, ConfigApplied)
                | (Attached, ShuttingDown)
                | (ConfigApplied, Polling)
                | (ConfigApplied, ShuttingDown)
                | (Polling, ShuttingDown)
                | (ShuttingDown, Terminated)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        use LifecycleState::*;
        let path = [
            Uninitialized,
            Loaded,
            Attached,
            ConfigApplied,
            Polling,
            ShuttingDown,
            Terminated,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_illegal_transitions() {
        use LifecycleState::*;
        assert!(!Uninitialized.can_transition_to(Attached));
        assert!(!Polling.can_transition_to(Terminated));
        assert!(!Terminated.can_transition_to(Loaded));
    }
}
