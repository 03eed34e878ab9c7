//! Job state as reported by the broker.

use serde::{Deserialize, Serialize};

/// State transitions:
/// - Pending -> Started -> Succeeded
/// - Pending -> Started -> Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted by the broker, not picked up yet.
    Pending,

    /// Picked up by a worker.
    Started,

    Succeeded,

    Failed,
}

impl JobState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Started.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&JobState::Pending).unwrap(), "\"pending\"");
    }
}
