//! Observability - ブローカーが報告するジョブ数の集計

use serde::{Deserialize, Serialize};

use crate::domain::JobState;

/// Number of jobs per state, as reported by a broker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub pending: usize,
    pub started: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl JobCounts {
    pub fn record(&mut self, state: JobState) {
        match state {
            JobState::Pending => self.pending += 1,
            JobState::Started => self.started += 1,
            JobState::Succeeded => self.succeeded += 1,
            JobState::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.started + self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_each_state() {
        let mut counts = JobCounts::default();
        for state in [JobState::Pending, JobState::Pending, JobState::Succeeded, JobState::Failed] {
            counts.record(state);
        }
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.started, 0);
        assert_eq!(counts.total(), 4);
    }
}
