// src/models/run.rs
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity of one batch invocation; labels the run's output artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl BatchRun {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// First 8 hex chars of the run id, enough to keep same-second runs apart.
    pub fn short_id(&self) -> String {
        self.run_id.simple().to_string()[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_are_distinct() {
        let a = BatchRun::start();
        let b = BatchRun::start();
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.short_id().len(), 8);
        assert!(b.started_at >= a.started_at);
    }
}
