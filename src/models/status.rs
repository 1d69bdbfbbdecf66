use std::fmt::{Display, Formatter, Result};

/// What the delivery worker did with one queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Published { publish_id: String },
    Skipped { reason: String },
}

impl Display for ProcessOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ProcessOutcome::Published { .. } => write!(f, "published"),
            ProcessOutcome::Skipped { .. } => write!(f, "skipped"),
        }
    }
}
