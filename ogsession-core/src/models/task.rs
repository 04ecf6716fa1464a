//! Arbiter priority classes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue a task waits in before it is granted the session slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Ordinary background work.
    #[default]
    Normal,
    /// Jumps ahead of every queued normal task.
    Elevated,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Elevated => write!(f, "elevated"),
        }
    }
}
