//! Errors reported to callers of the window registry

/// Why a window operation was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("invalid window label: {0:?}")]
    InvalidLabel(String),

    #[error("no such window: {0}")]
    NotFound(String),

    #[error("too many windows (limit {limit})")]
    LimitExceeded { limit: usize },

    #[error("scroll position {pos} is outside the buffer")]
    BadPosition { pos: usize },
}

impl WindowError {
    /// The classic errno value for this error
    pub fn errno(&self) -> i32 {
        match self {
            WindowError::InvalidLabel(_) => 22,      // EINVAL
            WindowError::NotFound(_) => 2,           // ENOENT
            WindowError::LimitExceeded { .. } => 28, // ENOSPC
            WindowError::BadPosition { .. } => 34,   // ERANGE
        }
    }
}
