//! User-facing notices
//!
//! The orchestrator reports capture failures and search confirmations
//! through a [`Notifier`]; front ends decide how to show them.

use std::fmt;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

/// Sink for notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
