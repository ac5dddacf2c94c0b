use serde::Serialize;

use crate::error::AppError;

pub const SUCCESS_DURATION_MS: u64 = 3000;
pub const ERROR_DURATION_MS: u64 = 5000;
pub const VALIDATION_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message shown after a user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration_ms: u64,
}

impl Notice {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: None,
            duration_ms: SUCCESS_DURATION_MS,
        }
    }

    /// Carries the error's message, or `fallback` when it has none.
    pub fn failure(title: impl Into<String>, err: &AppError, fallback: &str) -> Self {
        let message = err.to_string();
        let description = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };

        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: Some(description),
            duration_ms: ERROR_DURATION_MS,
        }
    }

    pub fn validation(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: None,
            duration_ms: VALIDATION_DURATION_MS,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
