//! Controller events and error classification for whatever renders the post list.

use shared::{
    domain::{Post, PostId},
    error::{ApiException, ErrorCode},
};

use crate::error::{MutationError, MutationKind};

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    PostCreated(Post),
    PostUpdated(Post),
    PostDeleted(PostId),
    Notification(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    NotFound,
    Validation,
    Transport,
    Unknown,
}

impl ErrorCategory {
    /// Status errors are classified by their code; anything else falls back to the message text.
    pub fn classify(err: &anyhow::Error) -> Self {
        if let Some(api) = err.downcast_ref::<ApiException>() {
            return Self::from_code(api.code);
        }
        if let Some(http) = err.downcast_ref::<reqwest::Error>() {
            if http.is_timeout() || http.is_connect() || http.is_request() {
                return Self::Transport;
            }
            if http.is_decode() {
                return Self::Validation;
            }
        }
        Self::from_message(&format!("{err:#}"))
    }

    pub fn from_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Unauthorized | ErrorCode::Forbidden => Self::Auth,
            ErrorCode::NotFound => Self::NotFound,
            ErrorCode::Validation => Self::Validation,
            ErrorCode::RateLimited | ErrorCode::Internal => Self::Transport,
        }
    }

    pub fn from_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
        {
            Self::Auth
        } else if lower.contains("404") || lower.contains("not found") {
            Self::NotFound
        } else if lower.contains("invalid")
            || lower.contains("missing")
            || lower.contains("malformed")
            || lower.contains("decode")
        {
            Self::Validation
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("network")
            || lower.contains("dns")
            || lower.contains("unavailable")
        {
            Self::Transport
        } else {
            Self::Unknown
        }
    }
}

/// Non-blocking report of a failed mutation; the list and form stay usable.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    kind: MutationKind,
    category: ErrorCategory,
    message: String,
}

impl Notification {
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn summary(&self) -> String {
        let hint = match self.category {
            ErrorCategory::Auth => "the service refused the request",
            ErrorCategory::NotFound => "the post no longer exists on the server",
            ErrorCategory::Validation => "the service rejected the post",
            ErrorCategory::Transport => "the service is unreachable; try again",
            ErrorCategory::Unknown => "unexpected error",
        };
        format!("Could not {} post ({hint}): {}", self.kind, self.message)
    }
}

impl From<&MutationError> for Notification {
    fn from(err: &MutationError) -> Self {
        Self {
            kind: err.kind,
            category: err.category,
            message: err.message.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
