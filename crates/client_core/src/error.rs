use std::fmt;

use thiserror::Error;

use crate::events::ErrorCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The post collection could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LoadError {
    pub category: ErrorCategory,
    pub message: String,
}

impl LoadError {
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            category: ErrorCategory::classify(err),
            message: format!("{err:#}"),
        }
    }
}

/// A create, update or delete was rejected or never reached the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} post failed: {message}")]
pub struct MutationError {
    pub kind: MutationKind,
    pub category: ErrorCategory,
    pub message: String,
}

impl MutationError {
    pub fn from_error(kind: MutationKind, err: &anyhow::Error) -> Self {
        Self {
            kind,
            category: ErrorCategory::classify(err),
            message: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("query cache worker has stopped")]
pub struct CacheClosed;

impl From<CacheClosed> for LoadError {
    fn from(value: CacheClosed) -> Self {
        Self {
            category: ErrorCategory::Unknown,
            message: value.to_string(),
        }
    }
}
