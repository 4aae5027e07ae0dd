use clinicflow_models::{Kind, Role, UnknownVariant};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Failure taxonomy held in feed state. Cloneable so the last error can be
/// kept in a snapshot alongside the stale feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("Session is not authenticated")]
    Unauthenticated,
    #[error("Notification service unavailable: {0}")]
    Transient(String),
    #[error("Notification service rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Kind {kind} is not permitted for recipient role {role}")]
    InvalidKindForRole { kind: Kind, role: String },
}

impl FeedError {
    pub fn invalid_kind(kind: Kind, role: Option<Role>) -> Self {
        FeedError::InvalidKindForRole {
            kind,
            role: role.map_or_else(|| "unknown".to_string(), |r| r.to_string()),
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, FeedError::Unauthenticated)
    }
}

impl From<GatewayError> for FeedError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthenticated => FeedError::Unauthenticated,
            GatewayError::Transient(msg) => FeedError::Transient(msg),
            GatewayError::Rejected(msg) => FeedError::Rejected(msg),
        }
    }
}

impl From<UnknownVariant> for FeedError {
    fn from(err: UnknownVariant) -> Self {
        FeedError::InvalidArgument(err.to_string())
    }
}
