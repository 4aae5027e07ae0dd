pub mod http;
pub mod wire;

pub use http::HttpGateway;

use async_trait::async_trait;
use clinicflow_models::{Kind, KindSet, NotificationId, NotificationRecord};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Session expired or missing")]
    Unauthenticated,
    #[error("Transient failure: {0}")]
    Transient(String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Parameters of one `list_notifications` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListQuery {
    /// `None` = all, `Some(false)` = unread only, `Some(true)` = read only.
    pub read_status: Option<bool>,
    pub kinds: KindSet,
    pub limit: u32,
    pub offset: u32,
}

/// One page of records plus the server's metadata about the full set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationPage {
    pub records: Vec<NotificationRecord>,
    pub total_count: u64,
    pub unread_count: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateNotification {
    pub recipient_id: String,
    pub kind: Kind,
    pub related_appointment_id: Option<String>,
    pub custom_message: Option<String>,
}

/// Remote notification store. Implementations do no business logic; the
/// feed layer owns ordering, optimistic state, and authorization of kinds.
#[async_trait]
pub trait NotificationGateway: Send + Sync + 'static {
    async fn list_notifications(&self, query: &ListQuery) -> Result<NotificationPage, GatewayError>;

    /// Marks `ids` read and returns how many actually changed. Ids that were
    /// already read count as zero.
    async fn mark_read(&self, ids: &[NotificationId]) -> Result<u64, GatewayError>;

    async fn create_notification(&self, request: &CreateNotification) -> Result<(), GatewayError>;
}
