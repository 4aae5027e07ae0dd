//! Envelope shapes returned by the hosted backend's notification procedures.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use clinicflow_models::{
    DeliveryChannel, Kind, NotificationId, NotificationRecord, RelatedEntity,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{CreateNotification, GatewayError, ListQuery, NotificationPage};

#[derive(Debug, Serialize)]
pub struct ListParams {
    pub read_status: Option<bool>,
    pub kinds: Vec<String>,
    pub limit: u32,
    pub offset: u32,
}

impl From<&ListQuery> for ListParams {
    fn from(query: &ListQuery) -> Self {
        Self {
            read_status: query.read_status,
            kinds: query.kinds.iter().map(|k| k.as_str().to_string()).collect(),
            limit: query.limit,
            offset: query.offset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkReadParams<'a> {
    pub ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct CreateParams<'a> {
    pub recipient_id: &'a str,
    pub kind: &'static str,
    pub related_appointment_id: Option<&'a str>,
    pub custom_message: Option<&'a str>,
}

impl<'a> From<&'a CreateNotification> for CreateParams<'a> {
    fn from(request: &'a CreateNotification) -> Self {
        Self {
            recipient_id: &request.recipient_id,
            kind: request.kind.as_str(),
            related_appointment_id: request.related_appointment_id.as_deref(),
            custom_message: request.custom_message.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListEnvelope {
    pub success: bool,
    pub error: Option<String>,
    pub authenticated: Option<bool>,
    pub data: Option<ListData>,
}

#[derive(Debug, Deserialize)]
pub struct ListData {
    #[serde(default)]
    pub notifications: Vec<WireNotification>,
    pub metadata: ListMetadata,
}

#[derive(Debug, Deserialize)]
pub struct ListMetadata {
    pub counts: WireCounts,
    pub pagination: WirePagination,
}

#[derive(Debug, Deserialize)]
pub struct WireCounts {
    pub total: u64,
    pub unread: u64,
}

#[derive(Debug, Deserialize)]
pub struct WirePagination {
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct WireNotification {
    pub id: String,
    pub recipient_id: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub related_appointment_id: Option<String>,
    pub related_feedback_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub sent_via: BTreeSet<DeliveryChannel>,
}

fn default_priority() -> u8 {
    3
}

impl WireNotification {
    /// `None` when the kind is not one this client knows about.
    fn into_record(self) -> Option<NotificationRecord> {
        let kind = match self.kind.parse::<Kind>() {
            Ok(kind) => kind,
            Err(e) => {
                warn!(id = %self.id, error = %e, "Skipping notification with unknown kind");
                return None;
            }
        };
        let related_entity = match (self.related_appointment_id, self.related_feedback_id) {
            (Some(id), _) => Some(RelatedEntity::Appointment(id)),
            (None, Some(id)) => Some(RelatedEntity::Feedback(id)),
            (None, None) => None,
        };
        Some(NotificationRecord {
            id: NotificationId(self.id),
            recipient_id: self.recipient_id,
            kind,
            priority: self.priority,
            is_read: self.is_read,
            created_at: self.created_at,
            related_entity,
            metadata: self.metadata,
            sent_via: self.sent_via,
        })
    }
}

/// Shared reading of the `success` / `authenticated` / `error` triple.
fn check(success: bool, authenticated: Option<bool>, error: Option<String>) -> Result<(), GatewayError> {
    if authenticated == Some(false) {
        return Err(GatewayError::Unauthenticated);
    }
    if !success {
        return Err(GatewayError::Rejected(
            error.unwrap_or_else(|| "unspecified error".to_string()),
        ));
    }
    Ok(())
}

impl ListEnvelope {
    pub fn into_page(self) -> Result<NotificationPage, GatewayError> {
        check(self.success, self.authenticated, self.error)?;
        let data = self
            .data
            .ok_or_else(|| GatewayError::Transient("response carried no data".to_string()))?;
        Ok(NotificationPage {
            records: data
                .notifications
                .into_iter()
                .filter_map(WireNotification::into_record)
                .collect(),
            total_count: data.metadata.counts.total,
            unread_count: data.metadata.counts.unread,
            has_more: data.metadata.pagination.has_more,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkReadEnvelope {
    pub success: bool,
    pub error: Option<String>,
    pub authenticated: Option<bool>,
    #[serde(default)]
    pub updated_count: u64,
    pub message: Option<String>,
}

impl MarkReadEnvelope {
    pub fn into_updated_count(self) -> Result<u64, GatewayError> {
        check(self.success, self.authenticated, self.error)?;
        Ok(self.updated_count)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEnvelope {
    pub success: bool,
    pub error: Option<String>,
    pub authenticated: Option<bool>,
    pub message: Option<String>,
}

impl CreateEnvelope {
    pub fn into_result(self) -> Result<(), GatewayError> {
        check(self.success, self.authenticated, self.error)
    }
}
