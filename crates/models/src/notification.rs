use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Kind;

/// Priority value the backend assigns to urgent notifications.
pub const URGENT_PRIORITY: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub recipient_id: String,
    pub kind: Kind,
    pub priority: u8,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub related_entity: Option<RelatedEntity>,
    /// Rendering payload (ratings, clinic names, ...). Passed through untouched.
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub sent_via: BTreeSet<DeliveryChannel>,
}

impl NotificationRecord {
    pub fn is_urgent(&self) -> bool {
        self.priority == URGENT_PRIORITY
    }
}

/// Lookup-only reference to the record a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity_type", content = "entity_id", rename_all = "snake_case")]
pub enum RelatedEntity {
    Appointment(String),
    Feedback(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
    Sms,
    Push,
    #[serde(other)]
    Other,
}
