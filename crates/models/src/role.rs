use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a wire or user-supplied name matches no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what}: {value}")]
pub struct UnknownVariant {
    pub what: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Staff,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Patient, Role::Staff, Role::Admin];

    /// Returns `None` for anything that is not a recognized role name.
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "staff" => Some(Role::Staff),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    AppointmentRequested,
    AppointmentConfirmed,
    AppointmentCancelled,
    AppointmentRejected,
    AppointmentReminder,
    FeedbackRequest,
    FeedbackResponse,
    PartnershipRequest,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::AppointmentRequested,
        Kind::AppointmentConfirmed,
        Kind::AppointmentCancelled,
        Kind::AppointmentRejected,
        Kind::AppointmentReminder,
        Kind::FeedbackRequest,
        Kind::FeedbackResponse,
        Kind::PartnershipRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::AppointmentRequested => "appointment_requested",
            Kind::AppointmentConfirmed => "appointment_confirmed",
            Kind::AppointmentCancelled => "appointment_cancelled",
            Kind::AppointmentRejected => "appointment_rejected",
            Kind::AppointmentReminder => "appointment_reminder",
            Kind::FeedbackRequest => "feedback_request",
            Kind::FeedbackResponse => "feedback_response",
            Kind::PartnershipRequest => "partnership_request",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Kind::AppointmentRequested
            | Kind::AppointmentConfirmed
            | Kind::AppointmentCancelled
            | Kind::AppointmentRejected
            | Kind::AppointmentReminder => Category::Appointments,
            Kind::FeedbackRequest | Kind::FeedbackResponse => Category::Feedback,
            Kind::PartnershipRequest => Category::Partnerships,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("notification kind", s))
    }
}

pub type KindSet = BTreeSet<Kind>;

/// Kinds a session of `role` is allowed to receive.
pub fn permitted_kinds(role: Role) -> KindSet {
    match role {
        Role::Patient => KindSet::from([
            Kind::AppointmentConfirmed,
            Kind::AppointmentCancelled,
            Kind::AppointmentRejected,
            Kind::AppointmentReminder,
            Kind::FeedbackRequest,
        ]),
        Role::Staff => KindSet::from([
            Kind::AppointmentRequested,
            Kind::AppointmentCancelled,
            Kind::AppointmentReminder,
            Kind::FeedbackResponse,
        ]),
        Role::Admin => {
            let mut kinds = permitted_kinds(Role::Patient);
            kinds.extend(permitted_kinds(Role::Staff));
            kinds.insert(Kind::PartnershipRequest);
            kinds
        }
    }
}

/// An absent or unrecognized role grants nothing.
pub fn permitted_kinds_for(role: Option<Role>) -> KindSet {
    role.map(permitted_kinds).unwrap_or_default()
}

/// Grouping used by the category filter and projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Appointments,
    Feedback,
    Partnerships,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Appointments,
        Category::Feedback,
        Category::Partnerships,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Appointments => "appointments",
            Category::Feedback => "feedback",
            Category::Partnerships => "partnerships",
        }
    }

    pub fn kinds(&self) -> KindSet {
        Kind::ALL
            .into_iter()
            .filter(|kind| kind.category() == *self)
            .collect()
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}
