use chrono::{DateTime, Duration, TimeZone, Utc};
use clinicflow_models::{
    DeliveryChannel, Kind, NotificationId, NotificationRecord, RelatedEntity, Role,
    permitted_kinds,
};

use super::test_feed::TestFeed;

/// Fixed clock for seeded data: 2026-10-14 12:00 UTC.
pub fn seed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
}

pub fn record(
    id: &str,
    recipient_id: &str,
    kind: Kind,
    is_read: bool,
    minutes_ago: i64,
) -> NotificationRecord {
    NotificationRecord {
        id: NotificationId::from(id),
        recipient_id: recipient_id.to_string(),
        kind,
        priority: 2,
        is_read,
        created_at: seed_now() - Duration::minutes(minutes_ago),
        related_entity: Some(RelatedEntity::Appointment(format!("appt-{id}"))),
        metadata: serde_json::json!({ "clinic_name": "Riverside Clinic" }),
        sent_via: [DeliveryChannel::InApp].into(),
    }
}

impl TestFeed {
    /// Seeds `total` notifications for this recipient, newest first as
    /// `n0, n1, ...`. The first `unread` of them are unread. Kinds cycle
    /// through the role's catalog.
    pub fn seed(&self, role: Role, total: usize, unread: usize) -> Vec<NotificationId> {
        let kinds: Vec<Kind> = permitted_kinds(role).into_iter().collect();
        (0..total)
            .map(|i| {
                let id = format!("n{i}");
                self.backend.insert(record(
                    &id,
                    &self.recipient_id,
                    kinds[i % kinds.len()],
                    i >= unread,
                    i as i64 * 10,
                ));
                NotificationId(id)
            })
            .collect()
    }

    /// Seeds one record of each kind in the catalog, unread.
    pub fn seed_every_kind(&self) {
        for (i, kind) in Kind::ALL.into_iter().enumerate() {
            self.backend.insert(record(
                &format!("k{i}"),
                &self.recipient_id,
                kind,
                false,
                i as i64,
            ));
        }
    }
}
