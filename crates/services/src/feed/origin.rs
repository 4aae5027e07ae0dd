use clinicflow_models::{Kind, Role, permitted_kinds_for};
use tracing::{info, warn};

use crate::error::FeedError;
use crate::gateway::{CreateNotification, NotificationGateway};

/// A notification another feature wants delivered to someone.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: String,
    /// `None` when the recipient's role is unknown; such recipients can be
    /// sent nothing.
    pub recipient_role: Option<Role>,
    pub kind: Kind,
    pub related_appointment_id: Option<String>,
    pub custom_message: Option<String>,
}

/// Checks the kind against the recipient's catalog, then asks the gateway
/// to create the notification. No call is made for a disallowed kind.
pub async fn create_notification(
    gateway: &dyn NotificationGateway,
    notification: NewNotification,
) -> Result<(), FeedError> {
    if !permitted_kinds_for(notification.recipient_role).contains(&notification.kind) {
        warn!(
            recipient_id = %notification.recipient_id,
            kind = %notification.kind,
            role = ?notification.recipient_role,
            "Refusing to create notification outside the recipient's catalog"
        );
        return Err(FeedError::invalid_kind(notification.kind, notification.recipient_role));
    }

    let request = CreateNotification {
        recipient_id: notification.recipient_id,
        kind: notification.kind,
        related_appointment_id: notification.related_appointment_id,
        custom_message: notification.custom_message,
    };
    gateway.create_notification(&request).await?;
    info!(recipient_id = %request.recipient_id, kind = %request.kind, "Notification created");
    Ok(())
}
