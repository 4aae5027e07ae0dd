use std::collections::BTreeSet;
use std::sync::Arc;

use clinicflow_models::NotificationId;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::state::FeedState;
use crate::error::FeedError;
use crate::gateway::NotificationGateway;

/// Result of a read mark.
///
/// The local flip is applied before the gateway is called and is kept even
/// when the gateway fails, so the feed does not flicker back to unread.
/// Callers that need the server's view after `Unconfirmed` should refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadAck {
    /// The gateway acknowledged the mark.
    Confirmed {
        updated_count: u64,
        applied_locally: usize,
    },
    /// Applied locally; the gateway call failed.
    Unconfirmed {
        applied_locally: usize,
        error: FeedError,
    },
    /// Nothing was attempted.
    Rejected(FeedError),
}

impl ReadAck {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ReadAck::Confirmed { .. })
    }
}

pub struct ReadSynchronizer {
    gateway: Arc<dyn NotificationGateway>,
}

impl ReadSynchronizer {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    pub async fn mark_as_read(
        &self,
        state: &Mutex<FeedState>,
        ids: BTreeSet<NotificationId>,
    ) -> Result<ReadAck, FeedError> {
        if ids.is_empty() {
            return Err(FeedError::InvalidArgument(
                "no notification ids to mark as read".to_string(),
            ));
        }

        let (applied_locally, added) = state.lock().apply_optimistic_read(&ids);
        let ids: Vec<NotificationId> = ids.into_iter().collect();
        debug!(requested = ids.len(), applied_locally, "Marking notifications read");

        match self.gateway.mark_read(&ids).await {
            Ok(updated_count) => {
                state.lock().confirm_read(updated_count);
                debug!(updated_count, "Read mark confirmed");
                Ok(ReadAck::Confirmed {
                    updated_count,
                    applied_locally,
                })
            }
            Err(e) => {
                let error = FeedError::from(e);
                warn!(%error, applied_locally, "Read mark failed; local state left as read");
                let mut feed = state.lock();
                feed.forget_overrides(&added);
                feed.error = Some(error.clone());
                Ok(ReadAck::Unconfirmed {
                    applied_locally,
                    error,
                })
            }
        }
    }

    pub async fn mark_single(
        &self,
        state: &Mutex<FeedState>,
        id: NotificationId,
    ) -> Result<ReadAck, FeedError> {
        self.mark_as_read(state, BTreeSet::from([id])).await
    }

    /// Marks every loaded unread record. With nothing unread it returns a
    /// zero confirmation without calling the gateway.
    pub async fn mark_all(&self, state: &Mutex<FeedState>) -> Result<ReadAck, FeedError> {
        let ids = state.lock().loaded_unread_ids();
        if ids.is_empty() {
            return Ok(ReadAck::Confirmed {
                updated_count: 0,
                applied_locally: 0,
            });
        }
        self.mark_as_read(state, ids).await
    }
}
