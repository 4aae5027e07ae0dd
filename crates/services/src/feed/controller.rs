use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use clinicflow_config::Settings;
use clinicflow_models::{NotificationId, NotificationRecord, Role};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::fetcher::{FeedFetcher, FetchOutcome};
use super::origin::{self, NewNotification};
use super::projection::{self, ProjectionSummary};
use super::scheduler::RefreshScheduler;
use super::state::{FeedState, FilterUpdate, Filters, Pagination, ServerCounts};
use super::sync::{ReadAck, ReadSynchronizer};
use crate::error::FeedError;
use crate::gateway::NotificationGateway;

/// The signed-in actor a feed belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub recipient_id: String,
    pub role: Role,
}

/// Point-in-time copy of the feed for presentation code.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub records: Vec<NotificationRecord>,
    /// `records` narrowed by the period filter.
    pub visible: Vec<NotificationRecord>,
    pub filters: Filters,
    pub pagination: Pagination,
    pub loading: bool,
    pub error: Option<FeedError>,
    /// Unread records in the loaded window only.
    pub window_unread: usize,
    /// What the gateway last reported for the whole set.
    pub server_counts: Option<ServerCounts>,
    pub summary: ProjectionSummary,
}

/// One per active session. Presentation code and other features hold an
/// `Arc<FeedController>` and never touch the feed state directly.
///
/// None of the actions return an error; failures land in
/// [`FeedSnapshot::error`] with the previous feed still in place.
pub struct FeedController {
    session: Session,
    gateway: Arc<dyn NotificationGateway>,
    state: Mutex<FeedState>,
    fetcher: FeedFetcher,
    sync: ReadSynchronizer,
    scheduler: Mutex<RefreshScheduler>,
}

impl FeedController {
    pub fn new(
        session: Session,
        gateway: Arc<dyn NotificationGateway>,
        settings: &Settings,
    ) -> Arc<Self> {
        info!(
            recipient_id = %session.recipient_id,
            role = %session.role,
            page_size = settings.feed.page_size,
            "Opening notification feed"
        );
        Arc::new(Self {
            fetcher: FeedFetcher::new(Arc::clone(&gateway), session.role),
            sync: ReadSynchronizer::new(Arc::clone(&gateway)),
            state: Mutex::new(FeedState::new(settings.feed.page_size.max(1))),
            scheduler: Mutex::new(RefreshScheduler::new(settings.refresh.clone())),
            gateway,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot_at(&Local::now())
    }

    /// Snapshot with date-based projections evaluated against `now`.
    pub fn snapshot_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> FeedSnapshot {
        let state = self.state.lock();
        let records = state.records().to_vec();
        let visible = projection::within_period(&records, state.filters.period, now)
            .into_iter()
            .cloned()
            .collect();
        FeedSnapshot {
            summary: ProjectionSummary::compute(&records, now),
            window_unread: state.window_unread_count(),
            visible,
            records,
            filters: state.filters,
            pagination: state.pagination(),
            loading: state.loading,
            error: state.error.clone(),
            server_counts: state.server_counts,
        }
    }

    /// Reloads the first page, replacing the window. Other features call
    /// this after an action that should show up in the feed.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetcher.fetch(&self.state, true).await
    }

    pub async fn load_more(&self) -> FetchOutcome {
        self.fetcher.fetch(&self.state, false).await
    }

    /// Applies `update` and refetches from offset 0.
    pub async fn update_filters(&self, update: FilterUpdate) -> FetchOutcome {
        {
            let mut state = self.state.lock();
            update.apply_to(&mut state.filters);
            state.reset_pagination();
            debug!(filters = ?state.filters, "Feed filters changed");
        }
        self.refresh().await
    }

    pub async fn mark_as_read<I>(&self, ids: I) -> ReadAck
    where
        I: IntoIterator<Item = NotificationId>,
    {
        let ids: BTreeSet<NotificationId> = ids.into_iter().collect();
        let result = self.sync.mark_as_read(&self.state, ids).await;
        self.settle(result)
    }

    pub async fn mark_single(&self, id: NotificationId) -> ReadAck {
        let result = self.sync.mark_single(&self.state, id).await;
        self.settle(result)
    }

    pub async fn mark_all_as_read(&self) -> ReadAck {
        let result = self.sync.mark_all(&self.state).await;
        self.settle(result)
    }

    fn settle(&self, result: Result<ReadAck, FeedError>) -> ReadAck {
        result.unwrap_or_else(|error| {
            self.state.lock().error = Some(error.clone());
            ReadAck::Rejected(error)
        })
    }

    /// Originates a notification for someone else's feed. Unlike the feed
    /// actions this returns its error, since it is about the recipient and
    /// not about this session's feed.
    pub async fn create_notification(&self, notification: NewNotification) -> Result<(), FeedError> {
        origin::create_notification(self.gateway.as_ref(), notification).await
    }

    /// Starts role-paced background refreshes. Idempotent. Returns `false`
    /// once the session has been shut down.
    pub fn start_auto_refresh(self: &Arc<Self>) -> bool {
        // Checked under the scheduler lock so a concurrent `shutdown` either
        // is seen here or stops the timer started below.
        let mut scheduler = self.scheduler.lock();
        if self.state.lock().closed {
            debug!(recipient_id = %self.session.recipient_id, "Not starting refresh timer for closed feed");
            return false;
        }
        let weak = Arc::downgrade(self);
        scheduler.start(self.session.role, move || {
            let weak = weak.clone();
            async move {
                if let Some(controller) = weak.upgrade() {
                    controller.refresh().await;
                }
            }
        })
    }

    pub fn stop_auto_refresh(&self) -> bool {
        self.scheduler.lock().stop()
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.scheduler.lock().is_running()
    }

    /// Ends the session: stops the timer and makes every in-flight response
    /// a no-op.
    pub fn shutdown(&self) {
        self.state.lock().close();
        self.stop_auto_refresh();
        info!(recipient_id = %self.session.recipient_id, "Notification feed closed");
    }
}
