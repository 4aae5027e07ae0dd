use std::sync::Arc;

use clinicflow_models::{KindSet, Role, permitted_kinds};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::state::{FeedState, Filters};
use crate::error::FeedError;
use crate::gateway::{ListQuery, NotificationGateway, NotificationPage};

/// What happened to one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { received: usize },
    /// A newer fetch was issued while this one was in flight.
    Superseded,
    /// The session ended before the response arrived.
    Abandoned,
    /// Load-more with nothing left to load.
    Skipped,
    Failed(FeedError),
}

pub struct FeedFetcher {
    gateway: Arc<dyn NotificationGateway>,
    role: Role,
    permitted: KindSet,
}

impl FeedFetcher {
    pub fn new(gateway: Arc<dyn NotificationGateway>, role: Role) -> Self {
        Self {
            gateway,
            role,
            permitted: permitted_kinds(role),
        }
    }

    /// Kinds sent with every query: the role's set, narrowed by the category
    /// filter. User filters never widen it.
    pub fn query_kinds(&self, filters: &Filters) -> KindSet {
        match filters.category {
            Some(category) => self
                .permitted
                .intersection(&category.kinds())
                .copied()
                .collect(),
            None => self.permitted.clone(),
        }
    }

    /// Runs one query. `reset` replaces the window from offset 0; otherwise
    /// the page is appended at the current offset. Only the response to the
    /// most recently issued fetch touches `state`.
    pub async fn fetch(&self, state: &Mutex<FeedState>, reset: bool) -> FetchOutcome {
        let (token, query, reset) = {
            let mut feed = state.lock();
            if feed.closed {
                return FetchOutcome::Abandoned;
            }
            // After a failed filter change the window is still the old
            // filter's; appending the new filter's pages to it would mix them.
            let reset = reset || feed.needs_reset;
            if !reset && !feed.pagination.has_more {
                debug!(role = %self.role, offset = feed.pagination.offset, "No more notifications to load");
                return FetchOutcome::Skipped;
            }

            let query = ListQuery {
                read_status: feed.filters.read_status.as_query(),
                kinds: self.query_kinds(&feed.filters),
                limit: feed.pagination.limit,
                offset: if reset { 0 } else { feed.pagination.offset },
            };
            let token = feed.issue_token();

            // A category outside the role's catalog selects nothing; never
            // send an empty kind list the backend could read as "any kind".
            if query.kinds.is_empty() {
                feed.apply_page(NotificationPage::default(), 0, reset);
                return FetchOutcome::Applied { received: 0 };
            }

            feed.loading = true;
            (token, query, reset)
        };

        debug!(
            role = %self.role,
            token,
            offset = query.offset,
            limit = query.limit,
            reset,
            "Fetching notifications"
        );
        let result = self.gateway.list_notifications(&query).await;

        let mut feed = state.lock();
        if feed.closed {
            debug!(token, "Dropping notification response for closed session");
            return FetchOutcome::Abandoned;
        }
        if !feed.is_latest(token) {
            debug!(token, latest = feed.in_flight_token, "Discarding superseded notification response");
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(mut page) => {
                let received = page.records.len();
                page.records.retain(|r| self.permitted.contains(&r.kind));
                let dropped = received - page.records.len();
                if dropped > 0 {
                    warn!(role = %self.role, dropped, "Dropped notifications outside the role's catalog");
                }
                feed.apply_page(page, received, reset);
                debug!(
                    token,
                    received,
                    offset = feed.pagination.offset,
                    has_more = feed.pagination.has_more,
                    "Applied notification page"
                );
                FetchOutcome::Applied { received }
            }
            Err(e) => {
                let error = FeedError::from(e);
                warn!(role = %self.role, token, %error, "Notification fetch failed; keeping current feed");
                feed.fail(error.clone());
                FetchOutcome::Failed(error)
            }
        }
    }
}
