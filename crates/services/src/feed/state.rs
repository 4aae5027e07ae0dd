use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use clinicflow_models::{Category, NotificationId, NotificationRecord};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::gateway::NotificationPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadStatus {
    /// Tri-state the gateway expects: `None` means no read filter.
    pub fn as_query(&self) -> Option<bool> {
        match self {
            ReadStatus::All => None,
            ReadStatus::Unread => Some(false),
            ReadStatus::Read => Some(true),
        }
    }
}

impl FromStr for ReadStatus {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ReadStatus::All),
            "unread" => Ok(ReadStatus::Unread),
            "read" => Ok(ReadStatus::Read),
            other => Err(FeedError::InvalidArgument(format!(
                "unknown read status filter: {other}"
            ))),
        }
    }
}

/// Client-side time window applied to the loaded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl FromStr for Period {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Period::All),
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(FeedError::InvalidArgument(format!(
                "unknown period filter: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    pub read_status: ReadStatus,
    pub category: Option<Category>,
    pub period: Period,
}

/// Partial filter change; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterUpdate {
    pub read_status: Option<ReadStatus>,
    /// `Some(None)` clears the category filter.
    pub category: Option<Option<Category>>,
    pub period: Option<Period>,
}

impl FilterUpdate {
    pub fn read_status(read_status: ReadStatus) -> Self {
        Self {
            read_status: Some(read_status),
            ..Self::default()
        }
    }

    pub fn category(category: Option<Category>) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn period(period: Period) -> Self {
        Self {
            period: Some(period),
            ..Self::default()
        }
    }

    /// Parses `key=value` pairs as sent by the presentation layer.
    /// `category=all` clears the category filter.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, FeedError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut update = FilterUpdate::default();
        for (key, value) in pairs {
            match key {
                "read_status" => update.read_status = Some(value.parse()?),
                "category" if value == "all" => update.category = Some(None),
                "category" => update.category = Some(Some(value.parse::<Category>()?)),
                "period" => update.period = Some(value.parse()?),
                other => {
                    return Err(FeedError::InvalidArgument(format!(
                        "unknown filter: {other}"
                    )));
                }
            }
        }
        Ok(update)
    }

    pub(crate) fn apply_to(&self, filters: &mut Filters) {
        if let Some(read_status) = self.read_status {
            filters.read_status = read_status;
        }
        if let Some(category) = self.category {
            filters.category = category;
        }
        if let Some(period) = self.period {
            filters.period = period;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    pub total_count: u64,
    pub has_more: bool,
}

/// Totals reported by the gateway for the whole result set, as opposed to
/// anything derived from the loaded window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerCounts {
    pub total: u64,
    pub unread: u64,
}

#[derive(Debug)]
pub struct FeedState {
    pub(crate) records: Vec<NotificationRecord>,
    pub(crate) filters: Filters,
    pub(crate) pagination: Pagination,
    pub(crate) in_flight_token: u64,
    pub(crate) loading: bool,
    pub(crate) error: Option<FeedError>,
    pub(crate) server_counts: Option<ServerCounts>,
    pub(crate) closed: bool,
    /// Set when filters changed and no reset fetch has landed since. The
    /// window still belongs to the old filters, so the next fetch must
    /// replace it rather than append.
    pub(crate) needs_reset: bool,
    /// Ids this session marked read whose mark has not failed. Fetched
    /// copies of these records are forced to read.
    read_overrides: HashSet<NotificationId>,
}

impl FeedState {
    pub fn new(limit: u32) -> Self {
        Self {
            records: Vec::new(),
            filters: Filters::default(),
            pagination: Pagination {
                limit,
                offset: 0,
                total_count: 0,
                has_more: true,
            },
            in_flight_token: 0,
            loading: false,
            error: None,
            server_counts: None,
            closed: false,
            needs_reset: false,
            read_overrides: HashSet::new(),
        }
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn window_unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_read).count()
    }

    pub(crate) fn issue_token(&mut self) -> u64 {
        self.in_flight_token += 1;
        self.in_flight_token
    }

    pub(crate) fn is_latest(&self, token: u64) -> bool {
        token == self.in_flight_token
    }

    /// Splices a page into the window. `received` is the number of records
    /// the gateway returned, before any client-side filtering, and is what
    /// the offset advances by.
    pub(crate) fn apply_page(&mut self, page: NotificationPage, received: usize, reset: bool) {
        let received = u32::try_from(received).unwrap_or(u32::MAX);
        let mut incoming = page.records;
        for record in &mut incoming {
            if self.read_overrides.contains(&record.id) {
                record.is_read = true;
            }
        }

        if reset {
            self.records = incoming;
            self.pagination.offset = received;
            self.needs_reset = false;
        } else {
            let known: HashSet<NotificationId> =
                self.records.iter().map(|r| r.id.clone()).collect();
            incoming.retain(|r| !known.contains(&r.id));
            self.records.extend(incoming);
            self.pagination.offset = self.pagination.offset.saturating_add(received);
        }

        self.pagination.total_count = page.total_count;
        self.pagination.has_more = page.has_more && received > 0;
        self.server_counts = Some(ServerCounts {
            total: page.total_count,
            unread: page.unread_count,
        });
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: FeedError) {
        self.loading = false;
        self.error = Some(error);
    }

    /// Flips matching loaded records to read and remembers the ids. Returns
    /// how many loaded records changed and which ids were not already
    /// overridden; only those may be forgotten if this mark fails.
    pub(crate) fn apply_optimistic_read(
        &mut self,
        ids: &BTreeSet<NotificationId>,
    ) -> (usize, Vec<NotificationId>) {
        let added: Vec<NotificationId> = ids
            .iter()
            .filter(|id| self.read_overrides.insert((*id).clone()))
            .cloned()
            .collect();
        let mut flipped = 0;
        for record in self.records.iter_mut().filter(|r| ids.contains(&r.id)) {
            if !record.is_read {
                record.is_read = true;
                flipped += 1;
            }
        }
        (flipped, added)
    }

    pub(crate) fn confirm_read(&mut self, updated_count: u64) {
        if let Some(counts) = self.server_counts.as_mut() {
            counts.unread = counts.unread.saturating_sub(updated_count);
        }
    }

    /// Drops overrides after a failed mark so the next fetch shows the
    /// server's view. Loaded records keep their local flip.
    pub(crate) fn forget_overrides(&mut self, ids: &[NotificationId]) {
        for id in ids {
            self.read_overrides.remove(id);
        }
    }

    pub(crate) fn loaded_unread_ids(&self) -> BTreeSet<NotificationId> {
        self.records
            .iter()
            .filter(|r| !r.is_read)
            .map(|r| r.id.clone())
            .collect()
    }

    pub(crate) fn reset_pagination(&mut self) {
        self.pagination.offset = 0;
        self.pagination.has_more = true;
        self.needs_reset = true;
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.loading = false;
    }
}
