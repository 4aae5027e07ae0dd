use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use clinicflow_models::{DeliveryChannel, NotificationId, NotificationRecord, RelatedEntity};
use clinicflow_services::gateway::{
    CreateNotification, GatewayError, ListQuery, NotificationGateway, NotificationPage,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Shared store standing in for the hosted backend. Records are keyed by
/// recipient, like rows filtered by the backend's row-level security.
#[derive(Default)]
pub struct InMemoryBackend {
    records: DashMap<String, Vec<NotificationRecord>>,
}

impl InMemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, record: NotificationRecord) {
        self.records
            .entry(record.recipient_id.clone())
            .or_default()
            .push(record);
    }

    pub fn records_for(&self, recipient_id: &str) -> Vec<NotificationRecord> {
        self.records
            .get(recipient_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn is_read(&self, recipient_id: &str, id: &str) -> Option<bool> {
        self.records
            .get(recipient_id)?
            .iter()
            .find(|r| r.id.as_str() == id)
            .map(|r| r.is_read)
    }

    /// Gateway bound to one signed-in recipient.
    pub fn connect(self: &Arc<Self>, recipient_id: &str) -> Arc<InMemoryGateway> {
        Arc::new(InMemoryGateway {
            backend: Arc::clone(self),
            recipient_id: recipient_id.to_string(),
            list_calls: Mutex::new(Vec::new()),
            mark_calls: Mutex::new(Vec::new()),
            create_calls: Mutex::new(Vec::new()),
            list_gates: Mutex::new(VecDeque::new()),
            list_failures: Mutex::new(VecDeque::new()),
            mark_failures: Mutex::new(VecDeque::new()),
            create_failures: Mutex::new(VecDeque::new()),
            ignore_kinds: AtomicBool::new(false),
        })
    }
}

/// Gateway over [`InMemoryBackend`] with hooks for ordering and failure
/// tests: held responses, queued failures, and a call log.
pub struct InMemoryGateway {
    backend: Arc<InMemoryBackend>,
    recipient_id: String,
    list_calls: Mutex<Vec<ListQuery>>,
    mark_calls: Mutex<Vec<Vec<NotificationId>>>,
    create_calls: Mutex<Vec<CreateNotification>>,
    list_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    list_failures: Mutex<VecDeque<GatewayError>>,
    mark_failures: Mutex<VecDeque<GatewayError>>,
    create_failures: Mutex<VecDeque<GatewayError>>,
    ignore_kinds: AtomicBool,
}

impl InMemoryGateway {
    /// Holds the response of the next `list_notifications` call until the
    /// returned sender fires. The page is read from the store when the call
    /// arrives, not when it is released.
    pub fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_gates.lock().push_back(rx);
        tx
    }

    pub fn fail_next_list(&self, error: GatewayError) {
        self.list_failures.lock().push_back(error);
    }

    pub fn fail_next_mark(&self, error: GatewayError) {
        self.mark_failures.lock().push_back(error);
    }

    pub fn fail_next_create(&self, error: GatewayError) {
        self.create_failures.lock().push_back(error);
    }

    /// Makes the backend return every kind regardless of the query, to
    /// exercise client-side catalog checks.
    pub fn ignore_kind_filter(&self) {
        self.ignore_kinds.store(true, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> Vec<ListQuery> {
        self.list_calls.lock().clone()
    }

    pub fn mark_calls(&self) -> Vec<Vec<NotificationId>> {
        self.mark_calls.lock().clone()
    }

    pub fn create_calls(&self) -> Vec<CreateNotification> {
        self.create_calls.lock().clone()
    }

    /// Yields until `n` list calls have reached the gateway.
    pub async fn wait_for_list_calls(&self, n: usize) {
        for _ in 0..1000 {
            if self.list_calls.lock().len() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} list calls, saw {}", self.list_calls.lock().len());
    }

    fn page_for(&self, query: &ListQuery) -> NotificationPage {
        let ignore_kinds = self.ignore_kinds.load(Ordering::SeqCst);
        let mut in_scope: Vec<NotificationRecord> = self
            .backend
            .records_for(&self.recipient_id)
            .into_iter()
            .filter(|r| ignore_kinds || query.kinds.contains(&r.kind))
            .collect();
        in_scope.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let unread = in_scope.iter().filter(|r| !r.is_read).count() as u64;
        let matching: Vec<NotificationRecord> = in_scope
            .into_iter()
            .filter(|r| query.read_status.is_none_or(|read| r.is_read == read))
            .collect();
        let total = matching.len();
        let records: Vec<NotificationRecord> = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        let has_more = (query.offset as usize + records.len()) < total;

        NotificationPage {
            records,
            total_count: total as u64,
            unread_count: unread,
            has_more,
        }
    }
}

#[async_trait]
impl NotificationGateway for InMemoryGateway {
    async fn list_notifications(&self, query: &ListQuery) -> Result<NotificationPage, GatewayError> {
        self.list_calls.lock().push(query.clone());
        let failure = self.list_failures.lock().pop_front();
        let result = match failure {
            Some(error) => Err(error),
            None => Ok(self.page_for(query)),
        };

        let gate = self.list_gates.lock().pop_front();
        if let Some(gate) = gate {
            debug!(offset = query.offset, "Holding list response");
            let _ = gate.await;
        }
        result
    }

    async fn mark_read(&self, ids: &[NotificationId]) -> Result<u64, GatewayError> {
        self.mark_calls.lock().push(ids.to_vec());
        if let Some(error) = self.mark_failures.lock().pop_front() {
            return Err(error);
        }

        let mut updated = 0;
        if let Some(mut records) = self.backend.records.get_mut(&self.recipient_id) {
            for record in records.iter_mut().filter(|r| ids.contains(&r.id)) {
                if !record.is_read {
                    record.is_read = true;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn create_notification(&self, request: &CreateNotification) -> Result<(), GatewayError> {
        self.create_calls.lock().push(request.clone());
        if let Some(error) = self.create_failures.lock().pop_front() {
            return Err(error);
        }

        self.backend.insert(NotificationRecord {
            id: NotificationId::new(uuid::Uuid::new_v4().to_string()),
            recipient_id: request.recipient_id.clone(),
            kind: request.kind,
            priority: 2,
            is_read: false,
            created_at: Utc::now(),
            related_entity: request
                .related_appointment_id
                .clone()
                .map(RelatedEntity::Appointment),
            metadata: match &request.custom_message {
                Some(message) => serde_json::json!({ "message": message }),
                None => serde_json::Value::Null,
            },
            sent_via: [DeliveryChannel::InApp].into(),
        });
        Ok(())
    }
}
