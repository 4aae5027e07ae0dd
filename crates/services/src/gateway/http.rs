use std::time::Duration;

use async_trait::async_trait;
use clinicflow_config::GatewaySettings;
use clinicflow_models::NotificationId;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::wire::{
    CreateEnvelope, CreateParams, ListEnvelope, ListParams, MarkReadEnvelope, MarkReadParams,
};
use super::{CreateNotification, GatewayError, ListQuery, NotificationGateway, NotificationPage};

const LIST_PROCEDURE: &str = "get_notifications";
const MARK_READ_PROCEDURE: &str = "mark_notifications_read";
const CREATE_PROCEDURE: &str = "create_notification";

/// Calls the hosted backend's remote procedures over HTTP.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    access_token: String,
}

impl HttpGateway {
    pub fn new(settings: &GatewaySettings, access_token: String) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transient(e.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            access_token,
        })
    }

    fn procedure_url(&self, procedure: &str) -> String {
        format!("{}/rpc/{}", self.base_url, procedure)
    }

    async fn call<P, R>(&self, procedure: &str, params: &P) -> Result<R, GatewayError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let mut request = self
            .client
            .post(self.procedure_url(procedure))
            .bearer_auth(&self.access_token)
            .json(params);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let resp = request.send().await.map_err(transient)?;
        let status = resp.status();
        debug!(procedure, %status, "Notification procedure returned");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(GatewayError::Transient(format!(
                "{procedure} returned HTTP {status}"
            )));
        }

        resp.json::<R>().await.map_err(transient)
    }
}

fn transient(err: reqwest::Error) -> GatewayError {
    GatewayError::Transient(err.to_string())
}

#[async_trait]
impl NotificationGateway for HttpGateway {
    async fn list_notifications(&self, query: &ListQuery) -> Result<NotificationPage, GatewayError> {
        let envelope: ListEnvelope = self.call(LIST_PROCEDURE, &ListParams::from(query)).await?;
        envelope.into_page()
    }

    async fn mark_read(&self, ids: &[NotificationId]) -> Result<u64, GatewayError> {
        let params = MarkReadParams {
            ids: ids.iter().map(NotificationId::as_str).collect(),
        };
        let envelope: MarkReadEnvelope = self.call(MARK_READ_PROCEDURE, &params).await?;
        envelope.into_updated_count()
    }

    async fn create_notification(&self, request: &CreateNotification) -> Result<(), GatewayError> {
        let envelope: CreateEnvelope = self
            .call(CREATE_PROCEDURE, &CreateParams::from(request))
            .await?;
        envelope.into_result()
    }
}
