//! Action-item backend as seen from a client
//!
//! [`ActionItemBackend`] is the seam the session reconciles against;
//! [`HttpBackend`] talks to meetwise-api over REST with a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use meetwise_common::models::{
    ActionItem, Attendee, CreateActionItem, DeleteConfirmation, UpdateActionItem,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backend store operations used by a sync session
#[async_trait]
pub trait ActionItemBackend: Send + Sync {
    /// All items of a meeting, newest first
    async fn list_for_meeting(&self, meeting_id: Uuid) -> SyncResult<Vec<ActionItem>>;

    async fn create(&self, body: &CreateActionItem) -> SyncResult<ActionItem>;

    async fn update(&self, id: Uuid, changes: &UpdateActionItem) -> SyncResult<ActionItem>;

    /// Fails with [`SyncError::NotFound`] when the item is already gone
    async fn delete(&self, id: Uuid) -> SyncResult<DeleteConfirmation>;

    /// Attendee directory of a meeting
    async fn attendees(&self, meeting_id: Uuid) -> SyncResult<Vec<Attendee>>;
}

/// REST client for meetwise-api
///
/// No retries: every failure is returned to the caller as-is.
#[derive(Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Backend request");
        self.http_client
            .request(method, url)
            .bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> SyncResult<T> {
        let response = request.send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::from_status(status.as_u16(), &body));
    }

    response
        .json()
        .await
        .map_err(|e| SyncError::Network(format!("Invalid response body: {}", e)))
}

#[async_trait]
impl ActionItemBackend for HttpBackend {
    async fn list_for_meeting(&self, meeting_id: Uuid) -> SyncResult<Vec<ActionItem>> {
        let path = format!("/action-items/meeting/{}", meeting_id);
        self.send(self.request(Method::GET, &path)).await
    }

    async fn create(&self, body: &CreateActionItem) -> SyncResult<ActionItem> {
        self.send(self.request(Method::POST, "/action-items").json(body))
            .await
    }

    async fn update(&self, id: Uuid, changes: &UpdateActionItem) -> SyncResult<ActionItem> {
        let path = format!("/action-items/{}", id);
        self.send(self.request(Method::PATCH, &path).json(changes))
            .await
    }

    async fn delete(&self, id: Uuid) -> SyncResult<DeleteConfirmation> {
        let path = format!("/action-items/{}", id);
        self.send(self.request(Method::DELETE, &path)).await
    }

    async fn attendees(&self, meeting_id: Uuid) -> SyncResult<Vec<Attendee>> {
        let path = format!("/meetings/{}/attendees", meeting_id);
        self.send(self.request(Method::GET, &path)).await
    }
}
