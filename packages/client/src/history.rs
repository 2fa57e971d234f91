//! History loader: REST fetch of a room's persisted backlog on entry.

use async_trait::async_trait;
use huddle_shared::protocol::HistoryResponse;

use crate::{
    credential::BearerToken,
    domain::{Message, WorkspaceId},
    error::HistoryFetchError,
};

/// Source of a room's persisted messages, ascending by timestamp
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryLoader: Send + Sync {
    async fn load(
        &self,
        workspace_id: &WorkspaceId,
        token: &BearerToken,
    ) -> Result<Vec<Message>, HistoryFetchError>;
}

/// `GET {base}/workspaces/{id}/messages` over HTTP with bearer auth
#[derive(Debug, Clone)]
pub struct HttpHistoryLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHistoryLoader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, workspace_id: &WorkspaceId) -> String {
        format!("{}/workspaces/{}/messages", self.base_url, workspace_id)
    }
}

#[async_trait]
impl HistoryLoader for HttpHistoryLoader {
    async fn load(
        &self,
        workspace_id: &WorkspaceId,
        token: &BearerToken,
    ) -> Result<Vec<Message>, HistoryFetchError> {
        let url = self.endpoint(workspace_id);
        tracing::debug!("Fetching history from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| HistoryFetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HistoryFetchError::Status(status.as_u16()));
        }

        let body: HistoryResponse = response
            .json()
            .await
            .map_err(|e| HistoryFetchError::Decode(e.to_string()))?;

        Ok(into_messages(body))
    }
}

/// Convert a history body, skipping malformed entries and restoring ascending order
pub fn into_messages(body: HistoryResponse) -> Vec<Message> {
    let mut messages: Vec<Message> = body
        .messages
        .into_iter()
        .filter_map(|payload| {
            let id = payload.id.clone();
            Message::try_from(payload)
                .inspect_err(|e| tracing::warn!("Skipping malformed history entry '{}': {}", id, e))
                .ok()
        })
        .collect();
    messages.sort_by_key(|message| message.timestamp);
    messages
}
