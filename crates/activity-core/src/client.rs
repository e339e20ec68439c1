//! The chat platform capability: what the aggregation core consumes.
//!
//! The trait is the seam; [`RestStreamClient`] is the production
//! implementation, tests substitute their own.

use async_trait::async_trait;
use tracing::debug;

use crate::config::PlatformConfig;
use crate::error::{ActivityError, Result};
use crate::types::{MembershipResponse, MessageEnvelope, MessageStatus, RosterMember};

/// Read-only access to one chat stream's snapshot data.
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// Messages sent in the stream since `since_ms` (epoch milliseconds).
    async fn list_messages(&self, stream_id: &str, since_ms: i64)
        -> Result<Vec<MessageEnvelope>>;

    /// Read-receipt status for one message.
    async fn get_message_status(&self, message_id: &str) -> Result<MessageStatus>;

    /// Current roster of the stream.
    async fn list_stream_members(&self, stream_id: &str) -> Result<Vec<RosterMember>>;
}

/// REST implementation of [`StreamClient`].
///
/// Every call is bounded by the configured timeout; a timeout surfaces as
/// its own error kind so callers can tell it apart from other failures.
#[derive(Debug)]
pub struct RestStreamClient {
    client: reqwest::Client,
    host: String,
}

impl RestStreamClient {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.auth_token))
                .map_err(|e| ActivityError::Config(format!("invalid auth token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent("stream-activity/0.1")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T>(&self, url: String, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActivityError::ExternalCall(format!(
                "{url} returned HTTP {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| classify(&url, e))
    }
}

fn classify(url: &str, err: reqwest::Error) -> ActivityError {
    if err.is_timeout() {
        ActivityError::Timeout(format!("{url}: {err}"))
    } else {
        ActivityError::ExternalCall(format!("{url}: {err}"))
    }
}

#[async_trait]
impl StreamClient for RestStreamClient {
    async fn list_messages(
        &self,
        stream_id: &str,
        since_ms: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        self.get_json(
            format!("{}/v4/streams/{}/messages", self.host, stream_id),
            &[("since", since_ms.to_string())],
        )
        .await
    }

    async fn get_message_status(&self, message_id: &str) -> Result<MessageStatus> {
        self.get_json(
            format!("{}/v1/messages/{}/status", self.host, message_id),
            &[],
        )
        .await
    }

    async fn list_stream_members(&self, stream_id: &str) -> Result<Vec<RosterMember>> {
        let response: MembershipResponse = self
            .get_json(format!("{}/v1/streams/{}/members", self.host, stream_id), &[])
            .await?;
        Ok(response.members)
    }
}
