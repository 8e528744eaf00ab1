//! Callback targets: where notifications go.

use async_trait::async_trait;

use crate::callback::CallbackMessage;
use crate::error::CallbackError;

/// Receiver of callback notifications.
///
/// `deliver` is one attempt; retries, timeouts and backoff belong to
/// [`CallbackNotifier`](crate::CallbackNotifier).
#[async_trait]
pub trait CallbackTarget: Send + Sync + 'static {
    async fn deliver(&self, msg: &CallbackMessage) -> Result<(), CallbackError>;

    /// Where notifications go (for logs).
    fn endpoint(&self) -> &str;
}

/// Posts notifications as JSON over HTTP.
///
/// Any HTTP response, whatever its status, counts as delivered; the status is
/// logged. Only transport failures are errors.
#[derive(Debug, Clone)]
pub struct HttpCallback {
    client: reqwest::Client,
    url: String,
}

impl HttpCallback {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Reuses an existing client (connection pool, proxies, TLS settings).
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CallbackTarget for HttpCallback {
    async fn deliver(&self, msg: &CallbackMessage) -> Result<(), CallbackError> {
        let resp = self
            .client
            .post(&self.url)
            .json(msg)
            .send()
            .await
            .map_err(|e| CallbackError::Transport {
                error: e.to_string(),
            })?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!(url = %self.url, %status, ticket = %msg.ticket_id, "callback acknowledged");
        } else {
            tracing::warn!(url = %self.url, %status, ticket = %msg.ticket_id, "callback answered with non-success status");
        }
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
