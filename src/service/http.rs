//! HTTP client for the job board notification API.
//! Uses reqwest-middleware for retries on transient failures.
use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;

use super::NotificationService;
use crate::errors::NotifyError;
use crate::models::notification::{Notification, NotificationList};

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Retries for transient failures (5xx, timeouts). 0 disables retrying.
    pub max_retries: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            max_retries: 2,
        }
    }
}

pub struct HttpNotificationService {
    base_url: String,
    client: ClientWithMiddleware,
}

impl HttpNotificationService {
    pub fn new(base_url: &str, options: HttpOptions) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(concat!("jobboard-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let client = if options.max_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(options.max_retries);
            ClientBuilder::new(reqwest_client)
                .with(RetryTransientMiddleware::new_with_policy(retry_policy))
                .build()
        } else {
            ClientBuilder::new(reqwest_client).build()
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn list_url(&self) -> String {
        format!("{}/notifications", self.base_url)
    }

    fn mark_read_url(&self, id: &str) -> String {
        format!(
            "{}/notifications/{}/read",
            self.base_url,
            urlencoding::encode(id)
        )
    }

    async fn send(
        &self,
        request: reqwest_middleware::RequestBuilder,
        token: &str,
    ) -> Result<reqwest::Response, NotifyError> {
        let resp = request
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "notification request failed");
                NotifyError::NetworkFailure(e.to_string())
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = rejection_message(&body);
        tracing::warn!(status = %status, message = ?message, "notification service rejected request");
        Err(NotifyError::ServiceRejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn list(&self, token: &str) -> Result<Vec<Notification>, NotifyError> {
        let url = self.list_url();
        tracing::debug!(url = %url, "fetching notifications");

        let resp = self.send(self.client.get(&url), token).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| NotifyError::NetworkFailure(e.to_string()))?;
        let list: NotificationList =
            serde_json::from_str(&body).map_err(|e| NotifyError::Decode(e.to_string()))?;

        Ok(list.into_vec())
    }

    async fn mark_read(&self, token: &str, id: &str) -> Result<(), NotifyError> {
        let url = self.mark_read_url(id);
        tracing::debug!(url = %url, notification_id = id, "marking notification read");

        self.send(self.client.put(&url), token).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body: the JSON `message`
/// or `error` field if present, else the raw text, truncated.
fn rejection_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(m) = json.get(key).and_then(|v| v.as_str()) {
                return Some(m.to_string());
            }
        }
    }

    Some(body.chars().take(MAX_ERROR_BODY).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_trim_trailing_slash_and_encode_id() {
        let svc = HttpNotificationService::new("http://localhost:5000/api/", HttpOptions::default())
            .unwrap();
        assert_eq!(svc.list_url(), "http://localhost:5000/api/notifications");
        assert_eq!(
            svc.mark_read_url("a b/c"),
            "http://localhost:5000/api/notifications/a%20b%2Fc/read"
        );
    }

    #[test]
    fn test_rejection_message_prefers_json_fields() {
        assert_eq!(
            rejection_message(r#"{"message":"Token expired"}"#).as_deref(),
            Some("Token expired")
        );
        assert_eq!(
            rejection_message(r#"{"error":"not found"}"#).as_deref(),
            Some("not found")
        );
        assert_eq!(rejection_message("  ").as_deref(), None);
        assert_eq!(
            rejection_message("Bad Gateway").as_deref(),
            Some("Bad Gateway")
        );
    }

    #[test]
    fn test_rejection_message_truncates_raw_body() {
        let long = "x".repeat(1000);
        assert_eq!(rejection_message(&long).unwrap().len(), MAX_ERROR_BODY);
    }
}
