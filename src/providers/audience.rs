//! HTTP client for the external audience platform.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::{DripflowError, Result};

use super::{AudienceCredentials, AudienceSync, ContactProfile};

const PROVIDER_NAME: &str = "audience";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Audience-list client. Credentials are per-workspace and supplied
/// on every call, so one client serves every tenant.
pub struct HttpAudienceClient {
    client: reqwest::Client,
}

impl Default for HttpAudienceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAudienceClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AudienceSync for HttpAudienceClient {
    async fn add_to_list(
        &self,
        credentials: &AudienceCredentials,
        list_id: &str,
        profile: &ContactProfile,
    ) -> Result<()> {
        let url = format!("https://{}/v1/lists/{}/members", credentials.server, list_id);
        let payload = json!({
            "email": profile.email,
            "first_name": profile.first_name,
            "status": "subscribed",
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credentials.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DripflowError::Provider {
                provider: PROVIDER_NAME.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DripflowError::Provider {
                provider: PROVIDER_NAME.to_string(),
                message: format!("list {} rejected member with status {}: {}", list_id, status, body),
            });
        }
        info!("contact {} added to audience list {}", profile.email, list_id);

        Ok(())
    }
}
