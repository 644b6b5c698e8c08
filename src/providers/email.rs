//! HTTP email delivery provider.

use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{DripflowError, Result};

use super::{DeliveryReceipt, EmailDelivery, EmailMessage};

const PROVIDER_NAME: &str = "email";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Build the public unsubscribe link for a marketing message.
///
/// The address is url-safe base64 so it survives as a path segment
/// without percent-encoding surprises.
pub fn unsubscribe_url(
    base_url: &str,
    email: &str,
) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), URL_SAFE_NO_PAD.encode(email.as_bytes()))
}

/// Email provider speaking a JSON send API over HTTP.
pub struct HttpEmailProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

impl HttpEmailProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl EmailDelivery for HttpEmailProvider {
    async fn send(
        &self,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt> {
        if !ADDRESS_RE.is_match(&message.to) {
            return Err(DripflowError::Provider {
                provider: PROVIDER_NAME.to_string(),
                message: format!("invalid recipient address: {}", message.to),
            });
        }

        let mut payload = json!({
            "from": format!("{} <{}>", message.from_name, message.from),
            "to": [format!("{} <{}>", message.to_name, message.to)],
            "subject": message.subject,
            "html": message.body,
        });
        if let Some(url) = &message.unsubscribe_url {
            payload["headers"] = json!({ "List-Unsubscribe": format!("<{}>", url) });
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
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
                message: format!("send rejected with status {}: {}", status, body),
            });
        }

        let accepted: SendResponse = response.json().await.map_err(|err| DripflowError::Provider {
            provider: PROVIDER_NAME.to_string(),
            message: err.to_string(),
        })?;
        info!("email accepted for {} (provider id {:?})", message.to, accepted.id);

        Ok(DeliveryReceipt {
            provider_id: accepted.id,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert!(ADDRESS_RE.is_match("ana@example.com"));
        assert!(ADDRESS_RE.is_match("first.last+tag@mail.example.co"));
        assert!(!ADDRESS_RE.is_match("not-an-address"));
        assert!(!ADDRESS_RE.is_match("spaced out@example.com"));
        assert!(!ADDRESS_RE.is_match("missing@tld"));
    }

    #[test]
    fn test_unsubscribe_url_encodes_address() {
        let url = unsubscribe_url("https://example.com/unsubscribe/", "ana@example.com");
        assert_eq!(url, format!("https://example.com/unsubscribe/{}", URL_SAFE_NO_PAD.encode(b"ana@example.com")));
        // no trailing or doubled slash
        assert!(!url.contains("//un"));
    }
}
