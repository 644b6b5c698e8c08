//! Outbound provider seams: email delivery and audience-list sync.
//!
//! The executor talks to both collaborators through traits so tests
//! can substitute scripted doubles. The HTTP implementations live in
//! the submodules and are the production defaults.

mod audience;
mod email;

use async_trait::async_trait;

use crate::Result;

pub use audience::HttpAudienceClient;
pub use email::{HttpEmailProvider, unsubscribe_url};

/// One outbound email, fully rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: String,
    pub from: String,
    pub from_name: String,
    pub subject: String,
    pub body: String,
    /// Present only on marketing messages for workspaces with a
    /// public unsubscribe page.
    pub unsubscribe_url: Option<String>,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReceipt {
    /// Provider-side message id, when the provider reports one.
    pub provider_id: Option<String>,
}

/// Email delivery collaborator.
#[async_trait]
pub trait EmailDelivery: Send + Sync {
    async fn send(
        &self,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt>;
}

/// Per-workspace credentials for the audience platform.
#[derive(Debug, Clone)]
pub struct AudienceCredentials {
    pub api_key: String,
    pub server: String,
}

/// Contact fields pushed to an audience list.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactProfile {
    pub email: String,
    pub first_name: String,
}

/// Audience-list sync collaborator.
#[async_trait]
pub trait AudienceSync: Send + Sync {
    async fn add_to_list(
        &self,
        credentials: &AudienceCredentials,
        list_id: &str,
        profile: &ContactProfile,
    ) -> Result<()>;
}
