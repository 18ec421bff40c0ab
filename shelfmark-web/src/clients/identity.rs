//! Identity provider client
//!
//! Login exchanges a provider-issued access token for the caller's
//! identity; the provider itself (OAuth flows, credential storage) is
//! never reimplemented here.

use reqwest::Client;
use serde::Deserialize;
use shelfmark_common::{Error, Result};
use std::time::Duration;
use tracing::debug;

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(15);

/// Identity provider client
pub struct IdentityClient {
    http_client: Client,
    base_url: String,
}

/// Identity returned by the provider's userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderIdentity {
    pub sub: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(IDENTITY_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Resolve a provider access token to the caller's identity
    pub async fn verify_token(&self, provider_token: &str) -> Result<ProviderIdentity> {
        let url = format!("{}/userinfo", self.base_url);
        debug!(url = %url, "Verifying provider access token");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(provider_token)
            .send()
            .await
            .map_err(|e| Error::External(format!("Identity provider unreachable: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::Unauthorized(
                "Identity provider rejected the access token".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(Error::External(format!(
                "Identity provider returned HTTP {}",
                status
            )));
        }

        let identity: ProviderIdentity = response.json().await.map_err(|e| {
            Error::External(format!("Invalid identity provider response: {}", e))
        })?;

        debug!(sub = %identity.sub, "Provider token verified");
        Ok(identity)
    }
}
