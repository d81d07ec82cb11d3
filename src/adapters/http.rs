use crate::domain::model::ChannelStatus;
use crate::domain::ports::ChannelVerifier;
use crate::utils::error::{PhoneIntelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    phone: &'a str,
}

/// Channel verification over HTTP.
///
/// Sends `POST <endpoint>` with `{"phone": "+..."}` and expects
/// `{"hasChannel": bool, "error": "..."?}` back.
#[derive(Debug, Clone)]
pub struct HttpChannelVerifier {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpChannelVerifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token: None,
        })
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChannelVerifier for HttpChannelVerifier {
    async fn verify(&self, e164: &str) -> Result<ChannelStatus> {
        tracing::debug!("Making verification request to: {}", self.endpoint);

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&VerifyRequest { phone: e164 });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Verification response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PhoneIntelError::VerificationError {
                message: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        let body = response.text().await?;
        let parsed: ChannelStatus = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}
