//! SMS verification provider adapter.
//!
//! Every call round-trips to the external provider; no codes or state are
//! kept locally and nothing is retried.  A transient provider failure goes
//! straight back to the caller as an error response.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::TwilioConfig;
use crate::error::ApiError;

/// The provider status that counts as a successful check.
const APPROVED: &str = "approved";

/// Result of a start or check call: the provider's status string plus its
/// validity flag.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub status: String,
    pub valid: bool,
}

impl VerificationOutcome {
    pub fn approved(&self) -> bool {
        self.status == APPROVED
    }
}

/// Provider transport or rejection failure, with a message safe to show.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        ApiError::Provider(e.0)
    }
}

/// The two operations the verification flow needs.  Production uses
/// [`TwilioVerify`]; tests substitute an in-memory implementation.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Trigger an SMS challenge for a phone number.
    async fn start_verification(
        &self,
        phone_number: &str,
    ) -> Result<VerificationOutcome, ProviderError>;

    /// Submit a six-digit code for checking.
    async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<VerificationOutcome, ProviderError>;
}

/// Twilio Verify v2 REST client.
pub struct TwilioVerify {
    http: reqwest::Client,
    config: TwilioConfig,
}

#[derive(Deserialize)]
struct TwilioVerification {
    status: String,
    #[serde(default)]
    valid: bool,
}

#[derive(Deserialize)]
struct TwilioErrorBody {
    message: Option<String>,
}

impl TwilioVerify {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn resource_url(&self, resource: &str) -> String {
        format!(
            "https://verify.twilio.com/v2/Services/{}/{}",
            self.config.verify_service_sid, resource
        )
    }

    async fn post_form(
        &self,
        url: String,
        form: &[(&str, &str)],
    ) -> Result<VerificationOutcome, ProviderError> {
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "verification provider unreachable");
                ProviderError("Verification provider is unreachable.".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<TwilioErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("verification provider returned {status}"));
            tracing::warn!(%status, %message, "verification request rejected");
            return Err(ProviderError(message));
        }

        let verification: TwilioVerification = response
            .json()
            .await
            .map_err(|e| ProviderError(format!("invalid provider response: {e}")))?;

        Ok(VerificationOutcome {
            status: verification.status,
            valid: verification.valid,
        })
    }
}

#[async_trait]
impl VerificationProvider for TwilioVerify {
    async fn start_verification(
        &self,
        phone_number: &str,
    ) -> Result<VerificationOutcome, ProviderError> {
        self.post_form(
            self.resource_url("Verifications"),
            &[("To", phone_number), ("Channel", "sms")],
        )
        .await
    }

    async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<VerificationOutcome, ProviderError> {
        self.post_form(
            self.resource_url("VerificationChecks"),
            &[("To", phone_number), ("Code", code)],
        )
        .await
    }
}
