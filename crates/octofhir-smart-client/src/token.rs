//! Token endpoint exchange.
//!
//! Trades a signed client assertion for a bearer access token bound to one
//! patient through a base64 launch context.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use serde_json::Value;

use crate::assertion::SignedAssertion;
use crate::error::AuthError;

/// Grant type sent to the token endpoint.
pub const GRANT_TYPE: &str = "client_credentials";

/// Assertion type identifying a JWT bearer client assertion (RFC 7523).
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Bearer access token returned by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for the Authorization header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Patient launch context, base64 encoded for the `launch` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext(String);

impl LaunchContext {
    /// Encodes `{"patient":"<id>"}`.
    #[must_use]
    pub fn patient(patient_id: &str) -> Self {
        let json = serde_json::json!({ "patient": patient_id }).to_string();
        Self(STANDARD.encode(json))
    }

    /// Returns the encoded value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How the token request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenRequestEncoding {
    /// `application/json` body.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded` body.
    Form,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_assertion_type: &'a str,
    client_assertion: &'a str,
    scope: &'a str,
    launch: &'a str,
}

/// Client for a SMART Backend Services token endpoint.
pub struct TokenExchange {
    http: reqwest::Client,
    token_url: String,
    scope: String,
    encoding: TokenRequestEncoding,
}

impl TokenExchange {
    /// Creates an exchange against `token_url` requesting `scope`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            scope: scope.into(),
            encoding: TokenRequestEncoding::default(),
        }
    }

    /// Sets the request body encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TokenRequestEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Exchanges `assertion` for an access token scoped to `patient_id`.
    ///
    /// # Errors
    /// Returns an error if the endpoint is unreachable, answers with a
    /// non-success status, or omits `access_token`.
    pub async fn exchange(
        &self,
        assertion: &SignedAssertion,
        patient_id: &str,
    ) -> Result<AccessToken, AuthError> {
        let launch = LaunchContext::patient(patient_id);
        let body = TokenRequest {
            grant_type: GRANT_TYPE,
            client_assertion_type: CLIENT_ASSERTION_TYPE,
            client_assertion: assertion.as_str(),
            scope: &self.scope,
            launch: launch.as_str(),
        };

        let request = self.http.post(&self.token_url);
        let request = match self.encoding {
            TokenRequestEncoding::Json => request.json(&body),
            TokenRequestEncoding::Form => request.form(&body),
        };

        tracing::debug!(token_url = %self.token_url, patient_id, "requesting access token");
        let resp = request.send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| AuthError::InvalidResponse {
            message: e.to_string(),
        })?;
        let token = json
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(AuthError::MissingAccessToken)?;

        tracing::info!(patient_id, "obtained access token");
        Ok(AccessToken::new(token))
    }
}
