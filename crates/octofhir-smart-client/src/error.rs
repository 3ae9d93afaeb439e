//! Credential and token exchange error types.

use std::path::PathBuf;

/// Errors raised while loading identity material or signing an assertion.
///
/// These are fatal for the whole run: without a usable key no patient can be
/// processed.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// A credential file could not be read.
    #[error("Failed to read credential file {}: {source}", path.display())]
    Read {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The client identifier is empty.
    #[error("Client identifier is empty")]
    EmptyClientId,

    /// The private key could not be parsed for the configured algorithm.
    #[error("Invalid private key: {message}")]
    InvalidKey {
        /// Description of why the key was rejected.
        message: String,
    },

    /// The signing algorithm name is not supported.
    #[error("Unsupported signing algorithm: {name}")]
    UnsupportedAlgorithm {
        /// The rejected algorithm name.
        name: String,
    },

    /// Signing the claim set failed.
    #[error("Failed to sign assertion: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },
}

impl CredentialError {
    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }
}

/// Errors raised while exchanging an assertion for an access token.
///
/// Fatal for the patient being processed, never retried.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token endpoint could not be reached.
    #[error("Token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint answered with a non-success status.
    #[error("Token endpoint rejected the request (HTTP {status}): {body}")]
    Rejected {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The response body was not JSON.
    #[error("Token response is not valid JSON: {message}")]
    InvalidResponse {
        /// Parser error description.
        message: String,
    },

    /// The response did not carry an `access_token` string.
    #[error("Token response has no access_token field")]
    MissingAccessToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CredentialError::invalid_key("not a PEM");
        assert_eq!(err.to_string(), "Invalid private key: not a PEM");

        let err = AuthError::Rejected {
            status: 401,
            body: "invalid_client".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Token endpoint rejected the request (HTTP 401): invalid_client"
        );
    }

    #[test]
    fn test_read_error_names_path() {
        let err = CredentialError::Read {
            path: PathBuf::from("settings/va-private.pem"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("settings/va-private.pem"));
    }
}
