//! JWT client assertions for SMART Backend Services.
//!
//! A backend service proves its identity to the token endpoint with a short
//! lived JWT signed by its private key (RFC 7523). The same identifier is used
//! for both the `iss` and `sub` claims.
//!
//! ## Supported Algorithms
//!
//! - **RS256**: RSA with SHA-256 (what most sandboxes register keys for)
//! - **RS384**: RSA with SHA-384 (SMART on FHIR preferred)
//! - **ES384**: ECDSA with P-384 curve (SMART on FHIR preferred, smaller keys)
//!
//! ## Example
//!
//! ```ignore
//! use octofhir_smart_client::{ServiceIdentity, SigningAlgorithm};
//!
//! let identity = ServiceIdentity::load(
//!     "settings/va-client-id.txt",
//!     "settings/va-private.pem",
//!     SigningAlgorithm::RS256,
//! )?;
//! let assertion = identity.sign_assertion("https://auth.example.com/token")?;
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::CredentialError;

/// Lifetime of a signed assertion, in seconds.
pub const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms for client assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SigningAlgorithm {
    /// RSA with SHA-256.
    #[default]
    RS256,
    /// RSA with SHA-384.
    RS384,
    /// ECDSA with P-384 curve.
    ES384,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::ES384 => Algorithm::ES384,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::ES384 => "ES384",
        }
    }

    /// Returns `true` if this is an RSA-based algorithm.
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "ES384" => Ok(Self::ES384),
            _ => Err(CredentialError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claim set of a client assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    /// Audience (the authorization server's token URL).
    pub aud: String,

    /// Issuer (the client identifier).
    pub iss: String,

    /// Subject (the client identifier).
    pub sub: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// JWT ID, unique per assertion.
    pub jti: String,
}

impl AssertionClaims {
    /// Builds a fresh claim set issued at `now`.
    #[must_use]
    pub fn issue(client_id: &str, audience: &str, now: OffsetDateTime) -> Self {
        let iat = now.unix_timestamp();
        Self {
            aud: audience.to_string(),
            iss: client_id.to_string(),
            sub: client_id.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECONDS,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// A signed, compact-serialized client assertion.
#[derive(Clone)]
pub struct SignedAssertion {
    token: String,
    claims: AssertionClaims,
}

impl SignedAssertion {
    /// The compact JWT string sent as `client_assertion`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The claims this assertion was signed over.
    #[must_use]
    pub fn claims(&self) -> &AssertionClaims {
        &self.claims
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAssertion")
            .field("token", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

// ============================================================================
// Service Identity
// ============================================================================

/// Identity material of a backend service: its client identifier and the
/// private key registered with the authorization server.
pub struct ServiceIdentity {
    client_id: String,
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
}

impl ServiceIdentity {
    /// Builds an identity from an in-memory PEM private key.
    ///
    /// # Errors
    /// Returns an error if the client identifier is blank or the PEM data
    /// does not hold a key usable with `algorithm`.
    pub fn from_pem(
        client_id: &str,
        algorithm: SigningAlgorithm,
        private_pem: &str,
    ) -> Result<Self, CredentialError> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(CredentialError::EmptyClientId);
        }

        let encoding_key = if algorithm.is_rsa() {
            EncodingKey::from_rsa_pem(private_pem.as_bytes())
        } else {
            EncodingKey::from_ec_pem(private_pem.as_bytes())
        }
        .map_err(|e| CredentialError::invalid_key(e.to_string()))?;

        Ok(Self {
            client_id: client_id.to_string(),
            algorithm,
            encoding_key,
        })
    }

    /// Reads the client identifier and private key from disk.
    ///
    /// # Errors
    /// Returns an error if either file is unreadable or the key is invalid.
    pub fn load(
        client_id_path: impl AsRef<Path>,
        private_key_path: impl AsRef<Path>,
        algorithm: SigningAlgorithm,
    ) -> Result<Self, CredentialError> {
        let client_id = read_file(client_id_path.as_ref())?;
        let private_pem = read_file(private_key_path.as_ref())?;
        let identity = Self::from_pem(&client_id, algorithm, &private_pem)?;
        tracing::debug!(
            client_id = %identity.client_id,
            algorithm = %identity.algorithm,
            "loaded service identity"
        );
        Ok(identity)
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Signs a new single-use assertion for `audience`, valid for one hour.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn sign_assertion(&self, audience: &str) -> Result<SignedAssertion, CredentialError> {
        let claims = AssertionClaims::issue(&self.client_id, audience, OffsetDateTime::now_utc());
        let header = Header::new(self.algorithm.to_jwt_algorithm());
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| CredentialError::signing(e.to_string()))?;
        Ok(SignedAssertion { token, claims })
    }
}

impl fmt::Debug for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceIdentity")
            .field("client_id", &self.client_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn read_file(path: &Path) -> Result<String, CredentialError> {
    fs::read_to_string(path).map_err(|source| CredentialError::Read {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
