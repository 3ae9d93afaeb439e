//! # octofhir-smart-client
//!
//! Client side of the SMART Backend Services authorization flow.
//!
//! This crate provides:
//! - Signed JWT client assertions (RFC 7523) built from a service identity
//! - Exchange of an assertion for a patient-scoped bearer access token
//!
//! ## Modules
//!
//! - [`assertion`] - Service identity material and assertion signing
//! - [`token`] - Token endpoint exchange and launch context encoding
//! - [`error`] - Credential and authorization error types

pub mod assertion;
pub mod error;
pub mod token;

pub use assertion::{
    ASSERTION_LIFETIME_SECONDS, AssertionClaims, ServiceIdentity, SignedAssertion,
    SigningAlgorithm,
};
pub use error::{AuthError, CredentialError};
pub use token::{
    AccessToken, CLIENT_ASSERTION_TYPE, GRANT_TYPE, LaunchContext, TokenExchange,
    TokenRequestEncoding,
};
