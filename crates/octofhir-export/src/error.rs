use std::path::PathBuf;

use octofhir_smart_client::{AuthError, CredentialError};

use crate::resource::ResourceType;

/// Failure of a single read against the FHIR endpoint.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("cannot resolve reference \"{reference}\"")]
    UnresolvableReference { reference: String },
}

/// Errors surfaced by the export pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("authorization failed for patient {patient_id}: {source}")]
    Auth {
        patient_id: String,
        #[source]
        source: AuthError,
    },

    #[error("failed to fetch {resource_type}: {source}")]
    Fetch {
        resource_type: ResourceType,
        #[source]
        source: FetchError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize bundle: {0}")]
    Serialize(#[from] serde_json::Error),
}
