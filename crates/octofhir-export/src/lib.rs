//! # octofhir-export
//!
//! Pulls a patient's clinical record from a FHIR R4 API secured with SMART
//! Backend Services and writes it out as a single `collection` Bundle.
//!
//! ## Modules
//!
//! - [`resource`] - Fetched resource types and their search refinements
//! - [`client`] - Bearer-authenticated reads and reference resolution
//! - [`aggregate`] - Sequential section fetch and medication resolution
//! - [`bundle`] - Bundle model and entry ordering
//! - [`persist`] - Writing bundles to disk
//! - [`export`] - Per-patient pipeline from assertion to file
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Fetch and export error types
//! - [`cli`] - Command-line arguments of the `octofhir-export` binary
//! - [`observability`] - Tracing subscriber setup
//! - [`output`] - Colored status lines and the per-patient summary table

pub mod aggregate;
pub mod bundle;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod observability;
pub mod output;
pub mod persist;
pub mod resource;

pub use aggregate::{Aggregate, AggregateReport, Aggregator};
pub use bundle::Bundle;
pub use client::FhirClient;
pub use config::ExportConfig;
pub use error::{ExportError, FetchError};
pub use export::{ExportPipeline, PatientExport};
pub use resource::ResourceType;
