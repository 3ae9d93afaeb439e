//! Per-patient export: assertion, token, aggregation, file.

use std::path::PathBuf;

use octofhir_smart_client::{ServiceIdentity, SigningAlgorithm, TokenExchange};

use crate::aggregate::{Aggregate, AggregateReport, Aggregator};
use crate::client::FhirClient;
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::persist;

/// A finished export.
#[derive(Debug, Clone)]
pub struct PatientExport {
    pub path: PathBuf,
    pub entries: usize,
    pub report: AggregateReport,
}

/// Everything needed to export patients from one FHIR endpoint.
///
/// Patients are independent: each gets its own assertion and token.
pub struct ExportPipeline {
    http: reqwest::Client,
    identity: ServiceIdentity,
    audience: String,
    exchange: TokenExchange,
    fhir_base_url: String,
    output_dir: PathBuf,
    strict: bool,
}

impl ExportPipeline {
    pub fn new(identity: ServiceIdentity, config: &ExportConfig) -> Self {
        let http = reqwest::Client::new();
        let exchange = TokenExchange::new(
            http.clone(),
            &config.endpoints.token_url,
            &config.token.scope,
        )
        .with_encoding(config.token.encoding.into());
        Self {
            http,
            identity,
            audience: config.endpoints.audience.clone(),
            exchange,
            fhir_base_url: config.endpoints.fhir_base_url.clone(),
            output_dir: config.output.dir.clone(),
            strict: config.strict,
        }
    }

    /// Loads the service identity named in `config` and builds the pipeline.
    pub fn from_config(config: &ExportConfig) -> Result<Self, ExportError> {
        let algorithm: SigningAlgorithm = config.credentials.algorithm.parse()?;
        let identity = ServiceIdentity::load(
            &config.credentials.client_id_file,
            &config.credentials.private_key_file,
            algorithm,
        )?;
        Ok(Self::new(identity, config))
    }

    /// Authorizes for `patient_id` and gathers its Bundle.
    pub async fn aggregate(&self, patient_id: &str) -> Result<Aggregate, ExportError> {
        let assertion = self.identity.sign_assertion(&self.audience)?;
        let token = self
            .exchange
            .exchange(&assertion, patient_id)
            .await
            .map_err(|source| ExportError::Auth {
                patient_id: patient_id.to_string(),
                source,
            })?;

        let client = FhirClient::new(self.http.clone(), &self.fhir_base_url, token);
        Aggregator::new(&client)
            .with_strict(self.strict)
            .aggregate(patient_id)
            .await
    }

    /// Aggregates `patient_id` and writes `<output_dir>/<patient_id>-bundle.json`.
    pub async fn export(&self, patient_id: &str) -> Result<PatientExport, ExportError> {
        let Aggregate { bundle, report } = self.aggregate(patient_id).await?;
        let path = persist::bundle_path(&self.output_dir, patient_id);
        persist::save(&bundle, &path)?;
        Ok(PatientExport {
            path,
            entries: bundle.entry.len(),
            report,
        })
    }
}
