use std::path::PathBuf;

use octofhir_smart_client::{SigningAlgorithm, TokenRequestEncoding};
use serde::{Deserialize, Deserializer, Serialize};

use crate::resource::ResourceType;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Patient identifiers exported when none are given on the command line
    #[serde(default, deserialize_with = "deserialize_patients")]
    pub patients: Vec<String>,
    /// Abort a patient on the first failed section fetch
    #[serde(default)]
    pub strict: bool,
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), String> {
        let urls = [
            ("endpoints.token_url", &self.endpoints.token_url),
            ("endpoints.audience", &self.endpoints.audience),
            ("endpoints.fhir_base_url", &self.endpoints.fhir_base_url),
        ];
        for (key, value) in urls {
            if value.trim().is_empty() {
                return Err(format!("{key} must not be empty"));
            }
        }
        self.signing_algorithm()?;
        if self.token.scope.trim().is_empty() {
            return Err("token.scope must not be empty".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    /// Identifiers to export: the command line wins over the config file.
    pub fn patient_ids(&self, from_cli: &[String]) -> Result<Vec<String>, String> {
        let ids: Vec<String> = if from_cli.is_empty() {
            self.patients.clone()
        } else {
            from_cli.to_vec()
        };
        let ids: Vec<String> = ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Err(
                "No patient identifiers given. Pass them as arguments or set `patients` in the config file"
                    .into(),
            );
        }
        for id in &ids {
            check_patient_id(id)?;
        }
        Ok(ids)
    }

    pub fn signing_algorithm(&self) -> Result<SigningAlgorithm, String> {
        self.credentials
            .algorithm
            .parse()
            .map_err(|e| format!("credentials.algorithm: {e}"))
    }
}

/// The identifier ends up both in a URL path segment and in a file name.
fn check_patient_id(id: &str) -> Result<(), String> {
    if id.contains(['/', '\\', '?', '#']) || id.contains("..") {
        return Err(format!(
            "Invalid patient identifier `{id}`: must not contain '/', '\\', '?', '#' or '..'"
        ));
    }
    Ok(())
}

/// Accepts a list, or one comma-separated string as set from the environment.
fn deserialize_patients<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Patients {
        Joined(String),
        List(Vec<Id>),
    }

    let ids = match Patients::deserialize(deserializer)? {
        Patients::Joined(joined) => joined.split(',').map(str::to_owned).collect(),
        Patients::List(ids) => ids
            .into_iter()
            .map(|id| match id {
                Id::Text(text) => text,
                Id::Number(n) => n.to_string(),
            })
            .collect::<Vec<_>>(),
    };
    Ok(ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Token endpoint the assertion is posted to
    pub token_url: String,
    /// `aud` claim of the assertion (the authorization server's token URL)
    pub audience: String,
    /// FHIR R4 base URL
    pub fhir_base_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            token_url: "https://sandbox-api.va.gov/oauth2/health/system/v1/token".into(),
            audience: "https://deptva-eval.okta.com/oauth2/aus8nm1q0f7VQ0a482p7/v1/token".into(),
            fhir_base_url: "https://sandbox-api.va.gov/services/fhir/v0/r4".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub client_id_file: PathBuf,
    pub private_key_file: PathBuf,
    pub algorithm: String,
}

fn default_algorithm() -> String {
    SigningAlgorithm::default().to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            client_id_file: PathBuf::from("settings/va-client-id.txt"),
            private_key_file: PathBuf::from("settings/va-private.pem"),
            algorithm: default_algorithm(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenEncoding {
    #[default]
    Json,
    Form,
}

impl From<TokenEncoding> for TokenRequestEncoding {
    fn from(value: TokenEncoding) -> Self {
        match value {
            TokenEncoding::Json => TokenRequestEncoding::Json,
            TokenEncoding::Form => TokenRequestEncoding::Form,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub scope: String,
    pub encoding: TokenEncoding,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            scope: ResourceType::default_scope(),
            encoding: TokenEncoding::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("va-fhir-data-gen"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

pub mod loader {
    use super::ExportConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "octofhir-export.toml";

    /// Merges the TOML file and the environment. The result is not validated
    /// yet: command-line overrides still apply on top of it.
    pub fn load_config(path: Option<&str>) -> Result<ExportConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., OCTOFHIR_EXPORT__OUTPUT__DIR=out
        // or OCTOFHIR_EXPORT__PATIENTS=2000190,36000216. Values stay strings so
        // identifiers keep leading zeros.
        builder = builder.add_source(Environment::with_prefix("OCTOFHIR_EXPORT").separator("__"));
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        cfg.try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))
    }
}
