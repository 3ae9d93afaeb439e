use octofhir_smart_client::AccessToken;
use reqwest::Url;
use serde_json::Value;

use crate::error::FetchError;
use crate::resource::ResourceType;

/// Read-only FHIR client bound to one patient-scoped access token.
pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
    token: AccessToken,
}

impl FhirClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: AccessToken) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token,
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(self.token.secret())
            .header("Accept", "application/fhir+json")
    }

    /// Reads `resource_type` for `patient_id`.
    ///
    /// Patient is read by id and returns the resource itself; every other
    /// type is searched by patient and returns a searchset Bundle.
    pub async fn fetch(
        &self,
        resource_type: ResourceType,
        patient_id: &str,
    ) -> Result<Value, FetchError> {
        let req = match resource_type {
            ResourceType::Patient => {
                self.request(&format!("{}/Patient/{patient_id}", self.base_url))
            }
            rt => self
                .request(&format!("{}/{rt}", self.base_url))
                .query(&rt.search_params(patient_id)),
        };
        tracing::debug!(%resource_type, patient_id, "fetching");
        let resp = req.send().await?;
        handle_response(resp).await
    }

    /// Reads the resource a reference points at.
    ///
    /// Absolute URLs are fetched as given; relative `Type/id` references are
    /// resolved against the base URL.
    pub async fn resolve_reference(&self, reference: &str) -> Result<Value, FetchError> {
        let url = self.reference_url(reference)?;
        tracing::debug!(reference, "resolving reference");
        let resp = self.request(url.as_str()).send().await?;
        handle_response(resp).await
    }

    fn reference_url(&self, reference: &str) -> Result<Url, FetchError> {
        let unresolvable = || FetchError::UnresolvableReference {
            reference: reference.to_string(),
        };
        // Contained resources live inside the referencing resource.
        if reference.is_empty() || reference.starts_with('#') {
            return Err(unresolvable());
        }
        if let Ok(url) = Url::parse(reference) {
            return Ok(url);
        }
        Url::parse(&format!("{}/{}", self.base_url, reference.trim_start_matches('/')))
            .map_err(|_| unresolvable())
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value, FetchError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: outcome_diagnostics(&body).unwrap_or(body),
        });
    }

    serde_json::from_str(&body).map_err(FetchError::InvalidJson)
}

/// Joins the diagnostics of an OperationOutcome body, if that is what it is.
fn outcome_diagnostics(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    if json.get("resourceType").and_then(Value::as_str) != Some("OperationOutcome") {
        return None;
    }
    let msgs: Vec<&str> = json
        .get("issue")?
        .as_array()?
        .iter()
        .filter_map(|i| i.get("diagnostics").and_then(Value::as_str))
        .collect();
    (!msgs.is_empty()).then(|| msgs.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FhirClient {
        FhirClient::new(
            reqwest::Client::new(),
            "https://sandbox.example.com/fhir/v0/r4/",
            AccessToken::new("t"),
        )
    }

    #[test]
    fn absolute_reference_used_as_is() {
        let url = client()
            .reference_url("https://other.example.com/r4/Medication/abc")
            .unwrap();
        assert_eq!(url.as_str(), "https://other.example.com/r4/Medication/abc");
    }

    #[test]
    fn relative_reference_joined_to_base() {
        let url = client().reference_url("Medication/abc").unwrap();
        assert_eq!(url.as_str(), "https://sandbox.example.com/fhir/v0/r4/Medication/abc");
    }

    #[test]
    fn contained_reference_rejected() {
        let err = client().reference_url("#med1").unwrap_err();
        assert!(matches!(err, FetchError::UnresolvableReference { .. }));
        assert!(client().reference_url("").is_err());
    }

    #[test]
    fn operation_outcome_diagnostics_extracted() {
        let body = r#"{
            "resourceType": "OperationOutcome",
            "issue": [
                {"severity": "error", "diagnostics": "Token not valid"},
                {"severity": "error", "diagnostics": "Scope missing"}
            ]
        }"#;
        assert_eq!(
            outcome_diagnostics(body).as_deref(),
            Some("Token not valid; Scope missing")
        );
        assert_eq!(outcome_diagnostics("not json"), None);
        assert_eq!(outcome_diagnostics(r#"{"resourceType":"Patient"}"#), None);
    }
}
