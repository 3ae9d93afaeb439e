//! Pulls every clinical section for one patient and merges it into a Bundle.
//!
//! The upstream API ignores `_include=MedicationRequest:medication`, so the
//! Medication behind each active MedicationRequest is read separately and
//! inserted right after the MedicationRequest section.

use serde_json::Value;

use crate::bundle::{
    Bundle, CollectedResources, assemble_bundle, medication_reference, search_entries,
    wrap_resource,
};
use crate::client::FhirClient;
use crate::error::ExportError;
use crate::resource::ResourceType;

/// Result of aggregating one patient.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub bundle: Bundle,
    pub report: AggregateReport,
}

/// What was fetched for a patient, and what went wrong along the way.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub patient_id: String,
    /// Entry count per fetched type, in fetch order.
    pub sections: Vec<(ResourceType, usize)>,
    /// Types whose fetch failed, with the error text.
    pub failed: Vec<(ResourceType, String)>,
    pub medications_resolved: usize,
    pub medications_unresolved: usize,
}

impl AggregateReport {
    fn new(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.medications_unresolved == 0
    }

    pub fn failure(&self, resource_type: ResourceType) -> Option<&str> {
        self.failed
            .iter()
            .find(|(rt, _)| *rt == resource_type)
            .map(|(_, msg)| msg.as_str())
    }
}

/// Sequentially fetches a patient's resources through one [`FhirClient`].
pub struct Aggregator<'a> {
    client: &'a FhirClient,
    strict: bool,
}

impl<'a> Aggregator<'a> {
    pub fn new(client: &'a FhirClient) -> Self {
        Self {
            client,
            strict: false,
        }
    }

    /// In strict mode the first failed section fetch aborts the aggregation
    /// instead of being exported as an empty section.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub async fn aggregate(&self, patient_id: &str) -> Result<Aggregate, ExportError> {
        let mut collected = CollectedResources::default();
        let mut report = AggregateReport::new(patient_id);

        for resource_type in ResourceType::FETCH_ORDER {
            let fetched = self
                .fetch_section(resource_type, patient_id, &mut report)
                .await?;
            match resource_type {
                ResourceType::Patient => {
                    report.sections.push((resource_type, usize::from(fetched.is_some())));
                    collected.patient = fetched;
                }
                _ => {
                    let entries = fetched.as_ref().map(search_entries).unwrap_or_default();
                    report.sections.push((resource_type, entries.len()));
                    collected.sections.push((resource_type, entries));
                }
            }
        }

        let references: Vec<String> = collected
            .section(ResourceType::MedicationRequest)
            .iter()
            .filter_map(medication_reference)
            .map(str::to_owned)
            .collect();

        for reference in &references {
            match self.client.resolve_reference(reference).await {
                Ok(medication) => collected.medications.push(wrap_resource(medication)),
                Err(error) => {
                    tracing::warn!(patient_id, %reference, %error, "medication reference not resolved");
                    report.medications_unresolved += 1;
                }
            }
        }
        report.medications_resolved = collected.medications.len();
        tracing::info!(
            patient_id,
            count = report.medications_resolved,
            "resolved medication references"
        );

        Ok(Aggregate {
            bundle: assemble_bundle(&collected),
            report,
        })
    }

    async fn fetch_section(
        &self,
        resource_type: ResourceType,
        patient_id: &str,
        report: &mut AggregateReport,
    ) -> Result<Option<Value>, ExportError> {
        match self.client.fetch(resource_type, patient_id).await {
            Ok(value) => Ok(Some(value)),
            Err(source) if self.strict => Err(ExportError::Fetch {
                resource_type,
                source,
            }),
            Err(error) => {
                tracing::warn!(patient_id, %resource_type, %error, "fetch failed, exporting section as empty");
                report.failed.push((resource_type, error.to_string()));
                Ok(None)
            }
        }
    }
}
