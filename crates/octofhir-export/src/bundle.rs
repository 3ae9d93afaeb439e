//! Collection Bundle assembled from a patient's fetched resources.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::resource::ResourceType;

/// A FHIR Bundle. Entries are kept as raw JSON so that whatever the server
/// sent (`fullUrl`, `search`, extensions) is written out untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    #[serde(default)]
    pub entry: Vec<Value>,
}

impl Bundle {
    /// A `collection` Bundle holding `entry`.
    pub fn collection(entry: Vec<Value>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: "collection".to_string(),
            entry,
        }
    }
}

/// Wraps a bare resource as a Bundle entry.
pub fn wrap_resource(resource: Value) -> Value {
    json!({ "resource": resource })
}

/// Entries of a searchset Bundle. A missing or malformed `entry` is empty.
pub fn search_entries(bundle: &Value) -> Vec<Value> {
    bundle
        .get("entry")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// `resource.medicationReference.reference` of a MedicationRequest entry.
pub fn medication_reference(entry: &Value) -> Option<&str> {
    entry
        .get("resource")?
        .get("medicationReference")?
        .get("reference")?
        .as_str()
}

/// Everything fetched for one patient, in fetch order.
#[derive(Debug, Clone, Default)]
pub struct CollectedResources {
    pub patient: Option<Value>,
    /// Search results per type, Patient excluded.
    pub sections: Vec<(ResourceType, Vec<Value>)>,
    /// Resolved Medication entries, already wrapped.
    pub medications: Vec<Value>,
}

impl CollectedResources {
    pub fn section(&self, resource_type: ResourceType) -> &[Value] {
        self.sections
            .iter()
            .find(|(rt, _)| *rt == resource_type)
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or_default()
    }
}

/// Flattens collected resources into a collection Bundle.
///
/// Order: Patient, then each section in fetch order, with resolved
/// Medications directly after the MedicationRequest section. Nothing is
/// deduplicated.
pub fn assemble_bundle(collected: &CollectedResources) -> Bundle {
    let mut entry = Vec::new();
    if let Some(patient) = &collected.patient {
        entry.push(wrap_resource(patient.clone()));
    }

    let mut medications_placed = false;
    for (resource_type, entries) in &collected.sections {
        entry.extend(entries.iter().cloned());
        if *resource_type == ResourceType::MedicationRequest {
            entry.extend(collected.medications.iter().cloned());
            medications_placed = true;
        }
    }
    if !medications_placed {
        entry.extend(collected.medications.iter().cloned());
    }

    Bundle::collection(entry)
}
