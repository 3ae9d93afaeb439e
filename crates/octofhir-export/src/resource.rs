//! Clinical resource types pulled for a patient and their search refinements.

use std::fmt;

/// Category filter restricting Conditions to the problem list.
pub const CONDITION_CATEGORY: &str =
    "http://terminology.hl7.org/CodeSystem/condition-category|problem-list-item";

/// Clinical status filter restricting Conditions to active ones.
pub const CONDITION_CLINICAL_STATUS: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical|active";

/// FHIR resource types handled by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Patient,
    Condition,
    Observation,
    DiagnosticReport,
    MedicationRequest,
    Immunization,
    AllergyIntolerance,
    Encounter,
    Procedure,
    Device,
    DeviceRequest,
    Medication,
}

impl ResourceType {
    /// Types fetched for every patient, in bundle order.
    ///
    /// Medication is absent: it is only reachable through references.
    pub const FETCH_ORDER: [ResourceType; 11] = [
        ResourceType::Patient,
        ResourceType::Condition,
        ResourceType::Observation,
        ResourceType::DiagnosticReport,
        ResourceType::MedicationRequest,
        ResourceType::Immunization,
        ResourceType::AllergyIntolerance,
        ResourceType::Encounter,
        ResourceType::Procedure,
        ResourceType::Device,
        ResourceType::DeviceRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Condition => "Condition",
            Self::Observation => "Observation",
            Self::DiagnosticReport => "DiagnosticReport",
            Self::MedicationRequest => "MedicationRequest",
            Self::Immunization => "Immunization",
            Self::AllergyIntolerance => "AllergyIntolerance",
            Self::Encounter => "Encounter",
            Self::Procedure => "Procedure",
            Self::Device => "Device",
            Self::DeviceRequest => "DeviceRequest",
            Self::Medication => "Medication",
        }
    }

    /// Search parameters used to list this type for `patient_id`.
    ///
    /// Patient is read by id and has no search form, so it yields nothing.
    pub fn search_params(&self, patient_id: &str) -> Vec<(&'static str, String)> {
        if *self == Self::Patient {
            return Vec::new();
        }
        let mut params = vec![("patient", patient_id.to_string())];
        match self {
            Self::Condition => {
                params.push(("category", CONDITION_CATEGORY.to_string()));
                params.push(("clinical-status", CONDITION_CLINICAL_STATUS.to_string()));
            }
            // _include=MedicationRequest:medication is not honoured upstream;
            // medications are resolved one by one instead.
            Self::MedicationRequest => params.push(("status", "active".to_string())),
            _ => {}
        }
        params
    }

    /// Default scope requested from the token endpoint: `launch` plus read
    /// access to every type the exporter touches, and the types upstream
    /// registers alongside them.
    pub fn default_scope() -> String {
        const EXTRA: [&str; 3] = ["Appointment", "Location", "Organization"];
        let mut types: Vec<&str> = Self::FETCH_ORDER
            .iter()
            .chain(std::iter::once(&Self::Medication))
            .map(ResourceType::as_str)
            .chain(EXTRA)
            .collect();
        types.sort_unstable();

        std::iter::once("launch".to_string())
            .chain(types.into_iter().map(|t| format!("system/{t}.read")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_has_both_filters() {
        let params = ResourceType::Condition.search_params("2000190");
        assert_eq!(
            params,
            vec![
                ("patient", "2000190".to_string()),
                ("category", CONDITION_CATEGORY.to_string()),
                ("clinical-status", CONDITION_CLINICAL_STATUS.to_string()),
            ]
        );
    }

    #[test]
    fn medication_request_is_active_only() {
        let params = ResourceType::MedicationRequest.search_params("2000190");
        assert!(params.contains(&("status", "active".to_string())));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn other_types_only_filter_by_patient() {
        for rt in [ResourceType::Observation, ResourceType::Device, ResourceType::Encounter] {
            assert_eq!(rt.search_params("42"), vec![("patient", "42".to_string())]);
        }
        assert!(ResourceType::Patient.search_params("42").is_empty());
    }

    #[test]
    fn fetch_order_starts_with_patient() {
        assert_eq!(ResourceType::FETCH_ORDER[0], ResourceType::Patient);
        assert_eq!(ResourceType::FETCH_ORDER[10], ResourceType::DeviceRequest);
        assert!(!ResourceType::FETCH_ORDER.contains(&ResourceType::Medication));
    }

    #[test]
    fn default_scope_matches_upstream_registration() {
        assert_eq!(
            ResourceType::default_scope(),
            "launch system/AllergyIntolerance.read system/Appointment.read \
             system/Condition.read system/Device.read system/DeviceRequest.read \
             system/DiagnosticReport.read system/Encounter.read system/Immunization.read \
             system/Location.read system/Medication.read system/MedicationRequest.read \
             system/Observation.read system/Organization.read system/Patient.read \
             system/Procedure.read"
        );
    }
}
