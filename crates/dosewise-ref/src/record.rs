//! Raw patient intake, as stored in JSON files and the mock data.
//!
//! A `PatientRecord` is what a request-normalization layer receives. It is
//! turned into a [`PatientProfile`] and an optional [`GlucoseSnapshot`]
//! once, at the boundary, and the engine never sees the raw form.

use serde::{Deserialize, Serialize};
use tracing::debug;

use dosewise_contracts::drug::DrugDefinition;
use dosewise_contracts::error::{DosewiseError, DosewiseResult};
use dosewise_contracts::glucose::GlucoseSnapshot;
use dosewise_contracts::profile::{CurrentMedication, PatientProfile};

/// One medication the patient reports taking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    /// Canonical formulary id, e.g. `"Glipizide"`.
    pub drug_id: String,
    /// Name as entered; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dose: String,
    #[serde(default)]
    pub frequency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub egfr: Option<f64>,
    #[serde(default)]
    pub a1c: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    /// Goal text such as `"<7.0%"`.
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub insurance_plan: Option<String>,
    #[serde(default)]
    pub monitoring_method: Option<String>,
    #[serde(default)]
    pub can_afford_copay: Option<bool>,
    #[serde(default)]
    pub comorbidities: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,
    #[serde(default)]
    pub glucose: Option<GlucoseSnapshot>,
}

impl PatientRecord {
    /// Parse a record from JSON text.
    pub fn from_json_str(s: &str) -> DosewiseResult<Self> {
        serde_json::from_str(s).map_err(|e| DosewiseError::ProfileError {
            reason: format!("failed to parse patient JSON: {}", e),
        })
    }

    /// Build the normalized profile.
    ///
    /// Returns `DosewiseError::ProfileError` for values no clinician could
    /// have entered (negative labs) and for medications that name a drug
    /// outside the formulary.
    pub fn to_profile(&self, drugs: &[DrugDefinition]) -> DosewiseResult<PatientProfile> {
        for (name, value) in [("eGFR", self.egfr), ("A1C", self.a1c)] {
            if let Some(v) = value.filter(|v| *v < 0.0 || !v.is_finite()) {
                return Err(DosewiseError::ProfileError {
                    reason: format!("{name} must be a non-negative number, got {v}"),
                });
            }
        }

        let mut builder = PatientProfile::builder();
        if let Some(egfr) = self.egfr {
            builder = builder.egfr(egfr);
        }
        if let Some(a1c) = self.a1c {
            builder = builder.a1c(a1c);
        }
        if let Some(age) = self.age {
            builder = builder.age(age);
        }
        if let Some(goal) = &self.goal {
            builder = builder.goal_text(goal);
        }
        if let Some(plan) = &self.insurance_plan {
            builder = builder.insurance_plan(plan);
        }
        if let Some(method) = &self.monitoring_method {
            builder = builder.monitoring_method(method);
        }
        if let Some(can_afford) = self.can_afford_copay {
            builder = builder.can_afford_copay(can_afford);
        }
        for label in &self.comorbidities {
            builder = builder.comorbidity(label);
        }
        for label in &self.allergies {
            builder = builder.allergy(label);
        }
        for med in &self.medications {
            if !drugs.iter().any(|d| d.id == med.drug_id) {
                return Err(DosewiseError::ProfileError {
                    reason: format!("unknown drug id '{}'", med.drug_id),
                });
            }
            let name = med.name.as_deref().unwrap_or(&med.drug_id);
            builder = builder.current_medication(
                &med.drug_id,
                CurrentMedication::new(name, &med.dose, &med.frequency),
            );
        }

        let profile = builder.build(drugs);
        debug!(
            current = profile.current_drugs.len(),
            comorbidities = profile.comorbidities.len(),
            allergies = profile.allergy_drug_ids.len(),
            "patient profile built"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_formulary;
    use dosewise_contracts::profile::Insurance;
    use dosewise_core::ConfigSource;

    #[test]
    fn json_record_builds_normalized_profile() {
        let formulary = reference_formulary().unwrap();
        let record = PatientRecord::from_json_str(
            r#"{
                "egfr": 52, "a1c": 8.1, "age": 61, "goal": "<7.0%",
                "insurance_plan": "VA Community Care",
                "comorbidities": ["ckd", "Other: gout"],
                "allergies": ["Sulfonylureas"],
                "medications": [ { "drug_id": "Metformin", "dose": "1000mg", "frequency": "BID" } ],
                "glucose": { "fasting_avg": 162, "lows_detected": false }
            }"#,
        )
        .unwrap();
        let profile = record.to_profile(&formulary.config().drugs).unwrap();

        assert_eq!(profile.goal, Some(7.0));
        assert_eq!(profile.insurance, Insurance::Va);
        assert!(profile.has_comorbidity("CKD"));
        assert!(profile.has_comorbidity("GOUT"));
        assert!(profile.is_allergic_to("Glipizide"));
        assert!(profile.is_allergic_to("Glimepiride"));
        assert_eq!(profile.medication("Metformin").unwrap().drug_name, "Metformin");
        assert_eq!(record.glucose.unwrap().fasting_avg, Some(162.0));
    }

    #[test]
    fn unknown_drug_and_negative_labs_are_profile_errors() {
        let formulary = reference_formulary().unwrap();
        let drugs = &formulary.config().drugs;

        let unknown = PatientRecord {
            medications: vec![MedicationEntry {
                drug_id: "Acarbose".to_string(),
                name: None,
                dose: "25mg".to_string(),
                frequency: "TID".to_string(),
            }],
            ..Default::default()
        };
        assert!(matches!(unknown.to_profile(drugs), Err(DosewiseError::ProfileError { .. })));

        let negative = PatientRecord {
            egfr: Some(-4.0),
            ..Default::default()
        };
        match negative.to_profile(drugs) {
            Err(DosewiseError::ProfileError { reason }) => assert!(reason.contains("eGFR")),
            other => panic!("expected ProfileError, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_profile_error() {
        assert!(matches!(
            PatientRecord::from_json_str("{ not json"),
            Err(DosewiseError::ProfileError { .. })
        ));
    }
}
