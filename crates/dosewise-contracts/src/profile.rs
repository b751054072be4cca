//! Normalized patient profile.
//!
//! A `PatientProfile` is built once per request and is read-only for the
//! rest of the pipeline. Free-text normalization (plan names, comorbidity
//! spellings, allergy labels) happens here, in `PatientProfileBuilder`, so
//! the scoring crates only ever see canonical values.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::drug::DrugDefinition;

/// Goal applied when the intake form leaves the A1C goal blank.
pub const DEFAULT_PROFILE_GOAL: f64 = 7.5;

/// Comorbidity added when the patient is on no diabetes medication.
pub const NO_ACTIVE_THERAPY: &str = "NO ACTIVE DIABETES THERAPY";

/// Comorbidity labels that imply hypoglycaemia without device data.
pub const HYPOGLYCEMIA_COMORBIDITIES: [&str; 2] =
    ["FREQUENT HYPOGLYCEMIA", "HISTORY OF HYPOGLYCEMIA"];

/// Coverage class derived from the insurance plan text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Insurance {
    #[serde(rename = "VA")]
    Va,
    Medicare,
    Medicaid,
    #[serde(rename = "No Insurance")]
    NoInsurance,
    #[default]
    Private,
}

impl Insurance {
    /// Classify a free-text plan name.
    ///
    /// `va` must appear as a whole word so that plan names such as
    /// "Medicare Advantage" are not read as VA coverage.
    pub fn from_plan_text(plan: &str) -> Self {
        let lower = plan.to_lowercase();
        let is_va = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == "va")
            || lower.contains("veteran");

        if is_va {
            Insurance::Va
        } else if lower.contains("medicare") {
            Insurance::Medicare
        } else if lower.contains("medicaid") {
            Insurance::Medicaid
        } else if lower.contains("no insurance") || lower.contains("uninsured") {
            Insurance::NoInsurance
        } else {
            Insurance::Private
        }
    }
}

impl fmt::Display for Insurance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Insurance::Va => "VA",
            Insurance::Medicare => "Medicare",
            Insurance::Medicaid => "Medicaid",
            Insurance::NoInsurance => "No Insurance",
            Insurance::Private => "Private",
        };
        f.write_str(name)
    }
}

/// Glucose monitoring method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Monitor {
    #[serde(rename = "CGM")]
    Cgm,
    #[default]
    Fingerstick,
}

impl Monitor {
    pub fn from_method_text(method: &str) -> Self {
        let lower = method.to_lowercase();
        if lower.contains("cgm") || lower.contains("continuous") {
            Monitor::Cgm
        } else {
            Monitor::Fingerstick
        }
    }
}

/// What the patient reports taking for one drug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMedication {
    /// Name as entered, e.g. `"Glipizide"` or `"Ozempic"`.
    #[serde(default)]
    pub drug_name: String,
    /// Dose text, e.g. `"1000mg"` or `"5-5-5 units"`.
    #[serde(default)]
    pub dose: String,
    /// Frequency text, e.g. `"BID"` or `"With meals"`.
    #[serde(default)]
    pub frequency: String,
}

/// The normalized patient, as consumed by scoring and de-escalation.
///
/// Numeric fields are optional because intake may omit them; every
/// consumer documents the default it applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub egfr: Option<f64>,
    #[serde(default)]
    pub a1c: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub goal: Option<f64>,
    #[serde(default)]
    pub insurance: Insurance,
    #[serde(default)]
    pub monitor: Monitor,
    #[serde(default)]
    pub can_afford_copay: Option<bool>,

    /// Canonical uppercase labels.
    #[serde(default)]
    pub comorbidities: BTreeSet<String>,

    /// Canonical drug ids the patient currently takes.
    #[serde(default)]
    pub current_drugs: BTreeSet<String>,

    #[serde(default)]
    pub current_medication: BTreeMap<String, CurrentMedication>,

    /// Drug ids excluded by allergy.
    #[serde(default)]
    pub allergy_drug_ids: BTreeSet<String>,

    /// Lowercased allergy labels that matched the formulary.
    #[serde(default)]
    pub allergy_labels: BTreeSet<String>,
}

impl PatientProfile {
    pub fn builder() -> PatientProfileBuilder {
        PatientProfileBuilder::default()
    }

    pub fn is_on(&self, drug_id: &str) -> bool {
        self.current_drugs.contains(drug_id)
    }

    pub fn has_current_therapy(&self) -> bool {
        !self.current_drugs.is_empty()
    }

    /// Case-insensitive comorbidity lookup.
    pub fn has_comorbidity(&self, label: &str) -> bool {
        let wanted = label.trim().to_uppercase();
        self.comorbidities.contains(&wanted)
    }

    pub fn is_allergic_to(&self, drug_id: &str) -> bool {
        self.allergy_drug_ids.contains(drug_id)
    }

    pub fn medication(&self, drug_id: &str) -> Option<&CurrentMedication> {
        self.current_medication.get(drug_id)
    }

    /// eGFR with the conservative 0.0 default.
    pub fn egfr_or_zero(&self) -> f64 {
        self.egfr.unwrap_or(0.0)
    }

    /// A1C strictly above goal. A missing or non-positive A1C is never above.
    pub fn a1c_above_goal(&self) -> bool {
        let a1c = self.a1c.unwrap_or(0.0);
        a1c > 0.0 && a1c > self.goal.unwrap_or(DEFAULT_PROFILE_GOAL)
    }

    /// Comorbidity-inferred hypoglycaemia.
    pub fn has_hypoglycemia_history(&self) -> bool {
        HYPOGLYCEMIA_COMORBIDITIES
            .iter()
            .any(|c| self.comorbidities.contains(*c))
    }

    /// Uninsured and cannot afford a copay.
    pub fn needs_affordability_gate(&self) -> bool {
        self.insurance == Insurance::NoInsurance && self.can_afford_copay == Some(false)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Normalizes raw intake values into a `PatientProfile`.
///
/// ```rust,ignore
/// let profile = PatientProfile::builder()
///     .egfr(52.0)
///     .a1c(8.4)
///     .goal(7.0)
///     .insurance_plan("VA Community Care")
///     .comorbidity("Other: gout")
///     .current_medication("Metformin", CurrentMedication::new("Metformin", "1000mg", "BID"))
///     .build(&config.drugs);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatientProfileBuilder {
    egfr: Option<f64>,
    a1c: Option<f64>,
    age: Option<u32>,
    goal: Option<f64>,
    insurance: Insurance,
    monitor: Monitor,
    can_afford_copay: Option<bool>,
    comorbidities: Vec<String>,
    medications: Vec<(String, CurrentMedication)>,
    allergies: Vec<String>,
}

impl CurrentMedication {
    pub fn new(drug_name: &str, dose: &str, frequency: &str) -> Self {
        Self {
            drug_name: drug_name.to_string(),
            dose: dose.to_string(),
            frequency: frequency.to_string(),
        }
    }
}

impl PatientProfileBuilder {
    pub fn egfr(mut self, egfr: f64) -> Self {
        self.egfr = Some(egfr);
        self
    }

    pub fn a1c(mut self, a1c: f64) -> Self {
        self.a1c = Some(a1c);
        self
    }

    pub fn age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn goal(mut self, goal: f64) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Parse a goal such as `"<7.0%"`. Unparseable text leaves the default.
    pub fn goal_text(mut self, text: &str) -> Self {
        let numeric: String = text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if let Ok(goal) = numeric.parse::<f64>() {
            self.goal = Some(goal);
        }
        self
    }

    pub fn insurance(mut self, insurance: Insurance) -> Self {
        self.insurance = insurance;
        self
    }

    pub fn insurance_plan(mut self, plan: &str) -> Self {
        self.insurance = Insurance::from_plan_text(plan);
        self
    }

    pub fn monitoring_method(mut self, method: &str) -> Self {
        self.monitor = Monitor::from_method_text(method);
        self
    }

    pub fn can_afford_copay(mut self, can_afford: bool) -> Self {
        self.can_afford_copay = Some(can_afford);
        self
    }

    pub fn comorbidity(mut self, label: &str) -> Self {
        self.comorbidities.push(label.to_string());
        self
    }

    pub fn current_medication(mut self, drug_id: &str, medication: CurrentMedication) -> Self {
        self.medications.push((drug_id.to_string(), medication));
        self
    }

    /// An allergy label such as `"Sulfonylureas"` or `"Metformin"`.
    pub fn allergy(mut self, label: &str) -> Self {
        self.allergies.push(label.to_string());
        self
    }

    /// Finish the profile. `drugs` supplies the allergy label → drug id map.
    pub fn build(self, drugs: &[DrugDefinition]) -> PatientProfile {
        let mut comorbidities: BTreeSet<String> = self
            .comorbidities
            .iter()
            .filter_map(|raw| normalize_comorbidity(raw))
            .collect();

        let mut current_drugs = BTreeSet::new();
        let mut current_medication = BTreeMap::new();
        for (drug_id, medication) in self.medications {
            current_drugs.insert(drug_id.clone());
            current_medication.insert(drug_id, medication);
        }
        if current_drugs.is_empty() {
            comorbidities.insert(NO_ACTIVE_THERAPY.to_string());
        }

        let mut allergy_drug_ids = BTreeSet::new();
        let mut allergy_labels = BTreeSet::new();
        for raw in &self.allergies {
            let label = raw.trim();
            // Free-text allergens cannot be mapped to a drug.
            if label.is_empty() || label.starts_with("Other:") {
                continue;
            }
            for drug in drugs {
                if drug.allergy_labels.iter().any(|l| l == label) {
                    allergy_drug_ids.insert(drug.id.clone());
                    allergy_labels.insert(label.to_lowercase());
                }
            }
        }

        PatientProfile {
            egfr: self.egfr,
            a1c: self.a1c,
            age: self.age,
            goal: Some(self.goal.unwrap_or(DEFAULT_PROFILE_GOAL)),
            insurance: self.insurance,
            monitor: self.monitor,
            can_afford_copay: self.can_afford_copay,
            comorbidities,
            current_drugs,
            current_medication,
            allergy_drug_ids,
            allergy_labels,
        }
    }
}

/// Trim, strip an `Other:` prefix, and uppercase. Empty input yields `None`.
pub fn normalize_comorbidity(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let text = trimmed
        .strip_prefix("Other:")
        .map(str::trim)
        .unwrap_or(trimmed);
    if text.is_empty() {
        None
    } else {
        Some(text.to_uppercase())
    }
}
