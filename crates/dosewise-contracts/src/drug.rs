//! Drug definitions as loaded from the formulary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Drug id of the "keep current therapy" sentinel.
pub const NO_CHANGE_ID: &str = "No Change";

/// Therapeutic class. Canonical names match the formulary text exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DrugClass {
    Metformin,
    Sglt2,
    Dpp4,
    Glp1,
    Sulfonylurea,
    Tzd,
    BasalInsulin,
    BolusInsulin,
    NoChange,
    Other(String),
}

impl DrugClass {
    /// Classes that carry the hypoglycaemia safety penalty.
    pub fn is_high_hypoglycemia_risk(&self) -> bool {
        matches!(
            self,
            DrugClass::Sulfonylurea | DrugClass::BasalInsulin | DrugClass::BolusInsulin
        )
    }

    pub fn is_insulin(&self) -> bool {
        matches!(self, DrugClass::BasalInsulin | DrugClass::BolusInsulin)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DrugClass::Metformin => "Metformin",
            DrugClass::Sglt2 => "SGLT2",
            DrugClass::Dpp4 => "DPP4",
            DrugClass::Glp1 => "GLP1",
            DrugClass::Sulfonylurea => "Sulfonylurea",
            DrugClass::Tzd => "TZD",
            DrugClass::BasalInsulin => "Basal Insulin",
            DrugClass::BolusInsulin => "Bolus Insulin",
            DrugClass::NoChange => "No Change",
            DrugClass::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for DrugClass {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Metformin" => DrugClass::Metformin,
            "SGLT2" => DrugClass::Sglt2,
            "DPP4" => DrugClass::Dpp4,
            "GLP1" => DrugClass::Glp1,
            "Sulfonylurea" => DrugClass::Sulfonylurea,
            "TZD" => DrugClass::Tzd,
            "Basal Insulin" => DrugClass::BasalInsulin,
            "Bolus Insulin" => DrugClass::BolusInsulin,
            "No Change" => DrugClass::NoChange,
            _ => DrugClass::Other(s),
        }
    }
}

impl From<&str> for DrugClass {
    fn from(s: &str) -> Self {
        DrugClass::from(s.to_string())
    }
}

impl From<DrugClass> for String {
    fn from(c: DrugClass) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for DrugClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Coarse price bucket used when no monthly price is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl CostCategory {
    /// 1 = cheapest.
    pub fn rank(self) -> u8 {
        match self {
            CostCategory::Low => 1,
            CostCategory::Medium => 2,
            CostCategory::High => 3,
            CostCategory::VeryHigh => 4,
        }
    }
}

/// A rule that adds to the clinical score when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalBoost {
    pub rule: Rule,
    #[serde(default)]
    pub add: f64,
}

/// A rule that subtracts from the clinical score when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caution {
    pub rule: Rule,
    #[serde(default)]
    pub penalty: f64,
}

/// One formulary entry.
///
/// Loaded once per process and never mutated; scoring only borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugDefinition {
    /// Canonical drug id, e.g. `"Empagliflozin"`.
    pub id: String,

    pub class: DrugClass,

    /// Label for user-facing rows, e.g. `"Empagliflozin (Jardiance)"`.
    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default = "default_clinical_base")]
    pub clinical_base: f64,

    /// Any match excludes the drug outright.
    #[serde(default)]
    pub deny_if: Vec<Rule>,

    #[serde(default)]
    pub caution_if: Vec<Caution>,

    #[serde(default)]
    pub clinical_boost: Vec<ClinicalBoost>,

    /// Fixed tie-break bonus among drugs of the same class.
    #[serde(default)]
    pub drug_in_class_bonus: f64,

    #[serde(default = "default_base_access_score")]
    pub base_access_score: f64,

    #[serde(default)]
    pub cost: Option<CostCategory>,

    /// Formulary tier 1..=4.
    #[serde(default)]
    pub tier: Option<u8>,

    #[serde(default)]
    pub prior_auth_required: bool,

    /// A manufacturer or VA assistance program exists for this drug.
    #[serde(default)]
    pub assistance_program: bool,

    #[serde(default)]
    pub price_per_month: Option<f64>,

    /// Allergy labels that exclude this drug, e.g. `["Sulfonylureas", "Glipizide"]`.
    #[serde(default)]
    pub allergy_labels: Vec<String>,
}

impl DrugDefinition {
    pub fn is_no_change(&self) -> bool {
        self.class == DrugClass::NoChange || self.id == NO_CHANGE_ID
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

pub const DEFAULT_CLINICAL_BASE: f64 = 0.5;
pub const DEFAULT_BASE_ACCESS_SCORE: f64 = 0.6;

fn default_clinical_base() -> f64 {
    DEFAULT_CLINICAL_BASE
}

fn default_base_access_score() -> f64 {
    DEFAULT_BASE_ACCESS_SCORE
}
