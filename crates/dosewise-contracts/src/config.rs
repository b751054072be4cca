//! The formulary configuration snapshot.
//!
//! A `FormularyConfig` is deserialized once per process and then shared
//! read-only (typically behind an `Arc`) by every request. Nothing in the
//! engine mutates it.
//!
//! Example:
//! ```toml
//! current_therapy_boost = 0.20
//!
//! [[drugs]]
//! id = "Metformin"
//! class = "Metformin"
//! clinical_base = 0.6
//! deny_if = [ { field = "eGFR", op = "lt", value = 30 } ]
//!
//! [glucose.goal_bands.lt7.fasting]
//! reduce_below = 80
//! ok_min = 80
//! ok_max = 130
//! increase_at = 131
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::drug::{DrugClass, DrugDefinition};

/// Default bonus for a drug the patient already takes.
pub const DEFAULT_CURRENT_THERAPY_BOOST: f64 = 0.20;

/// Top-level structure deserialized from a formulary document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormularyConfig {
    #[serde(default = "default_current_therapy_boost")]
    pub current_therapy_boost: f64,

    /// Drugs in declaration order. The order is the final ranking tie-break.
    #[serde(default)]
    pub drugs: Vec<DrugDefinition>,

    #[serde(default)]
    pub glucose: GlucoseConfig,

    #[serde(default)]
    pub dosing: DosingConfig,
}

impl FormularyConfig {
    /// Look up a drug by id.
    pub fn drug(&self, id: &str) -> Option<&DrugDefinition> {
        self.drugs.iter().find(|d| d.id == id)
    }

    /// Class of a drug id, if the drug is in the formulary.
    pub fn class_of(&self, id: &str) -> Option<&DrugClass> {
        self.drug(id).map(|d| &d.class)
    }

    /// A copy restricted to drugs whose class is in `classes`.
    pub fn restricted_to(&self, classes: &[DrugClass]) -> FormularyConfig {
        FormularyConfig {
            drugs: self
                .drugs
                .iter()
                .filter(|d| classes.contains(&d.class))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

fn default_current_therapy_boost() -> f64 {
    DEFAULT_CURRENT_THERAPY_BOOST
}

// ── Glucose tables ────────────────────────────────────────────────────────────

/// A1C estimation, goal-tier target bands, and potency tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlucoseConfig {
    /// Rows sorted by ascending A1C, typically in 0.1 steps.
    #[serde(default)]
    pub a1c_estimates: Vec<A1cEstimate>,

    #[serde(default)]
    pub goal_bands: GoalBands,

    /// Glucose-lowering potency per drug id (mg/dL).
    #[serde(default)]
    pub potency_by_drug: BTreeMap<String, Potency>,

    /// Fallback potency per class name (mg/dL).
    #[serde(default)]
    pub potency_by_class: BTreeMap<String, Potency>,
}

/// One row of the A1C → average glucose estimation table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct A1cEstimate {
    pub a1c: f64,
    pub fasting: f64,
    pub post_prandial: f64,
}

/// Target bands per goal tier. A missing tier means "no target".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalBands {
    #[serde(default)]
    pub lt7: Option<GoalBand>,
    #[serde(default)]
    pub lt7_5: Option<GoalBand>,
    #[serde(default)]
    pub lt8: Option<GoalBand>,
}

impl GoalBands {
    pub fn for_tier(&self, tier: GoalTier) -> Option<&GoalBand> {
        match tier {
            GoalTier::AtMost7 => self.lt7.as_ref(),
            GoalTier::AtMost7_5 => self.lt7_5.as_ref(),
            GoalTier::Above7_5 => self.lt8.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalBand {
    #[serde(default)]
    pub fasting: Option<AxisBand>,
    #[serde(default)]
    pub post_prandial: Option<AxisBand>,
}

/// Thresholds for a single glucose axis, in mg/dL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBand {
    pub reduce_below: f64,
    pub ok_min: f64,
    /// The target used for potency projection.
    pub ok_max: f64,
    pub increase_at: f64,
}

/// Glucose-lowering capacity in mg/dL per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Potency {
    #[serde(default)]
    pub fasting: Option<f64>,
    #[serde(default)]
    pub post_prandial: Option<f64>,
}

/// A1C goal tier: ≤7.0, ≤7.5, or above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalTier {
    AtMost7,
    AtMost7_5,
    Above7_5,
}

impl GoalTier {
    pub fn for_goal(goal: f64) -> Self {
        if goal <= 7.0 {
            GoalTier::AtMost7
        } else if goal <= 7.5 {
            GoalTier::AtMost7_5
        } else {
            GoalTier::Above7_5
        }
    }
}

// ── Dosing tables ─────────────────────────────────────────────────────────────

/// Starting-dose tables keyed by class name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DosingConfig {
    #[serde(default)]
    pub classes: BTreeMap<String, ClassDosing>,
}

impl DosingConfig {
    pub fn for_class(&self, class: &DrugClass) -> Option<&ClassDosing> {
        self.classes.get(class.as_str())
    }
}

/// Starting-dose table for one class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDosing {
    /// Medication label used when no molecule is chosen.
    #[serde(default)]
    pub medication: Option<String>,

    #[serde(default)]
    pub default_dose: Option<String>,

    #[serde(default)]
    pub bands: Vec<EgfrBand>,

    /// Molecule tables. For SGLT2 the order is the substitution preference.
    #[serde(default)]
    pub by_drug: Vec<MoleculeDosing>,
}

/// Starting-dose table for one molecule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoleculeDosing {
    pub drug: String,

    #[serde(default)]
    pub medication: Option<String>,

    /// Below this eGFR the molecule must not be started.
    #[serde(default)]
    pub min_egfr: Option<f64>,

    #[serde(default)]
    pub bands: Vec<EgfrBand>,

    #[serde(default)]
    pub default_dose: Option<String>,
}

impl MoleculeDosing {
    pub fn eligible_at(&self, egfr: f64) -> bool {
        self.min_egfr.map_or(true, |min| egfr >= min)
    }
}

/// A dose string that applies inside `[min_egfr, max_egfr)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgfrBand {
    #[serde(default)]
    pub min_egfr: Option<f64>,
    #[serde(default)]
    pub max_egfr: Option<f64>,
    pub dose: String,
}

impl EgfrBand {
    pub fn contains(&self, egfr: f64) -> bool {
        self.min_egfr.map_or(true, |min| egfr >= min) && self.max_egfr.map_or(true, |max| egfr < max)
    }
}

/// First band containing `egfr`, else `default`.
pub fn banded_dose<'a>(bands: &'a [EgfrBand], default: Option<&'a str>, egfr: f64) -> Option<&'a str> {
    bands
        .iter()
        .find(|b| b.contains(egfr))
        .map(|b| b.dose.as_str())
        .or(default)
}
