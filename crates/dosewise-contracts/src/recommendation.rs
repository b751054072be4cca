//! Engine output: option rows, de-escalation plans, and the overall
//! recommendation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::drug::DrugClass;
use crate::glucose::LowsSignal;
use crate::score::ScoreResult;

/// What the clinician is asked to do with a drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionAction {
    Start,
    Increase,
    Continue,
    Reduce,
    Stop,
}

impl fmt::Display for OptionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OptionAction::Start => "Start",
            OptionAction::Increase => "Increase",
            OptionAction::Continue => "Continue",
            OptionAction::Reduce => "Reduce",
            OptionAction::Stop => "Stop",
        };
        f.pad(label)
    }
}

/// One user-facing option row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedOption {
    pub drug: String,
    pub class: DrugClass,
    pub action: OptionAction,
    /// Medication label, e.g. `"Empagliflozin (Jardiance)"` or `"Continue Metformin"`.
    pub medication: String,
    /// Dose text or instruction.
    pub dose: String,
    pub clinical_fit: f64,
    pub coverage: f64,
    /// Set on the row chosen as the lowest-cost option.
    #[serde(default)]
    pub lowest_cost: bool,
}

/// A reduce, stop, or continue instruction for a drug the patient takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseAdjustment {
    pub drug: String,
    pub class: DrugClass,
    pub action: OptionAction,
    /// e.g. `"Reduce Glipizide"` or `"Continue Metformin"`.
    pub medication: String,
    /// e.g. `"Cut dose in half (from 20 mg daily)"`.
    pub instruction: String,
}

/// Output of de-escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeescalationPlan {
    pub signal: LowsSignal,
    /// Drugs to reduce or stop, in ladder order.
    pub reduce: Vec<DoseAdjustment>,
    /// Every other current drug, continued unchanged.
    pub maintain: Vec<DoseAdjustment>,
    /// A1C is also above goal: add-on therapy may follow the reduction.
    pub a1c_above_goal: bool,
    pub assessment: String,
}

/// Direction a glucose axis should move relative to its goal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingAction {
    Reduce,
    NoChange,
    Increase,
}

/// Per-axis interpretation of the patient's readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingInterpretation {
    pub fasting: Option<ReadingAction>,
    pub post_prandial: Option<ReadingAction>,
}

/// The complete answer for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Candidates ordered by fit; empty when de-escalating.
    pub ranked: Vec<ScoreResult>,
    /// Option rows for display.
    pub options: Vec<RecommendedOption>,
    /// Present when hypoglycaemia overrides intensification.
    pub deescalation: Option<DeescalationPlan>,
    pub readings: ReadingInterpretation,
    pub warnings: Vec<String>,
    /// Candidates were limited to low-cost classes.
    pub affordability_gate: bool,
}

impl Recommendation {
    pub fn is_deescalation(&self) -> bool {
        self.deescalation.is_some()
    }
}
