//! Per-drug score records and the audit breakdown behind them.

use serde::{Deserialize, Serialize};

use crate::drug::DrugClass;

/// The two clinical totals produced by one scoring pass.
///
/// `fit` includes the current-therapy bonus; `fit_for_ranking` never does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFit {
    pub fit: f64,
    pub fit_for_ranking: f64,
}

impl ClinicalFit {
    pub const EXCLUDED: ClinicalFit = ClinicalFit {
        fit: 0.0,
        fit_for_ranking: 0.0,
    };

    pub fn is_excluded(&self) -> bool {
        self.fit <= 0.0
    }
}

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub drug: String,
    pub class: DrugClass,
    /// In [0, 1].
    pub clinical_fit: f64,
    /// In [0, 1]; excludes the current-therapy bonus.
    pub clinical_fit_rank: f64,
    /// In [0, 0.90].
    pub coverage: f64,
}

/// A single itemised contribution to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    /// Human-readable label, e.g. `"eGFR < 45 (-0.10)"`.
    pub condition: String,
    /// Magnitude of the contribution. Always non-negative for cautions.
    pub amount: f64,
}

impl ScoreAdjustment {
    pub fn boost(label: &str, amount: f64) -> Self {
        Self {
            condition: format!("{label} (+{amount:.2})"),
            amount,
        }
    }

    pub fn penalty(label: &str, amount: f64) -> Self {
        let magnitude = amount.abs();
        Self {
            condition: format!("{label} (-{magnitude:.2})"),
            amount: magnitude,
        }
    }
}

/// Inputs and outputs of the glucose potency projection for one drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotencyDetail {
    pub fasting_current: Option<f64>,
    pub post_prandial_current: Option<f64>,
    pub target_fasting: Option<f64>,
    pub target_post_prandial: Option<f64>,
    /// Potency after the on-therapy halving.
    pub fasting_potency: f64,
    pub post_prandial_potency: f64,
    pub fasting_reaches_target: bool,
    pub post_prandial_reaches_target: bool,
    pub currently_on: bool,
    /// Total added to the clinical score.
    pub boost: f64,
}

/// Full audit record for one drug, including drugs that were excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugBreakdown {
    pub drug: String,
    pub class: DrugClass,
    pub clinical_fit: f64,
    pub clinical_fit_rank: f64,
    /// Zeroed when the clinical fit is zero.
    pub coverage: f64,
    pub denied: bool,
    pub denied_reasons: Vec<String>,
    pub applied_boosts: Vec<ScoreAdjustment>,
    pub applied_cautions: Vec<ScoreAdjustment>,
    #[serde(default)]
    pub potency: Option<PotencyDetail>,
}
