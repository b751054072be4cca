//! Clinical fit scoring.
//!
//! One pass produces both totals: `fit` includes the current-therapy
//! bonus, `fit_for_ranking` never does. The pass also records every
//! contribution so the audit breakdown and the score cannot disagree.
//!
//! Order of operations:
//!
//! 1. Allergy, at-max-dose, class-at-max-dose, and `deny_if` exclusions.
//! 2. `clinical_base` + matching boosts − matching cautions.
//! 3. Hypoglycaemia penalty (high-risk classes, one tier).
//! 4. In-class bonus and goal-tightness bonus.
//! 5. Current-therapy bonus (`fit` only).
//! 6. Clamp to [0, 1], then to 0.90 unless the drug is "No Change".
//! 7. Glucose potency added to both, clamped to [0, 1] only.
//! 8. Round to two decimals.

use tracing::debug;

use dosewise_contracts::drug::{DrugClass, DrugDefinition};
use dosewise_contracts::glucose::LowsSignal;
use dosewise_contracts::score::{ClinicalFit, PotencyDetail, ScoreAdjustment};
use dosewise_rules::{describe, evaluate};

use crate::context::ScoringContext;
use crate::glucose::profile_goal;
use crate::potency::{potency_detail, AXIS_BOOST, ON_THERAPY_BOOST};
use crate::round2;

/// Ceiling for every drug except "No Change", before potency.
pub const CLINICAL_CEILING: f64 = 0.90;

pub const ALLERGY_REASON: &str = "Allergy to this drug/class";
pub const AT_MAX_REASON: &str = "Patient at max dose of this drug";
pub const CLASS_AT_MAX_REASON: &str =
    "Patient already on this drug class at max dose; do not add another drug in same class";

// ── Hypoglycaemia penalty ─────────────────────────────────────────────────────

/// The single hypoglycaemia penalty tier applied to a drug.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HypoglycemiaPenalty {
    /// Positive magnitude to subtract.
    pub amount: f64,
    pub reason: &'static str,
}

/// Penalty for a high-risk class given the resolved lows signal.
///
/// Overnight lows win over any other signal; after-meal-only lows touch
/// Bolus Insulin alone.
pub fn hypoglycemia_penalty(class: &DrugClass, lows: Option<LowsSignal>) -> Option<HypoglycemiaPenalty> {
    if !class.is_high_hypoglycemia_risk() {
        return None;
    }
    match lows? {
        LowsSignal::Overnight => Some(HypoglycemiaPenalty {
            amount: 0.20,
            reason: "Overnight lows detected - high hypoglycemia risk",
        }),
        LowsSignal::Unspecified { .. } | LowsSignal::AfterMeals { also_unspecified: true } => {
            Some(HypoglycemiaPenalty {
                amount: 0.15,
                reason: "Hypoglycemia detected - use with caution",
            })
        }
        LowsSignal::AfterMeals { also_unspecified: false } if *class == DrugClass::BolusInsulin => {
            Some(HypoglycemiaPenalty {
                amount: 0.10,
                reason: "Post-meal lows detected - review bolus timing/dose",
            })
        }
        LowsSignal::AfterMeals { .. } => None,
    }
}

/// Bonus for a tight A1C goal.
pub fn goal_bonus(goal: f64) -> Option<(f64, &'static str)> {
    if goal <= 7.0 {
        Some((0.05, "A1C goal <7%"))
    } else if goal <= 7.5 {
        Some((0.03, "A1C goal <7.5%"))
    } else {
        None
    }
}

// ── Assessment ────────────────────────────────────────────────────────────────

/// Result of scoring one drug, with every contribution itemised.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalAssessment {
    /// Final totals: clamped, potency applied, rounded.
    pub fit: ClinicalFit,
    pub denied_reasons: Vec<String>,
    pub boosts: Vec<ScoreAdjustment>,
    pub cautions: Vec<ScoreAdjustment>,
    /// Present when potency was projected (drug not excluded, not "No Change").
    pub potency: Option<PotencyDetail>,
}

impl ClinicalAssessment {
    pub fn is_denied(&self) -> bool {
        !self.denied_reasons.is_empty() || self.fit.is_excluded()
    }
}

/// Score one drug for this patient.
pub fn assess(drug: &DrugDefinition, ctx: &ScoringContext<'_>) -> ClinicalAssessment {
    let profile = ctx.profile;
    let mut denied_reasons = Vec::new();
    let mut boosts = Vec::new();
    let mut cautions = Vec::new();

    if profile.is_allergic_to(&drug.id) {
        denied_reasons.push(ALLERGY_REASON.to_string());
    }
    let at_max = ctx.is_at_max(&drug.id, &drug.class);
    if at_max {
        denied_reasons.push(AT_MAX_REASON.to_string());
    } else if ctx.class_at_max(&drug.class) {
        denied_reasons.push(CLASS_AT_MAX_REASON.to_string());
    }
    for rule in &drug.deny_if {
        if evaluate(rule, &ctx.rules) {
            denied_reasons.push(describe(rule));
        }
    }

    let mut score = drug.clinical_base;
    boosts.push(ScoreAdjustment::boost("Clinical base", drug.clinical_base));

    for boost in &drug.clinical_boost {
        if evaluate(&boost.rule, &ctx.rules) {
            score += boost.add;
            boosts.push(ScoreAdjustment::boost(&describe(&boost.rule), boost.add));
        }
    }
    for caution in &drug.caution_if {
        if evaluate(&caution.rule, &ctx.rules) {
            score -= caution.penalty;
            cautions.push(ScoreAdjustment::penalty(&describe(&caution.rule), caution.penalty));
        }
    }

    if let Some(penalty) = hypoglycemia_penalty(&drug.class, ctx.lows) {
        score -= penalty.amount;
        cautions.push(ScoreAdjustment::penalty(penalty.reason, penalty.amount));
    }

    if drug.drug_in_class_bonus > 0.0 {
        boosts.push(ScoreAdjustment::boost("Drug in class", drug.drug_in_class_bonus));
    } else if drug.drug_in_class_bonus < 0.0 {
        cautions.push(ScoreAdjustment::penalty("Drug in class", drug.drug_in_class_bonus.abs()));
    }
    score += drug.drug_in_class_bonus;

    if let Some((bonus, label)) = goal_bonus(profile_goal(profile)) {
        score += bonus;
        boosts.push(ScoreAdjustment::boost(label, bonus));
    }

    let mut fit = score;
    if profile.is_on(&drug.id) {
        let bonus = ctx.config.current_therapy_boost;
        fit += bonus;
        boosts.push(ScoreAdjustment::boost("Current therapy", bonus));
    }

    let ceiling = if drug.class == DrugClass::NoChange { 1.0 } else { CLINICAL_CEILING };
    let clamp_base = |v: f64| v.min(1.0).min(ceiling).max(0.0);
    let mut totals = ClinicalFit {
        fit: clamp_base(fit),
        fit_for_ranking: clamp_base(score),
    };

    if !denied_reasons.is_empty() {
        debug!(drug = %drug.id, reasons = ?denied_reasons, "drug excluded");
        return ClinicalAssessment {
            fit: ClinicalFit::EXCLUDED,
            denied_reasons,
            boosts,
            cautions,
            potency: None,
        };
    }

    let mut potency = None;
    if totals.fit > 0.0 && !drug.is_no_change() {
        let detail = potency_detail(drug, ctx);
        if detail.fasting_reaches_target {
            boosts.push(ScoreAdjustment::boost("Fasting target reachable", AXIS_BOOST));
        }
        if detail.post_prandial_reaches_target {
            boosts.push(ScoreAdjustment::boost("Post-prandial target reachable", AXIS_BOOST));
        }
        if detail.currently_on {
            boosts.push(ScoreAdjustment::boost("Potency on therapy", ON_THERAPY_BOOST));
        }
        // The 0.90 ceiling is not reapplied here.
        totals.fit = (totals.fit + detail.boost).clamp(0.0, 1.0);
        totals.fit_for_ranking = (totals.fit_for_ranking + detail.boost).clamp(0.0, 1.0);
        potency = Some(detail);
    }

    let fit = ClinicalFit {
        fit: round2(totals.fit),
        fit_for_ranking: round2(totals.fit_for_ranking),
    };
    debug!(drug = %drug.id, fit = fit.fit, fit_for_ranking = fit.fit_for_ranking, "clinical fit scored");

    ClinicalAssessment {
        fit,
        denied_reasons,
        boosts,
        cautions,
        potency,
    }
}

/// Both clinical totals for one drug.
pub fn clinical_fit(drug: &DrugDefinition, ctx: &ScoringContext<'_>) -> ClinicalFit {
    assess(drug, ctx).fit
}
