//! The recommendation engine: one call per patient.
//!
//! The pipeline runs in a fixed order:
//!
//!   Lows? → De-escalation plan (supersedes everything below)
//!   Affordability gate → Score → Rank → Options → Warnings
//!
//! Every step is total. An empty `ranked` list is the only "no answer"
//! outcome and callers must handle it as data.

use std::sync::Arc;

use tracing::{debug, info};

use dosewise_contracts::config::FormularyConfig;
use dosewise_contracts::drug::DrugClass;
use dosewise_contracts::glucose::GlucoseSnapshot;
use dosewise_contracts::profile::PatientProfile;
use dosewise_contracts::recommendation::{
    DeescalationPlan, DoseAdjustment, OptionAction, Recommendation, RecommendedOption,
};
use dosewise_contracts::rule::{Field, Rule};
use dosewise_contracts::score::{DrugBreakdown, ScoreResult};
use dosewise_deescalation::deescalation_plan;
use dosewise_rules::{evaluate, mentions_field, RuleContext};
use dosewise_scoring::{
    all_breakdowns, cheapest_option, interpret_readings, score_all, top_two, ScoringContext,
};
use dosewise_titration::starting::find_molecule;
use dosewise_titration::{
    exceeds_renal_maximum, recommended_dose, NO_CHANGE_DOSE,
};

use crate::traits::ConfigSource;

/// Classes offered to an uninsured patient who cannot afford a copay.
pub const AFFORDABLE_CLASSES: [DrugClass; 6] = [
    DrugClass::Metformin,
    DrugClass::Tzd,
    DrugClass::Sulfonylurea,
    DrugClass::BasalInsulin,
    DrugClass::BolusInsulin,
    DrugClass::NoChange,
];

/// Scores patients against a frozen formulary snapshot.
///
/// Cheap to clone; clones share the snapshot. Safe to call from any
/// number of threads at once.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    config: Arc<FormularyConfig>,
}

impl RecommendationEngine {
    pub fn new(config: Arc<FormularyConfig>) -> Self {
        Self { config }
    }

    /// Take the current snapshot from a source.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        Self::new(source.config())
    }

    pub fn config(&self) -> &FormularyConfig {
        &self.config
    }

    /// Produce the complete recommendation for one patient.
    ///
    /// # Pipeline
    ///
    /// 1. Interpret measured readings against the goal band.
    /// 2. Collect eGFR and renal-maximum warnings for current therapy.
    /// 3. If lows are present and the patient takes anything, return the
    ///    de-escalation plan with no ranked candidates.
    /// 4. Otherwise restrict to affordable classes when the gate applies,
    ///    score and rank, and build the option rows.
    pub fn recommend(
        &self,
        profile: &PatientProfile,
        glucose: Option<&GlucoseSnapshot>,
    ) -> Recommendation {
        let readings = interpret_readings(
            profile,
            &self.config.glucose,
            glucose.and_then(|g| g.fasting_avg),
            glucose.and_then(|g| g.post_pp_avg),
        );
        let warnings = therapy_warnings(profile, &self.config);

        if let Some(plan) = deescalation_plan(profile, glucose, &self.config) {
            let options = deescalation_options(&plan);
            return Recommendation {
                ranked: Vec::new(),
                options,
                deescalation: Some(plan),
                readings,
                warnings,
                affordability_gate: false,
            };
        }

        let affordability_gate = profile.needs_affordability_gate();
        let gated;
        let config: &FormularyConfig = if affordability_gate {
            gated = self.config.restricted_to(&AFFORDABLE_CLASSES);
            info!(
                candidates = gated.drugs.len(),
                "affordability gate applied"
            );
            &gated
        } else {
            &self.config
        };

        let ctx = ScoringContext::new(config, profile, glucose);
        let ranked = score_all(&ctx);
        let options = build_options(&ranked, config, profile);

        debug!(
            ranked = ranked.len(),
            options = options.len(),
            warnings = warnings.len(),
            "recommendation built"
        );

        Recommendation {
            ranked,
            options,
            deescalation: None,
            readings,
            warnings,
            affordability_gate,
        }
    }

    /// Per-drug audit rows for every drug in the formulary, excluded ones
    /// included.
    pub fn breakdown(
        &self,
        profile: &PatientProfile,
        glucose: Option<&GlucoseSnapshot>,
    ) -> Vec<DrugBreakdown> {
        let ctx = ScoringContext::new(&self.config, profile, glucose);
        all_breakdowns(&ctx)
    }
}

// ── Option rows ───────────────────────────────────────────────────────────────

fn deescalation_options(plan: &DeescalationPlan) -> Vec<RecommendedOption> {
    let row = |adj: &DoseAdjustment| RecommendedOption {
        drug: adj.drug.clone(),
        class: adj.class.clone(),
        action: adj.action,
        medication: adj.medication.clone(),
        dose: adj.instruction.clone(),
        clinical_fit: 0.0,
        coverage: 0.0,
        lowest_cost: false,
    };
    plan.reduce.iter().chain(&plan.maintain).map(row).collect()
}

/// Top two by fit, then the cheapest remaining candidate.
///
/// "No Change" is never offered to a patient who takes nothing.
pub fn build_options(
    ranked: &[ScoreResult],
    config: &FormularyConfig,
    profile: &PatientProfile,
) -> Vec<RecommendedOption> {
    let treated = profile.has_current_therapy();
    let offerable: Vec<ScoreResult> = ranked
        .iter()
        .filter(|r| treated || r.class != DrugClass::NoChange)
        .cloned()
        .collect();

    let top = top_two(&offerable);
    let mut options: Vec<RecommendedOption> = top
        .iter()
        .flat_map(|r| option_rows(r, config, profile, false))
        .collect();

    let exclude: Vec<&str> = top.iter().map(|r| r.drug.as_str()).collect();
    if let Some(cheap) = cheapest_option(&offerable, config, &exclude) {
        options.extend(option_rows(cheap, config, profile, true));
    }
    options
}

/// Rows for one ranked candidate. No Change expands to one row per
/// current drug.
fn option_rows(
    result: &ScoreResult,
    config: &FormularyConfig,
    profile: &PatientProfile,
    lowest_cost: bool,
) -> Vec<RecommendedOption> {
    let row = |class: DrugClass, action, medication: String, dose: String| RecommendedOption {
        drug: result.drug.clone(),
        class,
        action,
        medication,
        dose,
        clinical_fit: result.clinical_fit,
        coverage: result.coverage,
        lowest_cost,
    };

    if result.class == DrugClass::NoChange {
        return profile
            .current_drugs
            .iter()
            .map(|id| {
                let drug = config.drug(id);
                let label = drug.map_or(id.as_str(), |d| d.label());
                let class = drug.map_or_else(|| DrugClass::Other(id.clone()), |d| d.class.clone());
                let dose = profile
                    .medication(id)
                    .map(|m| format!("{} {}", m.dose.trim(), m.frequency.trim()).trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| NO_CHANGE_DOSE.to_string());
                row(class, OptionAction::Continue, format!("Continue {label}"), dose)
            })
            .collect();
    }

    let egfr = profile.egfr_or_zero();
    let current = profile.medication(&result.drug).filter(|_| profile.is_on(&result.drug));
    let action = if profile.is_on(&result.drug) {
        OptionAction::Increase
    } else {
        OptionAction::Start
    };
    let dose = recommended_dose(&result.class, egfr, &config.dosing, Some(&result.drug), current);

    // A class-level dose table names its default molecule; a starting drug
    // without its own table keeps the formulary label instead.
    let has_molecule_table = config
        .dosing
        .for_class(&result.class)
        .and_then(|c| find_molecule(c, &result.drug))
        .is_some();
    let medication = match (action, config.drug(&result.drug)) {
        (OptionAction::Start, Some(d)) if !has_molecule_table => d.label().to_string(),
        _ => dose.medication,
    };

    vec![row(result.class.clone(), action, medication, dose.dose)]
}

// ── Warnings ──────────────────────────────────────────────────────────────────

/// A current drug has a deny or caution rule on eGFR that matches now.
///
/// An unreported eGFR never triggers this; the evaluator would read it
/// as 0 and flag every renally-gated drug.
pub fn egfr_therapy_warning(profile: &PatientProfile, config: &FormularyConfig) -> bool {
    !egfr_restricted_drugs(profile, config).is_empty()
}

fn egfr_restricted_drugs<'c>(profile: &PatientProfile, config: &'c FormularyConfig) -> Vec<&'c str> {
    if profile.egfr.is_none() {
        return Vec::new();
    }
    let ctx = RuleContext::from_profile(profile);
    let matches = |rule: &Rule| mentions_field(rule, &Field::Egfr) && evaluate(rule, &ctx);

    profile
        .current_drugs
        .iter()
        .filter_map(|id| config.drug(id))
        .filter(|d| d.deny_if.iter().any(matches) || d.caution_if.iter().any(|c| matches(&c.rule)))
        .map(|d| d.label())
        .collect()
}

/// eGFR restriction and renal-maximum warnings for current therapy.
pub fn therapy_warnings(profile: &PatientProfile, config: &FormularyConfig) -> Vec<String> {
    let Some(egfr) = profile.egfr else {
        return Vec::new();
    };

    let mut warnings: Vec<String> = egfr_restricted_drugs(profile, config)
        .into_iter()
        .map(|label| {
            format!(
                "{label}: eGFR {} restricts current therapy; dose reduction or discontinuation may be needed.",
                egfr.trunc()
            )
        })
        .collect();

    for id in &profile.current_drugs {
        let (Some(drug), Some(med)) = (config.drug(id), profile.medication(id)) else {
            continue;
        };
        let name = if med.drug_name.is_empty() { id.as_str() } else { med.drug_name.as_str() };
        if let Some(text) = exceeds_renal_maximum(&drug.class, med, name, egfr, &config.dosing) {
            warnings.push(format!("{}: {text}", drug.label()));
        }
    }
    warnings
}
