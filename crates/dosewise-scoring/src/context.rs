//! Per-request scoring context.
//!
//! Built once per request from the profile, the optional glucose snapshot,
//! and the shared config. Rule contexts and the lows signal are resolved
//! here so every drug is scored against the same facts.

use dosewise_contracts::config::FormularyConfig;
use dosewise_contracts::drug::{DrugClass, DrugDefinition};
use dosewise_contracts::glucose::{GlucoseSnapshot, LowsSignal};
use dosewise_contracts::profile::PatientProfile;
use dosewise_rules::RuleContext;
use dosewise_titration::next_dose;

use crate::glucose::{estimate_from_a1c, target, Axis};

/// Everything scoring needs for one patient.
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    pub config: &'a FormularyConfig,
    pub profile: &'a PatientProfile,
    pub glucose: Option<&'a GlucoseSnapshot>,
    /// Profile and glucose facts, for clinical rules.
    pub rules: RuleContext,
    /// Profile facts only, for coverage denial.
    pub profile_rules: RuleContext,
    pub lows: Option<LowsSignal>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        config: &'a FormularyConfig,
        profile: &'a PatientProfile,
        glucose: Option<&'a GlucoseSnapshot>,
    ) -> Self {
        let lows = LowsSignal::resolve(profile, glucose);
        let profile_rules = RuleContext::from_profile(profile);
        let rules = glucose_rule_context(config, profile, glucose, lows.is_some(), &profile_rules);
        Self {
            config,
            profile,
            glucose,
            rules,
            profile_rules,
            lows,
        }
    }

    /// Measured average for an axis, else the A1C estimate.
    ///
    /// Without a snapshot there is no glucose data at all, so nothing is
    /// estimated either.
    pub fn current_glucose(&self, axis: Axis) -> Option<f64> {
        let g = self.glucose?;
        let measured = match axis {
            Axis::Fasting => g.fasting_avg,
            Axis::PostPrandial => g.post_pp_avg,
        };
        measured.or_else(|| estimate_from_a1c(self.profile.a1c, &self.config.glucose.a1c_estimates, axis))
    }

    pub fn target(&self, axis: Axis) -> Option<f64> {
        target(self.profile, &self.config.glucose, axis)
    }

    /// The patient takes `drug_id` and its dose is at the ceiling.
    pub fn is_at_max(&self, drug_id: &str, class: &DrugClass) -> bool {
        let Some(med) = self.profile.medication(drug_id) else {
            return false;
        };
        if !self.profile.is_on(drug_id) || med.dose.trim().is_empty() {
            return false;
        }
        let name = if med.drug_name.is_empty() { drug_id } else { med.drug_name.as_str() };
        next_dose(class, &med.dose, &med.frequency, self.profile.egfr_or_zero(), Some(name)).at_max
    }

    /// Any current drug of `class` is at its ceiling.
    pub fn class_at_max(&self, class: &DrugClass) -> bool {
        if *class == DrugClass::NoChange {
            return false;
        }
        self.profile.current_drugs.iter().any(|id| {
            self.config
                .class_of(id)
                .is_some_and(|c| c == class && self.is_at_max(id, c))
        })
    }

    pub fn drugs(&self) -> &'a [DrugDefinition] {
        &self.config.drugs
    }
}

fn glucose_rule_context(
    config: &FormularyConfig,
    profile: &PatientProfile,
    glucose: Option<&GlucoseSnapshot>,
    lows: bool,
    base: &RuleContext,
) -> RuleContext {
    let mut ctx = base.clone();
    let Some(g) = glucose else {
        return ctx;
    };

    let estimates = &config.glucose.a1c_estimates;
    let fasting = g
        .fasting_avg
        .or_else(|| estimate_from_a1c(profile.a1c, estimates, Axis::Fasting));
    let post_prandial = g
        .post_pp_avg
        .or_else(|| estimate_from_a1c(profile.a1c, estimates, Axis::PostPrandial));

    let above = |current: Option<f64>, axis: Axis| {
        let t = target(profile, &config.glucose, axis)?;
        current.map(|c| c - t)
    };
    ctx.fasting_above_goal = above(fasting, Axis::Fasting);
    ctx.post_prandial_above_goal = above(post_prandial, Axis::PostPrandial);
    ctx.fasting_avg = fasting;
    ctx.lows_detected = Some(if lows { 1.0 } else { 0.0 });
    ctx
}
