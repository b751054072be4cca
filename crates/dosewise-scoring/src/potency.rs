//! Glucose potency projection.
//!
//! For each axis: `projected = current - potency`. A projection at or
//! below the goal-tier target earns +0.05. Being on the drug already earns
//! a flat +0.05 and halves the potency, since part of it is spent.

use tracing::debug;

use dosewise_contracts::config::Potency;
use dosewise_contracts::drug::DrugDefinition;
use dosewise_contracts::score::PotencyDetail;

use crate::context::ScoringContext;
use crate::glucose::Axis;

pub const AXIS_BOOST: f64 = 0.05;
pub const ON_THERAPY_BOOST: f64 = 0.05;
const ON_THERAPY_POTENCY_FACTOR: f64 = 0.5;

/// Configured potency: per drug id, else per class, else zero.
pub fn configured_potency(drug: &DrugDefinition, ctx: &ScoringContext<'_>) -> Potency {
    let cfg = &ctx.config.glucose;
    let by_drug = cfg.potency_by_drug.get(&drug.id);
    let by_class = cfg.potency_by_class.get(drug.class.as_str());
    let pick = |f: fn(&Potency) -> Option<f64>| by_drug.and_then(f).or_else(|| by_class.and_then(f));
    Potency {
        fasting: pick(|p| p.fasting),
        post_prandial: pick(|p| p.post_prandial),
    }
}

fn reaches(current: Option<f64>, potency: f64, target: Option<f64>) -> bool {
    matches!((current, target), (Some(c), Some(t)) if c - potency <= t)
}

/// Project the drug's effect. Callers skip the "No Change" sentinel.
pub fn potency_detail(drug: &DrugDefinition, ctx: &ScoringContext<'_>) -> PotencyDetail {
    let currently_on = ctx.profile.is_on(&drug.id);
    let factor = if currently_on { ON_THERAPY_POTENCY_FACTOR } else { 1.0 };
    let potency = configured_potency(drug, ctx);
    let fasting_potency = potency.fasting.unwrap_or(0.0) * factor;
    let post_prandial_potency = potency.post_prandial.unwrap_or(0.0) * factor;

    let fasting_current = ctx.current_glucose(Axis::Fasting);
    let post_prandial_current = ctx.current_glucose(Axis::PostPrandial);
    let target_fasting = ctx.target(Axis::Fasting);
    let target_post_prandial = ctx.target(Axis::PostPrandial);

    let fasting_reaches_target = reaches(fasting_current, fasting_potency, target_fasting);
    let post_prandial_reaches_target = reaches(post_prandial_current, post_prandial_potency, target_post_prandial);

    let mut boost = 0.0;
    if fasting_reaches_target {
        boost += AXIS_BOOST;
    }
    if post_prandial_reaches_target {
        boost += AXIS_BOOST;
    }
    if currently_on {
        boost += ON_THERAPY_BOOST;
    }

    debug!(
        drug = %drug.id,
        fasting_reaches_target,
        post_prandial_reaches_target,
        currently_on,
        boost,
        "glucose potency projected"
    );

    PotencyDetail {
        fasting_current,
        post_prandial_current,
        target_fasting,
        target_post_prandial,
        fasting_potency,
        post_prandial_potency,
        fasting_reaches_target,
        post_prandial_reaches_target,
        currently_on,
        boost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosewise_contracts::config::FormularyConfig;
    use dosewise_contracts::glucose::GlucoseSnapshot;
    use dosewise_contracts::profile::{CurrentMedication, PatientProfile};

    const CONFIG: &str = r#"
        [[drugs]]
        id = "Metformin"
        class = "Metformin"

        [[drugs]]
        id = "Empagliflozin"
        class = "SGLT2"

        [glucose.goal_bands.lt7_5.fasting]
        reduce_below = 80
        ok_min = 80
        ok_max = 130
        increase_at = 131

        [glucose.goal_bands.lt7_5.post_prandial]
        reduce_below = 100
        ok_min = 100
        ok_max = 180
        increase_at = 181

        [glucose.potency_by_class.Metformin]
        fasting = 60
        post_prandial = 60

        [glucose.potency_by_class.SGLT2]
        fasting = 25
        post_prandial = 10

        [glucose.potency_by_drug.Empagliflozin]
        fasting = 30
    "#;

    fn config() -> FormularyConfig {
        toml::from_str(CONFIG).unwrap()
    }

    fn glucose(fasting: f64, post_prandial: f64) -> GlucoseSnapshot {
        GlucoseSnapshot {
            fasting_avg: Some(fasting),
            post_pp_avg: Some(post_prandial),
            ..Default::default()
        }
    }

    #[test]
    fn drug_potency_overrides_class_per_axis() {
        let cfg = config();
        let profile = PatientProfile::builder().goal(7.5).build(&cfg.drugs);
        let ctx = ScoringContext::new(&cfg, &profile, None);
        let p = configured_potency(&cfg.drugs[1], &ctx);
        assert_eq!(p.fasting, Some(30.0));
        assert_eq!(p.post_prandial, Some(10.0), "falls back to class value");
    }

    #[test]
    fn both_axes_reach_target() {
        let cfg = config();
        let profile = PatientProfile::builder().goal(7.5).build(&cfg.drugs);
        let g = glucose(180.0, 230.0);
        let ctx = ScoringContext::new(&cfg, &profile, Some(&g));
        let detail = potency_detail(&cfg.drugs[0], &ctx);
        assert!(detail.fasting_reaches_target);
        assert!(detail.post_prandial_reaches_target);
        assert!((detail.boost - 0.10).abs() < 1e-9);
    }

    #[test]
    fn on_therapy_halves_potency_and_adds_flat_boost() {
        let cfg = config();
        let profile = PatientProfile::builder()
            .goal(7.5)
            .current_medication("Metformin", CurrentMedication::new("Metformin", "500mg", "daily"))
            .build(&cfg.drugs);
        let g = glucose(180.0, 230.0);
        let ctx = ScoringContext::new(&cfg, &profile, Some(&g));
        let detail = potency_detail(&cfg.drugs[0], &ctx);
        assert_eq!(detail.fasting_potency, 30.0);
        assert!(!detail.fasting_reaches_target, "180 - 30 is above 130");
        assert!(!detail.post_prandial_reaches_target, "230 - 30 is above 180");
        assert!((detail.boost - 0.05).abs() < 1e-9, "only the on-therapy boost applies");
    }

    #[test]
    fn no_glucose_data_keeps_on_therapy_boost() {
        let cfg = config();
        let profile = PatientProfile::builder()
            .a1c(9.0)
            .current_medication("Metformin", CurrentMedication::new("Metformin", "500mg", "daily"))
            .build(&cfg.drugs);
        let ctx = ScoringContext::new(&cfg, &profile, None);
        let detail = potency_detail(&cfg.drugs[0], &ctx);
        assert_eq!(detail.fasting_current, None);
        assert!((detail.boost - ON_THERAPY_BOOST).abs() < 1e-9);
    }
}
