//! Coverage scoring: how reachable a drug is for this patient.
//!
//! `base_access_score` adjusted by insurance, cost category, tier, prior
//! authorisation, assistance programs, and continuous monitoring, then
//! clamped to [0, 0.90].

use dosewise_contracts::drug::{CostCategory, DrugDefinition};
use dosewise_contracts::profile::{Insurance, Monitor, PatientProfile};
use dosewise_rules::evaluate;

use crate::context::ScoringContext;
use crate::round2;

pub const COVERAGE_CEILING: f64 = 0.90;
pub const PRIOR_AUTH_PENALTY: f64 = 0.20;
pub const CGM_BOOST: f64 = 0.02;

/// Cost category assumed when a drug declares none.
const DEFAULT_COST: CostCategory = CostCategory::Medium;
/// Tier assumed when a drug declares none.
const DEFAULT_TIER: u8 = 2;

pub fn insurance_adjustment(insurance: Insurance) -> f64 {
    match insurance {
        Insurance::Va => 0.10,
        Insurance::Medicare => 0.05,
        Insurance::Medicaid => -0.05,
        Insurance::NoInsurance => -0.25,
        Insurance::Private => 0.0,
    }
}

pub fn cost_adjustment(cost: CostCategory) -> f64 {
    match cost {
        CostCategory::VeryHigh => -0.10,
        CostCategory::High => -0.07,
        CostCategory::Medium => -0.03,
        CostCategory::Low => 0.05,
    }
}

pub fn tier_adjustment(tier: u8) -> f64 {
    match tier {
        4 => -0.12,
        3 => -0.08,
        2 => -0.03,
        1 => 0.02,
        _ => 0.0,
    }
}

/// Assistance programs are worth more the more a drug costs.
pub fn assistance_boost(cost: CostCategory) -> f64 {
    match cost {
        CostCategory::Low => 0.15,
        CostCategory::Medium => 0.20,
        CostCategory::High => 0.25,
        CostCategory::VeryHigh => 0.30,
    }
}

fn monitor_boost(profile: &PatientProfile) -> f64 {
    if profile.monitor == Monitor::Cgm {
        CGM_BOOST
    } else {
        0.0
    }
}

/// Coverage for one drug. Any `deny_if` match on profile facts gives 0.
pub fn coverage(drug: &DrugDefinition, ctx: &ScoringContext<'_>) -> f64 {
    if drug.deny_if.iter().any(|r| evaluate(r, &ctx.profile_rules)) {
        return 0.0;
    }

    let cost = drug.cost.unwrap_or(DEFAULT_COST);
    let mut score = drug.base_access_score;
    score += insurance_adjustment(ctx.profile.insurance);
    score += cost_adjustment(cost);
    score += tier_adjustment(drug.tier.unwrap_or(DEFAULT_TIER));
    if drug.prior_auth_required {
        score -= PRIOR_AUTH_PENALTY;
    }
    if drug.assistance_program {
        score += assistance_boost(cost);
    }
    score += monitor_boost(ctx.profile);

    round2(score.clamp(0.0, COVERAGE_CEILING))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosewise_contracts::config::FormularyConfig;

    const CONFIG: &str = r#"
        [[drugs]]
        id = "Metformin"
        class = "Metformin"
        base_access_score = 0.8
        cost = "low"
        tier = 1
        deny_if = [ { field = "eGFR", op = "lt", value = 30 } ]

        [[drugs]]
        id = "Tirzepatide"
        class = "GLP1"
        cost = "very_high"
        tier = 4
        prior_auth_required = true

        [[drugs]]
        id = "Semaglutide"
        class = "GLP1"
        cost = "high"
        tier = 3
        assistance_program = true

        [[drugs]]
        id = "Unpriced"
        class = "DPP4"
    "#;

    fn config() -> FormularyConfig {
        toml::from_str(CONFIG).unwrap()
    }

    fn score(cfg: &FormularyConfig, profile: &PatientProfile, id: &str) -> f64 {
        let ctx = ScoringContext::new(cfg, profile, None);
        coverage(cfg.drug(id).unwrap(), &ctx)
    }

    #[test]
    fn ceiling_applies() {
        let cfg = config();
        let profile = PatientProfile::builder().egfr(60.0).insurance_plan("VA").monitoring_method("CGM").build(&cfg.drugs);
        // 0.8 + 0.10 + 0.05 + 0.02 + 0.02 = 0.99 -> 0.90
        assert_eq!(score(&cfg, &profile, "Metformin"), 0.90);
    }

    #[test]
    fn deny_rule_zeroes_coverage() {
        let cfg = config();
        let profile = PatientProfile::builder().egfr(20.0).build(&cfg.drugs);
        assert_eq!(score(&cfg, &profile, "Metformin"), 0.0);
    }

    #[test]
    fn uninsured_expensive_drug_floors_at_zero() {
        let cfg = config();
        let profile = PatientProfile::builder().egfr(60.0).insurance_plan("No insurance").build(&cfg.drugs);
        // 0.6 - 0.25 - 0.10 - 0.12 - 0.20 < 0
        assert_eq!(score(&cfg, &profile, "Tirzepatide"), 0.0);
    }

    #[test]
    fn assistance_program_scales_with_cost() {
        let cfg = config();
        let profile = PatientProfile::builder().egfr(60.0).insurance_plan("Blue Cross").build(&cfg.drugs);
        // 0.6 - 0.07 - 0.08 + 0.25 = 0.70
        assert_eq!(score(&cfg, &profile, "Semaglutide"), 0.70);
    }

    #[test]
    fn missing_cost_and_tier_use_defaults() {
        let cfg = config();
        let profile = PatientProfile::builder().egfr(60.0).insurance_plan("Medicare Advantage").build(&cfg.drugs);
        // 0.6 + 0.05 - 0.03 - 0.03 = 0.59
        assert_eq!(score(&cfg, &profile, "Unpriced"), 0.59);
    }
}
