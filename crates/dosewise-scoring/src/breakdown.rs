//! Per-drug audit breakdown for explanation layers.
//!
//! Unlike [`score_all`](crate::ranking::score_all), every drug in the
//! config appears here, excluded ones included, with the reasons and the
//! itemised contributions behind its score.

use dosewise_contracts::drug::DrugDefinition;
use dosewise_contracts::score::DrugBreakdown;

use crate::clinical::assess;
use crate::context::ScoringContext;
use crate::coverage::coverage;

pub fn drug_breakdown(drug: &DrugDefinition, ctx: &ScoringContext<'_>) -> DrugBreakdown {
    let assessment = assess(drug, ctx);
    let raw_coverage = coverage(drug, ctx);
    let denied = assessment.is_denied();

    DrugBreakdown {
        drug: drug.id.clone(),
        class: drug.class.clone(),
        clinical_fit: assessment.fit.fit,
        clinical_fit_rank: assessment.fit.fit_for_ranking,
        // Coverage is meaningless for a drug that cannot be prescribed.
        coverage: if assessment.fit.is_excluded() { 0.0 } else { raw_coverage },
        denied,
        denied_reasons: assessment.denied_reasons,
        applied_boosts: assessment.boosts,
        applied_cautions: assessment.cautions,
        potency: assessment.potency,
    }
}

/// Breakdown for every drug, in config order.
pub fn all_breakdowns(ctx: &ScoringContext<'_>) -> Vec<DrugBreakdown> {
    ctx.drugs().iter().map(|d| drug_breakdown(d, ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosewise_contracts::config::FormularyConfig;
    use dosewise_contracts::glucose::GlucoseSnapshot;
    use dosewise_contracts::profile::PatientProfile;

    const CONFIG: &str = r#"
        [[drugs]]
        id = "Metformin"
        class = "Metformin"
        clinical_base = 0.6
        deny_if = [ { field = "eGFR", op = "lt", value = 30 } ]

        [[drugs]]
        id = "Glipizide"
        class = "Sulfonylurea"
        clinical_base = 0.5
        caution_if = [ { rule = { field = "age", op = "ge", value = 65 }, penalty = 0.10 } ]
    "#;

    #[test]
    fn excluded_drugs_are_listed_with_reasons() {
        let cfg: FormularyConfig = toml::from_str(CONFIG).unwrap();
        let profile = PatientProfile::builder().egfr(20.0).build(&cfg.drugs);
        let ctx = ScoringContext::new(&cfg, &profile, None);
        let rows = all_breakdowns(&ctx);
        assert_eq!(rows.len(), 2);
        let metformin = &rows[0];
        assert!(metformin.denied);
        assert_eq!(metformin.coverage, 0.0);
        assert_eq!(metformin.denied_reasons, vec!["eGFR < 30".to_string()]);
    }

    #[test]
    fn cautions_include_rule_and_hypoglycemia_penalties() {
        let cfg: FormularyConfig = toml::from_str(CONFIG).unwrap();
        let profile = PatientProfile::builder().egfr(60.0).age(70).goal(7.0).build(&cfg.drugs);
        let g = GlucoseSnapshot {
            lows_overnight: true,
            ..Default::default()
        };
        let ctx = ScoringContext::new(&cfg, &profile, Some(&g));
        let row = drug_breakdown(&cfg.drugs[1], &ctx);
        let labels: Vec<&str> = row.applied_cautions.iter().map(|c| c.condition.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Age ≥ 65 (-0.10)", "Overnight lows detected - high hypoglycemia risk (-0.20)"]
        );
        // 0.5 - 0.10 - 0.20 + 0.05
        assert_eq!(row.clinical_fit, 0.25);
        assert!(!row.denied);
        assert!(row.applied_boosts.iter().any(|b| b.condition == "A1C goal <7% (+0.05)"));
    }
}
