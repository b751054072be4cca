//! Load-time range checks for a parsed formulary.
//!
//! Deserialization already guarantees shape; these checks catch values
//! that parse but would make scores meaningless. The first violation is
//! returned and nothing is repaired silently.

use std::collections::BTreeSet;

use tracing::warn;

use dosewise_contracts::config::{FormularyConfig, Potency};
use dosewise_contracts::error::{DosewiseError, DosewiseResult};

fn invalid(drug: &str, reason: impl Into<String>) -> DosewiseError {
    let reason = reason.into();
    warn!(drug = %drug, reason = %reason, "formulary validation failed");
    DosewiseError::ConfigValidation {
        drug: drug.to_string(),
        reason,
    }
}

fn check_unit(drug: &str, name: &str, value: f64) -> DosewiseResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(drug, format!("{name} must be within [0, 1], got {value}")))
    }
}

fn check_potency(key: &str, potency: &Potency) -> DosewiseResult<()> {
    for (axis, value) in [("fasting", potency.fasting), ("post_prandial", potency.post_prandial)] {
        if let Some(v) = value.filter(|v| *v < 0.0) {
            return Err(invalid(key, format!("{axis} potency must be non-negative, got {v}")));
        }
    }
    Ok(())
}

/// Check every range constraint on `config`.
pub fn validate(config: &FormularyConfig) -> DosewiseResult<()> {
    let mut seen = BTreeSet::new();
    for drug in &config.drugs {
        if !seen.insert(drug.id.as_str()) {
            return Err(invalid(&drug.id, "duplicate drug id"));
        }
        check_unit(&drug.id, "clinical_base", drug.clinical_base)?;
        check_unit(&drug.id, "base_access_score", drug.base_access_score)?;
        if let Some(tier) = drug.tier.filter(|t| !(1..=4).contains(t)) {
            return Err(invalid(&drug.id, format!("tier must be 1..=4, got {tier}")));
        }
    }

    let glucose = &config.glucose;
    for (key, potency) in glucose.potency_by_drug.iter().chain(&glucose.potency_by_class) {
        check_potency(key, potency)?;
    }

    if let Some(pair) = glucose.a1c_estimates.windows(2).find(|w| w[1].a1c <= w[0].a1c) {
        return Err(invalid(
            "glucose.a1c_estimates",
            format!("rows must be sorted by ascending A1C ({} follows {})", pair[1].a1c, pair[0].a1c),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> FormularyConfig {
        toml::from_str(src).unwrap()
    }

    fn reason(result: DosewiseResult<()>) -> (String, String) {
        match result {
            Err(DosewiseError::ConfigValidation { drug, reason }) => (drug, reason),
            other => panic!("expected ConfigValidation, got {other:?}"),
        }
    }

    #[test]
    fn well_formed_config_passes() {
        let cfg = parse(
            r#"
            [[drugs]]
            id = "Metformin"
            class = "Metformin"
            tier = 1

            [glucose]
            a1c_estimates = [
              { a1c = 6.5, fasting = 120, post_prandial = 140 },
              { a1c = 6.6, fasting = 123, post_prandial = 143 },
            ]

            [glucose.potency_by_class.Metformin]
            fasting = 60
            post_prandial = 60
            "#,
        );
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let cfg = parse(
            r#"
            [[drugs]]
            id = "Metformin"
            class = "Metformin"

            [[drugs]]
            id = "Metformin"
            class = "Metformin"
            "#,
        );
        let (drug, why) = reason(validate(&cfg));
        assert_eq!(drug, "Metformin");
        assert!(why.contains("duplicate"));
    }

    #[test]
    fn out_of_range_scores_and_tier_are_rejected() {
        let base = parse("[[drugs]]\nid = \"A\"\nclass = \"DPP4\"\nclinical_base = 1.2\n");
        assert!(reason(validate(&base)).1.contains("clinical_base"));

        let access = parse("[[drugs]]\nid = \"A\"\nclass = \"DPP4\"\nbase_access_score = -0.1\n");
        assert!(reason(validate(&access)).1.contains("base_access_score"));

        let tier = parse("[[drugs]]\nid = \"A\"\nclass = \"DPP4\"\ntier = 5\n");
        assert!(reason(validate(&tier)).1.contains("tier must be 1..=4"));
    }

    #[test]
    fn negative_potency_is_rejected() {
        let cfg = parse("[glucose.potency_by_drug.Semaglutide]\nfasting = -5\n");
        let (key, why) = reason(validate(&cfg));
        assert_eq!(key, "Semaglutide");
        assert!(why.contains("fasting potency"));
    }

    #[test]
    fn unsorted_estimates_are_rejected() {
        let cfg = parse(
            r#"
            [glucose]
            a1c_estimates = [
              { a1c = 7.0, fasting = 154, post_prandial = 160 },
              { a1c = 6.9, fasting = 151, post_prandial = 157 },
            ]
            "#,
        );
        let (key, _) = reason(validate(&cfg));
        assert_eq!(key, "glucose.a1c_estimates");
    }
}
