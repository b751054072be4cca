//! # dosewise-contracts
//!
//! Shared types and error contracts for the dosewise decision engine.
//!
//! Every crate in the workspace imports from here. No scoring logic lives in
//! this crate, only data definitions, request-boundary normalization, and
//! error types.

pub mod config;
pub mod drug;
pub mod error;
pub mod glucose;
pub mod profile;
pub mod recommendation;
pub mod rule;
pub mod score;

#[cfg(test)]
mod tests {
    use super::*;
    use config::{EgfrBand, FormularyConfig, GoalTier};
    use drug::{CostCategory, DrugClass, DrugDefinition};
    use error::DosewiseError;
    use glucose::{GlucoseSnapshot, LowsSignal, LowsSource};
    use profile::{CurrentMedication, Insurance, Monitor, PatientProfile, NO_ACTIVE_THERAPY};
    use rule::{Field, Op, Rule, RuleValue};

    fn parse_rules(toml_src: &str) -> Vec<Rule> {
        #[derive(serde::Deserialize)]
        struct Doc {
            rules: Vec<Rule>,
        }
        let doc: Doc = toml::from_str(toml_src).unwrap();
        doc.rules
    }

    // ── Rule deserialization ─────────────────────────────────────────────────

    #[test]
    fn leaf_rule_deserializes_from_inline_table() {
        let rules = parse_rules(r#"rules = [ { field = "eGFR", op = "lt", value = 30 } ]"#);
        match &rules[0] {
            Rule::Leaf(p) => {
                assert_eq!(p.field, Field::Egfr);
                assert_eq!(p.op, Op::Lt);
                assert_eq!(p.value.as_ref().and_then(RuleValue::as_number), Some(30.0));
            }
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn nested_combinators_deserialize() {
        let rules = parse_rules(
            r#"rules = [ { and = [ { field = "age", op = "ge", value = 75 }, { or = [ { field = "comorbidity", op = "in", value = ["CKD", "CHF"] } ] } ] } ]"#,
        );
        match &rules[0] {
            Rule::And { and } => {
                assert_eq!(and.len(), 2);
                assert!(matches!(and[1], Rule::Or { .. }), "second child should be an or-node");
            }
            other => panic!("expected and-node, got {other:?}"),
        }
    }

    #[test]
    fn unrecognised_shape_becomes_malformed() {
        let rules = parse_rules(r#"rules = [ { weight = 3 }, { and = 5 } ]"#);
        assert!(matches!(rules[0], Rule::Malformed(_)));
        assert!(matches!(rules[1], Rule::Malformed(_)), "and with a non-list must not parse as a combinator");
    }

    #[test]
    fn unknown_field_and_operator_keep_their_names() {
        let rules = parse_rules(r#"rules = [ { field = "bmi", op = "between", value = 30 } ]"#);
        match &rules[0] {
            Rule::Leaf(p) => {
                assert_eq!(p.field, Field::Unknown("bmi".to_string()));
                assert_eq!(p.op, Op::Unknown("between".to_string()));
                assert_eq!(p.field.to_string(), "bmi");
            }
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn field_aliases_map_to_one_variant() {
        assert_eq!(Field::from("comorbidities".to_string()), Field::Comorbidity);
        assert_eq!(Field::from("allergy_labels".to_string()), Field::Allergy);
        assert!(Field::FastingAvg.requires_glucose_data());
        assert!(!Field::Egfr.requires_glucose_data());
    }

    #[test]
    fn rule_value_terms_flatten_lists() {
        let v = RuleValue::List(vec![
            RuleValue::Text("CKD".to_string()),
            RuleValue::List(vec![RuleValue::Text("CHF".to_string())]),
        ]);
        assert_eq!(v.as_terms(), vec!["CKD".to_string(), "CHF".to_string()]);
        assert_eq!(v.as_number(), None);
        assert_eq!(RuleValue::Text(" 45 ".to_string()).as_number(), Some(45.0));
    }

    // ── Drug definitions ─────────────────────────────────────────────────────

    #[test]
    fn drug_definition_applies_defaults() {
        let drug: DrugDefinition = toml::from_str(
            r#"
            id = "Glipizide"
            class = "Sulfonylurea"
            "#,
        )
        .unwrap();
        assert_eq!(drug.clinical_base, 0.5);
        assert_eq!(drug.base_access_score, 0.6);
        assert!(drug.deny_if.is_empty());
        assert_eq!(drug.label(), "Glipizide");
        assert!(drug.class.is_high_hypoglycemia_risk());
    }

    #[test]
    fn drug_class_names_round_trip_through_text() {
        for name in ["Metformin", "SGLT2", "DPP4", "GLP1", "Sulfonylurea", "TZD", "Basal Insulin", "Bolus Insulin", "No Change"] {
            let class = DrugClass::from(name);
            assert!(!matches!(class, DrugClass::Other(_)), "{name} should be a known class");
            assert_eq!(class.as_str(), name);
        }
        assert_eq!(DrugClass::from("Amylin"), DrugClass::Other("Amylin".to_string()));
    }

    #[test]
    fn cost_category_ranks_cheapest_first() {
        let cost: CostCategory = serde_json::from_str("\"very_high\"").unwrap();
        assert_eq!(cost, CostCategory::VeryHigh);
        assert!(CostCategory::Low.rank() < CostCategory::VeryHigh.rank());
    }

    // ── Config ───────────────────────────────────────────────────────────────

    #[test]
    fn empty_config_uses_default_therapy_boost() {
        let config: FormularyConfig = toml::from_str("").unwrap();
        assert_eq!(config.current_therapy_boost, 0.20);
        assert!(config.drugs.is_empty());
    }

    #[test]
    fn egfr_band_is_inclusive_below_exclusive_above() {
        let band = EgfrBand {
            min_egfr: Some(30.0),
            max_egfr: Some(45.0),
            dose: "500 mg daily".to_string(),
        };
        assert!(band.contains(30.0));
        assert!(band.contains(44.9));
        assert!(!band.contains(45.0));
        assert!(!band.contains(29.9));
    }

    #[test]
    fn goal_tier_boundaries() {
        assert_eq!(GoalTier::for_goal(7.0), GoalTier::AtMost7);
        assert_eq!(GoalTier::for_goal(7.5), GoalTier::AtMost7_5);
        assert_eq!(GoalTier::for_goal(8.0), GoalTier::Above7_5);
    }

    // ── Profile construction ─────────────────────────────────────────────────

    #[test]
    fn insurance_classification_from_plan_text() {
        assert_eq!(Insurance::from_plan_text("VA Community Care"), Insurance::Va);
        assert_eq!(Insurance::from_plan_text("Veterans Choice"), Insurance::Va);
        assert_eq!(Insurance::from_plan_text("Medicare Advantage"), Insurance::Medicare);
        assert_eq!(Insurance::from_plan_text("State Medicaid"), Insurance::Medicaid);
        assert_eq!(Insurance::from_plan_text("Uninsured"), Insurance::NoInsurance);
        assert_eq!(Insurance::from_plan_text("Blue Cross PPO"), Insurance::Private);
    }

    #[test]
    fn builder_normalizes_comorbidities_and_defaults_goal() {
        let profile = PatientProfile::builder()
            .comorbidity(" ckd ")
            .comorbidity("Other: gout")
            .comorbidity("")
            .monitoring_method("Dexcom CGM")
            .build(&[]);

        assert_eq!(profile.goal, Some(7.5));
        assert!(profile.has_comorbidity("CKD"));
        assert!(profile.has_comorbidity("gout"));
        assert!(
            profile.has_comorbidity(NO_ACTIVE_THERAPY),
            "a patient with no current drug should be flagged as untreated"
        );
        assert_eq!(profile.monitor, Monitor::Cgm);
    }

    #[test]
    fn builder_maps_allergy_labels_to_drug_ids() {
        let drugs: Vec<DrugDefinition> = vec![
            toml::from_str(r#"id = "Glipizide"
class = "Sulfonylurea"
allergy_labels = ["Sulfonylureas", "Glipizide"]"#)
            .unwrap(),
            toml::from_str(r#"id = "Metformin"
class = "Metformin""#)
            .unwrap(),
        ];

        let profile = PatientProfile::builder()
            .current_medication("Metformin", CurrentMedication::new("Metformin", "500mg", "daily"))
            .allergy("Sulfonylureas")
            .allergy("Other: shellfish")
            .build(&drugs);

        assert!(profile.is_allergic_to("Glipizide"));
        assert!(!profile.is_allergic_to("Metformin"));
        assert!(profile.allergy_labels.contains("sulfonylureas"));
        assert!(!profile.has_comorbidity(NO_ACTIVE_THERAPY));
        assert!(profile.is_on("Metformin"));
    }

    #[test]
    fn goal_text_parses_leading_number() {
        let profile = PatientProfile::builder().goal_text("<7.0%").build(&[]);
        assert_eq!(profile.goal, Some(7.0));
        let fallback = PatientProfile::builder().goal_text("individualized").build(&[]);
        assert_eq!(fallback.goal, Some(7.5));
    }

    // ── Lows signal ──────────────────────────────────────────────────────────

    #[test]
    fn overnight_flag_wins_over_after_meals() {
        let glucose = GlucoseSnapshot {
            lows_overnight: true,
            lows_after_meals: true,
            ..Default::default()
        };
        let signal = LowsSignal::resolve(&PatientProfile::default(), Some(&glucose));
        assert_eq!(signal, Some(LowsSignal::Overnight));
    }

    #[test]
    fn comorbidity_inferred_lows_when_device_is_silent() {
        let profile = PatientProfile::builder()
            .comorbidity("Frequent hypoglycemia")
            .build(&[]);
        let signal = LowsSignal::resolve(&profile, Some(&GlucoseSnapshot::default()));
        assert_eq!(
            signal,
            Some(LowsSignal::Unspecified {
                source: LowsSource::Comorbidity
            })
        );
        assert_eq!(LowsSignal::resolve(&PatientProfile::default(), None), None);
    }

    // ── Error display ────────────────────────────────────────────────────────

    #[test]
    fn error_config_validation_display() {
        let err = DosewiseError::ConfigValidation {
            drug: "Metformin".to_string(),
            reason: "tier must be 1..=4".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Metformin"));
        assert!(msg.contains("tier must be 1..=4"));
    }

    #[test]
    fn error_config_error_display() {
        let err = DosewiseError::ConfigError {
            reason: "missing formulary path".to_string(),
        };
        assert!(err.to_string().contains("configuration error"));
    }
}
