//! Rule evaluation.
//!
//! `evaluate` is total: every rule shape, well-formed or not, produces a
//! boolean. Anything the evaluator does not understand yields `false`, so
//! a bad rule can never trigger a denial, boost, or penalty.

use std::collections::BTreeSet;

use tracing::warn;

use dosewise_contracts::profile::PatientProfile;
use dosewise_contracts::rule::{Field, Op, Predicate, Rule, RuleValue};

/// Goal assumed by the evaluator when the context carries none.
pub const EVALUATOR_DEFAULT_GOAL: f64 = 7.0;

/// Tolerance for `eq` and `ne`.
pub const EPSILON: f64 = 1e-9;

/// The patient facts a rule can see.
///
/// `None` means "not known". eGFR, A1C, age and lows fall back to 0,
/// goal to [`EVALUATOR_DEFAULT_GOAL`], and the glucose-derived fields make
/// every predicate on them false.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleContext {
    pub egfr: Option<f64>,
    pub a1c: Option<f64>,
    pub age: Option<f64>,
    pub goal: Option<f64>,
    /// mg/dL above the goal-tier target.
    pub fasting_above_goal: Option<f64>,
    pub post_prandial_above_goal: Option<f64>,
    pub fasting_avg: Option<f64>,
    /// 1.0 when any lows signal is present.
    pub lows_detected: Option<f64>,
    /// Uppercase labels.
    pub comorbidities: BTreeSet<String>,
    /// Uppercase labels.
    pub allergy_labels: BTreeSet<String>,
}

impl RuleContext {
    /// Context with only profile-derived facts.
    pub fn from_profile(profile: &PatientProfile) -> Self {
        Self {
            egfr: profile.egfr,
            a1c: profile.a1c,
            age: profile.age.map(f64::from),
            goal: profile.goal,
            comorbidities: profile.comorbidities.iter().map(|c| normalize_term(c)).collect(),
            allergy_labels: profile.allergy_labels.iter().map(|a| normalize_term(a)).collect(),
            ..Default::default()
        }
    }

    fn numeric(&self, field: &Field) -> Option<f64> {
        match field {
            Field::Egfr => Some(self.egfr.unwrap_or(0.0)),
            Field::A1c => Some(self.a1c.unwrap_or(0.0)),
            Field::Age => Some(self.age.unwrap_or(0.0)),
            Field::Goal => Some(self.goal.unwrap_or(EVALUATOR_DEFAULT_GOAL)),
            Field::LowsDetected => Some(self.lows_detected.unwrap_or(0.0)),
            Field::FastingAboveGoal => self.fasting_above_goal,
            Field::PostPrandialAboveGoal => self.post_prandial_above_goal,
            Field::FastingAvg => self.fasting_avg,
            Field::Comorbidity | Field::Allergy | Field::Unknown(_) => None,
        }
    }

    fn set(&self, field: &Field) -> Option<&BTreeSet<String>> {
        match field {
            Field::Comorbidity => Some(&self.comorbidities),
            Field::Allergy => Some(&self.allergy_labels),
            _ => None,
        }
    }
}

/// Evaluate `rule` against `ctx`.
///
/// `and([])` is true and `or([])` is false.
pub fn evaluate(rule: &Rule, ctx: &RuleContext) -> bool {
    match rule {
        Rule::And { and } => and.iter().all(|r| evaluate(r, ctx)),
        Rule::Or { or } => or.iter().any(|r| evaluate(r, ctx)),
        Rule::Leaf(predicate) => evaluate_predicate(predicate, ctx),
        Rule::Malformed(node) => {
            warn!(node = %node, "malformed rule node evaluates to false");
            false
        }
    }
}

fn evaluate_predicate(p: &Predicate, ctx: &RuleContext) -> bool {
    if let Field::Unknown(name) = &p.field {
        warn!(field = %name, "unknown rule field evaluates to false");
        return false;
    }
    if let Op::Unknown(name) = &p.op {
        warn!(op = %name, field = %p.field, "unknown rule operator evaluates to false");
        return false;
    }
    let Some(value) = p.value.as_ref() else {
        warn!(field = %p.field, op = %p.op, "rule has no value; evaluates to false");
        return false;
    };

    if p.field.is_numeric() {
        // No glucose data means the rule does not apply.
        let Some(left) = ctx.numeric(&p.field) else {
            return false;
        };
        let Some(right) = value.as_number() else {
            return false;
        };
        return compare(&p.op, left, right);
    }

    match ctx.set(&p.field) {
        Some(set) => membership(&p.op, set, value),
        None => false,
    }
}

fn compare(op: &Op, left: f64, right: f64) -> bool {
    match op {
        Op::Lt => left < right,
        Op::Le => left <= right,
        Op::Gt => left > right,
        Op::Ge => left >= right,
        Op::Eq => (left - right).abs() < EPSILON,
        Op::Ne => (left - right).abs() >= EPSILON,
        Op::In | Op::NotIn | Op::Unknown(_) => false,
    }
}

fn membership(op: &Op, set: &BTreeSet<String>, value: &RuleValue) -> bool {
    let terms: BTreeSet<String> = value.as_terms().iter().map(|t| normalize_term(t)).collect();
    let hit = set.iter().any(|s| terms.contains(s));
    match op {
        Op::In => hit,
        Op::NotIn => !hit,
        _ => false,
    }
}

/// Trim and uppercase so `"ckd "` and `"CKD"` compare equal.
pub fn normalize_term(term: &str) -> String {
    term.trim().to_uppercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> RuleValue {
        RuleValue::Number(n)
    }

    fn text_list(items: &[&str]) -> RuleValue {
        RuleValue::List(items.iter().map(|s| RuleValue::Text(s.to_string())).collect())
    }

    fn ctx_with_egfr(egfr: f64) -> RuleContext {
        RuleContext {
            egfr: Some(egfr),
            ..Default::default()
        }
    }

    fn parse_rule(src: &str) -> Rule {
        #[derive(serde::Deserialize)]
        struct Doc {
            rule: Rule,
        }
        let doc: Doc = toml::from_str(&format!("rule = {src}")).unwrap();
        doc.rule
    }

    // ── Numeric comparisons ──────────────────────────────────────────────────

    #[test]
    fn numeric_operators() {
        let ctx = ctx_with_egfr(30.0);
        assert!(evaluate(&Rule::leaf("eGFR", "lt", num(45.0)), &ctx));
        assert!(evaluate(&Rule::leaf("eGFR", "le", num(30.0)), &ctx));
        assert!(!evaluate(&Rule::leaf("eGFR", "gt", num(30.0)), &ctx));
        assert!(evaluate(&Rule::leaf("eGFR", "ge", num(30.0)), &ctx));
        assert!(evaluate(&Rule::leaf("eGFR", "eq", num(30.0 + 1e-12)), &ctx), "eq uses an epsilon");
        assert!(evaluate(&Rule::leaf("eGFR", "ne", num(31.0)), &ctx));
    }

    #[test]
    fn missing_egfr_is_treated_as_zero() {
        let ctx = RuleContext::default();
        assert!(evaluate(&Rule::leaf("eGFR", "lt", num(30.0)), &ctx));
    }

    #[test]
    fn missing_goal_defaults_to_seven() {
        let ctx = RuleContext::default();
        assert!(evaluate(&Rule::leaf("goal", "eq", num(7.0)), &ctx));
        assert!(!evaluate(&Rule::leaf("goal", "gt", num(7.0)), &ctx));
    }

    #[test]
    fn glucose_fields_without_data_are_false_for_every_operator() {
        let ctx = RuleContext::default();
        for field in ["fasting_above_goal", "post_prandial_above_goal", "fasting_avg"] {
            for op in ["lt", "le", "gt", "ge", "eq", "ne"] {
                assert!(
                    !evaluate(&Rule::leaf(field, op, num(0.0)), &ctx),
                    "{field} {op} with no glucose data must not apply"
                );
            }
        }
    }

    #[test]
    fn glucose_fields_with_data_compare_normally() {
        let ctx = RuleContext {
            fasting_avg: Some(110.0),
            fasting_above_goal: Some(-20.0),
            ..Default::default()
        };
        assert!(evaluate(&Rule::leaf("fasting_avg", "lt", num(130.0)), &ctx));
        assert!(!evaluate(&Rule::leaf("fasting_above_goal", "ge", num(30.0)), &ctx));
    }

    #[test]
    fn non_numeric_value_on_numeric_field_is_false() {
        let ctx = ctx_with_egfr(20.0);
        assert!(!evaluate(&Rule::leaf("eGFR", "lt", RuleValue::Text("low".to_string())), &ctx));
    }

    // ── Set membership ───────────────────────────────────────────────────────

    #[test]
    fn comorbidity_membership_is_case_insensitive() {
        let ctx = RuleContext {
            comorbidities: ["CKD".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert!(evaluate(&Rule::leaf("comorbidity", "in", text_list(&["ckd ", "CHF"])), &ctx));
        assert!(!evaluate(&Rule::leaf("comorbidity", "not_in", text_list(&["Ckd"])), &ctx));
        assert!(evaluate(
            &Rule::leaf("comorbidity", "in", RuleValue::Text("ckd".to_string())),
            &ctx
        ));
    }

    #[test]
    fn empty_set_in_is_false_and_not_in_is_true() {
        let ctx = RuleContext::default();
        assert!(!evaluate(&Rule::leaf("comorbidity", "in", text_list(&["CKD"])), &ctx));
        assert!(evaluate(&Rule::leaf("comorbidity", "not_in", text_list(&["CKD"])), &ctx));
    }

    #[test]
    fn allergy_field_matches_labels() {
        let profile = PatientProfile {
            allergy_labels: ["sulfonylureas".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let ctx = RuleContext::from_profile(&profile);
        assert!(evaluate(&Rule::leaf("allergy", "in", text_list(&["Sulfonylureas"])), &ctx));
    }

    #[test]
    fn set_operator_on_numeric_field_is_false() {
        let ctx = ctx_with_egfr(20.0);
        assert!(!evaluate(&Rule::leaf("eGFR", "in", text_list(&["20"])), &ctx));
        assert!(!evaluate(&Rule::leaf("comorbidity", "lt", num(1.0)), &ctx));
    }

    // ── Combinators ──────────────────────────────────────────────────────────

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        let ctx = RuleContext::default();
        assert!(evaluate(&Rule::And { and: vec![] }, &ctx));
        assert!(!evaluate(&Rule::Or { or: vec![] }, &ctx));
    }

    #[test]
    fn nested_combinators() {
        let ctx = RuleContext {
            age: Some(80.0),
            egfr: Some(40.0),
            ..Default::default()
        };
        let rule = parse_rule(
            r#"{ and = [ { field = "age", op = "ge", value = 75 }, { or = [ { field = "eGFR", op = "lt", value = 30 }, { field = "eGFR", op = "lt", value = 45 } ] } ] }"#,
        );
        assert!(evaluate(&rule, &ctx));
    }

    // ── Fail-closed ──────────────────────────────────────────────────────────

    #[test]
    fn malformed_and_unknown_rules_never_match() {
        let ctx = ctx_with_egfr(10.0);
        for src in [
            r#"{ weight = 3 }"#,
            r#"{ and = "everything" }"#,
            r#"{ field = "bmi", op = "gt", value = 0 }"#,
            r#"{ field = "eGFR", op = "approximately", value = 10 }"#,
            r#"{ field = "eGFR", op = "lt" }"#,
        ] {
            assert!(!evaluate(&parse_rule(src), &ctx), "{src} should evaluate to false");
        }
    }

    #[test]
    fn malformed_child_inside_or_does_not_poison_siblings() {
        let ctx = ctx_with_egfr(10.0);
        let rule = parse_rule(r#"{ or = [ { nonsense = true }, { field = "eGFR", op = "lt", value = 30 } ] }"#);
        assert!(evaluate(&rule, &ctx));
    }
}
