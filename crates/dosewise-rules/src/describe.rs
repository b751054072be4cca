//! Human-readable rule labels for audit breakdowns.

use dosewise_contracts::rule::{Field, Op, Predicate, Rule};

/// Short label for a rule, e.g. `"A1C > 8%"` or `"eGFR < 30 and CKD"`.
pub fn describe(rule: &Rule) -> String {
    match rule {
        Rule::And { and } => join(and, " and "),
        Rule::Or { or } => join(or, " or "),
        Rule::Leaf(p) => describe_predicate(p),
        Rule::Malformed(_) => "rule".to_string(),
    }
}

fn join(children: &[Rule], sep: &str) -> String {
    children.iter().map(describe).collect::<Vec<_>>().join(sep)
}

fn describe_predicate(p: &Predicate) -> String {
    let Some(value) = p.value.as_ref() else {
        return p.field.to_string();
    };
    let v = value.to_string();

    match (&p.field, &p.op) {
        (Field::FastingAvg, Op::Lt) => format!("Fasting at goal (<{v} mg/dL)"),
        (Field::LowsDetected, Op::Ge | Op::Eq) if value.as_number().unwrap_or(0.0) >= 1.0 => {
            "Lows detected".to_string()
        }
        (Field::A1c, Op::Gt) => format!("A1C > {v}%"),
        (Field::A1c, Op::Ge) => format!("A1C ≥ {v}%"),
        (Field::Comorbidity, Op::In) => v,
        (Field::Comorbidity, Op::NotIn) => format!("No {v}"),
        (Field::Egfr, Op::Lt) => format!("eGFR < {v}"),
        (Field::Egfr, Op::Le) => format!("eGFR ≤ {v}"),
        (Field::Egfr, Op::Ge) => format!("eGFR ≥ {v}"),
        (Field::Egfr, Op::Gt) => format!("eGFR > {v}"),
        (Field::Age, Op::Lt) => format!("Age < {v}"),
        (Field::Age, Op::Ge) => format!("Age ≥ {v}"),
        (Field::FastingAboveGoal, Op::Ge) => format!("Fasting glucose ≥{v} mg/dL above goal"),
        (Field::FastingAboveGoal, Op::Gt) => format!("Fasting glucose >{v} mg/dL above goal"),
        (Field::PostPrandialAboveGoal, Op::Ge) => {
            format!("Post-prandial glucose ≥{v} mg/dL above goal")
        }
        (Field::PostPrandialAboveGoal, Op::Gt) => {
            format!("Post-prandial glucose >{v} mg/dL above goal")
        }
        (Field::Allergy, Op::In) => format!("Allergy: {v}"),
        (field, op) => format!("{field} {op} {v}"),
    }
}

/// True when any leaf in the tree references `field`.
pub fn mentions_field(rule: &Rule, field: &Field) -> bool {
    match rule {
        Rule::And { and } => and.iter().any(|r| mentions_field(r, field)),
        Rule::Or { or } => or.iter().any(|r| mentions_field(r, field)),
        Rule::Leaf(p) => &p.field == field,
        Rule::Malformed(_) => false,
    }
}
