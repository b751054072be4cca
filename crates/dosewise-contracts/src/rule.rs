//! Rule tree types.
//!
//! Rules are externally configured data, so the vocabulary is closed:
//! a fixed set of fields, a fixed set of operators, and two combinators.
//! Anything outside that vocabulary still deserializes, but into a
//! variant the evaluator treats as "does not apply".
//!
//! Example in TOML:
//! ```toml
//! deny_if = [
//!     { field = "eGFR", op = "lt", value = 30 },
//!     { and = [ { field = "age", op = "ge", value = 75 }, { field = "comorbidity", op = "in", value = ["CKD"] } ] },
//! ]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A boolean predicate tree evaluated against a patient context.
///
/// Variant order matters for deserialization: combinators are tried
/// first, then a leaf, and whatever is left becomes `Malformed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule {
    /// True when every child is true. An empty list is true.
    And { and: Vec<Rule> },
    /// True when any child is true. An empty list is false.
    Or { or: Vec<Rule> },
    /// A single comparison.
    Leaf(Predicate),
    /// A node that matched none of the shapes above. Always false.
    Malformed(serde_json::Value),
}

impl Rule {
    /// Shorthand for building a leaf in code and tests.
    pub fn leaf(field: &str, op: &str, value: RuleValue) -> Self {
        Rule::Leaf(Predicate {
            field: Field::from(field.to_string()),
            op: Op::from(op.to_string()),
            value: Some(value),
        })
    }
}

/// `{ field, op, value }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: Field,
    pub op: Op,
    #[serde(default)]
    pub value: Option<RuleValue>,
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<RuleValue>),
}

impl RuleValue {
    /// Numeric view of the value. Text is parsed; lists have none.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuleValue::Number(n) => Some(*n),
            RuleValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            RuleValue::Text(s) => s.trim().parse::<f64>().ok(),
            RuleValue::List(_) => None,
        }
    }

    /// Every scalar in the value rendered as text, flattening lists.
    pub fn as_terms(&self) -> Vec<String> {
        match self {
            RuleValue::List(items) => items.iter().flat_map(RuleValue::as_terms).collect(),
            RuleValue::Text(s) => vec![s.clone()],
            RuleValue::Number(n) => vec![n.to_string()],
            RuleValue::Flag(b) => vec![b.to_string()],
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Number(n) => write!(f, "{n}"),
            RuleValue::Flag(b) => write!(f, "{b}"),
            RuleValue::Text(s) => write!(f, "{s}"),
            RuleValue::List(_) => write!(f, "{}", self.as_terms().join(", ")),
        }
    }
}

/// Fields a rule may reference.
///
/// Numeric fields compare with `lt/le/gt/ge/eq/ne`; set fields use
/// `in/not_in`. `Unknown` keeps the original name for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Field {
    Egfr,
    A1c,
    Age,
    Goal,
    FastingAboveGoal,
    PostPrandialAboveGoal,
    FastingAvg,
    LowsDetected,
    Comorbidity,
    Allergy,
    Unknown(String),
}

impl Field {
    /// Glucose-derived fields: no reading means the rule does not apply.
    pub fn requires_glucose_data(&self) -> bool {
        matches!(
            self,
            Field::FastingAboveGoal | Field::PostPrandialAboveGoal | Field::FastingAvg
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Field::Egfr
                | Field::A1c
                | Field::Age
                | Field::Goal
                | Field::FastingAboveGoal
                | Field::PostPrandialAboveGoal
                | Field::FastingAvg
                | Field::LowsDetected
        )
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Field::Comorbidity | Field::Allergy)
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        match s.as_str() {
            "eGFR" => Field::Egfr,
            "a1c" => Field::A1c,
            "age" => Field::Age,
            "goal" => Field::Goal,
            "fasting_above_goal" => Field::FastingAboveGoal,
            "post_prandial_above_goal" => Field::PostPrandialAboveGoal,
            "fasting_avg" => Field::FastingAvg,
            "lows_detected" => Field::LowsDetected,
            "comorbidity" | "comorbidities" => Field::Comorbidity,
            "allergy" | "allergy_labels" => Field::Allergy,
            _ => Field::Unknown(s),
        }
    }
}

impl From<Field> for String {
    fn from(f: Field) -> Self {
        f.to_string()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Egfr => "eGFR",
            Field::A1c => "a1c",
            Field::Age => "age",
            Field::Goal => "goal",
            Field::FastingAboveGoal => "fasting_above_goal",
            Field::PostPrandialAboveGoal => "post_prandial_above_goal",
            Field::FastingAvg => "fasting_avg",
            Field::LowsDetected => "lows_detected",
            Field::Comorbidity => "comorbidity",
            Field::Allergy => "allergy",
            Field::Unknown(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    In,
    NotIn,
    Unknown(String),
}

impl From<String> for Op {
    fn from(s: String) -> Self {
        match s.as_str() {
            "lt" => Op::Lt,
            "le" => Op::Le,
            "gt" => Op::Gt,
            "ge" => Op::Ge,
            "eq" => Op::Eq,
            "ne" => Op::Ne,
            "in" => Op::In,
            "not_in" => Op::NotIn,
            _ => Op::Unknown(s),
        }
    }
}

impl From<Op> for String {
    fn from(op: Op) -> Self {
        op.to_string()
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Lt => "lt",
            Op::Le => "le",
            Op::Gt => "gt",
            Op::Ge => "ge",
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::In => "in",
            Op::NotIn => "not_in",
            Op::Unknown(name) => name.as_str(),
        };
        f.write_str(name)
    }
}
