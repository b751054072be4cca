//! # dosewise-scoring
//!
//! Per-drug clinical fit, coverage, and glucose potency, plus ranking and
//! candidate selection.
//!
//! A [`ScoringContext`] is built once per request; every function here
//! borrows it together with a drug from the shared config. Nothing fails:
//! excluded drugs score zero and are dropped from ranked output.
//!
//! ```rust,ignore
//! use dosewise_scoring::{score_all, ScoringContext};
//!
//! let ctx = ScoringContext::new(&config, &profile, Some(&glucose));
//! for r in score_all(&ctx) {
//!     println!("{} {:.2} {:.2}", r.drug, r.clinical_fit, r.coverage);
//! }
//! ```

pub mod breakdown;
pub mod clinical;
pub mod context;
pub mod coverage;
pub mod glucose;
pub mod potency;
pub mod ranking;

pub use breakdown::{all_breakdowns, drug_breakdown};
pub use clinical::{assess, clinical_fit, hypoglycemia_penalty, ClinicalAssessment, CLINICAL_CEILING};
pub use context::ScoringContext;
pub use coverage::{coverage, COVERAGE_CEILING};
pub use glucose::{estimate_from_a1c, interpret_readings, Axis};
pub use potency::potency_detail;
pub use ranking::{cheapest_option, score_all, top_two};

/// Round to two decimals.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
