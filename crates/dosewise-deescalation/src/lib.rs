//! # dosewise-deescalation
//!
//! When hypoglycaemia is present and the patient takes at least one drug,
//! dose reduction replaces intensification.
//!
//! The lows timing picks a ladder of classes to reduce first:
//!
//! | Lows             | Reduce first                              |
//! |------------------|-------------------------------------------|
//! | Overnight        | Sulfonylurea, Basal Insulin               |
//! | After meals only | Bolus Insulin, TZD, Sulfonylurea, GLP1    |
//! | Unspecified      | Sulfonylurea, Basal Insulin, Bolus Insulin|
//!
//! Each class has its own reduction thresholds; see [`reduction`].

pub mod plan;
pub mod reduction;

pub use plan::{deescalation_plan, should_deescalate, Ladder};
pub use reduction::{reduction_for, Reduction};
