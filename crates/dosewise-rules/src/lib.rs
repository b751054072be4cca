//! # dosewise-rules
//!
//! Evaluator for the formulary's rule trees.
//!
//! Rules are configuration data, never code. The vocabulary is closed:
//! numeric fields (`eGFR`, `a1c`, `age`, `goal`, `fasting_above_goal`,
//! `post_prandial_above_goal`, `fasting_avg`, `lows_detected`) compared with
//! `lt/le/gt/ge/eq/ne`, set fields (`comorbidity`, `allergy`) tested with
//! `in/not_in`, and the `and`/`or` combinators. Anything else is false.
//!
//! ```rust,ignore
//! use dosewise_rules::{evaluate, RuleContext};
//!
//! let ctx = RuleContext::from_profile(&profile);
//! if drug.deny_if.iter().any(|r| evaluate(r, &ctx)) {
//!     // excluded
//! }
//! ```

pub mod describe;
pub mod evaluator;

pub use describe::{describe, mentions_field};
pub use evaluator::{evaluate, RuleContext, EVALUATOR_DEFAULT_GOAL};
