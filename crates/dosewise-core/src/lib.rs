//! # dosewise-core
//!
//! The recommendation engine for dosewise.
//!
//! This crate provides:
//! - The `ConfigSource` trait, the seam to whatever loads the formulary
//! - The `RecommendationEngine` that runs de-escalation, scoring, ranking,
//!   and option building in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dosewise_core::RecommendationEngine;
//!
//! let engine = RecommendationEngine::from_source(&formulary);
//! let rec = engine.recommend(&profile, Some(&glucose));
//! for option in &rec.options {
//!     println!("{} {}: {}", option.action, option.medication, option.dose);
//! }
//! ```

pub mod engine;
pub mod traits;

pub use engine::{
    build_options, egfr_therapy_warning, therapy_warnings, RecommendationEngine,
    AFFORDABLE_CLASSES,
};
pub use traits::ConfigSource;
