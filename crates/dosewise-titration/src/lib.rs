//! # dosewise-titration
//!
//! Dose parsing, per-class titration ladders, starting doses, and the
//! renal maximum check.
//!
//! Free-text doses are parsed in named tiers (unit match, then leading
//! number, then the generic fallback). Everything here is total: bad
//! intake text degrades to [`FALLBACK_INSTRUCTION`] rather than an error.
//!
//! ```rust,ignore
//! use dosewise_titration::next_dose;
//!
//! let step = next_dose(&DrugClass::Metformin, "500mg", "daily", 50.0, Some("Metformin"));
//! assert_eq!(step.instruction, "1000 mg daily");
//! ```

pub mod dose;
pub mod ladder;
pub mod molecule;
pub mod renal;
pub mod starting;

pub use dose::{
    current_dose_amount, insulin_total_daily_units, insulin_units_lenient, parse_dose, DoseAmount,
    DoseFrequency, DoseUnit, ParseTier, ParsedDose,
};
pub use ladder::{next_dose, DoseStep, FALLBACK_INSTRUCTION};
pub use molecule::{identify, identify_any, Molecule};
pub use renal::{exceeds_renal_maximum, max_dose_for_egfr, parse_maximum, RenalMaximum};
pub use starting::{
    recommended_dose, starting_dose, StartingDose, NO_CHANGE_DOSE, NO_CHANGE_MEDICATION,
};
