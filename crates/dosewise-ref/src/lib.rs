//! # dosewise-ref
//!
//! Reference runtime for the dosewise decision engine.
//!
//! Ships a complete type 2 diabetes formulary and demonstrates the engine
//! in five clinical scenarios using fictional patients:
//!
//! 1. **New start**: untreated patient, A1C above goal, normal kidneys.
//! 2. **Cardiorenal**: CKD and heart failure on metformin with reduced eGFR,
//!    showing eGFR warnings and renal dose ceilings.
//! 3. **Overnight lows**: hypoglycaemia on a sulfonylurea overrides
//!    intensification with a de-escalation plan.
//! 4. **Affordability**: uninsured patient limited to low-cost classes.
//! 5. **At max dose**: metformin at its ceiling is excluded with its class.
//!
//! All data is hardcoded and fictional. No external systems are contacted.

pub mod mock_data;
pub mod record;
pub mod scenarios;

use dosewise_contracts::error::DosewiseResult;
use dosewise_formulary::TomlFormulary;

/// The reference formulary document.
pub const DIABETES_FORMULARY: &str = include_str!("../formulary/diabetes.toml");

/// Parse and validate the embedded reference formulary.
pub fn reference_formulary() -> DosewiseResult<TomlFormulary> {
    TomlFormulary::from_toml_str(DIABETES_FORMULARY)
}

pub use record::{MedicationEntry, PatientRecord};
