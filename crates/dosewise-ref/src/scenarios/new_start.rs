//! Scenario 1: New Start
//!
//! An untreated, newly diagnosed patient with A1C above goal and normal
//! kidney function. Nothing overrides ranking, so the engine returns the
//! two best-fit classes plus the cheapest viable alternative.
//!
//! Walk-through:
//!   1. Record normalized; "NO ACTIVE DIABETES THERAPY" added to comorbidities
//!   2. Metformin boosted as first-line for an untreated patient
//!   3. Readings above target on both axes; potency projections applied
//!   4. Options: Start rows for the top two classes, then lowest cost

use dosewise_contracts::error::DosewiseResult;
use dosewise_contracts::recommendation::Recommendation;
use dosewise_core::RecommendationEngine;

use crate::mock_data::new_diagnosis;
use crate::scenarios::{print_recommendation, recommend_for};

/// Run Scenario 1: New Start.
pub fn run_scenario(engine: &RecommendationEngine) -> DosewiseResult<Recommendation> {
    println!("=== Scenario 1: New Start ===");
    println!();
    println!("  Patient: 54y, A1C 8.4% (goal <7.0%), eGFR 88, no current therapy");
    println!();

    let rec = recommend_for(engine, &new_diagnosis())?;
    print_recommendation(&rec);

    println!("  Scenario 1 complete.");
    println!();
    Ok(rec)
}
