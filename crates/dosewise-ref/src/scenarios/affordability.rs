//! Scenario 4: Affordability Gate
//!
//! An uninsured patient who cannot afford a copay. Before scoring, the
//! formulary is restricted to metformin, TZD, sulfonylureas, insulin, and
//! No Change; branded classes never reach the ranking.

use dosewise_contracts::error::DosewiseResult;
use dosewise_contracts::recommendation::Recommendation;
use dosewise_core::RecommendationEngine;

use crate::mock_data::uninsured;
use crate::scenarios::{print_recommendation, recommend_for};

/// Run Scenario 4: Affordability Gate.
pub fn run_scenario(engine: &RecommendationEngine) -> DosewiseResult<Recommendation> {
    println!("=== Scenario 4: Affordability Gate ===");
    println!();
    println!("  Patient: 47y, A1C 9.1% (goal <7.0%), uninsured, cannot afford copay");
    println!();

    let rec = recommend_for(engine, &uninsured())?;
    print_recommendation(&rec);

    println!("  Scenario 4 complete.");
    println!();
    Ok(rec)
}
