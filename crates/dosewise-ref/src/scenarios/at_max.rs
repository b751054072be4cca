//! Scenario 5: At Max Dose
//!
//! A patient on 2000 mg metformin, still above goal, with a sulfonylurea
//! allergy. Metformin is at its ceiling and drops out of ranking; both
//! sulfonylureas are excluded by allergy. The options move to add-on
//! classes, led by a GLP-1 agonist for ASCVD and obesity.

use dosewise_contracts::error::DosewiseResult;
use dosewise_contracts::recommendation::Recommendation;
use dosewise_core::RecommendationEngine;

use crate::mock_data::metformin_at_max;
use crate::scenarios::{print_recommendation, recommend_for};

/// Run Scenario 5: At Max Dose.
pub fn run_scenario(engine: &RecommendationEngine) -> DosewiseResult<Recommendation> {
    println!("=== Scenario 5: At Max Dose ===");
    println!();
    println!("  Patient: 59y, A1C 8.6% (goal <7.0%), ASCVD, obesity, sulfonylurea allergy");
    println!("  Current: Metformin ER 2000mg daily");
    println!();

    let rec = recommend_for(engine, &metformin_at_max())?;
    print_recommendation(&rec);

    println!("  Scenario 5 complete.");
    println!();
    Ok(rec)
}
