//! Scenario 3: Overnight Lows
//!
//! A patient at goal on glipizide and metformin whose CGM reports overnight
//! lows. De-escalation supersedes ranking entirely: the overnight ladder
//! puts sulfonylureas first, so glipizide is reduced and metformin is
//! continued unchanged.

use dosewise_contracts::error::DosewiseResult;
use dosewise_contracts::recommendation::Recommendation;
use dosewise_core::RecommendationEngine;

use crate::mock_data::overnight_lows;
use crate::scenarios::{print_recommendation, recommend_for};

/// Run Scenario 3: Overnight Lows.
pub fn run_scenario(engine: &RecommendationEngine) -> DosewiseResult<Recommendation> {
    println!("=== Scenario 3: Overnight Lows ===");
    println!();
    println!("  Patient: 72y, A1C 6.9% (goal <7.5%), CGM reports overnight lows");
    println!("  Current: Glipizide 10mg BID, Metformin 1000mg BID");
    println!();

    let rec = recommend_for(engine, &overnight_lows())?;
    print_recommendation(&rec);

    println!("  Scenario 3 complete.");
    println!();
    Ok(rec)
}
