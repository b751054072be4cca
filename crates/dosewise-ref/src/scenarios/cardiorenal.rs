//! Scenario 2: Cardiorenal
//!
//! A patient with CKD and heart failure on full-dose metformin while eGFR
//! has fallen to 38. Demonstrates three interacting safety layers:
//!
//!   - 2000 mg daily is above the 1000 mg ceiling for eGFR 30-45, so
//!     metformin is "at max" and excluded from ranking
//!   - the eGFR caution on a current drug and the renal maximum both raise
//!     warnings for the clinician
//!   - SGLT2 inhibitors are boosted for CHF and CKD, and pioglitazone is
//!     denied outright for heart failure

use dosewise_contracts::error::DosewiseResult;
use dosewise_contracts::recommendation::Recommendation;
use dosewise_core::RecommendationEngine;

use crate::mock_data::cardiorenal;
use crate::scenarios::{print_recommendation, recommend_for};

/// Run Scenario 2: Cardiorenal.
pub fn run_scenario(engine: &RecommendationEngine) -> DosewiseResult<Recommendation> {
    println!("=== Scenario 2: Cardiorenal ===");
    println!();
    println!("  Patient: 68y, A1C 8.0% (goal <7.5%), eGFR 38, CKD + CHF");
    println!("  Current: Metformin 1000mg BID");
    println!();

    let record = cardiorenal();
    let rec = recommend_for(engine, &record)?;
    print_recommendation(&rec);

    let profile = record.to_profile(&engine.config().drugs)?;
    for row in engine
        .breakdown(&profile, record.glucose.as_ref())
        .iter()
        .filter(|row| row.denied)
    {
        println!("  Excluded {:<16} {}", row.drug, row.denied_reasons.join("; "));
    }
    println!();
    println!("  Scenario 2 complete.");
    println!();
    Ok(rec)
}
