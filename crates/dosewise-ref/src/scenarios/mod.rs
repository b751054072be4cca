//! Reference runtime demo scenarios.
//!
//! Each scenario is a self-contained module that feeds one fictional patient
//! through the real engine against the reference formulary and prints the
//! outcome the way a clinician-facing layer would consume it.

pub mod affordability;
pub mod at_max;
pub mod cardiorenal;
pub mod new_start;
pub mod overnight_lows;

use dosewise_contracts::error::DosewiseResult;
use dosewise_contracts::recommendation::{ReadingAction, Recommendation};
use dosewise_core::RecommendationEngine;

use crate::record::PatientRecord;

/// Normalize `record` and score it.
pub fn recommend_for(engine: &RecommendationEngine, record: &PatientRecord) -> DosewiseResult<Recommendation> {
    let profile = record.to_profile(&engine.config().drugs)?;
    Ok(engine.recommend(&profile, record.glucose.as_ref()))
}

fn reading_label(action: Option<ReadingAction>) -> &'static str {
    match action {
        Some(ReadingAction::Reduce) => "below target",
        Some(ReadingAction::NoChange) => "at target",
        Some(ReadingAction::Increase) => "above target",
        None => "no reading",
    }
}

/// Print a recommendation in the fixed layout every scenario uses.
pub fn print_recommendation(rec: &Recommendation) {
    println!(
        "  Readings:  fasting {}, post-prandial {}",
        reading_label(rec.readings.fasting),
        reading_label(rec.readings.post_prandial)
    );

    if let Some(plan) = &rec.deescalation {
        println!("  De-escalation ({} lows)", plan.signal.timing_label());
        println!("  Assessment: {}", plan.assessment);
    } else {
        println!("  Ranked candidates: {}", rec.ranked.len());
        for r in rec.ranked.iter().take(5) {
            println!(
                "    {:<18} {:<14} fit {:.2}  coverage {:.2}",
                r.drug, r.class, r.clinical_fit, r.coverage
            );
        }
        if rec.affordability_gate {
            println!("  Affordability gate: candidates limited to low-cost classes");
        }
    }

    println!("  Options:");
    for option in &rec.options {
        let marker = if option.lowest_cost { " [lowest cost]" } else { "" };
        println!("    {:<9} {}: {}{}", option.action, option.medication, option.dose, marker);
    }
    for warning in &rec.warnings {
        println!("  WARNING: {}", warning);
    }
    println!();
}

/// Run every scenario in order.
pub fn run_all(engine: &RecommendationEngine) -> DosewiseResult<()> {
    new_start::run_scenario(engine)?;
    cardiorenal::run_scenario(engine)?;
    overnight_lows::run_scenario(engine)?;
    affordability::run_scenario(engine)?;
    at_max::run_scenario(engine)?;
    Ok(())
}
