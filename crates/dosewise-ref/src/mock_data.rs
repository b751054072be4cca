//! Simulated patient intake for the dosewise reference runtime.
//!
//! All data in this module is hardcoded and fictional. No external systems are
//! contacted. Each function returns the raw record a normalization layer
//! would receive, so the scenarios exercise the same boundary a production
//! caller does.

use serde_json::{json, Value};

use crate::record::PatientRecord;

fn record(value: Value) -> PatientRecord {
    // The literals below are fixed; a parse failure would be a bug in this file.
    serde_json::from_value(value).unwrap_or_default()
}

// ── Untreated patients ───────────────────────────────────────────────────────

/// 54-year-old, newly diagnosed, no current therapy, commercial plan.
pub fn new_diagnosis() -> PatientRecord {
    record(json!({
        "egfr": 88,
        "a1c": 8.4,
        "age": 54,
        "goal": "<7.0%",
        "insurance_plan": "Blue Shield PPO",
        "monitoring_method": "Fingerstick",
        "comorbidities": ["Obesity", "Hypertension"],
        "glucose": { "fasting_avg": 178, "post_pp_avg": 205 }
    }))
}

/// 47-year-old without insurance who cannot afford a copay.
pub fn uninsured() -> PatientRecord {
    record(json!({
        "egfr": 95,
        "a1c": 9.1,
        "age": 47,
        "goal": "<7.0%",
        "insurance_plan": "Uninsured",
        "can_afford_copay": false,
        "comorbidities": []
    }))
}

// ── Patients on therapy ──────────────────────────────────────────────────────

/// 68-year-old with CKD and heart failure, on full-dose metformin.
pub fn cardiorenal() -> PatientRecord {
    record(json!({
        "egfr": 38,
        "a1c": 8.0,
        "age": 68,
        "goal": "<7.5%",
        "insurance_plan": "Medicare Advantage",
        "monitoring_method": "Dexcom CGM",
        "comorbidities": ["CKD", "Heart Failure (CHF)"],
        "medications": [
            { "drug_id": "Metformin", "name": "Metformin", "dose": "1000mg", "frequency": "BID" }
        ],
        "glucose": { "fasting_avg": 165, "post_pp_avg": 190 }
    }))
}

/// 72-year-old veteran on glipizide and metformin with overnight lows.
pub fn overnight_lows() -> PatientRecord {
    record(json!({
        "egfr": 61,
        "a1c": 6.9,
        "age": 72,
        "goal": "<7.5%",
        "insurance_plan": "VA",
        "monitoring_method": "CGM",
        "comorbidities": ["ASCVD"],
        "medications": [
            { "drug_id": "Glipizide", "name": "Glucotrol", "dose": "10mg", "frequency": "BID" },
            { "drug_id": "Metformin", "name": "Metformin", "dose": "1000mg", "frequency": "BID" }
        ],
        "glucose": { "fasting_avg": 96, "post_pp_avg": 150, "lows_overnight": true }
    }))
}

/// 59-year-old at maximum metformin, still above goal.
pub fn metformin_at_max() -> PatientRecord {
    record(json!({
        "egfr": 74,
        "a1c": 8.6,
        "age": 59,
        "goal": "<7.0%",
        "insurance_plan": "Aetna HMO",
        "comorbidities": ["ASCVD", "Obesity"],
        "allergies": ["Sulfonylureas"],
        "medications": [
            { "drug_id": "Metformin", "name": "Metformin ER", "dose": "2000mg", "frequency": "daily" }
        ],
        "glucose": { "fasting_avg": 185, "post_pp_avg": 230 }
    }))
}

/// Every sample patient, keyed by name.
pub fn all_patients() -> Vec<(&'static str, PatientRecord)> {
    vec![
        ("new-diagnosis", new_diagnosis()),
        ("uninsured", uninsured()),
        ("cardiorenal", cardiorenal()),
        ("overnight-lows", overnight_lows()),
        ("metformin-at-max", metformin_at_max()),
    ]
}
