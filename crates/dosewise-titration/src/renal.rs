//! Renal maximum check: is the current dose above what this eGFR allows?
//!
//! The maximum is read from the same eGFR-banded dose strings used for
//! starting doses, taking the largest `N mg daily` or `N mg weekly` found.

use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use dosewise_contracts::config::{banded_dose, DosingConfig};
use dosewise_contracts::drug::DrugClass;
use dosewise_contracts::profile::CurrentMedication;

use crate::dose::current_dose_amount;
use crate::starting::find_molecule;

const MAX_PATTERN: &str = r"(?i)(\d+(?:\.\d+)?)\s*mg\s*(daily|weekly)";

fn max_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MAX_PATTERN).ok()).as_ref()
}

/// Largest allowed amount found in a dose string.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenalMaximum {
    pub daily_mg: Option<f64>,
    pub weekly_mg: Option<f64>,
}

/// Parse the largest daily and weekly mg amounts from `text`.
pub fn parse_maximum(text: &str) -> RenalMaximum {
    let mut out = RenalMaximum::default();
    let Some(re) = max_regex() else {
        return out;
    };
    for caps in re.captures_iter(text) {
        let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        let slot = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
            Some("weekly") => &mut out.weekly_mg,
            _ => &mut out.daily_mg,
        };
        if slot.map_or(true, |current| value > current) {
            *slot = Some(value);
        }
    }
    out
}

/// The allowed maximum for a drug at this eGFR, from the dosing tables.
pub fn max_dose_for_egfr(class: &DrugClass, egfr: f64, drug: &str, dosing: &DosingConfig) -> RenalMaximum {
    let Some(class_cfg) = dosing.for_class(class) else {
        return RenalMaximum::default();
    };
    // Display names carry the brand in parentheses.
    let drug_id = drug.split('(').next().unwrap_or(drug).trim();

    let dose = match find_molecule(class_cfg, drug_id) {
        Some(m) => banded_dose(&m.bands, m.default_dose.as_deref(), egfr),
        None => banded_dose(&class_cfg.bands, class_cfg.default_dose.as_deref(), egfr),
    };
    dose.map(parse_maximum).unwrap_or_default()
}

/// Warning text when the current dose exceeds the renal maximum.
pub fn exceeds_renal_maximum(
    class: &DrugClass,
    current: &CurrentMedication,
    drug: &str,
    egfr: f64,
    dosing: &DosingConfig,
) -> Option<String> {
    let amount = current_dose_amount(&current.dose, &current.frequency);
    let max = max_dose_for_egfr(class, egfr, drug, dosing);

    let over = |current: Option<f64>, limit: Option<f64>| matches!((current, limit), (Some(c), Some(l)) if c > l);
    if over(amount.daily_mg, max.daily_mg) || over(amount.weekly_mg, max.weekly_mg) {
        info!(drug = %drug, egfr, "current dose exceeds renal maximum");
        return Some(format!(
            "Current dose exceeds maximum recommended for eGFR {}; clinician review recommended.",
            egfr.trunc()
        ));
    }
    None
}
