//! Next-dose titration per class.
//!
//! `next_dose` is total: unknown classes and unparseable doses return the
//! generic fallback with `at_max == false`, so a bad intake never blocks a
//! drug from being considered.

use tracing::{debug, warn};

use dosewise_contracts::drug::DrugClass;

use crate::dose::{daily_total, insulin_daily_total, parse_dose, ParsedDose};
use crate::molecule::{identify, Molecule};

/// Instruction used when no ladder applies.
pub const FALLBACK_INSTRUCTION: &str = "Consult dosing guidelines";

/// Result of one titration step.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseStep {
    pub instruction: String,
    /// The current dose is at or above the ceiling for this patient.
    pub at_max: bool,
}

impl DoseStep {
    fn next(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            at_max: false,
        }
    }

    fn max(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            at_max: true,
        }
    }

    pub fn fallback() -> Self {
        Self::next(FALLBACK_INSTRUCTION)
    }

    pub fn is_fallback(&self) -> bool {
        self.instruction == FALLBACK_INSTRUCTION && !self.at_max
    }
}

/// Compute the next titration step.
///
/// `drug_name` is the name as entered (brand or generic) and is searched
/// before the dose text when identifying the molecule.
pub fn next_dose(
    class: &DrugClass,
    dose_text: &str,
    frequency_text: &str,
    egfr: f64,
    drug_name: Option<&str>,
) -> DoseStep {
    let Some(parsed) = parse_dose(dose_text) else {
        if !dose_text.trim().is_empty() {
            warn!(class = %class, dose = %dose_text, "unparseable dose text; using fallback instruction");
        }
        return DoseStep::fallback();
    };

    let name = drug_name.unwrap_or("");
    let molecule = identify(class, &[name, dose_text]);

    let step = match class {
        DrugClass::Metformin => metformin(&parsed, frequency_text, egfr, name, dose_text),
        DrugClass::Sglt2 => sglt2(molecule, parsed.ladder_value(), egfr),
        DrugClass::Dpp4 => dpp4(molecule, parsed.ladder_value(), egfr),
        DrugClass::Glp1 => glp1(molecule, parsed.ladder_value(), dose_text),
        DrugClass::Sulfonylurea => sulfonylurea(molecule, daily_total(&parsed, frequency_text)),
        DrugClass::Tzd => tzd(molecule, parsed.ladder_value()),
        DrugClass::BasalInsulin => basal(insulin_daily_total(&parsed, frequency_text)),
        DrugClass::BolusInsulin => bolus(insulin_daily_total(&parsed, frequency_text)),
        DrugClass::NoChange | DrugClass::Other(_) => DoseStep::fallback(),
    };

    debug!(
        class = %class,
        dose = %dose_text,
        egfr,
        at_max = step.at_max,
        next = %step.instruction,
        "titration step"
    );
    step
}

/// First rung strictly above `current`.
fn next_rung(ladder: &[f64], current: f64) -> Option<f64> {
    ladder.iter().copied().find(|&rung| rung > current)
}

// ── Renally banded ────────────────────────────────────────────────────────────

fn metformin(parsed: &ParsedDose, frequency_text: &str, egfr: f64, name: &str, dose_text: &str) -> DoseStep {
    let ceiling = if (30.0..45.0).contains(&egfr) { 1000.0 } else { 2000.0 };
    let current = daily_total(parsed, frequency_text);
    let extended = is_extended_release(name, dose_text);

    let ladder: Vec<f64> = [500.0, 1000.0, 1500.0, 2000.0]
        .into_iter()
        .filter(|&rung| rung <= ceiling)
        .collect();

    match next_rung(&ladder, current) {
        Some(rung) if rung > 1000.0 && rung < 2000.0 && !extended => DoseStep::next("1000 mg morning + 500 mg evening (IR)"),
        Some(rung) if rung >= 2000.0 && !extended => DoseStep::next("1000 mg BID (IR)"),
        Some(rung) => DoseStep::next(format!("{rung} mg daily")),
        None if ceiling < 2000.0 => DoseStep::max(format!("At max dose ({ceiling} mg daily for eGFR 30-45)")),
        None => DoseStep::max(format!("At max dose ({ceiling} mg daily)")),
    }
}

fn is_extended_release(name: &str, dose_text: &str) -> bool {
    let name = name.to_lowercase();
    let dose = dose_text.to_lowercase();
    name.contains(" sa")
        || name.contains(" er")
        || name.contains(" xr")
        || name.contains("glumetza")
        || dose.contains("metformin sa")
        || dose.contains("metformin er")
}

fn sglt2(molecule: Option<Molecule>, current: f64, egfr: f64) -> DoseStep {
    match molecule {
        Some(Molecule::Canagliflozin) if (30.0..60.0).contains(&egfr) => {
            if current < 100.0 {
                DoseStep::next("100 mg daily (eGFR 30-59 max)")
            } else {
                DoseStep::max("At max dose (100 mg daily for eGFR 30-59)")
            }
        }
        Some(Molecule::Canagliflozin) if egfr >= 60.0 => match next_rung(&[100.0, 300.0], current) {
            Some(rung) if rung <= 100.0 => DoseStep::next("100 mg daily"),
            Some(_) => DoseStep::next("300 mg daily (eGFR ≥60)"),
            None => DoseStep::max("At max dose (300 mg daily)"),
        },
        Some(Molecule::Canagliflozin) => DoseStep::max("At max dose"),
        Some(Molecule::Dapagliflozin) => match next_rung(&[5.0, 10.0], current) {
            Some(rung) => DoseStep::next(format!("{rung} mg daily")),
            None => DoseStep::max("At max dose (10 mg daily)"),
        },
        Some(Molecule::Empagliflozin) => match next_rung(&[25.0], current) {
            Some(_) => DoseStep::next("25 mg daily"),
            None => DoseStep::max("At max dose (25 mg daily)"),
        },
        _ => DoseStep::max("At max dose (fixed dose medication)"),
    }
}

fn dpp4(molecule: Option<Molecule>, current: f64, egfr: f64) -> DoseStep {
    let egfr_label = egfr.trunc();
    let banded = |ceiling: f64, suffix: String| {
        if current < ceiling {
            DoseStep::next(format!("{ceiling} mg daily ({suffix})"))
        } else {
            DoseStep::max(format!("At max dose ({ceiling} mg daily for eGFR {egfr_label})"))
        }
    };

    match molecule {
        Some(Molecule::Sitagliptin) => {
            let ceiling = if egfr >= 45.0 {
                100.0
            } else if egfr >= 30.0 {
                50.0
            } else {
                25.0
            };
            banded(ceiling, format!("eGFR {egfr_label}"))
        }
        Some(Molecule::Alogliptin) => {
            let ceiling = if egfr >= 60.0 {
                25.0
            } else if egfr >= 30.0 {
                12.5
            } else {
                6.25
            };
            banded(ceiling, format!("eGFR {egfr_label}"))
        }
        Some(Molecule::Saxagliptin) => {
            let ceiling = if egfr >= 45.0 { 5.0 } else { 2.5 };
            banded(ceiling, "eGFR-based".to_string())
        }
        Some(Molecule::Linagliptin) => DoseStep::max("At max dose (5 mg daily)"),
        _ => DoseStep::max("At max dose"),
    }
}

// ── Fixed ladders ─────────────────────────────────────────────────────────────

fn glp1(molecule: Option<Molecule>, current: f64, dose_text: &str) -> DoseStep {
    match molecule {
        Some(Molecule::OralSemaglutide) => rybelsus(current),
        // Injectable semaglutide never exceeds 2 mg; larger numbers are oral tablets.
        Some(Molecule::Semaglutide) if current >= 3.0 => rybelsus(current),
        Some(Molecule::Semaglutide) => weekly(&[0.25, 0.5, 1.0, 2.0], current, "2"),
        Some(Molecule::Dulaglutide) => weekly(&[0.75, 1.5, 3.0, 4.5], current, "4.5"),
        Some(Molecule::Tirzepatide) => weekly(&[2.5, 5.0, 7.5, 10.0, 12.5, 15.0], current, "15"),
        Some(Molecule::ExenatideExtendedRelease) => DoseStep::max("At max dose (2 mg weekly)"),
        Some(Molecule::Exenatide) => {
            let lower = dose_text.to_lowercase();
            if lower.contains("er ") || lower.contains("weekly") || current == 2.0 {
                return DoseStep::max("At max dose (2 mg weekly)");
            }
            match next_rung(&[5.0, 10.0], current) {
                Some(rung) => DoseStep::next(format!("{rung} mcg BID (titrate every 4 weeks)")),
                None => DoseStep::max("At max dose (10 mcg BID)"),
            }
        }
        Some(Molecule::Liraglutide) => match next_rung(&[0.6, 1.2, 1.8], current) {
            Some(rung) => DoseStep::next(format!("{rung} mg daily (titrate weekly)")),
            None => DoseStep::max("At max dose (1.8 mg daily)"),
        },
        _ => DoseStep::next("Consider dose increase per protocol"),
    }
}

fn weekly(ladder: &[f64], current: f64, top: &str) -> DoseStep {
    match next_rung(ladder, current) {
        Some(rung) => DoseStep::next(format!("{rung} mg weekly (titrate every 4 weeks)")),
        None => DoseStep::max(format!("At max dose ({top} mg weekly)")),
    }
}

fn rybelsus(current: f64) -> DoseStep {
    match next_rung(&[3.0, 7.0, 14.0], current) {
        Some(rung) => DoseStep::next(format!("{rung} mg daily (Rybelsus; titrate after 30 days)")),
        None => DoseStep::max("At max dose (14 mg daily Rybelsus)"),
    }
}

fn sulfonylurea(molecule: Option<Molecule>, daily: f64) -> DoseStep {
    match molecule {
        Some(Molecule::Glipizide) => match next_rung(&[5.0, 10.0, 20.0], daily) {
            Some(rung) if rung > 5.0 => DoseStep::next(format!("{rung} mg daily (consider BID dosing if >5 mg)")),
            Some(rung) => DoseStep::next(format!("{rung} mg daily")),
            None => DoseStep::max("At max dose (20 mg daily)"),
        },
        Some(Molecule::Glimepiride) => match next_rung(&[1.0, 2.0, 4.0, 8.0], daily) {
            Some(rung) if rung >= 8.0 => DoseStep::next("8 mg daily (consider 4 mg BID)"),
            Some(rung) => DoseStep::next(format!("{rung} mg daily")),
            None => DoseStep::max("At max dose (8 mg daily or 4 mg BID)"),
        },
        Some(Molecule::Glyburide) => match next_rung(&[1.25, 2.5, 5.0, 10.0], daily) {
            Some(rung) if rung > 5.0 => DoseStep::next(format!("{rung} mg daily (consider BID if >5 mg)")),
            Some(rung) => DoseStep::next(format!("{rung} mg daily")),
            None => DoseStep::max("At max dose (10 mg daily)"),
        },
        _ => DoseStep::next("Consider dose increase per protocol"),
    }
}

fn tzd(molecule: Option<Molecule>, current: f64) -> DoseStep {
    match molecule {
        Some(Molecule::Pioglitazone) => match next_rung(&[15.0, 30.0, 45.0], current) {
            Some(rung) => DoseStep::next(format!("{rung} mg daily (titrate every 4-12 weeks)")),
            None => DoseStep::max("At max dose (45 mg daily)"),
        },
        _ => DoseStep::max("At max dose"),
    }
}

// ── Insulin ───────────────────────────────────────────────────────────────────

fn basal(total_daily: f64) -> DoseStep {
    if total_daily <= 20.0 {
        DoseStep::next("Increase by 2-4 units based on fasting glucose (max +10 units/day increase)")
    } else {
        DoseStep::next("Increase total daily dose by 10-20% based on fasting glucose (max +10 units/day increase)")
    }
}

fn bolus(total_daily: f64) -> DoseStep {
    if (10.0..=20.0).contains(&total_daily) {
        DoseStep::next("Divide dose with each meal; increase 1-2 units per meal (max 4 units per single increase)")
    } else if total_daily > 20.0 {
        DoseStep::next("Increase daily dose by 10-15% and divide by number of meals (max +10 units/day increase)")
    } else {
        DoseStep::next("Increase by 1-2 units based on post-prandial glucose (max +10 units/day increase)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(class: DrugClass, dose: &str, freq: &str, egfr: f64, name: &str) -> DoseStep {
        next_dose(&class, dose, freq, egfr, Some(name))
    }

    // ── Metformin ────────────────────────────────────────────────────────────

    #[test]
    fn metformin_steps_up_from_500() {
        let s = step(DrugClass::Metformin, "500mg daily", "", 50.0, "Metformin");
        assert_eq!(s.instruction, "1000 mg daily");
        assert!(!s.at_max);
    }

    #[test]
    fn metformin_at_2000_is_max() {
        let s = step(DrugClass::Metformin, "2000mg daily", "", 50.0, "Metformin");
        assert!(s.at_max, "2000 mg daily is the ceiling above eGFR 45");
    }

    #[test]
    fn metformin_ceiling_drops_between_30_and_45() {
        let s = step(DrugClass::Metformin, "1000mg daily", "", 35.0, "Metformin");
        assert!(s.at_max, "1000 mg is the ceiling at eGFR 35");
        assert!(s.instruction.contains("1000 mg"));
    }

    #[test]
    fn metformin_bid_counts_daily_total() {
        let s = step(DrugClass::Metformin, "500 mg", "BID", 60.0, "Metformin");
        assert_eq!(s.instruction, "1000 mg morning + 500 mg evening (IR)");
        let er = step(DrugClass::Metformin, "1000 mg daily", "", 60.0, "Metformin SA");
        assert_eq!(er.instruction, "1500 mg daily");
    }

    // ── SGLT2 / DPP4 ─────────────────────────────────────────────────────────

    #[test]
    fn canagliflozin_ceiling_depends_on_egfr() {
        let low = step(DrugClass::Sglt2, "100 mg daily", "", 45.0, "Invokana");
        assert!(low.at_max);
        let high = step(DrugClass::Sglt2, "100 mg daily", "", 75.0, "Invokana");
        assert!(!high.at_max);
        assert!(high.instruction.starts_with("300 mg daily"));
    }

    #[test]
    fn empagliflozin_ladder() {
        assert_eq!(step(DrugClass::Sglt2, "10 mg", "daily", 60.0, "Jardiance").instruction, "25 mg daily");
        assert!(step(DrugClass::Sglt2, "25 mg", "daily", 60.0, "Jardiance").at_max);
    }

    #[test]
    fn sitagliptin_renal_ceiling() {
        let s = step(DrugClass::Dpp4, "50 mg daily", "", 35.0, "Januvia");
        assert!(s.at_max, "50 mg is the ceiling for eGFR 30-45");
        let up = step(DrugClass::Dpp4, "50 mg daily", "", 60.0, "Januvia");
        assert_eq!(up.instruction, "100 mg daily (eGFR 60)");
    }

    #[test]
    fn linagliptin_is_fixed_dose() {
        assert!(step(DrugClass::Dpp4, "5 mg daily", "", 20.0, "Tradjenta").at_max);
    }

    // ── GLP1 ─────────────────────────────────────────────────────────────────

    #[test]
    fn semaglutide_weekly_and_oral_ladders() {
        let inj = step(DrugClass::Glp1, "0.5 mg weekly", "", 60.0, "Ozempic");
        assert_eq!(inj.instruction, "1 mg weekly (titrate every 4 weeks)");
        let oral = step(DrugClass::Glp1, "7 mg daily", "", 60.0, "Rybelsus");
        assert_eq!(oral.instruction, "14 mg daily (Rybelsus; titrate after 30 days)");
        assert!(step(DrugClass::Glp1, "2 mg weekly", "", 60.0, "Ozempic").at_max);
    }

    #[test]
    fn unidentified_glp1_suggests_protocol() {
        let s = step(DrugClass::Glp1, "1 mg weekly", "", 60.0, "");
        assert!(!s.at_max);
        assert_eq!(s.instruction, "Consider dose increase per protocol");
    }

    // ── Sulfonylurea / TZD ───────────────────────────────────────────────────

    #[test]
    fn glipizide_ladder_uses_daily_total() {
        let s = step(DrugClass::Sulfonylurea, "5 mg", "BID", 60.0, "Glipizide");
        assert_eq!(s.instruction, "20 mg daily (consider BID dosing if >5 mg)");
        assert!(step(DrugClass::Sulfonylurea, "10 mg", "BID", 60.0, "Glipizide").at_max);
    }

    #[test]
    fn pioglitazone_ladder() {
        assert_eq!(
            step(DrugClass::Tzd, "15 mg daily", "", 60.0, "Actos").instruction,
            "30 mg daily (titrate every 4-12 weeks)"
        );
        assert!(step(DrugClass::Tzd, "45 mg daily", "", 60.0, "Actos").at_max);
    }

    // ── Insulin ──────────────────────────────────────────────────────────────

    #[test]
    fn insulin_never_reports_max() {
        for dose in ["4 units", "20 units", "80 units", "200 units"] {
            assert!(!step(DrugClass::BasalInsulin, dose, "daily", 60.0, "Glargine").at_max);
            assert!(!step(DrugClass::BolusInsulin, dose, "with meals", 60.0, "Lispro").at_max);
        }
    }

    #[test]
    fn basal_band_switches_above_20_units() {
        assert!(step(DrugClass::BasalInsulin, "18 units", "", 60.0, "").instruction.starts_with("Increase by 2-4 units"));
        assert!(step(DrugClass::BasalInsulin, "12 units", "BID", 60.0, "").instruction.contains("10-20%"));
    }

    #[test]
    fn bolus_meal_dosing_triples() {
        let s = step(DrugClass::BolusInsulin, "5 units", "with meals", 60.0, "");
        assert!(s.instruction.starts_with("Divide dose with each meal"), "5 units x3 = 15 units/day");
    }

    // ── Fallback ─────────────────────────────────────────────────────────────

    #[test]
    fn unknown_class_and_garbage_fall_back() {
        let s = next_dose(&DrugClass::from("UnknownClass"), "garbage", "", 50.0, None);
        assert!(!s.at_max);
        assert!(s.is_fallback());

        let s = next_dose(&DrugClass::Metformin, "as directed", "", 50.0, None);
        assert!(s.is_fallback());
    }
}
