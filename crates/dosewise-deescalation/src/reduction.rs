//! Per-class dose reduction instructions.
//!
//! Thresholds come from the de-escalation handout and are applied to the
//! current daily total (BID doubles, meal-based insulin triples).

use dosewise_contracts::drug::DrugClass;
use dosewise_contracts::profile::{CurrentMedication, PatientProfile};
use dosewise_contracts::recommendation::OptionAction;
use dosewise_titration::{current_dose_amount, identify, insulin_units_lenient, Molecule};

/// Comorbidities under which an SGLT2 is halved rather than stopped.
const SGLT2_KEEP_COMORBIDITIES: [&str; 3] = ["HEART FAILURE (CHF)", "CHF", "CKD"];

/// A reduce or stop instruction for one drug.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub action: OptionAction,
    pub instruction: String,
}

impl Reduction {
    fn reduce(instruction: impl Into<String>) -> Self {
        Self {
            action: OptionAction::Reduce,
            instruction: instruction.into(),
        }
    }

    fn stop(instruction: impl Into<String>) -> Self {
        Self {
            action: OptionAction::Stop,
            instruction: instruction.into(),
        }
    }
}

/// Reduction for a drug the patient takes.
pub fn reduction_for(
    drug_id: &str,
    class: &DrugClass,
    medication: Option<&CurrentMedication>,
    profile: &PatientProfile,
) -> Reduction {
    let empty = CurrentMedication::default();
    let med = medication.unwrap_or(&empty);
    let daily_mg = current_dose_amount(&med.dose, &med.frequency).daily_mg;

    match class {
        DrugClass::Sulfonylurea => {
            let molecule = identify(class, &[&med.drug_name, drug_id, &med.dose]);
            sulfonylurea(molecule, daily_mg)
        }
        DrugClass::BasalInsulin => basal(insulin_units_lenient(&med.dose, &med.frequency)),
        DrugClass::BolusInsulin => bolus(insulin_units_lenient(&med.dose, &med.frequency)),
        DrugClass::Tzd => tzd(daily_mg),
        DrugClass::Metformin => metformin(daily_mg),
        DrugClass::Glp1 => glp1(identify(class, &[&med.drug_name, drug_id, &med.dose])),
        DrugClass::Dpp4 => Reduction::stop("Consider stop due to replaceable efficacy"),
        DrugClass::Sglt2 => sglt2(profile),
        DrugClass::NoChange | DrugClass::Other(_) => Reduction::reduce("Consider dose reduction"),
    }
}

fn format_mg(value: f64) -> String {
    format!("{value} mg daily")
}

fn sulfonylurea(molecule: Option<Molecule>, daily_mg: Option<f64>) -> Reduction {
    let Some(daily) = daily_mg else {
        return Reduction::reduce("Consult dosing guidelines for dose reduction");
    };
    let threshold = if molecule == Some(Molecule::Glimepiride) { 4.0 } else { 10.0 };
    if daily >= threshold {
        Reduction::reduce(format!("Cut dose in half (from {})", format_mg(daily)))
    } else {
        Reduction::stop(format!("Less than {}", format_mg(threshold)))
    }
}

fn basal(units: Option<f64>) -> Reduction {
    match units {
        None => Reduction::reduce("Consider dose reduction"),
        Some(u) if u >= 21.0 => Reduction::reduce(format!(
            "Reduce total daily dose by 20% (e.g. to ~{} units)",
            (u * 0.8).round()
        )),
        Some(u) if u >= 10.0 => Reduction::reduce(format!("Cut dose in half (from {u} units)")),
        Some(_) => Reduction::stop("Less than 10 units"),
    }
}

fn bolus(units: Option<f64>) -> Reduction {
    match units {
        None => Reduction::reduce("Consider dose reduction"),
        Some(u) if u >= 15.0 => Reduction::reduce(format!(
            "Reduce total daily dose by 20% (e.g. to ~{} units)",
            (u * 0.8).round()
        )),
        Some(u) if u >= 6.0 => Reduction::reduce(format!("Cut dose in half (from {u} units)")),
        Some(_) => Reduction::stop("5 units or less"),
    }
}

fn tzd(daily_mg: Option<f64>) -> Reduction {
    match daily_mg {
        None => Reduction::reduce("Decrease dose by 15 mg daily"),
        Some(d) if d <= 15.0 => Reduction::stop("At 15 mg daily"),
        Some(d) => Reduction::reduce(format!("Decrease dose by 15 mg (from {})", format_mg(d))),
    }
}

fn metformin(daily_mg: Option<f64>) -> Reduction {
    match daily_mg {
        Some(d) if d <= 500.0 => Reduction::stop("At 500 mg daily"),
        Some(d) => Reduction::reduce(format!("Cut dose in half (from {})", format_mg(d))),
        None => Reduction::reduce("Cut dose in half or stop"),
    }
}

fn glp1(molecule: Option<Molecule>) -> Reduction {
    let text = match molecule {
        Some(Molecule::Semaglutide) => "Go to next lower dose (e.g. 1 mg -> 0.5 mg weekly)",
        Some(Molecule::Dulaglutide) => "Stepdown: 4.5 -> 3 -> 1.5 -> 0.75 mg weekly",
        Some(Molecule::Tirzepatide) => "Stepdown: 15 -> 12.5 -> 10 -> 7.5 -> 5 -> 2.5 mg weekly",
        Some(Molecule::Liraglutide) => "Decrease by 0.6 mg daily",
        Some(Molecule::OralSemaglutide) => "Stepdown: 14 -> 7 -> 3 mg daily",
        _ => "Go to next lower dose",
    };
    Reduction::reduce(text)
}

fn sglt2(profile: &PatientProfile) -> Reduction {
    if SGLT2_KEEP_COMORBIDITIES.iter().any(|c| profile.has_comorbidity(c)) {
        Reduction::reduce("Cut dose in half (CHF/CKD present)")
    } else {
        Reduction::stop("Stop unless CHF or CKD; then cut in half")
    }
}
