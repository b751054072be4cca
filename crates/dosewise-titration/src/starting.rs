//! Starting-dose resolution and the recommended dose for an option row.

use tracing::debug;

use dosewise_contracts::config::{banded_dose, ClassDosing, DosingConfig, MoleculeDosing};
use dosewise_contracts::drug::DrugClass;
use dosewise_contracts::profile::CurrentMedication;

use crate::ladder::{next_dose, FALLBACK_INSTRUCTION};

pub const NO_CHANGE_MEDICATION: &str = "No medication change";
pub const NO_CHANGE_DOSE: &str = "Continue current therapy";
pub const NO_ELIGIBLE_SGLT2: &str =
    "No SGLT2 recommended for this eGFR (all require higher kidney function).";

/// Medication label and dose text for an option row.
#[derive(Debug, Clone, PartialEq)]
pub struct StartingDose {
    pub medication: String,
    pub dose: String,
    /// Set when the requested molecule was ineligible and another was suggested.
    pub substitute: Option<String>,
}

impl StartingDose {
    fn new(medication: impl Into<String>, dose: impl Into<String>) -> Self {
        Self {
            medication: medication.into(),
            dose: dose.into(),
            substitute: None,
        }
    }
}

/// Find the molecule table matching a requested drug name.
///
/// Matches the table's drug id exactly (ignoring case) or when the
/// requested name contains it, e.g. `"Empagliflozin (Jardiance)"`.
pub fn find_molecule<'a>(class_cfg: &'a ClassDosing, requested: &str) -> Option<&'a MoleculeDosing> {
    let wanted = requested.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    class_cfg
        .by_drug
        .iter()
        .find(|m| m.drug.to_lowercase() == wanted)
        .or_else(|| {
            class_cfg.by_drug.iter().find(|m| {
                let key = m.drug.to_lowercase();
                wanted.contains(&key) || key.contains(&wanted)
            })
        })
}

fn molecule_dose(m: &MoleculeDosing, class_cfg: &ClassDosing, egfr: f64) -> Option<String> {
    banded_dose(
        &m.bands,
        m.default_dose.as_deref().or(class_cfg.default_dose.as_deref()),
        egfr,
    )
    .map(str::to_string)
}

fn molecule_label(m: &MoleculeDosing) -> String {
    m.medication.clone().unwrap_or_else(|| m.drug.clone())
}

/// Starting dose for a class at this eGFR.
///
/// With a `preferred` molecule, its own table is used. For SGLT2 each
/// molecule has a minimum eGFR: an ineligible request is substituted with
/// the first eligible molecule in table order and the substitution is
/// flagged; with none eligible the dose text says so.
pub fn starting_dose(
    class: &DrugClass,
    egfr: f64,
    dosing: &DosingConfig,
    preferred: Option<&str>,
) -> StartingDose {
    if *class == DrugClass::NoChange {
        return StartingDose::new(NO_CHANGE_MEDICATION, NO_CHANGE_DOSE);
    }

    let Some(class_cfg) = dosing.for_class(class) else {
        let medication = preferred.unwrap_or(class.as_str());
        return StartingDose::new(medication, FALLBACK_INSTRUCTION);
    };

    let default_medication = class_cfg
        .medication
        .clone()
        .unwrap_or_else(|| class.as_str().to_string());
    let default_dose = class_cfg
        .default_dose
        .clone()
        .unwrap_or_else(|| FALLBACK_INSTRUCTION.to_string());

    if *class == DrugClass::Sglt2 && !class_cfg.by_drug.is_empty() {
        return sglt2_starting_dose(class_cfg, egfr, preferred, &default_medication);
    }

    if let Some(requested) = preferred {
        if let Some(m) = find_molecule(class_cfg, requested) {
            let dose = molecule_dose(m, class_cfg, egfr).unwrap_or(default_dose);
            return StartingDose::new(molecule_label(m), dose);
        }
        // A class-level dose may belong to a different molecule.
        if !class_cfg.by_drug.is_empty() {
            return StartingDose::new(requested, FALLBACK_INSTRUCTION);
        }
    }

    let dose = banded_dose(&class_cfg.bands, Some(default_dose.as_str()), egfr)
        .unwrap_or(FALLBACK_INSTRUCTION)
        .to_string();
    StartingDose::new(default_medication, dose)
}

fn sglt2_starting_dose(
    class_cfg: &ClassDosing,
    egfr: f64,
    preferred: Option<&str>,
    default_medication: &str,
) -> StartingDose {
    let first_eligible = class_cfg.by_drug.iter().find(|m| m.eligible_at(egfr));

    let requested = preferred.and_then(|p| find_molecule(class_cfg, p));
    if let Some(m) = requested {
        if m.eligible_at(egfr) {
            let dose = molecule_dose(m, class_cfg, egfr).unwrap_or_else(|| FALLBACK_INSTRUCTION.to_string());
            return StartingDose::new(molecule_label(m), dose);
        }

        let min = m.min_egfr.unwrap_or(0.0);
        let mut dose = format!("Not recommended (eGFR <{min}).");
        let substitute = first_eligible.and_then(|alt| {
            molecule_dose(alt, class_cfg, egfr).map(|alt_dose| (molecule_label(alt), alt_dose))
        });
        match &substitute {
            Some((label, alt_dose)) => dose.push_str(&format!(" Consider {label}: {alt_dose}.")),
            None => dose.push_str(" No alternative SGLT2 suitable for this eGFR."),
        }
        debug!(
            requested = %m.drug,
            egfr,
            substitute = ?substitute.as_ref().map(|(label, _)| label),
            "requested SGLT2 ineligible at this eGFR"
        );
        return StartingDose {
            medication: molecule_label(m),
            dose,
            substitute: substitute.map(|(label, _)| label),
        };
    }

    match first_eligible {
        Some(m) => {
            let dose = molecule_dose(m, class_cfg, egfr).unwrap_or_else(|| FALLBACK_INSTRUCTION.to_string());
            StartingDose::new(molecule_label(m), dose)
        }
        None => StartingDose::new(default_medication, NO_ELIGIBLE_SGLT2),
    }
}

/// Dose text for an option row.
///
/// A patient already on the drug gets the next titration step
/// ("Currently on 500 mg daily. 1000 mg daily."); otherwise the starting
/// dose applies.
pub fn recommended_dose(
    class: &DrugClass,
    egfr: f64,
    dosing: &DosingConfig,
    preferred: Option<&str>,
    current: Option<&CurrentMedication>,
) -> StartingDose {
    let start = starting_dose(class, egfr, dosing, preferred);
    if *class == DrugClass::NoChange {
        return start;
    }

    let Some(med) = current.filter(|m| !m.dose.trim().is_empty()) else {
        return start;
    };

    let name = (!med.drug_name.is_empty()).then_some(med.drug_name.as_str()).or(preferred);
    let step = next_dose(class, &med.dose, &med.frequency, egfr, name);
    if step.is_fallback() {
        return start;
    }

    let current_text = format!("{} {}", med.dose.trim(), med.frequency.trim());
    StartingDose {
        medication: if med.drug_name.is_empty() {
            start.medication
        } else {
            med.drug_name.clone()
        },
        dose: format!("Currently on {}. {}.", current_text.trim(), step.instruction),
        substitute: None,
    }
}
