//! De-escalation trigger and plan.
//!
//! Lows timing selects a priority ladder. Every present priority class is
//! reduced; only when none is present does the first present fallback
//! class get reduced instead. Every other current drug is maintained.

use tracing::{debug, info};

use dosewise_contracts::config::FormularyConfig;
use dosewise_contracts::drug::DrugClass;
use dosewise_contracts::glucose::{GlucoseSnapshot, LowsSignal};
use dosewise_contracts::profile::{PatientProfile, DEFAULT_PROFILE_GOAL};
use dosewise_contracts::recommendation::{DeescalationPlan, DoseAdjustment, OptionAction};

use crate::reduction::reduction_for;

/// Priority and fallback classes for a lows signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ladder {
    pub priority: &'static [DrugClass],
    pub fallback: &'static [DrugClass],
}

const OVERNIGHT: Ladder = Ladder {
    priority: &[DrugClass::Sulfonylurea, DrugClass::BasalInsulin],
    fallback: &[
        DrugClass::Tzd,
        DrugClass::Metformin,
        DrugClass::Glp1,
        DrugClass::Dpp4,
        DrugClass::BolusInsulin,
        DrugClass::Sglt2,
    ],
};

// Basal insulin is not a daytime driver.
const AFTER_MEALS: Ladder = Ladder {
    priority: &[
        DrugClass::BolusInsulin,
        DrugClass::Tzd,
        DrugClass::Sulfonylurea,
        DrugClass::Glp1,
    ],
    fallback: &[DrugClass::Dpp4, DrugClass::Metformin, DrugClass::Sglt2],
};

const UNSPECIFIED: Ladder = Ladder {
    priority: &[
        DrugClass::Sulfonylurea,
        DrugClass::BasalInsulin,
        DrugClass::BolusInsulin,
    ],
    fallback: &[
        DrugClass::Tzd,
        DrugClass::Metformin,
        DrugClass::Glp1,
        DrugClass::Dpp4,
        DrugClass::Sglt2,
    ],
};

impl Ladder {
    pub fn for_signal(signal: LowsSignal) -> Self {
        match signal {
            LowsSignal::Overnight => OVERNIGHT,
            LowsSignal::AfterMeals { .. } => AFTER_MEALS,
            LowsSignal::Unspecified { .. } => UNSPECIFIED,
        }
    }
}

/// Lows are present and there is at least one current drug to reduce.
pub fn should_deescalate(profile: &PatientProfile, glucose: Option<&GlucoseSnapshot>) -> bool {
    profile.has_current_therapy() && LowsSignal::resolve(profile, glucose).is_some()
}

fn class_of(config: &FormularyConfig, drug_id: &str) -> DrugClass {
    config
        .class_of(drug_id)
        .cloned()
        .unwrap_or_else(|| DrugClass::Other(drug_id.to_string()))
}

/// Build the plan, or `None` when de-escalation does not apply.
pub fn deescalation_plan(
    profile: &PatientProfile,
    glucose: Option<&GlucoseSnapshot>,
    config: &FormularyConfig,
) -> Option<DeescalationPlan> {
    if !profile.has_current_therapy() {
        return None;
    }
    let signal = LowsSignal::resolve(profile, glucose)?;
    let ladder = Ladder::for_signal(signal);

    let current: Vec<(&str, DrugClass)> = profile
        .current_drugs
        .iter()
        .map(|id| (id.as_str(), class_of(config, id)))
        .collect();
    let present = |class: &DrugClass| current.iter().any(|(_, c)| c == class);

    let reduce_classes: Vec<&DrugClass> = if ladder.priority.iter().any(present) {
        ladder.priority.iter().filter(|c| present(*c)).collect()
    } else {
        ladder.fallback.iter().find(|c| present(*c)).into_iter().collect()
    };

    let mut reduce = Vec::new();
    for class in &reduce_classes {
        for (drug_id, _) in current.iter().filter(|(_, c)| c == *class) {
            let r = reduction_for(drug_id, class, profile.medication(drug_id), profile);
            debug!(drug = %drug_id, class = %class, action = %r.action, "dose reduction");
            reduce.push(DoseAdjustment {
                drug: drug_id.to_string(),
                class: (*class).clone(),
                action: r.action,
                medication: format!("{} {}", r.action, drug_id),
                instruction: r.instruction,
            });
        }
    }

    let maintain: Vec<DoseAdjustment> = current
        .iter()
        .filter(|(_, c)| !reduce_classes.contains(&c))
        .map(|(drug_id, class)| {
            let label = config.drug(drug_id).map_or(*drug_id, |d| d.label());
            let instruction = profile
                .medication(drug_id)
                .map(|m| format!("{} {}", m.dose.trim(), m.frequency.trim()).trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "at current dose".to_string());
            DoseAdjustment {
                drug: drug_id.to_string(),
                class: class.clone(),
                action: OptionAction::Continue,
                medication: format!("Continue {label}"),
                instruction,
            }
        })
        .collect();

    let a1c_above_goal = profile.a1c_above_goal();
    let assessment = assessment_text(profile, signal, a1c_above_goal);

    info!(
        signal = signal.timing_label(),
        reduce = reduce.len(),
        maintain = maintain.len(),
        a1c_above_goal,
        "de-escalation triggered"
    );

    Some(DeescalationPlan {
        signal,
        reduce,
        maintain,
        a1c_above_goal,
        assessment,
    })
}

fn assessment_text(profile: &PatientProfile, signal: LowsSignal, above_goal: bool) -> String {
    let a1c = profile.a1c.unwrap_or(0.0);
    let location = signal.timing_label();
    if above_goal {
        format!(
            "A1C {a1c}% above goal with {location} lows detected. Recommend dose reduction per \
             de-escalation guidelines first; consider add-on therapy after reduction."
        )
    } else {
        let goal = profile.goal.unwrap_or(DEFAULT_PROFILE_GOAL);
        format!(
            "A1C {a1c}% at goal (<{goal}%) with {location} lows detected. Recommend dose reduction \
             per de-escalation guidelines."
        )
    }
}
