//! Glucose readings and the hypoglycaemia signal derived from them.

use serde::{Deserialize, Serialize};

use crate::profile::PatientProfile;

/// Averages and lows flags reported by the patient's device or log.
///
/// All fields are optional: fingerstick users often report no lows data,
/// and many intakes carry no readings at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlucoseSnapshot {
    /// Fasting (or wake-up) average, mg/dL.
    #[serde(default)]
    pub fasting_avg: Option<f64>,
    /// Post-prandial (or bedtime) average, mg/dL.
    #[serde(default)]
    pub post_pp_avg: Option<f64>,
    #[serde(default)]
    pub lows_detected: bool,
    #[serde(default)]
    pub lows_overnight: bool,
    #[serde(default)]
    pub lows_after_meals: bool,
}

impl GlucoseSnapshot {
    pub fn has_readings(&self) -> bool {
        self.fasting_avg.is_some() || self.post_pp_avg.is_some()
    }

    /// Any lows flag from the device.
    pub fn any_lows(&self) -> bool {
        self.lows_detected || self.lows_overnight || self.lows_after_meals
    }
}

/// Where an unspecified lows signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LowsSource {
    Device,
    Comorbidity,
}

/// The hypoglycaemia signal, resolved once per request.
///
/// Device flags win over comorbidity inference; comorbidity inference
/// never carries timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LowsSignal {
    /// Lows overnight, possibly also after meals.
    Overnight,
    /// Lows after meals and not overnight. `also_unspecified` is set when
    /// the device additionally reports lows without timing.
    AfterMeals { also_unspecified: bool },
    /// Lows without timing information.
    Unspecified { source: LowsSource },
}

impl LowsSignal {
    /// Resolve the signal, or `None` when no lows are indicated.
    pub fn resolve(profile: &PatientProfile, glucose: Option<&GlucoseSnapshot>) -> Option<Self> {
        if let Some(g) = glucose.filter(|g| g.any_lows()) {
            return Some(if g.lows_overnight {
                LowsSignal::Overnight
            } else if g.lows_after_meals {
                LowsSignal::AfterMeals {
                    also_unspecified: g.lows_detected,
                }
            } else {
                LowsSignal::Unspecified {
                    source: LowsSource::Device,
                }
            });
        }

        if profile.has_hypoglycemia_history() {
            return Some(LowsSignal::Unspecified {
                source: LowsSource::Comorbidity,
            });
        }
        None
    }

    /// Short timing label used in assessment text.
    pub fn timing_label(&self) -> &'static str {
        match self {
            LowsSignal::Overnight => "overnight",
            LowsSignal::AfterMeals { .. } => "after-meal",
            LowsSignal::Unspecified { .. } => "recurrent",
        }
    }
}
