//! Glucose estimation, goal-tier targets, and reading interpretation.

use dosewise_contracts::config::{A1cEstimate, AxisBand, GlucoseConfig, GoalBand, GoalTier};
use dosewise_contracts::profile::{PatientProfile, DEFAULT_PROFILE_GOAL};
use dosewise_contracts::recommendation::{ReadingAction, ReadingInterpretation};

/// Which glucose measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Fasting,
    PostPrandial,
}

/// Estimate an average glucose from A1C.
///
/// A1C is rounded to one decimal and matched to the nearest row; values
/// outside the table take the boundary row. A missing or non-positive
/// A1C, or an empty table, gives `None`.
pub fn estimate_from_a1c(a1c: Option<f64>, rows: &[A1cEstimate], axis: Axis) -> Option<f64> {
    let a1c = a1c.filter(|v| *v > 0.0)?;
    let rounded = (a1c * 10.0).round() / 10.0;

    let first = rows.first()?;
    let last = rows.last()?;
    let row = if rounded <= first.a1c {
        first
    } else if rounded >= last.a1c {
        last
    } else {
        rows.iter()
            .min_by(|a, b| (a.a1c - rounded).abs().total_cmp(&(b.a1c - rounded).abs()))
            .unwrap_or(last)
    };

    Some(match axis {
        Axis::Fasting => row.fasting,
        Axis::PostPrandial => row.post_prandial,
    })
}

/// Goal used for tiering: the profile's goal, else 7.5.
pub fn profile_goal(profile: &PatientProfile) -> f64 {
    profile.goal.unwrap_or(DEFAULT_PROFILE_GOAL)
}

pub fn goal_band<'a>(profile: &PatientProfile, cfg: &'a GlucoseConfig) -> Option<&'a GoalBand> {
    cfg.goal_bands.for_tier(GoalTier::for_goal(profile_goal(profile)))
}

fn axis_band(band: Option<&GoalBand>, axis: Axis) -> Option<AxisBand> {
    band.and_then(|b| match axis {
        Axis::Fasting => b.fasting,
        Axis::PostPrandial => b.post_prandial,
    })
}

/// Target (`ok_max`) for an axis at the patient's goal tier.
pub fn target(profile: &PatientProfile, cfg: &GlucoseConfig, axis: Axis) -> Option<f64> {
    axis_band(goal_band(profile, cfg), axis).map(|b| b.ok_max)
}

/// Classify a reading against its band.
pub fn interpret(value: f64, band: &AxisBand) -> ReadingAction {
    if value < band.reduce_below {
        ReadingAction::Reduce
    } else if value >= band.ok_min && value <= band.ok_max {
        ReadingAction::NoChange
    } else if value >= band.increase_at {
        ReadingAction::Increase
    } else {
        ReadingAction::NoChange
    }
}

/// Interpret measured averages (never estimates) at the patient's goal tier.
pub fn interpret_readings(
    profile: &PatientProfile,
    cfg: &GlucoseConfig,
    fasting_avg: Option<f64>,
    post_pp_avg: Option<f64>,
) -> ReadingInterpretation {
    let band = goal_band(profile, cfg);
    let read = |value: Option<f64>, axis: Axis| {
        let band = axis_band(band, axis)?;
        value.map(|v| interpret(v, &band))
    };
    ReadingInterpretation {
        fasting: read(fasting_avg, Axis::Fasting),
        post_prandial: read(post_pp_avg, Axis::PostPrandial),
    }
}
