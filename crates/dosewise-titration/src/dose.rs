//! Free-text dose parsing.
//!
//! Intake dose text is inconsistent ("1000mg", "1 g BID", "5-5-5 units",
//! "Other: 22 units"). Parsing falls through explicit tiers:
//!
//! 1. a number followed by a recognised unit,
//! 2. the first number anywhere in the text,
//! 3. nothing, in which case callers use their documented fallback.

use std::sync::OnceLock;

use regex::Regex;

const UNIT_PATTERN: &str = r"(?i)(\d+(?:\.\d+)?)\s*(mcg|mg|milligrams?|units?|u|grams?|g)\b";
const NUMBER_PATTERN: &str = r"(\d+(?:\.\d+)?)";
const SPLIT_UNITS_PATTERN: &str = r"(?i)^\s*(?:other\s*:\s*)?(\d+(?:\.\d+)?(?:\s*[-,/]\s*\d+(?:\.\d+)?)+)\s*(?:units?|u)?\b";

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn unit_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, UNIT_PATTERN)
}

fn number_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, NUMBER_PATTERN)
}

fn split_units_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, SPLIT_UNITS_PATTERN)
}

/// Unit recognised in dose text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseUnit {
    Mg,
    Mcg,
    Units,
    Grams,
}

impl DoseUnit {
    fn from_token(token: &str) -> Option<Self> {
        let t = token.to_lowercase();
        match t.as_str() {
            "mg" | "milligram" | "milligrams" => Some(DoseUnit::Mg),
            "mcg" => Some(DoseUnit::Mcg),
            "unit" | "units" | "u" => Some(DoseUnit::Units),
            "g" | "gram" | "grams" => Some(DoseUnit::Grams),
            _ => None,
        }
    }
}

/// Dosing frequency recognised in dose or frequency text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseFrequency {
    Daily,
    TwiceDaily,
    WithMeals,
    Weekly,
    Monthly,
}

impl DoseFrequency {
    /// Classify free text. Order matters: "twice daily" is BID, not daily.
    pub fn from_text(text: &str) -> Option<Self> {
        let t = text.to_lowercase();
        let has_word = |w: &str| t.split(|c: char| !c.is_ascii_alphanumeric()).any(|tok| tok == w);

        if has_word("bid") || t.contains("twice") || t.contains("2x") {
            Some(DoseFrequency::TwiceDaily)
        } else if t.contains("meal") || has_word("tid") || t.contains("3x") {
            Some(DoseFrequency::WithMeals)
        } else if t.contains("week") {
            Some(DoseFrequency::Weekly)
        } else if t.contains("month") {
            Some(DoseFrequency::Monthly)
        } else if t.contains("daily") || has_word("qd") || t.contains("once") || t.contains("bedtime") {
            Some(DoseFrequency::Daily)
        } else {
            None
        }
    }
}

/// Which parsing tier produced a `ParsedDose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    UnitMatch,
    LeadingNumber,
}

/// A dose extracted from free text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedDose {
    /// Magnitude as written, in `unit`.
    pub value: f64,
    pub unit: Option<DoseUnit>,
    /// Frequency found in the dose text itself.
    pub frequency: Option<DoseFrequency>,
    pub tier: ParseTier,
}

impl ParsedDose {
    /// Magnitude in mg. Grams are converted; unitless numbers are taken as mg.
    pub fn milligrams(&self) -> Option<f64> {
        match self.unit {
            None | Some(DoseUnit::Mg) => Some(self.value),
            Some(DoseUnit::Grams) => Some(self.value * 1000.0),
            Some(DoseUnit::Mcg) | Some(DoseUnit::Units) => None,
        }
    }

    /// Magnitude in the molecule's ladder unit: grams become mg, anything
    /// else is left as written.
    pub fn ladder_value(&self) -> f64 {
        match self.unit {
            Some(DoseUnit::Grams) => self.value * 1000.0,
            _ => self.value,
        }
    }
}

/// Tier 1: a number with a unit.
pub fn parse_with_unit(text: &str) -> Option<ParsedDose> {
    let caps = unit_regex()?.captures(text)?;
    let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let unit = caps.get(2).and_then(|m| DoseUnit::from_token(m.as_str()));
    Some(ParsedDose {
        value,
        unit,
        frequency: DoseFrequency::from_text(text),
        tier: ParseTier::UnitMatch,
    })
}

/// Tier 2: the first number anywhere.
pub fn parse_leading_number(text: &str) -> Option<ParsedDose> {
    let m = number_regex()?.find(text)?;
    let value = m.as_str().parse::<f64>().ok()?;
    Some(ParsedDose {
        value,
        unit: None,
        frequency: DoseFrequency::from_text(text),
        tier: ParseTier::LeadingNumber,
    })
}

/// Run the tiers in order. `None` means the text carries no number at all.
pub fn parse_dose(text: &str) -> Option<ParsedDose> {
    if text.trim().is_empty() {
        return None;
    }
    parse_with_unit(text).or_else(|| parse_leading_number(text))
}

/// Effective frequency: the dose text wins, then the separate frequency field.
pub fn effective_frequency(parsed: &ParsedDose, frequency_text: &str) -> Option<DoseFrequency> {
    parsed.frequency.or_else(|| DoseFrequency::from_text(frequency_text))
}

/// `frequency` appears in either the dose text or the frequency field.
fn stated_anywhere(parsed: &ParsedDose, frequency_text: &str, frequency: DoseFrequency) -> bool {
    parsed.frequency == Some(frequency) || DoseFrequency::from_text(frequency_text) == Some(frequency)
}

pub fn is_twice_daily(parsed: &ParsedDose, frequency_text: &str) -> bool {
    stated_anywhere(parsed, frequency_text, DoseFrequency::TwiceDaily)
}

/// Daily total for oral agents: BID doubles.
pub fn daily_total(parsed: &ParsedDose, frequency_text: &str) -> f64 {
    let value = parsed.ladder_value();
    if is_twice_daily(parsed, frequency_text) {
        value * 2.0
    } else {
        value
    }
}

/// Daily total for insulin: BID doubles, meal-based dosing triples.
///
/// Either source counts, so "10 units daily" with a BID field is 20.
pub fn insulin_daily_total(parsed: &ParsedDose, frequency_text: &str) -> f64 {
    if is_twice_daily(parsed, frequency_text) {
        parsed.value * 2.0
    } else if stated_anywhere(parsed, frequency_text, DoseFrequency::WithMeals) {
        parsed.value * 3.0
    } else {
        parsed.value
    }
}

/// Sum of a split dose such as `"5-5-5"` or `"Other: 6/6/8 units"`.
pub fn split_dose_total(text: &str) -> Option<f64> {
    let caps = split_units_regex()?.captures(text)?;
    let body = caps.get(1)?.as_str();
    let parts: Vec<f64> = body
        .split(|c: char| c == '-' || c == ',' || c == '/')
        .filter_map(|p| p.trim().parse::<f64>().ok())
        .filter(|n| (0.0..=200.0).contains(n))
        .collect();
    if parts.len() >= 2 {
        Some(parts.iter().sum())
    } else {
        None
    }
}

/// Total daily insulin units, or `None` when the text does not describe units.
///
/// Split doses are summed as written; otherwise BID doubles and meal or TID
/// dosing triples.
pub fn insulin_total_daily_units(dose_text: &str, frequency_text: &str) -> Option<f64> {
    if let Some(total) = split_dose_total(dose_text) {
        return Some(total);
    }
    let parsed = parse_with_unit(dose_text)?;
    if parsed.unit != Some(DoseUnit::Units) {
        return None;
    }
    Some(insulin_daily_total(&parsed, frequency_text))
}

/// Units for de-escalation thresholds. Bare numbers are accepted as units.
pub fn insulin_units_lenient(dose_text: &str, frequency_text: &str) -> Option<f64> {
    insulin_total_daily_units(dose_text, frequency_text).or_else(|| {
        let parsed = parse_leading_number(dose_text)?;
        Some(insulin_daily_total(&parsed, frequency_text))
    })
}

/// A current dose expressed for comparison with a renal maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DoseAmount {
    pub daily_mg: Option<f64>,
    pub weekly_mg: Option<f64>,
}

/// Current mg amount, daily or weekly. Non-mg units yield an empty amount.
pub fn current_dose_amount(dose_text: &str, frequency_text: &str) -> DoseAmount {
    let Some(parsed) = parse_dose(dose_text) else {
        return DoseAmount::default();
    };
    let Some(mg) = parsed.milligrams() else {
        return DoseAmount::default();
    };
    match effective_frequency(&parsed, frequency_text) {
        Some(DoseFrequency::Weekly) => DoseAmount {
            daily_mg: None,
            weekly_mg: Some(mg),
        },
        Some(DoseFrequency::TwiceDaily) => DoseAmount {
            daily_mg: Some(mg * 2.0),
            weekly_mg: None,
        },
        _ => DoseAmount {
            daily_mg: Some(mg),
            weekly_mg: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Tiers ────────────────────────────────────────────────────────────────

    #[test]
    fn unit_tier_reads_value_unit_and_frequency() {
        let d = parse_dose("1000mg BID").unwrap();
        assert_eq!(d.value, 1000.0);
        assert_eq!(d.unit, Some(DoseUnit::Mg));
        assert_eq!(d.frequency, Some(DoseFrequency::TwiceDaily));
        assert_eq!(d.tier, ParseTier::UnitMatch);
    }

    #[test]
    fn mcg_is_not_read_as_mg() {
        let d = parse_dose("10 mcg twice daily").unwrap();
        assert_eq!(d.unit, Some(DoseUnit::Mcg));
        assert_eq!(d.milligrams(), None);
    }

    #[test]
    fn grams_convert_to_milligrams() {
        let d = parse_dose("1 g daily").unwrap();
        assert_eq!(d.unit, Some(DoseUnit::Grams));
        assert_eq!(d.milligrams(), Some(1000.0));
        assert_eq!(daily_total(&d, "BID"), 2000.0);
    }

    #[test]
    fn leading_number_tier_when_no_unit() {
        let d = parse_dose("take 10 daily").unwrap();
        assert_eq!(d.value, 10.0);
        assert_eq!(d.unit, None);
        assert_eq!(d.tier, ParseTier::LeadingNumber);
    }

    #[test]
    fn no_number_yields_none() {
        assert!(parse_dose("garbage").is_none());
        assert!(parse_dose("").is_none());
    }

    // ── Frequency ────────────────────────────────────────────────────────────

    #[test]
    fn frequency_text_classification() {
        assert_eq!(DoseFrequency::from_text("twice daily"), Some(DoseFrequency::TwiceDaily));
        assert_eq!(DoseFrequency::from_text("With meals"), Some(DoseFrequency::WithMeals));
        assert_eq!(DoseFrequency::from_text("once weekly"), Some(DoseFrequency::Weekly));
        assert_eq!(DoseFrequency::from_text("daily"), Some(DoseFrequency::Daily));
        assert_eq!(DoseFrequency::from_text("as directed"), None);
    }

    #[test]
    fn separate_frequency_field_doubles_daily_total() {
        let d = parse_dose("500 mg").unwrap();
        assert_eq!(daily_total(&d, "BID"), 1000.0);
        assert_eq!(daily_total(&d, "daily"), 500.0);
    }

    // ── Insulin ──────────────────────────────────────────────────────────────

    #[test]
    fn insulin_units_with_multipliers() {
        assert_eq!(insulin_total_daily_units("20 units", "daily"), Some(20.0));
        assert_eq!(insulin_total_daily_units("10 units", "BID"), Some(20.0));
        assert_eq!(insulin_total_daily_units("6 units", "with meals"), Some(18.0));
        assert_eq!(insulin_total_daily_units("Other: 22 units", ""), Some(22.0));
    }

    #[test]
    fn insulin_frequency_field_counts_even_when_dose_text_names_one() {
        assert_eq!(insulin_total_daily_units("10 units daily", "BID"), Some(20.0));
        assert_eq!(insulin_total_daily_units("10 units BID", "daily"), Some(20.0));
        assert_eq!(insulin_total_daily_units("4 units daily", "with meals"), Some(12.0));
    }

    #[test]
    fn split_doses_are_summed() {
        assert_eq!(insulin_total_daily_units("5-5-5", ""), Some(15.0));
        assert_eq!(insulin_total_daily_units("6/6/8 units", "with meals"), Some(20.0));
    }

    #[test]
    fn insulin_requires_units() {
        assert_eq!(insulin_total_daily_units("20 mg", "daily"), None);
        assert_eq!(insulin_units_lenient("18", "daily"), Some(18.0));
    }

    // ── Comparable amounts ───────────────────────────────────────────────────

    #[test]
    fn current_amount_daily_and_weekly() {
        assert_eq!(current_dose_amount("500 mg", "BID").daily_mg, Some(1000.0));
        let weekly = current_dose_amount("2 mg weekly", "");
        assert_eq!(weekly.weekly_mg, Some(2.0));
        assert_eq!(weekly.daily_mg, None);
        assert_eq!(current_dose_amount("20 units", "daily"), DoseAmount::default());
    }
}
