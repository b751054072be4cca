//! Molecule identification from drug names, brand names, and dose text.

use dosewise_contracts::drug::DrugClass;

/// Molecules with their own titration ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Molecule {
    Canagliflozin,
    Dapagliflozin,
    Empagliflozin,
    Sitagliptin,
    Alogliptin,
    Saxagliptin,
    Linagliptin,
    Semaglutide,
    OralSemaglutide,
    Dulaglutide,
    Tirzepatide,
    Exenatide,
    ExenatideExtendedRelease,
    Liraglutide,
    Glipizide,
    Glimepiride,
    Glyburide,
    Pioglitazone,
}

impl Molecule {
    /// Generic name for instruction text.
    pub fn name(self) -> &'static str {
        match self {
            Molecule::Canagliflozin => "Canagliflozin",
            Molecule::Dapagliflozin => "Dapagliflozin",
            Molecule::Empagliflozin => "Empagliflozin",
            Molecule::Sitagliptin => "Sitagliptin",
            Molecule::Alogliptin => "Alogliptin",
            Molecule::Saxagliptin => "Saxagliptin",
            Molecule::Linagliptin => "Linagliptin",
            Molecule::Semaglutide => "Semaglutide",
            Molecule::OralSemaglutide => "Rybelsus",
            Molecule::Dulaglutide => "Dulaglutide",
            Molecule::Tirzepatide => "Tirzepatide",
            Molecule::Exenatide => "Exenatide",
            Molecule::ExenatideExtendedRelease => "Bydureon",
            Molecule::Liraglutide => "Liraglutide",
            Molecule::Glipizide => "Glipizide",
            Molecule::Glimepiride => "Glimepiride",
            Molecule::Glyburide => "Glyburide",
            Molecule::Pioglitazone => "Pioglitazone",
        }
    }
}

// (molecule, keywords) per class. More specific entries come first.
const SGLT2: &[(Molecule, &[&str])] = &[
    (Molecule::Canagliflozin, &["canagliflozin", "invokana"]),
    (Molecule::Dapagliflozin, &["dapagliflozin", "farxiga"]),
    (Molecule::Empagliflozin, &["empagliflozin", "jardiance"]),
];

const DPP4: &[(Molecule, &[&str])] = &[
    (Molecule::Sitagliptin, &["sitagliptin", "januvia"]),
    (Molecule::Alogliptin, &["alogliptin", "nesina"]),
    (Molecule::Saxagliptin, &["saxagliptin", "onglyza"]),
    (Molecule::Linagliptin, &["linagliptin", "tradjenta"]),
];

const GLP1: &[(Molecule, &[&str])] = &[
    (Molecule::OralSemaglutide, &["rybelsus"]),
    (Molecule::Semaglutide, &["semaglutide", "ozempic"]),
    (Molecule::Dulaglutide, &["dulaglutide", "trulicity"]),
    (Molecule::Tirzepatide, &["tirzepatide", "mounjaro"]),
    (Molecule::ExenatideExtendedRelease, &["bydureon"]),
    (Molecule::Exenatide, &["exenatide", "byetta"]),
    (Molecule::Liraglutide, &["liraglutide", "victoza"]),
];

const SULFONYLUREA: &[(Molecule, &[&str])] = &[
    (Molecule::Glipizide, &["glipizide", "glucotrol"]),
    (Molecule::Glimepiride, &["glimepiride", "amaryl"]),
    (Molecule::Glyburide, &["glyburide", "diabeta", "glynase"]),
];

const TZD: &[(Molecule, &[&str])] = &[(Molecule::Pioglitazone, &["pioglitazone", "actos"])];

fn table_for(class: &DrugClass) -> &'static [(Molecule, &'static [&'static str])] {
    match class {
        DrugClass::Sglt2 => SGLT2,
        DrugClass::Dpp4 => DPP4,
        DrugClass::Glp1 => GLP1,
        DrugClass::Sulfonylurea => SULFONYLUREA,
        DrugClass::Tzd => TZD,
        _ => &[],
    }
}

/// Identify the molecule of a class from any of the given texts.
///
/// Texts are searched in order, so pass the drug name before the dose text.
pub fn identify(class: &DrugClass, texts: &[&str]) -> Option<Molecule> {
    let table = table_for(class);
    texts.iter().find_map(|text| {
        let lower = text.to_lowercase();
        table
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(m, _)| *m)
    })
}

/// Identify a molecule from text alone, across every class.
pub fn identify_any(text: &str) -> Option<Molecule> {
    [
        DrugClass::Sglt2,
        DrugClass::Dpp4,
        DrugClass::Glp1,
        DrugClass::Sulfonylurea,
        DrugClass::Tzd,
    ]
    .iter()
    .find_map(|class| identify(class, &[text]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_names_resolve_to_molecules() {
        assert_eq!(identify(&DrugClass::Sglt2, &["Jardiance"]), Some(Molecule::Empagliflozin));
        assert_eq!(identify(&DrugClass::Glp1, &["Ozempic"]), Some(Molecule::Semaglutide));
        assert_eq!(identify(&DrugClass::Sulfonylurea, &["Amaryl"]), Some(Molecule::Glimepiride));
    }

    #[test]
    fn rybelsus_wins_over_semaglutide() {
        assert_eq!(
            identify(&DrugClass::Glp1, &["Semaglutide (Rybelsus)"]),
            Some(Molecule::OralSemaglutide)
        );
    }

    #[test]
    fn dose_text_is_searched_after_name() {
        assert_eq!(
            identify(&DrugClass::Dpp4, &["", "Januvia 100 mg"]),
            Some(Molecule::Sitagliptin)
        );
    }

    #[test]
    fn class_mismatch_finds_nothing() {
        assert_eq!(identify(&DrugClass::Metformin, &["Glipizide"]), None);
        assert_eq!(identify_any("Glipizide XL"), Some(Molecule::Glipizide));
    }
}
