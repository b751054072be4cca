//! Ranking and candidate selection.

use std::cmp::Ordering;

use tracing::debug;

use dosewise_contracts::config::FormularyConfig;
use dosewise_contracts::score::ScoreResult;

use crate::clinical::clinical_fit;
use crate::context::ScoringContext;
use crate::coverage::coverage;

/// Size of the best-fit pool searched for the cheapest option.
pub const CHEAPEST_POOL: usize = 5;
/// Coverage a cheapest option should clear before the fallback applies.
pub const VIABLE_COVERAGE: f64 = 0.5;

/// Score every drug and order by (clinical fit desc, coverage desc).
///
/// Excluded drugs never appear. Ties keep config declaration order.
pub fn score_all(ctx: &ScoringContext<'_>) -> Vec<ScoreResult> {
    let mut results: Vec<ScoreResult> = ctx
        .drugs()
        .iter()
        .filter_map(|drug| {
            let fit = clinical_fit(drug, ctx);
            if fit.is_excluded() {
                return None;
            }
            Some(ScoreResult {
                drug: drug.id.clone(),
                class: drug.class.clone(),
                clinical_fit: fit.fit,
                clinical_fit_rank: fit.fit_for_ranking,
                coverage: coverage(drug, ctx),
            })
        })
        .collect();

    // `sort_by` is stable, so equal keys keep declaration order.
    results.sort_by(|a, b| {
        b.clinical_fit
            .total_cmp(&a.clinical_fit)
            .then_with(|| b.coverage.total_cmp(&a.coverage))
    });
    debug!(candidates = results.len(), "ranked candidates");
    results
}

/// Best entry, then the next entry of a different class.
pub fn top_two(ranked: &[ScoreResult]) -> Vec<&ScoreResult> {
    let Some(first) = ranked.first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    if let Some(second) = ranked.iter().skip(1).find(|r| r.class != first.class) {
        out.push(second);
    }
    out
}

/// Sort key for cheapness: known price first, then cost rank, then tier.
/// Missing values sort last.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CostKey {
    price: Option<f64>,
    cost_rank: Option<u8>,
    tier: Option<u8>,
}

impl CostKey {
    fn of(drug_id: &str, config: &FormularyConfig) -> Self {
        let drug = config.drug(drug_id);
        Self {
            price: drug.and_then(|d| d.price_per_month),
            cost_rank: drug.and_then(|d| d.cost).map(|c| c.rank()),
            tier: drug.and_then(|d| d.tier),
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
            match (a, b) {
                (Some(x), Some(y)) => cmp(&x, &y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
        missing_last(self.price, other.price, f64::total_cmp)
            .then_with(|| missing_last(self.cost_rank, other.cost_rank, Ord::cmp))
            .then_with(|| missing_last(self.tier, other.tier, Ord::cmp))
    }
}

/// The cheapest viable candidate not in `exclude`.
///
/// Searches the top five by fit first and the whole list second. Only
/// drugs present in the config are considered. Viable means coverage above
/// 0.5; when nothing in a pool clears 0.5, any positive coverage will do.
pub fn cheapest_option<'r>(
    ranked: &'r [ScoreResult],
    config: &FormularyConfig,
    exclude: &[&str],
) -> Option<&'r ScoreResult> {
    let top = &ranked[..ranked.len().min(CHEAPEST_POOL)];
    for pool in [top, ranked] {
        let known: Vec<&ScoreResult> = pool.iter().filter(|r| config.drug(&r.drug).is_some()).collect();
        let mut viable: Vec<&ScoreResult> = known
            .iter()
            .copied()
            .filter(|r| r.coverage > VIABLE_COVERAGE)
            .collect();
        if viable.is_empty() {
            viable = known.into_iter().filter(|r| r.coverage > 0.0).collect();
        }
        viable.sort_by(|a, b| CostKey::of(&a.drug, config).cmp(&CostKey::of(&b.drug, config)));
        if let Some(found) = viable.into_iter().find(|r| !exclude.contains(&r.drug.as_str())) {
            debug!(drug = %found.drug, "cheapest option selected");
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosewise_contracts::drug::DrugClass;
    use dosewise_contracts::profile::PatientProfile;

    fn result(drug: &str, class: DrugClass, fit: f64, coverage: f64) -> ScoreResult {
        ScoreResult {
            drug: drug.to_string(),
            class,
            clinical_fit: fit,
            clinical_fit_rank: fit,
            coverage,
        }
    }

    fn priced_config() -> FormularyConfig {
        toml::from_str(
            r#"
            [[drugs]]
            id = "Empagliflozin"
            class = "SGLT2"
            cost = "high"
            tier = 2
            price_per_month = 550.0

            [[drugs]]
            id = "Metformin"
            class = "Metformin"
            cost = "low"
            tier = 1
            price_per_month = 4.0

            [[drugs]]
            id = "Glipizide"
            class = "Sulfonylurea"
            cost = "low"
            tier = 1

            [[drugs]]
            id = "Sitagliptin"
            class = "DPP4"
            cost = "medium"
            tier = 2
            price_per_month = 40.0
            "#,
        )
        .unwrap()
    }

    // ── Ordering ─────────────────────────────────────────────────────────────

    #[test]
    fn ranking_orders_by_fit_then_coverage_and_drops_excluded() {
        let cfg: FormularyConfig = toml::from_str(
            r#"
            [[drugs]]
            id = "A"
            class = "DPP4"
            clinical_base = 0.6
            base_access_score = 0.5

            [[drugs]]
            id = "B"
            class = "DPP4"
            clinical_base = 0.6
            base_access_score = 0.7

            [[drugs]]
            id = "C"
            class = "TZD"
            clinical_base = 0.8

            [[drugs]]
            id = "D"
            class = "TZD"
            clinical_base = 0.8
            deny_if = [ { field = "age", op = "gt", value = 0 } ]
            "#,
        )
        .unwrap();
        let profile = PatientProfile::builder().egfr(60.0).age(50).goal(8.0).build(&cfg.drugs);
        let ctx = ScoringContext::new(&cfg, &profile, None);
        let ranked = score_all(&ctx);
        let ids: Vec<&str> = ranked.iter().map(|r| r.drug.as_str()).collect();
        assert_eq!(ids, vec!["C", "B", "A"]);
        assert!(ranked.iter().all(|r| r.clinical_fit > 0.0));
    }

    #[test]
    fn top_two_skips_same_class() {
        let ranked = vec![
            result("Empagliflozin", DrugClass::Sglt2, 0.9, 0.5),
            result("Dapagliflozin", DrugClass::Sglt2, 0.88, 0.5),
            result("Metformin", DrugClass::Metformin, 0.8, 0.8),
        ];
        let picks: Vec<&str> = top_two(&ranked).iter().map(|r| r.drug.as_str()).collect();
        assert_eq!(picks, vec!["Empagliflozin", "Metformin"]);
        assert!(top_two(&[]).is_empty());
    }

    // ── Cheapest ─────────────────────────────────────────────────────────────

    #[test]
    fn cheapest_prefers_known_price() {
        let cfg = priced_config();
        let ranked = vec![
            result("Empagliflozin", DrugClass::Sglt2, 0.9, 0.6),
            result("Glipizide", DrugClass::Sulfonylurea, 0.7, 0.8),
            result("Sitagliptin", DrugClass::Dpp4, 0.6, 0.7),
            result("Metformin", DrugClass::Metformin, 0.5, 0.8),
        ];
        let pick = cheapest_option(&ranked, &cfg, &[]).unwrap();
        assert_eq!(pick.drug, "Metformin");

        let pick = cheapest_option(&ranked, &cfg, &["Metformin"]).unwrap();
        assert_eq!(pick.drug, "Sitagliptin", "priced drugs sort before unpriced ones");
    }

    #[test]
    fn cheapest_falls_back_to_positive_coverage() {
        let cfg = priced_config();
        let ranked = vec![
            result("Empagliflozin", DrugClass::Sglt2, 0.9, 0.3),
            result("Sitagliptin", DrugClass::Dpp4, 0.6, 0.2),
        ];
        let pick = cheapest_option(&ranked, &cfg, &[]).unwrap();
        assert_eq!(pick.drug, "Sitagliptin");
    }

    #[test]
    fn cheapest_fallback_ignores_drugs_missing_from_config() {
        let cfg = priced_config();
        let ranked = vec![
            result("Retired", DrugClass::Dpp4, 0.9, 0.3),
            result("Empagliflozin", DrugClass::Sglt2, 0.8, 0.2),
        ];
        assert_eq!(cheapest_option(&ranked, &cfg, &[]).unwrap().drug, "Empagliflozin");
        assert!(
            cheapest_option(&ranked, &cfg, &["Empagliflozin"]).is_none(),
            "a drug absent from the formulary is never offered"
        );
    }

    #[test]
    fn cheapest_searches_beyond_top_five_when_excluded() {
        let cfg = priced_config();
        let ranked = vec![
            result("Empagliflozin", DrugClass::Sglt2, 0.9, 0.6),
            result("Sitagliptin", DrugClass::Dpp4, 0.85, 0.6),
            result("X1", DrugClass::Tzd, 0.8, 0.0),
            result("X2", DrugClass::Tzd, 0.8, 0.0),
            result("X3", DrugClass::Tzd, 0.8, 0.0),
            result("Metformin", DrugClass::Metformin, 0.5, 0.8),
        ];
        let pick = cheapest_option(&ranked, &cfg, &["Empagliflozin", "Sitagliptin"]).unwrap();
        assert_eq!(pick.drug, "Metformin");
    }
}
