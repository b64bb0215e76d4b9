use std::collections::BTreeMap;

use crate::config::DEFAULT_RENO_RATE;
use crate::types::{normalize, CompsStatsRow, Property};

/// Estimated resale value (after-repair value) for one property.
///
/// Looks up the property's normalized (ville, quartier) in the comparable
/// statistics; uses the group median ppm2 when it exists, otherwise the
/// caller-supplied default (typically the portfolio-wide ppm2).
pub fn est_arv(prop: &Property, comps_stats: &[CompsStatsRow], default_ppm2: f64) -> f64 {
    let ville = normalize(&prop.ville);
    let quartier = normalize(&prop.quartier);
    let ppm2 = comps_stats
        .iter()
        .find(|s| s.ville == ville && s.quartier == quartier)
        .and_then(|s| s.ppm2_med)
        .unwrap_or(default_ppm2);
    ppm2 * prop.surface_m2
}

/// Renovation cost for one property: €/m² rate from the condition map
/// (falling back to its "par_defaut" entry, then to DEFAULT_RENO_RATE)
/// times the area.
pub fn renovation_cost(prop: &Property, reno_map: &BTreeMap<String, f64>) -> f64 {
    let cond = normalize(&prop.etat);
    let rate = reno_map
        .get(&cond)
        .or_else(|| reno_map.get("par_defaut"))
        .copied()
        .unwrap_or(DEFAULT_RENO_RATE);
    rate * prop.surface_m2
}

/// Holding cost over the project horizon: simple (non-compounded) interest
/// on the purchase price plus fixed monthly charges.
pub fn holding_costs(months: f64, price: f64, rate_annual: f64, other_monthly: f64) -> f64 {
    let interest = price * (rate_annual / 12.0) * months;
    interest + other_monthly * months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(ville: &str, quartier: &str, surface_m2: f64, etat: &str) -> Property {
        Property {
            id: "1".to_string(),
            adresse: "Rue Exemple 1".to_string(),
            ville: ville.to_string(),
            quartier: quartier.to_string(),
            surface_m2,
            prix_achat: 200_000.0,
            etat: etat.to_string(),
        }
    }

    fn stats(ville: &str, quartier: &str, med: Option<f64>) -> CompsStatsRow {
        CompsStatsRow {
            ville: ville.to_string(),
            quartier: quartier.to_string(),
            nb_comps: 3,
            ppm2_med: med,
            ppm2_mean: med,
            ppm2_std: None,
        }
    }

    #[test]
    fn arv_uses_group_median() {
        let p = prop(" Bruxelles", "Ixelles ", 65.0, "à rénover");
        let s = vec![stats("bruxelles", "ixelles", Some(6000.0))];
        assert_eq!(est_arv(&p, &s, 3000.0), 390_000.0);
    }

    #[test]
    fn arv_unmatched_group_uses_default_exactly() {
        let p = prop("gand", "centre", 80.0, "bon état");
        let s = vec![stats("bruxelles", "ixelles", Some(6000.0))];
        assert_eq!(est_arv(&p, &s, 3100.0), 3100.0 * 80.0);
    }

    #[test]
    fn arv_undefined_median_uses_default() {
        let p = prop("bruxelles", "ixelles", 50.0, "bon état");
        let s = vec![stats("bruxelles", "ixelles", None)];
        assert_eq!(est_arv(&p, &s, 4000.0), 200_000.0);
    }

    #[test]
    fn renovation_rate_by_condition_with_fallbacks() {
        let mut map = BTreeMap::new();
        map.insert("à rénover".to_string(), 800.0);
        map.insert("par_defaut".to_string(), 400.0);

        let p = prop("a", "b", 65.0, " À rénover ");
        assert_eq!(renovation_cost(&p, &map), 52_000.0);

        let p = prop("a", "b", 65.0, "inconnu");
        assert_eq!(renovation_cost(&p, &map), 26_000.0);

        let p = prop("a", "b", 10.0, "inconnu");
        let empty = BTreeMap::new();
        assert_eq!(renovation_cost(&p, &empty), DEFAULT_RENO_RATE * 10.0);
    }

    #[test]
    fn holding_costs_formula() {
        // price*(rate/12)*m + fixed*m
        let h = holding_costs(6.0, 210_000.0, 0.06, 200.0);
        assert_eq!(h, 210_000.0 * (0.06 / 12.0) * 6.0 + 200.0 * 6.0);
        assert!((h - 7_500.0).abs() < 1e-6);
    }

    #[test]
    fn holding_costs_linear_in_months_without_fixed() {
        let one = holding_costs(3.0, 150_000.0, 0.08, 0.0);
        let two = holding_costs(6.0, 150_000.0, 0.08, 0.0);
        assert!((two - 2.0 * one).abs() < 1e-9);
    }
}
