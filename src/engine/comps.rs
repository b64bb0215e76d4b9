use std::collections::BTreeMap;

use crate::config::DEFAULT_PPM2;
use crate::types::{normalize, ComparableSale, CompsStatsRow};

/// Aggregates the comparables table into per-(ville, quartier) price-per-m²
/// statistics. Pure: no side effects, output ordered by group key.
///
/// ppm2 = prix_vente / surface_m2 with no zero-area guard; ±inf propagates
/// into the group (and its median/mean), NaN values are skipped for the
/// statistics but still counted in nb_comps, so group counts always sum to
/// the input row count.
pub fn compute_comps_ppm2(comps: &[ComparableSale]) -> Vec<CompsStatsRow> {
    let mut groups: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for c in comps {
        let key = (normalize(&c.ville), normalize(&c.quartier));
        groups.entry(key).or_default().push(c.prix_vente / c.surface_m2);
    }

    groups
        .into_iter()
        .map(|((ville, quartier), ppm2)| {
            let usable: Vec<f64> = ppm2.iter().copied().filter(|v| !v.is_nan()).collect();
            CompsStatsRow {
                ville,
                quartier,
                nb_comps: ppm2.len(),
                ppm2_med: median(&usable),
                ppm2_mean: mean(&usable),
                ppm2_std: sample_std(&usable),
            }
        })
        .collect()
}

/// Portfolio-wide fallback ppm2: total sale price over total area, or
/// DEFAULT_PPM2 for an empty comparables table.
pub fn portfolio_ppm2(comps: &[ComparableSale]) -> f64 {
    if comps.is_empty() {
        return DEFAULT_PPM2;
    }
    let total_price: f64 = comps.iter().map(|c| c.prix_vente).sum();
    let total_area: f64 = comps.iter().map(|c| c.surface_m2).sum();
    total_price / total_area
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(ville: &str, quartier: &str, surface_m2: f64, prix_vente: f64) -> ComparableSale {
        ComparableSale {
            ville: ville.to_string(),
            quartier: quartier.to_string(),
            surface_m2,
            prix_vente,
        }
    }

    #[test]
    fn group_counts_sum_to_row_count() {
        let comps = vec![
            comp("bruxelles", "ixelles", 60.0, 360_000.0),
            comp("Bruxelles ", "IXELLES", 70.0, 455_000.0),
            comp("anvers", "zuid", 50.0, 210_000.0),
            comp("anvers", "zuid", 0.0, 100_000.0), // degenerate, still counted
        ];
        let stats = compute_comps_ppm2(&comps);
        let total: usize = stats.iter().map(|s| s.nb_comps).sum();
        assert_eq!(total, comps.len());
    }

    #[test]
    fn keys_are_normalized_and_merged() {
        let comps = vec![
            comp("  Bruxelles", "Ixelles ", 60.0, 360_000.0),
            comp("bruxelles", "ixelles", 70.0, 455_000.0),
        ];
        let stats = compute_comps_ppm2(&comps);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].ville, "bruxelles");
        assert_eq!(stats[0].quartier, "ixelles");
        assert_eq!(stats[0].nb_comps, 2);
    }

    #[test]
    fn median_even_and_odd() {
        let comps = vec![
            comp("a", "b", 1.0, 4000.0),
            comp("a", "b", 1.0, 6000.0),
        ];
        let stats = compute_comps_ppm2(&comps);
        assert_eq!(stats[0].ppm2_med, Some(5000.0));

        let comps = vec![
            comp("a", "b", 1.0, 4000.0),
            comp("a", "b", 1.0, 5000.0),
            comp("a", "b", 1.0, 9000.0),
        ];
        let stats = compute_comps_ppm2(&comps);
        assert_eq!(stats[0].ppm2_med, Some(5000.0));
    }

    #[test]
    fn std_requires_two_samples() {
        let comps = vec![comp("a", "b", 60.0, 360_000.0)];
        let stats = compute_comps_ppm2(&comps);
        assert_eq!(stats[0].ppm2_std, None);
        assert_eq!(stats[0].ppm2_mean, Some(6000.0));

        let comps = vec![
            comp("a", "b", 1.0, 4000.0),
            comp("a", "b", 1.0, 6000.0),
        ];
        let stats = compute_comps_ppm2(&comps);
        // sample std of {4000, 6000} = sqrt(2 * 1000^2 / 1) = ~1414.21
        let std = stats[0].ppm2_std.unwrap();
        assert!((std - 2000.0_f64 / 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn zero_area_propagates_infinity() {
        let comps = vec![comp("a", "b", 0.0, 100_000.0)];
        let stats = compute_comps_ppm2(&comps);
        assert_eq!(stats[0].ppm2_med, Some(f64::INFINITY));
    }

    #[test]
    fn portfolio_ppm2_is_total_over_total() {
        let comps = vec![
            comp("a", "b", 50.0, 300_000.0),
            comp("c", "d", 50.0, 200_000.0),
        ];
        assert_eq!(portfolio_ppm2(&comps), 5000.0);
    }

    #[test]
    fn portfolio_ppm2_empty_falls_back() {
        assert_eq!(portfolio_ppm2(&[]), DEFAULT_PPM2);
    }
}
