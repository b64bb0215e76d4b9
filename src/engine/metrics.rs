use serde::Deserialize;

use crate::config::{risk_blend, DEFAULT_RENO_RATE};
use crate::engine::estimators::{est_arv, holding_costs, renovation_cost};
use crate::store::settings::Settings;
use crate::types::{normalize, AnalysisRow, CompsStatsRow, Property};

/// Derives every financial column for each input property.
///
/// Per-row derivation order: normalize text fields → ARV → renovation cost →
/// purchase/sale fees → holding costs → total cost → margin → ROI →
/// diagnostic ppm2 → risk score. The final opportunity score is the only
/// cross-row step: it blends percentile ranks of ROI, margin and inverted
/// risk over the analyzed batch, so scores are relative to the batch and a
/// different batch rescores every property.
///
/// Numeric edge cases (zero area, zero total cost, empty comparable group)
/// are not rejected: NaN/inf propagate through the row, and NaN is treated
/// as zero when blending risk and ranking.
pub fn deal_metrics(
    props: &[Property],
    comps_stats: &[CompsStatsRow],
    default_ppm2: f64,
    settings: &Settings,
) -> Vec<AnalysisRow> {
    let reno_default = settings
        .reno_map
        .get("par_defaut")
        .copied()
        .unwrap_or(DEFAULT_RENO_RATE)
        .max(1.0);

    let mut rows: Vec<AnalysisRow> = props
        .iter()
        .map(|p| {
            let mut p = p.clone();
            p.ville = normalize(&p.ville);
            p.quartier = normalize(&p.quartier);
            p.etat = normalize(&p.etat);

            let arv_estime = est_arv(&p, comps_stats, default_ppm2);
            let cout_renov = renovation_cost(&p, &settings.reno_map);
            let frais_achat = p.prix_achat * settings.frais_achat_pct;
            let frais_vente = arv_estime * settings.frais_vente_pct;
            let holding = holding_costs(
                settings.duree_mois as f64,
                p.prix_achat,
                settings.taux_annuel,
                settings.autres_frais_mensuels,
            );
            let cout_total = p.prix_achat + cout_renov + frais_achat + frais_vente + holding;
            let marge_brute = arv_estime - cout_total;
            let roi = marge_brute / cout_total;

            let reno_intensity = cout_renov / (p.surface_m2 * reno_default);
            let leverage = p.prix_achat / arv_estime;
            let risk_score = (risk_blend::W_RENO_INTENSITY * nan_to_zero(reno_intensity)
                + risk_blend::W_LEVERAGE * nan_to_zero(leverage)
                + risk_blend::W_MARKET * settings.risque_marche)
                .clamp(0.0, risk_blend::RISK_MAX);

            AnalysisRow {
                ppm2_achat: p.prix_achat / p.surface_m2,
                ppm2_arv: arv_estime / p.surface_m2,
                id: p.id,
                adresse: p.adresse,
                ville: p.ville,
                quartier: p.quartier,
                surface_m2: p.surface_m2,
                prix_achat: p.prix_achat,
                etat: p.etat,
                arv_estime,
                cout_renov,
                frais_achat,
                frais_vente,
                holding_costs: holding,
                cout_total,
                marge_brute,
                roi,
                risk_score,
                opportunity_score: 0.0,
            }
        })
        .collect();

    let roi_rank = pct_rank(&rows.iter().map(|r| nan_to_zero(r.roi)).collect::<Vec<_>>());
    let marge_rank = pct_rank(&rows.iter().map(|r| nan_to_zero(r.marge_brute)).collect::<Vec<_>>());
    let risk_rank = pct_rank(&rows.iter().map(|r| nan_to_zero(r.risk_score)).collect::<Vec<_>>());

    let w = &settings.weights;
    for (i, row) in rows.iter_mut().enumerate() {
        row.opportunity_score =
            roi_rank[i] * w.w_roi + marge_rank[i] * w.w_margin + (1.0 - risk_rank[i]) * w.w_risk;
    }

    rows
}

/// NaN → 0. Infinities pass through (they still rank/clamp at the extreme).
fn nan_to_zero(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// Percentile rank with average ranks for ties, divided by the set size.
/// Matches pandas `rank(pct=True)` for NaN-free input.
fn pct_rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[idx[j + 1]] == values[idx[i]] {
            j += 1;
        }
        // ordinal ranks are 1-based; ties share the average
        let avg_rank = (i + j + 2) as f64 / 2.0;
        for k in i..=j {
            ranks[idx[k]] = avg_rank / n as f64;
        }
        i = j + 1;
    }
    ranks
}

// ---------------------------------------------------------------------------
// Result filtering / top-N
// ---------------------------------------------------------------------------

/// Dashboard filters. A NaN in a compared field fails the comparison and
/// drops the row, same as the original surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filters {
    pub min_roi: Option<f64>,
    pub min_marge: Option<f64>,
    pub max_risk: Option<f64>,
    /// Substring match on the normalized city.
    pub ville: Option<String>,
    /// Substring match on the normalized neighborhood.
    pub quartier: Option<String>,
    pub min_surface: Option<f64>,
}

pub fn apply_filters(rows: &[AnalysisRow], f: &Filters) -> Vec<AnalysisRow> {
    rows.iter()
        .filter(|r| f.min_roi.map_or(true, |v| r.roi >= v))
        .filter(|r| f.min_marge.map_or(true, |v| r.marge_brute >= v))
        .filter(|r| f.max_risk.map_or(true, |v| r.risk_score <= v))
        .filter(|r| {
            f.ville
                .as_ref()
                .map_or(true, |v| v.trim().is_empty() || r.ville.contains(&normalize(v)))
        })
        .filter(|r| {
            f.quartier
                .as_ref()
                .map_or(true, |v| v.trim().is_empty() || r.quartier.contains(&normalize(v)))
        })
        .filter(|r| f.min_surface.map_or(true, |v| r.surface_m2 >= v))
        .cloned()
        .collect()
}

/// Top N rows by opportunity score, descending.
pub fn top_by_score(rows: &[AnalysisRow], n: usize) -> Vec<AnalysisRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.opportunity_score
            .partial_cmp(&a.opportunity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}
