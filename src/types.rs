use serde::{Deserialize, Serialize};

/// Normalization applied to every grouping/lookup text field (city,
/// neighborhood, condition label) before comparison: trim + lowercase.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// Candidate property. Field names double as the CSV column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub adresse: String,
    pub ville: String,
    pub quartier: String,
    /// Livable area in m². Must be positive for sane ratios; a zero area is
    /// not rejected and propagates ±inf/NaN through the derived fields.
    pub surface_m2: f64,
    pub prix_achat: f64,
    /// Condition label — open-ended set ("à rénover", "bon état", ...).
    pub etat: String,
}

/// Comparable recent sale. Field names double as the CSV column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableSale {
    pub ville: String,
    pub quartier: String,
    pub surface_m2: f64,
    pub prix_vente: f64,
}

// ---------------------------------------------------------------------------
// Derived records
// ---------------------------------------------------------------------------

/// Per-(ville, quartier) price-per-m² statistics over the comparables table.
/// Recomputed on every analysis run, never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompsStatsRow {
    pub ville: String,
    pub quartier: String,
    /// Rows in the group, degenerate ppm2 values included.
    pub nb_comps: usize,
    /// None when the group has no usable (non-NaN) ppm2 values.
    pub ppm2_med: Option<f64>,
    pub ppm2_mean: Option<f64>,
    /// Sample standard deviation; None below 2 usable values.
    pub ppm2_std: Option<f64>,
}

/// One analyzed property: the normalized input fields plus every derived
/// financial column. Serializes flat, so it doubles as the CSV export row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub id: String,
    pub adresse: String,
    pub ville: String,
    pub quartier: String,
    pub surface_m2: f64,
    pub prix_achat: f64,
    pub etat: String,
    /// Estimated resale value (after-repair value).
    pub arv_estime: f64,
    pub cout_renov: f64,
    pub frais_achat: f64,
    pub frais_vente: f64,
    pub holding_costs: f64,
    pub cout_total: f64,
    pub marge_brute: f64,
    pub roi: f64,
    /// Diagnostic: purchase price per m².
    pub ppm2_achat: f64,
    /// Diagnostic: estimated resale value per m².
    pub ppm2_arv: f64,
    /// Blend of renovation intensity, leverage and market volatility,
    /// clamped to [0, 2].
    pub risk_score: f64,
    /// Percentile-rank blend of ROI, margin and inverted risk. Relative to
    /// the analyzed batch: the same property scores differently in a
    /// different batch.
    pub opportunity_score: f64,
}

// ---------------------------------------------------------------------------
// Project snapshot
// ---------------------------------------------------------------------------

/// Frozen copy of the three tables as of save time. Immutable once saved
/// except by re-saving under the same name (full overwrite).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub props: Vec<Property>,
    pub comps: Vec<ComparableSale>,
    pub analyses: Vec<AnalysisRow>,
}
