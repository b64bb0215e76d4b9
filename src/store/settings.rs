use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::store::{read_json_or, write_json};

/// Opportunity score weights (ROI / gross margin / inverted risk).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default = "default_w_roi")]
    pub w_roi: f64,
    #[serde(default = "default_w_margin")]
    pub w_margin: f64,
    #[serde(default = "default_w_risk")]
    pub w_risk: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            w_roi: default_w_roi(),
            w_margin: default_w_margin(),
            w_risk: default_w_risk(),
        }
    }
}

/// Analysis parameters, persisted as settings.json. Field names match the
/// stored keys, so files written by older versions load unchanged; any
/// known key missing from the file takes its default on load, and unknown
/// extra keys survive a load/save cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Purchase-fee fraction of the purchase price.
    #[serde(default = "default_frais_achat_pct")]
    pub frais_achat_pct: f64,
    /// Sale-fee fraction of the estimated resale value.
    #[serde(default = "default_frais_vente_pct")]
    pub frais_vente_pct: f64,
    /// Project duration in months.
    #[serde(default = "default_duree_mois")]
    pub duree_mois: u32,
    /// Annual financing rate.
    #[serde(default = "default_taux_annuel")]
    pub taux_annuel: f64,
    /// Fixed monthly holding cost (€).
    #[serde(default = "default_autres_frais_mensuels")]
    pub autres_frais_mensuels: f64,
    /// Market-risk factor fed into the risk score.
    #[serde(default = "default_risque_marche")]
    pub risque_marche: f64,
    /// Condition label → renovation €/m². "par_defaut" is the fallback rate.
    #[serde(default = "default_reno_map")]
    pub reno_map: BTreeMap<String, f64>,
    #[serde(default)]
    pub weights: Weights,
    /// Keys this version does not know about, preserved across saves.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frais_achat_pct: default_frais_achat_pct(),
            frais_vente_pct: default_frais_vente_pct(),
            duree_mois: default_duree_mois(),
            taux_annuel: default_taux_annuel(),
            autres_frais_mensuels: default_autres_frais_mensuels(),
            risque_marche: default_risque_marche(),
            reno_map: default_reno_map(),
            weights: Weights::default(),
            extra: serde_json::Map::new(),
        }
    }
}

fn default_frais_achat_pct() -> f64 {
    0.07
}
fn default_frais_vente_pct() -> f64 {
    0.04
}
fn default_duree_mois() -> u32 {
    6
}
fn default_taux_annuel() -> f64 {
    0.06
}
fn default_autres_frais_mensuels() -> f64 {
    200.0
}
fn default_risque_marche() -> f64 {
    0.2
}
fn default_w_roi() -> f64 {
    0.6
}
fn default_w_margin() -> f64 {
    0.3
}
fn default_w_risk() -> f64 {
    0.1
}

fn default_reno_map() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("à rénover".to_string(), 800.0),
        ("rafraîchir".to_string(), 450.0),
        ("bon état".to_string(), 150.0),
        ("très bon état".to_string(), 50.0),
        ("par_defaut".to_string(), 400.0),
    ])
}

/// Loads and saves the settings record. Loading always succeeds: a missing
/// or malformed file yields the defaults, and serde field defaults fill any
/// missing key from a partially-written file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("settings.json"),
        }
    }

    pub fn load(&self) -> Settings {
        read_json_or(&self.path, Settings::default)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        write_json(&self.path, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.frais_achat_pct, 0.07);
        assert_eq!(s.frais_vente_pct, 0.04);
        assert_eq!(s.duree_mois, 6);
        assert_eq!(s.taux_annuel, 0.06);
        assert_eq!(s.autres_frais_mensuels, 200.0);
        assert_eq!(s.risque_marche, 0.2);
        assert_eq!(s.reno_map.get("à rénover"), Some(&800.0));
        assert_eq!(s.reno_map.get("par_defaut"), Some(&400.0));
        assert_eq!(s.weights.w_roi, 0.6);
        assert_eq!(s.weights.w_margin, 0.3);
        assert_eq!(s.weights.w_risk, 0.1);
    }

    #[test]
    fn missing_key_takes_default_others_preserved() {
        // no "taux_annuel" key in the stored record
        let raw = r#"{"frais_achat_pct": 0.10, "duree_mois": 12}"#;
        let s: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(s.frais_achat_pct, 0.10);
        assert_eq!(s.duree_mois, 12);
        assert_eq!(s.taux_annuel, 0.06);
        assert_eq!(s.weights.w_roi, 0.6);
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let raw = r#"{"frais_achat_pct": 0.08, "futur_champ": "gardé"}"#;
        let s: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(s.extra.get("futur_champ").unwrap(), "gardé");
        let out = serde_json::to_value(&s).unwrap();
        assert_eq!(out.get("futur_champ").unwrap(), "gardé");
        assert_eq!(out.get("frais_achat_pct").unwrap(), 0.08);
    }

    #[test]
    fn store_load_missing_file_yields_defaults_and_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let mut s = store.load();
        assert_eq!(s.frais_achat_pct, 0.07);

        s.frais_achat_pct = 0.09;
        s.reno_map.insert("à rénover".to_string(), 900.0);
        store.save(&s).unwrap();

        let back = store.load();
        assert_eq!(back.frais_achat_pct, 0.09);
        assert_eq!(back.reno_map.get("à rénover"), Some(&900.0));
        // untouched keys keep their saved (default) values
        assert_eq!(back.frais_vente_pct, 0.04);
    }
}
