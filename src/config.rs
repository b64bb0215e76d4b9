use std::path::PathBuf;

use crate::error::{AppError, Result};

/// Fallback price-per-m² used when the comparables table is empty.
pub const DEFAULT_PPM2: f64 = 3000.0;

/// Renovation €/m² applied when a condition label is missing from the
/// renovation map and the map itself carries no "par_defaut" entry.
pub const DEFAULT_RENO_RATE: f64 = 400.0;

/// Rows returned in the "top by opportunity score" cut.
pub const TOP_N: usize = 10;

/// Risk score blend over renovation intensity / leverage / market volatility.
pub mod risk_blend {
    pub const W_RENO_INTENSITY: f64 = 0.5;
    pub const W_LEVERAGE: f64 = 0.4;
    pub const W_MARKET: f64 = 0.1;

    /// Risk scores are clamped to [0, RISK_MAX].
    pub const RISK_MAX: f64 = 2.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_port: u16,
    pub log_level: String,
    /// Directory holding users.json / projects.json / settings.json (DATA_DIR).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var("DATA_DIR") {
            Ok(d) => PathBuf::from(d),
            Err(_) => std::env::temp_dir().join("immoroi_data"),
        };
        Ok(Self {
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| {
                    AppError::Config("API_PORT must be a valid port number".to_string())
                })?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_dir,
        })
    }
}
