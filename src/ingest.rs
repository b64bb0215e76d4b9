//! CSV import and export. Column presence is validated up front so a bad
//! file fails with a 400 naming the missing columns instead of surfacing as
//! a lookup failure mid-computation. Extra columns are tolerated and ignored.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::types::{AnalysisRow, ComparableSale, Property};

pub const PROPERTY_COLUMNS: &[&str] = &[
    "id",
    "adresse",
    "ville",
    "quartier",
    "surface_m2",
    "prix_achat",
    "etat",
];

pub const COMPARABLE_COLUMNS: &[&str] = &["ville", "quartier", "surface_m2", "prix_vente"];

/// Output column order for the analysis export, used when the table is
/// empty and serde has no row to derive headers from.
const ANALYSIS_COLUMNS: &[&str] = &[
    "id",
    "adresse",
    "ville",
    "quartier",
    "surface_m2",
    "prix_achat",
    "etat",
    "arv_estime",
    "cout_renov",
    "frais_achat",
    "frais_vente",
    "holding_costs",
    "cout_total",
    "marge_brute",
    "roi",
    "ppm2_achat",
    "ppm2_arv",
    "risk_score",
    "opportunity_score",
];

fn check_columns(headers: &csv::StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingColumns(missing))
    }
}

pub fn parse_properties(data: &str) -> Result<Vec<Property>> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());
    let headers = rdr.headers()?.clone();
    check_columns(&headers, PROPERTY_COLUMNS)?;
    let mut out = Vec::new();
    for record in rdr.records() {
        out.push(record?.deserialize(Some(&headers))?);
    }
    Ok(out)
}

pub fn parse_comparables(data: &str) -> Result<Vec<ComparableSale>> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());
    let headers = rdr.headers()?.clone();
    check_columns(&headers, COMPARABLE_COLUMNS)?;
    let mut out = Vec::new();
    for record in rdr.records() {
        out.push(record?.deserialize(Some(&headers))?);
    }
    Ok(out)
}

fn to_csv<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    let data = wtr.into_inner().map_err(std::io::Error::other)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// UTF-8, comma-separated, headers first. An empty table still gets its
/// header row.
pub fn analysis_to_csv(rows: &[AnalysisRow]) -> Result<String> {
    if rows.is_empty() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(ANALYSIS_COLUMNS)?;
        let data = wtr.into_inner().map_err(std::io::Error::other)?;
        return Ok(String::from_utf8_lossy(&data).into_owned());
    }
    to_csv(rows)
}

// ---------------------------------------------------------------------------
// Bundled sample tables
// ---------------------------------------------------------------------------

pub fn sample_properties() -> Vec<Property> {
    let rows = [
        ("1", "Rue Exemple 1", "bruxelles", "ixelles", 65.0, 210_000.0, "à rénover"),
        ("2", "Rue Exemple 2", "bruxelles", "saint-gilles", 90.0, 295_000.0, "rafraîchir"),
        ("3", "Rue Exemple 3", "anvers", "zuid", 45.0, 145_000.0, "bon état"),
    ];
    rows.into_iter()
        .map(|(id, adresse, ville, quartier, surface_m2, prix_achat, etat)| Property {
            id: id.to_string(),
            adresse: adresse.to_string(),
            ville: ville.to_string(),
            quartier: quartier.to_string(),
            surface_m2,
            prix_achat,
            etat: etat.to_string(),
        })
        .collect()
}

pub fn sample_comparables() -> Vec<ComparableSale> {
    let rows = [
        ("bruxelles", "ixelles", 60.0, 360_000.0),
        ("bruxelles", "saint-gilles", 85.0, 525_000.0),
        ("anvers", "zuid", 50.0, 210_000.0),
        ("bruxelles", "ixelles", 70.0, 455_000.0),
        ("anvers", "zuid", 40.0, 195_000.0),
        ("bruxelles", "saint-gilles", 95.0, 560_000.0),
    ];
    rows.into_iter()
        .map(|(ville, quartier, surface_m2, prix_vente)| ComparableSale {
            ville: ville.to_string(),
            quartier: quartier.to_string(),
            surface_m2,
            prix_vente,
        })
        .collect()
}

pub fn sample_properties_csv() -> Result<String> {
    to_csv(&sample_properties())
}

pub fn sample_comparables_csv() -> Result<String> {
    to_csv(&sample_comparables())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_valid_properties_csv() {
        let csv = "id,adresse,ville,quartier,surface_m2,prix_achat,etat\n\
                   1,Rue Exemple 1,bruxelles,ixelles,65,210000,à rénover\n";
        let props = parse_properties(csv).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].surface_m2, 65.0);
        assert_eq!(props[0].etat, "à rénover");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "id,adresse,ville,quartier,surface_m2,prix_achat,etat,notes\n\
                   1,Rue Exemple 1,bruxelles,ixelles,65,210000,à rénover,belle vue\n";
        let props = parse_properties(csv).unwrap();
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn missing_column_is_rejected_by_name() {
        let csv = "id,adresse,ville,quartier,prix_achat,etat\n\
                   1,Rue Exemple 1,bruxelles,ixelles,210000,à rénover\n";
        let err = parse_properties(csv).unwrap_err();
        match err {
            AppError::MissingColumns(cols) => assert_eq!(cols, vec!["surface_m2"]),
            other => panic!("expected MissingColumns, got {other}"),
        }
    }

    #[test]
    fn comparables_missing_columns_lists_all() {
        let csv = "ville,quartier\nbruxelles,ixelles\n";
        let err = parse_comparables(csv).unwrap_err();
        match err {
            AppError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["surface_m2", "prix_vente"])
            }
            other => panic!("expected MissingColumns, got {other}"),
        }
    }

    #[test]
    fn samples_parse_back() {
        let props = parse_properties(&sample_properties_csv().unwrap()).unwrap();
        assert_eq!(props.len(), 3);
        let comps = parse_comparables(&sample_comparables_csv().unwrap()).unwrap();
        assert_eq!(comps.len(), 6);
    }

    #[test]
    fn empty_analysis_export_still_has_headers() {
        let out = analysis_to_csv(&[]).unwrap();
        let header = out.lines().next().unwrap();
        assert!(header.starts_with("id,adresse,ville"));
        assert!(header.ends_with("risk_score,opportunity_score"));
        assert_eq!(out.lines().count(), 1);
    }
}
