use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::health::health;
use crate::config::{Config, TOP_N};
use crate::engine::comps::{compute_comps_ppm2, portfolio_ppm2};
use crate::engine::metrics::{apply_filters, deal_metrics, top_by_score, Filters};
use crate::error::{AppError, Result};
use crate::ingest;
use crate::store::projects::ProjectStore;
use crate::store::settings::{Settings, SettingsStore};
use crate::store::users::UserStore;
use crate::types::{AnalysisRow, ComparableSale, CompsStatsRow, ProjectSnapshot, Property};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub settings: SettingsStore,
    pub users: UserStore,
    pub projects: ProjectStore,
}

impl AppState {
    pub fn new(cfg: Config) -> Self {
        let data_dir = cfg.data_dir.clone();
        Self {
            cfg,
            settings: SettingsStore::new(&data_dir),
            users: UserStore::new(&data_dir),
            projects: ProjectStore::new(&data_dir),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/analyze", post(analyze))
        .route("/analyze/export", post(analyze_export))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/projects", get(list_projects).post(save_project))
        .route("/projects/:name", get(load_project))
        .route("/projects/:name/export", get(export_project))
        .route("/samples/properties", get(sample_properties))
        .route("/samples/comparables", get(sample_comparables))
        .route("/billing", get(billing))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub properties_csv: String,
    pub comparables_csv: String,
    #[serde(default)]
    pub filters: Filters,
}

#[derive(Deserialize)]
pub struct SaveProjectRequest {
    pub owner: String,
    pub name: String,
    pub properties_csv: String,
    pub comparables_csv: String,
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub owner: String,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    /// Filtered analysis rows.
    pub rows: Vec<AnalysisRow>,
    /// Best rows of the filtered set by opportunity score.
    pub top: Vec<AnalysisRow>,
    pub comps_stats: Vec<CompsStatsRow>,
    /// Inline status ("Aucun résultat avec ces filtres.") — not an error.
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct SaveProjectResponse {
    pub ok: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<AuthResponse>> {
    let created = state.users.register(&req.email, &req.password)?;
    Ok(Json(if created {
        AuthResponse {
            ok: true,
            message: "OK".to_string(),
        }
    } else {
        AuthResponse {
            ok: false,
            message: "Utilisateur déjà existant".to_string(),
        }
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> Json<AuthResponse> {
    if state.users.verify(&req.email, &req.password) {
        Json(AuthResponse {
            ok: true,
            message: "Connecté.".to_string(),
        })
    } else {
        Json(AuthResponse {
            ok: false,
            message: "Identifiants invalides.".to_string(),
        })
    }
}

/// Parses both CSV tables and runs the full derivation with the currently
/// persisted settings.
fn run_analysis(
    settings: &Settings,
    properties_csv: &str,
    comparables_csv: &str,
) -> Result<(Vec<Property>, Vec<ComparableSale>, Vec<CompsStatsRow>, Vec<AnalysisRow>)> {
    let props = ingest::parse_properties(properties_csv)?;
    let comps = ingest::parse_comparables(comparables_csv)?;
    let stats = compute_comps_ppm2(&comps);
    let default_ppm2 = portfolio_ppm2(&comps);
    let rows = deal_metrics(&props, &stats, default_ppm2, settings);
    Ok((props, comps, stats, rows))
}

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    let settings = state.settings.load();
    let (props, comps, stats, rows) =
        run_analysis(&settings, &req.properties_csv, &req.comparables_csv)?;
    let filtered = apply_filters(&rows, &req.filters);
    info!(
        properties = props.len(),
        comparables = comps.len(),
        matched = filtered.len(),
        "Analysis run"
    );

    let message = if filtered.is_empty() {
        Some("Aucun résultat avec ces filtres.".to_string())
    } else {
        None
    };
    let top = top_by_score(&filtered, TOP_N);
    Ok(Json(AnalyzeResponse {
        rows: filtered,
        top,
        comps_stats: stats,
        message,
    }))
}

async fn analyze_export(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse> {
    let settings = state.settings.load();
    let (_, _, _, rows) = run_analysis(&settings, &req.properties_csv, &req.comparables_csv)?;
    let filtered = apply_filters(&rows, &req.filters);
    let csv = ingest::analysis_to_csv(&filtered)?;
    Ok(csv_response(csv))
}

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.load())
}

async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>> {
    state.settings.save(&settings)?;
    info!("Settings saved");
    Ok(Json(settings))
}

async fn save_project(
    State(state): State<AppState>,
    Json(req): Json<SaveProjectRequest>,
) -> Result<Json<SaveProjectResponse>> {
    let settings = state.settings.load();
    let (props, comps, _, analyses) =
        run_analysis(&settings, &req.properties_csv, &req.comparables_csv)?;
    let snapshot = ProjectSnapshot {
        props,
        comps,
        analyses,
    };
    state.projects.save(&req.owner, &req.name, &snapshot)?;
    info!(owner = %req.owner, name = %req.name, "Project saved");
    Ok(Json(SaveProjectResponse {
        ok: true,
        message: format!("Projet '{}' sauvegardé.", req.name),
    }))
}

async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
) -> Json<Vec<String>> {
    Json(state.projects.list(&params.owner))
}

async fn load_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<ProjectSnapshot>> {
    state
        .projects
        .load(&params.owner, &name)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("project '{name}'")))
}

async fn export_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<OwnerQuery>,
) -> Result<impl IntoResponse> {
    let snapshot = state
        .projects
        .load(&params.owner, &name)
        .ok_or_else(|| AppError::NotFound(format!("project '{name}'")))?;
    let csv = ingest::analysis_to_csv(&snapshot.analyses)?;
    Ok(csv_response(csv))
}

async fn sample_properties() -> Result<impl IntoResponse> {
    Ok(csv_response(ingest::sample_properties_csv()?))
}

async fn sample_comparables() -> Result<impl IntoResponse> {
    Ok(csv_response(ingest::sample_comparables_csv()?))
}

/// Placeholder — billing is not wired to any payment provider.
async fn billing() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "placeholder",
        "note": "Abonnement & paiement non branchés — l'application reste utilisable localement sans paiement."
    }))
}

fn csv_response(csv: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv)
}
