use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::routing::get;
use axum::{Json, Router};
use poolfix::FixtureService;
use poolfix::types::{FixturesResponse, WeekEntry};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;

pub const FIXTURES_PATH: &str = "/api/fixtures";
pub const FIXTURES_BY_DATE_PATH: &str = "/api/fixtures/{date}";
pub const WEEKS_PATH: &str = "/api/weeks";

pub fn build_router(service: Arc<FixtureService>) -> Router {
    Router::new()
        .route(FIXTURES_PATH, get(latest_fixtures))
        .route(FIXTURES_BY_DATE_PATH, get(fixtures_for_date))
        .route(WEEKS_PATH, get(available_weeks))
        .layer(cors_layer())
        .with_state(service)
}

/// Any origin may read the API. Preflight requests get an empty `200`.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

async fn latest_fixtures(
    State(service): State<Arc<FixtureService>>,
) -> Result<Json<FixturesResponse>, ApiError> {
    Ok(Json(service.latest_fixtures().await?))
}

async fn fixtures_for_date(
    State(service): State<Arc<FixtureService>>,
    Path(date): Path<String>,
) -> Result<Json<FixturesResponse>, ApiError> {
    Ok(Json(service.fixtures_for_date(&date).await?))
}

async fn available_weeks(
    State(service): State<Arc<FixtureService>>,
) -> Result<Json<Vec<WeekEntry>>, ApiError> {
    Ok(Json(service.available_weeks().await?))
}
