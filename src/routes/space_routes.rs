//! Rutas públicas de ocupación

use axum::{extract::State, routing::get, Json, Router};

use crate::controllers::space_controller::SpaceController;
use crate::models::parking_space::SpaceResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

/// Ocupación actual por categoría
async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<SpaceResponse>>, AppError> {
    let controller = SpaceController::new(state.pool.clone());
    let response = controller.occupancy().await?;
    Ok(Json(response))
}
