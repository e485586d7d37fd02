//! Rutas del ciclo de vida de vehículos y reporting de usuario

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::parking_controller::ParkingController;
use crate::controllers::report_controller::ReportController;
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::analytics::{AnalyticsFilters, AnalyticsResponse};
use crate::models::vehicle::{
    CheckInRequest, CheckOutRequest, HandoverRequest, VehicleFilters, VehicleResponse,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_parking_router() -> Router<AppState> {
    Router::new()
        .route("/check-in", post(check_in))
        .route("/check-out", post(check_out))
        .route("/report", get(report))
        .route("/analytics", get(analytics))
        .route("/handover", post(handover))
        .route("/handover/:vehicle_id/cancel", post(cancel_handover))
}

async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = ParkingController::new(state.pool.clone());
    let response = controller.check_in(&user, request).await?;
    Ok(Json(response))
}

async fn check_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CheckOutRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = ParkingController::new(state.pool.clone());
    let response = controller.check_out(&user, request).await?;
    Ok(Json(response))
}

async fn report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    let response = controller.report(&user, filters).await?;
    Ok(Json(response))
}

async fn analytics(
    State(state): State<AppState>,
    Query(filters): Query<AnalyticsFilters>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    let response = controller.analytics(filters).await?;
    Ok(Json(response))
}

async fn handover(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<HandoverRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = ParkingController::new(state.pool.clone());
    let response = controller.handover(&user, request).await?;
    Ok(Json(response))
}

async fn cancel_handover(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = ParkingController::new(state.pool.clone());
    let response = controller.cancel_handover(&user, vehicle_id).await?;
    Ok(Json(response))
}
