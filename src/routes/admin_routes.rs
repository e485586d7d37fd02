//! Rutas de administración
//!
//! Gestión de usuarios, ajuste de capacidades, report global,
//! export CSV y handovers vigentes.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::controllers::parking_controller::ParkingController;
use crate::controllers::report_controller::ReportController;
use crate::controllers::space_controller::SpaceController;
use crate::controllers::user_controller::UserController;
use crate::dto::ApiResponse;
use crate::models::parking_space::{SpaceResponse, UpdateCapacityRequest};
use crate::models::user::{UpdateUserRequest, UserResponse};
use crate::models::vehicle::{VehicleFilters, VehicleResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(delete_user))
        .route("/users/:id/approve", post(approve_user))
        .route("/users/:id/reject", post(reject_user))
        .route("/users/:id/activate", post(activate_user))
        .route("/users/:id/deactivate", post(deactivate_user))
        .route("/spaces/:category", put(update_capacity))
        .route("/report", get(admin_report))
        .route("/report/export", get(export_csv))
        .route("/handovers", get(list_handovers))
}

async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.clone());
    let response = controller.list().await?;
    Ok(Json(response))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.clone());
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn approve_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.clone());
    let response = controller.approve(id).await?;
    Ok(Json(response))
}

async fn reject_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.clone());
    let response = controller.reject(id).await?;
    Ok(Json(response))
}

async fn activate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.clone());
    let response = controller.activate(id).await?;
    Ok(Json(response))
}

async fn deactivate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.clone());
    let response = controller.deactivate(id).await?;
    Ok(Json(response))
}

async fn update_capacity(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(request): Json<UpdateCapacityRequest>,
) -> Result<Json<ApiResponse<SpaceResponse>>, AppError> {
    let controller = SpaceController::new(state.pool.clone());
    let response = controller.update_capacity(&category, request).await?;
    Ok(Json(response))
}

async fn admin_report(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    let (records, summary) = controller.admin_report(filters).await?;
    Ok(Json(json!({
        "summary": summary,
        "records": records,
    })))
}

async fn export_csv(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> Result<impl IntoResponse, AppError> {
    let controller = ReportController::new(state.pool.clone());
    let csv = controller.export_csv(filters).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"parking_report.csv\"",
            ),
        ],
        csv,
    ))
}

async fn list_handovers(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = ParkingController::new(state.pool.clone());
    let response = controller.list_handovers().await?;
    Ok(Json(response))
}
