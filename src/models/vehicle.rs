//! Modelo de Vehicle
//!
//! Este módulo contiene el registro de ciclo de vida de un vehículo
//! (una fila por evento de parking) y sus DTOs de check-in/check-out/handover.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Estado del vehículo dentro del parking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Completed,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Completed => "completed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(VehicleStatus::Active),
            "completed" => Some(VehicleStatus::Completed),
            _ => None,
        }
    }
}

/// Vehicle - mapea exactamente a la tabla vehicles
///
/// Se crea en el check-in, se muta una vez en el check-out y nunca se borra
/// en el flujo normal. Los campos handler_* solo se usan durante un handover.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub vehicle_category: String,
    pub vehicle_model: Option<String>,
    pub vehicle_color: Option<String>,
    pub driver_name: String,
    pub driver_id_type: Option<String>,
    pub driver_id_number: Option<String>,
    pub driver_phone: Option<String>,
    pub driver_residence: Option<String>,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: String,
    pub owner_user_id: Uuid,
    pub handler_user_id: Option<Uuid>,
    pub handover_time: Option<DateTime<Utc>>,
    pub handover_notes: Option<String>,
}

/// Request de check-in
#[derive(Debug, Deserialize, Validate)]
pub struct CheckInRequest {
    #[validate(length(min = 1, max = 20))]
    pub vehicle_category: String,

    #[validate(length(min = 2, max = 15))]
    pub plate_number: String,

    #[validate(length(max = 100))]
    pub vehicle_model: Option<String>,

    #[validate(length(max = 50))]
    pub vehicle_color: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub driver_name: String,

    #[validate(length(max = 50))]
    pub driver_id_type: Option<String>,

    #[validate(length(max = 50))]
    pub driver_id_number: Option<String>,

    pub driver_phone: Option<String>,

    #[validate(length(max = 200))]
    pub driver_residence: Option<String>,
}

/// Request de check-out
#[derive(Debug, Deserialize, Validate)]
pub struct CheckOutRequest {
    #[validate(length(min = 2, max = 15))]
    pub plate_number: String,
}

/// Request de handover de un vehículo activo a otro usuario
#[derive(Debug, Deserialize, Validate)]
pub struct HandoverRequest {
    pub vehicle_id: Uuid,

    #[validate(length(min = 3, max = 50))]
    pub new_handler_username: String,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Filtros para el listado de vehículos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<String>,
    pub vehicle_category: Option<String>,
    pub plate_number: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response de un registro de vehículo para la API
#[derive(Debug, Clone, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub plate_number: String,
    pub vehicle_category: String,
    pub vehicle_model: Option<String>,
    pub vehicle_color: Option<String>,
    pub driver_name: String,
    pub driver_id_type: Option<String>,
    pub driver_id_number: Option<String>,
    pub driver_phone: Option<String>,
    pub driver_residence: Option<String>,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: String,
    pub owner_user_id: Uuid,
    pub handler_user_id: Option<Uuid>,
    pub handover_time: Option<DateTime<Utc>>,
    pub handover_notes: Option<String>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            plate_number: vehicle.plate_number,
            vehicle_category: vehicle.vehicle_category,
            vehicle_model: vehicle.vehicle_model,
            vehicle_color: vehicle.vehicle_color,
            driver_name: vehicle.driver_name,
            driver_id_type: vehicle.driver_id_type,
            driver_id_number: vehicle.driver_id_number,
            driver_phone: vehicle.driver_phone,
            driver_residence: vehicle.driver_residence,
            check_in_time: vehicle.check_in_time,
            check_out_time: vehicle.check_out_time,
            status: vehicle.status,
            owner_user_id: vehicle.owner_user_id,
            handler_user_id: vehicle.handler_user_id,
            handover_time: vehicle.handover_time,
            handover_notes: vehicle.handover_notes,
        }
    }
}
