//! Modelo de ParkingSpace
//!
//! Este módulo contiene el registro de capacidad por categoría de vehículo
//! (el "libro mayor" de ocupación) y sus DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use uuid::Uuid;

/// ParkingSpace - mapea exactamente a la tabla parking_spaces
///
/// Una fila por categoría. `occupied_count` se mantiene siempre en la misma
/// transacción que el alta/baja del vehículo correspondiente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParkingSpace {
    pub id: Uuid,
    pub vehicle_category: String,
    pub total_capacity: i32,
    pub occupied_count: i32,
    pub last_updated: DateTime<Utc>,
}

impl ParkingSpace {
    /// Plazas libres de la categoría
    pub fn available(&self) -> i32 {
        self.total_capacity - self.occupied_count
    }
}

/// Request para ajustar la capacidad total de una categoría (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCapacityRequest {
    #[validate(range(min = 0))]
    pub total_capacity: i32,
}

/// Response de una categoría para el dashboard
#[derive(Debug, Clone, Serialize)]
pub struct SpaceResponse {
    pub vehicle_category: String,
    pub total_capacity: i32,
    pub occupied_count: i32,
    pub available: i32,
    pub last_updated: DateTime<Utc>,
}

impl From<ParkingSpace> for SpaceResponse {
    fn from(space: ParkingSpace) -> Self {
        let available = space.available();
        Self {
            vehicle_category: space.vehicle_category,
            total_capacity: space.total_capacity,
            occupied_count: space.occupied_count,
            available,
            last_updated: space.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(total: i32, occupied: i32) -> ParkingSpace {
        ParkingSpace {
            id: Uuid::new_v4(),
            vehicle_category: "car".to_string(),
            total_capacity: total,
            occupied_count: occupied,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_available() {
        assert_eq!(space(20, 0).available(), 20);
        assert_eq!(space(20, 7).available(), 13);
        assert_eq!(space(20, 20).available(), 0);
    }

    #[test]
    fn test_space_response_includes_available() {
        let response: SpaceResponse = space(30, 12).into();
        assert_eq!(response.available, 18);
        assert_eq!(response.total_capacity, 30);
        assert_eq!(response.occupied_count, 12);
    }
}
