//! Controller del ciclo de vida de vehículos
//!
//! Check-in, check-out y handover. Las mutaciones del contador de ocupación
//! y del registro del vehículo se emiten siempre dentro de una misma
//! transacción, con el incremento guardado por la condición
//! `occupied_count < total_capacity` en el propio UPDATE.

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::vehicle::{
    CheckInRequest, CheckOutRequest, HandoverRequest, Vehicle, VehicleResponse,
};
use crate::repositories::space_repository::SpaceRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation;

pub struct ParkingController {
    pool: PgPool,
    vehicles: VehicleRepository,
    users: UserRepository,
}

impl ParkingController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            vehicles: VehicleRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Registrar la entrada de un vehículo
    pub async fn check_in(
        &self,
        user: &AuthenticatedUser,
        request: CheckInRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        use validator::Validate;
        request.validate()?;

        validation::validate_category(&request.vehicle_category)
            .map_err(|e| validation_error("vehicle_category", e))?;
        validation::validate_plate_number(&request.plate_number)
            .map_err(|e| validation_error("plate_number", e))?;
        if let Some(phone) = &request.driver_phone {
            validation::validate_phone(phone).map_err(|e| validation_error("driver_phone", e))?;
        }

        let plate = validation::normalize_plate_number(&request.plate_number);

        let mut tx = self.pool.begin().await?;

        // Rechazar matrículas con un registro todavía activo
        if VehicleRepository::active_plate_exists(&mut *tx, &plate).await? {
            return Err(AppError::Conflict(
                "El vehículo ya está dentro del parking".to_string(),
            ));
        }

        // Incremento guardado: 0 filas = categoría desconocida o sin plazas.
        // La consulta que distingue ambos casos va por la misma conexión de
        // la transacción para no pedir una segunda conexión al pool.
        if !SpaceRepository::try_increment_occupied(&mut *tx, &request.vehicle_category).await? {
            return if SpaceRepository::category_exists(&mut *tx, &request.vehicle_category).await? {
                Err(AppError::Conflict(
                    "No hay espacios disponibles para esta categoría".to_string(),
                ))
            } else {
                Err(AppError::NotFound(format!(
                    "Categoría '{}' no encontrada",
                    request.vehicle_category
                )))
            };
        }

        let vehicle = match VehicleRepository::create(&mut *tx, &plate, &request, user.user_id).await
        {
            Ok(vehicle) => vehicle,
            // El índice único parcial respalda la verificación de matrícula
            // ante dos check-ins simultáneos de la misma placa
            Err(AppError::Database(e)) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "El vehículo ya está dentro del parking".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        tx.commit().await?;

        tracing::info!(
            "🚗 Check-in: {} ({}) por {}",
            vehicle.plate_number,
            vehicle.vehicle_category,
            user.username
        );

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo registrado exitosamente".to_string(),
        ))
    }

    /// Registrar la salida de un vehículo
    pub async fn check_out(
        &self,
        user: &AuthenticatedUser,
        request: CheckOutRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        use validator::Validate;
        request.validate()?;

        let plate = validation::normalize_plate_number(&request.plate_number);

        let mut tx = self.pool.begin().await?;

        let vehicle =
            VehicleRepository::complete_active(&mut *tx, &plate, user.user_id, user.is_admin)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("Vehículo no encontrado o ya retirado".to_string())
                })?;

        SpaceRepository::decrement_occupied(&mut *tx, &vehicle.vehicle_category).await?;

        tx.commit().await?;

        tracing::info!(
            "🏁 Check-out: {} ({}) por {}",
            vehicle.plate_number,
            vehicle.vehicle_category,
            user.username
        );

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo retirado exitosamente".to_string(),
        ))
    }

    /// Entregar la custodia de un registro activo a otro usuario.
    ///
    /// No toca contadores ni estado; solo los campos handler_*.
    pub async fn handover(
        &self,
        user: &AuthenticatedUser,
        request: HandoverRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        use validator::Validate;
        request.validate()?;

        let handler = self
            .users
            .find_by_username(&request.new_handler_username)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Usuario '{}' no encontrado",
                    request.new_handler_username
                ))
            })?;

        if !handler.is_approved || !handler.is_active {
            return Err(AppError::Conflict(
                "El usuario destino no está aprobado o está inactivo".to_string(),
            ));
        }

        if handler.id == user.user_id {
            return Err(AppError::BadRequest(
                "No puedes entregarte un vehículo a ti mismo".to_string(),
            ));
        }

        let vehicle = self
            .vehicles
            .assign_handover(
                request.vehicle_id,
                user.user_id,
                handler.id,
                request.notes.as_deref(),
            )
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Registro activo no encontrado o no te pertenece".to_string(),
                )
            })?;

        tracing::info!(
            "🤝 Handover: {} de {} a {}",
            vehicle.plate_number,
            user.username,
            handler.username
        );

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            format!("Vehículo entregado a {}", handler.username),
        ))
    }

    /// Cancelar un handover vigente; solo el propietario original puede
    pub async fn cancel_handover(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let vehicle = self
            .vehicles
            .cancel_handover(vehicle_id, user.user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "No hay handover vigente sobre ese registro o no te pertenece".to_string(),
                )
            })?;

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Handover cancelado".to_string(),
        ))
    }

    /// Listado de handovers vigentes (gestión de admin)
    pub async fn list_handovers(&self) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.vehicles.list_active_handovers().await?;
        Ok(vehicles.into_iter().map(Vehicle::into).collect())
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error.as_database_error().map(|e| e.kind()),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::space_controller::SpaceController;
    use crate::models::parking_space::UpdateCapacityRequest;
    use sqlx::postgres::PgPoolOptions;

    // Pruebas del ciclo de vida contra una base real; se omiten si
    // DATABASE_URL no está definida
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .ok()?;
        crate::database::schema::run_migrations(&pool).await.ok()?;
        for (category, total) in [("motorcycle", 50), ("bajaj", 30), ("car", 20)] {
            ensure_category(&pool, category, total).await;
        }
        Some(pool)
    }

    async fn ensure_category(pool: &PgPool, category: &str, total: i32) {
        sqlx::query(
            r#"
            INSERT INTO parking_spaces (id, vehicle_category, total_capacity, occupied_count, last_updated)
            VALUES ($1, $2, $3, 0, $4)
            ON CONFLICT (vehicle_category) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category)
        .bind(total)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    async fn operator(pool: &PgPool) -> AuthenticatedUser {
        let suffix = Uuid::new_v4().simple().to_string();
        let user = UserRepository::new(pool.clone())
            .create(
                &format!("op{}", &suffix[..10]),
                &format!("op{}@test.local", &suffix[..10]),
                "hash-irrelevante",
                false,
                true,
            )
            .await
            .unwrap();

        AuthenticatedUser {
            user_id: user.id,
            username: user.username,
            is_admin: false,
        }
    }

    fn plate() -> String {
        let id = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("T{}", &id[..8])
    }

    fn check_in_request(plate: &str, category: &str) -> CheckInRequest {
        CheckInRequest {
            vehicle_category: category.to_string(),
            plate_number: plate.to_string(),
            vehicle_model: None,
            vehicle_color: None,
            driver_name: "Juma Hassan".to_string(),
            driver_id_type: None,
            driver_id_number: None,
            driver_phone: None,
            driver_residence: None,
        }
    }

    async fn occupied(pool: &PgPool, category: &str) -> i32 {
        sqlx::query_scalar(
            "SELECT occupied_count FROM parking_spaces WHERE vehicle_category = $1",
        )
        .bind(category)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_restores_counter_and_completes_record() {
        let Some(pool) = test_pool().await else { return };
        let controller = ParkingController::new(pool.clone());
        let user = operator(&pool).await;
        let plate = plate();
        let before = occupied(&pool, "car").await;

        let checked_in = controller
            .check_in(&user, check_in_request(&plate, "car"))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(checked_in.status, "active");
        assert_eq!(occupied(&pool, "car").await, before + 1);

        // Segundo check-in con la misma placa: rechazo sin mutación
        let duplicate = controller
            .check_in(&user, check_in_request(&plate, "car"))
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        assert_eq!(occupied(&pool, "car").await, before + 1);

        let checked_out = controller
            .check_out(
                &user,
                CheckOutRequest {
                    plate_number: plate.clone(),
                },
            )
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(checked_out.id, checked_in.id);
        assert_eq!(checked_out.status, "completed");
        assert!(checked_out.check_out_time.unwrap() >= checked_out.check_in_time);
        assert_eq!(occupied(&pool, "car").await, before);

        // Ya retirado: un segundo check-out falla sin tocar el contador
        let again = controller
            .check_out(
                &user,
                CheckOutRequest {
                    plate_number: plate,
                },
            )
            .await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
        assert_eq!(occupied(&pool, "car").await, before);
    }

    #[tokio::test]
    async fn test_check_in_rejected_when_category_full() {
        let Some(pool) = test_pool().await else { return };
        let controller = ParkingController::new(pool.clone());
        let spaces = SpaceController::new(pool.clone());
        let user = operator(&pool).await;

        let (total_before, occupied_before): (i32, i32) = sqlx::query_as(
            "SELECT total_capacity, occupied_count FROM parking_spaces WHERE vehicle_category = 'bajaj'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        // Dejar la categoría sin plazas libres
        spaces
            .update_capacity(
                "bajaj",
                UpdateCapacityRequest {
                    total_capacity: occupied_before,
                },
            )
            .await
            .unwrap();

        let plate = plate();
        let rejected = controller
            .check_in(&user, check_in_request(&plate, "bajaj"))
            .await;
        assert!(matches!(rejected, Err(AppError::Conflict(_))));
        assert_eq!(occupied(&pool, "bajaj").await, occupied_before);

        // Sin fila de vehículo: rechazo con cero mutaciones
        let rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vehicles WHERE plate_number = $1")
                .bind(&plate)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(rows, 0);

        spaces
            .update_capacity(
                "bajaj",
                UpdateCapacityRequest {
                    total_capacity: total_before,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_check_out_unknown_plate_mutates_nothing() {
        let Some(pool) = test_pool().await else { return };
        let controller = ParkingController::new(pool.clone());
        let user = operator(&pool).await;

        let before = occupied(&pool, "motorcycle").await;
        let result = controller
            .check_out(
                &user,
                CheckOutRequest {
                    plate_number: plate(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(occupied(&pool, "motorcycle").await, before);
    }
}
