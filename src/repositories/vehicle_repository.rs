//! Repositorio de registros de vehículos (vehicles)
//!
//! Las operaciones del ciclo de vida (alta, check-out) reciben la conexión
//! de una transacción abierta por el controller; las lecturas van directas
//! al pool.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::models::analytics::CategoryCount;
use crate::models::vehicle::{CheckInRequest, Vehicle, VehicleFilters};
use crate::utils::errors::AppError;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verificar si una matrícula ya tiene un registro activo
    pub async fn active_plate_exists(
        conn: &mut PgConnection,
        plate_number: &str,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate_number = $1 AND status = 'active')",
        )
        .bind(plate_number)
        .fetch_one(conn)
        .await?;

        Ok(result.0)
    }

    /// Crear el registro de un check-in (status=active)
    pub async fn create(
        conn: &mut PgConnection,
        plate_number: &str,
        request: &CheckInRequest,
        owner_user_id: Uuid,
    ) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, plate_number, vehicle_category, vehicle_model, vehicle_color,
                driver_name, driver_id_type, driver_id_number, driver_phone,
                driver_residence, check_in_time, status, owner_user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'active', $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(plate_number)
        .bind(&request.vehicle_category)
        .bind(&request.vehicle_model)
        .bind(&request.vehicle_color)
        .bind(&request.driver_name)
        .bind(&request.driver_id_type)
        .bind(&request.driver_id_number)
        .bind(&request.driver_phone)
        .bind(&request.driver_residence)
        .bind(Utc::now())
        .bind(owner_user_id)
        .fetch_one(conn)
        .await?;

        Ok(vehicle)
    }

    /// Cerrar el registro activo de una matrícula.
    ///
    /// Si `requester` no es admin, solo cierra registros que posee o que le
    /// fueron entregados en handover. Devuelve None cuando no hay registro
    /// activo que cumpla las condiciones.
    pub async fn complete_active(
        conn: &mut PgConnection,
        plate_number: &str,
        requester_id: Uuid,
        is_admin: bool,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET status = 'completed',
                check_out_time = $2,
                handler_user_id = NULL,
                handover_time = NULL,
                handover_notes = NULL
            WHERE plate_number = $1
              AND status = 'active'
              AND ($4 OR owner_user_id = $3 OR handler_user_id = $3)
            RETURNING *
            "#,
        )
        .bind(plate_number)
        .bind(Utc::now())
        .bind(requester_id)
        .bind(is_admin)
        .fetch_optional(conn)
        .await?;

        Ok(vehicle)
    }

    /// Listar registros con filtros; `scope_user` restringe a registros
    /// poseídos o recibidos en handover por ese usuario
    pub async fn list(
        &self,
        filters: &VehicleFilters,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
        scope_user: Option<Uuid>,
    ) -> Result<Vec<Vehicle>, AppError> {
        let mut query = QueryBuilder::new("SELECT * FROM vehicles WHERE 1 = 1");

        if let Some(status) = &filters.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = &filters.vehicle_category {
            query.push(" AND vehicle_category = ").push_bind(category.as_str());
        }
        if let Some(plate) = &filters.plate_number {
            query.push(" AND plate_number = ").push_bind(plate.as_str());
        }
        if let Some(from) = date_from {
            query.push(" AND check_in_time >= ").push_bind(from);
        }
        if let Some(to) = date_to {
            query.push(" AND check_in_time < ").push_bind(to);
        }
        if let Some(user_id) = scope_user {
            query
                .push(" AND (owner_user_id = ")
                .push_bind(user_id)
                .push(" OR handler_user_id = ")
                .push_bind(user_id)
                .push(")");
        }

        query.push(" ORDER BY check_in_time DESC");
        query.push(" LIMIT ").push_bind(filters.limit.unwrap_or(500).clamp(1, 1000));
        query.push(" OFFSET ").push_bind(filters.offset.unwrap_or(0).max(0));

        let vehicles = query
            .build_query_as::<Vehicle>()
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    /// Verificar si un usuario posee o maneja algún registro
    pub async fn user_has_records(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE owner_user_id = $1 OR handler_user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Conteo de vehículos activos agrupado por categoría
    pub async fn active_counts_by_category(&self) -> Result<Vec<CategoryCount>, AppError> {
        let counts = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT vehicle_category, COUNT(*) AS count
            FROM vehicles
            WHERE status = 'active'
            GROUP BY vehicle_category
            ORDER BY vehicle_category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Timestamps de check-in dentro de una ventana, para los histogramas
    pub async fn check_in_times(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, AppError> {
        let times: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT check_in_time FROM vehicles
            WHERE check_in_time >= $1 AND check_in_time < $2
            ORDER BY check_in_time
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(times.into_iter().map(|(t,)| t).collect())
    }

    /// Duración media de estancia (segundos) sobre registros completados
    /// cuyo check-out cae dentro de la ventana
    pub async fn average_stay_seconds(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<f64>, AppError> {
        let average: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(EXTRACT(EPOCH FROM (check_out_time - check_in_time)))::double precision
            FROM vehicles
            WHERE status = 'completed'
              AND check_out_time >= $1 AND check_out_time < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }

    /// Conteos globales para el resumen del report de admin
    pub async fn summary_counts(&self) -> Result<(i64, i64, i64), AppError> {
        let counts: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'active'),
                COUNT(*) FILTER (WHERE status = 'completed')
            FROM vehicles
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Asignar un handover sobre un registro activo que posee `owner_id`
    pub async fn assign_handover(
        &self,
        vehicle_id: Uuid,
        owner_id: Uuid,
        handler_id: Uuid,
        notes: Option<&str>,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET handler_user_id = $3, handover_time = $4, handover_notes = $5
            WHERE id = $1 AND status = 'active' AND owner_user_id = $2
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(owner_id)
        .bind(handler_id)
        .bind(Utc::now())
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    /// Cancelar un handover, revirtiendo los campos de handler
    pub async fn cancel_handover(
        &self,
        vehicle_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET handler_user_id = NULL, handover_time = NULL, handover_notes = NULL
            WHERE id = $1
              AND status = 'active'
              AND owner_user_id = $2
              AND handler_user_id IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    /// Registros activos con un handover vigente (gestión de admin)
    pub async fn list_active_handovers(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE status = 'active' AND handler_user_id IS NOT NULL
            ORDER BY handover_time DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }
}
