//! Controller del libro mayor de capacidad

use sqlx::PgPool;

use crate::dto::ApiResponse;
use crate::models::parking_space::{ParkingSpace, SpaceResponse, UpdateCapacityRequest};
use crate::repositories::space_repository::SpaceRepository;
use crate::utils::errors::AppError;

pub struct SpaceController {
    pool: PgPool,
    repository: SpaceRepository,
}

impl SpaceController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: SpaceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Ocupación actual de todas las categorías
    pub async fn occupancy(&self) -> Result<Vec<SpaceResponse>, AppError> {
        let spaces = self.repository.find_all().await?;
        Ok(spaces.into_iter().map(ParkingSpace::into).collect())
    }

    /// Ajustar la capacidad total de una categoría (admin).
    ///
    /// Se rechaza una capacidad por debajo de la ocupación actual. La fila
    /// se bloquea durante la transacción, así el mensaje de rechazo refleja
    /// la ocupación exacta contra la que se evaluó la guarda.
    pub async fn update_capacity(
        &self,
        category: &str,
        request: UpdateCapacityRequest,
    ) -> Result<ApiResponse<SpaceResponse>, AppError> {
        use validator::Validate;
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let space = SpaceRepository::lock_by_category(&mut *tx, category)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Categoría '{}' no encontrada", category))
            })?;

        if request.total_capacity < space.occupied_count {
            return Err(AppError::Conflict(format!(
                "La nueva capacidad ({}) es menor que la ocupación actual ({})",
                request.total_capacity, space.occupied_count
            )));
        }

        let updated =
            SpaceRepository::set_total_capacity(&mut *tx, category, request.total_capacity)
                .await?;

        tx.commit().await?;

        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Capacidad actualizada".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    // Necesita una base real; se omite si DATABASE_URL no está definida
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .ok()?;
        crate::database::schema::run_migrations(&pool).await.ok()?;
        Some(pool)
    }

    async fn insert_category(pool: &PgPool, total: i32, occupied: i32) -> String {
        let category = format!("test-{}", Uuid::new_v4().simple());
        sqlx::query(
            r#"
            INSERT INTO parking_spaces (id, vehicle_category, total_capacity, occupied_count, last_updated)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&category)
        .bind(total)
        .bind(occupied)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();

        category
    }

    #[tokio::test]
    async fn test_update_capacity_rejects_below_occupancy_with_exact_count() {
        let Some(pool) = test_pool().await else { return };
        let category = insert_category(&pool, 5, 3).await;
        let controller = SpaceController::new(pool.clone());

        let error = controller
            .update_capacity(&category, UpdateCapacityRequest { total_capacity: 2 })
            .await
            .expect_err("se esperaba un rechazo");

        match error {
            AppError::Conflict(message) => {
                assert!(message.contains("(2)"));
                assert!(message.contains("(3)"));
            }
            other => panic!("se esperaba Conflict, fue {:?}", other),
        }

        // Sin cambios tras el rechazo
        let total: i32 = sqlx::query_scalar(
            "SELECT total_capacity FROM parking_spaces WHERE vehicle_category = $1",
        )
        .bind(&category)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_update_capacity_accepts_at_or_above_occupancy() {
        let Some(pool) = test_pool().await else { return };
        let category = insert_category(&pool, 5, 3).await;
        let controller = SpaceController::new(pool.clone());

        let response = controller
            .update_capacity(&category, UpdateCapacityRequest { total_capacity: 3 })
            .await
            .unwrap();

        let space = response.data.unwrap();
        assert_eq!(space.total_capacity, 3);
        assert_eq!(space.available, 0);
    }

    #[tokio::test]
    async fn test_update_capacity_unknown_category() {
        let Some(pool) = test_pool().await else { return };
        let controller = SpaceController::new(pool.clone());

        let result = controller
            .update_capacity(
                "no-such-category",
                UpdateCapacityRequest { total_capacity: 10 },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
