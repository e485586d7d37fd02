//! Repositorio del libro mayor de capacidad (parking_spaces)

use chrono::Utc;
use sqlx::{PgConnection, PgPool};

use crate::models::parking_space::ParkingSpace;
use crate::utils::errors::AppError;

pub struct SpaceRepository {
    pool: PgPool,
}

impl SpaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<ParkingSpace>, AppError> {
        let spaces = sqlx::query_as::<_, ParkingSpace>(
            "SELECT * FROM parking_spaces ORDER BY vehicle_category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(spaces)
    }

    /// Verificar si existe la categoría, sobre la conexión de la transacción
    /// (distingue "sin plazas" de "categoría desconocida" en el check-in)
    pub async fn category_exists(
        conn: &mut PgConnection,
        category: &str,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM parking_spaces WHERE vehicle_category = $1)",
        )
        .bind(category)
        .fetch_one(conn)
        .await?;

        Ok(result.0)
    }

    /// Leer y bloquear la fila de una categoría dentro de una transacción
    pub async fn lock_by_category(
        conn: &mut PgConnection,
        category: &str,
    ) -> Result<Option<ParkingSpace>, AppError> {
        let space = sqlx::query_as::<_, ParkingSpace>(
            "SELECT * FROM parking_spaces WHERE vehicle_category = $1 FOR UPDATE",
        )
        .bind(category)
        .fetch_optional(conn)
        .await?;

        Ok(space)
    }

    /// Escribir la capacidad total de una categoría ya bloqueada
    pub async fn set_total_capacity(
        conn: &mut PgConnection,
        category: &str,
        total_capacity: i32,
    ) -> Result<ParkingSpace, AppError> {
        let space = sqlx::query_as::<_, ParkingSpace>(
            r#"
            UPDATE parking_spaces
            SET total_capacity = $2, last_updated = $3
            WHERE vehicle_category = $1
            RETURNING *
            "#,
        )
        .bind(category)
        .bind(total_capacity)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(space)
    }

    /// Incremento guardado del contador de ocupación, dentro de una transacción.
    ///
    /// Devuelve `false` cuando la categoría no existe o está llena; en ese
    /// caso no se muta nada. La guarda `occupied_count < total_capacity`
    /// elimina la carrera check-then-act del contador.
    pub async fn try_increment_occupied(
        conn: &mut PgConnection,
        category: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE parking_spaces
            SET occupied_count = occupied_count + 1, last_updated = $2
            WHERE vehicle_category = $1 AND occupied_count < total_capacity
            "#,
        )
        .bind(category)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Decremento del contador, acotado en 0, dentro de una transacción
    pub async fn decrement_occupied(
        conn: &mut PgConnection,
        category: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE parking_spaces
            SET occupied_count = GREATEST(occupied_count - 1, 0), last_updated = $2
            WHERE vehicle_category = $1
            "#,
        )
        .bind(category)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    // Estas pruebas necesitan una base real; se omiten si DATABASE_URL
    // no está definida
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
    async fn test_increment_rejected_when_full_without_mutation() {
        let Some(pool) = test_pool().await else { return };
        let category = insert_category(&pool, 1, 1).await;

        let mut tx = pool.begin().await.unwrap();
        assert!(!SpaceRepository::try_increment_occupied(&mut *tx, &category)
            .await
            .unwrap());
        assert!(
            !SpaceRepository::try_increment_occupied(&mut *tx, "no-such-category")
                .await
                .unwrap()
        );
        tx.commit().await.unwrap();

        let (total, occupied): (i32, i32) = sqlx::query_as(
            "SELECT total_capacity, occupied_count FROM parking_spaces WHERE vehicle_category = $1",
        )
        .bind(&category)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!((total, occupied), (1, 1));
    }

    #[tokio::test]
    async fn test_increment_and_decrement_round_trip() {
        let Some(pool) = test_pool().await else { return };
        let category = insert_category(&pool, 2, 0).await;

        let mut tx = pool.begin().await.unwrap();
        assert!(SpaceRepository::try_increment_occupied(&mut *tx, &category)
            .await
            .unwrap());
        SpaceRepository::decrement_occupied(&mut *tx, &category)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let occupied: i32 = sqlx::query_scalar(
            "SELECT occupied_count FROM parking_spaces WHERE vehicle_category = $1",
        )
        .bind(&category)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(occupied, 0);
    }
}
