//! Schema y datos iniciales
//!
//! Este módulo crea las tablas si no existen y siembra los datos por
//! defecto del parking (capacidades por categoría y el admin inicial).

use anyhow::Result;
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;

/// Capacidades por defecto de cada categoría
const DEFAULT_SPACES: [(&str, i32); 3] = [("motorcycle", 50), ("bajaj", 30), ("car", 20)];

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    is_admin BOOLEAN NOT NULL DEFAULT FALSE,
    is_approved BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_login TIMESTAMPTZ
)
"#;

const CREATE_PARKING_SPACES: &str = r#"
CREATE TABLE IF NOT EXISTS parking_spaces (
    id UUID PRIMARY KEY,
    vehicle_category TEXT NOT NULL UNIQUE,
    total_capacity INTEGER NOT NULL CHECK (total_capacity >= 0),
    occupied_count INTEGER NOT NULL DEFAULT 0,
    last_updated TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_VEHICLES: &str = r#"
CREATE TABLE IF NOT EXISTS vehicles (
    id UUID PRIMARY KEY,
    plate_number TEXT NOT NULL,
    vehicle_category TEXT NOT NULL,
    vehicle_model TEXT,
    vehicle_color TEXT,
    driver_name TEXT NOT NULL,
    driver_id_type TEXT,
    driver_id_number TEXT,
    driver_phone TEXT,
    driver_residence TEXT,
    check_in_time TIMESTAMPTZ NOT NULL,
    check_out_time TIMESTAMPTZ,
    status TEXT NOT NULL DEFAULT 'active',
    owner_user_id UUID NOT NULL REFERENCES users(id),
    handler_user_id UUID REFERENCES users(id),
    handover_time TIMESTAMPTZ,
    handover_notes TEXT
)
"#;

// Unicidad de matrícula limitada a registros activos: una matrícula puede
// repetirse entre visitas ya completadas.
const CREATE_ACTIVE_PLATE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_vehicles_active_plate
ON vehicles (plate_number) WHERE status = 'active'
"#;

const CREATE_CHECK_IN_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_vehicles_check_in_time ON vehicles (check_in_time)
"#;

/// Ejecutar las migraciones del schema
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_USERS).execute(pool).await?;
    sqlx::query(CREATE_PARKING_SPACES).execute(pool).await?;
    sqlx::query(CREATE_VEHICLES).execute(pool).await?;
    sqlx::query(CREATE_ACTIVE_PLATE_INDEX).execute(pool).await?;
    sqlx::query(CREATE_CHECK_IN_INDEX).execute(pool).await?;

    tracing::info!("✅ Schema verificado");
    Ok(())
}

/// Sembrar las capacidades por defecto si la tabla está vacía
pub async fn seed_default_spaces(pool: &PgPool) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parking_spaces")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        return Ok(());
    }

    for (category, total) in DEFAULT_SPACES {
        sqlx::query(
            r#"
            INSERT INTO parking_spaces (id, vehicle_category, total_capacity, occupied_count, last_updated)
            VALUES ($1, $2, $3, 0, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category)
        .bind(total)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    tracing::info!("✅ Espacios por defecto creados: {:?}", DEFAULT_SPACES);
    Ok(())
}

/// Crear el admin inicial si no existe ningún usuario
pub async fn seed_admin_user(pool: &PgPool, config: &EnvironmentConfig) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        return Ok(());
    }

    let Some(password) = &config.admin_password else {
        tracing::warn!("⚠️ No hay usuarios y ADMIN_PASSWORD no está definida; no se creó admin");
        return Ok(());
    };

    let password_hash = hash(password, DEFAULT_COST)?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_admin, is_approved, is_active, created_at)
        VALUES ($1, $2, $3, $4, TRUE, TRUE, TRUE, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&config.admin_username)
    .bind(&config.admin_email)
    .bind(&password_hash)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    tracing::info!("✅ Admin inicial creado: {}", config.admin_username);
    Ok(())
}
