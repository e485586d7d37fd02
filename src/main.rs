mod config;
mod controllers;
mod database;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use anyhow::Result;
use axum::{middleware as axum_middleware, response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use config::environment::EnvironmentConfig;
use middleware::auth::{admin_only_middleware, auth_middleware};
use middleware::cors::cors_middleware_with_origins;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🅿️ ChinoPark - Vehicle Parking Tracker API");
    info!("==========================================");

    let env_config = EnvironmentConfig::from_env();

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Schema y datos iniciales
    database::schema::run_migrations(&pool).await?;
    database::schema::seed_default_spaces(&pool).await?;
    database::schema::seed_admin_user(&pool, &env_config).await?;

    let app_state = AppState::new(pool, env_config.clone());

    // Rutas públicas
    let public_routes = Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api", routes::space_routes::create_dashboard_router())
        .nest("/api/auth", routes::auth_routes::create_auth_router());

    // Rutas autenticadas
    let protected_routes = Router::new()
        .nest("/api/auth", routes::auth_routes::create_session_router())
        .nest("/api/parking", routes::parking_routes::create_parking_router())
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Rutas de admin: autenticación + verificación de rol
    let admin_routes = Router::new()
        .nest("/api/admin", routes::admin_routes::create_admin_router())
        .layer(axum_middleware::from_fn(admin_only_middleware))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(cors_middleware_with_origins(env_config.cors_origins.clone()))
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", env_config.host, env_config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   GET  /api/dashboard - Ocupación por categoría");
    info!("🔐 Endpoints de autenticación:");
    info!("   POST /api/auth/register - Registrar cuenta");
    info!("   POST /api/auth/login - Login");
    info!("   GET  /api/auth/me - Cuenta actual");
    info!("🚗 Endpoints de parking:");
    info!("   POST /api/parking/check-in - Entrada de vehículo");
    info!("   POST /api/parking/check-out - Salida de vehículo");
    info!("   GET  /api/parking/report - Registros propios");
    info!("   GET  /api/parking/analytics - Agregados para gráficas");
    info!("   POST /api/parking/handover - Entregar custodia");
    info!("   POST /api/parking/handover/:id/cancel - Cancelar handover");
    info!("🛠 Endpoints de admin:");
    info!("   GET  /api/admin/users - Listar usuarios");
    info!("   POST /api/admin/users/:id/approve|reject|activate|deactivate");
    info!("   PUT  /api/admin/users/:id - Editar usuario");
    info!("   DELETE /api/admin/users/:id - Eliminar usuario");
    info!("   PUT  /api/admin/spaces/:category - Ajustar capacidad");
    info!("   GET  /api/admin/report - Report global con resumen");
    info!("   GET  /api/admin/report/export - Export CSV");
    info!("   GET  /api/admin/handovers - Handovers vigentes");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "service": "chinopark-api",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
