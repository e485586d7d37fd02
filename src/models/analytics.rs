//! Modelos de Analytics
//!
//! Este módulo contiene los modelos de la proyección de lectura:
//! conteos por categoría, histogramas de check-in y duración media
//! de estancia. Todo se recalcula por request, sin capa de cache.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Conteo de vehículos activos por categoría
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub vehicle_category: String,
    pub count: i64,
}

/// Bucket horario del histograma de check-ins (hora local EAT)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyBucket {
    /// Inicio del bucket, truncado a la hora, en hora local
    pub hour: DateTime<chrono::FixedOffset>,
    pub count: i64,
}

/// Bucket diario del histograma de check-ins (fecha local EAT)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub count: i64,
}

/// Filtros de ventana para analytics
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsFilters {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Response agregada para la página de analytics
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub active_by_category: Vec<CategoryCount>,
    pub hourly_check_ins: Vec<HourlyBucket>,
    pub daily_check_ins: Vec<DailyBucket>,
    /// Duración media de estancia en segundos sobre registros completados
    pub average_stay_seconds: Option<f64>,
    pub window_from: DateTime<Utc>,
    pub window_to: DateTime<Utc>,
}

/// Bloque de resumen para el report API de admin
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub total_records: i64,
    pub active_records: i64,
    pub completed_records: i64,
    pub active_by_category: Vec<CategoryCount>,
}
