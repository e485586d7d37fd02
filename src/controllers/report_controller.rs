//! Controller de reporting y analytics
//!
//! Proyección de solo lectura sobre los registros de vehículos: listados
//! filtrados (con scope por usuario), agregados para gráficas, resumen de
//! admin y export CSV. Todo se recalcula por request.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::analytics::{AnalyticsFilters, AnalyticsResponse, ReportSummary};
use crate::models::vehicle::{Vehicle, VehicleFilters, VehicleResponse, VehicleStatus};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::report_service;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation;

pub struct ReportController {
    vehicles: VehicleRepository,
}

impl ReportController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            vehicles: VehicleRepository::new(pool),
        }
    }

    /// Listado de registros; los no-admin solo ven los suyos
    /// (propios o recibidos en handover)
    pub async fn report(
        &self,
        user: &AuthenticatedUser,
        mut filters: VehicleFilters,
    ) -> Result<Vec<VehicleResponse>, AppError> {
        normalize_status_filter(&mut filters)?;
        let (from, to) = parse_window(&filters.date_from, &filters.date_to)?;
        let scope = if user.is_admin { None } else { Some(user.user_id) };

        let vehicles = self.vehicles.list(&filters, from, to, scope).await?;
        Ok(vehicles.into_iter().map(Vehicle::into).collect())
    }

    /// Agregados para la página de analytics
    pub async fn analytics(
        &self,
        filters: AnalyticsFilters,
    ) -> Result<AnalyticsResponse, AppError> {
        let (from, to) = parse_window(&filters.date_from, &filters.date_to)?;
        // Ventana por defecto: los últimos 7 días
        let to = to.unwrap_or_else(Utc::now);
        let from = from.unwrap_or_else(|| to - Duration::days(7));

        let active_by_category = self.vehicles.active_counts_by_category().await?;
        let check_ins = self.vehicles.check_in_times(from, to).await?;
        let average_stay_seconds = self.vehicles.average_stay_seconds(from, to).await?;

        Ok(AnalyticsResponse {
            active_by_category,
            hourly_check_ins: report_service::hourly_histogram(&check_ins),
            daily_check_ins: report_service::daily_histogram(&check_ins),
            average_stay_seconds,
            window_from: from,
            window_to: to,
        })
    }

    /// Report API de admin: listado sin scope más bloque de resumen
    pub async fn admin_report(
        &self,
        mut filters: VehicleFilters,
    ) -> Result<(Vec<VehicleResponse>, ReportSummary), AppError> {
        normalize_status_filter(&mut filters)?;
        let (from, to) = parse_window(&filters.date_from, &filters.date_to)?;

        let vehicles = self.vehicles.list(&filters, from, to, None).await?;
        let (total_records, active_records, completed_records) =
            self.vehicles.summary_counts().await?;
        let active_by_category = self.vehicles.active_counts_by_category().await?;

        let summary = ReportSummary {
            total_records,
            active_records,
            completed_records,
            active_by_category,
        };

        Ok((vehicles.into_iter().map(Vehicle::into).collect(), summary))
    }

    /// Export CSV del listado filtrado (admin)
    pub async fn export_csv(&self, mut filters: VehicleFilters) -> Result<String, AppError> {
        normalize_status_filter(&mut filters)?;
        let (from, to) = parse_window(&filters.date_from, &filters.date_to)?;
        let vehicles = self.vehicles.list(&filters, from, to, None).await?;

        Ok(report_service::vehicles_to_csv(&vehicles))
    }
}

/// Validar y normalizar el filtro de estado (acepta mayúsculas)
fn normalize_status_filter(filters: &mut VehicleFilters) -> Result<(), AppError> {
    if let Some(status) = &filters.status {
        let parsed = VehicleStatus::from_str(&status.to_lowercase()).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Estado '{}' no válido; usa 'active' o 'completed'",
                status
            ))
        })?;
        filters.status = Some(parsed.as_str().to_string());
    }
    Ok(())
}

/// Convertir los filtros de fecha (días locales EAT) en instantes UTC.
/// El límite superior es exclusivo: el inicio del día siguiente.
fn parse_window(
    date_from: &Option<String>,
    date_to: &Option<String>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    let from = match date_from {
        Some(value) => Some(day_start_utc(
            validation::validate_date(value).map_err(|e| validation_error("date_from", e))?,
        )?),
        None => None,
    };

    let to = match date_to {
        Some(value) => {
            let date =
                validation::validate_date(value).map_err(|e| validation_error("date_to", e))?;
            Some(day_start_utc(date + Duration::days(1))?)
        }
        None => None,
    };

    if let (Some(from), Some(to)) = (from, to) {
        if from >= to {
            return Err(AppError::BadRequest(
                "date_from debe ser anterior o igual a date_to".to_string(),
            ));
        }
    }

    Ok((from, to))
}

/// Inicio de un día local EAT como instante UTC
fn day_start_utc(date: NaiveDate) -> Result<DateTime<Utc>, AppError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::Internal("invalid midnight".to_string()))?;

    report_service::eat_offset()
        .from_local_datetime(&midnight)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| AppError::Internal("ambiguous local datetime".to_string()))
}
