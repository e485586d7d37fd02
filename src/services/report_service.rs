//! Lógica pura de reporting y analytics
//!
//! Bucketing de histogramas en hora local EAT y serialización CSV del
//! listado de vehículos. Sin acceso a base de datos: los controllers
//! pasan las filas ya leídas.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

use crate::models::analytics::{DailyBucket, HourlyBucket};
use crate::models::vehicle::Vehicle;

/// Offset fijo UTC+3 para la visualización en East Africa Time.
/// Nota: es un offset fijo, no una zona horaria real; no contempla DST.
pub fn eat_offset() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).expect("UTC+3 is a valid offset")
}

/// Convertir un timestamp UTC a hora local EAT
pub fn to_eat(timestamp: DateTime<Utc>) -> DateTime<FixedOffset> {
    timestamp.with_timezone(&eat_offset())
}

/// Truncar un timestamp local al inicio de su hora
fn truncate_to_hour(timestamp: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    timestamp
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("truncating sub-hour fields cannot fail")
}

/// Histograma horario de check-ins en hora local EAT
pub fn hourly_histogram(check_ins: &[DateTime<Utc>]) -> Vec<HourlyBucket> {
    let mut buckets: BTreeMap<DateTime<FixedOffset>, i64> = BTreeMap::new();
    for timestamp in check_ins {
        let hour = truncate_to_hour(to_eat(*timestamp));
        *buckets.entry(hour).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|(hour, count)| HourlyBucket { hour, count })
        .collect()
}

/// Histograma diario de check-ins en fecha local EAT
pub fn daily_histogram(check_ins: &[DateTime<Utc>]) -> Vec<DailyBucket> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for timestamp in check_ins {
        let date = to_eat(*timestamp).date_naive();
        *buckets.entry(date).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|(date, count)| DailyBucket { date, count })
        .collect()
}

const CSV_HEADER: &str = "plate_number,vehicle_category,vehicle_model,vehicle_color,driver_name,\
driver_id_type,driver_id_number,driver_phone,driver_residence,check_in_time,check_out_time,status";

/// Serializar un listado de vehículos a CSV.
///
/// Los timestamps se muestran en hora local EAT. Solo se aplican las reglas
/// mínimas de quoting: comillas cuando el campo contiene coma, comilla o
/// salto de línea, con comillas internas duplicadas.
pub fn vehicles_to_csv(vehicles: &[Vehicle]) -> String {
    let mut output = String::from(CSV_HEADER);
    output.push('\n');

    for vehicle in vehicles {
        let fields = [
            vehicle.plate_number.clone(),
            vehicle.vehicle_category.clone(),
            vehicle.vehicle_model.clone().unwrap_or_default(),
            vehicle.vehicle_color.clone().unwrap_or_default(),
            vehicle.driver_name.clone(),
            vehicle.driver_id_type.clone().unwrap_or_default(),
            vehicle.driver_id_number.clone().unwrap_or_default(),
            vehicle.driver_phone.clone().unwrap_or_default(),
            vehicle.driver_residence.clone().unwrap_or_default(),
            format_timestamp(Some(vehicle.check_in_time)),
            format_timestamp(vehicle.check_out_time),
            vehicle.status.clone(),
        ];

        let row: Vec<String> = fields.iter().map(|f| escape_csv_field(f)).collect();
        output.push_str(&row.join(","));
        output.push('\n');
    }

    output
}

fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(t) => to_eat(t).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn vehicle(plate: &str, driver: &str) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            plate_number: plate.to_string(),
            vehicle_category: "car".to_string(),
            vehicle_model: None,
            vehicle_color: Some("white".to_string()),
            driver_name: driver.to_string(),
            driver_id_type: None,
            driver_id_number: None,
            driver_phone: None,
            driver_residence: None,
            check_in_time: utc(2024, 6, 1, 8, 30),
            check_out_time: None,
            status: "active".to_string(),
            owner_user_id: Uuid::new_v4(),
            handler_user_id: None,
            handover_time: None,
            handover_notes: None,
        }
    }

    #[test]
    fn test_to_eat_applies_plus_three_hours() {
        let local = to_eat(utc(2024, 6, 1, 21, 15));
        assert_eq!(local.hour(), 0);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn test_hourly_histogram_buckets_by_local_hour() {
        // 08:05 y 08:59 UTC caen en el bucket de las 11:00 EAT,
        // 09:01 UTC en el de las 12:00
        let check_ins = vec![
            utc(2024, 6, 1, 8, 5),
            utc(2024, 6, 1, 8, 59),
            utc(2024, 6, 1, 9, 1),
        ];

        let buckets = hourly_histogram(&check_ins);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].hour.hour(), 11);
        assert_eq!(buckets[1].count, 1);
        assert_eq!(buckets[1].hour.hour(), 12);
    }

    #[test]
    fn test_daily_histogram_crosses_midnight_in_local_time() {
        // 22:30 UTC del día 1 ya es día 2 en EAT
        let check_ins = vec![utc(2024, 6, 1, 12, 0), utc(2024, 6, 1, 22, 30)];

        let buckets = daily_histogram(&check_ins);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn test_empty_histograms() {
        assert!(hourly_histogram(&[]).is_empty());
        assert!(daily_histogram(&[]).is_empty());
    }

    #[test]
    fn test_csv_header_and_row_count() {
        let vehicles = vec![vehicle("T111AAA", "Juma"), vehicle("T222BBB", "Asha")];
        let csv = vehicles_to_csv(&vehicles);
        let lines: Vec<&str> = csv.trim_end().split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("plate_number,vehicle_category"));
        assert!(lines[1].starts_with("T111AAA,car,"));
    }

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        let mut v = vehicle("T111AAA", "Juma, \"JJ\" Hassan");
        v.driver_residence = Some("Dar es Salaam\nKinondoni".to_string());
        let csv = vehicles_to_csv(&[v]);

        assert!(csv.contains("\"Juma, \"\"JJ\"\" Hassan\""));
        assert!(csv.contains("\"Dar es Salaam\nKinondoni\""));
    }

    #[test]
    fn test_csv_timestamps_rendered_in_eat() {
        let csv = vehicles_to_csv(&[vehicle("T111AAA", "Juma")]);
        // 08:30 UTC => 11:30 EAT
        assert!(csv.contains("2024-06-01 11:30:00"));
    }
}
