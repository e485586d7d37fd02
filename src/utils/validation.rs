//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! del dominio de parking (matrículas, categorías, teléfonos, fechas).

use chrono::NaiveDate;
use validator::ValidationError;

/// Categorías de vehículo aceptadas por el parking
pub const VEHICLE_CATEGORIES: [&str; 3] = ["motorcycle", "bajaj", "car"];

/// Validar que la categoría sea una de las conocidas
pub fn validate_category(value: &str) -> Result<(), ValidationError> {
    if !VEHICLE_CATEGORIES.contains(&value) {
        let mut error = ValidationError::new("vehicle_category");
        error.add_param("value".into(), &value.to_string());
        error.add_param("allowed_values".into(), &format!("{:?}", VEHICLE_CATEGORIES));
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula de vehículo
pub fn validate_plate_number(value: &str) -> Result<(), ValidationError> {
    // Formato básico: T111AAA o similar, sin separadores
    let clean_plate = value.replace([' ', '-', '_'], "");
    if clean_plate.len() < 5 || clean_plate.len() > 10 {
        let mut error = ValidationError::new("plate_number");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    if !clean_plate.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut error = ValidationError::new("plate_number");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Normalizar una matrícula para almacenamiento y búsqueda
pub fn normalize_plate_number(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if clean_phone.len() < 9 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_category() {
        assert!(validate_category("car").is_ok());
        assert!(validate_category("motorcycle").is_ok());
        assert!(validate_category("bajaj").is_ok());
        assert!(validate_category("truck").is_err());
        assert!(validate_category("").is_err());
    }

    #[test]
    fn test_validate_plate_number() {
        assert!(validate_plate_number("T111AAA").is_ok());
        assert!(validate_plate_number("T 111 AAA").is_ok());
        assert!(validate_plate_number("MC-123-BZ").is_ok());
        assert!(validate_plate_number("T1").is_err());
        assert!(validate_plate_number("ABCDEFGHIJK").is_err());
        assert!(validate_plate_number("T111@AA").is_err());
    }

    #[test]
    fn test_normalize_plate_number() {
        assert_eq!(normalize_plate_number("t 111 aaa"), "T111AAA");
        assert_eq!(normalize_plate_number("T-111-AAA"), "T111AAA");
        assert_eq!(normalize_plate_number("T111AAA"), "T111AAA");
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+255 712 345 678").is_ok());
        assert!(validate_phone("0712345678").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2024-01-15").is_ok());
        assert!(validate_date("2024/01/15").is_err());
        assert!(validate_date("15-01-2024").is_err());
    }
}
