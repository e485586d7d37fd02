//! Services module
//!
//! Este módulo contiene la lógica de negocio que no toca la base de datos
//! directamente (proyecciones de lectura, serialización de reportes).

pub mod report_service;
