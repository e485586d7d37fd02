//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL, junto con sus DTOs de request/response.

pub mod analytics;
pub mod parking_space;
pub mod user;
pub mod vehicle;
