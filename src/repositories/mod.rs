//! Repositorios de acceso a datos
//!
//! Todo el SQL del sistema vive aquí, un repositorio por tabla.

pub mod space_repository;
pub mod user_repository;
pub mod vehicle_repository;
