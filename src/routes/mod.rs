//! Rutas HTTP del sistema

pub mod admin_routes;
pub mod auth_routes;
pub mod parking_routes;
pub mod space_routes;
