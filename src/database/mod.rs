//! Módulo de base de datos
//!
//! Maneja la conexión, el schema y los datos iniciales en PostgreSQL.

pub mod connection;
pub mod schema;

pub use connection::create_pool;
