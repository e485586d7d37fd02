//! Controllers del sistema
//!
//! Un controller por dominio: ciclo de vida de vehículos, capacidad,
//! cuentas de usuario y reporting.

pub mod parking_controller;
pub mod report_controller;
pub mod space_controller;
pub mod user_controller;
