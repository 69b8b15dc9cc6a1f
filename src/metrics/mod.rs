//! # Estadísticas
//! src/metrics/mod.rs
//!
//! Contadores de conexiones del servidor:
//! - Aceptadas
//! - Respondidas, cerradas por el peer y fallidas
//! - Abandonadas durante el apagado

pub mod collector;

pub use collector::ServerStats;
