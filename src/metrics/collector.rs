//! # Estadísticas del Servidor
//! src/metrics/collector.rs
//!
//! Contadores que mantiene el Acceptor a medida que las tareas terminan.
//! Solo los toca el thread del Acceptor, por lo que no necesitan locks.

use crate::pool::{ConnectionOutcome, TaskOutcome};
use std::time::{Duration, Instant};
use tracing::info;

/// Totales de conexiones desde que arrancó el servidor
#[derive(Debug, Clone)]
pub struct ServerStats {
    /// Conexiones aceptadas y entregadas al pool
    pub accepted: u64,

    /// Conexiones que recibieron respuesta
    pub responded: u64,

    /// Peers que cerraron antes de completar el request
    pub peer_closed: u64,

    /// Tareas terminadas con error
    pub failed: u64,

    /// Tareas todavía en curso al vencer el timeout de apagado
    pub abandoned: u64,

    start: Instant,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            accepted: 0,
            responded: 0,
            peer_closed: 0,
            failed: 0,
            abandoned: 0,
            start: Instant::now(),
        }
    }

    pub fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    /// Registra el resultado final de una tarea
    pub fn record_outcome(&mut self, outcome: &TaskOutcome) {
        match outcome {
            Ok(ConnectionOutcome::Responded) => self.responded += 1,
            Ok(ConnectionOutcome::PeerClosed) => self.peer_closed += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub fn record_abandoned(&mut self, count: usize) {
        self.abandoned += count as u64;
    }

    /// Tareas aceptadas cuyo resultado todavía no se registró
    pub fn in_flight(&self) -> u64 {
        self.accepted
            .saturating_sub(self.responded + self.peer_closed + self.failed + self.abandoned)
    }

    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }

    /// Resumen final al apagar el servidor
    pub fn log_summary(&self) {
        info!(
            accepted = self.accepted,
            responded = self.responded,
            peer_closed = self.peer_closed,
            failed = self.failed,
            abandoned = self.abandoned,
            uptime_secs = self.uptime().as_secs(),
            "server stopped"
        );
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
