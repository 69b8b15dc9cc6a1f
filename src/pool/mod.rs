//! # Pools de Workers
//! src/pool/mod.rs
//!
//! El Acceptor entrega cada conexión aceptada a un pool de capacidad fija.
//! Hay dos estrategias intercambiables detrás del mismo trait:
//!
//! - **thread**: N threads de larga vida comparten un solo `RequestHandler`
//! - **process**: un proceso hijo (`fork`) por conexión, con a lo sumo N vivos
//!
//! ## Flujo
//!
//! ```text
//! Acceptor ──submit(job)──► WorkerPool ──► WorkerTask
//!    ▲                                         │
//!    └──────── try_outcome / wait_outcome ◄────┘
//! ```
//!
//! Si el pool está saturado la conexión espera (en la cola del pool o en el
//! backlog del kernel); nunca se descarta. `submit` nunca bloquea.

pub mod process;
pub mod thread;

pub use process::ProcessPool;
pub use thread::ThreadPool;

pub use crate::server::connection::ConnectionOutcome;

use std::fmt;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Una conexión aceptada lista para ser atendida
#[derive(Debug)]
pub struct ConnectionJob {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

/// Fallas de una tarea; el Acceptor las registra y sigue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Error de red leyendo o escribiendo el socket
    Connection(String),

    /// El worker hizo panic atendiendo la conexión
    Panicked(String),

    /// El proceso hijo terminó con un código inesperado
    Exited(i32),

    /// El proceso hijo murió por una señal
    Signaled(String),

    /// Se perdió el canal de resultado del worker
    Lost,

    /// Falló la espera del proceso hijo
    Wait(String),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Connection(e) => write!(f, "connection error: {}", e),
            TaskError::Panicked(msg) => write!(f, "worker panicked: {}", msg),
            TaskError::Exited(code) => write!(f, "worker exited with status {}", code),
            TaskError::Signaled(signal) => write!(f, "worker killed by {}", signal),
            TaskError::Lost => write!(f, "worker result lost"),
            TaskError::Wait(e) => write!(f, "failed to wait for worker: {}", e),
        }
    }
}

impl std::error::Error for TaskError {}

/// Resultado final de una tarea
pub type TaskOutcome = Result<ConnectionOutcome, TaskError>;

/// Una conexión en curso dentro de un pool
pub trait WorkerTask {
    /// Identificador para los logs (número de tarea o pid)
    fn id(&self) -> u64;

    fn peer(&self) -> SocketAddr;

    /// Resultado si la tarea ya terminó, sin bloquear
    ///
    /// Una vez retornado `Some`, las siguientes llamadas retornan el mismo valor.
    fn try_outcome(&mut self) -> Option<TaskOutcome>;

    /// Espera a lo sumo `timeout` a que la tarea termine
    fn wait_outcome(&mut self, timeout: Duration) -> Option<TaskOutcome>;
}

/// Estrategia de ejecución de conexiones
pub trait WorkerPool {
    type Task: WorkerTask;

    /// Entrega una conexión al pool
    ///
    /// Un error aquí es fatal para el pool (por ejemplo, no se pudo hacer
    /// `fork`, o se entregó una conexión con el pool saturado).
    fn submit(&mut self, job: ConnectionJob) -> anyhow::Result<Self::Task>;

    /// Máximo de conexiones atendidas en paralelo
    fn capacity(&self) -> usize;

    /// `true` si el pool no puede recibir otra conexión todavía
    ///
    /// Los pools con cola propia nunca se saturan.
    fn is_saturated(&mut self) -> bool {
        false
    }

    /// Nombre de la estrategia para los logs
    fn kind(&self) -> &'static str;
}

/// Texto del payload de un panic
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display() {
        assert_eq!(TaskError::Exited(3).to_string(), "worker exited with status 3");
        assert_eq!(
            TaskError::Connection("reset".into()).to_string(),
            "connection error: reset"
        );
        assert_eq!(TaskError::Lost.to_string(), "worker result lost");
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "code 7");
    }
}
