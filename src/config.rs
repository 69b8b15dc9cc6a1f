//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de archivos con soporte para argumentos CLI y
//! variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./file_server --port 8885 --root ./public \
//!   --strategy process \
//!   --workers 4 \
//!   --shutdown-timeout 10
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 WORKER_STRATEGY=thread ./file_server
//! ```

use crate::server::AcceptorOptions;
use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Workers por defecto con la estrategia de threads
pub const DEFAULT_THREAD_WORKERS: usize = 20;

/// Workers por defecto con la estrategia de procesos
pub const DEFAULT_PROCESS_WORKERS: usize = 4;

/// Cómo se ejecuta cada conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Threads que comparten un único handler
    Thread,

    /// Un proceso hijo por conexión
    Process,
}

impl Strategy {
    pub fn default_workers(self) -> usize {
        match self {
            Strategy::Thread => DEFAULT_THREAD_WORKERS,
            Strategy::Process => DEFAULT_PROCESS_WORKERS,
        }
    }
}

/// Configuración del servidor de archivos HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(about = "Servidor de archivos HTTP/1.0 con pool de threads o procesos")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8885", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio que se sirve y donde se guardan los uploads
    #[arg(long, default_value = ".", env = "SERVE_ROOT")]
    pub root: PathBuf,

    // === Workers ===

    /// Estrategia de ejecución de conexiones
    #[arg(long, value_enum, default_value = "thread", env = "WORKER_STRATEGY")]
    pub strategy: Strategy,

    /// Tamaño del pool (20 threads o 4 procesos si no se indica)
    #[arg(short, long, env = "WORKERS")]
    pub workers: Option<usize>,

    /// Backlog de `listen(2)`
    #[arg(long, default_value = "10", env = "ACCEPT_BACKLOG")]
    pub backlog: usize,

    // === Tiempos ===

    /// Segundos para esperar conexiones en curso al apagar
    #[arg(long = "shutdown-timeout", default_value = "10", env = "SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,

    /// Segundos entre reportes de estado (0 = desactivado)
    #[arg(long = "status-interval", default_value = "30", env = "STATUS_INTERVAL_SECS")]
    pub status_interval_secs: u64,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use file_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8885");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resuelve [`Config::address`] a una dirección de socket
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.address()
            .to_socket_addrs()
            .with_context(|| format!("malformed bind address {}", self.address()))?
            .next()
            .ok_or_else(|| anyhow!("bind address {} resolved to nothing", self.address()))
    }

    /// Tamaño efectivo del pool
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| self.strategy.default_workers())
    }

    pub fn acceptor_options(&self) -> AcceptorOptions {
        AcceptorOptions {
            status_interval: match self.status_interval_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            ..AcceptorOptions::default()
        }
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Workers must be >= 1".to_string());
        }

        if self.backlog == 0 {
            return Err("Accept backlog must be >= 1".to_string());
        }

        if !self.root.is_dir() {
            return Err(format!(
                "Serve root {} is not a directory",
                self.root.display()
            ));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            root = %self.root.display(),
            strategy = ?self.strategy,
            workers = self.worker_count(),
            backlog = self.backlog,
            shutdown_timeout_secs = self.shutdown_timeout_secs,
            status_interval_secs = self.status_interval_secs,
            "configuration"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8885,
            host: "127.0.0.1".to_string(),
            root: PathBuf::from("."),
            strategy: Strategy::Thread,
            workers: None,
            backlog: 10,
            shutdown_timeout_secs: 10,
            status_interval_secs: 30,
        }
    }
}
