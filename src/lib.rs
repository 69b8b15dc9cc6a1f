//! # File Server
//! src/lib.rs
//!
//! Servidor de archivos HTTP/1.0 implementado desde cero sobre sockets TCP,
//! con dos estrategias de concurrencia intercambiables: un pool de threads
//! que comparten el handler o un proceso hijo por conexión.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: parsing de requests, multipart y construcción de responses
//! - `router`: tabla de rutas (método, path) → handler
//! - `handlers`: páginas fijas y operaciones sobre archivos
//! - `server`: listener, acceptor, worker de conexión y señales
//! - `pool`: backends de threads y de procesos
//! - `metrics`: contadores de conexiones
//! - `config`: argumentos CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use file_server::pool::ThreadPool;
//! use file_server::server::{bind_listener, signals, Acceptor, AcceptorOptions, RequestHandler};
//! use std::sync::Arc;
//!
//! let listener = bind_listener("127.0.0.1:8885".parse().unwrap(), 10).unwrap();
//! let pool = ThreadPool::new(20, Arc::new(RequestHandler::new("."))).unwrap();
//! let mut acceptor = Acceptor::new(listener, pool, AcceptorOptions::default()).unwrap();
//! acceptor.run(signals::stop_requested).unwrap();
//! ```

pub mod config;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod pool;
pub mod router;
pub mod server;
