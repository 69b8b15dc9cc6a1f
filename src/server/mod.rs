//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! - **listener**: socket de escucha con backlog configurable
//! - **acceptor**: ciclo de aceptación, seguimiento de tareas y drain
//! - **connection**: atiende una conexión (leer, responder, cerrar)
//! - **handler**: parser + router + compositor
//! - **signals**: SIGINT/SIGTERM como bandera de parada

pub mod acceptor;
pub mod connection;
pub mod handler;
pub mod listener;
pub mod signals;

pub use acceptor::{Acceptor, AcceptorOptions};
pub use connection::{serve_connection, ConnectionOutcome};
pub use handler::RequestHandler;
pub use listener::bind_listener;
