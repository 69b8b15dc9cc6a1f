//! # Señales
//! src/server/signals.rs
//!
//! SIGINT y SIGTERM solo bajan una bandera; el Acceptor la consulta entre
//! esperas y empieza el drain. SIGPIPE se ignora para que escribir en un
//! socket cerrado por el peer sea un error de I/O y no termine el proceso.
//!
//! Los procesos hijos heredan estos handlers: un Ctrl+C al grupo solo baja
//! su copia de la bandera y la conexión en curso termina normalmente.

use anyhow::{Context, Result};
use nix::sys::signal::{signal, SigHandler, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn stop_running(_signal: libc::c_int) {
    RUNNING.store(false, Ordering::Relaxed);
}

/// Instala los handlers de señales del proceso
pub fn install() -> Result<()> {
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }
        .context("failed to ignore SIGPIPE")?;
    unsafe { signal(Signal::SIGINT, SigHandler::Handler(stop_running)) }
        .context("failed to set SIGINT handler")?;
    unsafe { signal(Signal::SIGTERM, SigHandler::Handler(stop_running)) }
        .context("failed to set SIGTERM handler")?;
    Ok(())
}

/// `false` una vez recibida SIGINT o SIGTERM
pub fn running() -> bool {
    RUNNING.load(Ordering::Relaxed)
}

/// Predicado de parada para [`super::Acceptor::run`]
pub fn stop_requested() -> bool {
    !running()
}

