//! # Pool de Procesos
//! src/pool/process.rs
//!
//! Cada conexión se atiende en un proceso hijo creado con `fork`. El hijo
//! arma su propio `RequestHandler`, atiende la conexión y termina con un
//! código que describe el resultado:
//!
//! | Código | Resultado                       |
//! |--------|---------------------------------|
//! | 0      | respuesta enviada               |
//! | 1      | error de red                    |
//! | 2      | el peer cerró antes de terminar |
//! | 101    | panic                           |
//!
//! El padre cierra su copia del socket en cuanto el hijo existe y recoge
//! los hijos terminados con `waitpid(WNOHANG)`. Con `capacity` hijos vivos
//! el pool queda saturado: el Acceptor deja de aceptar y las conexiones
//! nuevas esperan en el backlog del kernel.
//!
//! Solo debe usarse desde un proceso con un único thread activo.

use super::{
    panic_message, ConnectionJob, ConnectionOutcome, TaskError, TaskOutcome, WorkerPool,
    WorkerTask,
};
use crate::server::connection::serve_connection;
use crate::server::RequestHandler;
use anyhow::{bail, Context};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, getpid, ForkResult, Pid};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info_span, warn};

const EXIT_RESPONDED: i32 = 0;
const EXIT_NETWORK_ERROR: i32 = 1;
const EXIT_PEER_CLOSED: i32 = 2;
const EXIT_PANIC: i32 = 101;

/// Intervalo entre intentos de recoger hijos
const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// Hijos vivos y resultados todavía no consultados
#[derive(Debug, Default)]
struct ChildTable {
    running: Vec<Pid>,
    finished: HashMap<Pid, TaskOutcome>,
}

impl ChildTable {
    /// Recoge los hijos que ya terminaron sin bloquear
    fn reap(&mut self) {
        let finished = &mut self.finished;
        self.running.retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => true,
            Ok(WaitStatus::Exited(_, code)) => {
                finished.insert(pid, outcome_from_exit(code));
                false
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                finished.insert(pid, Err(TaskError::Signaled(format!("{:?}", signal))));
                false
            }
            // Detenido o continuado: sigue vivo
            Ok(_) => true,
            Err(e) if e.as_errno() == Some(Errno::EINTR) => true,
            Err(e) if e.as_errno() == Some(Errno::ECHILD) => {
                finished.insert(pid, Err(TaskError::Lost));
                false
            }
            Err(e) => {
                finished.insert(pid, Err(TaskError::Wait(e.to_string())));
                false
            }
        });
    }
}

fn outcome_from_exit(code: i32) -> TaskOutcome {
    match code {
        EXIT_RESPONDED => Ok(ConnectionOutcome::Responded),
        EXIT_PEER_CLOSED => Ok(ConnectionOutcome::PeerClosed),
        EXIT_NETWORK_ERROR => Err(TaskError::Connection("network error in worker process".to_string())),
        EXIT_PANIC => Err(TaskError::Panicked("worker process panicked".to_string())),
        other => Err(TaskError::Exited(other)),
    }
}

/// Pool de procesos hijos, uno por conexión
pub struct ProcessPool {
    root: PathBuf,
    capacity: usize,
    children: Arc<Mutex<ChildTable>>,
}

impl ProcessPool {
    pub fn new(root: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            root: root.into(),
            capacity,
            children: Arc::new(Mutex::new(ChildTable::default())),
        }
    }

    /// Hijos todavía vivos
    pub fn running(&self) -> usize {
        let mut table = self.children.lock().unwrap_or_else(PoisonError::into_inner);
        table.reap();
        table.running.len()
    }

}

impl WorkerPool for ProcessPool {
    type Task = ProcessTask;

    fn submit(&mut self, job: ConnectionJob) -> anyhow::Result<ProcessTask> {
        if self.is_saturated() {
            bail!("process pool saturated ({} workers running)", self.capacity);
        }

        let ConnectionJob { stream, peer } = job;

        match unsafe { fork() }.context("failed to fork worker process")? {
            ForkResult::Child => {
                let code = run_child(stream, peer, self.root.clone());
                unsafe { libc::_exit(code) }
            }
            ForkResult::Parent { child } => {
                // La conexión queda abierta solo en el hijo
                drop(stream);
                debug!(pid = child.as_raw(), %peer, "worker process started");

                self.children
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .running
                    .push(child);

                Ok(ProcessTask {
                    pid: child,
                    peer,
                    children: Arc::clone(&self.children),
                    outcome: None,
                })
            }
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_saturated(&mut self) -> bool {
        self.running() >= self.capacity
    }

    fn kind(&self) -> &'static str {
        "process"
    }
}

/// Cuerpo del proceso hijo; retorna el código de salida
fn run_child(stream: std::net::TcpStream, peer: SocketAddr, root: PathBuf) -> i32 {
    let pid = getpid().as_raw();
    let span = info_span!("worker", pid);
    let _enter = span.enter();

    let handler = RequestHandler::new(root);
    match catch_unwind(AssertUnwindSafe(|| serve_connection(stream, peer, &handler))) {
        Ok(Ok(ConnectionOutcome::Responded)) => EXIT_RESPONDED,
        Ok(Ok(ConnectionOutcome::PeerClosed)) => EXIT_PEER_CLOSED,
        Ok(Err(e)) => {
            warn!(%peer, error = %e, "network error");
            EXIT_NETWORK_ERROR
        }
        Err(payload) => {
            error!(%peer, message = %panic_message(payload.as_ref()), "worker panicked");
            EXIT_PANIC
        }
    }
}

/// Una conexión atendida por un proceso hijo del [`ProcessPool`]
#[derive(Debug)]
pub struct ProcessTask {
    pid: Pid,
    peer: SocketAddr,
    children: Arc<Mutex<ChildTable>>,
    outcome: Option<TaskOutcome>,
}

impl ProcessTask {
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl WorkerTask for ProcessTask {
    fn id(&self) -> u64 {
        self.pid.as_raw() as u64
    }

    fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn try_outcome(&mut self) -> Option<TaskOutcome> {
        if self.outcome.is_none() {
            let mut table = self.children.lock().unwrap_or_else(PoisonError::into_inner);
            table.reap();
            self.outcome = table.finished.remove(&self.pid);
        }
        self.outcome.clone()
    }

    fn wait_outcome(&mut self, timeout: Duration) -> Option<TaskOutcome> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(outcome) = self.try_outcome() {
                return Some(outcome);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            thread::sleep(REAP_INTERVAL.min(deadline - now));
        }
    }
}
