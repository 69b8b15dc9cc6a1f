//! # Acceptor Loop
//! src/server/acceptor.rs
//!
//! Dueño del socket de escucha. Acepta conexiones, las entrega al pool y
//! lleva la cuenta de las tareas en curso.
//!
//! ## Ciclo
//!
//! ```text
//! loop {
//!     si el pool está saturado: esperar y recoger tareas
//!     select(listener, poll_interval)  // para poder ver la bandera de parada
//!     accept → pool.submit
//!     recoger tareas terminadas
//!     reporte periódico
//! }
//! drain(shutdown_timeout)
//! cerrar listener
//! ```
//!
//! Una tarea fallida se registra y se cuenta; nunca detiene el ciclo. Las
//! tareas que siguen en curso al vencer el timeout de apagado se abandonan
//! sin cerrar sus sockets.

use crate::metrics::ServerStats;
use crate::pool::{ConnectionJob, ConnectionOutcome, TaskOutcome, WorkerPool, WorkerTask};
use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::select::{select, FdSet};
use nix::sys::time::{TimeVal, TimeValLike};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::os::unix::io::AsRawFd;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Espera entre revisiones mientras el pool está saturado
const SATURATED_BACKOFF: Duration = Duration::from_millis(10);

/// Tiempos del Acceptor
#[derive(Debug, Clone)]
pub struct AcceptorOptions {
    /// Espera máxima en `select` antes de volver a mirar la bandera de parada
    pub poll_interval: Duration,

    /// Cada cuánto reportar el estado si hay tareas en curso
    pub status_interval: Option<Duration>,

    /// Tiempo total para esperar tareas en curso al apagar
    pub shutdown_timeout: Duration,
}

impl Default for AcceptorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            status_interval: Some(Duration::from_secs(30)),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Acceptor<P: WorkerPool> {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    pool: P,
    tasks: Vec<P::Task>,
    stats: ServerStats,
    options: AcceptorOptions,
}

impl<P: WorkerPool> Acceptor<P> {
    pub fn new(listener: TcpListener, pool: P, options: AcceptorOptions) -> Result<Self> {
        let local_addr = listener
            .local_addr()
            .context("failed to read listener address")?;
        listener
            .set_nonblocking(true)
            .context("failed to make listener non-blocking")?;

        Ok(Self {
            listener: Some(listener),
            local_addr,
            pool,
            tasks: Vec::new(),
            stats: ServerStats::new(),
            options,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Tareas entregadas al pool cuyo resultado todavía no se recogió
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Atiende conexiones hasta que `should_stop` retorne `true`
    ///
    /// Al salir del ciclo espera las tareas en curso y cierra el listener.
    ///
    /// # Errores
    /// Solo los errores del pool al entregar una conexión (por ejemplo, un
    /// `fork` fallido) terminan el ciclo.
    pub fn run(&mut self, should_stop: impl Fn() -> bool) -> Result<ServerStats> {
        info!(
            addr = %self.local_addr,
            strategy = self.pool.kind(),
            workers = self.pool.capacity(),
            "listening on http://{}/",
            self.local_addr
        );

        let mut last_status = Instant::now();

        while !should_stop() {
            if self.pool.is_saturated() {
                // Sin aceptar: las conexiones esperan en el backlog
                thread::sleep(SATURATED_BACKOFF.min(self.options.poll_interval));
            } else if self.wait_readable() {
                self.accept_one()?;
            }
            self.prune();

            if let Some(interval) = self.options.status_interval {
                if last_status.elapsed() >= interval {
                    if !self.tasks.is_empty() {
                        self.log_status();
                    }
                    last_status = Instant::now();
                }
            }
        }

        info!("shutdown requested");
        self.drain();

        // Cerrar el socket de escucha después del drain
        self.listener = None;
        self.stats.log_summary();
        Ok(self.stats.clone())
    }

    /// Espera a que haya una conexión pendiente, a lo sumo `poll_interval`
    ///
    /// Los errores de `select` se tratan como "nada listo".
    fn wait_readable(&self) -> bool {
        let listener = match &self.listener {
            Some(listener) => listener,
            None => return false,
        };

        let mut read_set = FdSet::new();
        read_set.insert(listener.as_raw_fd());
        let mut timeout = TimeVal::milliseconds(self.options.poll_interval.as_millis() as i64);

        match select(None, Some(&mut read_set), None, None, Some(&mut timeout)) {
            Ok(0) => false,
            Ok(_) => read_set.contains(listener.as_raw_fd()),
            Err(e) if e.as_errno() == Some(Errno::EINTR) => false,
            Err(e) => {
                warn!(error = %e, "select failed");
                thread::sleep(self.options.poll_interval);
                false
            }
        }
    }

    fn accept_one(&mut self) -> Result<()> {
        let listener = match &self.listener {
            Some(listener) => listener,
            None => return Ok(()),
        };

        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::Interrupted => {
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                return Ok(());
            }
        };

        if let Err(e) = stream.set_nonblocking(false) {
            warn!(%peer, error = %e, "failed to configure connection");
            return Ok(());
        }

        info!(%peer, "connection accepted");
        self.stats.record_accepted();

        let task = self
            .pool
            .submit(ConnectionJob { stream, peer })
            .with_context(|| format!("failed to submit connection from {}", peer))?;
        self.tasks.push(task);

        info!(active = self.tasks.len(), "active tasks");
        Ok(())
    }

    /// Quita de la lista las tareas que ya terminaron
    fn prune(&mut self) {
        let stats = &mut self.stats;
        self.tasks.retain_mut(|task| match task.try_outcome() {
            Some(outcome) => {
                log_outcome(task, &outcome);
                stats.record_outcome(&outcome);
                false
            }
            None => true,
        });
    }

    /// Espera las tareas en curso con un plazo compartido
    fn drain(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        info!(
            pending = self.tasks.len(),
            timeout_secs = self.options.shutdown_timeout.as_secs_f64(),
            "waiting for in-flight tasks"
        );

        let deadline = Instant::now() + self.options.shutdown_timeout;
        let mut abandoned = 0;

        for mut task in std::mem::take(&mut self.tasks) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match task.wait_outcome(remaining) {
                Some(outcome) => {
                    log_outcome(&task, &outcome);
                    self.stats.record_outcome(&outcome);
                }
                None => {
                    warn!(task = task.id(), peer = %task.peer(), "task abandoned at shutdown");
                    abandoned += 1;
                }
            }
        }

        self.stats.record_abandoned(abandoned);
    }

    fn log_status(&self) {
        info!(
            active = self.tasks.len(),
            addr = %self.local_addr,
            strategy = self.pool.kind(),
            accepted = self.stats.accepted,
            uptime_secs = self.stats.uptime().as_secs(),
            "server status"
        );
    }
}

fn log_outcome<T: WorkerTask>(task: &T, outcome: &TaskOutcome) {
    match outcome {
        Ok(ConnectionOutcome::Responded) => debug!(task = task.id(), peer = %task.peer(), "task finished"),
        Ok(ConnectionOutcome::PeerClosed) => {
            info!(task = task.id(), peer = %task.peer(), "peer closed connection")
        }
        Err(e) => warn!(task = task.id(), peer = %task.peer(), error = %e, "task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ThreadPool;
    use crate::server::RequestHandler;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn fast_options() -> AcceptorOptions {
        AcceptorOptions {
            poll_interval: Duration::from_millis(20),
            status_interval: Some(Duration::from_millis(50)),
            shutdown_timeout: Duration::from_secs(2),
        }
    }

    fn start(
        options: AcceptorOptions,
    ) -> (SocketAddr, Arc<AtomicBool>, thread::JoinHandle<ServerStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let pool = ThreadPool::new(2, Arc::new(RequestHandler::new("."))).unwrap();
            let mut acceptor = Acceptor::new(listener, pool, options).unwrap();
            acceptor.run(|| flag.load(Ordering::Relaxed)).unwrap()
        });

        (addr, stop, handle)
    }

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(format!("GET {} HTTP/1.0\r\n\r\n", path).as_bytes())
            .unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_serves_until_stopped() {
        let (addr, stop, handle) = start(fast_options());

        for _ in 0..3 {
            assert!(get(addr, "/santai").ends_with("santai saja"));
        }
        let peer_closed = TcpStream::connect(addr).unwrap();
        drop(peer_closed);
        thread::sleep(Duration::from_millis(100));

        stop.store(true, Ordering::Relaxed);
        let stats = handle.join().unwrap();

        assert_eq!(stats.accepted, 4);
        assert_eq!(stats.responded, 3);
        assert_eq!(stats.peer_closed, 1);
        assert_eq!(stats.abandoned, 0);
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn test_drain_abandons_stuck_tasks() {
        let options = AcceptorOptions {
            shutdown_timeout: Duration::from_millis(200),
            ..fast_options()
        };
        let (addr, stop, handle) = start(options);

        // Conexión que nunca completa su request
        let _stuck = TcpStream::connect(addr).unwrap();
        thread::sleep(Duration::from_millis(100));

        stop.store(true, Ordering::Relaxed);
        let stats = handle.join().unwrap();

        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.in_flight(), 0);
    }
}
