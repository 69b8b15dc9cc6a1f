//! # Pool de Threads
//! src/pool/thread.rs
//!
//! `capacity` threads de larga vida toman conexiones de una cola FIFO
//! compartida (Mutex + Condvar) y las atienden con un único
//! `RequestHandler` compartido. Cada tarea reporta su resultado por un
//! canal `mpsc` propio.
//!
//! Las conexiones que llegan con todos los workers ocupados esperan en la
//! cola, que no tiene límite.

use super::{panic_message, ConnectionJob, TaskError, TaskOutcome, WorkerPool, WorkerTask};
use crate::server::connection::serve_connection;
use crate::server::RequestHandler;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info_span, warn};

struct QueuedJob {
    id: u64,
    job: ConnectionJob,
    done: Sender<TaskOutcome>,
}

struct QueueState {
    jobs: VecDeque<QueuedJob>,
    closed: bool,
}

/// Cola FIFO thread-safe de conexiones pendientes
struct JobQueue {
    state: Mutex<QueueState>,
    condvar: Condvar,
}

impl JobQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            condvar: Condvar::new(),
        }
    }

    fn push(&self, job: QueuedJob) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.jobs.push_back(job);
        self.condvar.notify_one();
    }

    /// Bloquea hasta que haya un job; `None` si la cola se cerró y está vacía
    fn pop(&self) -> Option<QueuedJob> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.closed {
                return None;
            }
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        self.condvar.notify_all();
    }

    fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .jobs
            .len()
    }
}

/// Pool de threads con un handler compartido
pub struct ThreadPool {
    queue: Arc<JobQueue>,
    capacity: usize,
    next_id: u64,
}

impl ThreadPool {
    /// Lanza `capacity` workers
    ///
    /// # Errores
    /// Si el sistema no permite crear algún thread.
    pub fn new(capacity: usize, handler: Arc<RequestHandler>) -> anyhow::Result<Self> {
        let queue = Arc::new(JobQueue::new());

        for index in 0..capacity {
            let worker_queue = Arc::clone(&queue);
            let handler = Arc::clone(&handler);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", index))
                .spawn(move || worker_loop(index, &worker_queue, &handler));

            if let Err(e) = spawned {
                queue.close();
                return Err(anyhow::Error::new(e).context(format!("failed to spawn worker {}", index)));
            }
        }

        Ok(Self {
            queue,
            capacity,
            next_id: 0,
        })
    }

    /// Conexiones esperando un worker libre
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl WorkerPool for ThreadPool {
    type Task = ThreadTask;

    fn submit(&mut self, job: ConnectionJob) -> anyhow::Result<ThreadTask> {
        self.next_id += 1;
        let (done, outcome_rx) = mpsc::channel();
        let peer = job.peer;

        self.queue.push(QueuedJob {
            id: self.next_id,
            job,
            done,
        });

        Ok(ThreadTask {
            id: self.next_id,
            peer,
            outcome_rx,
            outcome: None,
        })
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn kind(&self) -> &'static str {
        "thread"
    }
}

impl Drop for ThreadPool {
    /// Cierra la cola: los workers libres terminan y los ocupados quedan
    /// desacoplados hasta terminar su conexión
    fn drop(&mut self) {
        self.queue.close();
    }
}

fn worker_loop(index: usize, queue: &JobQueue, handler: &RequestHandler) {
    let span = info_span!("worker", index);
    let _enter = span.enter();

    while let Some(QueuedJob { id, job, done }) = queue.pop() {
        let ConnectionJob { stream, peer } = job;
        debug!(task = id, %peer, "task started");

        let outcome = match catch_unwind(AssertUnwindSafe(|| serve_connection(stream, peer, handler))) {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(TaskError::Connection(e.to_string())),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(task = id, %peer, %message, "worker panicked");
                Err(TaskError::Panicked(message))
            }
        };

        // El Acceptor pudo haber abandonado la tarea
        let _ = done.send(outcome);
    }

    debug!("worker exiting");
}

/// Una conexión encolada o en curso en el [`ThreadPool`]
pub struct ThreadTask {
    id: u64,
    peer: SocketAddr,
    outcome_rx: Receiver<TaskOutcome>,
    outcome: Option<TaskOutcome>,
}

impl WorkerTask for ThreadTask {
    fn id(&self) -> u64 {
        self.id
    }

    fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn try_outcome(&mut self) -> Option<TaskOutcome> {
        if self.outcome.is_none() {
            self.outcome = match self.outcome_rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(TaskError::Lost)),
            };
        }
        self.outcome.clone()
    }

    fn wait_outcome(&mut self, timeout: Duration) -> Option<TaskOutcome> {
        if self.outcome.is_none() {
            self.outcome = match self.outcome_rx.recv_timeout(timeout) {
                Ok(outcome) => Some(outcome),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(Err(TaskError::Lost)),
            };
        }
        self.outcome.clone()
    }
}
