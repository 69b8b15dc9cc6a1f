//! # File Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de archivos HTTP/1.0.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use file_server::config::{Config, Strategy};
use file_server::pool::{ProcessPool, ThreadPool, WorkerPool};
use file_server::server::{bind_listener, signals, Acceptor, RequestHandler};
use std::net::TcpListener;
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_thread_ids(true)
        .init();

    let config = Config::parse();
    config.validate().map_err(|e| anyhow!(e))?;
    config.log_summary();

    signals::install()?;

    let listener = bind_listener(config.socket_addr()?, config.backlog)?;

    match config.strategy {
        Strategy::Thread => {
            let handler = Arc::new(RequestHandler::new(config.root.clone()));
            let pool = ThreadPool::new(config.worker_count(), handler)?;
            serve(listener, pool, &config)
        }
        Strategy::Process => {
            let pool = ProcessPool::new(config.root.clone(), config.worker_count());
            serve(listener, pool, &config)
        }
    }
}

fn serve<P: WorkerPool>(listener: TcpListener, pool: P, config: &Config) -> Result<()> {
    let mut acceptor = Acceptor::new(listener, pool, config.acceptor_options())?;
    let stats = acceptor
        .run(signals::stop_requested)
        .context("acceptor loop failed")?;

    info!(abandoned = stats.abandoned, "bye");
    Ok(())
}
