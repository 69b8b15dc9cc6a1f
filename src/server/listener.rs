//! # Socket de escucha
//! src/server/listener.rs
//!
//! `TcpListener::bind` de la librería estándar no permite elegir el backlog
//! de `listen(2)`, así que el socket se arma con nix y luego se convierte.

use anyhow::{Context, Result};
use nix::sys::socket::{
    bind, listen, setsockopt, socket, sockopt, AddressFamily, InetAddr, SockAddr, SockFlag,
    SockType,
};
use nix::unistd::close;
use std::net::{SocketAddr, TcpListener};
use std::os::unix::io::{FromRawFd, RawFd};

/// Crea un socket TCP escuchando en `addr` con `SO_REUSEADDR`
pub fn bind_listener(addr: SocketAddr, backlog: usize) -> Result<TcpListener> {
    let family = match addr {
        SocketAddr::V4(_) => AddressFamily::Inet,
        SocketAddr::V6(_) => AddressFamily::Inet6,
    };

    let fd = socket(family, SockType::Stream, SockFlag::SOCK_CLOEXEC, None)
        .context("failed to create socket")?;

    if let Err(e) = configure(fd, addr, backlog) {
        let _ = close(fd);
        return Err(e).with_context(|| format!("failed to create listening socket for {}", addr));
    }

    // El fd es nuestro y queda abierto solo dentro del TcpListener
    Ok(unsafe { TcpListener::from_raw_fd(fd) })
}

fn configure(fd: RawFd, addr: SocketAddr, backlog: usize) -> nix::Result<()> {
    setsockopt(fd, sockopt::ReuseAddr, &true)?;
    bind(fd, &SockAddr::new_inet(InetAddr::from_std(&addr)))?;
    listen(fd, backlog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;

    #[test]
    fn test_bind_ephemeral_port() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap(), 4).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        let _client = TcpStream::connect(addr).unwrap();
        let (_stream, peer) = listener.accept().unwrap();
        assert!(peer.ip().is_loopback());
    }

    #[test]
    fn test_bind_port_in_use_fails() {
        let first = bind_listener("127.0.0.1:0".parse().unwrap(), 4).unwrap();
        let addr = first.local_addr().unwrap();

        let err = bind_listener(addr, 4).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to create listening socket"));
    }
}
