//! # Connection Worker
//! src/server/connection.rs
//!
//! Atiende exactamente una conexión:
//!
//! 1. Lee del socket en bloques hasta que el request esté completo
//! 2. Genera la respuesta con el [`RequestHandler`]
//! 3. Escribe la respuesta y cierra
//!
//! Si el peer cierra antes de completar el request no se escribe nada.

use super::RequestHandler;
use crate::http::request::{find_bytes, is_complete};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use tracing::{debug, info};

const READ_CHUNK: usize = 4096;

/// Resultado de una conexión atendida sin errores de red
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Se envió una respuesta
    Responded,

    /// El peer cerró antes de completar el request
    PeerClosed,
}

/// Atiende una conexión de principio a fin
///
/// # Errores
/// Cualquier error de lectura o escritura del socket. El socket se cierra
/// al salir en todos los casos.
pub fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: &RequestHandler,
) -> io::Result<ConnectionOutcome> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        if n == 0 {
            debug!(%peer, received = buffer.len(), "peer closed before request was complete");
            return Ok(ConnectionOutcome::PeerClosed);
        }

        buffer.extend_from_slice(&chunk[..n]);
        if is_complete(&buffer) {
            break;
        }
    }

    let (method, path) = request_summary(&buffer);
    info!("{} → {} {}", peer, method, path);

    let response = handler.handle(&buffer);
    let bytes = response.to_bytes();
    stream.write_all(&bytes)?;
    stream.flush()?;

    info!(%peer, status = response.status().as_u16(), bytes = bytes.len(), "response sent");

    // El cliente lee hasta EOF; el error de shutdown no cambia el resultado
    let _ = stream.shutdown(Shutdown::Both);
    Ok(ConnectionOutcome::Responded)
}

/// Método y path de la request line para los logs
///
/// Usa `UNKNOWN` y `/` cuando la línea no tiene suficientes tokens.
fn request_summary(buffer: &[u8]) -> (String, String) {
    let end = find_bytes(buffer, b"\r\n").unwrap_or(buffer.len());
    let line = String::from_utf8_lossy(&buffer[..end]);
    let mut parts = line.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => (method.to_string(), path.to_string()),
        _ => ("UNKNOWN".to_string(), "/".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::net::TcpListener;
    use std::thread;
    use tempfile::tempdir;

    fn ephemeral_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").expect("bind")
    }

    /// Sirve una única conexión en otro thread y retorna su resultado
    fn serve_once(
        listener: TcpListener,
        handler: RequestHandler,
    ) -> thread::JoinHandle<io::Result<ConnectionOutcome>> {
        thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            serve_connection(stream, peer, &handler)
        })
    }

    fn exchange(client: &mut TcpStream, chunks: &[&[u8]]) -> String {
        for chunk in chunks {
            client.write_all(chunk).unwrap();
        }
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_serves_index() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let server = serve_once(listener, RequestHandler::new("."));

        let mut client = TcpStream::connect(addr).unwrap();
        let text = exchange(&mut client, &[b"GET / HTTP/1.0\r\n\r\n"]);

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.ends_with("Ini Adalah web Server percobaan"));
        assert_eq!(server.join().unwrap().unwrap(), ConnectionOutcome::Responded);
    }

    #[test]
    fn test_body_split_across_reads() {
        let root = tempdir().unwrap();
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let server = serve_once(listener, RequestHandler::new(root.path()));

        let body = b"--b\r\nContent-Disposition: form-data; name=\"file\"; filename=\"late.txt\"\r\n\r\nslow content\r\n--b--\r\n";
        let head = format!(
            "POST /upload HTTP/1.0\r\nContent-Type: multipart/form-data; boundary=b\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(head.as_bytes()).unwrap();
        thread::sleep(std::time::Duration::from_millis(50));
        let text = exchange(&mut client, &[&body[..10], &body[10..]]);

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert_eq!(server.join().unwrap().unwrap(), ConnectionOutcome::Responded);
        assert_eq!(fs::read(root.path().join("late.txt")).unwrap(), b"slow content");
    }

    #[test]
    fn test_malformed_gets_400() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let server = serve_once(listener, RequestHandler::new("."));

        let mut client = TcpStream::connect(addr).unwrap();
        let text = exchange(&mut client, &[b"GARBAGE\r\n\r\n"]);

        assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
        assert_eq!(server.join().unwrap().unwrap(), ConnectionOutcome::Responded);
    }

    #[test]
    fn test_peer_closed_immediately() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let server = serve_once(listener, RequestHandler::new("."));

        drop(TcpStream::connect(addr).unwrap());

        assert_eq!(server.join().unwrap().unwrap(), ConnectionOutcome::PeerClosed);
    }

    #[test]
    fn test_peer_closed_mid_request() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let server = serve_once(listener, RequestHandler::new("."));

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /files HTT").unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();

        assert!(buf.is_empty());
        assert_eq!(server.join().unwrap().unwrap(), ConnectionOutcome::PeerClosed);
    }

    #[test]
    fn test_request_summary() {
        assert_eq!(
            request_summary(b"DELETE /delete/a.txt HTTP/1.0\r\n\r\n"),
            ("DELETE".to_string(), "/delete/a.txt".to_string())
        );
        assert_eq!(
            request_summary(b"GET\r\n\r\n"),
            ("UNKNOWN".to_string(), "/".to_string())
        );
    }
}
