//! # Request Handler
//! src/server/handler.rs
//!
//! Une parser, router y compositor: bytes del request → bytes de la respuesta.
//! No tiene estado mutable, así que una sola instancia se comparte entre
//! todos los threads del pool (o se construye una por proceso hijo).

use crate::handlers::{bad_request, ServeDir};
use crate::http::{Request, Response};
use crate::router::Router;
use std::path::PathBuf;
use tracing::debug;

pub struct RequestHandler {
    dir: ServeDir,
    router: Router,
}

impl RequestHandler {
    /// Handler con la tabla de rutas del servidor de archivos
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_router(root, Router::file_server())
    }

    pub fn with_router(root: impl Into<PathBuf>, router: Router) -> Self {
        Self {
            dir: ServeDir::new(root),
            router,
        }
    }

    pub fn serve_dir(&self) -> &ServeDir {
        &self.dir
    }

    /// Parsea y despacha un request completo
    ///
    /// Un request malformado produce 400; nunca falla.
    pub fn handle(&self, raw: &[u8]) -> Response {
        match Request::parse(raw) {
            Ok(request) => self.router.route(&self.dir, &request),
            Err(e) => {
                debug!(error = %e, "request rejected");
                bad_request(&e.to_string())
            }
        }
    }

    /// Igual que [`RequestHandler::handle`] pero ya serializado
    pub fn process(&self, raw: &[u8]) -> Vec<u8> {
        self.handle(raw).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use std::fs;
    use tempfile::tempdir;
    use test_case::test_case;

    #[test_case(b"GET\r\n\r\n" ; "single token")]
    #[test_case(b"PUT /x HTTP/1.0\r\n\r\n" ; "unsupported method")]
    #[test_case(b"GET x HTTP/1.0\r\n\r\n" ; "path without slash")]
    #[test_case(b"\r\n\r\n" ; "empty request")]
    fn test_malformed_is_bad_request(raw: &[u8]) {
        let handler = RequestHandler::new(".");
        let response = handler.handle(raw);

        assert_eq!(response.status(), StatusCode::BadRequest);
        assert!(response.body_text().starts_with("Bad Request: "));
    }

    #[test]
    fn test_process_serves_files() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("a.txt"), b"contenido").unwrap();
        let handler = RequestHandler::new(root.path());

        let bytes = handler.process(b"GET /a.txt HTTP/1.0\r\n\r\n");
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Length: 9\r\n"));
        assert!(text.ends_with("\r\n\r\ncontenido"));
    }

    #[test]
    fn test_unknown_file_is_404() {
        let root = tempdir().unwrap();
        let handler = RequestHandler::new(root.path());

        let response = handler.handle(b"GET /nonexistent.ext HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
    }
}
