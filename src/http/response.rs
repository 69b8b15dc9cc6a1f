//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.0 y convertirlas a bytes.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Date: Thu Oct 15 10:00:00 2026\r\n
//! Connection: close\r\n
//! Server: file_server/0.1.0\r\n
//! Content-Length: 11\r\n
//! Content-type:text/plain\r\n
//! \r\n
//! santai saja
//! ```
//!
//! Los cuatro headers obligatorios los escribe siempre el compositor;
//! `Content-Length` se calcula a partir del body final y nunca lo aporta
//! quien construye la respuesta. Los headers extra se escriben como
//! `Key:Value`, sin espacio, en orden de inserción.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use file_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-type", "text/html")
//!     .with_body("<h1>hola</h1>");
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::StatusCode;
use chrono::Local;

/// Identidad del servidor para el header `Server`
pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Headers que solo escribe el compositor
const RESERVED_HEADERS: [&str; 4] = ["Date", "Connection", "Server", "Content-Length"];

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers extra; nombres únicos, orden de inserción
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers extra ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header extra
    ///
    /// Si ya existe (sin distinguir mayúsculas) se reemplaza su valor en su
    /// posición original. Los headers obligatorios se ignoran.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        if RESERVED_HEADERS.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            return;
        }

        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el cuerpo desde texto
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// Establece el cuerpo desde bytes (contenido de archivos)
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Respuesta de texto plano sin headers extra
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status).with_body(body)
    }

    /// Respuesta HTML (`Content-type: text/html`)
    pub fn html(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-type", "text/html")
            .with_body(body)
    }

    /// Redirección 302 mediante el header `location`
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::Found).with_header("location", location)
    }

    /// Convierte la respuesta a bytes con la fecha actual
    pub fn to_bytes(&self) -> Vec<u8> {
        let date = Local::now().format("%c").to_string();
        self.to_bytes_with_date(&date)
    }

    /// Convierte la respuesta a bytes usando `date` en el header `Date`
    ///
    /// Genera:
    /// - Status line: `HTTP/1.0 200 OK\r\n`
    /// - `Date`, `Connection: close`, `Server`, `Content-Length`
    /// - Headers extra: `Key:Value\r\n`
    /// - Línea vacía y el body tal cual
    pub fn to_bytes_with_date(&self, date: &str) -> Vec<u8> {
        let mut head = String::with_capacity(128);

        head.push_str(&format!("HTTP/1.0 {}\r\n", self.status));
        head.push_str(&format!("Date: {}\r\n", date));
        head.push_str("Connection: close\r\n");
        head.push_str(&format!("Server: {}\r\n", SERVER_NAME));
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));

        for (name, value) in &self.headers {
            head.push_str(&format!("{}:{}\r\n", name, value));
        }
        head.push_str("\r\n");

        let mut result = head.into_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Busca un header extra (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Headers extra en orden de inserción
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body como texto (para logs y tests)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Separa la respuesta en (líneas del head, body)
    fn split(bytes: &[u8]) -> (Vec<String>, Vec<u8>) {
        let end = bytes.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        let head = String::from_utf8(bytes[..end].to_vec()).unwrap();
        let lines = head.split("\r\n").map(str::to_string).collect();
        (lines, bytes[end + 4..].to_vec())
    }

    fn content_length(lines: &[String]) -> usize {
        lines
            .iter()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_mandatory_headers_in_order() {
        let bytes = Response::text(StatusCode::Ok, "hola").to_bytes_with_date("Thu Oct 15 10:00:00 2026");
        let (lines, body) = split(&bytes);

        assert_eq!(lines[0], "HTTP/1.0 200 OK");
        assert_eq!(lines[1], "Date: Thu Oct 15 10:00:00 2026");
        assert_eq!(lines[2], "Connection: close");
        assert_eq!(lines[3], format!("Server: {}", SERVER_NAME));
        assert_eq!(lines[4], "Content-Length: 4");
        assert_eq!(lines.len(), 5);
        assert_eq!(body, b"hola");
    }

    #[test]
    fn test_content_length_matches_body() {
        let bodies: Vec<Vec<u8>> = vec![
            Vec::new(),
            b"ascii".to_vec(),
            "ñandú 🦀".as_bytes().to_vec(),
            vec![0u8, 159, 146, 150, 13, 10, 13, 10],
        ];

        for body in bodies {
            let bytes = Response::new(StatusCode::Ok)
                .with_header("Content-type", "application/octet-stream")
                .with_body_bytes(body.clone())
                .to_bytes();
            let (lines, emitted) = split(&bytes);

            assert_eq!(content_length(&lines), emitted.len());
            assert_eq!(emitted, body);
        }
    }

    #[test]
    fn test_multibyte_text_length_in_bytes() {
        let response = Response::text(StatusCode::Ok, "ñ");
        let (lines, _) = split(&response.to_bytes());
        assert_eq!(content_length(&lines), 2);
    }

    #[test]
    fn test_extra_headers_without_space_in_insertion_order() {
        let bytes = Response::new(StatusCode::Found)
            .with_header("location", "https://youtu.be/katoxpnTf04")
            .with_header("X-Second", "2")
            .to_bytes_with_date("now");
        let (lines, _) = split(&bytes);

        assert_eq!(lines[0], "HTTP/1.0 302 Found");
        assert_eq!(lines[5], "location:https://youtu.be/katoxpnTf04");
        assert_eq!(lines[6], "X-Second:2");
    }

    #[test]
    fn test_duplicate_header_replaced_in_place() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-type", "text/plain")
            .with_header("X-Other", "1")
            .with_header("content-type", "text/html");

        assert_eq!(response.headers().len(), 2);
        assert_eq!(response.headers()[0], ("Content-type".to_string(), "text/html".to_string()));
    }

    #[test]
    fn test_reserved_headers_are_ignored() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Length", "999")
            .with_header("Server", "other")
            .with_body("abc");

        assert!(response.headers().is_empty());
        let (lines, _) = split(&response.to_bytes());
        assert_eq!(content_length(&lines), 3);
    }

    #[test]
    fn test_empty_body_response() {
        let bytes = Response::new(StatusCode::NotFound).to_bytes();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_html_helper() {
        let response = Response::html(StatusCode::Ok, "<p>x</p>");
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.body_text(), "<p>x</p>");
    }
}
