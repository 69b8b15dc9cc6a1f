//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 escrito desde cero para el servidor de archivos.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! POST /upload HTTP/1.0\r\n
//! Content-Type: multipart/form-data; boundary=XYZ\r\n
//! Content-Length: 123\r\n
//! \r\n
//! <bytes del body, posiblemente binarios>
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path HTTP/1.0`
//! 2. **Headers**: líneas crudas `Name: Value`, en orden de llegada
//! 3. **Empty Line**: `\r\n\r\n` separa headers del body
//! 4. **Body**: bytes crudos; nunca se decodifican como texto
//!
//! Solo el bloque de headers se decodifica a texto, y de forma tolerante:
//! los bytes UTF-8 inválidos se sustituyen en vez de producir un error.
//!
//! El path debe empezar con `/`: `GET testing.txt HTTP/1.0` es un request
//! line inválido (400), no un archivo inexistente.

/// Separador entre headers y body
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso o el listado de archivos
    GET,

    /// POST - Subir archivos (`/upload`)
    POST,

    /// DELETE - Eliminar un archivo (`/delete/<name>`)
    DELETE,
}

impl Method {
    /// Parsea un método HTTP desde un string (sin distinguir mayúsculas)
    ///
    /// # Errores
    ///
    /// Retorna error si el método no es soportado
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "DELETE" => Ok(Method::DELETE),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::DELETE => "DELETE",
        }
    }

    const ALL: [Method; 3] = [Method::GET, Method::POST, Method::DELETE];
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, POST, DELETE)
    method: Method,

    /// Path de la petición, siempre empieza con `/`
    path: String,

    /// Líneas de headers tal como llegaron (ej: "Content-Type: text/plain")
    headers: Vec<String>,

    /// Todo lo que sigue al primer `\r\n\r\n` del buffer
    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request vacío
    EmptyRequest,

    /// La request line no tiene método y path
    InvalidRequestLine,

    /// Método HTTP no soportado
    UnsupportedMethod(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::EmptyRequest => write!(f, "Empty request"),
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
        }
    }
}

impl std::error::Error for ParseError {}

impl Request {
    /// Parsea un request HTTP/1.0 desde los bytes acumulados del socket
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use file_server::http::{Method, Request};
    ///
    /// let raw = b"GET /files HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), Method::GET);
    /// assert_eq!(request.path(), "/files");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Separar el bloque de headers del body sin tocar los bytes del body
        let (head, body) = match find_bytes(buffer, HEADER_TERMINATOR) {
            Some(end) => (&buffer[..end], &buffer[end + HEADER_TERMINATOR.len()..]),
            None => (buffer, &[][..]),
        };

        let head = String::from_utf8_lossy(head);
        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
        let (method, path) = Self::parse_request_line(request_line)?;

        // Headers: toda línea no vacía hasta el terminador
        let headers = lines
            .take_while(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Request {
            method,
            path,
            headers,
            body: body.to_vec(),
        })
    }

    /// Parsea la request line (primera línea del request)
    ///
    /// Se separa por espacios simples; basta con método y path, la versión
    /// es opcional.
    fn parse_request_line(line: &str) -> Result<(Method, String), ParseError> {
        let mut parts = line.split(' ');

        let method = parts.next().ok_or(ParseError::InvalidRequestLine)?;
        let path = parts.next().ok_or(ParseError::InvalidRequestLine)?.trim();

        if !path.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(method)?;
        Ok((method, path.to_string()))
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene las líneas de headers en orden de llegada
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Busca la línea completa de un header (sin distinguir mayúsculas)
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::Request;
    ///
    /// let raw = b"POST /upload HTTP/1.0\r\ncontent-type: text/plain\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.header_line("Content-Type"), Some("content-type: text/plain"));
    /// assert_eq!(request.header("Content-Type"), Some("text/plain"));
    /// ```
    pub fn header_line(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|line| header_name_matches(line, name))
            .map(String::as_str)
    }

    /// Obtiene el valor de un header, sin espacios alrededor
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_line(name)
            .and_then(|line| line.split_once(':'))
            .map(|(_, value)| value.trim())
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Detecta si el buffer acumulado ya contiene un request completo
///
/// - Si aparece `\r\n\r\n` el request está completo, salvo que los headers
///   declaren `Content-Length` y todavía falten bytes del body.
/// - Sin terminador, se acepta como completo un buffer que termina en `\r\n`
///   y contiene un método y `HTTP` (requests sin body enviados a medias).
///   Esta heurística puede equivocarse si un header contiene `HTTP`.
///
/// # Ejemplo
/// ```
/// use file_server::http::request::is_complete;
///
/// assert!(is_complete(b"GET / HTTP/1.0\r\n\r\n"));
/// assert!(is_complete(b"GET /files HTTP/1.0\r\n"));
/// assert!(!is_complete(b"GET /files HTTP/1.0"));
/// assert!(!is_complete(b"POST /upload HTTP/1.0\r\nContent-Length: 10\r\n\r\nhello"));
/// ```
pub fn is_complete(buffer: &[u8]) -> bool {
    match find_bytes(buffer, HEADER_TERMINATOR) {
        Some(end) => {
            let received = buffer.len() - (end + HEADER_TERMINATOR.len());
            match declared_content_length(&buffer[..end]) {
                Some(expected) => received >= expected,
                None => true,
            }
        }
        None => {
            buffer.ends_with(b"\r\n")
                && Method::ALL
                    .iter()
                    .any(|method| find_bytes(buffer, method.as_str().as_bytes()).is_some())
                && find_bytes(buffer, b"HTTP").is_some()
                && declared_content_length(buffer).is_none()
        }
    }
}

/// Extrae el valor de `Content-Length` de un bloque de headers, si existe
fn declared_content_length(head: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(head)
        .split("\r\n")
        .skip(1)
        .find(|line| header_name_matches(line, "Content-Length"))
        .and_then(|line| line.split_once(':'))
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Compara el nombre de una línea `Name: Value` sin distinguir mayúsculas
fn header_name_matches(line: &str, name: &str) -> bool {
    line.split_once(':')
        .map(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

/// Busca la primera aparición de `needle` dentro de `haystack`
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert!(request.headers().is_empty());
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_parse_lowercase_method() {
        let raw = b"delete /delete/a.txt HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.path(), "/delete/a.txt");
    }

    #[test]
    fn test_parse_with_headers() {
        let raw = b"GET / HTTP/1.0\r\nHost: localhost:8885\r\nUser-Agent: test\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.headers()[0], "Host: localhost:8885");
        assert_eq!(request.header("host"), Some("localhost:8885"));
        assert_eq!(request.header("USER-AGENT"), Some("test"));
        assert_eq!(request.header("Accept"), None);
    }

    #[test]
    fn test_headers_stop_at_terminator() {
        let raw = b"POST /x HTTP/1.0\r\nA: 1\r\n\r\nnot: a header\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.headers(), &["A: 1".to_string()]);
        assert_eq!(request.body(), b"not: a header\r\n");
    }

    #[test]
    fn test_body_keeps_binary_bytes() {
        let mut raw = b"POST /upload HTTP/1.0\r\nContent-Length: 4\r\n\r\n".to_vec();
        raw.extend_from_slice(&[0xFF, 0x00, 0xC3, 0x28]);
        let request = Request::parse(&raw).unwrap();

        assert_eq!(request.body(), &[0xFF, 0x00, 0xC3, 0x28]);
    }

    #[test]
    fn test_invalid_utf8_in_headers_is_tolerated() {
        let raw = b"GET /files HTTP/1.0\r\nX-Name: \xFF\xFE\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/files");
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn test_request_without_terminator() {
        let raw = b"GET /files HTTP/1.0\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/files");
        assert!(request.body().is_empty());
    }

    #[test_case(b"GET\r\n\r\n" ; "missing path")]
    #[test_case(b"GET" ; "single token")]
    #[test_case(b"GET  /x HTTP/1.0\r\n\r\n" ; "double space")]
    #[test_case(b"GET files HTTP/1.0\r\n\r\n" ; "relative path")]
    #[test_case(b"GET testing.txt HTTP/1.0\r\n\r\n" ; "relative file name")]
    fn test_invalid_request_line(raw: &[u8]) {
        assert_eq!(Request::parse(raw).unwrap_err(), ParseError::InvalidRequestLine);
    }

    #[test]
    fn test_unsupported_method() {
        let raw = b"PUT /x HTTP/1.0\r\n\r\n";
        let result = Request::parse(raw);

        assert!(matches!(result, Err(ParseError::UnsupportedMethod(m)) if m == "PUT"));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
        assert_eq!(Request::parse(b"  \r\n\r\n").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test_case(b"GET / HTTP/1.0\r\n\r\n", true ; "terminated get")]
    #[test_case(b"GET /files HTTP/1.0\r\n", true ; "bare get with crlf")]
    #[test_case(b"DELETE /delete/a HTTP/1.0\r\n", true ; "bare delete with crlf")]
    #[test_case(b"GET /files HTTP/1.0", false ; "no crlf yet")]
    #[test_case(b"GET /files\r\n", false ; "no http token")]
    #[test_case(b"POST /upload HTTP/1.0\r\nContent-Length: 5\r\n", false ; "headers still arriving")]
    #[test_case(b"POST /upload HTTP/1.0\r\nContent-Length: 5\r\n\r\nhel", false ; "partial body")]
    #[test_case(b"POST /upload HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello", true ; "full body")]
    #[test_case(b"POST /upload HTTP/1.0\r\ncontent-length: 2\r\n\r\nhello", true ; "more than declared")]
    #[test_case(b"POST /upload HTTP/1.0\r\nContent-Length: abc\r\n\r\n", true ; "invalid length ignored")]
    fn test_is_complete(buffer: &[u8], expected: bool) {
        assert_eq!(is_complete(buffer), expected);
    }

    #[test]
    fn test_find_bytes() {
        assert_eq!(find_bytes(b"abc\r\n\r\ndef", HEADER_TERMINATOR), Some(3));
        assert_eq!(find_bytes(b"abc", HEADER_TERMINATOR), None);
        assert_eq!(find_bytes(b"", b"x"), None);
    }
}
