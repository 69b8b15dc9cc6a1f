//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementa el subconjunto de HTTP/1.0 que necesita el servidor de
//! archivos, sin librerías de alto nivel:
//!
//! - Parsing de requests y detección de request completo
//! - Decodificación de uploads `multipart/form-data`
//! - Construcción de responses HTTP/1.0
//! - Manejo de status codes
//!
//! ## Especificación HTTP/1.0
//!
//! - No requiere el header `Host`
//! - No hay chunked transfer encoding
//! - Una conexión por request (`Connection: close`)
//!
//! ### Formato de Request
//!
//! ```text
//! DELETE /delete/mi%20archivo.txt HTTP/1.0\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 404 Not Found\r\n
//! Date: ...\r\n
//! Connection: close\r\n
//! Server: file_server/0.1.0\r\n
//! Content-Length: 29\r\n
//! \r\n
//! File mi archivo.txt not found
//! ```

pub mod multipart; // Decodificación de multipart/form-data
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use multipart::{MultipartForm, UploadedFile};
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
