//! # Páginas fijas
//! src/handlers/pages.rs

use super::ServeDir;
use crate::http::{Request, Response, StatusCode};

/// Body de `GET /`
pub const GREETING: &str = "Ini Adalah web Server percobaan";

/// Destino de `GET /video`
pub const VIDEO_URL: &str = "https://youtu.be/katoxpnTf04";

/// Body de `GET /santai`
pub const SANTAI: &str = "santai saja";

/// Body de cualquier POST que no sea `/upload`
pub const POST_PLACEHOLDER: &str = "kosong";

/// Handler para `GET /`
pub fn index_handler(_dir: &ServeDir, _req: &Request) -> Response {
    Response::text(StatusCode::Ok, GREETING)
}

/// Handler para `GET /video`: redirección 302
pub fn video_handler(_dir: &ServeDir, _req: &Request) -> Response {
    Response::redirect(VIDEO_URL)
}

/// Handler para `GET /santai`
pub fn santai_handler(_dir: &ServeDir, _req: &Request) -> Response {
    Response::text(StatusCode::Ok, SANTAI)
}

/// Handler para POST a cualquier ruta distinta de `/upload`
pub fn post_placeholder_handler(_dir: &ServeDir, _req: &Request) -> Response {
    Response::text(StatusCode::Ok, POST_PLACEHOLDER)
}

/// 400 para requests malformados o métodos no soportados
pub fn bad_request(reason: &str) -> Response {
    Response::text(StatusCode::BadRequest, &format!("Bad Request: {}", reason))
}
