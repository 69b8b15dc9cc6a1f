//! # Handlers de Archivos
//! src/handlers/files.rs
//!
//! - `GET /files`: listado HTML del directorio con formulario de upload
//! - `GET /<nombre>`: descarga de un archivo del directorio
//! - `POST /upload`: guarda los archivos de un formulario multipart
//! - `DELETE /delete/<nombre>`: elimina un archivo (nombre URL-encoded)
//!
//! Los errores de I/O se responden con 500 e incluyen el mensaje del error.

use super::{HtmlEscaped, ServeDir};
use crate::http::multipart::{boundary_param, MultipartForm};
use crate::http::{Request, Response, StatusCode};
use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Tabla fija de tipos MIME por extensión
const EXTENSIONS_MAP: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("zip", "application/zip"),
    ("mp4", "video/mp4"),
];

const DELETE_PREFIX: &str = "/delete/";

/// Una fila del listado de `/files`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,

    /// Tamaño en bytes
    pub size: u64,

    /// Última modificación, `YYYY-MM-DD HH:MM:SS` en hora local
    pub modified: String,
}

/// Lista los archivos regulares de `root`, ordenados por nombre
///
/// Se calcula en cada llamada; no hay caché.
pub fn scan_directory(root: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        // Enlaces rotos o archivos borrados a mitad del listado no son archivos
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "skipping entry");
                continue;
            }
        };

        let modified: DateTime<Local> = metadata.modified()?.into();
        entries.push(DirectoryEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            modified: modified.format("%Y-%m-%d %H:%M:%S").to_string(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Tipo MIME según la extensión del nombre
pub fn content_type_for(name: &str) -> &'static str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            EXTENSIONS_MAP
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        })
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Handler para `GET /files`
pub fn files_handler(dir: &ServeDir, _req: &Request) -> Response {
    match scan_directory(dir.root()) {
        Ok(entries) => Response::html(StatusCode::Ok, &render_listing(&entries)),
        Err(e) => Response::text(
            StatusCode::InternalServerError,
            &format!("Error listing directory: {}", e),
        ),
    }
}

fn render_listing(entries: &[DirectoryEntry]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <title>Directory Listing</title>\n\
         <style>\n\
         table { border-collapse: collapse; width: 100%; }\n\
         th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }\n\
         th { background-color: #f2f2f2; }\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>Directory Files</h1>\n\
         <table>\n\
         <tr>\n<th>File Name</th>\n<th>Size (bytes)</th>\n<th>Last Modified</th>\n</tr>\n",
    );

    for entry in entries {
        html.push_str(&format!(
            "<tr>\n<td>{}</td>\n<td>{}</td>\n<td>{}</td>\n</tr>\n",
            HtmlEscaped(&entry.name),
            entry.size,
            entry.modified
        ));
    }

    html.push_str(
        "</table>\n\
         <br>\n\
         <h2>Upload File</h2>\n\
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" required>\n\
         <input type=\"submit\" value=\"Upload\">\n\
         </form>\n\
         </body>\n\
         </html>\n",
    );
    html
}

/// Handler para `GET /<nombre>`
///
/// Solo se sirven archivos regulares que aparecen al enumerar la raíz; las
/// subrutas y los directorios dan 404.
pub fn static_file_handler(dir: &ServeDir, req: &Request) -> Response {
    let name = &req.path()[1..];

    let listed = match fs::read_dir(dir.root()) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_string_lossy() == name && entry.path().is_file()),
        Err(e) => {
            return Response::text(
                StatusCode::InternalServerError,
                &format!("Error listing directory: {}", e),
            )
        }
    };

    if !listed {
        return Response::new(StatusCode::NotFound);
    }

    match fs::read(dir.resolve(name)) {
        Ok(content) => Response::new(StatusCode::Ok)
            .with_header("Content-type", content_type_for(name))
            .with_body_bytes(content),
        // Borrado entre la enumeración y la lectura
        Err(e) if e.kind() == io::ErrorKind::NotFound => Response::new(StatusCode::NotFound),
        Err(e) => Response::text(
            StatusCode::InternalServerError,
            &format!("Error reading file {}: {}", name, e),
        ),
    }
}

/// Handler para `POST /upload`
///
/// # Errores
/// - 400 si el Content-Type no es multipart o no trae `boundary=`
/// - 400 si el formulario no contiene archivos
/// - 500 si falla la escritura de algún archivo
pub fn upload_handler(dir: &ServeDir, req: &Request) -> Response {
    let content_type = match req.header_line("Content-Type") {
        Some(line) if line.contains("multipart/form-data") => line,
        _ => {
            return Response::text(StatusCode::BadRequest, "Invalid content type for file upload");
        }
    };

    let boundary = match boundary_param(content_type) {
        Some(b) => b,
        None => {
            return Response::text(StatusCode::BadRequest, "Missing boundary in multipart data");
        }
    };

    let form = MultipartForm::parse(req.body(), &boundary);
    if form.is_empty() {
        return Response::text(StatusCode::BadRequest, "No file found in upload");
    }

    let mut rows = String::new();
    let mut saved = Vec::with_capacity(form.len());

    for file in form.files() {
        if let Err(e) = fs::write(dir.resolve(&file.filename), &file.content) {
            warn!(filename = %file.filename, error = %e, "upload write failed");
            return Response::text(
                StatusCode::InternalServerError,
                &format!("Error saving file {}: {}", file.filename, e),
            );
        }

        let digest = format!("{:x}", Sha256::digest(&file.content));
        info!(filename = %file.filename, size = file.content.len(), sha256 = %digest, "file uploaded");

        rows.push_str(&format!(
            "<li>{} ({} bytes, sha256 {})</li>\n",
            HtmlEscaped(&file.filename),
            file.content.len(),
            digest
        ));
        saved.push(HtmlEscaped(&file.filename).to_string());
    }

    let body = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body>\n\
         <h1>Upload Successful</h1>\n\
         <p>Files uploaded: {}</p>\n\
         <ul>\n{}</ul>\n\
         <a href=\"/files\">Back to file list</a>\n\
         </body>\n\
         </html>\n",
        saved.join(", "),
        rows
    );
    Response::html(StatusCode::Ok, &body)
}

/// Handler para `DELETE /delete/<nombre>`
///
/// # Errores
/// - 400 si falta el nombre o el destino no es un archivo regular
/// - 404 si el destino no existe
/// - 500 ante cualquier otro error de I/O
pub fn delete_handler(dir: &ServeDir, req: &Request) -> Response {
    let encoded = match req.path().strip_prefix(DELETE_PREFIX) {
        Some(name) => name,
        None => {
            return Response::text(
                StatusCode::BadRequest,
                "Invalid delete URL format. Use /delete/filename",
            );
        }
    };

    if encoded.is_empty() {
        return Response::text(StatusCode::BadRequest, "No filename specified");
    }

    let name = String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_bytes())).into_owned();
    let target = dir.resolve(&name);

    let metadata = match fs::metadata(&target) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Response::text(StatusCode::NotFound, &format!("File {} not found", name));
        }
        Err(e) => {
            return Response::text(StatusCode::InternalServerError, &format!("Delete error: {}", e));
        }
    };

    if !metadata.is_file() {
        return Response::text(StatusCode::BadRequest, &format!("{} is not a file", name));
    }

    if let Err(e) = fs::remove_file(&target) {
        return Response::text(StatusCode::InternalServerError, &format!("Delete error: {}", e));
    }
    info!(filename = %name, "file deleted");

    let body = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body>\n\
         <h1>Delete Successful</h1>\n\
         <p>File '{}' has been deleted.</p>\n\
         <a href=\"/files\">Back to file list</a>\n\
         </body>\n\
         </html>\n",
        HtmlEscaped(&name)
    );
    Response::html(StatusCode::Ok, &body)
}
