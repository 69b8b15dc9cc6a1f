//! # Handlers del Servidor de Archivos
//! src/handlers/mod.rs
//!
//! Cada handler recibe el directorio servido y un Request, y retorna una
//! Response ya armada. No guardan estado propio: el único efecto compartido
//! es el sistema de archivos, por lo que el mismo conjunto de handlers puede
//! usarse desde varios threads a la vez.
//!
//! ## Categorías
//!
//! - **pages**: respuestas fijas (`/`, `/video`, `/santai`, POST genérico)
//! - **files**: listado, descarga, upload y borrado de archivos

pub mod files;
pub mod pages;

pub use files::{delete_handler, files_handler, static_file_handler, upload_handler, DirectoryEntry};
pub use pages::{bad_request, index_handler, post_placeholder_handler, santai_handler, video_handler};

use std::path::{Path, PathBuf};

/// Directorio raíz desde donde se sirven y guardan archivos
#[derive(Debug, Clone)]
pub struct ServeDir {
    root: PathBuf,
}

impl ServeDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ruta de `name` dentro de la raíz
    ///
    /// El nombre se usa tal cual como ruta relativa (no se rechazan `..`);
    /// solo se quitan las `/` iniciales para no salir de la raíz por una
    /// ruta absoluta.
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::handlers::ServeDir;
    /// use std::path::Path;
    ///
    /// let dir = ServeDir::new("/srv");
    /// assert_eq!(dir.resolve("a.txt"), Path::new("/srv/a.txt"));
    /// assert_eq!(dir.resolve("/a.txt"), Path::new("/srv/a.txt"));
    /// ```
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name.trim_start_matches('/'))
    }
}

/// Escapa texto para insertarlo en HTML
pub struct HtmlEscaped<'a>(pub &'a str);

impl<'a> std::fmt::Display for HtmlEscaped<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in self.0.chars() {
            match c {
                '<' => write!(f, "&lt;")?,
                '>' => write!(f, "&gt;")?,
                '&' => write!(f, "&amp;")?,
                '\'' => write!(f, "&apos;")?,
                '"' => write!(f, "&quot;")?,
                c => write!(f, "{}", c)?,
            }
        }
        Ok(())
    }
}
