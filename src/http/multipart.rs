//! # Decodificador multipart/form-data
//! src/http/multipart.rs
//!
//! Extrae los archivos de un body `multipart/form-data`. El body se recorre
//! como bytes en todo momento, así que los archivos binarios llegan intactos.
//!
//! ```text
//! --BOUNDARY\r\n
//! Content-Disposition: form-data; name="file"; filename="a.txt"\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! <contenido>\r\n
//! --BOUNDARY--\r\n
//! ```

use super::request::{find_bytes, HEADER_TERMINATOR};
use regex::Regex;
use std::sync::OnceLock;

/// Un archivo recibido en una parte del formulario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Nombre tomado de `filename=` (sin comillas)
    pub filename: String,

    /// Contenido crudo, sin el `\r\n` que precede al siguiente delimitador
    pub content: Vec<u8>,
}

/// Archivos de un formulario, en orden de aparición
///
/// Si dos partes comparten nombre, la posterior reemplaza a la anterior
/// conservando su posición.
#[derive(Debug, Default, Clone)]
pub struct MultipartForm {
    files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Decodifica `body` usando el token `boundary` del header Content-Type
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::MultipartForm;
    ///
    /// let body = b"--xyz\r\n\
    ///     Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
    ///     \r\n\
    ///     hola\r\n\
    ///     --xyz--\r\n";
    /// let form = MultipartForm::parse(body, "xyz");
    ///
    /// assert_eq!(form.len(), 1);
    /// assert_eq!(form.get("a.txt"), Some(&b"hola"[..]));
    /// ```
    pub fn parse(body: &[u8], boundary: &str) -> Self {
        let delimiter = format!("--{}", boundary).into_bytes();
        let mut form = MultipartForm::default();

        for segment in split_bytes(body, &delimiter) {
            if let Some(file) = Self::parse_part(segment) {
                form.insert(file);
            }
        }

        form
    }

    /// Convierte una parte en archivo; `None` si no tiene `filename=`
    fn parse_part(segment: &[u8]) -> Option<UploadedFile> {
        let disposition = segment
            .split(|&b| b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .find(|line| find_bytes(line, b"Content-Disposition").is_some())?;

        let filename = filename_param(&String::from_utf8_lossy(disposition))?;

        let start = find_bytes(segment, HEADER_TERMINATOR)? + HEADER_TERMINATOR.len();
        let content = &segment[start..];
        let content = content.strip_suffix(b"\r\n").unwrap_or(content);

        Some(UploadedFile {
            filename,
            content: content.to_vec(),
        })
    }

    fn insert(&mut self, file: UploadedFile) {
        match self.files.iter_mut().find(|f| f.filename == file.filename) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    /// Contenido del archivo con ese nombre
    pub fn get(&self, filename: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|f| f.filename == filename)
            .map(|f| f.content.as_slice())
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<UploadedFile> {
        self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Extrae el token `boundary=` de un valor Content-Type
///
/// Retorna `None` si no hay boundary o está vacío.
///
/// # Ejemplo
/// ```
/// use file_server::http::multipart::boundary_param;
///
/// assert_eq!(
///     boundary_param("Content-Type: multipart/form-data; boundary=----abc"),
///     Some("----abc".to_string())
/// );
/// assert_eq!(boundary_param("multipart/form-data"), None);
/// ```
pub fn boundary_param(content_type: &str) -> Option<String> {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let re = BOUNDARY.get_or_init(|| Regex::new(r"boundary=(.*)").expect("valid boundary regex"));

    re.captures(content_type)
        .map(|caps| caps[1].trim().trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
}

/// Extrae `filename=` de una línea Content-Disposition, quitando comillas
fn filename_param(disposition: &str) -> Option<String> {
    static FILENAME: OnceLock<Regex> = OnceLock::new();
    let re = FILENAME.get_or_init(|| Regex::new(r"filename=(.*)").expect("valid filename regex"));

    re.captures(disposition)
        .map(|caps| caps[1].trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Divide `data` en cada aparición de `delimiter` (como `bytes.split`)
fn split_bytes<'a>(data: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut rest = data;

    while let Some(pos) = find_bytes(rest, delimiter) {
        segments.push(&rest[..pos]);
        rest = &rest[pos + delimiter.len()..];
    }
    segments.push(rest);

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(filename: &str, content: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "--B0UND\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            filename
        )
        .into_bytes();
        out.extend_from_slice(content);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn finish(mut body: Vec<u8>) -> Vec<u8> {
        body.extend_from_slice(b"--B0UND--\r\n");
        body
    }

    #[test]
    fn test_two_file_parts() {
        let mut body = part("a.txt", b"first");
        body.extend(part("b.txt", b"second"));
        let form = MultipartForm::parse(&finish(body), "B0UND");

        assert_eq!(form.len(), 2);
        assert_eq!(form.get("a.txt"), Some(&b"first"[..]));
        assert_eq!(form.get("b.txt"), Some(&b"second"[..]));
    }

    #[test]
    fn test_binary_content_is_preserved() {
        let content: Vec<u8> = (0..=255u8).chain([b'\r', b'\n', b'-', b'-']).collect();
        let form = MultipartForm::parse(&finish(part("bin.dat", &content)), "B0UND");

        assert_eq!(form.get("bin.dat"), Some(content.as_slice()));
    }

    #[test]
    fn test_only_one_trailing_crlf_removed() {
        let form = MultipartForm::parse(&finish(part("lines.txt", b"a\r\nb\r\n")), "B0UND");
        assert_eq!(form.get("lines.txt"), Some(&b"a\r\nb\r\n"[..]));
    }

    #[test]
    fn test_field_without_filename_is_skipped() {
        let mut body = b"--B0UND\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhola\r\n".to_vec();
        body.extend(part("a.txt", b"x"));
        let form = MultipartForm::parse(&finish(body), "B0UND");

        assert_eq!(form.len(), 1);
        assert!(form.get("note").is_none());
    }

    #[test]
    fn test_empty_filename_is_skipped() {
        let form = MultipartForm::parse(&finish(part("", b"x")), "B0UND");
        assert!(form.is_empty());
    }

    #[test]
    fn test_duplicate_filename_later_wins() {
        let mut body = part("dup.txt", b"old");
        body.extend(part("other.txt", b"o"));
        body.extend(part("dup.txt", b"new"));
        let form = MultipartForm::parse(&finish(body), "B0UND");

        assert_eq!(form.len(), 2);
        assert_eq!(form.files()[0].filename, "dup.txt");
        assert_eq!(form.get("dup.txt"), Some(&b"new"[..]));
    }

    #[test]
    fn test_unknown_boundary_keeps_body_as_one_part() {
        // Sin delimitador que coincida, el body entero es una sola parte
        let form = MultipartForm::parse(&finish(part("a.txt", b"x")), "OTHER");
        assert_eq!(form.len(), 1);
        assert_eq!(form.get("a.txt"), Some(&b"x\r\n--B0UND--"[..]));
    }

    #[test]
    fn test_empty_body() {
        assert!(MultipartForm::parse(b"", "B0UND").is_empty());
    }

    #[test]
    fn test_boundary_param() {
        assert_eq!(
            boundary_param("Content-Type: multipart/form-data; boundary=\"quoted\" "),
            Some("quoted".to_string())
        );
        assert_eq!(boundary_param("multipart/form-data; boundary="), None);
    }

    #[test]
    fn test_filename_param() {
        assert_eq!(
            filename_param("Content-Disposition: form-data; name=\"file\"; filename=\"my file.txt\""),
            Some("my file.txt".to_string())
        );
        assert_eq!(filename_param("Content-Disposition: form-data; name=\"file\""), None);
    }
}
