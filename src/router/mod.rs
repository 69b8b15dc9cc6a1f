//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a un handler.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler(ServeDir, Request) → Response
//! ```
//!
//! Las rutas se evalúan en orden de registro y gana la primera que coincide,
//! así que las rutas exactas deben registrarse antes que los comodines del
//! mismo método. Si ninguna coincide se responde 400.

use crate::handlers::{self, ServeDir};
use crate::http::{Method, Request, Response, StatusCode};

/// Tipo de función handler
///
/// Un handler recibe el directorio servido y un Request, y retorna una Response
pub type Handler = fn(&ServeDir, &Request) -> Response;

/// Forma de comparar el path de una ruta
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatcher {
    /// El path debe ser idéntico
    Exact(String),

    /// El path debe empezar con el prefijo
    Prefix(String),

    /// Cualquier path
    Any,
}

impl PathMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(expected) => path == expected,
            PathMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathMatcher::Any => true,
        }
    }
}

struct Route {
    method: Method,
    matcher: PathMatcher,
    handler: Handler,
}

/// Router que mapea (método, path) a handlers
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Crea un router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta de path exacto
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::handlers::ServeDir;
    /// use file_server::http::{Method, Request, Response, StatusCode};
    /// use file_server::router::Router;
    ///
    /// fn hello_handler(_dir: &ServeDir, _req: &Request) -> Response {
    ///     Response::text(StatusCode::Ok, "hello")
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello", hello_handler);
    ///
    /// let request = Request::parse(b"GET /hello HTTP/1.0\r\n\r\n").unwrap();
    /// let response = router.route(&ServeDir::new("."), &request);
    /// assert_eq!(response.body(), b"hello");
    /// ```
    pub fn register(&mut self, method: Method, path: &str, handler: Handler) {
        self.register_matcher(method, PathMatcher::Exact(path.to_string()), handler);
    }

    /// Registra una ruta para todos los paths con el prefijo dado
    pub fn register_prefix(&mut self, method: Method, prefix: &str, handler: Handler) {
        self.register_matcher(method, PathMatcher::Prefix(prefix.to_string()), handler);
    }

    /// Registra una ruta que acepta cualquier path del método
    pub fn register_fallback(&mut self, method: Method, handler: Handler) {
        self.register_matcher(method, PathMatcher::Any, handler);
    }

    fn register_matcher(&mut self, method: Method, matcher: PathMatcher, handler: Handler) {
        self.routes.push(Route {
            method,
            matcher,
            handler,
        });
    }

    /// Tabla de rutas del servidor de archivos
    ///
    /// | Método | Path          | Handler                      |
    /// |--------|---------------|------------------------------|
    /// | GET    | `/`           | saludo                       |
    /// | GET    | `/video`      | redirección 302              |
    /// | GET    | `/santai`     | texto fijo                   |
    /// | GET    | `/files`      | listado del directorio       |
    /// | GET    | otro          | archivo del directorio       |
    /// | POST   | `/upload`     | upload multipart             |
    /// | POST   | otro          | texto fijo `kosong`          |
    /// | DELETE | `/delete/...` | borrado                      |
    /// | DELETE | otro          | 400 formato inválido         |
    pub fn file_server() -> Self {
        let mut router = Self::new();

        router.register(Method::GET, "/", handlers::index_handler);
        router.register(Method::GET, "/video", handlers::video_handler);
        router.register(Method::GET, "/santai", handlers::santai_handler);
        router.register(Method::GET, "/files", handlers::files_handler);
        router.register_fallback(Method::GET, handlers::static_file_handler);

        router.register(Method::POST, "/upload", handlers::upload_handler);
        router.register_fallback(Method::POST, handlers::post_placeholder_handler);

        router.register_prefix(Method::DELETE, "/delete/", handlers::delete_handler);
        router.register_fallback(Method::DELETE, invalid_delete_handler);

        router
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// Si ninguna ruta coincide, retorna 400 Bad Request.
    pub fn route(&self, dir: &ServeDir, request: &Request) -> Response {
        let path = request.path();

        match self
            .routes
            .iter()
            .find(|route| route.method == request.method() && route.matcher.matches(path))
        {
            Some(route) => (route.handler)(dir, request),
            None => handlers::bad_request(&format!(
                "No route for {} {}",
                request.method().as_str(),
                path
            )),
        }
    }

    /// Número de rutas registradas
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::file_server()
    }
}

fn invalid_delete_handler(_dir: &ServeDir, _req: &Request) -> Response {
    Response::text(
        StatusCode::BadRequest,
        "Invalid delete URL format. Use /delete/filename",
    )
}
