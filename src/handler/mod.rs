//! # Handler de Archivos Estáticos
//! src/handler/mod.rs
//!
//! Convierte un request parseado en una respuesta:
//!
//! ```text
//! Request → StaticFiles::resolve → (archivo | listado | redirect | 404) → Response
//! ```
//!
//! No hay rutas registradas: cada path se interpreta como un archivo bajo
//! el directorio raíz.

use crate::files::{listing, mime, Resolution, StaticFiles};
use crate::http::date::{format_http_date, parse_http_date};
use crate::http::{Method, Request, Response, StatusCode};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Valor del header `Server`
pub const SERVER_NAME: &str = concat!("crane_server/", env!("CARGO_PKG_VERSION"));

/// Atiende requests GET/HEAD sirviendo archivos del directorio raíz
#[derive(Debug, Clone)]
pub struct FileHandler {
    files: StaticFiles,
}

impl FileHandler {
    /// `root` debe ser canónico (lo que retorna `Config::validate`)
    pub fn new(root: PathBuf) -> Self {
        Self {
            files: StaticFiles::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.files.root()
    }

    /// Genera la respuesta para un request
    pub fn handle(&self, request: &Request) -> Response {
        let resolution = self.files.resolve(request.path(), request.query());
        debug!(path = request.path(), ?resolution, "path resuelto");

        let mut response = match resolution {
            Resolution::File(path) => self.serve_file(request, &path),
            Resolution::Listing(dir) => match listing::render(&dir, request.path()) {
                Ok(html) => Response::html(&html),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "no se pudo listar el directorio");
                    Response::error(StatusCode::NotFound, "No permission to list directory")
                }
            },
            Resolution::Redirect(location) => Response::redirect(&location),
            Resolution::NotFound => Response::error(StatusCode::NotFound, "File not found"),
        };

        add_common_headers(&mut response);
        response
    }

    /// Sirve un archivo regular, con soporte de `If-Modified-Since`
    fn serve_file(&self, request: &Request, path: &Path) -> Response {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "metadata no disponible");
                return Response::error(StatusCode::NotFound, "File not found");
            }
        };
        let last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        if let Some(modified) = last_modified {
            if is_not_modified(request, modified) {
                return Response::new(StatusCode::NotModified)
                    .with_header("Last-Modified", &format_http_date(modified));
            }
        }

        let mut response = match request.method() {
            // HEAD no lee el archivo: solo anuncia su tamaño
            Method::HEAD => Response::new(StatusCode::Ok)
                .with_header("Content-Length", &metadata.len().to_string()),
            Method::GET => match fs::read(path) {
                Ok(bytes) => Response::new(StatusCode::Ok).with_body_bytes(bytes),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "no se pudo leer el archivo");
                    return Response::error(StatusCode::NotFound, "File not found");
                }
            },
        };

        response.add_header("Content-Type", mime::content_type(path));
        if let Some(modified) = last_modified {
            response.add_header("Last-Modified", &format_http_date(modified));
        }
        response
    }
}

/// `true` si el cliente ya tiene la versión actual del archivo
///
/// `If-None-Match` tiene prioridad: si viene, se ignora `If-Modified-Since`.
fn is_not_modified(request: &Request, modified: DateTime<Utc>) -> bool {
    if request.header("If-None-Match").is_some() {
        return false;
    }
    let Some(since) = request.header("If-Modified-Since").and_then(parse_http_date) else {
        return false;
    };
    // Last-Modified solo tiene resolución de segundos
    modified.timestamp() <= since.timestamp()
}

/// Agrega headers comunes a todas las respuestas
pub fn add_common_headers(response: &mut Response) {
    response.add_header("Server", SERVER_NAME);
    response.add_header("Date", &format_http_date(Utc::now()));
    response.add_header("Connection", "close");
}
