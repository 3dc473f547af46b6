//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser de la cabecera de un request HTTP/1.0 (y HTTP/1.1 en modo 1.0).
//! El servidor solo lee archivos, así que el body se ignora.
//!
//! ## Formato de un Request
//!
//! ```text
//! GET /index.html?v=2 HTTP/1.0\r\n
//! Host: 127.0.0.1:8000\r\n
//! If-Modified-Since: Sun, 06 Nov 1994 08:49:37 GMT\r\n
//! \r\n
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.x`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que cierra la cabecera

use super::StatusCode;
use std::collections::HashMap;
use thiserror::Error;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un archivo
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// `UnsupportedMethod` si es un token válido pero no es GET/HEAD,
    /// `InvalidRequestLine` si ni siquiera es un token.
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase()) => {
                Err(ParseError::UnsupportedMethod(s.to_string()))
            }
            _ => Err(ParseError::InvalidRequestLine),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        }
    }
}

/// Representa un request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, HEAD)
    method: Method,

    /// Path de la petición tal cual llegó, sin query ni fragmento (ej: "/web/main.js")
    path: String,

    /// Query string cruda, sin el '?' (ej: "v=2")
    query: Option<String>,

    /// Headers HTTP con el nombre en minúsculas
    headers: HashMap<String, String>,

    /// Versión HTTP ("HTTP/1.0" o "HTTP/1.1")
    version: String,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Método HTTP no soportado
    #[error("Unsupported method ({0})")]
    UnsupportedMethod(String),

    /// Versión HTTP mal formada
    #[error("Bad request version ({0})")]
    InvalidHttpVersion(String),

    /// Versión HTTP bien formada pero >= 2.0
    #[error("Invalid HTTP version ({0})")]
    UnsupportedHttpVersion(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ParseError {
    /// Código de estado con el que se responde a este error
    ///
    /// # Ejemplo
    /// ```
    /// use crane_server::http::{Request, StatusCode};
    ///
    /// let err = Request::parse(b"POST / HTTP/1.0\r\n\r\n").unwrap_err();
    /// assert_eq!(err.status(), StatusCode::NotImplemented);
    /// ```
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedMethod(_) => StatusCode::NotImplemented,
            ParseError::UnsupportedHttpVersion(_) => StatusCode::HttpVersionNotSupported,
            _ => StatusCode::BadRequest,
        }
    }
}

impl Request {
    /// Parsea la cabecera de un request HTTP desde bytes
    ///
    /// # Argumentos
    ///
    /// * `buffer` - Bytes del request hasta (e incluyendo) la línea vacía
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use crane_server::http::Request;
    ///
    /// let raw = b"GET /index.html?v=2 HTTP/1.0\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/index.html");
    /// assert_eq!(request.query(), Some("v=2"));
    /// assert_eq!(request.header("host"), Some("localhost"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Se ignoran líneas vacías antes de la request line
        let start = buffer
            .iter()
            .position(|b| !matches!(b, b'\r' | b'\n'))
            .ok_or(ParseError::EmptyRequest)?;
        let buffer = &buffer[start..];

        let (line_bytes, header_bytes) = match buffer.iter().position(|&b| b == b'\n') {
            Some(pos) => (&buffer[..pos], &buffer[pos + 1..]),
            None => (buffer, &[][..]),
        };

        // Solo la request line tiene que ser UTF-8 válido
        let request_line = std::str::from_utf8(line_bytes)
            .map_err(|_| ParseError::InvalidRequestLine)?
            .trim_end_matches('\r');
        if request_line.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let (method, path, query, version) = Self::parse_request_line(request_line)?;

        // Los headers se decodifican como latin-1: cualquier byte es válido.
        // `lines()` acepta tanto \r\n como \n
        let header_text: String = header_bytes.iter().map(|&b| char::from(b)).collect();
        let headers = Self::parse_headers(header_text.lines())?;

        Ok(Request {
            method,
            path,
            query,
            headers,
            version,
        })
    }

    /// Parsea la request line (primera línea del request)
    ///
    /// La versión se valida antes que el método para que un `HTTP/2.0`
    /// reciba 505 aunque el método tampoco esté soportado.
    fn parse_request_line(
        line: &str,
    ) -> Result<(Method, String, Option<String>, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD PATH VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let version = Self::parse_version(parts[2])?;
        let method = Method::from_str(parts[0])?;
        let (path, query) = Self::parse_target(parts[1])?;

        Ok((method, path, query, version))
    }

    /// Valida `HTTP/<major>.<minor>`
    fn parse_version(version: &str) -> Result<String, ParseError> {
        let invalid = || ParseError::InvalidHttpVersion(version.to_string());

        let numbers = version.strip_prefix("HTTP/").ok_or_else(invalid)?;
        let (major, minor) = numbers.split_once('.').ok_or_else(invalid)?;
        let major: u32 = major.parse().map_err(|_| invalid())?;
        let _minor: u32 = minor.parse().map_err(|_| invalid())?;

        if major >= 2 {
            return Err(ParseError::UnsupportedHttpVersion(version.to_string()));
        }
        Ok(version.to_string())
    }

    /// Separa el path de la query string y descarta el fragmento
    ///
    /// Ejemplo: "/web/main.js?v=2#top"
    /// Retorna: ("/web/main.js", Some("v=2"))
    fn parse_target(target: &str) -> Result<(String, Option<String>), ParseError> {
        if !target.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }

        let without_fragment = target.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (without_fragment, None),
        };

        // "//host/x" no debe poder interpretarse como URL absoluta en un Location
        let path = format!("/{}", path.trim_start_matches('/'));

        Ok((path, query))
    }

    /// Parsea los headers HTTP
    ///
    /// Cada header tiene formato: "Name: Value"
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            // La línea vacía marca el fin de los headers
            if line.trim().is_empty() {
                break;
            }

            match line.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                _ => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path del request (sin decodificar)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene la query string cruda
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Obtiene todos los headers (nombres en minúsculas)
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico, sin distinguir mayúsculas
    ///
    /// # Ejemplo
    /// ```
    /// use crane_server::http::Request;
    ///
    /// let raw = b"GET / HTTP/1.0\r\nUser-Agent: curl\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.header("User-Agent"), Some("curl"));
    /// assert_eq!(request.header("user-agent"), Some("curl"));
    /// assert_eq!(request.header("Accept"), None);
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }
}
