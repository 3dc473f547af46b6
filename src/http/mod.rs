//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementación mínima del protocolo HTTP/1.0 para servir archivos:
//!
//! - Parsing de la cabecera del request (GET y HEAD)
//! - Construcción de responses HTTP/1.0
//! - Manejo de status codes
//!
//! ## Especificación HTTP/1.0
//!
//! El protocolo HTTP/1.0 (RFC 1945) es más simple que HTTP/1.1:
//! - No requiere el header `Host`
//! - No tiene chunked transfer encoding
//! - No mantiene conexiones persistentes por defecto
//!
//! Un cliente HTTP/1.1 recibe igualmente una respuesta `HTTP/1.0` y la
//! conexión se cierra al terminar.

pub mod date;      // Fechas Date / Last-Modified
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
