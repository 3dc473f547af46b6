//! # Archivos Estáticos
//! src/files/mod.rs
//!
//! Todo lo que toca el sistema de archivos:
//! - `resolve`: traduce el path de la URL a un path bajo el directorio raíz
//! - `mime`: deduce el Content-Type por la extensión
//! - `listing`: genera el índice HTML de un directorio sin `index.html`
//!
//! Ninguna función de este módulo escribe en disco.

pub mod listing;
pub mod mime;
pub mod resolve;

pub use resolve::{Resolution, StaticFiles};
