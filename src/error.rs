//! # Errores del Servidor
//! src/error.rs
//!
//! Errores fatales: terminan el proceso con código distinto de cero.
//! Los problemas de un request individual (archivo inexistente, path
//! inválido, request malformado) no pasan por aquí, se convierten en
//! respuestas 4xx/5xx y el servidor sigue atendiendo.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No se pudo hacer bind en {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Configuración inválida: {0}")]
    Config(String),

    #[error("Directorio raíz inválido {}: {reason}", .path.display())]
    RootDir { path: PathBuf, reason: String },

    #[error("No se pudo determinar la ubicación del ejecutable: {0}")]
    CurrentExe(#[source] io::Error),

    #[error("No se pudo instalar el manejador de señales: {0}")]
    SignalHandler(#[source] io::Error),

    #[error("El servidor no tiene un socket abierto (falta llamar a bind)")]
    NotBound,

    #[error("Error de IO: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    /// `true` si el bind falló porque otro proceso ya usa la dirección
    pub fn is_addr_in_use(&self) -> bool {
        matches!(self, ServerError::Bind { source, .. } if source.kind() == io::ErrorKind::AddrInUse)
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
