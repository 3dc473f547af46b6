//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en 127.0.0.1:8000
//! 2. Acepta conexiones entrantes, una a la vez
//! 3. Lee y parsea la cabecera del request
//! 4. Responde con el archivo pedido (o el error que corresponda)
//! 5. Se detiene y libera el puerto cuando llega la señal de apagado

pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::{Server, ServerState};
