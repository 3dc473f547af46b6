//! # Crane Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de archivos estáticos para el crane game. Escucha en
//! `127.0.0.1:8000`, sirve el directorio donde está el ejecutable y se
//! apaga ordenadamente con Ctrl+C.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing de requests y construcción de responses HTTP/1.0
//! - `files`: Resolución de paths, tipos MIME y listados de directorio
//! - `handler`: Traduce un request a la respuesta con el archivo
//! - `server`: Socket TCP, accept loop y ciclo de vida
//! - `shutdown`: Token de cancelación y escucha de señales
//! - `config`, `error`, `logging`: Configuración, errores y logs
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use crane_server::config::Config;
//! use crane_server::server::Server;
//! use crane_server::shutdown::{self, ShutdownSignal};
//!
//! # fn main() -> crane_server::error::Result<()> {
//! let signal = ShutdownSignal::new();
//! shutdown::listen_for_signals(signal.clone())?;
//!
//! let mut server = Server::new(Config::for_current_exe()?, signal);
//! server.run()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod files;
pub mod handler;
pub mod http;
pub mod logging;
pub mod server;
pub mod shutdown;
