//! # Crane Server - Entry Point
//! src/main.rs
//!
//! Sirve el crane game en http://127.0.0.1:8000/index.html hasta recibir
//! Ctrl+C. No recibe argumentos.

use crane_server::config::Config;
use crane_server::error::Result;
use crane_server::logging;
use crane_server::server::Server;
use crane_server::shutdown::{self, ShutdownSignal};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Error fatal");
            eprintln!("💥 Error fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = Config::for_current_exe()?;

    let signal = ShutdownSignal::new();
    shutdown::listen_for_signals(signal.clone())?;

    let mut server = Server::new(config, signal);
    server.bind()?;
    println!("Serving crane game at {}", server.serving_url());

    server.serve()?;
    println!("\nShutting down server...");
    Ok(())
}
