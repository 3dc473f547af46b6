//! # Logging
//! src/logging.rs
//!
//! Diagnósticos y access log van a stderr vía `tracing`. El filtro por
//! defecto es `crane_server=info` y se puede cambiar con `RUST_LOG`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "crane_server=info";

/// Inicializa el subscriber global. Llamar una sola vez desde `main`.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();
}
