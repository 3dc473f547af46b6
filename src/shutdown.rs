//! # Apagado Ordenado
//! src/shutdown.rs
//!
//! `ShutdownSignal` es un token de cancelación compartido entre el thread
//! que escucha señales del sistema operativo y el accept loop del
//! servidor. El accept loop lo consulta entre conexiones y también mientras
//! espera la cabecera de un request; cuando está activado deja de aceptar,
//! libera el socket y retorna.
//!
//! ```text
//! SIGINT / SIGTERM → thread de señales → ShutdownSignal::trigger()
//!                                              ↓
//!                        accept loop → is_triggered() → STOPPING → STOPPED
//! ```

use crate::error::{Result, ServerError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// Token de cancelación clonable
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pide el apagado. Llamarlo más de una vez no tiene efecto extra.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

/// Lanza un thread que activa `signal` al recibir Ctrl+C (o SIGTERM en Unix)
///
/// El thread corre un runtime de tokio de un solo hilo solo para esperar
/// la señal; el servidor en sí sigue siendo síncrono. En Unix los handlers
/// ya están instalados cuando esta función retorna, así que una señal que
/// llegue justo después no mata el proceso.
pub fn listen_for_signals(signal: ShutdownSignal) -> Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ServerError::SignalHandler)?;

    let listener = {
        let _guard = runtime.enter();
        SignalListener::install().map_err(ServerError::SignalHandler)?
    };

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match listener.recv().await {
                    Ok(name) => info!(signal = name, "Señal de apagado recibida"),
                    Err(e) => {
                        error!(error = %e, "Error esperando la señal de apagado");
                        return;
                    }
                }
                signal.trigger();
            });
        })
        .map_err(ServerError::SignalHandler)
}

/// Streams de SIGINT y SIGTERM, registrados al crearse
#[cfg(unix)]
struct SignalListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    /// Requiere estar dentro del contexto de un runtime
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Espera SIGINT (Ctrl+C) o SIGTERM y retorna el nombre de la que llegó
    async fn recv(mut self) -> std::io::Result<&'static str> {
        tokio::select! {
            _ = self.interrupt.recv() => Ok("SIGINT"),
            _ = self.terminate.recv() => Ok("SIGTERM"),
        }
    }
}

#[cfg(not(unix))]
struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(self) -> std::io::Result<&'static str> {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }
}
