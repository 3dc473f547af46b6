//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Accept loop de un solo thread: cada conexión se atiende completa antes
//! de aceptar la siguiente. El listener es no bloqueante para poder
//! revisar la señal de apagado cada `poll_interval`.
//!
//! ## Ciclo de vida
//!
//! ```text
//! STARTING --bind()--> (socket abierto) --serve()--> SERVING
//!     SERVING --señal--> STOPPING --socket liberado--> STOPPED
//! ```

use crate::config::{Config, START_PAGE};
use crate::error::{Result, ServerError};
use crate::handler::{add_common_headers, FileHandler};
use crate::http::{Method, Request, Response, StatusCode};
use crate::shutdown::ShutdownSignal;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Estados del servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Starting,
    Serving,
    Stopping,
    Stopped,
}

/// Servidor HTTP/1.0 de archivos estáticos
pub struct Server {
    config: Config,
    shutdown: ShutdownSignal,
    state: ServerState,
    handler: Option<FileHandler>,
    listener: Option<TcpListener>,
}

impl Server {
    pub fn new(config: Config, shutdown: ShutdownSignal) -> Self {
        Self {
            config,
            shutdown,
            state: ServerState::Starting,
            handler: None,
            listener: None,
        }
    }

    /// Valida la raíz y abre el socket. No reintenta si el puerto está ocupado.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let root = self.config.validate()?;
        let address = self.config.address();

        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        info!(address = %local_addr, root = %root.display(), "Socket abierto");

        self.handler = Some(FileHandler::new(root));
        self.listener = Some(listener);
        Ok(local_addr)
    }

    /// Atiende conexiones hasta que se active la señal de apagado
    ///
    /// El socket se libera siempre al salir, también si el loop falla o
    /// hace panic.
    pub fn serve(&mut self) -> Result<()> {
        let handler = self.handler.clone().ok_or(ServerError::NotBound)?;
        let listener = ListenerGuard::new(self.listener.take().ok_or(ServerError::NotBound)?);

        self.state = ServerState::Serving;
        let result = self.accept_loop(&listener.0, &handler);

        self.state = ServerState::Stopping;
        drop(listener);
        self.state = ServerState::Stopped;

        result
    }

    /// `bind` + `serve`
    pub fn run(&mut self) -> Result<()> {
        self.bind()?;
        self.serve()
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Dirección real del socket (útil con puerto 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// URL de la página inicial
    pub fn serving_url(&self) -> String {
        match self.local_addr() {
            Some(addr) => format!("http://{}/{}", addr, START_PAGE),
            None => self.config.serving_url(),
        }
    }

    fn accept_loop(&self, listener: &TcpListener, handler: &FileHandler) -> Result<()> {
        loop {
            if self.shutdown.is_triggered() {
                info!("Apagado solicitado, dejando de aceptar conexiones");
                return Ok(());
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "Nueva conexión");
                    if let Err(e) =
                        handle_connection(stream, peer, handler, &self.config, &self.shutdown)
                    {
                        warn!(%peer, error = %e, "Error atendiendo conexión");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(self.config.poll_interval);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, "Error al aceptar conexión");
                    thread::sleep(self.config.poll_interval);
                }
            }
        }
    }
}

/// Dueño del socket mientras el servidor atiende; al soltarse lo cierra
struct ListenerGuard(TcpListener);

impl ListenerGuard {
    fn new(listener: TcpListener) -> Self {
        Self(listener)
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        match self.0.local_addr() {
            Ok(addr) => info!(address = %addr, "Socket liberado"),
            Err(_) => info!("Socket liberado"),
        }
    }
}

/// Lo que se leyó de una conexión antes de parsear
#[derive(Debug, PartialEq, Eq)]
enum RequestHead {
    /// El cliente cerró sin mandar nada
    Closed,
    /// Cabecera completa, o lo que llegó antes del EOF
    Bytes(Vec<u8>),
    /// La cabecera superó el límite
    TooLarge,
    /// Llegó la señal de apagado mientras se esperaba el request
    Abandoned,
}

/// Lee la cabecera hasta la línea vacía, EOF o el límite de tamaño
///
/// Cada vez que vence el timeout de lectura del stream se revisa
/// `shutdown`; un cliente que no manda nada no retrasa el apagado.
fn read_request_head(
    stream: &mut impl Read,
    max_bytes: usize,
    shutdown: &ShutdownSignal,
) -> io::Result<RequestHead> {
    let mut head = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                if shutdown.is_triggered() {
                    return Ok(RequestHead::Abandoned);
                }
                continue;
            }
            Err(e) => return Err(e),
        };
        if n == 0 {
            break;
        }

        head.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_head_end(&head) {
            if end > max_bytes {
                return Ok(RequestHead::TooLarge);
            }
            head.truncate(end);
            return Ok(RequestHead::Bytes(head));
        }
        if head.len() > max_bytes {
            return Ok(RequestHead::TooLarge);
        }
    }

    if head.is_empty() {
        Ok(RequestHead::Closed)
    } else {
        Ok(RequestHead::Bytes(head))
    }
}

/// Posición justo después de la línea vacía (`\r\n\r\n` o `\n\n`)
fn find_head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| p + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Atiende una conexión completa: leer, parsear, responder, registrar
fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: &FileHandler,
    config: &Config,
    shutdown: &ShutdownSignal,
) -> io::Result<()> {
    let start = Instant::now();

    // En algunas plataformas el stream hereda el modo no bloqueante del listener
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(config.poll_interval))?;

    let head = read_request_head(&mut stream, config.max_request_bytes, shutdown)?;
    let (response, head_only, request_line) = match head {
        RequestHead::Closed => {
            debug!(%peer, "Conexión cerrada sin request");
            return Ok(());
        }
        RequestHead::Abandoned => {
            debug!(%peer, "Conexión descartada por apagado");
            return Ok(());
        }
        RequestHead::TooLarge => {
            let response = Response::error(StatusCode::BadRequest, "Request header too large");
            (response, false, "-".to_string())
        }
        RequestHead::Bytes(bytes) => match Request::parse(&bytes) {
            Ok(request) => {
                let line = format!(
                    "{} {} {}",
                    request.method().as_str(),
                    request.path(),
                    request.version()
                );
                (handler.handle(&request), request.method() == Method::HEAD, line)
            }
            Err(e) => {
                debug!(%peer, error = %e, "Request inválido");
                (Response::error(e.status(), &e.to_string()), false, first_line(&bytes))
            }
        },
    };

    let mut response = response;
    if response.header("Server").is_none() {
        add_common_headers(&mut response);
    }

    let bytes = if head_only {
        response.head_bytes()
    } else {
        response.to_bytes()
    };
    stream.write_all(&bytes)?;
    stream.flush()?;

    let body_len = if head_only || response.status().forbids_body() {
        0
    } else {
        response.body().len()
    };
    info!(
        "{} \"{}\" {} {} ({:.2}ms)",
        peer.ip(),
        request_line,
        response.status().as_u16(),
        body_len,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}

/// Primera línea del request para el access log, aunque no se haya podido parsear
fn first_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.lines().next().unwrap_or_default().escape_debug().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn ephemeral_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").expect("bind")
    }

    fn root_with_index() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html>ok</html>").unwrap();
        dir
    }

    fn connection_config(root: &std::path::Path, max_request_bytes: usize) -> Config {
        let mut config = Config::with_root(root);
        config.poll_interval = Duration::from_millis(10);
        config.max_request_bytes = max_request_bytes;
        config
    }

    /// Lector que nunca tiene datos, como un socket con timeout vencido
    struct SilentReader;

    impl Read for SilentReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::WouldBlock))
        }
    }

    /// Atiende una sola conexión en otro thread y retorna lo que recibe el cliente
    fn exchange(root: &std::path::Path, raw: &[u8]) -> String {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let handler = FileHandler::new(root.canonicalize().unwrap());
        let config = connection_config(root, 64 * 1024);

        let t = thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            handle_connection(stream, peer, &handler, &config, &ShutdownSignal::new()).unwrap();
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(std::net::Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        t.join().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_handle_connection_serves_index() {
        let root = root_with_index();
        let text = exchange(root.path(), b"GET /index.html HTTP/1.0\r\n\r\n");

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n<html>ok</html>"));
    }

    #[test]
    fn test_handle_connection_head_has_no_body() {
        let root = root_with_index();
        let text = exchange(root.path(), b"HEAD /index.html HTTP/1.1\r\nHost: x\r\n\r\n");

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Length: 15\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_handle_connection_parse_error() {
        let root = root_with_index();
        let text = exchange(root.path(), b"\x00\x01\x02\x03garbage");

        assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
        assert!(text.contains("Server: crane_server/"));
    }

    #[test]
    fn test_handle_connection_unsupported_method() {
        let root = root_with_index();
        let text = exchange(root.path(), b"POST /index.html HTTP/1.0\r\n\r\n");

        assert!(text.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
    }

    #[test]
    fn test_handle_connection_too_large() {
        let root = root_with_index();
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let handler = FileHandler::new(root.path().canonicalize().unwrap());
        let config = connection_config(root.path(), 64);

        let t = thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            handle_connection(stream, peer, &handler, &config, &ShutdownSignal::new()).unwrap();
        });

        let mut client = TcpStream::connect(addr).unwrap();
        let long = format!("GET /{} HTTP/1.0\r\n\r\n", "a".repeat(200));
        client.write_all(long.as_bytes()).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        t.join().unwrap();

        assert!(String::from_utf8_lossy(&buf).starts_with("HTTP/1.0 400 Bad Request\r\n"));
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        // Cubre la rama RequestHead::Closed
        let root = root_with_index();
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let handler = FileHandler::new(root.path().canonicalize().unwrap());
        let config = connection_config(root.path(), 1024);

        let t = thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            handle_connection(stream, peer, &handler, &config, &ShutdownSignal::new())
        });

        drop(TcpStream::connect(addr).unwrap());

        // Un reset del peer también es aceptable; lo importante es no hacer panic
        let _ = t.join().unwrap();
    }

    #[test]
    fn test_handle_connection_idle_client_released_on_shutdown() {
        let root = root_with_index();
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let handler = FileHandler::new(root.path().canonicalize().unwrap());
        let config = connection_config(root.path(), 1024);
        let shutdown = ShutdownSignal::new();
        let for_thread = shutdown.clone();

        let t = thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            handle_connection(stream, peer, &handler, &config, &for_thread)
        });

        // Conectado pero sin mandar nada
        let mut client = TcpStream::connect(addr).unwrap();
        thread::sleep(Duration::from_millis(50));
        shutdown.trigger();
        t.join().unwrap().unwrap();

        // El servidor cerró sin responder
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_read_request_head_variants() {
        let shutdown = ShutdownSignal::new();

        let mut complete: &[u8] = b"GET / HTTP/1.0\r\nHost: x\r\n\r\nextra";
        assert_eq!(
            read_request_head(&mut complete, 1024, &shutdown).unwrap(),
            RequestHead::Bytes(b"GET / HTTP/1.0\r\nHost: x\r\n\r\n".to_vec())
        );

        let mut empty: &[u8] = b"";
        assert_eq!(read_request_head(&mut empty, 1024, &shutdown).unwrap(), RequestHead::Closed);

        let mut unterminated: &[u8] = b"GET / HTTP/1.0";
        assert_eq!(
            read_request_head(&mut unterminated, 1024, &shutdown).unwrap(),
            RequestHead::Bytes(b"GET / HTTP/1.0".to_vec())
        );

        let big = vec![b'a'; 10_000];
        let mut too_large: &[u8] = &big;
        assert_eq!(
            read_request_head(&mut too_large, 1024, &shutdown).unwrap(),
            RequestHead::TooLarge
        );
    }

    #[test]
    fn test_read_request_head_gives_up_on_shutdown() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        assert_eq!(
            read_request_head(&mut SilentReader, 1024, &shutdown).unwrap(),
            RequestHead::Abandoned
        );
    }

    #[test]
    fn test_find_head_end() {
        assert_eq!(find_head_end(b"GET / HTTP/1.0\r\n\r\n"), Some(18));
        assert_eq!(find_head_end(b"GET / HTTP/1.0\n\n"), Some(16));
        assert_eq!(find_head_end(b"GET / HTTP/1.0\r\n"), None);
    }

    #[test]
    fn test_serve_requires_bind() {
        let root = root_with_index();
        let mut server = Server::new(Config::with_root(root.path()), ShutdownSignal::new());

        assert!(matches!(server.serve(), Err(ServerError::NotBound)));
        assert_eq!(server.state(), ServerState::Starting);
    }

    #[test]
    fn test_serve_stops_when_signal_already_triggered() {
        let root = root_with_index();
        let mut config = Config::with_root(root.path());
        config.port = 0;
        config.poll_interval = Duration::from_millis(10);

        let shutdown = ShutdownSignal::new();
        let mut server = Server::new(config, shutdown.clone());
        let addr = server.bind().unwrap();
        assert_eq!(server.serving_url(), format!("http://{}/index.html", addr));

        shutdown.trigger();
        server.serve().unwrap();

        assert_eq!(server.state(), ServerState::Stopped);
        assert!(server.local_addr().is_none());
        // El puerto quedó libre
        TcpListener::bind(addr).unwrap();
    }
}
