//! # Configuración del Servidor
//! src/config.rs
//!
//! El host y el puerto son constantes: el servidor no acepta flags de CLI,
//! variables de entorno ni archivo de configuración. Lo único que cambia
//! entre ejecuciones es el directorio raíz, que es el directorio donde
//! vive el ejecutable y se pasa explícitamente al servidor (nunca se
//! cambia el directorio de trabajo del proceso).

use crate::error::{Result, ServerError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dirección de loopback donde escucha el servidor
pub const HOST: &str = "127.0.0.1";

/// Puerto fijo del servidor
pub const PORT: u16 = 8000;

/// Página que se anuncia al arrancar
pub const START_PAGE: &str = "index.html";

/// Configuración del servidor de archivos estáticos
#[derive(Debug, Clone)]
pub struct Config {
    /// Host/IP en el que escucha
    pub host: String,

    /// Puerto en el que escucha (0 = efímero, solo para tests)
    pub port: u16,

    /// Directorio desde el que se sirven los archivos
    pub root_dir: PathBuf,

    /// Cada cuánto el accept loop revisa la señal de apagado
    pub poll_interval: Duration,

    /// Tamaño máximo de la cabecera de un request
    pub max_request_bytes: usize,
}

impl Config {
    /// Configuración por defecto sirviendo desde `root_dir`
    ///
    /// # Ejemplo
    /// ```rust
    /// use crane_server::config::Config;
    ///
    /// let config = Config::with_root("/srv/cranegame");
    /// assert_eq!(config.address(), "127.0.0.1:8000");
    /// ```
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Configuración del binario: raíz = directorio que contiene el ejecutable
    pub fn for_current_exe() -> Result<Self> {
        let exe = std::env::current_exe().map_err(ServerError::CurrentExe)?;
        let root = exe.parent().ok_or_else(|| ServerError::RootDir {
            path: exe.clone(),
            reason: "el ejecutable no tiene directorio padre".to_string(),
        })?;
        Ok(Self::with_root(root))
    }

    /// Obtiene la dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL que se imprime al arrancar
    ///
    /// # Ejemplo
    /// ```rust
    /// use crane_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.serving_url(), "http://127.0.0.1:8000/index.html");
    /// ```
    pub fn serving_url(&self) -> String {
        format!("http://{}/{}", self.address(), START_PAGE)
    }

    /// Valida la configuración
    ///
    /// El directorio raíz debe existir y ser un directorio; se devuelve su
    /// forma canónica para que las comprobaciones de path traversal
    /// comparen rutas absolutas.
    pub fn validate(&self) -> Result<PathBuf> {
        if self.poll_interval.is_zero() {
            return Err(ServerError::Config(
                "poll_interval debe ser mayor que 0".to_string(),
            ));
        }
        if self.max_request_bytes == 0 {
            return Err(ServerError::Config(
                "max_request_bytes debe ser al menos 1".to_string(),
            ));
        }

        canonical_dir(&self.root_dir).map_err(|reason| ServerError::RootDir {
            path: self.root_dir.clone(),
            reason,
        })
    }
}

fn canonical_dir(path: &Path) -> std::result::Result<PathBuf, String> {
    let canonical = path.canonicalize().map_err(|e| e.to_string())?;
    if !canonical.is_dir() {
        return Err("no es un directorio".to_string());
    }
    Ok(canonical)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            root_dir: PathBuf::from("."),
            poll_interval: Duration::from_millis(100),
            max_request_bytes: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.max_request_bytes, 65536);
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.port = 0;
        assert_eq!(config.address(), "127.0.0.1:0");
    }

    #[test]
    fn test_for_current_exe_uses_exe_dir() {
        let config = Config::for_current_exe().unwrap();
        let exe = std::env::current_exe().unwrap();

        assert_eq!(Some(config.root_dir.as_path()), exe.parent());
        assert_eq!(config.port, PORT);
    }

    #[test]
    fn test_validate_success_returns_canonical_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_root(dir.path());

        let root = config.validate().unwrap();
        assert!(root.is_absolute());
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_validate_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_root(dir.path().join("missing"));

        let result = config.validate();
        assert!(matches!(result, Err(ServerError::RootDir { .. })));
    }

    #[test]
    fn test_validate_root_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<html>ok</html>").unwrap();

        let result = Config::with_root(&file).validate();
        assert!(result.unwrap_err().to_string().contains("no es un directorio"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_root(dir.path());
        config.poll_interval = Duration::ZERO;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(err.to_string().contains("poll_interval"));
    }

    #[test]
    fn test_validate_zero_max_request_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_root(dir.path());
        config.max_request_bytes = 0;

        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }
}
