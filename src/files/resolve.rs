//! # Resolución de Paths
//! src/files/resolve.rs
//!
//! Convierte el path de un request en un archivo bajo el directorio raíz.
//!
//! ## Reglas
//!
//! 1. Se decodifica el percent-encoding (`%20` → espacio).
//! 2. Se ignoran segmentos vacíos y `.`.
//! 3. Cualquier segmento `..`, con separadores o prefijos de unidad, o con
//!    un byte NUL hace que el request se trate como inexistente.
//! 4. El path final se canoniza y debe seguir dentro de la raíz (cubre
//!    symlinks que apuntan afuera).
//! 5. Un directorio pedido sin `/` final se redirige; con `/` final se
//!    sirve su `index.html` (o `index.htm`) o, si no hay, su listado.

use std::path::{Component, Path, PathBuf};

/// Archivos que se buscan al pedir un directorio, en orden
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Resultado de resolver un path de URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Archivo regular dentro de la raíz
    File(PathBuf),

    /// Directorio sin archivo índice
    Listing(PathBuf),

    /// Directorio pedido sin `/` final; contiene el nuevo `Location`
    Redirect(String),

    /// No existe, no es legible o queda fuera de la raíz
    NotFound,
}

/// Directorio raíz desde el que se sirven archivos
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    /// `root` debe ser un path canónico (ver `Config::validate`)
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resuelve el path (sin query) de un request
    ///
    /// `query` solo se usa para conservarla en las redirecciones.
    pub fn resolve(&self, url_path: &str, query: Option<&str>) -> Resolution {
        let Some(relative) = translate_path(url_path) else {
            return Resolution::NotFound;
        };
        let Some(path) = self.contain(&self.root.join(relative)) else {
            return Resolution::NotFound;
        };

        if path.is_dir() {
            if !url_path.ends_with('/') {
                let location = match query {
                    Some(q) => format!("{}/?{}", url_path, q),
                    None => format!("{}/", url_path),
                };
                return Resolution::Redirect(location);
            }

            for index in INDEX_FILES {
                if let Some(index_path) = self.contain(&path.join(index)) {
                    if index_path.is_file() {
                        return Resolution::File(index_path);
                    }
                }
            }
            return Resolution::Listing(path);
        }

        // "/index.html/" no es un directorio
        if url_path.ends_with('/') || !path.is_file() {
            return Resolution::NotFound;
        }
        Resolution::File(path)
    }

    /// Canoniza `candidate` y verifica que siga bajo la raíz
    fn contain(&self, candidate: &Path) -> Option<PathBuf> {
        let canonical = candidate.canonicalize().ok()?;
        canonical.starts_with(&self.root).then_some(canonical)
    }
}

/// Traduce el path de la URL a un path relativo seguro
///
/// Retorna `None` si algún segmento intenta salir de la raíz.
///
/// # Ejemplo
/// ```
/// use crane_server::files::resolve::translate_path;
/// use std::path::PathBuf;
///
/// assert_eq!(translate_path("/web/main.js"), Some(PathBuf::from("web/main.js")));
/// assert_eq!(translate_path("/a%20b.png"), Some(PathBuf::from("a b.png")));
/// assert_eq!(translate_path("/../etc/passwd"), None);
/// ```
pub fn translate_path(url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode(url_path)?;
    if decoded.contains('\0') {
        return None;
    }

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }

        // Cada segmento debe ser exactamente un nombre normal: nada de "..",
        // separadores de la plataforma ni prefijos tipo "C:"
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => relative.push(name),
            _ => return None,
        }
    }
    Some(relative)
}

/// Decodifica `%XX`. Las secuencias inválidas se dejan tal cual.
///
/// Retorna `None` si el resultado no es UTF-8 válido.
pub fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                decoded.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn root_with_files() -> (tempfile::TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html>ok</html>").unwrap();
        fs::create_dir(dir.path().join("web")).unwrap();
        fs::write(dir.path().join("web").join("main.js"), "console.log(1)").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets").join("claw.png"), [0x89, b'P']).unwrap();

        let files = StaticFiles::new(dir.path().canonicalize().unwrap());
        (dir, files)
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b").as_deref(), Some("a b"));
        assert_eq!(percent_decode("%2e%2E").as_deref(), Some(".."));
        assert_eq!(percent_decode("100%").as_deref(), Some("100%"));
        assert_eq!(percent_decode("%zz").as_deref(), Some("%zz"));
        assert_eq!(percent_decode("a+b").as_deref(), Some("a+b"));
        assert_eq!(percent_decode("%ff"), None);
    }

    #[test]
    fn test_translate_path_skips_empty_and_dot() {
        assert_eq!(translate_path("/"), Some(PathBuf::new()));
        assert_eq!(translate_path("/./web//main.js"), Some(PathBuf::from("web/main.js")));
    }

    #[test]
    fn test_translate_path_rejects_traversal() {
        assert_eq!(translate_path("/.."), None);
        assert_eq!(translate_path("/web/../../secret"), None);
        assert_eq!(translate_path("/%2e%2e/secret"), None);
        assert_eq!(translate_path("/web%2f..%2f..%2fsecret"), None);
        assert_eq!(translate_path("/a%00b"), None);
    }

    #[test]
    fn test_resolve_file() {
        let (_dir, files) = root_with_files();
        let expected = files.root().join("web").join("main.js");

        assert_eq!(files.resolve("/web/main.js", None), Resolution::File(expected));
    }

    #[test]
    fn test_resolve_root_defaults_to_index() {
        let (_dir, files) = root_with_files();
        let expected = files.root().join("index.html");

        assert_eq!(files.resolve("/", None), Resolution::File(expected.clone()));
        assert_eq!(files.resolve("/index.html", None), Resolution::File(expected));
    }

    #[test]
    fn test_resolve_missing() {
        let (_dir, files) = root_with_files();

        assert_eq!(files.resolve("/missing.png", None), Resolution::NotFound);
        assert_eq!(files.resolve("/index.html/", None), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_directory_redirect_keeps_query() {
        let (_dir, files) = root_with_files();

        assert_eq!(
            files.resolve("/web", None),
            Resolution::Redirect("/web/".to_string())
        );
        assert_eq!(
            files.resolve("/web", Some("v=2")),
            Resolution::Redirect("/web/?v=2".to_string())
        );
    }

    #[test]
    fn test_resolve_directory_without_index_lists() {
        let (_dir, files) = root_with_files();
        let expected = files.root().join("assets");

        assert_eq!(files.resolve("/assets/", None), Resolution::Listing(expected));
    }

    #[test]
    fn test_resolve_index_htm_fallback() {
        let (_dir, files) = root_with_files();
        fs::write(files.root().join("web").join("index.htm"), "<p>web</p>").unwrap();
        let expected = files.root().join("web").join("index.htm");

        assert_eq!(files.resolve("/web/", None), Resolution::File(expected));
    }

    #[test]
    fn test_resolve_traversal_is_not_found() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        let files = StaticFiles::new(root.canonicalize().unwrap());

        assert_eq!(files.resolve("/../secret.txt", None), Resolution::NotFound);
        assert_eq!(files.resolve("/%2e%2e/secret.txt", None), Resolution::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_symlink_outside_root_is_not_found() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), root.join("link.txt"))
            .unwrap();
        let files = StaticFiles::new(root.canonicalize().unwrap());

        assert_eq!(files.resolve("/link.txt", None), Resolution::NotFound);
    }
}
