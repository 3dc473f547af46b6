//! # Listado de Directorios
//! src/files/listing.rs
//!
//! Página HTML con el contenido de un directorio que no tiene archivo
//! índice. Las entradas se ordenan sin distinguir mayúsculas; los
//! subdirectorios llevan `/` y los symlinks `@`.

use crate::http::response::html_escape;
use crate::files::resolve::percent_decode;
use std::fs;
use std::io;
use std::path::Path;

/// Una entrada del listado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Texto visible
    pub display: String,
    /// Destino del enlace (sin codificar)
    pub link: String,
}

/// Lee las entradas de `dir` ya ordenadas
pub fn entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for item in fs::read_dir(dir)? {
        let item = item?;
        let name = item.file_name().to_string_lossy().into_owned();
        let file_type = item.file_type()?;

        let entry = if file_type.is_symlink() {
            // El enlace apunta al symlink; si es a un directorio se le agrega "/"
            let link = if item.path().is_dir() {
                format!("{}/", name)
            } else {
                name.clone()
            };
            Entry {
                display: format!("{}@", name),
                link,
            }
        } else if file_type.is_dir() {
            Entry {
                display: format!("{}/", name),
                link: format!("{}/", name),
            }
        } else {
            Entry {
                display: name.clone(),
                link: name,
            }
        };
        entries.push(entry);
    }

    entries.sort_by_key(|e| e.display.to_lowercase());
    Ok(entries)
}

/// Genera la página del listado para `dir`, pedido como `url_path`
pub fn render(dir: &Path, url_path: &str) -> io::Result<String> {
    let entries = entries(dir)?;
    let display_path = percent_decode(url_path).unwrap_or_else(|| url_path.to_string());
    let title = format!("Directory listing for {}", html_escape(&display_path));

    let mut html = String::with_capacity(512 + entries.len() * 64);
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n<hr>\n<ul>\n", title));
    for entry in &entries {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            html_escape(&percent_encode(&entry.link)),
            html_escape(&entry.display)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Ok(html)
}

/// Codifica todo menos `A-Z a-z 0-9 - . _ ~ /`
///
/// # Ejemplo
/// ```
/// use crane_server::files::listing::percent_encode;
///
/// assert_eq!(percent_encode("my prize.png"), "my%20prize.png");
/// assert_eq!(percent_encode("web/"), "web/");
/// ```
pub fn percent_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/') {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    encoded
}
