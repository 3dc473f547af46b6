//! # Fechas HTTP
//! src/http/date.rs
//!
//! Formato IMF-fixdate (RFC 7231 §7.1.1.1) para `Date` y `Last-Modified`,
//! y parsing de `If-Modified-Since`.

use chrono::{DateTime, NaiveDateTime, Utc};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formatea una fecha como `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// # Ejemplo
/// ```
/// use chrono::{TimeZone, Utc};
/// use crane_server::http::date::format_http_date;
///
/// let t = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
/// assert_eq!(format_http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
/// ```
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(IMF_FIXDATE).to_string()
}

/// Parsea una fecha HTTP; `None` si no se entiende
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, IMF_FIXDATE) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
