//! Text formatting for rendered posts.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// A URL preceded by whitespace or the start of the text, running up to the
/// next whitespace or `<`.
static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|\s)((?:https?|ftp)://[^\s<]+)").expect("static URL pattern")
});

/// Escapes HTML, links bare URLs and keeps line breaks.
/// The result is safe to embed unescaped.
pub fn format_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let safe = html_escape::encode_quoted_attribute(&normalized);

    let linked = URL.replace_all(
        &safe,
        r#"${1}<a href="${2}" rel="nofollow ugc noopener" target="_blank">${2}</a>"#,
    );

    linked.replace('\n', "<br />\n")
}

/// `dd.mm.YYYY HH:MM` in UTC.
pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn html_is_escaped() {
        let html = format_text("<script>alert('x')</script> & \"q\"");
        assert!(html.starts_with("&lt;script&gt;alert("));
        assert!(html.contains("&amp;"));
        assert!(html.contains("&quot;q&quot;"));
        assert!(!html.contains('<'));
        assert!(!html.contains('\''));
    }

    #[test]
    fn urls_become_links() {
        let html = format_text("see https://example.org/a?b=1&c=2 now");
        assert_eq!(
            html,
            "see <a href=\"https://example.org/a?b=1&amp;c=2\" rel=\"nofollow ugc noopener\" \
             target=\"_blank\">https://example.org/a?b=1&amp;c=2</a> now"
        );
    }

    #[test]
    fn embedded_urls_are_not_linked() {
        let html = format_text("xhttp://example.org");
        assert!(!html.contains("<a "));
    }

    #[test]
    fn line_breaks_are_kept() {
        assert_eq!(format_text("a\r\nb\nc"), "a<br />\nb<br />\nc");
        let html = format_text("first\nftp://files.example.org/x");
        assert!(html.contains("<br />\n<a href=\"ftp://files.example.org/x\""));
    }

    #[test]
    fn datetime_format() {
        let at = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 7).unwrap();
        assert_eq!(format_datetime(at), "31.12.2025 23:59");
    }
}
