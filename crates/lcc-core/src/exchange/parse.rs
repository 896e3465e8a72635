//! Parse raw HTTP response header lines into [`Headers`].

use super::Headers;

/// Parse collected header lines into `Headers`.
///
/// Status lines and blank lines are skipped. When redirects are followed the
/// transport hands us every hop's headers; a new status line resets the map so
/// only the final response's headers survive.
pub(crate) fn parse_header_lines(lines: &[String]) -> Headers {
    let mut headers = Headers::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers = Headers::new();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            headers.insert(name, value.trim());
        }
    }
    headers
}
