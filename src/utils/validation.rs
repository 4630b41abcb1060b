/// Longest file name component we place on disk (bytes)
const MAX_NAME_LEN: usize = 200;

/// Fallback used when nothing usable survives sanitization
const FALLBACK_NAME: &str = "file";

/// Reduce a client-supplied file name to a single safe path component.
///
/// Directory parts are dropped, reserved and control characters become `_`,
/// leading dots are stripped so the result is never hidden or a `..`
/// reference, and the length is capped on a UTF-8 boundary.
pub fn sanitize_filename(filename: &str) -> String {
    // Get only the last component, accepting both separators
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name != filename.trim() {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
                || c.is_whitespace()
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized.trim_start_matches('.');

    let sanitized = if sanitized.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        &sanitized[..end]
    } else {
        sanitized
    };

    if sanitized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitized.to_string()
    }
}
