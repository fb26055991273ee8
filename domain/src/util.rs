//! Shared string helpers.

/// Cut `s` to at most `max_bytes`, backing off to the previous UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Like [`truncate_str`], appending `...` when something was cut.
pub fn ellipsize(s: &str, max_bytes: usize) -> String {
    let cut = truncate_str(s, max_bytes);
    if cut.len() < s.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}
