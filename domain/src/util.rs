//! Text helpers shared by the outer layers.

/// One-line preview of `text`, at most `max_bytes` bytes before the ellipsis
///
/// Runs of whitespace (newlines included) collapse to a single space. The cut
/// backs up to the nearest UTF-8 boundary, and `...` is appended only when
/// something was dropped.
pub fn preview(text: &str, max_bytes: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= max_bytes {
        return flat;
    }
    let mut end = max_bytes;
    while !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", flat[..end].trim_end())
}
