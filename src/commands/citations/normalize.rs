/// Collapses every whitespace run (newlines included) to one space and trims.
pub fn sanitize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Slice of `text` reaching `radius` characters either side of the byte range
/// `start..end`, which must lie on character boundaries.
pub(super) fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let window_start = text[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(offset, _)| offset)
        .unwrap_or(0);
    let window_start = if radius == 0 { start } else { window_start };

    let window_end = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(offset, _)| end + offset)
        .unwrap_or(text.len());

    &text[window_start..window_end]
}
