use super::normalize::sanitize_text;
use super::toc::TocEntry;

pub const UNKNOWN_SECTION: &str = "Unknown Section";

/// Best guess at the section containing a citation on `page_number`.
///
/// The table of contents wins when it covers the page. Otherwise the page's
/// lines are walked from the bottom up and the first non-empty line that also
/// occurs before `context` is taken as the heading. That walk starts at the
/// end of the page, not at the citation, so a line repeated after the
/// citation can shadow a nearer heading.
pub fn infer_section_name(
    toc: &[TocEntry],
    page_number: u32,
    context: &str,
    page_text: &str,
) -> String {
    if let Some(heading) = section_from_toc(toc, page_number) {
        return heading.to_string();
    }

    section_from_preceding_lines(context, page_text)
        .unwrap_or_else(|| UNKNOWN_SECTION.to_string())
}

fn section_from_toc(toc: &[TocEntry], page_number: u32) -> Option<&str> {
    for (index, entry) in toc.iter().enumerate() {
        match toc.get(index + 1) {
            Some(next) if entry.page <= page_number && page_number < next.page => {
                return Some(&entry.heading);
            }
            None if page_number >= entry.page => return Some(&entry.heading),
            _ => {}
        }
    }
    None
}

fn section_from_preceding_lines(context: &str, page_text: &str) -> Option<String> {
    // An unlocatable context leaves everything but the final character.
    let preceding = match page_text.find(context) {
        Some(offset) => &page_text[..offset],
        None => page_text
            .char_indices()
            .next_back()
            .map_or("", |(offset, _)| &page_text[..offset]),
    };

    page_text
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty() && preceding.contains(*line))
        .map(sanitize_text)
}
