use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

use super::normalize::sanitize_text;

const TOC_MARKER: &str = "Table of Contents";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub heading: String,
    pub page: u32,
}

impl TocEntry {
    pub fn new(heading: impl Into<String>, page: u32) -> Self {
        Self {
            heading: heading.into(),
            page,
        }
    }
}

pub struct TocExtractor {
    entry_regex: Regex,
    scan_pages: usize,
}

impl TocExtractor {
    pub fn new(scan_pages: usize) -> Result<Self> {
        let entry_regex = Regex::new(r"(?P<heading>.+?)\s+(?P<page>\d+)")
            .context("failed to compile table of contents regex")?;
        Ok(Self {
            entry_regex,
            scan_pages,
        })
    }

    /// Heading/page pairs from every page among the first `scan_pages` that
    /// carries the "Table of Contents" marker, in encounter order.
    ///
    /// `None` pages are ones the extractor could not decode.
    pub fn extract<S: AsRef<str>>(&self, pages: &[Option<S>]) -> Vec<TocEntry> {
        let mut entries = Vec::new();

        for page in pages.iter().take(self.scan_pages).flatten() {
            let text: &str = page.as_ref();
            if !text.contains(TOC_MARKER) {
                continue;
            }

            for captures in self.entry_regex.captures_iter(text) {
                let (Some(heading), Some(page)) = (captures.name("heading"), captures.name("page"))
                else {
                    continue;
                };
                let Ok(page) = page.as_str().parse::<u32>() else {
                    continue;
                };
                entries.push(TocEntry::new(sanitize_text(heading.as_str()), page));
            }
        }

        if !is_monotonic(&entries) {
            warn!(
                entries = entries.len(),
                "table of contents page numbers decrease; section lookup may be unreliable"
            );
        }

        entries
    }
}

pub fn is_monotonic(entries: &[TocEntry]) -> bool {
    entries.windows(2).all(|pair| pair[0].page <= pair[1].page)
}
