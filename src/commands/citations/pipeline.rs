use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fetch::{DocumentFetcher, FetchError};
use super::normalize::{context_window, sanitize_text};
use super::pages::extract_pages_with_pdftotext;
use super::patterns::CitationMatcher;
use super::section::infer_section_name;
use super::toc::TocExtractor;
use crate::model::{CitationRecord, page_anchor};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to extract text from {url}: {reason:#}")]
    Extract { url: String, reason: anyhow::Error },
}

#[derive(Debug, Default)]
pub struct DocumentScan {
    pub records: Vec<CitationRecord>,
    pub page_count: usize,
    pub skipped_page_count: usize,
    pub toc_entry_count: usize,
}

pub struct CitationScanner {
    matcher: CitationMatcher,
    toc: TocExtractor,
    context_chars: usize,
}

impl CitationScanner {
    pub fn new(toc_pages: usize, context_chars: usize) -> Result<Self> {
        Ok(Self {
            matcher: CitationMatcher::new()?,
            toc: TocExtractor::new(toc_pages)?,
            context_chars,
        })
    }

    pub fn matcher(&self) -> &CitationMatcher {
        &self.matcher
    }

    pub fn scan_pages<S: AsRef<str>>(&self, url: &str, pages: &[Option<S>]) -> DocumentScan {
        let toc = self.toc.extract(pages);
        let mut scan = DocumentScan {
            page_count: pages.len(),
            toc_entry_count: toc.len(),
            ..DocumentScan::default()
        };

        for (index, page) in pages.iter().enumerate() {
            let Some(page) = page else {
                scan.skipped_page_count += 1;
                continue;
            };
            let text: &str = page.as_ref();
            let page_number = u32::try_from(index + 1).unwrap_or(u32::MAX);

            for found in self.matcher.find_iter(text) {
                debug!(
                    kind = found.kind.as_str(),
                    raw = found.raw,
                    page = page_number,
                    "found citation"
                );
                let context = sanitize_text(context_window(
                    text,
                    found.start,
                    found.end,
                    self.context_chars,
                ));
                let section = infer_section_name(&toc, page_number, &context, text);

                scan.records.push(CitationRecord {
                    citation: found.canonical,
                    citation_page: page_anchor(url, page_number),
                    section,
                    context,
                    source_url: url.to_string(),
                });
            }
        }

        scan
    }
}

/// Downloads, scans and deletes one document.
///
/// The temporary PDF is gone by the time this returns, whatever the outcome.
pub fn process_url(
    fetcher: &DocumentFetcher,
    scanner: &CitationScanner,
    url: &str,
) -> Result<DocumentScan, DocumentError> {
    let document = fetcher.fetch(url)?;
    debug!(url = document.url(), path = %document.path().display(), "extracting page text");

    let extracted = extract_pages_with_pdftotext(document.path());

    let path = document.path().display().to_string();
    if let Err(err) = document.cleanup() {
        warn!(path = %path, error = %err, "failed to remove temporary document");
    }

    let pages = extracted.map_err(|reason| DocumentError::Extract {
        url: url.to_string(),
        reason,
    })?;
    let scan = scanner.scan_pages(url, &pages);

    info!(
        url,
        pages = scan.page_count,
        toc_entries = scan.toc_entry_count,
        citations = scan.records.len(),
        "scanned document"
    );

    Ok(scan)
}
