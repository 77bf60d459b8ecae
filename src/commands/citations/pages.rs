use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::error;

const PAGE_BREAK: u8 = 0x0C;

/// Per-page text of a PDF via `pdftotext`, in page order.
///
/// A page whose bytes are not valid UTF-8 is logged and returned as `None`
/// so callers can skip it while keeping page numbers aligned.
pub fn extract_pages_with_pdftotext(pdf_path: &Path) -> Result<Vec<Option<String>>> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_pages(&output.stdout, pdf_path))
}

pub(super) fn split_pages(raw: &[u8], pdf_path: &Path) -> Vec<Option<String>> {
    let mut pages = raw
        .split(|byte| *byte == PAGE_BREAK)
        .enumerate()
        .map(|(index, chunk)| match std::str::from_utf8(chunk) {
            Ok(text) => Some(text.replace('\u{0000}', "")),
            Err(err) => {
                error!(
                    path = %pdf_path.display(),
                    page = index + 1,
                    error = %err,
                    "skipping undecodable page"
                );
                None
            }
        })
        .collect::<Vec<Option<String>>>();

    while let Some(Some(last_page)) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}
