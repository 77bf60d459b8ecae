use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{error, info};

use super::fetch::DocumentFetcher;
use super::pipeline::{CitationScanner, DocumentError, process_url};
use super::sink::write_citations;
use crate::cli::CitationsArgs;
use crate::http::RetryPolicy;
use crate::model::{CitationRunCounts, CitationRunManifest, CitationRunPaths};
use crate::util::{
    append_line, duration_from_secs, now_utc_string, pause, utc_compact_string, write_json_pretty,
};

pub fn run(args: CitationsArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("citations-{}", utc_compact_string(started_ts));

    let urls = collect_urls(&args.urls, args.urls_file.as_deref())?;
    if urls.is_empty() {
        bail!("no document URLs given; pass --url or --urls-file");
    }

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| args.output.with_extension("manifest.json"));
    let policy = RetryPolicy::new(
        args.max_retries,
        duration_from_secs(args.backoff_factor_secs, "--backoff-factor-secs")?,
    );
    let between_documents = duration_from_secs(args.pause_secs, "--pause-secs")?;

    let fetcher = DocumentFetcher::new(Duration::from_secs(args.timeout_secs), policy)?;
    let scanner = CitationScanner::new(args.toc_pages, args.context_chars)?;

    info!(run_id = %run_id, urls = urls.len(), "starting citation extraction");

    let mut counts = CitationRunCounts {
        url_count: urls.len(),
        ..CitationRunCounts::default()
    };
    let mut records = Vec::new();
    let mut failed_urls = Vec::new();
    let mut warnings = Vec::new();

    for (index, url) in urls.iter().enumerate() {
        if index > 0 {
            pause(between_documents);
        }
        info!(url = %url, position = index + 1, total = urls.len(), "processing document");

        match process_url(&fetcher, &scanner, url) {
            Ok(scan) => {
                counts.downloaded_count += 1;
                counts.page_count += scan.page_count;
                counts.skipped_page_count += scan.skipped_page_count;
                counts.toc_entry_count += scan.toc_entry_count;
                records.extend(scan.records);
            }
            Err(DocumentError::Fetch(err)) => {
                error!(url = %url, error = %err, "download failed");
                append_line(&args.failed_downloads, url)?;
                counts.failed_download_count += 1;
                failed_urls.push(url.clone());
            }
            Err(err) => {
                error!(url = %url, error = %err, "document skipped");
                counts.downloaded_count += 1;
                counts.extraction_failure_count += 1;
                warnings.push(err.to_string());
            }
        }
    }

    counts.citation_count = records.len();
    write_citations(&args.output, records, scanner.matcher())?;
    info!(path = %args.output.display(), citations = counts.citation_count, "saved citations");

    let manifest = CitationRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        completed_at: now_utc_string(),
        paths: CitationRunPaths {
            output_path: args.output.display().to_string(),
            failed_downloads_path: args.failed_downloads.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        counts,
        failed_urls,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote citation run manifest");

    Ok(())
}

fn collect_urls(urls: &[String], urls_file: Option<&Path>) -> Result<Vec<String>> {
    let mut collected = urls
        .iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect::<Vec<String>>();

    if let Some(path) = urls_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        collected.extend(parse_url_list(&raw));
    }

    Ok(collected)
}

pub(super) fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect()
}
