use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::blocking::Client;
use tracing::{debug, info};

use super::components::SIDES;
use crate::cli::CheckUrlsArgs;
use crate::http::{browser_headers, build_client};
use crate::sheet::{SheetLayout, Table, load_table, write_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStatus {
    Valid,
    Error,
}

impl UrlStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UrlStatus::Valid => "valid",
            UrlStatus::Error => "error",
        }
    }
}

pub trait UrlProbe {
    fn probe(&self, url: &str) -> UrlStatus;
}

/// HEAD request with redirects followed; any status of 400 or above, or a
/// transport failure, marks the URL broken.
pub struct HeadProbe {
    client: Client,
}

impl HeadProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, browser_headers("*/*"))?,
        })
    }
}

impl UrlProbe for HeadProbe {
    fn probe(&self, url: &str) -> UrlStatus {
        match self.client.head(url).send() {
            Ok(response) if response.status().as_u16() >= 400 => {
                debug!(url, status = response.status().as_u16(), "url returned error status");
                UrlStatus::Error
            }
            Ok(_) => UrlStatus::Valid,
            Err(err) => {
                debug!(url, error = %err, "url request failed");
                UrlStatus::Error
            }
        }
    }
}

/// Status of every URL probed during one run. Nothing is evicted or persisted.
#[derive(Debug, Default)]
pub struct UrlStatusCache {
    statuses: HashMap<String, UrlStatus>,
}

impl UrlStatusCache {
    pub fn status(&mut self, url: &str, probe: &dyn UrlProbe) -> UrlStatus {
        if let Some(status) = self.statuses.get(url) {
            return *status;
        }
        let status = probe.probe(url);
        self.statuses.insert(url.to_string(), status);
        status
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SideSummary {
    pub inferred: usize,
    pub checked: usize,
    pub broken: usize,
}

pub fn run(args: CheckUrlsArgs) -> Result<()> {
    let started = Instant::now();

    let mut table = load_table(&args.input)?;
    for side in SIDES {
        table.require_column(side.component, &args.input)?;
        table.require_column(side.url, &args.input)?;
    }
    info!(path = %args.input.display(), rows = table.len(), "loaded component workbook");

    let probe = HeadProbe::new(Duration::from_secs(args.timeout_secs))?;
    let mut cache = UrlStatusCache::default();
    let (layout, summaries) = check_table(&mut table, &probe, &mut cache, args.progress_every);

    write_table(&args.output, &table, &layout)?;

    for (side, summary) in SIDES.iter().zip(summaries) {
        info!(
            side = side.label,
            inferred = summary.inferred,
            checked = summary.checked,
            broken = summary.broken,
            "url check summary"
        );
    }
    info!(
        path = %args.output.display(),
        distinct_urls = cache.len(),
        elapsed_secs = format!("{:.2}", started.elapsed().as_secs_f64()),
        "url check complete"
    );

    Ok(())
}

/// Fills URLs from known components, probes every URL and returns the output
/// layout with broken URL cells highlighted.
pub fn check_table(
    table: &mut Table,
    probe: &dyn UrlProbe,
    cache: &mut UrlStatusCache,
    progress_every: usize,
) -> (SheetLayout, [SideSummary; 2]) {
    let mut summaries = [SideSummary::default(); 2];
    let mut columns = Vec::with_capacity(SIDES.len());

    for (index, side) in SIDES.iter().enumerate() {
        let (Some(component), Some(url)) =
            (table.column_index(side.component), table.column_index(side.url))
        else {
            continue;
        };
        summaries[index].inferred = fill_urls_from_components(table, component, url);
        info!(side = side.label, urls = summaries[index].inferred, "inferred component urls");
        columns.push((index, url, table.ensure_column(side.url_status)));
    }

    let mut layout = SheetLayout::default();
    let total = table.len();
    for row in 0..total {
        for &(index, url_column, status_column) in &columns {
            let url = table.cell(row, url_column).trim().to_string();
            if url.is_empty() {
                continue;
            }

            let status = cache.status(&url, probe);
            table.set_cell(row, status_column, status.as_str());
            summaries[index].checked += 1;
            if status == UrlStatus::Error {
                summaries[index].broken += 1;
                layout.highlighted_cells.insert((row, url_column));
            }
        }

        let processed = row + 1;
        if progress_every > 0 && processed % progress_every == 0 {
            info!(rows = processed, total, "checking urls");
        }
    }

    (layout, summaries)
}

/// Sets each row's URL to the one last recorded for its component. Returns the
/// number of rows holding a URL afterwards.
pub fn fill_urls_from_components(table: &mut Table, component: usize, url: usize) -> usize {
    let mut known: HashMap<String, String> = HashMap::new();
    for row in 0..table.len() {
        let name = table.cell(row, component);
        let link = table.cell(row, url).trim();
        if !name.is_empty() && !link.is_empty() {
            known.insert(name.to_string(), link.to_string());
        }
    }

    let mut filled = 0;
    for row in 0..table.len() {
        if let Some(link) = known.get(table.cell(row, component)).cloned() {
            table.set_cell(row, url, link);
        }
        if !table.cell(row, url).trim().is_empty() {
            filled += 1;
        }
    }
    filled
}
