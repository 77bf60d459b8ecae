use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tracing::info;

use self::similarity::weighted_ratio;
use super::components::SIDES;
use crate::cli::ScrubArgs;
use crate::sheet::{SheetLayout, Table, load_table, write_table};

mod similarity;

const COMPONENT_ID_COLUMN: &str = "Component ID";

/// Compiled once per run; see [`TextScrubber::clean`].
pub struct TextScrubber {
    whitespace: Regex,
    sentence_gap: Regex,
    disallowed: Regex,
}

impl TextScrubber {
    pub fn new() -> Result<Self> {
        Ok(Self {
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
            sentence_gap: Regex::new(r"\.\s+").context("failed to compile sentence regex")?,
            disallowed: Regex::new(r#"[^a-zA-Z0-9.,;:'"!?()\-\s]"#)
                .context("failed to compile character filter regex")?,
        })
    }

    /// Straightens dashes and quotes, single-spaces sentences and drops every
    /// character outside letters, digits, whitespace and `.,;:'"!?()-`.
    pub fn clean(&self, text: &str) -> String {
        let text = self.whitespace.replace_all(text.trim(), " ");
        let text = text
            .replace(['\u{2013}', '\u{2014}'], "-")
            .replace(['\u{201C}', '\u{201D}'], "\"")
            .replace(['\u{2018}', '\u{2019}'], "'");
        let text = self.sentence_gap.replace_all(&text, ". ");
        let text = self.disallowed.replace_all(&text, "");
        text.trim().to_string()
    }
}

/// Maps near-duplicate entries onto the first spelling seen.
pub struct Deduplicator {
    score_cutoff: f64,
    canonical: Vec<(String, String)>,
    exact: HashSet<String>,
}

impl Deduplicator {
    /// `score_cutoff` is on a 0-100 scale.
    pub fn new(score_cutoff: f64) -> Self {
        Self {
            score_cutoff,
            canonical: Vec::new(),
            exact: HashSet::new(),
        }
    }

    pub fn resolve(&mut self, text: &str) -> String {
        if text.trim().is_empty() || self.exact.contains(text) {
            return text.to_string();
        }

        let key = match_key(text);
        let mut best: Option<(f64, &str)> = None;
        for (candidate, candidate_key) in &self.canonical {
            let score = weighted_ratio(&key, candidate_key);
            if score >= self.score_cutoff && best.is_none_or(|(top, _)| score > top) {
                best = Some((score, candidate));
            }
        }

        if let Some((_, candidate)) = best {
            return candidate.to_string();
        }

        self.exact.insert(text.to_string());
        self.canonical.push((text.to_string(), key));
        text.to_string()
    }

    pub fn canonical_count(&self) -> usize {
        self.canonical.len()
    }
}

/// Lowercased with every run of non-alphanumerics reduced to one space.
fn match_key(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

pub fn run(args: ScrubArgs) -> Result<()> {
    let mut table = load_table(&args.input)?;
    info!(path = %args.input.display(), rows = table.len(), "loaded component workbook");

    let scrubber = TextScrubber::new()?;
    let style = ProgressStyle::with_template(
        "{msg:>20} [{bar:40.cyan/blue}] {pos}/{len} entries (eta {eta})",
    )
    .context("invalid progress bar template")?
    .progress_chars("=> ");

    for side in SIDES {
        let Some(column) = table.column_index(side.component) else {
            continue;
        };

        let progress = ProgressBar::new(table.len() as u64)
            .with_style(style.clone())
            .with_message(format!("deduplicating {}", side.label));
        let canonical = scrub_column(&mut table, column, &scrubber, args.score_cutoff, &progress);
        progress.finish();

        info!(column = side.component, canonical, "scrubbed component column");
    }

    let mut layout = SheetLayout::default();
    if let Some(column) = table.column_index(COMPONENT_ID_COLUMN) {
        fill_component_ids(&mut table, column)?;
        layout.numeric_columns.push(column);
    }

    write_table(&args.output, &table, &layout)?;
    info!(path = %args.output.display(), "saved cleaned workbook");

    Ok(())
}

/// Cleans every cell of `column`, then merges near-duplicates. Returns the
/// number of distinct canonical entries.
pub fn scrub_column(
    table: &mut Table,
    column: usize,
    scrubber: &TextScrubber,
    score_cutoff: f64,
    progress: &ProgressBar,
) -> usize {
    let mut deduplicator = Deduplicator::new(score_cutoff);
    for row in 0..table.len() {
        let cleaned = scrubber.clean(table.cell(row, column));
        let resolved = deduplicator.resolve(&cleaned);
        table.set_cell(row, column, resolved);
        progress.inc(1);
    }
    deduplicator.canonical_count()
}

/// Blank IDs become the 1-based row number; every ID is rendered as an integer.
pub fn fill_component_ids(table: &mut Table, column: usize) -> Result<()> {
    for row in 0..table.len() {
        let raw = table.cell(row, column).trim().to_string();
        let id = if raw.is_empty() {
            (row + 1) as i64
        } else {
            let Some(value) = raw.parse::<f64>().ok().filter(|value| value.is_finite()) else {
                bail!("non-numeric {COMPONENT_ID_COLUMN} '{raw}' in row {}", row + 2);
            };
            value.trunc() as i64
        };
        table.set_cell(row, column, id.to_string());
    }
    Ok(())
}
