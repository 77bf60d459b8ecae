use std::path::Path;

use anyhow::Result;

use super::normalize::sanitize_text;
use super::patterns::CitationMatcher;
use crate::model::{CITATION_COLUMNS, CitationRecord};
use crate::sheet::{SheetLayout, Table, write_table};

const CITATION_PAGE_COLUMN: usize = 1;
const URL_COLUMN: usize = 4;

pub fn citation_layout() -> SheetLayout {
    SheetLayout {
        column_width: Some(20.0),
        hyperlink_columns: vec![CITATION_PAGE_COLUMN],
        wrap_columns: vec![URL_COLUMN],
        ..SheetLayout::default()
    }
}

pub fn citation_table(records: Vec<CitationRecord>, matcher: &CitationMatcher) -> Table {
    let mut table = Table::new(CITATION_COLUMNS);
    for record in records {
        table.push_row(record.into_row());
    }
    clean_citation_rows(&mut table, matcher);
    table
}

/// Normalizes every cell and re-canonicalizes the first column in place.
pub fn clean_citation_rows(table: &mut Table, matcher: &CitationMatcher) {
    for row in &mut table.rows {
        for cell in row.iter_mut() {
            *cell = sanitize_text(cell);
        }
        if let Some(citation) = row.first_mut() {
            *citation = matcher.canonicalize(citation);
        }
    }
}

pub fn write_citations(
    path: &Path,
    records: Vec<CitationRecord>,
    matcher: &CitationMatcher,
) -> Result<()> {
    let table = citation_table(records, matcher);
    write_table(path, &table, &citation_layout())
}
