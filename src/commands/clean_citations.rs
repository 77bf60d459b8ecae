use anyhow::Result;
use tracing::{info, warn};

use super::citations::{CitationMatcher, citation_layout, clean_citation_rows};
use crate::cli::CleanCitationsArgs;
use crate::model::CITATION_COLUMNS;
use crate::sheet::{load_table, write_table};

pub fn run(args: CleanCitationsArgs) -> Result<()> {
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());

    let mut table = load_table(&args.input)?;
    table.require_column(CITATION_COLUMNS[0], &args.input)?;
    info!(path = %args.input.display(), rows = table.len(), "loaded citation workbook");
    if table.is_empty() {
        warn!(path = %args.input.display(), "citation workbook has no rows");
    }

    let matcher = CitationMatcher::new()?;
    clean_citation_rows(&mut table, &matcher);

    write_table(&output, &table, &citation_layout())?;
    info!(path = %output.display(), rows = table.len(), "saved cleaned citations");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::sheet::{SheetLayout, Table};

    #[test]
    fn rewrites_citations_in_canonical_form() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("extracted_citations.xlsx");
        let output = dir.path().join("cleaned.xlsx");

        let mut table = Table::new(CITATION_COLUMNS);
        table.push_row([
            "21 U.S.C. § 601",
            "https://example.gov/d.pdf#page=2",
            "Scope\n",
            "see\n\n21 U.S.C. § 601",
            "https://example.gov/d.pdf",
        ]);
        table.push_row(["eo 14148", "", "", "", ""]);
        write_table(&input, &table, &SheetLayout::default()).expect("seed workbook");

        run(CleanCitationsArgs {
            input: input.clone(),
            output: Some(output.clone()),
        })
        .expect("clean citations");

        let cleaned = load_table(&output).expect("load cleaned");
        assert_eq!(cleaned.cell(0, 0), "21 USC 601");
        assert_eq!(cleaned.cell(0, 2), "Scope");
        assert_eq!(cleaned.cell(0, 3), "see 21 U.S.C. § 601");
        assert_eq!(cleaned.cell(1, 0), "Executive Order 14148");

        let untouched = load_table(&input).expect("load input");
        assert_eq!(untouched.cell(0, 0), "21 U.S.C. § 601");
    }

    #[test]
    fn missing_citation_column_fails_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("other.xlsx");
        let mut table = Table::new(["Something Else"]);
        table.push_row(["x"]);
        write_table(&input, &table, &SheetLayout::default()).expect("seed workbook");

        let error = run(CleanCitationsArgs {
            input,
            output: Some(PathBuf::from("unused.xlsx")),
        })
        .expect_err("no citation column");

        assert!(error.to_string().starts_with("missing column 'Citation'"));
    }
}
