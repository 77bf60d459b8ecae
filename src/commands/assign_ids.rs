use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::components::{ComponentColumns, SIDES};
use crate::cli::AssignIdsArgs;
use crate::sheet::{SheetLayout, Table, load_table, write_table};
use crate::util::sha256_hex;

pub fn run(args: AssignIdsArgs) -> Result<()> {
    let mut table = load_table(&args.input)?;
    for side in SIDES {
        table.require_column(side.description, &args.input)?;
    }
    info!(path = %args.input.display(), rows = table.len(), "loaded component workbook");

    let style = ProgressStyle::with_template("{msg:>14} [{bar:40.cyan/blue}] {pos}/{len} rows")
        .context("invalid progress bar template")?
        .progress_chars("=> ");

    for side in SIDES {
        let started = Instant::now();
        let progress = ProgressBar::new(table.len() as u64)
            .with_style(style.clone())
            .with_message(format!("{} IDs", side.label));

        let filled = fill_missing_ids(&mut table, &side, &progress);
        progress.finish();

        info!(
            side = side.label,
            filled,
            elapsed_secs = format!("{:.2}", started.elapsed().as_secs_f64()),
            "filled missing component ids"
        );
    }

    write_table(&args.output, &table, &SheetLayout::default())?;
    info!(path = %args.output.display(), "saved workbook with component ids");

    Ok(())
}

/// Lowercases, then keeps ASCII letters and digits only.
pub fn normalize_for_id(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

pub fn component_id(source: &str, description: &str) -> String {
    let mut combined = normalize_for_id(source);
    combined.push_str(&normalize_for_id(description));
    sha256_hex(&combined)
}

/// Writes an ID into every row whose ID cell is blank. Existing IDs are kept.
pub fn fill_missing_ids(table: &mut Table, side: &ComponentColumns, progress: &ProgressBar) -> usize {
    let id = table.ensure_column(side.id);
    let source = table.column_index(side.source);
    let description = table.column_index(side.description);

    let mut filled = 0;
    for row in 0..table.len() {
        progress.inc(1);
        if !table.cell(row, id).trim().is_empty() {
            continue;
        }

        let source_text = source.map(|column| table.cell(row, column)).unwrap_or("");
        let description_text = description
            .map(|column| table.cell(row, column))
            .unwrap_or("");
        let value = component_id(source_text, description_text);
        table.set_cell(row, id, value);
        filled += 1;
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::components::{DEPENDENT, ENABLING};

    #[test]
    fn normalization_ignores_case_and_punctuation() {
        assert_eq!(normalize_for_id("USDA APHIS, Wildlife-Services!"), "usdaaphiswildlifeservices");
        assert_eq!(
            component_id("USDA", "Non-lethal tools"),
            component_id("usda", "nonlethal TOOLS")
        );
        assert_eq!(component_id("", ""), sha256_hex(""));
    }

    #[test]
    fn ids_are_sha256_of_normalized_source_and_description() {
        assert_eq!(component_id("A b", "C!"), sha256_hex("abc"));
        assert_eq!(
            component_id("A b", "C!"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn only_blank_ids_are_filled() {
        let mut table = Table::new([
            "Enabling Source",
            "Enabling Component Description",
            "Enabling Component ID",
            "Dependent Component Description",
        ]);
        table.push_row(["USDA", "Drones", "keep-me", "Fencing"]);
        table.push_row(["USDA", "Drones", "   ", "Fencing"]);
        table.push_row(["", "Lasers", "", ""]);

        let progress = ProgressBar::hidden();
        let enabling = fill_missing_ids(&mut table, &ENABLING, &progress);
        let dependent = fill_missing_ids(&mut table, &DEPENDENT, &progress);

        assert_eq!(enabling, 2);
        assert_eq!(dependent, 3);
        assert_eq!(table.cell(0, 2), "keep-me");
        assert_eq!(table.cell(1, 2), component_id("USDA", "Drones"));
        assert_eq!(table.cell(2, 2), component_id("", "Lasers"));

        let dependent_id = table.column_index("Dependent Component ID").expect("created");
        assert_eq!(table.cell(0, dependent_id), component_id("", "Fencing"));
        assert_eq!(table.cell(2, dependent_id), sha256_hex(""));
        assert_eq!(progress.position(), 6);
    }

    #[test]
    fn missing_description_column_fails_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("ivn.xlsx");
        let mut table = Table::new(["Enabling Component Description"]);
        table.push_row(["Drones"]);
        write_table(&input, &table, &SheetLayout::default()).expect("seed workbook");

        let error = run(AssignIdsArgs {
            input,
            output: dir.path().join("out.xlsx"),
        })
        .expect_err("dependent description missing");

        assert!(
            error
                .to_string()
                .starts_with("missing column 'Dependent Component Description'")
        );
    }
}
