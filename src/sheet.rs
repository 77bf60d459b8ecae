use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{DataType, Reader, open_workbook_auto};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use tracing::warn;

use crate::util::ensure_parent_directory;

const MAX_URL_LENGTH: usize = 2079;

/// First-sheet contents of a workbook: the header row plus string cells.
///
/// Rows are padded to the header width so every `(row, column)` pair inside
/// the header bounds is addressable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn require_column(&self, name: &str, source: &Path) -> Result<usize> {
        match self.column_index(name) {
            Some(index) => Ok(index),
            None => bail!("missing column '{}' in {}", name, source.display()),
        }
    }

    /// Returns the index of `name`, appending an empty column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }

        self.headers.push(name.to_string());
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        width - 1
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = value.into();
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row = cells.into_iter().map(Into::into).collect::<Vec<String>>();
        if row.len() < self.headers.len() {
            row.resize(self.headers.len(), String::new());
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Presentation applied when a [`Table`] is written back to disk.
#[derive(Debug, Clone, Default)]
pub struct SheetLayout {
    pub sheet_name: Option<String>,
    pub column_width: Option<f64>,
    pub hyperlink_columns: Vec<usize>,
    pub wrap_columns: Vec<usize>,
    pub numeric_columns: Vec<usize>,
    /// `(row, column)` pairs, row indexes relative to the data rows.
    pub highlighted_cells: HashSet<(usize, usize)>,
}

pub fn load_table(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("workbook has no sheets: {}", path.display()))?
        .with_context(|| format!("failed to read first sheet of {}", path.display()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        bail!("workbook has no header row: {}", path.display());
    };

    let headers = header_row
        .iter()
        .map(|cell| cell_to_string(cell).trim().to_string())
        .collect::<Vec<String>>();

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(cell_to_string));
    }

    Ok(table)
}

pub fn write_table(path: &Path, table: &Table, layout: &SheetLayout) -> Result<()> {
    ensure_parent_directory(path)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if let Some(name) = &layout.sheet_name {
        worksheet
            .set_name(name)
            .with_context(|| format!("invalid sheet name '{name}'"))?;
    }

    let header_format = Format::new().set_bold();
    let wrap_format = Format::new().set_text_wrap();
    let highlight_format = Format::new().set_background_color(Color::Orange);

    for (column, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, column_number(column)?, header, &header_format)
            .with_context(|| format!("failed to write header '{header}'"))?;
    }

    for (row_index, row) in table.rows.iter().enumerate() {
        let row_number = row_number(row_index + 1)?;
        for (column, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }

            let column_number = column_number(column)?;
            if layout.highlighted_cells.contains(&(row_index, column)) {
                worksheet
                    .write_string_with_format(row_number, column_number, value, &highlight_format)
                    .with_context(|| format!("failed to write cell {row_number}:{column_number}"))?;
            } else if layout.hyperlink_columns.contains(&column) {
                write_hyperlink(worksheet, row_number, column_number, value)?;
            } else if layout.wrap_columns.contains(&column) {
                worksheet
                    .write_string_with_format(row_number, column_number, value, &wrap_format)
                    .with_context(|| format!("failed to write cell {row_number}:{column_number}"))?;
            } else if let Some(number) = layout
                .numeric_columns
                .contains(&column)
                .then(|| value.parse::<f64>().ok())
                .flatten()
            {
                worksheet
                    .write_number(row_number, column_number, number)
                    .with_context(|| format!("failed to write cell {row_number}:{column_number}"))?;
            } else {
                worksheet
                    .write_string(row_number, column_number, value)
                    .with_context(|| format!("failed to write cell {row_number}:{column_number}"))?;
            }
        }
    }

    if let Some(width) = layout.column_width {
        for column in 0..table.headers.len() {
            worksheet
                .set_column_width(column_number(column)?, width)
                .context("failed to set column width")?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to save workbook {}", path.display()))?;

    Ok(())
}

fn write_hyperlink(worksheet: &mut Worksheet, row: u32, column: u16, value: &str) -> Result<()> {
    if value.len() > MAX_URL_LENGTH {
        warn!(row, column, "url too long for a hyperlink, writing as text");
        worksheet
            .write_string(row, column, value)
            .with_context(|| format!("failed to write cell {row}:{column}"))?;
        return Ok(());
    }

    worksheet
        .write_url(row, column, value)
        .with_context(|| format!("failed to write hyperlink {row}:{column}"))?;
    Ok(())
}

fn row_number(index: usize) -> Result<u32> {
    u32::try_from(index).with_context(|| format!("row {index} exceeds sheet limits"))
}

fn column_number(index: usize) -> Result<u16> {
    u16::try_from(index).with_context(|| format!("column {index} exceeds sheet limits"))
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(value) => value.clone(),
        DataType::Float(value) => render_float(*value),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::DateTime(value) => render_float(*value),
        DataType::Duration(value) => render_float(*value),
        DataType::DateTimeIso(value) => value.clone(),
        DataType::DurationIso(value) => value.clone(),
        DataType::Error(error) => format!("#{error:?}"),
        DataType::Empty => String::new(),
    }
}

fn render_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
