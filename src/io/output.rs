use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{cell_text, Table};

/// Write a table as CSV: header row, then one line per row, no index column
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    write_csv_to(table, file)
}

/// Write a table as CSV to any writer
pub fn write_csv_to<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(table.columns())
        .context("Failed to write CSV header")?;

    for row in table.rows() {
        let cells: Vec<Cow<'_, str>> = row.iter().map(cell_text).collect();
        writer
            .write_record(cells.iter().map(|c| c.as_bytes()))
            .context("Failed to write CSV row")?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
