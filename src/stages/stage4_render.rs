use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::io::write_csv;
use crate::models::Table;

/// Result of Stage 4 rendering
#[derive(Debug)]
pub struct Stage4Result {
    /// Path the CSV was written to
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Execute Stage 4: Rendering
///
/// Writes the final table as CSV with a header row and no index column.
pub fn execute_stage4(table: &Table, output: &Path) -> Result<Stage4Result> {
    info!("Writing {} rows to {:?}", table.row_count(), output);
    write_csv(table, output)?;

    Ok(Stage4Result {
        path: output.to_path_buf(),
        rows: table.row_count(),
        columns: table.column_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage4_reports_shape() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clean.csv");
        let mut table = Table::new(vec!["a".to_string(), "b".to_string()]);
        table.push_row(vec![serde_json::json!(1), serde_json::json!("x")]);

        let result = execute_stage4(&table, &output).unwrap();

        assert_eq!(result.rows, 1);
        assert_eq!(result.columns, 2);
        assert_eq!(std::fs::read_to_string(&result.path).unwrap(), "a,b\n1,x\n");
    }
}
