use std::collections::BTreeSet;

use crate::models::Table;

/// Columns that carry no information beyond what the rest of the table has
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RedundantColumns {
    /// Later column of each element-wise identical pair
    pub duplicates: BTreeSet<String>,
    /// Columns holding one value in every row
    pub constants: BTreeSet<String>,
}

impl RedundantColumns {
    /// Every column safe to drop
    pub fn all(&self) -> BTreeSet<String> {
        self.duplicates.union(&self.constants).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty() && self.constants.is_empty()
    }
}

/// Find identical and constant columns
///
/// Compares every pair of columns cell by cell (`Null` equals `Null`), so
/// the cost is O(columns² × rows). Fine for registry-sized tables.
pub fn find_redundant_columns(table: &Table) -> RedundantColumns {
    find_redundant_columns_excluding::<&str>(table, &[])
}

/// Like [`find_redundant_columns`], but `excluded` columns are neither
/// reported nor used as the surviving twin of a pair
///
/// Columns about to be dropped for other reasons go here, so a kept column
/// is never flagged only because it matches one of them.
pub fn find_redundant_columns_excluding<S: AsRef<str>>(
    table: &Table,
    excluded: &[S],
) -> RedundantColumns {
    let columns = table.columns();
    let candidates: Vec<usize> = (0..columns.len())
        .filter(|&i| !excluded.iter().any(|e| e.as_ref() == columns[i]))
        .collect();
    let mut redundant = RedundantColumns::default();

    for (n, &i) in candidates.iter().enumerate() {
        if redundant.duplicates.contains(&columns[i]) {
            // Its twin earlier in the table already covers every later match
            continue;
        }
        for &j in &candidates[n + 1..] {
            if columns_equal(table, i, j) {
                redundant.duplicates.insert(columns[j].clone());
            }
        }
    }

    for &i in &candidates {
        let name = &columns[i];
        if is_constant(table, i) {
            redundant.constants.insert(name.clone());
        }
    }

    redundant
}

fn columns_equal(table: &Table, a: usize, b: usize) -> bool {
    table.rows().iter().all(|row| row[a] == row[b])
}

fn is_constant(table: &Table, index: usize) -> bool {
    let mut values = table.column_values(index);
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => false,
    }
}
