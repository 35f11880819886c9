use fxhash::FxHashMap;
use ndarray::{Array1, Array2, ArrayView1};
use std::ops::Range;

use super::constants::MAX_PRESIZED_ROWS;
use super::error::TableError;

/// A column-oriented table of named, equal-length f64 columns.
///
/// Column order is the order in which columns were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    names: Vec<String>,
    columns: Vec<Array1<f64>>,
    lookup: FxHashMap<String, usize>,
    n_rows: usize,
}

impl DataTable {
    /// A table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(|n| n.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.lookup.get(name).map(|idx| self.columns[*idx].view())
    }

    /// Iterate over (name, values) in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, ArrayView1<'_, f64>)> {
        self.names
            .iter()
            .zip(self.columns.iter())
            .map(|(name, col)| (name.as_str(), col.view()))
    }

    /// Append a column. The first column added to an empty table sets the row count.
    pub fn add_column(&mut self, name: &str, values: Array1<f64>) -> Result<(), TableError> {
        if self.lookup.contains_key(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        if self.columns.is_empty() {
            self.n_rows = values.len();
        } else if values.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                name: name.to_string(),
                given: values.len(),
                expected: self.n_rows,
            });
        }
        self.lookup.insert(name.to_string(), self.columns.len());
        self.names.push(name.to_string());
        self.columns.push(values);
        Ok(())
    }

    /// Copy a range of rows into a new table with the same columns
    pub fn slice_rows(&self, rows: Range<usize>) -> DataTable {
        let start = rows.start.min(self.n_rows);
        let end = rows.end.clamp(start, self.n_rows);
        let mut table = DataTable::empty();
        for (name, col) in self.columns() {
            // Names are unique and lengths equal, so this cannot fail
            let _ = table.add_column(name, col.slice(ndarray::s![start..end]).to_owned());
        }
        table.n_rows = end - start;
        table
    }

    /// Row-major matrix of the table, columns in table order
    pub fn to_array2(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros([self.n_rows, self.columns.len()]);
        for (idx, col) in self.columns.iter().enumerate() {
            matrix.column_mut(idx).assign(col);
        }
        matrix
    }
}

/// Per-column storage used while decoding.
///
/// Columns are pre-sized to the sample count from the header and padded with NaN, so a
/// row which skips a field leaves a gap rather than shifting later values.
#[derive(Debug, Clone, Default)]
pub struct ColumnAccumulator {
    capacity: usize,
    names: Vec<&'static str>,
    values: Vec<Vec<f64>>,
}

impl ColumnAccumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.min(MAX_PRESIZED_ROWS),
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Register a new column, returning its index
    pub fn register(&mut self, name: &'static str) -> usize {
        self.names.push(name);
        self.values.push(vec![f64::NAN; self.capacity]);
        self.names.len() - 1
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Write a value into a column at row, growing the column if the header undercounted
    pub fn write(&mut self, column: usize, row: usize, value: f64) {
        let values = &mut self.values[column];
        if row >= values.len() {
            values.resize(row + 1, f64::NAN);
        }
        values[row] = value;
    }

    /// Build the final table with exactly n_rows rows, in registration order.
    ///
    /// Fails if no column was ever registered.
    pub fn assemble(self, n_rows: usize) -> Result<DataTable, TableError> {
        if self.names.is_empty() {
            return Err(TableError::EmptySchema);
        }
        let mut table = DataTable::empty();
        for (name, mut values) in self.names.into_iter().zip(self.values) {
            values.resize(n_rows, f64::NAN);
            table.add_column(name, Array1::from_vec(values))?;
        }
        Ok(table)
    }
}
