use crate::error::{KitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One value of one indicator for one row label, as delivered by a data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub row: String,
    pub indicator: String,
    pub value: Option<f64>,
}

/// Row-indexed numeric table: one row per label (country code), one column per indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    index_name: String,
    index: Vec<String>,
    columns: Vec<String>,
    // row-major, index.len() x columns.len()
    values: Vec<Vec<Option<f64>>>,
}

/// Read-only view of a single row, handed to derived column closures.
pub struct RowView<'a> {
    columns: &'a [String],
    values: &'a [Option<f64>],
}

impl<'a> RowView<'a> {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values[i])
    }
}

impl IndicatorTable {
    pub fn new(index_name: &str, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.to_string(),
            index: Vec::new(),
            columns,
            values: Vec::new(),
        }
    }

    /// Pivot long observations into a table with `columns` in the given order.
    ///
    /// Rows come out sorted by label; an indicator missing for a row leaves an
    /// empty cell. Observations for indicators outside `columns` are ignored.
    pub fn from_observations(
        index_name: &str,
        columns: Vec<String>,
        observations: impl IntoIterator<Item = Observation>,
    ) -> Self {
        let positions: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut rows: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for obs in observations {
            let Some(&col) = positions.get(obs.indicator.as_str()) else {
                continue;
            };
            let row = rows
                .entry(obs.row)
                .or_insert_with(|| vec![None; columns.len()]);
            if obs.value.is_some() {
                row[col] = obs.value;
            }
        }

        let (index, values): (Vec<String>, Vec<Vec<Option<f64>>>) = rows.into_iter().unzip();
        Self {
            index_name: index_name.to_string(),
            index,
            columns,
            values,
        }
    }

    pub fn push_row(&mut self, label: &str, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(KitError::InvalidTable(format!(
                "row {} has {} values, expected {}",
                label,
                values.len(),
                self.columns.len()
            )));
        }
        self.index.push(label.to_string());
        self.values.push(values);
        Ok(())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.index
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn column_position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| KitError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.column_position(name)?;
        Ok(self.values.iter().map(|row| row[col]).collect())
    }

    pub fn value(&self, row: &str, column: &str) -> Result<Option<f64>> {
        let col = self.column_position(column)?;
        Ok(self
            .index
            .iter()
            .position(|label| label == row)
            .and_then(|r| self.values[r][col]))
    }

    /// Rename columns through a lookup; names without a mapping stay as they are.
    pub fn rename_columns(&mut self, mapping: &HashMap<String, String>) {
        for column in &mut self.columns {
            if let Some(renamed) = mapping.get(column) {
                *column = renamed.clone();
            }
        }
    }

    /// Drop every row that has at least one missing cell. Returns how many were dropped.
    pub fn drop_incomplete(&mut self) -> usize {
        let before = self.index.len();
        let mut kept_index = Vec::with_capacity(before);
        let mut kept_values = Vec::with_capacity(before);
        for (label, row) in self.index.drain(..).zip(self.values.drain(..)) {
            if row.iter().all(Option::is_some) {
                kept_index.push(label);
                kept_values.push(row);
            }
        }
        self.index = kept_index;
        self.values = kept_values;
        before - self.index.len()
    }

    /// Append a column computed per row. Non-finite results become missing cells.
    pub fn add_derived<F>(&mut self, name: &str, derive: F) -> Result<()>
    where
        F: Fn(&RowView<'_>) -> Option<f64>,
    {
        if self.columns.iter().any(|c| c == name) {
            return Err(KitError::InvalidTable(format!("column {} already exists", name)));
        }

        let derived: Vec<Option<f64>> = self
            .values
            .iter()
            .map(|row| {
                let view = RowView {
                    columns: &self.columns,
                    values: row,
                };
                derive(&view).filter(|v| v.is_finite())
            })
            .collect();

        self.columns.push(name.to_string());
        for (row, value) in self.values.iter_mut().zip(derived) {
            row.push(value);
        }
        Ok(())
    }

    /// Every unordered pair of columns, in column order.
    pub fn column_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (i, x) in self.columns.iter().enumerate() {
            for y in &self.columns[i + 1..] {
                pairs.push((x.clone(), y.clone()));
            }
        }
        pairs
    }
}
