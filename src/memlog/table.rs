//! Section records and the sections × metrics table built from them.
//!
//! A [`Section`] holds the metrics reported during one planner return. The
//! [`SectionTable`] is the ordered list of sections plus the union of all
//! metric names, in the order they were first seen.

use indexmap::{IndexMap, IndexSet};

/// Name of the index column in the textual dump.
pub const INDEX_NAME: &str = "section_index";

/// Decimal places kept in the textual dump.
const DUMP_PRECISION: usize = 6;

/// Metrics recorded during a single planner return.
///
/// A value of `None` means the line matched but its literal could not be
/// parsed as a number; it is treated as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    values: IndexMap<String, Option<f64>>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any earlier value for the same key.
    ///
    /// Returns true if the key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<f64>) -> bool {
        self.values.insert(key.into(), value).is_some()
    }

    /// Numeric value for `key`, `None` when absent or unparseable.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Metric names in the order they were first recorded.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut section = Section::new();
        for (key, value) in iter {
            section.insert(key, Some(value));
        }
        section
    }
}

/// Ordered sections with the union of their metric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTable {
    sections: Vec<Section>,
    columns: IndexSet<String>,
    terminator: String,
}

impl SectionTable {
    /// Build a table from finalized sections.
    ///
    /// `terminator` names the aggregate metric that [`ordered_columns`](Self::ordered_columns)
    /// always places last.
    pub fn from_sections(sections: Vec<Section>, terminator: impl Into<String>) -> Self {
        let columns = sections
            .iter()
            .flat_map(|section| section.keys().map(str::to_string))
            .collect();
        Self {
            sections,
            columns,
            terminator: terminator.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Metric names in first-seen order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// Value at `row` for `column`; `None` when missing.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        self.sections.get(row).and_then(|section| section.get(column))
    }

    /// Columns for plotting: every non-terminator metric sorted
    /// alphabetically, then the terminator if any section recorded it.
    pub fn ordered_columns(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = self
            .columns()
            .filter(|column| *column != self.terminator)
            .collect();
        ordered.sort_unstable();
        if self.columns.contains(&self.terminator) {
            ordered.push(&self.terminator);
        }
        ordered
    }

    /// One entry per section for `column`.
    pub fn column_series(&self, column: &str) -> Vec<Option<f64>> {
        self.sections
            .iter()
            .map(|section| section.get(column))
            .collect()
    }

    /// Render the table as aligned text.
    ///
    /// Missing values print as zero, values are rounded to six decimals and
    /// every column uses the fewest decimals that represent all its values.
    pub fn render_text(&self) -> String {
        let labels: Vec<String> = (0..self.len()).map(|row| row.to_string()).collect();
        let index_width = labels
            .iter()
            .map(String::len)
            .chain(std::iter::once(INDEX_NAME.len()))
            .max()
            .unwrap_or(INDEX_NAME.len());

        let columns: Vec<(&str, Vec<String>)> = self
            .columns()
            .map(|column| {
                let values: Vec<f64> = self
                    .column_series(column)
                    .into_iter()
                    .map(|value| value.unwrap_or(0.0))
                    .collect();
                (column, format_column(&values))
            })
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .map(|(name, cells)| {
                cells
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(name.len())
            })
            .collect();

        let mut lines = Vec::with_capacity(self.len() + 2);

        let mut header = " ".repeat(index_width);
        for ((name, _), &width) in columns.iter().zip(&widths) {
            header.push_str(&format!("  {name:>width$}"));
        }
        lines.push(header.trim_end().to_string());
        lines.push(INDEX_NAME.to_string());

        for (row, label) in labels.iter().enumerate() {
            let mut line = format!("{label:<index_width$}");
            for ((_, cells), &width) in columns.iter().zip(&widths) {
                line.push_str(&format!("  {:>width$}", cells[row]));
            }
            lines.push(line.trim_end().to_string());
        }

        lines.join("\n")
    }
}

/// Format a column of values with a shared number of decimals.
fn format_column(values: &[f64]) -> Vec<String> {
    let fixed: Vec<String> = values
        .iter()
        .map(|value| normalize_zero(format!("{value:.precision$}", precision = DUMP_PRECISION)))
        .collect();
    let decimals = fixed
        .iter()
        .map(|cell| significant_decimals(cell))
        .max()
        .unwrap_or(1)
        .max(1);
    fixed
        .into_iter()
        .map(|cell| truncate_decimals(cell, decimals))
        .collect()
}

/// Digits after the decimal point once trailing zeros are dropped.
fn significant_decimals(cell: &str) -> usize {
    cell.split_once('.')
        .map(|(_, frac)| frac.trim_end_matches('0').len())
        .unwrap_or(0)
}

fn truncate_decimals(mut cell: String, decimals: usize) -> String {
    // inf/NaN have no fractional part to cut
    if cell.contains('.') {
        cell.truncate(cell.len() - (DUMP_PRECISION - decimals));
    }
    cell
}

/// `-0.000000` prints as `0.000000`.
fn normalize_zero(cell: String) -> String {
    match cell.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => cell,
    }
}
