//! Visit-by-category boolean matrix

use std::fmt;

/// The result of comorbidity matching: one boolean row per distinct visit,
/// one column per map category.
///
/// Rows follow the first-seen order of visit identifiers in the input;
/// columns follow the category order of the map. Immutable once produced,
/// apart from the hierarchy-collapsing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComorbidityMatrix {
    visits: Vec<String>,
    categories: Vec<String>,
    // Row-major.
    values: Vec<bool>,
}

impl ComorbidityMatrix {
    pub(crate) fn new(visits: Vec<String>, categories: Vec<String>, values: Vec<bool>) -> Self {
        debug_assert_eq!(values.len(), visits.len() * categories.len());
        Self {
            visits,
            categories,
            values,
        }
    }

    /// Number of visit rows
    #[must_use]
    pub fn n_visits(&self) -> usize {
        self.visits.len()
    }

    /// Number of category columns
    #[must_use]
    pub fn n_categories(&self) -> usize {
        self.categories.len()
    }

    /// Visit identifiers, in row order
    #[must_use]
    pub fn visit_ids(&self) -> &[String] {
        &self.visits
    }

    /// Category names, in column order
    #[must_use]
    pub fn category_names(&self) -> &[String] {
        &self.categories
    }

    /// Column index of a category name, if present
    #[must_use]
    pub fn column_of(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }

    /// The value at (row, column)
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> bool {
        self.values[row * self.categories.len() + column]
    }

    pub(crate) fn set(&mut self, row: usize, column: usize, value: bool) {
        let width = self.categories.len();
        self.values[row * width + column] = value;
    }

    /// One visit's boolean row
    #[must_use]
    pub fn row(&self, row: usize) -> &[bool] {
        let width = self.categories.len();
        &self.values[row * width..(row + 1) * width]
    }

    /// The matrix as labeled rows, with the visit identifier as an explicit
    /// column. A presentation choice only; the values are the same.
    #[must_use]
    pub fn labeled_rows(&self) -> Vec<(&str, &[bool])> {
        (0..self.n_visits())
            .map(|r| (self.visits[r].as_str(), self.row(r)))
            .collect()
    }
}

impl fmt::Display for ComorbidityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "visit\t{}", self.categories.join("\t"))?;
        for (visit, row) in self.labeled_rows() {
            let cells: Vec<&str> = row.iter().map(|&v| if v { "1" } else { "0" }).collect();
            writeln!(f, "{visit}\t{}", cells.join("\t"))?;
        }
        Ok(())
    }
}
