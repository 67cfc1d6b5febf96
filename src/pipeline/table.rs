//! Editable table model: Markdown table ⇄ structured grid.
//!
//! [`TableGrid::parse`] reads a table fragment into header labels and rows
//! of cells; [`TableGrid::to_markdown`] writes it back. The pair obeys the
//! round-trip law: `parse(render(parse(m)))` equals `parse(m)` for every
//! rectangular table `m`. Only whitespace around cells is normalised.
//!
//! Parsing keeps ragged rows exactly as the provider produced them.
//! [`TableGrid::normalized`] makes a grid rectangular; the editor in
//! [`crate::document`] normalises once, when a table is first opened for
//! editing, and every mutator here keeps a rectangular grid rectangular.
//!
//! All mutators are pure: they return a new grid and leave `self` alone.

use crate::error::TableEditError;
use serde::{Deserialize, Serialize};

/// Label given to columns created by [`TableGrid::insert_column_after`] and
/// to header slots added when normalising over-long rows.
pub const NEW_COLUMN_LABEL: &str = "New Column";

/// Header labels plus ordered rows of cell strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Parse a Markdown table.
    ///
    /// Blank lines are ignored. Fewer than two remaining lines (header and
    /// separator) yields an empty grid. The separator line is skipped
    /// without validation.
    pub fn parse(markdown: &str) -> Self {
        let lines: Vec<&str> = markdown
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() < 2 {
            return Self::default();
        }
        let header = parse_row(lines[0]);
        let rows = lines[2..].iter().map(|l| parse_row(l)).collect();
        Self { header, rows }
    }

    /// Render as a GFM pipe table: header, `---` separator, one line per row.
    ///
    /// No trailing newline. An empty grid renders as an empty string.
    pub fn to_markdown(&self) -> String {
        if self.header.is_empty() && self.rows.is_empty() {
            return String::new();
        }
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(render_row(&self.header));
        lines.push(render_row(&vec!["---".to_string(); self.header.len()]));
        lines.extend(self.rows.iter().map(|r| render_row(r)));
        lines.join("\n")
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when every row has exactly one cell per header label.
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|r| r.len() == self.header.len())
    }

    /// Make the grid rectangular without losing any cell.
    ///
    /// Short rows are padded with empty cells. When a row is longer than
    /// the header, the header grows with [`NEW_COLUMN_LABEL`] slots and
    /// every other row is padded to match.
    pub fn normalized(&self) -> Self {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.header.len());
        let mut header = self.header.clone();
        header.resize(width, NEW_COLUMN_LABEL.to_string());
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { header, rows }
    }

    /// Replace the cell at (`row`, `col`).
    pub fn set_cell(&self, row: usize, col: usize, value: impl Into<String>) -> Result<Self, TableEditError> {
        check("row", row, self.rows.len())?;
        check("column", col, self.rows[row].len())?;
        let mut next = self.clone();
        next.rows[row][col] = value.into();
        Ok(next)
    }

    /// Replace the header label of column `col`.
    pub fn set_header(&self, col: usize, value: impl Into<String>) -> Result<Self, TableEditError> {
        check("column", col, self.header.len())?;
        let mut next = self.clone();
        next.header[col] = value.into();
        Ok(next)
    }

    /// Insert an empty row (one empty cell per header label) after `row`.
    ///
    /// On a grid with no body rows, `row == 0` inserts the first row.
    pub fn insert_row_after(&self, row: usize) -> Result<Self, TableEditError> {
        let at = if self.rows.is_empty() && row == 0 {
            0
        } else {
            check("row", row, self.rows.len())?;
            row + 1
        };
        let mut next = self.clone();
        next.rows.insert(at, vec![String::new(); self.header.len()]);
        Ok(next)
    }

    /// Remove body row `row`.
    pub fn delete_row(&self, row: usize) -> Result<Self, TableEditError> {
        check("row", row, self.rows.len())?;
        let mut next = self.clone();
        next.rows.remove(row);
        Ok(next)
    }

    /// Insert a column after `col`: a [`NEW_COLUMN_LABEL`] header and an
    /// empty cell in every row.
    pub fn insert_column_after(&self, col: usize) -> Result<Self, TableEditError> {
        check("column", col, self.header.len())?;
        let mut next = self.clone();
        next.header.insert(col + 1, NEW_COLUMN_LABEL.to_string());
        for r in &mut next.rows {
            let at = (col + 1).min(r.len());
            r.insert(at, String::new());
        }
        Ok(next)
    }

    /// Remove column `col` from the header and every row.
    ///
    /// A grid keeps at least one column: on a single-column grid this
    /// returns an unchanged copy.
    pub fn delete_column(&self, col: usize) -> Result<Self, TableEditError> {
        check("column", col, self.header.len())?;
        if self.header.len() <= 1 {
            return Ok(self.clone());
        }
        let mut next = self.clone();
        next.header.remove(col);
        for r in &mut next.rows {
            if col < r.len() {
                r.remove(col);
            }
        }
        Ok(next)
    }
}

/// Split one pipe row into trimmed cells: one leading and one trailing `|`
/// are dropped, the rest is split on `|`.
pub fn parse_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|c| c.trim().to_string()).collect()
}

/// `| a | b |` for `["a", "b"]`.
pub fn render_row<S: AsRef<str>>(cells: &[S]) -> String {
    let joined = cells.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" | ");
    format!("| {} |", joined)
}

fn check(axis: &'static str, index: usize, len: usize) -> Result<(), TableEditError> {
    if index < len {
        Ok(())
    } else {
        Err(TableEditError::OutOfBounds { axis, index, len })
    }
}
