//! Editable view of an assembled document.
//!
//! [`EditableDocument`] splits the merged Markdown once into an arena of
//! fragments keyed by [`FragmentId`]. Ids are assigned at split time and
//! never recomputed, so growing or shrinking one table leaves every other
//! fragment's identity intact.
//!
//! Each table fragment gets a [`TableEditor`] holding its grid. An edit
//! produces a new grid, re-renders it, and writes the Markdown back to the
//! owning fragment only when the text actually changed.

use crate::config::ExtractionMode;
use crate::error::TableEditError;
use crate::pipeline::fragment::{self, DocumentFragment, FragmentId};
use crate::pipeline::table::TableGrid;
use std::collections::HashMap;
use tracing::debug;

/// How cell text should be treated by a display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    /// Plain text; escape before display.
    Text,
    /// Pre-sanitised markup from the provider (e.g. `<ul><li>` lists).
    Markup,
}

/// One operation on a table grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEdit {
    SetCell { row: usize, col: usize, value: String },
    SetHeader { col: usize, value: String },
    InsertRowAfter(usize),
    DeleteRow(usize),
    InsertColumnAfter(usize),
    DeleteColumn(usize),
}

impl TableEdit {
    fn apply_to(&self, grid: &TableGrid) -> Result<TableGrid, TableEditError> {
        match self {
            TableEdit::SetCell { row, col, value } => grid.set_cell(*row, *col, value.as_str()),
            TableEdit::SetHeader { col, value } => grid.set_header(*col, value.as_str()),
            TableEdit::InsertRowAfter(row) => grid.insert_row_after(*row),
            TableEdit::DeleteRow(row) => grid.delete_row(*row),
            TableEdit::InsertColumnAfter(col) => grid.insert_column_after(*col),
            TableEdit::DeleteColumn(col) => grid.delete_column(*col),
        }
    }
}

/// Grid state for one table fragment.
#[derive(Debug, Clone)]
pub struct TableEditor {
    grid: TableGrid,
    editable: bool,
}

impl TableEditor {
    fn new(markdown: &str, editable: bool) -> Self {
        let parsed = TableGrid::parse(markdown);
        // Editing needs a rectangular grid; display keeps the raw shape.
        let grid = if editable { parsed.normalized() } else { parsed };
        Self { grid, editable }
    }

    pub fn grid(&self) -> &TableGrid {
        &self.grid
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn cell_format(&self) -> CellFormat {
        if self.editable {
            CellFormat::Text
        } else {
            CellFormat::Markup
        }
    }
}

/// Fragment arena for one assembled document.
#[derive(Debug, Clone)]
pub struct EditableDocument {
    fragments: Vec<DocumentFragment>,
    editors: HashMap<FragmentId, TableEditor>,
    editable: bool,
}

impl EditableDocument {
    /// Split `markdown`; tables are editable unless `mode` is tabular.
    pub fn new(markdown: &str, mode: ExtractionMode) -> Self {
        Self::with_editable(markdown, mode.tables_editable())
    }

    pub fn with_editable(markdown: &str, editable: bool) -> Self {
        let fragments = fragment::split(markdown);
        let editors: HashMap<FragmentId, TableEditor> = fragments
            .iter()
            .filter(|f| f.is_table())
            .map(|f| (f.id, TableEditor::new(&f.content, editable)))
            .collect();
        debug!(
            "Split document into {} fragment(s), {} table(s)",
            fragments.len(),
            editors.len()
        );
        Self {
            fragments,
            editors,
            editable,
        }
    }

    pub fn fragments(&self) -> &[DocumentFragment] {
        &self.fragments
    }

    /// Ids of the table fragments, in document order.
    pub fn table_ids(&self) -> Vec<FragmentId> {
        self.fragments
            .iter()
            .filter(|f| f.is_table())
            .map(|f| f.id)
            .collect()
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&DocumentFragment> {
        self.fragments.iter().find(|f| f.id == id)
    }

    pub fn editor(&self, id: FragmentId) -> Option<&TableEditor> {
        self.editors.get(&id)
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Reassemble the document from its fragments.
    pub fn markdown(&self) -> String {
        self.fragments.iter().map(|f| f.content.as_str()).collect()
    }

    /// Apply `edit` to the table `id`.
    ///
    /// Returns `Ok(true)` when the fragment's Markdown changed and
    /// `Ok(false)` when the new grid renders to the text it already has.
    pub fn apply(&mut self, id: FragmentId, edit: TableEdit) -> Result<bool, TableEditError> {
        let pos = self
            .fragments
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| TableEditError::UnknownFragment(id.to_string()))?;
        let editor = self
            .editors
            .get_mut(&id)
            .ok_or_else(|| TableEditError::NotATable(id.to_string()))?;
        if !editor.editable {
            return Err(TableEditError::ReadOnly);
        }

        editor.grid = edit.apply_to(&editor.grid)?;

        let fragment = &mut self.fragments[pos];
        let body = fragment.content.trim_end_matches(['\n', '\r']);
        let line_break = &fragment.content[body.len()..];
        let rendered = editor.grid.to_markdown();
        if rendered == body {
            return Ok(false);
        }
        fragment.content = format!("{}{}", rendered, line_break);
        debug!("Table {} updated by {:?}", id, edit);
        Ok(true)
    }
}
