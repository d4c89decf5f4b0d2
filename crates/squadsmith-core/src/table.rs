// Fixed-width column layout shared by writers and readers.
//
// Adjustment lists and roster reports are plain-text tables. One schema
// value describes a table's columns, and the same value formats rows on the
// way out and slices them on the way back in, so the two sides cannot drift.
// Widths count chars, not bytes, matching how `format!` pads. A bounded cell
// must leave at least one space before the next column; anything wider is an
// error, never a silent cut, since the reader could not recover it.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableError {
    #[error("'{value}' is too wide for the {width}-char '{column}' column")]
    CellTooWide {
        column: &'static str,
        width: usize,
        value: String,
    },
}

/// Horizontal alignment of a cell inside its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One column of a fixed-width table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub title: &'static str,
    /// Width in chars. `None` marks the trailing column, which takes the rest
    /// of the line and is never truncated.
    pub width: Option<usize>,
    pub align: Align,
}

impl Column {
    pub const fn left(title: &'static str, width: usize) -> Self {
        Column {
            title,
            width: Some(width),
            align: Align::Left,
        }
    }

    pub const fn center(title: &'static str, width: usize) -> Self {
        Column {
            title,
            width: Some(width),
            align: Align::Center,
        }
    }

    pub const fn rest(title: &'static str) -> Self {
        Column {
            title,
            width: None,
            align: Align::Left,
        }
    }
}

/// Ordered column layout of a fixed-width table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSchema {
    columns: &'static [Column],
}

/// Marker written under the header in every column.
const DELIMITER_CELL: &str = "---";

impl ColumnSchema {
    pub const fn new(columns: &'static [Column]) -> Self {
        ColumnSchema { columns }
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Format one row. Missing trailing cells are written empty. A bounded
    /// cell needs `width - 1` chars or fewer so a space separates it from the
    /// next column; a wider one is `TableError::CellTooWide`.
    pub fn format_row<S: AsRef<str>>(&self, cells: &[S]) -> Result<String, TableError> {
        for (column, cell) in self.columns.iter().zip(cells) {
            let value: &str = cell.as_ref();
            if let Some(width) = column.width {
                if value.chars().count() >= width {
                    return Err(TableError::CellTooWide {
                        column: column.title,
                        width,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(self.layout(cells))
    }

    /// The header row: every column's title.
    pub fn header(&self) -> String {
        let titles: Vec<&str> = self.columns.iter().map(|c| c.title).collect();
        self.layout(&titles)
    }

    /// The row of `---` markers written under the header.
    pub fn delimiter(&self) -> String {
        let cells = vec![DELIMITER_CELL; self.columns.len()];
        self.layout(&cells)
    }

    fn layout<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let mut line = String::new();
        for (i, column) in self.columns.iter().enumerate() {
            let value = cells.get(i).map(|s| s.as_ref()).unwrap_or("");
            match (column.width, column.align) {
                (Some(width), Align::Left) => line.push_str(&format!("{value:<width$}")),
                (Some(width), Align::Center) => line.push_str(&format!("{value:^width$}")),
                (None, _) => line.push_str(value),
            }
        }
        line.trim_end().to_string()
    }

    /// Slice a line into trimmed cells at the column boundaries. Short lines
    /// yield empty trailing cells; the result always has one cell per column.
    pub fn split_row(&self, line: &str) -> Vec<String> {
        let chars: Vec<char> = line.trim_end_matches(['\r', '\n']).chars().collect();
        let mut start = 0usize;
        let mut cells = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let end = match column.width {
                Some(width) => (start + width).min(chars.len()),
                None => chars.len(),
            };
            let begin = start.min(chars.len());
            let cell: String = chars[begin..end.max(begin)].iter().collect();
            cells.push(cell.trim().to_string());
            start = end;
        }
        cells
    }

    /// Whether `line` is this schema's header (titles compared
    /// case-insensitively).
    pub fn is_header(&self, line: &str) -> bool {
        self.split_row(line)
            .iter()
            .zip(self.columns)
            .all(|(cell, column)| cell.eq_ignore_ascii_case(column.title))
    }

    /// Whether `line` is the `---` delimiter row.
    pub fn is_delimiter(&self, line: &str) -> bool {
        let cells = self.split_row(line);
        !cells.is_empty() && cells.iter().all(|c| c == DELIMITER_CELL)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
