//! Table model structures.

use super::Block;
use serde::{Deserialize, Serialize};

/// A cell in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content
    #[serde(default)]
    pub blocks: Vec<Block>,

    /// Horizontal span (colspan)
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub colspan: u32,

    /// Vertical span (rowspan)
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub rowspan: u32,

    /// Whether this is a header cell
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub header: bool,

    /// Background color `#RRGGBB`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

fn default_span() -> u32 {
    1
}

fn is_default_span(span: &u32) -> bool {
    *span == 1
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            colspan: 1,
            rowspan: 1,
            header: false,
            background: None,
        }
    }
}

impl TableCell {
    /// A cell holding the given blocks.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Default::default()
        }
    }

    pub fn with_span(mut self, colspan: u32, rowspan: u32) -> Self {
        self.colspan = colspan.max(1);
        self.rowspan = rowspan.max(1);
        self
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    /// Plain text of the cell content.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A row in a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }
}

/// A table. Rows hold only the cells that start in them: a cell covered by
/// a rowspan or colspan from elsewhere is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<TableRow>,

    /// Column width hints in pixels; empty when unknown.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_widths: Vec<f64>,
}

impl Table {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            rows,
            column_widths: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.cells.is_empty())
    }

    /// Number of grid columns, accounting for colspans and for cells
    /// covered by rowspans from earlier rows.
    pub fn column_count(&self) -> usize {
        self.grid().iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Lay cells out on a grid. Each slot holds `(row, cell)` indices of the
    /// cell occupying it, and whether the slot is the cell's origin.
    pub fn grid(&self) -> Vec<Vec<Option<GridSlot>>> {
        let mut grid: Vec<Vec<Option<GridSlot>>> = vec![Vec::new(); self.rows.len()];

        for (r, row) in self.rows.iter().enumerate() {
            let mut col = 0;
            for (c, cell) in row.cells.iter().enumerate() {
                while grid[r].get(col).is_some_and(Option::is_some) {
                    col += 1;
                }
                let rowspan = cell.rowspan.max(1) as usize;
                let colspan = cell.colspan.max(1) as usize;
                for dr in 0..rowspan {
                    let target = r + dr;
                    if target >= grid.len() {
                        break;
                    }
                    for dc in 0..colspan {
                        let slot_col = col + dc;
                        if grid[target].len() <= slot_col {
                            grid[target].resize(slot_col + 1, None);
                        }
                        grid[target][slot_col] = Some(GridSlot {
                            row: r,
                            cell: c,
                            origin: dr == 0 && dc == 0,
                        });
                    }
                }
                col += colspan;
            }
        }

        grid
    }

    /// Plain text: cells joined by tabs, rows by newlines.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(TableCell::plain_text)
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A grid position occupied by a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSlot {
    pub row: usize,
    pub cell: usize,
    pub origin: bool,
}
