//! Table regions reported by table extraction.

use serde::{Deserialize, Serialize};

use super::BBox;

/// A detected table: its bounding region and cell text grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Region occupied by the table
    pub bbox: BBox,

    /// Rows of cell text, top row first
    pub grid: Vec<Vec<String>>,
}

impl TableRegion {
    /// Create a table region.
    pub fn new(bbox: BBox, grid: Vec<Vec<String>>) -> Self {
        Self { bbox, grid }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    /// Number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.grid.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// True when the grid has no cells or every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.grid
            .iter()
            .all(|row| row.iter().all(|cell| cell.trim().is_empty()))
    }
}
