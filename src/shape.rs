//! Square shape matrices and quarter-turn rotation.

/// A piece shape stored in a square bounding box, row-major. Zero cells are transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    size: usize,
    cells: Vec<u8>,
}

impl Shape {
    /// Build a shape from rows. Ragged or rectangular input is padded with zeros to a
    /// square so rotation stays well defined.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let size = rows.len().max(cols);
        let mut cells = vec![0; size * size];
        for (y, row) in rows.iter().enumerate() {
            cells[y * size..y * size + row.len()].copy_from_slice(row);
        }
        Self { size, cells }
    }

    /// Side length of the bounding box (also the width used for spawn centering).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.size || y >= self.size {
            return 0;
        }
        self.cells[y * self.size + x]
    }

    /// Nonzero cells as `(x, y, value)` relative to the top-left corner.
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(|(i, v)| (i % self.size, i / self.size, *v))
    }

    /// Quarter turn: transpose, then reverse the row order.
    pub fn rotate(&self) -> Self {
        let n = self.size;
        let mut cells = vec![0; n * n];
        for y in 0..n {
            for x in 0..n {
                // row y of the result is column n-1-y of the input
                cells[y * n + x] = self.cells[x * n + (n - 1 - y)];
            }
        }
        Self { size: n, cells }
    }
}
