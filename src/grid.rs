//! Grid: the field of landed blocks, and the line sweep.
//!
//! Cells are colour classes `0..=MAX_COLOR` stored row-major in one buffer.
//! `y = 0` is the top row. Only merge (write) and [`Grid::sweep`] change the contents
//! during play.

/// Highest colour class a cell can hold.
pub const MAX_COLOR: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// cells[y * width + x]
    cells: Vec<u8>,
}

/// Result of one sweep: the row index each removal happened at, bottom-first.
/// The same index repeats when stacked full rows collapse into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sweep {
    pub rows: Vec<usize>,
}

impl Sweep {
    #[inline]
    pub fn count(&self) -> u32 {
        self.rows.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Where each removed row sat before the sweep. Every earlier removal was at or
    /// below it and shifted it down one row.
    pub fn cleared_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().enumerate().map(|(i, &y)| y.saturating_sub(i))
    }
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Cell value, or `None` outside the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Write a cell. Out-of-range positions are ignored and values are clamped to
    /// `MAX_COLOR`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value.min(MAX_COLOR);
        }
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks_exact(self.width.max(1))
    }

    /// A zero-width row is never full, so sweeping an empty-width grid terminates.
    pub fn is_row_full(&self, y: usize) -> bool {
        self.width > 0 && y < self.height && self.row(y).iter().all(|&c| c != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Remove row `y`, shift everything above it down one row and leave an empty row
    /// on top.
    fn remove_row(&mut self, y: usize) {
        let w = self.width;
        self.cells.copy_within(0..y * w, w);
        self.cells[..w].fill(0);
    }

    /// Clear every full row, scanning bottom to top. After a removal the same index
    /// is checked again since the row above has just moved into it.
    pub fn sweep(&mut self) -> Sweep {
        let mut sweep = Sweep::default();
        let mut y = self.height;
        while y > 0 {
            if self.is_row_full(y - 1) {
                self.remove_row(y - 1);
                sweep.rows.push(y - 1);
            } else {
                y -= 1;
            }
        }
        sweep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(grid: &mut Grid, y: usize, except: &[usize]) {
        for x in 0..grid.width() {
            if !except.contains(&x) {
                grid.set(x, y, 1);
            }
        }
    }

    #[test]
    fn test_new_grid_is_empty() {
        let g = Grid::new(15, 30);
        assert_eq!(g.width(), 15);
        assert_eq!(g.height(), 30);
        assert!(g.is_empty());
        assert_eq!(g.rows().count(), 30);
        assert!(g.rows().all(|r| r.len() == 15));
    }

    #[test]
    fn test_get_out_of_bounds() {
        let g = Grid::new(4, 4);
        assert_eq!(g.get(4, 0), None);
        assert_eq!(g.get(0, 4), None);
        assert_eq!(g.get(3, 3), Some(0));
    }

    #[test]
    fn test_set_clamps_colour() {
        let mut g = Grid::new(4, 4);
        g.set(1, 1, 42);
        assert_eq!(g.get(1, 1), Some(MAX_COLOR));
        g.set(9, 9, 1);
        assert_eq!(g.cells.iter().filter(|&&c| c != 0).count(), 1);
    }

    #[test]
    fn test_sweep_single_full_row() {
        let mut g = Grid::new(15, 30);
        fill_row(&mut g, 29, &[]);
        fill_row(&mut g, 28, &[3]);
        g.set(5, 27, 4);
        let before_28 = g.row(28).to_vec();

        let sweep = g.sweep();
        assert_eq!(sweep.count(), 1);
        assert_eq!(sweep.rows, vec![29]);
        assert_eq!(g.row(29), &before_28[..]);
        assert_eq!(g.get(5, 28), Some(4));
        assert!(g.row(0).iter().all(|&c| c == 0));
        assert_eq!(g.rows().count(), 30);
    }

    #[test]
    fn test_sweep_nothing_full_is_noop() {
        let mut g = Grid::new(15, 30);
        fill_row(&mut g, 29, &[0]);
        fill_row(&mut g, 10, &[14]);
        let before = g.clone();
        let sweep = g.sweep();
        assert!(sweep.is_empty());
        assert_eq!(g, before);
    }

    #[test]
    fn test_sweep_adjacent_full_rows_rechecks_index() {
        let mut g = Grid::new(6, 8);
        fill_row(&mut g, 7, &[]);
        fill_row(&mut g, 6, &[]);
        fill_row(&mut g, 5, &[2]);
        fill_row(&mut g, 4, &[]);
        let sweep = g.sweep();
        assert_eq!(sweep.count(), 3);
        assert_eq!(sweep.rows, vec![7, 7, 6]);
        assert_eq!(sweep.cleared_rows().collect::<Vec<_>>(), vec![7, 6, 4]);
        assert_eq!(g.get(2, 7), Some(0));
        assert_eq!(g.get(0, 7), Some(1));
        assert!((0..7).all(|y| g.row(y).iter().all(|&c| c == 0)));
    }

    #[test]
    fn test_sweep_top_row_full() {
        let mut g = Grid::new(3, 3);
        fill_row(&mut g, 0, &[]);
        let sweep = g.sweep();
        assert_eq!(sweep.rows, vec![0]);
        assert!(g.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut g = Grid::new(3, 3);
        fill_row(&mut g, 2, &[]);
        g.clear();
        assert!(g.is_empty());
    }

    #[test]
    fn test_stacked_rows_map_back_to_their_positions() {
        let mut g = Grid::new(4, 30);
        fill_row(&mut g, 29, &[]);
        fill_row(&mut g, 28, &[]);
        let sweep = g.sweep();
        assert_eq!(sweep.rows, vec![29, 29]);
        assert_eq!(sweep.cleared_rows().collect::<Vec<_>>(), vec![29, 28]);
    }

    #[test]
    fn test_zero_width_sweep_terminates() {
        let mut g = Grid::new(0, 3);
        assert!(!g.is_row_full(0));
        let sweep = g.sweep();
        assert!(sweep.is_empty());
        assert_eq!(g.height(), 3);
    }
}
