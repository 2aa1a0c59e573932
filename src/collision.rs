//! Collision predicate and merge of a landed piece into the grid.

use crate::grid::Grid;
use crate::piece::ActivePiece;

/// True if any filled cell of `piece` is outside the grid or on an occupied cell.
pub fn collides(grid: &Grid, piece: &ActivePiece) -> bool {
    piece.cells().any(|(x, y, _)| {
        if x < 0 || y < 0 {
            return true;
        }
        // get() is None past the right or bottom edge
        grid.get(x as usize, y as usize).is_none_or(|cell| cell != 0)
    })
}

/// Write the piece's colour into every cell it covers. No collision check; cells
/// outside the grid are dropped.
pub fn merge(grid: &mut Grid, piece: &ActivePiece) {
    for (x, y, value) in piece.cells() {
        if x >= 0 && y >= 0 {
            grid.set(x as usize, y as usize, value);
        }
    }
}
