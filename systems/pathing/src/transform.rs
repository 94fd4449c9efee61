//! Coordinate transform between tile-local layouts and the staircase board.
//!
//! Placed tiles do not line up on a plain Cartesian grid. Crossing into the
//! next tile column shifts the row by one, and crossing into the next tile row
//! shifts the column by one. Two cells are connected along an axis only once
//! that correction is applied.

use heist_core::{CellCoord, Direction, TILE_SIZE};

fn tile_index(value: i32) -> i32 {
    value.div_euclid(TILE_SIZE)
}

/// Classifies the straight move from `from` to `to`, if one exists.
///
/// Returns `None` for identical cells and for cells that are not aligned once
/// the diagonal correction is applied.
#[must_use]
pub fn classify(from: CellCoord, to: CellCoord) -> Option<Direction> {
    let (from_tile, to_tile) = (from.tile(), to.tile());
    let column_shift = from_tile.y() - to_tile.y();
    let row_shift = to_tile.x() - from_tile.x();

    let vertical = from.x() == to.x() + column_shift;
    let horizontal = from.y() == to.y() + row_shift;

    if vertical && from.y() > to.y() {
        Some(Direction::Up)
    } else if vertical && from.y() < to.y() {
        Some(Direction::Down)
    } else if horizontal && from.x() > to.x() {
        Some(Direction::Left)
    } else if horizontal && from.x() < to.x() {
        Some(Direction::Right)
    } else {
        None
    }
}

/// Enumerates every cell from `from` to `to` inclusive along `direction`.
///
/// The caller is expected to pass the direction returned by [`classify`]; the
/// walk follows the staircase so its last cell equals `to`.
#[must_use]
pub fn walk(from: CellCoord, to: CellCoord, direction: Direction) -> Vec<CellCoord> {
    let along_row = |x: i32| CellCoord::new(x, from.y() + tile_index(from.x()) - tile_index(x));
    let along_column = |y: i32| CellCoord::new(from.x() + tile_index(y) - tile_index(from.y()), y);

    match direction {
        Direction::Right => (from.x()..=to.x()).map(along_row).collect(),
        Direction::Left => (to.x()..=from.x()).rev().map(along_row).collect(),
        Direction::Down => (from.y()..=to.y()).map(along_column).collect(),
        Direction::Up => (to.y()..=from.y()).rev().map(along_column).collect(),
    }
}
