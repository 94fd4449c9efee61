//! Sparse board registry and the side effects of writing tiles onto it.

use std::collections::{BTreeMap, BTreeSet};

use heist_core::{
    BoardView, Cell, CellContents, CellCoord, FlagError, ItemFlag, ItemKind, LocalCell,
    Orientation, PlacementError, TileId, TileTemplate,
};

/// Offset of the cell a bridge leads to, selected by the bridge's tile-local column.
const BRIDGE_FACING: [(i32, i32); 4] = [(-1, 0), (0, 1), (0, -1), (1, 0)];

/// Registry of every board coordinate covered by a placed tile.
#[derive(Clone, Debug, Default)]
pub(crate) struct Board {
    cells: BTreeMap<CellCoord, CellContents>,
    placed: BTreeSet<TileId>,
}

/// Outcome of a successful placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    /// Bridge cells that were marked explored because they face revealed territory.
    pub(crate) bridges_explored: Vec<CellCoord>,
}

impl Board {
    pub(crate) fn view(&self) -> BoardView<'_> {
        BoardView::new(&self.cells)
    }

    pub(crate) fn get(&self, coord: CellCoord) -> Cell<'_> {
        self.view().get(coord)
    }

    /// Raises an item flag, returning whether it changed.
    pub(crate) fn set_flag(&mut self, coord: CellCoord, flag: ItemFlag) -> Result<bool, FlagError> {
        let item = self
            .cells
            .get_mut(&coord)
            .and_then(|contents| contents.item.as_mut())
            .ok_or(FlagError::NoItem { cell: coord })?;

        if item.flags.get(flag) {
            return Ok(false);
        }
        item.flags.raise(flag);
        Ok(true)
    }

    /// Writes the sixteen cells of a tile onto the board.
    ///
    /// The board is left untouched when the placement is rejected.
    pub(crate) fn place(
        &mut self,
        template: &TileTemplate,
        origin: CellCoord,
        orientation: Orientation,
    ) -> Result<Placement, PlacementError> {
        if !template.is_complete() {
            return Err(PlacementError::IncompleteTemplate);
        }
        if !origin.is_tile_aligned() {
            return Err(PlacementError::Misaligned);
        }
        if self.placed.contains(&template.id) {
            return Err(PlacementError::AlreadyPlaced);
        }

        let oriented = orient(template, origin, orientation);
        if oriented.iter().any(|(coord, _)| self.cells.contains_key(coord)) {
            return Err(PlacementError::Occupied);
        }

        let mut bridges = Vec::new();
        for (coord, contents) in oriented {
            if contents
                .item
                .is_some_and(|item| item.kind == ItemKind::Bridge)
            {
                bridges.push((coord, contents.tile_cell));
            }
            let _ = self.cells.insert(coord, contents);
        }
        let _ = self.placed.insert(template.id);

        let mut bridges_explored = Vec::new();
        for (coord, tile_cell) in bridges {
            let (dx, dy) = BRIDGE_FACING[usize::from(tile_cell.x())];
            if self.get(coord.offset(dx, dy)).is_empty() {
                continue;
            }
            if let Ok(true) = self.set_flag(coord, ItemFlag::Explored) {
                bridges_explored.push(coord);
            }
        }

        Ok(Placement { bridges_explored })
    }
}

fn orient(
    template: &TileTemplate,
    origin: CellCoord,
    orientation: Orientation,
) -> Vec<(CellCoord, CellContents)> {
    let turns = orientation.quarter_turns();
    let rotate = |mut local: LocalCell| {
        for _ in 0..turns {
            local = local.rotated_clockwise();
        }
        local
    };
    let place = |local: LocalCell| origin.offset(i32::from(local.x()), i32::from(local.y()));

    template
        .cells
        .iter()
        .map(|cell| {
            let tile_cell = rotate(cell.at);
            let mut walls = cell.walls;
            for _ in 0..turns {
                walls = walls.rotated_clockwise();
            }
            let contents = CellContents {
                tile: template.id,
                tile_cell,
                walls,
                item: cell.item,
                escalator: cell.escalator.map(|target| place(rotate(target))),
            };
            (place(tile_cell), contents)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_core::{HeroColor, Item, Side, Wall};

    fn local(x: u8, y: u8) -> LocalCell {
        LocalCell::new(x, y).expect("local cell in range")
    }

    #[test]
    fn placement_writes_sixteen_cells() {
        let mut board = Board::default();
        let placement = board
            .place(
                &TileTemplate::open(TileId::new(1)),
                CellCoord::new(4, -4),
                Orientation::default(),
            )
            .expect("placement succeeds");

        assert!(placement.bridges_explored.is_empty());
        assert_eq!(board.view().len(), 16);
        let corner = board.get(CellCoord::new(7, -1));
        assert_eq!(
            corner.contents().map(|contents| contents.tile_cell),
            Some(local(3, 3))
        );
        assert!(board.get(CellCoord::new(8, -1)).is_empty());
    }

    #[test]
    fn placement_rejects_misaligned_origin() {
        let mut board = Board::default();
        let result = board.place(
            &TileTemplate::open(TileId::new(1)),
            CellCoord::new(1, 0),
            Orientation::default(),
        );
        assert_eq!(result, Err(PlacementError::Misaligned));
        assert!(board.view().is_empty());
    }

    #[test]
    fn placement_rejects_overlap_and_repeats() {
        let mut board = Board::default();
        let origin = CellCoord::new(0, 0);
        let _ = board
            .place(&TileTemplate::open(TileId::new(1)), origin, Orientation::default())
            .expect("first placement succeeds");

        assert_eq!(
            board.place(&TileTemplate::open(TileId::new(2)), origin, Orientation::default()),
            Err(PlacementError::Occupied)
        );
        assert_eq!(
            board.place(
                &TileTemplate::open(TileId::new(1)),
                CellCoord::new(4, 0),
                Orientation::default()
            ),
            Err(PlacementError::AlreadyPlaced)
        );
    }

    #[test]
    fn placement_rotates_cells_walls_and_escalators() {
        let mut template = TileTemplate::open(TileId::new(5));
        if let Some(cell) = template.cell_mut(local(1, 0)) {
            cell.walls.top = Wall::Gated(HeroColor::Orange);
            cell.escalator = Some(local(1, 3));
        }

        let mut board = Board::default();
        let _ = board
            .place(&template, CellCoord::new(0, 0), Orientation::new(1))
            .expect("placement succeeds");

        let rotated = board.get(CellCoord::new(3, 1));
        assert_eq!(rotated.wall(Side::Right), Wall::Gated(HeroColor::Orange));
        assert_eq!(rotated.wall(Side::Top), Wall::Open);
        assert_eq!(rotated.escalator(), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn bridge_facing_revealed_cell_is_explored() {
        let mut board = Board::default();
        let _ = board
            .place(&TileTemplate::open(TileId::new(1)), CellCoord::new(0, 0), Orientation::default())
            .expect("first tile");

        let mut template = TileTemplate::open(TileId::new(2));
        if let Some(cell) = template.cell_mut(local(0, 2)) {
            cell.item = Some(Item::new(ItemKind::Bridge, None));
        }
        let placement = board
            .place(&template, CellCoord::new(4, 0), Orientation::default())
            .expect("second tile");

        assert_eq!(placement.bridges_explored, vec![CellCoord::new(4, 2)]);
        assert!(board.get(CellCoord::new(4, 2)).flag(ItemFlag::Explored));
    }

    #[test]
    fn bridge_facing_unrevealed_space_stays_unexplored() {
        let mut board = Board::default();
        let mut template = TileTemplate::open(TileId::new(2));
        if let Some(cell) = template.cell_mut(local(0, 2)) {
            cell.item = Some(Item::new(ItemKind::Bridge, None));
        }
        let placement = board
            .place(&template, CellCoord::new(4, 0), Orientation::default())
            .expect("tile");

        assert!(placement.bridges_explored.is_empty());
        assert!(!board.get(CellCoord::new(4, 2)).flag(ItemFlag::Explored));
    }

    #[test]
    fn set_flag_requires_an_item() {
        let mut board = Board::default();
        let mut template = TileTemplate::open(TileId::new(1));
        if let Some(cell) = template.cell_mut(local(2, 2)) {
            cell.item = Some(Item::new(ItemKind::Camera, Some(HeroColor::Yellow)));
        }
        let _ = board
            .place(&template, CellCoord::new(0, 0), Orientation::default())
            .expect("tile");

        assert_eq!(board.set_flag(CellCoord::new(2, 2), ItemFlag::Used), Ok(true));
        assert_eq!(board.set_flag(CellCoord::new(2, 2), ItemFlag::Used), Ok(false));
        assert_eq!(
            board.set_flag(CellCoord::new(1, 1), ItemFlag::Used),
            Err(FlagError::NoItem {
                cell: CellCoord::new(1, 1)
            })
        );
        assert_eq!(
            board.set_flag(CellCoord::new(40, 40), ItemFlag::Used),
            Err(FlagError::NoItem {
                cell: CellCoord::new(40, 40)
            })
        );
    }
}
