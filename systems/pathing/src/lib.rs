#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path engine that builds candidate hero paths and annotates their legality.
//!
//! Path construction and legality checks are pure: they read the board and
//! hero views and only ever write into the [`Path`] they are handed.

pub mod transform;

use std::fmt;

use heist_core::{
    BoardView, Cell, CellCoord, Direction, HeroColor, HeroSnapshot, HeroView, ItemFlag, ItemKind,
    Path, PathKind, PathStep, Phase, Role, RoleSet,
};
use tracing::trace;

/// Read-only inputs consulted while building and checking a path.
#[derive(Clone, Copy, Debug)]
pub struct PathContext<'a> {
    /// Board the hero moves on.
    pub board: BoardView<'a>,
    /// Every hero, used for occupancy checks.
    pub heroes: &'a HeroView,
    /// Capabilities of the player moving the hero.
    pub roles: RoleSet,
    /// Current game phase.
    pub phase: Phase,
}

/// Why a step was marked unreachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Blocked {
    EmptyCell,
    Occupied,
    Poisoned,
    Unaligned,
    Wall(Direction),
    MissingRole(Role),
    CameraLockout,
}

impl fmt::Display for Blocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCell => f.write_str("cell is empty"),
            Self::Occupied => f.write_str("another hero stands on the cell"),
            Self::Poisoned => f.write_str("previous step is unreachable"),
            Self::Unaligned => f.write_str("cells are not aligned"),
            Self::Wall(direction) => write!(f, "wall blocks the {direction:?} crossing"),
            Self::MissingRole(role) => write!(f, "player lacks the {role} role"),
            Self::CameraLockout => f.write_str("two active cameras guard the time cell"),
        }
    }
}

/// Builds the candidate path from the hero's cell to `target`.
///
/// Returns `None` when the target is uncovered or no straight direction or
/// special transit connects the two cells. Every step of the returned path
/// starts unreachable except the preset target of a special transit.
#[must_use]
pub fn build_path(ctx: &PathContext<'_>, hero: &HeroSnapshot, target: CellCoord) -> Option<Path> {
    let from = hero.cell;
    if target == from {
        return Some(Path::new(PathKind::Stay, [from]));
    }

    let destination = ctx.board.get(target);
    if destination.is_empty() {
        return None;
    }
    let origin = ctx.board.get(from);

    if ctx.roles.contains(Role::Vortex)
        && holds_own(&origin, ItemKind::Vortex, hero.color)
        && holds_own(&destination, ItemKind::Vortex, hero.color)
    {
        return Some(transit(PathKind::Vortex, from, target, ctx.phase.is(1)));
    }

    if ctx.roles.contains(Role::Escalator) && origin.escalator() == Some(target) {
        return Some(transit(PathKind::Escalator, from, target, true));
    }

    let direction = transform::classify(from, target)?;
    Some(Path::new(
        PathKind::Walk(direction),
        transform::walk(from, target, direction),
    ))
}

fn transit(kind: PathKind, from: CellCoord, target: CellCoord, reachable: bool) -> Path {
    let mut path = Path::new(kind, [from, target]);
    if let Some(step) = path.steps_mut().last_mut() {
        step.reachable = reachable;
    }
    path
}

fn holds_own(cell: &Cell<'_>, kind: ItemKind, color: HeroColor) -> bool {
    cell.item().is_some_and(|item| item.is(kind, color))
}

/// Annotates each step of `path` with its reachability, stopping at the first
/// illegal step so every later step stays unreachable.
pub fn check_path(ctx: &PathContext<'_>, hero: &HeroSnapshot, path: &mut Path) {
    let transit = path.kind().is_transit();
    let mut lockout: Option<bool> = None;
    let steps = path.steps_mut();

    for index in 0..steps.len() {
        let cell = ctx.board.get(steps[index].cell);
        if cell.is_empty() {
            reject(steps, index, Blocked::EmptyCell);
            return;
        }

        if index == 0 {
            steps[0].reachable = true;
            if transit {
                let occupied = steps
                    .get(1)
                    .is_some_and(|next| next.reachable && occupied_by_other(ctx, hero, next.cell));
                if occupied {
                    reject(steps, 1, Blocked::Occupied);
                }
                return;
            }
            continue;
        }

        let verdict = if occupied_by_other(ctx, hero, cell.coord()) {
            Err(Blocked::Occupied)
        } else if !steps[index - 1].reachable {
            Err(Blocked::Poisoned)
        } else {
            let previous = ctx.board.get(steps[index - 1].cell);
            crossing(ctx, hero, &previous, &cell).and_then(|()| {
                let locked = *lockout.get_or_insert_with(|| cameras_active(ctx.board));
                if locked && cell.holds(ItemKind::Time) {
                    Err(Blocked::CameraLockout)
                } else {
                    Ok(())
                }
            })
        };

        match verdict {
            Ok(()) => steps[index].reachable = true,
            Err(blocked) => {
                reject(steps, index, blocked);
                return;
            }
        }
    }
}

/// Marks `steps[from..]` unreachable; nothing past a blocked step can be reached.
fn reject(steps: &mut [PathStep], from: usize, blocked: Blocked) {
    if let Some(step) = steps.get(from) {
        trace!(cell = %step.cell, %blocked, "step unreachable");
    }
    for step in steps.iter_mut().skip(from) {
        step.reachable = false;
    }
}

fn occupied_by_other(ctx: &PathContext<'_>, hero: &HeroSnapshot, cell: CellCoord) -> bool {
    ctx.heroes
        .occupant(cell)
        .is_some_and(|occupant| occupant.id != hero.id)
}

fn cameras_active(board: BoardView<'_>) -> bool {
    board
        .find_item(ItemKind::Camera)
        .iter()
        .filter(|camera| !camera.flag(ItemFlag::Used))
        .count()
        >= 2
}

/// Evaluates the shared edge between two consecutive cells.
fn crossing(
    ctx: &PathContext<'_>,
    hero: &HeroSnapshot,
    previous: &Cell<'_>,
    next: &Cell<'_>,
) -> Result<(), Blocked> {
    let direction =
        transform::classify(previous.coord(), next.coord()).ok_or(Blocked::Unaligned)?;

    let departure = previous.wall(direction.departure_side());
    let arrival = next.wall(direction.arrival_side());
    let open = !departure.is_closed() && !arrival.is_closed();
    let orange_gate = hero.color == HeroColor::Orange
        && departure.is_gated(HeroColor::Orange)
        && arrival.is_gated(HeroColor::Orange);

    let role = direction.required_role();
    if !ctx.roles.contains(role) {
        return Err(Blocked::MissingRole(role));
    }
    if open || orange_gate {
        Ok(())
    } else {
        Err(Blocked::Wall(direction))
    }
}

/// Reports whether `path` may be executed toward `target`.
///
/// The path must be non-empty, end exactly on `target` and have every step
/// reachable.
#[must_use]
pub fn can_execute(path: &Path, target: CellCoord) -> bool {
    path.last().is_some_and(|last| last.cell == target)
        && path.steps().iter().all(|step| step.reachable)
}

/// Builds and checks a path in one go.
#[must_use]
pub fn plan(ctx: &PathContext<'_>, hero: &HeroSnapshot, target: CellCoord) -> Option<Path> {
    let mut path = build_path(ctx, hero, target)?;
    check_path(ctx, hero, &mut path);
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_core::{HeroId, HeroStatus};

    fn hero(cell: CellCoord) -> HeroSnapshot {
        HeroSnapshot {
            id: HeroId::new(0),
            color: HeroColor::Purple,
            cell,
            status: HeroStatus::Selected,
        }
    }

    #[test]
    fn can_execute_rejects_stale_targets() {
        let mut path = Path::new(
            PathKind::Walk(Direction::Right),
            [CellCoord::new(0, 0), CellCoord::new(1, 0)],
        );
        for step in path.steps_mut() {
            step.reachable = true;
        }
        assert!(can_execute(&path, CellCoord::new(1, 0)));
        assert!(!can_execute(&path, CellCoord::new(2, 0)));
    }

    #[test]
    fn can_execute_rejects_empty_and_partial_paths() {
        let empty = Path::new(PathKind::Stay, Vec::new());
        assert!(!can_execute(&empty, CellCoord::new(0, 0)));

        let mut partial = Path::new(
            PathKind::Walk(Direction::Down),
            [CellCoord::new(0, 0), CellCoord::new(0, 1)],
        );
        partial.steps_mut()[1] = PathStep {
            cell: CellCoord::new(0, 1),
            reachable: true,
        };
        assert!(!can_execute(&partial, CellCoord::new(0, 1)));
    }

    #[test]
    fn uncovered_targets_have_no_path() {
        let cells = std::collections::BTreeMap::new();
        let heroes = HeroView::default();
        let ctx = PathContext {
            board: BoardView::new(&cells),
            heroes: &heroes,
            roles: RoleSet::all(),
            phase: Phase::FIRST,
        };
        assert!(build_path(&ctx, &hero(CellCoord::new(0, 0)), CellCoord::new(1, 0)).is_none());
    }
}
