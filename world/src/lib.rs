#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the heist board.

mod board;
mod roster;

use heist_core::{
    CellCoord, Command, Event, FlagError, GameConfig, HeroColor, HeroId, HeroStatus, ItemFlag,
    MoveError, Phase, RoleSet,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use board::Board;
use roster::{Hero, Roster};

/// Starting position and color of a hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSetup {
    /// Identifier of the hero.
    pub id: HeroId,
    /// Color of the hero; defaults to the palette entry of the identifier.
    #[serde(default)]
    pub color: Option<HeroColor>,
    /// Starting cell.
    pub cell: CellCoord,
}

/// Everything required to start a game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSetup {
    /// Lobby settings.
    pub config: GameConfig,
    /// Heroes placed on the board at the start of the game.
    pub heroes: Vec<HeroSetup>,
    /// Role set held by each player seat.
    pub players: Vec<RoleSet>,
}

/// Reasons a world cannot be created from a setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Two heroes share an identifier.
    #[error("hero {0} is listed twice")]
    DuplicateHero(HeroId),
    /// The hero has no color and its identifier lies outside the palette.
    #[error("hero {0} has no color")]
    MissingColor(HeroId),
    /// Two heroes start on the same cell.
    #[error("two heroes start on cell {0}")]
    SharedCell(CellCoord),
}

/// Represents the authoritative heist world state.
#[derive(Debug)]
pub struct World {
    board: Board,
    roster: Roster,
    phase: Phase,
    clock_flips: u32,
    paused: bool,
    ended: bool,
    config: GameConfig,
    players: Vec<RoleSet>,
}

impl World {
    /// Creates a world with an empty board and the provided heroes.
    pub fn new(setup: WorldSetup) -> Result<Self, SetupError> {
        let mut heroes: Vec<Hero> = Vec::with_capacity(setup.heroes.len());
        for hero in setup.heroes {
            if heroes.iter().any(|existing| existing.id == hero.id) {
                return Err(SetupError::DuplicateHero(hero.id));
            }
            if heroes.iter().any(|existing| existing.cell == hero.cell) {
                return Err(SetupError::SharedCell(hero.cell));
            }
            let color = hero
                .color
                .or_else(|| hero.id.palette_color())
                .ok_or(SetupError::MissingColor(hero.id))?;
            heroes.push(Hero {
                id: hero.id,
                color,
                cell: hero.cell,
                status: HeroStatus::Set,
            });
        }

        Ok(Self {
            board: Board::default(),
            roster: Roster::new(heroes),
            phase: Phase::FIRST,
            clock_flips: 0,
            paused: false,
            ended: false,
            config: setup.config,
            players: setup.players,
        })
    }

    fn raise_flag(&mut self, cell: CellCoord, flag: ItemFlag, out_events: &mut Vec<Event>) {
        match self.board.set_flag(cell, flag) {
            Ok(true) => out_events.push(Event::CellFlagSet { cell, flag }),
            Ok(false) => debug!(%cell, %flag, "flag already raised"),
            Err(reason @ FlagError::NoItem { .. }) => {
                error!(%cell, %flag, "flag update addressed a cell without item");
                out_events.push(Event::CellFlagRejected { cell, flag, reason });
            }
        }
    }

    fn validate_move(&self, hero: HeroId, to: CellCoord) -> Result<CellCoord, MoveError> {
        if self.ended {
            return Err(MoveError::GameEnded);
        }
        let from = self.roster.validate_move(hero, to)?;
        if self.board.get(to).is_empty() {
            return Err(MoveError::EmptyCell);
        }
        Ok(from)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    debug!(?command, "applying command");
    match command {
        Command::PlaceTile {
            tile,
            origin,
            orientation,
            source,
        } => match world.board.place(&tile, origin, orientation) {
            Ok(placement) => {
                out_events.push(Event::TilePlaced {
                    tile,
                    origin,
                    orientation,
                });
                for cell in placement.bridges_explored {
                    out_events.push(Event::CellFlagSet {
                        cell,
                        flag: ItemFlag::Explored,
                    });
                }
                if let Some(source) = source {
                    world.raise_flag(source.cell(), source.spent_flag(), out_events);
                }
            }
            Err(reason) => {
                warn!(tile = tile.id.get(), %origin, %reason, "tile placement rejected");
                out_events.push(Event::TilePlacementRejected {
                    tile: tile.id,
                    origin,
                    reason,
                });
            }
        },
        Command::SelectHero { hero } => match world.roster.select(hero) {
            Ok(()) => out_events.push(Event::HeroSelected { hero }),
            Err(reason) => {
                warn!(%hero, %reason, "selection rejected");
                out_events.push(Event::SelectionRejected { hero, reason });
            }
        },
        Command::DeselectHero { hero } => match world.roster.deselect(hero) {
            Ok(()) => out_events.push(Event::HeroDeselected { hero }),
            Err(reason) => {
                warn!(%hero, %reason, "deselection rejected");
                out_events.push(Event::SelectionRejected { hero, reason });
            }
        },
        Command::MoveHero { hero, to } => match world.validate_move(hero, to) {
            Ok(from) => {
                world.roster.commit_move(hero, to);
                out_events.push(Event::HeroMoved { hero, from, to });
            }
            Err(reason) => {
                warn!(%hero, %to, %reason, "move rejected");
                out_events.push(Event::MoveRejected { hero, to, reason });
            }
        },
        Command::SyncHero { hero, to } => match world.validate_move(hero, to) {
            Ok(from) => {
                world.roster.relocate(hero, to);
                out_events.push(Event::HeroMoved { hero, from, to });
            }
            Err(reason) => {
                warn!(%hero, %to, %reason, "replayed move rejected");
                out_events.push(Event::MoveRejected { hero, to, reason });
            }
        },
        Command::SettleHero { hero } => match world.roster.settle(hero) {
            Some(cell) => out_events.push(Event::HeroLanded { hero, cell }),
            None => debug!(%hero, "hero was not travelling"),
        },
        Command::ExitHero { hero } => {
            if let Some(cell) = world.roster.exit(hero) {
                out_events.push(Event::HeroExited { hero, cell });
                if world.roster.all_exited() && !world.ended {
                    world.ended = true;
                    out_events.push(Event::GameWon);
                }
            }
        }
        Command::SetCellFlag { cell, flag } => world.raise_flag(cell, flag, out_events),
        Command::SetPhase { phase } => {
            if world.phase != phase {
                world.phase = phase;
                out_events.push(Event::PhaseChanged { phase });
            }
        }
        Command::InvertClock => {
            world.clock_flips = world.clock_flips.saturating_add(1);
            out_events.push(Event::ClockInverted {
                flips: world.clock_flips,
            });
        }
        Command::SetPaused { paused } => {
            if world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::SwapRoles => {
            if !world.players.is_empty() {
                world.players.rotate_left(1);
            }
            out_events.push(Event::RolesSwapped);
        }
        Command::RequestAi => out_events.push(Event::AiRequested),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use heist_core::{
        BoardView, Cell, CellCoord, ExplorationSource, GameConfig, HeroView, ItemFlag, ItemKind,
        Phase, Role, RoleSet,
    };

    /// Captures a read-only view of the board.
    #[must_use]
    pub fn board(world: &World) -> BoardView<'_> {
        world.board.view()
    }

    /// Returns the cell at a coordinate; uncovered coordinates are empty.
    #[must_use]
    pub fn cell(world: &World, coord: CellCoord) -> Cell<'_> {
        world.board.get(coord)
    }

    /// Captures a read-only view of every hero.
    #[must_use]
    pub fn hero_view(world: &World) -> HeroView {
        world.roster.view()
    }

    /// Phase the game is currently in.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Lobby settings of the game.
    #[must_use]
    pub fn config(world: &World) -> GameConfig {
        world.config
    }

    /// Role set held by a player seat. Debug games grant every role; unknown seats spectate.
    #[must_use]
    pub fn roles(world: &World, player: usize) -> RoleSet {
        if world.config.debug {
            return RoleSet::all();
        }
        world.players.get(player).copied().unwrap_or_default()
    }

    /// Number of times the clock has been flipped.
    #[must_use]
    pub fn clock_flips(world: &World) -> u32 {
        world.clock_flips
    }

    /// Reports whether the game is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Reports whether every hero has exited.
    #[must_use]
    pub fn is_ended(world: &World) -> bool {
        world.ended
    }

    /// Finds where a player holding `roles` may explore from.
    ///
    /// Gates take precedence over crystals. Exited heroes are ignored.
    #[must_use]
    pub fn exploration_source(world: &World, roles: RoleSet) -> Option<ExplorationSource> {
        if !roles.contains(Role::Explore) {
            return None;
        }
        let heroes = world.roster.view();
        let standing = || {
            heroes
                .iter()
                .filter(|hero| !hero.has_exited())
                .map(|hero| (hero.color, world.board.get(hero.cell)))
        };

        let gate = standing().find(|(color, cell)| {
            cell.item().is_some_and(|item| item.is(ItemKind::Gate, *color))
                && !cell.flag(ItemFlag::Explored)
        });
        if let Some((_, cell)) = gate {
            return Some(ExplorationSource::Gate(cell.coord()));
        }

        let crystal = standing()
            .find(|(color, cell)| {
                cell.item()
                    .is_some_and(|item| item.is(ItemKind::Crystal, *color))
                    && !cell.flag(ItemFlag::Used)
            })
            .map(|(_, cell)| ExplorationSource::Crystal(cell.coord()));
        crystal
    }
}
