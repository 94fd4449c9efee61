use std::{fs, path::Path};

use anyhow::{Context, Result};
use heist_core::{
    CellCoord, Command, ExplorationSource, GameConfig, HeroId, Orientation, RoleSet, TemplateCell,
    TileId, TileTemplate, WireMessage,
};
use heist_world::{HeroSetup, WorldSetup};
use serde::Deserialize;

/// Scripted game loaded from a TOML file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Lobby settings.
    #[serde(default)]
    pub(crate) config: GameConfig,
    /// Tiles revealed before the script starts, in placement order.
    #[serde(default)]
    pub(crate) tiles: Vec<TileEntry>,
    /// Starting heroes.
    pub(crate) heroes: Vec<HeroSetup>,
    /// Player seats and their roles.
    #[serde(default)]
    pub(crate) players: Vec<PlayerEntry>,
    /// Inputs replayed by the session.
    #[serde(default)]
    pub(crate) script: Vec<Step>,
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load scenario {}", path.display()))
    }

    /// Parses scenario TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml contents")
    }

    /// Setup handed to the world.
    #[must_use]
    pub(crate) fn world_setup(&self) -> WorldSetup {
        WorldSetup {
            config: self.config,
            heroes: self.heroes.clone(),
            players: self.players.iter().map(|player| player.roles).collect(),
        }
    }

    /// Number of seats with their own hero controller; at least one.
    #[must_use]
    pub(crate) fn seats(&self) -> usize {
        self.players.len().max(1)
    }
}

/// Tile placed on the board.
///
/// Only cells that differ from an open, empty cell need to be listed.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TileEntry {
    id: TileId,
    x: i32,
    y: i32,
    #[serde(default)]
    orientation: Orientation,
    #[serde(default)]
    cells: Vec<TemplateCell>,
}

impl TileEntry {
    fn template(&self) -> TileTemplate {
        let mut template = TileTemplate::open(self.id);
        for cell in &self.cells {
            if let Some(slot) = template.cell_mut(cell.at) {
                *slot = *cell;
            }
        }
        template
    }

    /// Command placing the tile, spending `source` once it lands.
    #[must_use]
    pub(crate) fn command(&self, source: Option<ExplorationSource>) -> Command {
        Command::PlaceTile {
            tile: self.template(),
            origin: CellCoord::new(self.x, self.y),
            orientation: self.orientation,
            source,
        }
    }
}

/// Seat at the table.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlayerEntry {
    /// Roles dealt to the seat; empty for spectators.
    #[serde(default)]
    pub(crate) roles: RoleSet,
}

/// Single scripted input.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum Step {
    /// Pointer pressed on a cell.
    Press {
        #[serde(default)]
        player: usize,
        cell: CellCoord,
    },
    /// Pointer dragged over a cell.
    Hover {
        #[serde(default)]
        player: usize,
        cell: CellCoord,
    },
    /// Pointer released on a cell.
    Release {
        #[serde(default)]
        player: usize,
        cell: CellCoord,
    },
    /// Drag aborted.
    Cancel {
        #[serde(default)]
        player: usize,
    },
    /// The token of a moving hero finished its animation.
    Settle { hero: HeroId },
    /// Asks which source the player may explore from, then reveals `tile`
    /// from it when one is found.
    Explore {
        #[serde(default)]
        player: usize,
        #[serde(default)]
        tile: Option<TileEntry>,
    },
    /// Message received from a peer.
    Receive { message: WireMessage },
}
