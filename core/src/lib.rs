#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the heist board engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable views such as
//! [`BoardView`] and [`HeroView`], and respond exclusively with new command
//! batches.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod wire;

pub use wire::WireMessage;

/// Edge length of a square tile measured in cells.
pub const TILE_SIZE: i32 = 4;

/// Global board coordinate of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new board coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell on the global board.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell on the global board.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Tile that contains this cell.
    ///
    /// Uses floored division so negative coordinates land in the tile to
    /// their upper-left rather than collapsing onto tile zero.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        TileCoord::new(self.x.div_euclid(TILE_SIZE), self.y.div_euclid(TILE_SIZE))
    }

    /// Returns the coordinate shifted by the provided offsets.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Reports whether the coordinate sits on a tile origin.
    #[must_use]
    pub const fn is_tile_aligned(&self) -> bool {
        self.x.rem_euclid(TILE_SIZE) == 0 && self.y.rem_euclid(TILE_SIZE) == 0
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Index of a tile on the board measured in whole tiles rather than cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    x: i32,
    y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile column.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Tile row.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Position of a cell inside the 4×4 layout of its tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawLocalCell", into = "RawLocalCell")]
pub struct LocalCell {
    x: u8,
    y: u8,
}

impl LocalCell {
    /// Creates a tile-local position, rejecting anything outside `0..4`.
    #[must_use]
    pub const fn new(x: u8, y: u8) -> Option<Self> {
        if x < TILE_SIZE as u8 && y < TILE_SIZE as u8 {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// Column inside the tile.
    #[must_use]
    pub const fn x(&self) -> u8 {
        self.x
    }

    /// Row inside the tile.
    #[must_use]
    pub const fn y(&self) -> u8 {
        self.y
    }

    /// Position after rotating the tile a quarter turn clockwise.
    #[must_use]
    pub const fn rotated_clockwise(&self) -> Self {
        Self {
            x: TILE_SIZE as u8 - 1 - self.y,
            y: self.x,
        }
    }

    /// Iterates every position of a tile in row-major order.
    pub fn all() -> impl Iterator<Item = LocalCell> {
        (0..TILE_SIZE as u8).flat_map(|y| (0..TILE_SIZE as u8).map(move |x| LocalCell { x, y }))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct RawLocalCell {
    x: u8,
    y: u8,
}

impl TryFrom<RawLocalCell> for LocalCell {
    type Error = String;

    fn try_from(raw: RawLocalCell) -> Result<Self, Self::Error> {
        LocalCell::new(raw.x, raw.y)
            .ok_or_else(|| format!("tile cell ({}, {}) lies outside the 4x4 layout", raw.x, raw.y))
    }
}

impl From<LocalCell> for RawLocalCell {
    fn from(cell: LocalCell) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
        }
    }
}

/// Colors available to heroes, items and color-gated walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroColor {
    /// Purple hero.
    Purple,
    /// Orange hero, the only one able to pass orange gates.
    Orange,
    /// Yellow hero.
    Yellow,
    /// Green hero.
    Green,
}

impl HeroColor {
    /// Palette indexed by hero identifier.
    pub const PALETTE: [HeroColor; 4] = [Self::Purple, Self::Orange, Self::Yellow, Self::Green];

    /// Lowercase token used on the wire and in configuration files.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
        }
    }
}

impl fmt::Display for HeroColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Unique identifier assigned to a hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroId(u8);

impl HeroId {
    /// Creates a new hero identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Default color associated with this identifier, if the palette covers it.
    #[must_use]
    pub fn palette_color(&self) -> Option<HeroColor> {
        HeroColor::PALETTE.get(usize::from(self.0)).copied()
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hero-{}", self.0)
    }
}

/// Identifier of a tile from the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One of the four sides of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Side facing decreasing rows.
    Top,
    /// Side facing increasing columns.
    Right,
    /// Side facing increasing rows.
    Bottom,
    /// Side facing decreasing columns.
    Left,
}

impl Side {
    /// Side on the neighbouring cell that shares this edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }
}

/// State of a single cell side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawWall", into = "RawWall")]
pub enum Wall {
    /// Nothing blocks the side.
    #[default]
    Open,
    /// A solid wall.
    Closed,
    /// A wall only the hero of the matching color may cross.
    Gated(HeroColor),
}

impl Wall {
    /// Reports whether the side blocks ordinary movement.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Reports whether the side is gated with the provided color.
    #[must_use]
    pub fn is_gated(self, color: HeroColor) -> bool {
        self == Self::Gated(color)
    }
}

/// Loose representation accepted from tile decks: `true`/`false` or a color token.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawWall {
    Flag(bool),
    Color(HeroColor),
}

impl From<RawWall> for Wall {
    fn from(raw: RawWall) -> Self {
        match raw {
            RawWall::Flag(false) => Self::Open,
            RawWall::Flag(true) => Self::Closed,
            RawWall::Color(color) => Self::Gated(color),
        }
    }
}

impl From<Wall> for RawWall {
    fn from(wall: Wall) -> Self {
        match wall {
            Wall::Open => Self::Flag(false),
            Wall::Closed => Self::Flag(true),
            Wall::Gated(color) => Self::Color(color),
        }
    }
}

/// The four walls around a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Walls {
    /// Wall on the top side.
    pub top: Wall,
    /// Wall on the right side.
    pub right: Wall,
    /// Wall on the bottom side.
    pub bottom: Wall,
    /// Wall on the left side.
    pub left: Wall,
}

impl Walls {
    /// Walls closed on every side.
    pub const CLOSED: Walls = Walls {
        top: Wall::Closed,
        right: Wall::Closed,
        bottom: Wall::Closed,
        left: Wall::Closed,
    };

    /// Wall on the requested side.
    #[must_use]
    pub const fn side(&self, side: Side) -> Wall {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    /// Replaces the wall on the requested side.
    pub fn set(&mut self, side: Side, wall: Wall) {
        match side {
            Side::Top => self.top = wall,
            Side::Right => self.right = wall,
            Side::Bottom => self.bottom = wall,
            Side::Left => self.left = wall,
        }
    }

    /// Walls after rotating the cell a quarter turn clockwise.
    #[must_use]
    pub const fn rotated_clockwise(&self) -> Self {
        Self {
            top: self.left,
            right: self.top,
            bottom: self.right,
            left: self.bottom,
        }
    }
}

/// Kinds of interactive items a cell may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Exploration gate leading to an unrevealed tile.
    Gate,
    /// Crystal that lets its hero explore from anywhere.
    Crystal,
    /// Same-color teleport pad.
    Vortex,
    /// Escape exit, usable in the second phase.
    Exit,
    /// Hourglass that inverts the clock.
    Time,
    /// Security camera; two active cameras lock out time cells.
    Camera,
    /// Article to steal.
    Article,
    /// Bridge joining two tiles.
    Bridge,
}

/// Boolean flags carried by an item and broadcast to peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemFlag {
    /// The item has been consumed.
    Used,
    /// The gate or bridge leads to revealed territory.
    Explored,
    /// The article has been stolen.
    Stolen,
}

impl fmt::Display for ItemFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Used => "used",
            Self::Explored => "explored",
            Self::Stolen => "stolen",
        })
    }
}

/// Flag state attached to an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFlags {
    /// See [`ItemFlag::Used`].
    pub used: bool,
    /// See [`ItemFlag::Explored`].
    pub explored: bool,
    /// See [`ItemFlag::Stolen`].
    pub stolen: bool,
}

impl ItemFlags {
    /// Reads a single flag.
    #[must_use]
    pub const fn get(&self, flag: ItemFlag) -> bool {
        match flag {
            ItemFlag::Used => self.used,
            ItemFlag::Explored => self.explored,
            ItemFlag::Stolen => self.stolen,
        }
    }

    /// Raises a single flag.
    pub fn raise(&mut self, flag: ItemFlag) {
        match flag {
            ItemFlag::Used => self.used = true,
            ItemFlag::Explored => self.explored = true,
            ItemFlag::Stolen => self.stolen = true,
        }
    }
}

/// Interactive item placed on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Kind of the item.
    pub kind: ItemKind,
    /// Color of the item; colorless items (bridges, time cells) carry `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HeroColor>,
    /// Mutable flags.
    #[serde(default)]
    pub flags: ItemFlags,
}

impl Item {
    /// Creates an item with cleared flags.
    #[must_use]
    pub const fn new(kind: ItemKind, color: Option<HeroColor>) -> Self {
        Self {
            kind,
            color,
            flags: ItemFlags {
                used: false,
                explored: false,
                stolen: false,
            },
        }
    }

    /// Reports whether the item is of the provided kind and color.
    #[must_use]
    pub fn is(&self, kind: ItemKind, color: HeroColor) -> bool {
        self.kind == kind && self.color == Some(color)
    }
}

/// Data stored for a board coordinate once a tile covers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellContents {
    /// Placed tile that covers the coordinate.
    pub tile: TileId,
    /// Position of the cell inside the tile.
    pub tile_cell: LocalCell,
    /// Walls oriented into global board semantics.
    pub walls: Walls,
    /// Item on the cell, if any.
    pub item: Option<Item>,
    /// One-way escalator destination, if any.
    pub escalator: Option<CellCoord>,
}

/// Read-only handle to a board coordinate, possibly not yet covered by a tile.
#[derive(Clone, Copy, Debug)]
pub struct Cell<'a> {
    coord: CellCoord,
    contents: Option<&'a CellContents>,
}

impl<'a> Cell<'a> {
    /// Creates a handle for the provided coordinate.
    #[must_use]
    pub const fn new(coord: CellCoord, contents: Option<&'a CellContents>) -> Self {
        Self { coord, contents }
    }

    /// Global coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Reports whether no tile has been placed over this coordinate yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.contents.is_none()
    }

    /// Tile-derived contents, absent while the cell is empty.
    #[must_use]
    pub const fn contents(&self) -> Option<&'a CellContents> {
        self.contents
    }

    /// Wall on the requested side. Empty cells carry no walls.
    #[must_use]
    pub fn wall(&self, side: Side) -> Wall {
        self.contents
            .map_or(Wall::Open, |contents| contents.walls.side(side))
    }

    /// Item on the cell, if any.
    #[must_use]
    pub fn item(&self) -> Option<&'a Item> {
        self.contents.and_then(|contents| contents.item.as_ref())
    }

    /// Escalator destination, if any.
    #[must_use]
    pub fn escalator(&self) -> Option<CellCoord> {
        self.contents.and_then(|contents| contents.escalator)
    }

    /// Reports whether the cell holds an item of the provided kind.
    #[must_use]
    pub fn holds(&self, kind: ItemKind) -> bool {
        self.item().is_some_and(|item| item.kind == kind)
    }

    /// Reads an item flag; cells without an item report `false`.
    #[must_use]
    pub fn flag(&self, flag: ItemFlag) -> bool {
        self.item().is_some_and(|item| item.flags.get(flag))
    }
}

/// Read-only view into the sparse board registry.
#[derive(Clone, Copy, Debug)]
pub struct BoardView<'a> {
    cells: &'a BTreeMap<CellCoord, CellContents>,
}

impl<'a> BoardView<'a> {
    /// Captures a new board view backed by the provided registry.
    #[must_use]
    pub const fn new(cells: &'a BTreeMap<CellCoord, CellContents>) -> Self {
        Self { cells }
    }

    /// Returns the cell at the coordinate. Never fails; uncovered coordinates are empty.
    #[must_use]
    pub fn get(&self, coord: CellCoord) -> Cell<'a> {
        Cell::new(coord, self.cells.get(&coord))
    }

    /// All non-empty cells currently holding an item of the provided kind.
    #[must_use]
    pub fn find_item(&self, kind: ItemKind) -> Vec<Cell<'a>> {
        self.cells
            .iter()
            .filter(|(_, contents)| contents.item.is_some_and(|item| item.kind == kind))
            .map(|(coord, contents)| Cell::new(*coord, Some(contents)))
            .collect()
    }

    /// Iterates non-empty cells in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = Cell<'a>> + 'a {
        self.cells
            .iter()
            .map(|(coord, contents)| Cell::new(*coord, Some(contents)))
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no tile has been placed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Cardinal movement directions on the diagonal board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward decreasing rows.
    Up,
    /// Toward increasing rows.
    Down,
    /// Toward decreasing columns.
    Left,
    /// Toward increasing columns.
    Right,
}

impl Direction {
    /// Side of the departure cell crossed when stepping in this direction.
    #[must_use]
    pub const fn departure_side(self) -> Side {
        match self {
            Self::Up => Side::Top,
            Self::Down => Side::Bottom,
            Self::Left => Side::Left,
            Self::Right => Side::Right,
        }
    }

    /// Side of the arrival cell crossed when stepping in this direction.
    #[must_use]
    pub const fn arrival_side(self) -> Side {
        self.departure_side().opposite()
    }

    /// Role a player needs to move heroes in this direction.
    #[must_use]
    pub const fn required_role(self) -> Role {
        match self {
            Self::Up => Role::Up,
            Self::Down => Role::Down,
            Self::Left => Role::Left,
            Self::Right => Role::Right,
        }
    }
}

/// Capability token granted to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Move heroes up.
    Up,
    /// Move heroes down.
    Down,
    /// Move heroes left.
    Left,
    /// Move heroes right.
    Right,
    /// Reveal new tiles.
    Explore,
    /// Ride escalators.
    Escalator,
    /// Teleport through vortices.
    Vortex,
}

impl Role {
    /// Every role in canonical order.
    pub const ALL: [Role; 7] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Explore,
        Self::Escalator,
        Self::Vortex,
    ];

    /// Lowercase token used on the wire and in configuration files.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Explore => "explore",
            Self::Escalator => "escalator",
            Self::Vortex => "vortex",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.token() == token)
            .ok_or_else(|| RoleError::Unknown(token.to_owned()))
    }
}

/// Errors raised while parsing role tokens.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RoleError {
    /// The token does not name a known role.
    #[error("unknown role token `{0}`")]
    Unknown(String),
}

/// Unordered set of roles stored as a bit set.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RoleSet(u8);

impl RoleSet {
    /// Spectator set without any role.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Full set handed out in debug/admin mode.
    #[must_use]
    pub const fn all() -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < Role::ALL.len() {
            bits |= Role::ALL[index].bit();
            index += 1;
        }
        Self(bits)
    }

    /// Returns a copy of the set with the role added.
    #[must_use]
    pub const fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// Returns a copy of the set with the role removed.
    #[must_use]
    pub const fn without(self, role: Role) -> Self {
        Self(self.0 & !role.bit())
    }

    /// Adds a role to the set.
    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    /// Reports whether the role is part of the set.
    #[must_use]
    pub const fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Reports whether the set holds no role at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the contained roles in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    /// Parses a set from textual tokens, rejecting unknown tokens.
    pub fn from_tokens<'t>(tokens: impl IntoIterator<Item = &'t str>) -> Result<Self, RoleError> {
        tokens
            .into_iter()
            .map(str::parse::<Role>)
            .collect::<Result<Self, _>>()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = Self::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl TryFrom<Vec<String>> for RoleSet {
    type Error = RoleError;

    fn try_from(tokens: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_tokens(tokens.iter().map(String::as_str))
    }
}

impl From<RoleSet> for Vec<String> {
    fn from(set: RoleSet) -> Self {
        set.iter().map(|role| role.token().to_owned()).collect()
    }
}

/// Coarse game stage gating vortex use and exits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phase(u8);

impl Phase {
    /// Heist phase: heroes roam and explore, vortices are active.
    pub const FIRST: Phase = Phase(1);
    /// Escape phase: articles are stolen and heroes head for the exits.
    pub const SECOND: Phase = Phase(2);

    /// Creates a phase from its number.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Numeric representation of the phase.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Phase oracle: reports whether the game is in phase `n`.
    #[must_use]
    pub const fn is(&self, n: u8) -> bool {
        self.0 == n
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Movement state of a hero token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroStatus {
    /// Idle on the board.
    Set,
    /// Chosen by a player; a path is being previewed.
    Selected,
    /// Committed to a new cell, token still travelling there.
    Moving,
    /// Left the board through an exit. Terminal.
    Exited,
}

/// Immutable representation of a single hero's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeroSnapshot {
    /// Unique identifier assigned to the hero.
    pub id: HeroId,
    /// Color of the hero.
    pub color: HeroColor,
    /// Last committed board position.
    pub cell: CellCoord,
    /// Movement state.
    pub status: HeroStatus,
}

impl HeroSnapshot {
    /// Reports whether the hero has left the board.
    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.status == HeroStatus::Exited
    }
}

/// Read-only snapshot describing all heroes on the board.
#[derive(Clone, Debug, Default)]
pub struct HeroView {
    snapshots: Vec<HeroSnapshot>,
}

impl HeroView {
    /// Creates a new hero view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<HeroSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured hero snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &HeroSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the requested hero.
    #[must_use]
    pub fn get(&self, hero: HeroId) -> Option<&HeroSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == hero)
    }

    /// Non-exited hero standing on the cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<&HeroSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.cell == cell && !snapshot.has_exited())
    }

    /// Hero currently selected, if any.
    #[must_use]
    pub fn selected(&self) -> Option<HeroId> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.status == HeroStatus::Selected)
            .map(|snapshot| snapshot.id)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<HeroSnapshot> {
        self.snapshots
    }
}

/// Item a tile exploration starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorationSource {
    /// A hero stands on an unexplored gate of its own color.
    Gate(CellCoord),
    /// A hero stands on an unused crystal of its own color.
    Crystal(CellCoord),
}

impl ExplorationSource {
    /// Cell holding the item.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        match *self {
            Self::Gate(cell) | Self::Crystal(cell) => cell,
        }
    }

    /// Flag raised on the item once the exploration completes.
    #[must_use]
    pub const fn spent_flag(&self) -> ItemFlag {
        match self {
            Self::Gate(_) => ItemFlag::Explored,
            Self::Crystal(_) => ItemFlag::Used,
        }
    }
}

/// How a path connects its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Target is the hero's own cell.
    Stay,
    /// Straight walk along one direction of the diagonal grid.
    Walk(Direction),
    /// Same-color vortex teleport.
    Vortex,
    /// One-way escalator ride.
    Escalator,
}

impl PathKind {
    /// Reports whether the path is a single-hop special transit.
    #[must_use]
    pub const fn is_transit(self) -> bool {
        matches!(self, Self::Vortex | Self::Escalator)
    }
}

/// Single annotated entry of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Board cell visited by the step.
    pub cell: CellCoord,
    /// Whether the hero may legally reach this step.
    pub reachable: bool,
}

/// Ordered candidate path from a hero's cell to a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    kind: PathKind,
    steps: Vec<PathStep>,
}

impl Path {
    /// Creates a path whose steps start unresolved (not reachable).
    #[must_use]
    pub fn new(kind: PathKind, cells: impl IntoIterator<Item = CellCoord>) -> Self {
        Self {
            kind,
            steps: cells
                .into_iter()
                .map(|cell| PathStep {
                    cell,
                    reachable: false,
                })
                .collect(),
        }
    }

    /// Shape of the path.
    #[must_use]
    pub const fn kind(&self) -> PathKind {
        self.kind
    }

    /// Annotated steps in travel order.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Mutable access for the legality pass.
    pub fn steps_mut(&mut self) -> &mut [PathStep] {
        &mut self.steps
    }

    /// Final step, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Number of steps including both endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether the path holds no step.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the first unreachable step.
    #[must_use]
    pub fn first_unreachable(&self) -> Option<usize> {
        self.steps.iter().position(|step| !step.reachable)
    }
}

/// Number of quarter turns clockwise applied to a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Orientation(u8);

impl Orientation {
    /// Creates an orientation, wrapping the value into `0..4`.
    #[must_use]
    pub const fn new(quarter_turns: u8) -> Self {
        Self(quarter_turns % 4)
    }

    /// Quarter turns clockwise.
    #[must_use]
    pub const fn quarter_turns(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Orientation {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Orientation> for u8 {
    fn from(orientation: Orientation) -> Self {
        orientation.0
    }
}

/// Single cell of a tile template before orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCell {
    /// Position inside the template.
    pub at: LocalCell,
    /// Walls in template orientation.
    #[serde(default)]
    pub walls: Walls,
    /// Item on the cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    /// Escalator destination expressed in template-local coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalator: Option<LocalCell>,
}

/// Tile as stored in the deck: sixteen cells in template orientation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTemplate {
    /// Deck identifier of the tile.
    pub id: TileId,
    /// Template cells; a complete tile lists each of the sixteen positions once.
    pub cells: Vec<TemplateCell>,
}

impl TileTemplate {
    /// Creates a tile with sixteen open, item-less cells.
    #[must_use]
    pub fn open(id: TileId) -> Self {
        Self {
            id,
            cells: LocalCell::all()
                .map(|at| TemplateCell {
                    at,
                    walls: Walls::default(),
                    item: None,
                    escalator: None,
                })
                .collect(),
        }
    }

    /// Mutable access to the template cell at a position.
    pub fn cell_mut(&mut self, at: LocalCell) -> Option<&mut TemplateCell> {
        self.cells.iter_mut().find(|cell| cell.at == at)
    }

    /// Reports whether every position appears exactly once.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let expected = (TILE_SIZE * TILE_SIZE) as usize;
        if self.cells.len() != expected {
            return false;
        }
        let mut seen = [false; (TILE_SIZE * TILE_SIZE) as usize];
        for cell in &self.cells {
            let index = usize::from(cell.at.y()) * TILE_SIZE as usize + usize::from(cell.at.x());
            if seen[index] {
                return false;
            }
            seen[index] = true;
        }
        true
    }
}

/// Per-game settings supplied by the lobby.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Scenario number; scenario 1 only has the purple exit.
    pub scenario: u8,
    /// Number of human players.
    pub players: u8,
    /// Number of bots.
    pub bots: u8,
    /// Whether inverting the clock pauses the game.
    pub pause_on_invert_clock: bool,
    /// Debug/admin mode: every player receives the full role set.
    pub debug: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scenario: 1,
            players: 1,
            bots: 0,
            pause_on_invert_clock: false,
            debug: false,
        }
    }
}

/// Reasons a tile placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The origin is not a multiple of the tile size.
    #[error("tile origin is not aligned to the tile grid")]
    Misaligned,
    /// Part of the footprint is already covered by another tile.
    #[error("tile footprint overlaps a placed tile")]
    Occupied,
    /// The template does not list each of the sixteen cells exactly once.
    #[error("tile template is incomplete")]
    IncompleteTemplate,
    /// The tile was already placed.
    #[error("tile was already placed")]
    AlreadyPlaced,
}

/// Reasons a hero move commit may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum MoveError {
    /// No hero with the identifier exists.
    #[error("unknown hero")]
    UnknownHero,
    /// The hero already left the board.
    #[error("hero has exited")]
    Exited,
    /// The destination is not covered by a tile.
    #[error("destination cell is empty")]
    EmptyCell,
    /// Another hero stands on the destination.
    #[error("destination cell is occupied")]
    Occupied,
    /// The hero already stands on the destination.
    #[error("hero already stands on the destination")]
    Stationary,
    /// The hero is still travelling to its previous destination.
    #[error("hero is still moving")]
    InTransit,
    /// The game is over.
    #[error("game has ended")]
    GameEnded,
}

/// Reasons a selection request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SelectionError {
    /// No hero with the identifier exists.
    #[error("unknown hero")]
    UnknownHero,
    /// The hero is moving or has exited.
    #[error("hero cannot be selected while {0:?}")]
    NotSelectable(HeroStatus),
    /// A different hero is already selected.
    #[error("another hero is already selected")]
    AnotherSelected(HeroId),
    /// Deselection was requested for a hero that is not selected.
    #[error("hero is not selected")]
    NotSelected,
}

/// Failure to update an item flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum FlagError {
    /// The cell holds no item; the caller is out of sync with the board.
    #[error("cell {cell} holds no item")]
    NoItem {
        /// Cell that was addressed.
        cell: CellCoord,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Places a tile from the deck onto the board.
    PlaceTile {
        /// Template of the tile.
        tile: TileTemplate,
        /// Global coordinate receiving template cell (0, 0) after orientation.
        origin: CellCoord,
        /// Rotation applied to the template.
        orientation: Orientation,
        /// Item the exploration started from; a gate is marked explored and a
        /// crystal used once the tile lands.
        source: Option<ExplorationSource>,
    },
    /// Marks a hero as chosen by a player.
    SelectHero {
        /// Hero to select.
        hero: HeroId,
    },
    /// Releases a selected hero without moving it.
    DeselectHero {
        /// Hero to release.
        hero: HeroId,
    },
    /// Commits a hero to a new cell.
    MoveHero {
        /// Hero to move.
        hero: HeroId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Replays a move a peer already committed.
    ///
    /// The hero lands directly: no `HeroLanded` follows, since the peer that
    /// made the move already ran its landing triggers.
    SyncHero {
        /// Hero that moved on the peer.
        hero: HeroId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Reports that a moving hero token reached its cell.
    SettleHero {
        /// Hero that arrived.
        hero: HeroId,
    },
    /// Removes a hero from play through an exit.
    ExitHero {
        /// Hero leaving the board.
        hero: HeroId,
    },
    /// Raises an item flag on a cell.
    SetCellFlag {
        /// Cell holding the item.
        cell: CellCoord,
        /// Flag to raise.
        flag: ItemFlag,
    },
    /// Moves the game to another phase.
    SetPhase {
        /// Phase to enter.
        phase: Phase,
    },
    /// Flips the sand clock.
    InvertClock,
    /// Pauses or resumes the game.
    SetPaused {
        /// Desired pause state.
        paused: bool,
    },
    /// Rotates role assignments between players.
    SwapRoles,
    /// Asks the admin to rerun the bots.
    RequestAi,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a tile was written onto the board.
    TilePlaced {
        /// Placed tile, as supplied by the deck.
        tile: TileTemplate,
        /// Origin of the tile.
        origin: CellCoord,
        /// Rotation applied.
        orientation: Orientation,
    },
    /// Reports that a tile placement request was rejected.
    TilePlacementRejected {
        /// Tile that was refused.
        tile: TileId,
        /// Requested origin.
        origin: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a hero was selected.
    HeroSelected {
        /// Selected hero.
        hero: HeroId,
    },
    /// Confirms that a hero was released.
    HeroDeselected {
        /// Released hero.
        hero: HeroId,
    },
    /// Reports that a selection request was rejected.
    SelectionRejected {
        /// Hero addressed by the request.
        hero: HeroId,
        /// Specific reason the request failed.
        reason: SelectionError,
    },
    /// Confirms that a hero was committed to a new cell.
    HeroMoved {
        /// Hero that moved.
        hero: HeroId,
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Reports that a move commit was rejected; nothing changed.
    MoveRejected {
        /// Hero addressed by the request.
        hero: HeroId,
        /// Requested destination.
        to: CellCoord,
        /// Specific reason the commit failed.
        reason: MoveError,
    },
    /// A moving hero arrived; triggers inspect the landed cell.
    HeroLanded {
        /// Hero that arrived.
        hero: HeroId,
        /// Cell the hero stands on.
        cell: CellCoord,
    },
    /// Confirms that a hero left the board.
    HeroExited {
        /// Hero that exited.
        hero: HeroId,
        /// Exit cell.
        cell: CellCoord,
    },
    /// Every hero has exited.
    GameWon,
    /// Confirms that an item flag was raised.
    CellFlagSet {
        /// Cell holding the item.
        cell: CellCoord,
        /// Raised flag.
        flag: ItemFlag,
    },
    /// Reports that a flag update addressed a cell without item.
    CellFlagRejected {
        /// Cell addressed by the request.
        cell: CellCoord,
        /// Requested flag.
        flag: ItemFlag,
        /// Specific reason the update failed.
        reason: FlagError,
    },
    /// Announces that the game entered a new phase.
    PhaseChanged {
        /// Phase now active.
        phase: Phase,
    },
    /// Announces that the clock was flipped.
    ClockInverted {
        /// Number of flips since the start of the game.
        flips: u32,
    },
    /// Announces that the pause state changed.
    PauseChanged {
        /// Pause state now active.
        paused: bool,
    },
    /// Announces that role assignments were rotated.
    RolesSwapped,
    /// Asks the admin to rerun the bots.
    AiRequested,
}
