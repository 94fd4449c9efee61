#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gameplay triggers fired when a hero lands on a cell.
//!
//! Every `HeroLanded` event is turned into an immutable [`Landing`] snapshot
//! and handed to each [`Trigger`] in order. Triggers only append commands; the
//! world applies them afterwards.

use std::fmt;

use heist_core::{
    BoardView, Cell, Command, Event, GameConfig, HeroSnapshot, HeroView, ItemFlag, ItemKind,
    Phase,
};
use tracing::debug;

/// Snapshot of a landed hero and the state it landed in.
#[derive(Clone, Copy, Debug)]
pub struct Landing<'a> {
    /// Hero that landed, with its cell already committed.
    pub hero: &'a HeroSnapshot,
    /// Cell the hero landed on.
    pub cell: Cell<'a>,
    /// Board after the move.
    pub board: BoardView<'a>,
    /// Every hero after the move.
    pub heroes: &'a HeroView,
    /// Current game phase.
    pub phase: Phase,
    /// Lobby settings.
    pub config: GameConfig,
}

/// Single step of the landing pipeline.
pub trait Trigger: fmt::Debug {
    /// Appends the commands caused by `landing` to `out`.
    fn fire(&self, landing: &Landing<'_>, out: &mut Vec<Command>);
}

/// Flips the clock when a hero reaches an unused hourglass.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeTrigger;

impl Trigger for TimeTrigger {
    fn fire(&self, landing: &Landing<'_>, out: &mut Vec<Command>) {
        if !landing.cell.holds(ItemKind::Time) || landing.cell.flag(ItemFlag::Used) {
            return;
        }
        debug!(cell = %landing.cell.coord(), "clock inverted");
        out.push(Command::InvertClock);
        if landing.config.pause_on_invert_clock {
            out.push(Command::SetPaused { paused: true });
        }
        if landing.config.players >= 2 && landing.config.scenario >= 3 {
            out.push(Command::SwapRoles);
        }
        out.push(Command::SetCellFlag {
            cell: landing.cell.coord(),
            flag: ItemFlag::Used,
        });
    }
}

/// Starts the escape once every hero stands on its own article.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArticleTrigger;

impl Trigger for ArticleTrigger {
    fn fire(&self, landing: &Landing<'_>, out: &mut Vec<Command>) {
        let own_article = |hero: &HeroSnapshot| {
            let cell = landing.board.get(hero.cell);
            cell.item()
                .is_some_and(|item| item.is(ItemKind::Article, hero.color))
                .then_some(cell.coord())
        };

        if own_article(landing.hero).is_none() {
            return;
        }
        let articles: Option<Vec<_>> = landing
            .heroes
            .iter()
            .filter(|hero| !hero.has_exited())
            .map(own_article)
            .collect();
        let Some(articles) = articles else {
            return;
        };

        debug!(count = articles.len(), "articles stolen");
        for cell in articles {
            out.push(Command::SetCellFlag {
                cell,
                flag: ItemFlag::Stolen,
            });
        }
        out.push(Command::SetPhase {
            phase: Phase::SECOND,
        });
    }
}

/// Lets a hero leave through an exit during the escape.
///
/// The first scenario only has one exit, usable by every hero.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExitTrigger;

impl Trigger for ExitTrigger {
    fn fire(&self, landing: &Landing<'_>, out: &mut Vec<Command>) {
        let Some(item) = landing.cell.item() else {
            return;
        };
        if item.kind != ItemKind::Exit || !landing.phase.is(2) {
            return;
        }
        if item.color == Some(landing.hero.color) || landing.config.scenario == 1 {
            debug!(hero = %landing.hero.id, "hero exits");
            out.push(Command::ExitHero {
                hero: landing.hero.id,
            });
        }
    }
}

/// Disables a camera when the hero of its color reaches it.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraTrigger;

impl Trigger for CameraTrigger {
    fn fire(&self, landing: &Landing<'_>, out: &mut Vec<Command>) {
        let own_camera = landing
            .cell
            .item()
            .is_some_and(|item| item.is(ItemKind::Camera, landing.hero.color));
        if own_camera && !landing.cell.flag(ItemFlag::Used) {
            debug!(cell = %landing.cell.coord(), "camera disabled");
            out.push(Command::SetCellFlag {
                cell: landing.cell.coord(),
                flag: ItemFlag::Used,
            });
        }
    }
}

/// Ordered landing pipeline: time, article, exit, camera.
#[derive(Debug)]
pub struct Triggers {
    pipeline: Vec<Box<dyn Trigger>>,
}

impl Default for Triggers {
    fn default() -> Self {
        Self {
            pipeline: vec![
                Box::new(TimeTrigger),
                Box::new(ArticleTrigger),
                Box::new(ExitTrigger),
                Box::new(CameraTrigger),
            ],
        }
    }
}

impl Triggers {
    /// Creates a pipeline from explicit handlers, run in the given order.
    #[must_use]
    pub fn with_pipeline(pipeline: Vec<Box<dyn Trigger>>) -> Self {
        Self { pipeline }
    }

    /// Consumes world events and immutable views to emit trigger commands.
    pub fn handle(
        &self,
        events: &[Event],
        board: BoardView<'_>,
        heroes: &HeroView,
        phase: Phase,
        config: GameConfig,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::HeroLanded { hero, cell } = event else {
                continue;
            };
            let Some(snapshot) = heroes.get(*hero) else {
                continue;
            };
            let landing = Landing {
                hero: snapshot,
                cell: board.get(*cell),
                board,
                heroes,
                phase,
                config,
            };
            for trigger in &self.pipeline {
                trigger.fire(&landing, out);
            }
        }
    }
}
