#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hero selection and path preview driven by pointer input.
//!
//! The system owns the scratch path of the selected hero. It never mutates
//! the world; selections and commits leave as [`Command`] values.

use heist_core::{CellCoord, Command, Event, HeroId, HeroSnapshot, HeroStatus, Path};
use heist_system_pathing::{can_execute, plan, PathContext};
use tracing::debug;

#[derive(Debug)]
struct Selection {
    hero: HeroId,
    path: Option<Path>,
}

/// Pure system translating press/hover/release input into hero commands.
#[derive(Debug, Default)]
pub struct HeroControl {
    selection: Option<Selection>,
    pending: Option<HeroId>,
}

impl HeroControl {
    /// Hero currently held by the pointer, if any.
    #[must_use]
    pub fn selected(&self) -> Option<HeroId> {
        self.selection.as_ref().map(|selection| selection.hero)
    }

    /// Most recently computed preview path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.selection
            .as_ref()
            .and_then(|selection| selection.path.as_ref())
    }

    /// Picks up the idle hero standing on `cell`.
    ///
    /// Spectators (empty role sets) cannot pick up heroes. The preview path
    /// starts as the hero's own cell.
    pub fn press(&mut self, cell: CellCoord, ctx: &PathContext<'_>, out: &mut Vec<Command>) {
        if ctx.roles.is_empty() || self.selection.is_some() {
            return;
        }
        let Some(hero) = ctx
            .heroes
            .iter()
            .find(|hero| hero.cell == cell && hero.status == HeroStatus::Set)
        else {
            return;
        };

        debug!(hero = %hero.id, %cell, "hero picked up");
        out.push(Command::SelectHero { hero: hero.id });
        self.selection = Some(Selection {
            hero: hero.id,
            path: plan(ctx, hero, hero.cell),
        });
    }

    /// Rebuilds the preview path toward the hovered cell.
    pub fn hover(&mut self, cell: CellCoord, ctx: &PathContext<'_>) {
        let Some(held) = self.selected() else {
            return;
        };
        let Some(hero) = ctx.heroes.get(held) else {
            self.selection = None;
            return;
        };
        if let Some(selection) = self.selection.as_mut() {
            selection.path = plan(ctx, hero, cell);
        }
    }

    /// Drops the held hero on `cell`, committing the move when the preview
    /// path reaches it.
    ///
    /// Dropping anywhere else releases the hero and asks for the bots to run
    /// again. The preview path is discarded either way.
    pub fn release(&mut self, cell: CellCoord, ctx: &PathContext<'_>, out: &mut Vec<Command>) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        let Some(hero) = ctx.heroes.get(selection.hero) else {
            return;
        };

        if commits(hero, selection.path.as_ref(), cell) {
            debug!(hero = %hero.id, to = %cell, "committing move");
            self.pending = Some(hero.id);
            out.push(Command::MoveHero {
                hero: hero.id,
                to: cell,
            });
        } else {
            debug!(hero = %hero.id, %cell, "hero released without moving");
            out.push(Command::DeselectHero { hero: hero.id });
            out.push(Command::RequestAi);
        }
    }

    /// Abandons the current preview without touching the board.
    pub fn cancel(&mut self, out: &mut Vec<Command>) {
        if let Some(selection) = self.selection.take() {
            out.push(Command::DeselectHero {
                hero: selection.hero,
            });
        }
    }

    /// Reconciles local state with the outcome of previously emitted commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SelectionRejected { hero, .. } | Event::HeroExited { hero, .. } => {
                    if self.selected() == Some(*hero) {
                        self.selection = None;
                    }
                }
                Event::HeroMoved { hero, .. } => {
                    if self.pending == Some(*hero) {
                        self.pending = None;
                    }
                }
                Event::MoveRejected { hero, .. } => {
                    if self.pending == Some(*hero) {
                        self.pending = None;
                        out.push(Command::DeselectHero { hero: *hero });
                        out.push(Command::RequestAi);
                    }
                }
                Event::GameWon => {
                    self.selection = None;
                    self.pending = None;
                }
                _ => {}
            }
        }
    }
}

fn commits(hero: &HeroSnapshot, path: Option<&Path>, cell: CellCoord) -> bool {
    cell != hero.cell && path.is_some_and(|path| can_execute(path, cell))
}
