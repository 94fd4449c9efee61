use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use anyhow::{Context, Result};
use heist_core::{Command, Event, ExplorationSource, HeroId, Path, PathKind};
use heist_system_broadcast::{encode, inbound, Broadcast};
use heist_system_hero_control::HeroControl;
use heist_system_pathing::PathContext;
use heist_system_triggers::Triggers;
use heist_world::{self as world, query, World};
use tracing::{debug, info};

use crate::scenario::{Scenario, Step};

/// Where a batch of commands comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    /// Scripted input on this machine; committed changes are broadcast.
    Local,
    /// Replay of a peer's message; the peer already broadcast it.
    Peer,
}

/// Local game driven by scripted inputs.
///
/// Every batch of commands is applied to the world, and the resulting events
/// are fed to the hero controllers, the landing triggers and the broadcaster
/// until no system asks for anything more.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    controls: Vec<HeroControl>,
    triggers: Triggers,
    broadcast: Broadcast,
    transcript: Vec<String>,
}

impl Session {
    /// Builds the world and reveals the scenario's tiles.
    pub(crate) fn new(scenario: &Scenario) -> Result<Self> {
        let world = World::new(scenario.world_setup()).context("invalid scenario setup")?;
        let mut session = Self {
            world,
            controls: (0..scenario.seats()).map(|_| HeroControl::default()).collect(),
            triggers: Triggers::default(),
            broadcast: Broadcast,
            transcript: Vec::new(),
        };
        let tiles = scenario.tiles.iter().map(|tile| tile.command(None)).collect();
        session.pump(tiles, Origin::Local)?;
        Ok(session)
    }

    /// Runs every scripted step in order.
    pub(crate) fn run(&mut self, script: &[Step]) -> Result<()> {
        for (index, step) in script.iter().enumerate() {
            self.step(step)
                .with_context(|| format!("script step {} failed", index + 1))?;
        }
        Ok(())
    }

    /// Lines describing previews, outbound messages and notable outcomes.
    #[must_use]
    pub(crate) fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Hash of the transcript and final hero positions.
    #[must_use]
    pub(crate) fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.transcript.hash(&mut hasher);
        for hero in query::hero_view(&self.world).iter() {
            hero.id.hash(&mut hasher);
            hero.cell.hash(&mut hasher);
        }
        query::phase(&self.world).hash(&mut hasher);
        query::clock_flips(&self.world).hash(&mut hasher);
        hasher.finish()
    }

    /// One-line summary of the final world state.
    #[must_use]
    pub(crate) fn summary(&self) -> String {
        let heroes = query::hero_view(&self.world)
            .iter()
            .map(|hero| format!("{}@{}:{:?}", hero.id, hero.cell, hero.status).to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "phase {} flips {} paused {} ended {} heroes {heroes}",
            query::phase(&self.world).get(),
            query::clock_flips(&self.world),
            query::is_paused(&self.world),
            query::is_ended(&self.world),
        )
    }

    fn step(&mut self, step: &Step) -> Result<()> {
        debug!(?step, "script step");
        match step {
            Step::Press { player, cell } => {
                let commands = self.drive(*player, |control, ctx, out| {
                    control.press(*cell, ctx, out);
                })?;
                self.pump(commands, Origin::Local)?;
            }
            Step::Hover { player, cell } => {
                let _ = self.drive(*player, |control, ctx, _| control.hover(*cell, ctx))?;
                let preview = self.controls.get(*player).and_then(|control| {
                    control
                        .selected()
                        .zip(control.path())
                        .map(|(hero, path)| describe(hero, path))
                });
                if let Some(line) = preview {
                    self.record(line);
                }
            }
            Step::Release { player, cell } => {
                let commands = self.drive(*player, |control, ctx, out| {
                    control.release(*cell, ctx, out);
                })?;
                self.pump(commands, Origin::Local)?;
            }
            Step::Cancel { player } => {
                let commands = self.drive(*player, |control, _, out| control.cancel(out))?;
                self.pump(commands, Origin::Local)?;
            }
            Step::Settle { hero } => {
                self.pump(vec![Command::SettleHero { hero: *hero }], Origin::Local)?;
            }
            Step::Explore { player, tile } => {
                let roles = query::roles(&self.world, *player);
                let source = query::exploration_source(&self.world, roles);
                let line = match source {
                    Some(ExplorationSource::Gate(cell)) => format!("explore gate {cell}"),
                    Some(ExplorationSource::Crystal(cell)) => format!("explore crystal {cell}"),
                    None => "explore none".to_owned(),
                };
                self.record(line);
                if let (Some(_), Some(tile)) = (source, tile) {
                    self.pump(vec![tile.command(source)], Origin::Local)?;
                }
            }
            Step::Receive { message } => {
                self.pump(vec![inbound(message.clone())], Origin::Peer)?;
            }
        }
        Ok(())
    }

    /// Hands one pointer input to the seat's controller.
    fn drive<F>(&mut self, player: usize, input: F) -> Result<Vec<Command>>
    where
        F: FnOnce(&mut HeroControl, &PathContext<'_>, &mut Vec<Command>),
    {
        let control = self
            .controls
            .get_mut(player)
            .with_context(|| format!("player {player} has no seat"))?;
        let heroes = query::hero_view(&self.world);
        let ctx = PathContext {
            board: query::board(&self.world),
            heroes: &heroes,
            roles: query::roles(&self.world, player),
            phase: query::phase(&self.world),
        };
        let mut commands = Vec::new();
        input(control, &ctx, &mut commands);
        Ok(commands)
    }

    fn pump(&mut self, mut commands: Vec<Command>, origin: Origin) -> Result<()> {
        while !commands.is_empty() {
            let mut events = Vec::new();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            for control in &mut self.controls {
                control.handle(&events, &mut commands);
            }
            let heroes = query::hero_view(&self.world);
            self.triggers.handle(
                &events,
                query::board(&self.world),
                &heroes,
                query::phase(&self.world),
                query::config(&self.world),
                &mut commands,
            );

            let mut outbound = Vec::new();
            if origin == Origin::Local {
                self.broadcast.handle(&events, &mut outbound);
            }
            for message in &outbound {
                let json = encode(message).context("failed to encode outbound message")?;
                self.record(format!("send {json}"));
            }
            if events.contains(&Event::GameWon) {
                info!("every hero escaped");
                self.record("game won".to_owned());
            }
        }
        Ok(())
    }

    fn record(&mut self, line: String) {
        self.transcript.push(line);
    }
}

/// Renders a path preview as `path <hero> <kind>: <cell><+|-> ...`.
fn describe(hero: HeroId, path: &Path) -> String {
    let kind = match path.kind() {
        PathKind::Stay => "stay".to_owned(),
        PathKind::Walk(direction) => format!("walk-{direction:?}").to_lowercase(),
        PathKind::Vortex => "vortex".to_owned(),
        PathKind::Escalator => "escalator".to_owned(),
    };
    let steps = path
        .steps()
        .iter()
        .map(|step| format!("{}{}", step.cell, if step.reachable { '+' } else { '-' }))
        .collect::<Vec<_>>()
        .join(" ");
    format!("path {hero} {kind}: {steps}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEIST: &str = r#"
        [config]
        scenario = 1

        [[heroes]]
        id = 0
        cell = { x = 0, y = 0 }

        [[players]]
        roles = ["right", "down", "explore"]

        [[players]]

        [[tiles]]
        id = 1
        x = 0
        y = 0

        [[tiles.cells]]
        at = { x = 1, y = 1 }
        walls = { bottom = true }

        [[tiles.cells]]
        at = { x = 3, y = 0 }
        item = { kind = "gate", color = "purple" }

        [[tiles.cells]]
        at = { x = 2, y = 0 }
        item = { kind = "time" }

        [[tiles.cells]]
        at = { x = 0, y = 3 }
        item = { kind = "crystal", color = "purple" }
    "#;

    fn session(script: &str) -> Session {
        let scenario = Scenario::parse(&format!("{HEIST}\n{script}")).expect("valid scenario");
        let mut session = Session::new(&scenario).expect("valid setup");
        session.run(&scenario.script).expect("script runs");
        session
    }

    #[test]
    fn drag_previews_and_commits_a_walk() {
        let session = session(
            r#"
            [[script]]
            action = "press"
            cell = { x = 0, y = 0 }

            [[script]]
            action = "hover"
            cell = { x = 3, y = 0 }

            [[script]]
            action = "release"
            cell = { x = 3, y = 0 }

            [[script]]
            action = "settle"
            hero = 0

            [[script]]
            action = "explore"
            "#,
        );
        let transcript = session.transcript();
        assert!(transcript[0].starts_with(r#"send {"type":"tile","x":0,"y":0,"#));
        assert_eq!(
            transcript[1..],
            [
                "path hero-0 walk-right: (0, 0)+ (1, 0)+ (2, 0)+ (3, 0)+".to_owned(),
                r#"send {"type":"hero","id":0,"cell":{"x":3,"y":0}}"#.to_owned(),
                "explore gate (3, 0)".to_owned(),
            ]
        );
        assert!(session.summary().ends_with("hero-0@(3, 0):set"));
    }

    #[test]
    fn blocked_release_asks_for_the_bots() {
        let session = session(
            r#"
            [[script]]
            action = "press"
            cell = { x = 0, y = 0 }

            [[script]]
            action = "release"
            cell = { x = 2, y = 2 }
            "#,
        );
        assert_eq!(
            session.transcript().last().map(String::as_str),
            Some(r#"send {"type":"ai"}"#)
        );
    }

    #[test]
    fn spectators_and_missing_seats() {
        let session = session(
            r#"
            [[script]]
            action = "press"
            player = 1
            cell = { x = 0, y = 0 }

            [[script]]
            action = "explore"
            player = 1
            "#,
        );
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1], "explore none");

        let scenario = Scenario::parse(&format!(
            "{HEIST}\n[[script]]\naction = \"cancel\"\nplayer = 5\n"
        ))
        .expect("valid scenario");
        let mut session = Session::new(&scenario).expect("valid setup");
        let error = session.run(&scenario.script).expect_err("no such seat");
        assert!(format!("{error:#}").contains("player 5 has no seat"));
    }

    #[test]
    fn received_messages_replay_locally() {
        let session = session(
            r#"
            [[script]]
            action = "receive"
            message = { type = "invertClock" }

            [[script]]
            action = "receive"
            message = { type = "exit", id = 0 }
            "#,
        );
        assert!(session.transcript().contains(&"game won".to_owned()));
        assert!(session.summary().starts_with("phase 1 flips 1 paused false ended true"));
    }

    #[test]
    fn peer_moves_land_without_echo_or_triggers() {
        let session = session(
            r#"
            [[script]]
            action = "receive"
            message = { type = "hero", id = 0, cell = { x = 2, y = 0 } }

            [[script]]
            action = "receive"
            message = { type = "invertClock" }

            [[script]]
            action = "receive"
            message = { type = "used", x = 2, y = 0 }

            [[script]]
            action = "receive"
            message = { type = "hero", id = 0, cell = { x = 2, y = 1 } }
            "#,
        );
        assert_eq!(session.transcript().len(), 1, "{:?}", session.transcript());
        assert!(session.summary().starts_with("phase 1 flips 1 paused false ended false"));
        assert!(session.summary().ends_with("hero-0@(2, 1):set"));
    }

    #[test]
    fn exploring_spends_the_crystal() {
        let session = session(
            r#"
            [[script]]
            action = "press"
            cell = { x = 0, y = 0 }

            [[script]]
            action = "hover"
            cell = { x = 0, y = 3 }

            [[script]]
            action = "release"
            cell = { x = 0, y = 3 }

            [[script]]
            action = "settle"
            hero = 0

            [[script]]
            action = "explore"
            tile = { id = 2, x = 0, y = 4 }

            [[script]]
            action = "explore"
            tile = { id = 3, x = -4, y = 0 }
            "#,
        );
        let transcript = session.transcript();
        assert!(transcript.contains(&"explore crystal (0, 3)".to_owned()));
        assert!(transcript.contains(&r#"send {"type":"used","x":0,"y":3}"#.to_owned()));
        assert_eq!(transcript.last().map(String::as_str), Some("explore none"));
        let tiles = transcript
            .iter()
            .filter(|line| line.starts_with(r#"send {"type":"tile""#))
            .count();
        assert_eq!(tiles, 2);
    }

    #[test]
    fn identical_scripts_share_a_fingerprint() {
        let script = r#"
            [[script]]
            action = "press"
            cell = { x = 0, y = 0 }

            [[script]]
            action = "hover"
            cell = { x = 0, y = 3 }

            [[script]]
            action = "release"
            cell = { x = 0, y = 3 }
        "#;
        assert_eq!(session(script).fingerprint(), session(script).fingerprint());
        assert_ne!(session(script).fingerprint(), session("").fingerprint());
    }
}
