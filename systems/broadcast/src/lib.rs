#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bridges world events and the peer-to-peer wire format.
//!
//! Outbound, committed world events become [`WireMessage`] values. Inbound,
//! messages from peers become the [`Command`] that replays the same change
//! locally.

use heist_core::{CellCoord, Command, Event, ItemFlag, WireMessage};
use thiserror::Error;
use tracing::debug;

/// Failures while moving wire messages through JSON.
#[derive(Debug, Error)]
pub enum WireError {
    /// The message could not be serialized.
    #[error("failed to encode wire message")]
    Encode(#[source] serde_json::Error),
    /// The payload is not a valid wire message.
    #[error("failed to decode wire message")]
    Decode(#[source] serde_json::Error),
}

/// Pure system that turns world events into outbound wire messages.
#[derive(Debug, Default)]
pub struct Broadcast;

impl Broadcast {
    /// Consumes world events and appends the messages peers need to replay them.
    pub fn handle(&self, events: &[Event], out: &mut Vec<WireMessage>) {
        for event in events {
            if let Some(message) = outbound(event) {
                debug!(?message, "broadcasting");
                out.push(message);
            }
        }
    }
}

/// Wire message announcing `event`, if peers need to hear about it.
#[must_use]
pub fn outbound(event: &Event) -> Option<WireMessage> {
    let message = match event {
        Event::HeroMoved { hero, to, .. } => WireMessage::Hero {
            id: *hero,
            cell: *to,
        },
        Event::TilePlaced {
            tile,
            origin,
            orientation,
        } => WireMessage::Tile {
            x: origin.x(),
            y: origin.y(),
            tile: tile.clone(),
            orientation: *orientation,
        },
        Event::CellFlagSet { cell, flag } => WireMessage::flag(*cell, *flag),
        Event::ClockInverted { .. } => WireMessage::InvertClock,
        Event::RolesSwapped => WireMessage::Swap,
        Event::PauseChanged { paused } => WireMessage::Pause { paused: *paused },
        Event::PhaseChanged { phase } => WireMessage::Phase { phase: *phase },
        Event::HeroExited { hero, .. } => WireMessage::Exit { id: *hero },
        Event::AiRequested => WireMessage::Ai,
        _ => return None,
    };
    Some(message)
}

/// Command replaying a peer's message against the local world.
///
/// Events produced by a replayed command describe the peer's change; they
/// must not be handed back to [`Broadcast::handle`].
#[must_use]
pub fn inbound(message: WireMessage) -> Command {
    let flag = |x, y, flag| Command::SetCellFlag {
        cell: CellCoord::new(x, y),
        flag,
    };
    match message {
        WireMessage::Hero { id, cell } => Command::SyncHero { hero: id, to: cell },
        WireMessage::Tile {
            x,
            y,
            tile,
            orientation,
        } => Command::PlaceTile {
            tile,
            origin: CellCoord::new(x, y),
            orientation,
            source: None,
        },
        WireMessage::InvertClock => Command::InvertClock,
        WireMessage::Swap => Command::SwapRoles,
        WireMessage::Pause { paused } => Command::SetPaused { paused },
        WireMessage::Phase { phase } => Command::SetPhase { phase },
        WireMessage::Exit { id } => Command::ExitHero { hero: id },
        WireMessage::Ai => Command::RequestAi,
        WireMessage::Used { x, y } => flag(x, y, ItemFlag::Used),
        WireMessage::Explored { x, y } => flag(x, y, ItemFlag::Explored),
        WireMessage::Stolen { x, y } => flag(x, y, ItemFlag::Stolen),
    }
}

/// Serializes a message as a single JSON object.
pub fn encode(message: &WireMessage) -> Result<String, WireError> {
    serde_json::to_string(message).map_err(WireError::Encode)
}

/// Parses a JSON payload received from a peer.
pub fn decode(payload: &str) -> Result<WireMessage, WireError> {
    serde_json::from_str(payload).map_err(WireError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_core::{HeroId, MoveError, Phase};

    #[test]
    fn rejections_stay_local() {
        let event = Event::MoveRejected {
            hero: HeroId::new(1),
            to: CellCoord::new(2, 2),
            reason: MoveError::Occupied,
        };
        assert_eq!(outbound(&event), None);
        assert_eq!(outbound(&Event::GameWon), None);
    }

    #[test]
    fn flag_messages_replay_as_flag_commands() {
        let command = inbound(WireMessage::Explored { x: -1, y: 6 });
        assert_eq!(
            command,
            Command::SetCellFlag {
                cell: CellCoord::new(-1, 6),
                flag: ItemFlag::Explored,
            }
        );
    }

    #[test]
    fn hero_messages_replay_committed_moves() {
        let command = inbound(WireMessage::Hero {
            id: HeroId::new(2),
            cell: CellCoord::new(3, 0),
        });
        assert_eq!(
            command,
            Command::SyncHero {
                hero: HeroId::new(2),
                to: CellCoord::new(3, 0),
            }
        );
    }

    #[test]
    fn decode_reports_malformed_payloads() {
        assert!(matches!(decode("{\"type\":\"teleport\"}"), Err(WireError::Decode(_))));
        let message = decode(r#"{"type":"phase","phase":2}"#).expect("valid payload");
        assert_eq!(inbound(message), Command::SetPhase { phase: Phase::SECOND });
    }
}
