//! Messages exchanged with peers over the network transport.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, HeroId, ItemFlag, Orientation, Phase, TileTemplate};

/// Plain key/value messages broadcast to, and replayed from, remote peers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    /// A hero was committed to a new cell.
    Hero {
        /// Hero that moved.
        id: HeroId,
        /// Destination cell.
        cell: CellCoord,
    },
    /// A tile was placed.
    Tile {
        /// Origin column.
        x: i32,
        /// Origin row.
        y: i32,
        /// Placed template.
        tile: TileTemplate,
        /// Rotation applied to the template.
        orientation: Orientation,
    },
    /// An item was consumed.
    Used {
        /// Column of the item cell.
        x: i32,
        /// Row of the item cell.
        y: i32,
    },
    /// A gate or bridge was explored.
    Explored {
        /// Column of the item cell.
        x: i32,
        /// Row of the item cell.
        y: i32,
    },
    /// An article was stolen.
    Stolen {
        /// Column of the item cell.
        x: i32,
        /// Row of the item cell.
        y: i32,
    },
    /// The clock was flipped.
    InvertClock,
    /// Roles must be swapped between players.
    Swap,
    /// The game was paused or resumed.
    Pause {
        /// Pause state now active.
        paused: bool,
    },
    /// The game entered a new phase.
    Phase {
        /// Phase now active.
        phase: Phase,
    },
    /// A hero exited the board.
    Exit {
        /// Hero that exited.
        id: HeroId,
    },
    /// The admin should rerun the bots.
    Ai,
}

impl WireMessage {
    /// Builds the flag delta message for a cell, keyed by coordinate and flag name.
    #[must_use]
    pub const fn flag(cell: CellCoord, flag: ItemFlag) -> Self {
        let x = cell.x();
        let y = cell.y();
        match flag {
            ItemFlag::Used => Self::Used { x, y },
            ItemFlag::Explored => Self::Explored { x, y },
            ItemFlag::Stolen => Self::Stolen { x, y },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_deltas_serialize_as_plain_key_values() {
        let message = WireMessage::flag(CellCoord::new(4, -2), ItemFlag::Used);
        let json = serde_json::to_string(&message).expect("serialize");
        assert_eq!(json, r#"{"type":"used","x":4,"y":-2}"#);
    }

    #[test]
    fn hero_message_matches_peer_shape() {
        let message: WireMessage =
            serde_json::from_str(r#"{"type":"hero","id":2,"cell":{"x":5,"y":6}}"#)
                .expect("deserialize");
        assert_eq!(
            message,
            WireMessage::Hero {
                id: HeroId::new(2),
                cell: CellCoord::new(5, 6),
            }
        );
    }

    #[test]
    fn unit_messages_use_camel_case_tags() {
        let json = serde_json::to_string(&WireMessage::InvertClock).expect("serialize");
        assert_eq!(json, r#"{"type":"invertClock"}"#);
    }
}
