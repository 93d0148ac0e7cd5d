// ═══════════════════════════════════════════════════════════════════════
// Wire messages — closed tagged unions for both directions
// ═══════════════════════════════════════════════════════════════════════

use kingpin_engine::visibility::SeatView;
use kingpin_engine::{Action, Seat};
use serde::{Deserialize, Serialize};

/// One client frame. Every message names its room; the body is either a
/// session request or a game action. Anything else fails to parse and
/// gets an `invalid_payload` error, never a silent drop.
#[derive(Debug, Deserialize)]
pub struct Inbound {
    pub room: String,
    #[serde(flatten)]
    pub body: InboundBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InboundBody {
    Session(SessionRequest),
    Game(Action),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionRequest {
    JoinRoom {
        #[serde(default)]
        source: Option<String>,
    },
    ResetRoom {
        #[serde(default)]
        source: Option<String>,
    },
    /// Lossy presence ping; relayed, never stored.
    Cursor {
        x: f64,
        y: f64,
        #[serde(default = "default_true")]
        visible: bool,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        room: String,
        seat: Seat,
        source: &'static str,
        #[serde(rename = "visibleSlots")]
        visible_slots: usize,
    },
    RoomFull {
        room: String,
    },
    State {
        #[serde(flatten)]
        view: Box<SeatView>,
    },
    Cursor {
        seat: Seat,
        x: f64,
        y: f64,
        visible: bool,
    },
    Error {
        msg: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════
