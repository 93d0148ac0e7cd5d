// ═══════════════════════════════════════════════════════════════════════
// Visibility / Information Model
//
// Information at the table is split between:
//   PUBLIC  — visible to both seats (shelf, tokens, face-up slots, log)
//   PRIVATE — known only to the owner (hand, face-down own slots)
//   HIDDEN  — unknown to both (deck order)
//
// This module produces a per-seat view of the room that only contains
// information that seat is legally allowed to know. Clients MUST only
// receive SeatView, never the raw GameState.
// ═══════════════════════════════════════════════════════════════════════

use crate::attack::{advisory_math, AttackMath};
use crate::engine::Room;
use crate::synergy::{board_synergy, BoardSynergy};
use crate::types::*;
use serde::{Deserialize, Serialize};

// ── View shapes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouView {
    pub id: Seat,
    pub hand: Vec<Card>,
    pub board: Vec<Slot>,
    pub tokens: TokenPools,
    pub visible_slots: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentView {
    pub id: Seat,
    pub hand_count: usize,
    pub board: Vec<Slot>,
    pub tokens: TokenPools,
    pub visible_slots: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedView {
    pub deck_count: usize,
    pub shelf: Vec<Card>,
    pub discard_count: usize,
    pub bank: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnView {
    pub active_player: Seat,
    pub turn_number: u32,
    pub phase: TurnPhase,
    pub your_turn: bool,
}

/// The negotiation is public to both seats, advisory math included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackView {
    pub attacker: Seat,
    pub attacker_slots: Vec<usize>,
    pub target: AttackTarget,
    pub plan: AttackPlan,
    pub status: AttackStatus,
    pub math: AttackMath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynergyView {
    pub you: BoardSynergy,
    pub opponent: BoardSynergy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub you: YouView,
    pub opponent: OpponentView,
    pub shared: SharedView,
    pub turn: TurnView,
    pub attack: Option<AttackView>,
    pub synergy: SynergyView,
    pub log: Vec<LogEntry>,
}

// ── Projection ─────────────────────────────────────────────────────────

fn masked_slot(slot: &Slot) -> Slot {
    if slot.face_up {
        slot.clone()
    } else {
        // a face-down opposing slot shows nothing, not even shields
        Slot {
            card: None,
            face_up: false,
            muscles: 0,
        }
    }
}

/// Project the room onto one seat. Pure; never mutates the room.
pub fn project(room: &Room, viewer: Seat) -> SeatView {
    let state = &room.state;
    let me = state.side(viewer);
    let opp = state.side(viewer.opponent());
    let my_window = room.visible_slots[viewer.index()];
    let opp_window = room.visible_slots[viewer.opponent().index()];

    let you = YouView {
        id: viewer,
        hand: me.hand.clone(),
        board: me.slots[..my_window.min(me.slots.len())].to_vec(),
        tokens: me.tokens.clone(),
        visible_slots: my_window,
    };

    let opponent = OpponentView {
        id: viewer.opponent(),
        hand_count: opp.hand.len(),
        board: opp.slots[..opp_window.min(opp.slots.len())]
            .iter()
            .map(masked_slot)
            .collect(),
        tokens: opp.tokens.clone(),
        visible_slots: opp_window,
    };

    let shared = SharedView {
        deck_count: state.deck.len(),
        shelf: state.shelf.clone(),
        discard_count: state.discard.len(),
        bank: state.bank(),
    };

    let turn = TurnView {
        active_player: state.active_player,
        turn_number: state.turn_number,
        phase: state.phase,
        your_turn: state.active_player == viewer,
    };

    let attack = room.attack.as_ref().map(|a| AttackView {
        attacker: a.attacker,
        attacker_slots: a.attacker_slots.clone(),
        target: a.target,
        plan: a.plan,
        status: a.status,
        math: advisory_math(state, a),
    });

    // opponent synergy is computed over the masked board so face-down
    // cards cannot leak through their clan
    let opp_masked: Vec<Slot> = opp.slots.iter().map(masked_slot).collect();
    let synergy = SynergyView {
        you: board_synergy(&me.slots),
        opponent: board_synergy(&opp_masked),
    };

    let tail = room.log.len().saturating_sub(LOG_VIEW_TAIL);
    SeatView {
        you,
        opponent,
        shared,
        turn,
        attack,
        synergy,
        log: room.log[tail..].to_vec(),
    }
}
