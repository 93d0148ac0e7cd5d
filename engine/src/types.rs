// ═══════════════════════════════════════════════════════════════════════
// Core types — seats, cards, slots, pools, turn state
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

// ── Constants ──────────────────────────────────────────────────────────

/// Fixed token supply shared by both seats. Bank = TOTAL_TOKENS minus
/// everything held in reserves and on slots as shields.
pub const TOTAL_TOKENS: u32 = 40;
/// Money each seat starts with in its reserve.
pub const STARTING_RESERVE: u32 = 12;
/// Physical slots per board.
pub const MAX_SLOTS: usize = 9;
/// Visible-slot window bounds (per owner, adjustable at the table).
pub const MIN_VISIBLE_SLOTS: usize = 6;
pub const INIT_VISIBLE_SLOTS: usize = 6;
/// Shield (muscle) cap per slot.
pub const MAX_MUSCLES: u8 = 4;
/// Attacker cap, lifted when the whole board shares one clan.
pub const MAX_ATTACKERS: usize = 3;
/// How many trailing log entries a view carries.
pub const LOG_VIEW_TAIL: usize = 50;

// ── Enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Seat {
    P1,
    P2,
}

impl Seat {
    pub const BOTH: [Seat; 2] = [Seat::P1, Seat::P2];

    pub fn opponent(self) -> Seat {
        match self {
            Seat::P1 => Seat::P2,
            Seat::P2 => Seat::P1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Seat::P1 => 0,
            Seat::P2 => 1,
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seat::P1 => write!(f, "P1"),
            Seat::P2 => write!(f, "P2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Boss,
    Unique,
    #[default]
    Common,
    Event,
    Action,
    Token,
}

impl CardType {
    /// Lenient tag parser for catalog files; anything unrecognized is common.
    pub fn parse(tag: &str) -> CardType {
        match tag.trim().to_ascii_lowercase().as_str() {
            "boss" => CardType::Boss,
            "unique" => CardType::Unique,
            "event" => CardType::Event,
            "action" => CardType::Action,
            "token" => CardType::Token,
            _ => CardType::Common,
        }
    }
}

/// Free-form turn phase tag. Advances upkeep → main → resolution → end as
/// the table likes; the engine only resets it on turn handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    #[default]
    Upkeep,
    Main,
    Resolution,
    End,
}

/// Card containers addressable by move_card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Hand,
    Slot,
    Shelf,
    Discard,
}

// ── Cards and slots ────────────────────────────────────────────────────

/// Immutable catalog record. Stats never change after load; transient
/// bonuses (synergy) are computed at view time, not written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub faction: String,
    #[serde(default)]
    pub clan: String,
    #[serde(default)]
    pub hp: i32,
    #[serde(default)]
    pub atk: i32,
    #[serde(default)]
    pub d: i32,
    #[serde(default)]
    pub price: i32,
    #[serde(default)]
    pub corruption: i32,
    #[serde(default)]
    pub rage: i32,
    #[serde(default)]
    pub pair_hp: i32,
    #[serde(default)]
    pub pair_d: i32,
    #[serde(default)]
    pub pair_r: i32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub card: Option<Card>,
    pub face_up: bool,
    /// Shields guarding this slot, 0..=MAX_MUSCLES.
    pub muscles: u8,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.card.is_none()
    }
}

// ── Per-seat and shared state ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPools {
    pub reserve_money: u32,
    /// Informational counter, outside the conserved supply.
    pub otboy: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: Seat,
    pub hand: Vec<Card>,
    pub slots: Vec<Slot>,
    pub tokens: TokenPools,
}

impl PlayerState {
    pub fn new(id: Seat) -> PlayerState {
        PlayerState {
            id,
            hand: Vec::new(),
            slots: vec![Slot::default(); MAX_SLOTS],
            tokens: TokenPools {
                reserve_money: STARTING_RESERVE,
                otboy: 0,
            },
        }
    }

    pub fn total_shields(&self) -> u32 {
        self.slots.iter().map(|s| s.muscles as u32).sum()
    }
}

// ── Attack negotiation ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStatus {
    Planning,
    Proposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackTarget {
    pub seat: Seat,
    pub slot: usize,
}

/// What the attacker offers to do on acceptance. Advisory until the
/// target accepts; nothing in the plan is ever auto-applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttackPlan {
    pub remove_shields: u32,
    pub destroy_card: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackState {
    pub attacker: Seat,
    pub attacker_slots: Vec<usize>,
    pub target: AttackTarget,
    pub plan: AttackPlan,
    pub status: AttackStatus,
}

// ── Log ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: u64,
    /// Unix milliseconds.
    pub ts: u64,
    pub kind: String,
    pub msg: String,
    pub actor: Option<Seat>,
    pub turn: u32,
    pub active: Seat,
}

// ── Game state aggregate ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub deck: Vec<Card>,
    /// Face-up shared pile anyone may browse; the active seat may take.
    pub shelf: Vec<Card>,
    pub discard: Vec<Card>,
    pub sides: [PlayerState; 2],
    pub active_player: Seat,
    pub turn_number: u32,
    pub phase: TurnPhase,
}

impl GameState {
    pub fn side(&self, seat: Seat) -> &PlayerState {
        &self.sides[seat.index()]
    }

    pub fn side_mut(&mut self, seat: Seat) -> &mut PlayerState {
        &mut self.sides[seat.index()]
    }

    /// Tokens not held by either seat. Derived, never stored; every
    /// economy operation must leave this non-negative.
    pub fn bank(&self) -> i64 {
        let held: u32 = self
            .sides
            .iter()
            .map(|p| p.tokens.reserve_money + p.total_shields())
            .sum();
        TOTAL_TOKENS as i64 - held as i64
    }
}
