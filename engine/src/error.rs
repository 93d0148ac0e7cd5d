// ═══════════════════════════════════════════════════════════════════════
// Errors — every rejection carries a stable wire code
// ═══════════════════════════════════════════════════════════════════════

use thiserror::Error;

/// Why an action was rejected. Rejections never mutate state; `code()` is
/// the stable string clients match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("room already has two seated players")]
    RoomFull,
    #[error("deck is empty")]
    DeckEmpty,
    #[error("not enough money in reserve")]
    InsufficientReserve,
    #[error("bank is exhausted")]
    InsufficientBank,
    #[error("not enough shields on slot")]
    InsufficientShields,
    #[error("slot {0} does not exist")]
    InvalidSlot(usize),
    #[error("hand index {0} does not exist")]
    InvalidHandIndex(usize),
    #[error("shelf index {0} does not exist")]
    InvalidShelfIndex(usize),
    #[error("slot {0} is empty")]
    EmptySlot(usize),
    #[error("slot {0} is occupied")]
    OccupiedSlot(usize),
    #[error("unsupported move")]
    InvalidMove,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("only the attacker may do this")]
    NotAttacker,
    #[error("only the target may do this")]
    NotTarget,
    #[error("you are not part of this attack")]
    NotParticipant,
    #[error("no attack is in progress")]
    NoAttack,
    #[error("an attack is already in progress")]
    AttackInProgress,
    #[error("attack is not in the right status")]
    WrongAttackStatus,
    #[error("no valid attackers selected")]
    NoAttackers,
    #[error("slot {0} cannot attack")]
    InvalidAttacker(usize),
    #[error("duplicate attacker slots")]
    DuplicateAttackers,
    #[error("too many attackers for a mixed-clan board")]
    TooManyAttackers,
    #[error("slot already holds the maximum number of shields")]
    ShieldCap,
}

impl ActionError {
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::RoomFull => "room_full",
            ActionError::DeckEmpty => "deck_empty",
            ActionError::InsufficientReserve => "insufficient_reserve",
            ActionError::InsufficientBank => "insufficient_bank",
            ActionError::InsufficientShields => "insufficient_shields",
            ActionError::InvalidSlot(_) => "invalid_slot",
            ActionError::InvalidHandIndex(_) => "invalid_hand_index",
            ActionError::InvalidShelfIndex(_) => "invalid_shelf_index",
            ActionError::EmptySlot(_) => "empty_slot",
            ActionError::OccupiedSlot(_) => "occupied_slot",
            ActionError::InvalidMove => "invalid_move",
            ActionError::NotYourTurn => "not_your_turn",
            ActionError::NotAttacker => "not_attacker",
            ActionError::NotTarget => "not_target",
            ActionError::NotParticipant => "not_participant",
            ActionError::NoAttack => "no_attack",
            ActionError::AttackInProgress => "attack_in_progress",
            ActionError::WrongAttackStatus => "wrong_attack_status",
            ActionError::NoAttackers => "no_attackers",
            ActionError::InvalidAttacker(_) => "invalid_attacker",
            ActionError::DuplicateAttackers => "duplicate_attackers",
            ActionError::TooManyAttackers => "too_many_attackers",
            ActionError::ShieldCap => "shield_cap",
        }
    }
}

/// Catalog loading failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("bad CSV catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog contains no playable cards")]
    Empty,
}
