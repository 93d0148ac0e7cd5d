// ═══════════════════════════════════════════════════════════════════════
// Room engine — seats, action dispatch, turn machine, room log
//
// Architecture:
//   The engine is a pure state machine. It never does I/O. The server
//   and simulator hand it (seat, Action) pairs via `apply()`; either the
//   whole action commits and lands in the room log, or nothing changes
//   and the ActionError says why.
// ═══════════════════════════════════════════════════════════════════════

use crate::attack::{self, AcceptOutcome};
use crate::catalog::CatalogSource;
use crate::economy;
use crate::error::ActionError;
use crate::setup::create_initial_state;
use crate::types::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// ── Actions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Money,
}

/// Everything a seated player can do to the table. Doubles as the wire
/// format: `type` tag in snake_case, fields in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Action {
    Draw,
    FlipCard {
        slot_index: usize,
    },
    MoveCard {
        from: Zone,
        to: Zone,
        from_index: usize,
        #[serde(default)]
        to_index: Option<usize>,
    },
    SetVisibleSlots {
        count: usize,
    },
    AddToken {
        kind: TokenKind,
        count: u32,
    },
    RemoveToken {
        kind: TokenKind,
        count: u32,
    },
    AddShieldFromReserve {
        slot_index: usize,
        count: u32,
    },
    RemoveShieldToReserve {
        slot_index: usize,
        count: u32,
    },
    AddShieldOnly {
        slot_index: usize,
        count: u32,
    },
    RemoveShieldOnly {
        slot_index: usize,
        count: u32,
    },
    RemoveOpponentShield {
        slot_index: usize,
    },
    ShuffleDeck,
    EndTurn,
    StartAttack {
        attacker_slots: Vec<usize>,
        target_slot: usize,
    },
    AttackUpdatePlan {
        #[serde(default)]
        remove_shields: Option<u32>,
        #[serde(default)]
        destroy_card: Option<bool>,
    },
    AttackPropose,
    AttackAccept,
    AttackCancel,
}

// ── Room ───────────────────────────────────────────────────────────────

/// One table: two seats, one shared game state, at most one attack
/// negotiation, and an append-only log.
#[derive(Debug, Clone)]
pub struct Room {
    pub state: GameState,
    pub attack: Option<AttackState>,
    /// Per-seat visible-slot window, MIN_VISIBLE_SLOTS..=MAX_SLOTS.
    pub visible_slots: [usize; 2],
    pub source: CatalogSource,
    pub log: Vec<LogEntry>,
    seats: [Option<String>; 2],
    rng: ChaCha8Rng,
    next_log_id: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Room {
    pub fn new(cards: Vec<Card>, source: CatalogSource, seed: u64) -> Room {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let state = create_initial_state(cards, &mut rng);
        let mut room = Room {
            state,
            attack: None,
            visible_slots: [INIT_VISIBLE_SLOTS; 2],
            source,
            log: Vec::new(),
            seats: [None, None],
            rng,
            next_log_id: 0,
        };
        room.log_event(
            "load",
            None,
            format!(
                "Catalog loaded: deck={}, shelf={}",
                room.state.deck.len(),
                room.state.shelf.len()
            ),
        );
        room.log_event(
            "room",
            None,
            format!("Room created (source={})", source.as_str().to_uppercase()),
        );
        room.log_event(
            "turn_start",
            None,
            format!(
                "Game started. Active: {} · Turn {}",
                room.state.active_player, room.state.turn_number
            ),
        );
        room
    }

    // ── Seats ──────────────────────────────────────────────────────

    /// P1 first, then P2; a returning client keeps its seat. A third
    /// client is rejected without disturbing anything.
    pub fn join(&mut self, client_id: &str) -> Result<Seat, ActionError> {
        if let Some(seat) = self.seat_of(client_id) {
            return Ok(seat);
        }
        for seat in Seat::BOTH {
            if self.seats[seat.index()].is_none() {
                self.seats[seat.index()] = Some(client_id.to_string());
                self.log_event("join", Some(seat), format!("{seat} joined"));
                return Ok(seat);
            }
        }
        Err(ActionError::RoomFull)
    }

    pub fn vacate(&mut self, client_id: &str) -> Option<Seat> {
        let seat = self.seat_of(client_id)?;
        self.seats[seat.index()] = None;
        self.log_event("leave", Some(seat), format!("{seat} left"));
        Some(seat)
    }

    pub fn seat_of(&self, client_id: &str) -> Option<Seat> {
        Seat::BOTH
            .into_iter()
            .find(|s| self.seats[s.index()].as_deref() == Some(client_id))
    }

    pub fn occupied_seats(&self) -> Vec<Seat> {
        Seat::BOTH
            .into_iter()
            .filter(|s| self.seats[s.index()].is_some())
            .collect()
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Rebuild the table from a fresh catalog. Seats and visible-slot
    /// windows survive; everything else starts over.
    pub fn reset(&mut self, cards: Vec<Card>, source: CatalogSource) {
        let reseed = self.rng.gen::<u64>();
        self.rng = ChaCha8Rng::seed_from_u64(reseed);
        self.state = create_initial_state(cards, &mut self.rng);
        self.attack = None;
        self.source = source;
        self.log.clear();
        self.next_log_id = 0;
        self.log_event(
            "load",
            None,
            format!(
                "After reset: shelf={}, deck={}",
                self.state.shelf.len(),
                self.state.deck.len()
            ),
        );
        self.log_event(
            "reset",
            None,
            format!("Room reset (source={})", source.as_str().to_uppercase()),
        );
        self.log_event(
            "turn_start",
            None,
            format!(
                "Game started. Active: {} · Turn {}",
                self.state.active_player, self.state.turn_number
            ),
        );
    }

    fn log_event(&mut self, kind: &str, actor: Option<Seat>, msg: String) {
        let entry = LogEntry {
            id: self.next_log_id,
            ts: now_millis(),
            kind: kind.to_string(),
            msg,
            actor,
            turn: self.state.turn_number,
            active: self.state.active_player,
        };
        self.next_log_id += 1;
        self.log.push(entry);
    }

    // ── Dispatch ───────────────────────────────────────────────────

    pub fn apply(&mut self, seat: Seat, action: Action) -> Result<(), ActionError> {
        match action {
            Action::Draw => self.draw(seat),
            Action::FlipCard { slot_index } => self.flip_card(seat, slot_index),
            Action::MoveCard {
                from,
                to,
                from_index,
                to_index,
            } => self.move_card(seat, from, to, from_index, to_index),
            Action::SetVisibleSlots { count } => self.set_visible_slots(seat, count),
            Action::AddToken { kind, count } => self.add_token(seat, kind, count),
            Action::RemoveToken { kind, count } => self.remove_token(seat, kind, count),
            Action::AddShieldFromReserve { slot_index, count } => {
                economy::add_shield_from_reserve(&mut self.state, seat, slot_index, count)?;
                self.log_event(
                    "token",
                    Some(seat),
                    format!(
                        "{seat} spent {count} money → +{count} shield on slot {}",
                        slot_index + 1
                    ),
                );
                Ok(())
            }
            Action::RemoveShieldToReserve { slot_index, count } => {
                economy::remove_shield_to_reserve(&mut self.state, seat, slot_index, count)?;
                self.log_event(
                    "token",
                    Some(seat),
                    format!(
                        "{seat} returned {count} shield → +{count} money to reserve from slot {}",
                        slot_index + 1
                    ),
                );
                Ok(())
            }
            Action::AddShieldOnly { slot_index, count } => {
                economy::add_shield_only(&mut self.state, seat, slot_index, count)?;
                self.log_event(
                    "token",
                    Some(seat),
                    format!("{seat} +{count} shield on slot {} (internal)", slot_index + 1),
                );
                Ok(())
            }
            Action::RemoveShieldOnly { slot_index, count } => {
                economy::remove_shield_only(&mut self.state, seat, slot_index, count)?;
                self.log_event(
                    "token",
                    Some(seat),
                    format!("{seat} -{count} shield on slot {} (internal)", slot_index + 1),
                );
                Ok(())
            }
            Action::RemoveOpponentShield { slot_index } => {
                economy::remove_opponent_shield(&mut self.state, seat, slot_index)?;
                self.log_event(
                    "token",
                    Some(seat),
                    format!(
                        "{seat} destroyed 1 shield on {}'s slot {}",
                        seat.opponent(),
                        slot_index + 1
                    ),
                );
                Ok(())
            }
            Action::ShuffleDeck => {
                self.state.deck.shuffle(&mut self.rng);
                self.log_event("shuffle", Some(seat), "Deck shuffled".to_string());
                Ok(())
            }
            Action::EndTurn => self.end_turn(seat),
            Action::StartAttack {
                attacker_slots,
                target_slot,
            } => self.start_attack(seat, &attacker_slots, target_slot),
            Action::AttackUpdatePlan {
                remove_shields,
                destroy_card,
            } => self.attack_update_plan(seat, remove_shields, destroy_card),
            Action::AttackPropose => self.attack_propose(seat),
            Action::AttackAccept => self.attack_accept(seat),
            Action::AttackCancel => self.attack_cancel(seat),
        }
    }

    // ── Cards ──────────────────────────────────────────────────────

    fn draw(&mut self, seat: Seat) -> Result<(), ActionError> {
        if self.state.deck.is_empty() && !self.state.shelf.is_empty() {
            // recycle the shelf before giving up
            self.state.shelf.shuffle(&mut self.rng);
            let recycled = std::mem::take(&mut self.state.shelf);
            self.state.deck.extend(recycled);
        }
        if self.state.deck.is_empty() {
            return Err(ActionError::DeckEmpty);
        }
        let card = self.state.deck.remove(0);
        self.state.side_mut(seat).hand.push(card);
        self.log_event("draw", Some(seat), format!("{seat} drew a card"));
        Ok(())
    }

    fn flip_card(&mut self, seat: Seat, slot_index: usize) -> Result<(), ActionError> {
        let slot = self
            .state
            .side_mut(seat)
            .slots
            .get_mut(slot_index)
            .ok_or(ActionError::InvalidSlot(slot_index))?;
        let name = match slot.card.as_ref() {
            Some(card) => card.name.clone(),
            None => return Err(ActionError::EmptySlot(slot_index)),
        };
        slot.face_up = !slot.face_up;
        let dir = if slot.face_up { "up" } else { "down" };
        self.log_event("flip", Some(seat), format!("{seat} flipped {name} {dir}"));
        Ok(())
    }

    fn move_card(
        &mut self,
        seat: Seat,
        from: Zone,
        to: Zone,
        from_index: usize,
        to_index: Option<usize>,
    ) -> Result<(), ActionError> {
        match (from, to) {
            (Zone::Hand, Zone::Slot) => {
                let si = to_index.ok_or(ActionError::InvalidMove)?;
                let side = self.state.side_mut(seat);
                if from_index >= side.hand.len() {
                    return Err(ActionError::InvalidHandIndex(from_index));
                }
                if si >= side.slots.len() {
                    return Err(ActionError::InvalidSlot(si));
                }
                let card = side.hand.remove(from_index);
                let name = card.name.clone();
                let slot = &mut side.slots[si];
                let swapped = slot.card.replace(card);
                slot.face_up = true;
                match swapped {
                    None => self.log_event(
                        "play",
                        Some(seat),
                        format!("{seat} played {name} to slot {}", si + 1),
                    ),
                    Some(prev) => {
                        self.state.side_mut(seat).hand.push(prev);
                        self.log_event(
                            "swap",
                            Some(seat),
                            format!("{seat} swapped card into slot {}", si + 1),
                        );
                    }
                }
                Ok(())
            }
            (Zone::Slot, Zone::Hand) => {
                let side = self.state.side_mut(seat);
                let slot = side
                    .slots
                    .get_mut(from_index)
                    .ok_or(ActionError::InvalidSlot(from_index))?;
                let card = slot.card.take().ok_or(ActionError::EmptySlot(from_index))?;
                // picked-up shields fall back into the bank
                slot.muscles = 0;
                slot.face_up = false;
                let name = card.name.clone();
                side.hand.push(card);
                self.log_event(
                    "pickup",
                    Some(seat),
                    format!("{seat} picked up {name} from slot {}", from_index + 1),
                );
                Ok(())
            }
            (Zone::Slot, Zone::Slot) => {
                let di = to_index.ok_or(ActionError::InvalidMove)?;
                let side = self.state.side_mut(seat);
                if from_index >= side.slots.len() {
                    return Err(ActionError::InvalidSlot(from_index));
                }
                if di >= side.slots.len() {
                    return Err(ActionError::InvalidSlot(di));
                }
                if from_index != di {
                    // cards swap, shields stay with their slots
                    let (a, b) = (from_index.min(di), from_index.max(di));
                    let (head, tail) = side.slots.split_at_mut(b);
                    std::mem::swap(&mut head[a].card, &mut tail[0].card);
                    for i in [from_index, di] {
                        if side.slots[i].card.is_some() {
                            side.slots[i].face_up = true;
                        }
                    }
                }
                self.log_event(
                    "rearrange",
                    Some(seat),
                    format!("{seat} rearranged slots {} ⇄ {}", from_index + 1, di + 1),
                );
                Ok(())
            }
            (Zone::Hand, Zone::Discard) => {
                let side = self.state.side_mut(seat);
                if from_index >= side.hand.len() {
                    return Err(ActionError::InvalidHandIndex(from_index));
                }
                let card = side.hand.remove(from_index);
                let name = card.name.clone();
                self.state.discard.push(card);
                self.log_event(
                    "discard",
                    Some(seat),
                    format!("{seat} discarded {name} to Discard pile"),
                );
                Ok(())
            }
            (Zone::Slot, Zone::Discard) => {
                let side = self.state.side_mut(seat);
                let slot = side
                    .slots
                    .get_mut(from_index)
                    .ok_or(ActionError::InvalidSlot(from_index))?;
                let card = slot.card.take().ok_or(ActionError::EmptySlot(from_index))?;
                slot.muscles = 0;
                slot.face_up = false;
                let name = card.name.clone();
                self.state.discard.push(card);
                self.log_event(
                    "discard",
                    Some(seat),
                    format!(
                        "{seat} discarded {name} from slot {} to Discard pile",
                        from_index + 1
                    ),
                );
                Ok(())
            }
            (Zone::Hand, Zone::Shelf) => {
                let side = self.state.side_mut(seat);
                if from_index >= side.hand.len() {
                    return Err(ActionError::InvalidHandIndex(from_index));
                }
                let card = side.hand.remove(from_index);
                let name = card.name.clone();
                self.state.shelf.push(card);
                self.log_event(
                    "shelve",
                    Some(seat),
                    format!("{seat} placed {name} on Reserve pile"),
                );
                Ok(())
            }
            (Zone::Slot, Zone::Shelf) => {
                let side = self.state.side_mut(seat);
                let slot = side
                    .slots
                    .get_mut(from_index)
                    .ok_or(ActionError::InvalidSlot(from_index))?;
                let card = slot.card.take().ok_or(ActionError::EmptySlot(from_index))?;
                slot.muscles = 0;
                slot.face_up = false;
                let name = card.name.clone();
                self.state.shelf.push(card);
                self.log_event(
                    "shelve",
                    Some(seat),
                    format!(
                        "{seat} moved {name} from slot {} to Reserve pile",
                        from_index + 1
                    ),
                );
                Ok(())
            }
            (Zone::Shelf, Zone::Hand) => {
                if seat != self.state.active_player {
                    return Err(ActionError::NotYourTurn);
                }
                if from_index >= self.state.shelf.len() {
                    return Err(ActionError::InvalidShelfIndex(from_index));
                }
                let card = self.state.shelf.remove(from_index);
                let name = card.name.clone();
                self.state.side_mut(seat).hand.push(card);
                self.log_event(
                    "unshelve",
                    Some(seat),
                    format!("{seat} took {name} from Reserve pile to hand"),
                );
                Ok(())
            }
            (Zone::Shelf, Zone::Slot) => {
                if seat != self.state.active_player {
                    return Err(ActionError::NotYourTurn);
                }
                let si = to_index.ok_or(ActionError::InvalidMove)?;
                if from_index >= self.state.shelf.len() {
                    return Err(ActionError::InvalidShelfIndex(from_index));
                }
                if si >= self.state.side(seat).slots.len() {
                    return Err(ActionError::InvalidSlot(si));
                }
                if !self.state.side(seat).slots[si].is_empty() {
                    return Err(ActionError::OccupiedSlot(si));
                }
                let card = self.state.shelf.remove(from_index);
                let name = card.name.clone();
                let slot = &mut self.state.side_mut(seat).slots[si];
                slot.card = Some(card);
                slot.face_up = true;
                self.log_event(
                    "unshelve",
                    Some(seat),
                    format!("{seat} played {name} from shelf to slot {}", si + 1),
                );
                Ok(())
            }
            _ => Err(ActionError::InvalidMove),
        }
    }

    fn set_visible_slots(&mut self, seat: Seat, count: usize) -> Result<(), ActionError> {
        let n = count.clamp(MIN_VISIBLE_SLOTS, MAX_SLOTS);
        self.visible_slots[seat.index()] = n;
        self.log_event("ui", Some(seat), format!("{seat} set visible slots to {n}"));
        Ok(())
    }

    // ── Economy ────────────────────────────────────────────────────

    fn add_token(&mut self, seat: Seat, kind: TokenKind, count: u32) -> Result<(), ActionError> {
        match kind {
            TokenKind::Money => economy::add_token(&mut self.state, seat, count)?,
        }
        self.log_event("token", Some(seat), format!("{seat} +{count} money"));
        Ok(())
    }

    fn remove_token(&mut self, seat: Seat, kind: TokenKind, count: u32) -> Result<(), ActionError> {
        match kind {
            TokenKind::Money => economy::remove_token(&mut self.state, seat, count)?,
        }
        self.log_event("token", Some(seat), format!("{seat} -{count} money"));
        Ok(())
    }

    // ── Turn machine ───────────────────────────────────────────────

    fn end_turn(&mut self, seat: Seat) -> Result<(), ActionError> {
        if seat != self.state.active_player {
            return Err(ActionError::NotYourTurn);
        }
        let prev = self.state.active_player;
        self.state.active_player = prev.opponent();
        self.state.turn_number += 1;
        self.state.phase = TurnPhase::Upkeep;
        self.log_event(
            "end_turn",
            Some(seat),
            format!(
                "{prev} ended turn. Now {}'s turn · Turn {}",
                self.state.active_player, self.state.turn_number
            ),
        );
        Ok(())
    }

    // ── Attack negotiation ─────────────────────────────────────────

    fn start_attack(
        &mut self,
        seat: Seat,
        attacker_slots: &[usize],
        target_slot: usize,
    ) -> Result<(), ActionError> {
        let attack = attack::start(&self.state, &self.attack, seat, attacker_slots, target_slot)?;
        let listed = attack
            .attacker_slots
            .iter()
            .map(|i| (i + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.log_event(
            "attack",
            Some(seat),
            format!(
                "{seat} started attack → {} slot {} (attackers: {listed})",
                seat.opponent(),
                target_slot + 1
            ),
        );
        self.attack = Some(attack);
        Ok(())
    }

    fn attack_update_plan(
        &mut self,
        seat: Seat,
        remove_shields: Option<u32>,
        destroy_card: Option<bool>,
    ) -> Result<(), ActionError> {
        let mut current = self.attack.take().ok_or(ActionError::NoAttack)?;
        let res = attack::update_plan(&self.state, &mut current, seat, remove_shields, destroy_card);
        self.attack = Some(current);
        res
    }

    fn attack_propose(&mut self, seat: Seat) -> Result<(), ActionError> {
        let attack = self.attack.as_mut().ok_or(ActionError::NoAttack)?;
        attack::propose(attack, seat)?;
        let plan = attack.plan;
        self.log_event(
            "attack",
            Some(seat),
            format!(
                "{seat} proposed destruction: shields={}, card={}",
                plan.remove_shields, plan.destroy_card
            ),
        );
        Ok(())
    }

    fn attack_accept(&mut self, seat: Seat) -> Result<(), ActionError> {
        let attack = self.attack.clone().ok_or(ActionError::NoAttack)?;
        let outcome = attack::accept(&mut self.state, &attack, seat)?;
        match outcome {
            AcceptOutcome::DestroyedCard { name, .. } => self.log_event(
                "destroy",
                Some(attack.attacker),
                format!(
                    "{} destroyed {}'s {name} on slot {}",
                    attack.attacker,
                    attack.target.seat,
                    attack.target.slot + 1
                ),
            ),
            AcceptOutcome::RemovedShields(n) => self.log_event(
                "attack",
                Some(attack.attacker),
                format!(
                    "{} removed {n} shield(s) from {}'s slot {}",
                    attack.attacker,
                    attack.target.seat,
                    attack.target.slot + 1
                ),
            ),
        }
        self.attack = None;
        Ok(())
    }

    fn attack_cancel(&mut self, seat: Seat) -> Result<(), ActionError> {
        let attack = self.attack.as_ref().ok_or(ActionError::NoAttack)?;
        attack::cancel(attack, seat)?;
        self.attack = None;
        self.log_event("attack", Some(seat), format!("{seat} canceled the attack"));
        Ok(())
    }
}
