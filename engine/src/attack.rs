// ═══════════════════════════════════════════════════════════════════════
// Attack negotiation — planning/proposal state machine, advisory math
// ═══════════════════════════════════════════════════════════════════════
//
// The engine never resolves combat on its own. `start` opens a single
// negotiation, the attacker shapes a plan and proposes it, and only the
// target's acceptance mutates the board. The math below is advisory.

use crate::error::ActionError;
use crate::synergy::detect_clan_synergy;
use crate::types::{
    AttackPlan, AttackState, AttackStatus, AttackTarget, GameState, Seat, MAX_ATTACKERS,
};
use serde::{Deserialize, Serialize};

/// Advisory comparison of the declared force against the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackMath {
    pub attacker_total: f64,
    pub defense_value: i32,
}

/// True when every occupied slot shares one non-empty clan. Such boards
/// may send the whole crew; mixed boards are capped at MAX_ATTACKERS.
fn mono_clan(state: &GameState, seat: Seat) -> bool {
    let mut clans = state
        .side(seat)
        .slots
        .iter()
        .filter_map(|s| s.card.as_ref())
        .map(|c| c.clan.trim().to_lowercase());
    let Some(first) = clans.next() else { return false };
    !first.is_empty() && clans.all(|c| c == first)
}

pub fn start(
    state: &GameState,
    current: &Option<AttackState>,
    seat: Seat,
    attacker_slots: &[usize],
    target_slot: usize,
) -> Result<AttackState, ActionError> {
    if seat != state.active_player {
        return Err(ActionError::NotYourTurn);
    }
    if current.is_some() {
        return Err(ActionError::AttackInProgress);
    }
    if attacker_slots.is_empty() {
        return Err(ActionError::NoAttackers);
    }

    let side = state.side(seat);
    for (i, &slot) in attacker_slots.iter().enumerate() {
        if slot >= side.slots.len() {
            return Err(ActionError::InvalidSlot(slot));
        }
        if attacker_slots[..i].contains(&slot) {
            return Err(ActionError::DuplicateAttackers);
        }
        match side.slots[slot].card.as_ref() {
            Some(card) if card.atk > 0 => {}
            _ => return Err(ActionError::InvalidAttacker(slot)),
        }
    }
    if attacker_slots.len() > MAX_ATTACKERS && !mono_clan(state, seat) {
        return Err(ActionError::TooManyAttackers);
    }

    let defender = seat.opponent();
    let def_side = state.side(defender);
    if target_slot >= def_side.slots.len() {
        return Err(ActionError::InvalidSlot(target_slot));
    }
    if def_side.slots[target_slot].is_empty() {
        return Err(ActionError::EmptySlot(target_slot));
    }

    Ok(AttackState {
        attacker: seat,
        attacker_slots: attacker_slots.to_vec(),
        target: AttackTarget {
            seat: defender,
            slot: target_slot,
        },
        plan: AttackPlan::default(),
        status: AttackStatus::Planning,
    })
}

/// Reshape the plan while still planning. `remove_shields` is clamped to
/// what the target slot actually holds.
pub fn update_plan(
    state: &GameState,
    attack: &mut AttackState,
    seat: Seat,
    remove_shields: Option<u32>,
    destroy_card: Option<bool>,
) -> Result<(), ActionError> {
    if seat != attack.attacker {
        return Err(ActionError::NotAttacker);
    }
    if attack.status != AttackStatus::Planning {
        return Err(ActionError::WrongAttackStatus);
    }
    if let Some(n) = remove_shields {
        let held = state.side(attack.target.seat).slots[attack.target.slot].muscles as u32;
        attack.plan.remove_shields = n.min(held);
    }
    if let Some(flag) = destroy_card {
        attack.plan.destroy_card = flag;
    }
    Ok(())
}

pub fn propose(attack: &mut AttackState, seat: Seat) -> Result<(), ActionError> {
    if seat != attack.attacker {
        return Err(ActionError::NotAttacker);
    }
    if attack.status != AttackStatus::Planning {
        return Err(ActionError::WrongAttackStatus);
    }
    attack.status = AttackStatus::Proposed;
    Ok(())
}

/// What acceptance did to the target slot, for the room log.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    DestroyedCard { name: String, shields_lost: u32 },
    RemovedShields(u32),
}

/// Target accepts a proposed plan. Destroying sends the card to the
/// discard and its shields to the bank; otherwise up to the planned
/// number of shields comes off.
pub fn accept(
    state: &mut GameState,
    attack: &AttackState,
    seat: Seat,
) -> Result<AcceptOutcome, ActionError> {
    if seat != attack.target.seat {
        return Err(ActionError::NotTarget);
    }
    if attack.status != AttackStatus::Proposed {
        return Err(ActionError::WrongAttackStatus);
    }

    let slot = &mut state.side_mut(attack.target.seat).slots[attack.target.slot];
    if attack.plan.destroy_card {
        let Some(card) = slot.card.take() else {
            return Err(ActionError::EmptySlot(attack.target.slot));
        };
        let shields_lost = slot.muscles as u32;
        slot.muscles = 0;
        slot.face_up = false;
        let name = card.name.clone();
        state.discard.push(card);
        Ok(AcceptOutcome::DestroyedCard { name, shields_lost })
    } else {
        let removed = attack.plan.remove_shields.min(slot.muscles as u32);
        slot.muscles -= removed as u8;
        Ok(AcceptOutcome::RemovedShields(removed))
    }
}

/// Either participant may walk away in any status.
pub fn cancel(attack: &AttackState, seat: Seat) -> Result<(), ActionError> {
    if seat != attack.attacker && seat != attack.target.seat {
        return Err(ActionError::NotParticipant);
    }
    Ok(())
}

/// Advisory force comparison: Σ atk + Σ rage + 0.25 per attacker shield,
/// plus the board clan-synergy rage once per attacking card. Defense is
/// the target's hp plus its shields.
pub fn advisory_math(state: &GameState, attack: &AttackState) -> AttackMath {
    let side = state.side(attack.attacker);
    let mut total = 0.0;
    let mut shields = 0u32;
    for &i in &attack.attacker_slots {
        let Some(slot) = side.slots.get(i) else { continue };
        if let Some(card) = slot.card.as_ref() {
            total += (card.atk + card.rage) as f64;
            shields += slot.muscles as u32;
        }
    }
    total += 0.25 * shields as f64;
    if let Some(clan) = detect_clan_synergy(&side.slots) {
        total += (clan.bonus().rage * attack.attacker_slots.len() as i32) as f64;
    }

    let target = &state.side(attack.target.seat).slots[attack.target.slot];
    let hp = target.card.as_ref().map(|c| c.hp).unwrap_or(0);
    AttackMath {
        attacker_total: total,
        defense_value: hp + target.muscles as i32,
    }
}
