// ═══════════════════════════════════════════════════════════════════════
// Token & shield economy — conservation-checked, reject not clamp
// ═══════════════════════════════════════════════════════════════════════
//
// Invariant: bank = TOTAL_TOKENS − Σ reserves − Σ shields stays ≥ 0.
// Every function validates fully before touching state.

use crate::error::ActionError;
use crate::types::{GameState, Seat, MAX_MUSCLES};

fn check_slot(state: &GameState, seat: Seat, slot: usize) -> Result<(), ActionError> {
    if slot >= state.side(seat).slots.len() {
        return Err(ActionError::InvalidSlot(slot));
    }
    Ok(())
}

/// Bank → reserve.
pub fn add_token(state: &mut GameState, seat: Seat, count: u32) -> Result<(), ActionError> {
    if state.bank() < count as i64 {
        return Err(ActionError::InsufficientBank);
    }
    state.side_mut(seat).tokens.reserve_money += count;
    Ok(())
}

/// Reserve → bank.
pub fn remove_token(state: &mut GameState, seat: Seat, count: u32) -> Result<(), ActionError> {
    let reserve = state.side(seat).tokens.reserve_money;
    if reserve < count {
        return Err(ActionError::InsufficientReserve);
    }
    state.side_mut(seat).tokens.reserve_money = reserve - count;
    Ok(())
}

/// Reserve → shields on an own slot. Bank unchanged.
pub fn add_shield_from_reserve(
    state: &mut GameState,
    seat: Seat,
    slot: usize,
    count: u32,
) -> Result<(), ActionError> {
    check_slot(state, seat, slot)?;
    let side = state.side(seat);
    if side.tokens.reserve_money < count {
        return Err(ActionError::InsufficientReserve);
    }
    if side.slots[slot].muscles as u32 + count > MAX_MUSCLES as u32 {
        return Err(ActionError::ShieldCap);
    }
    let side = state.side_mut(seat);
    side.tokens.reserve_money -= count;
    side.slots[slot].muscles += count as u8;
    Ok(())
}

/// Shields on an own slot → reserve. Bank unchanged.
pub fn remove_shield_to_reserve(
    state: &mut GameState,
    seat: Seat,
    slot: usize,
    count: u32,
) -> Result<(), ActionError> {
    check_slot(state, seat, slot)?;
    let side = state.side(seat);
    if (side.slots[slot].muscles as u32) < count {
        return Err(ActionError::InsufficientShields);
    }
    let side = state.side_mut(seat);
    side.slots[slot].muscles -= count as u8;
    side.tokens.reserve_money += count;
    Ok(())
}

/// Bank → shields, skipping the reserve. Used pairwise with
/// `remove_shield_only` to relocate shields between slots.
pub fn add_shield_only(
    state: &mut GameState,
    seat: Seat,
    slot: usize,
    count: u32,
) -> Result<(), ActionError> {
    check_slot(state, seat, slot)?;
    if state.bank() < count as i64 {
        return Err(ActionError::InsufficientBank);
    }
    let cur = state.side(seat).slots[slot].muscles;
    if cur as u32 + count > MAX_MUSCLES as u32 {
        return Err(ActionError::ShieldCap);
    }
    state.side_mut(seat).slots[slot].muscles = cur + count as u8;
    Ok(())
}

/// Shields → bank, skipping the reserve.
pub fn remove_shield_only(
    state: &mut GameState,
    seat: Seat,
    slot: usize,
    count: u32,
) -> Result<(), ActionError> {
    check_slot(state, seat, slot)?;
    let cur = state.side(seat).slots[slot].muscles;
    if (cur as u32) < count {
        return Err(ActionError::InsufficientShields);
    }
    state.side_mut(seat).slots[slot].muscles = cur - count as u8;
    Ok(())
}

/// Destroy one shield on an opposing slot; the token returns to the bank.
pub fn remove_opponent_shield(
    state: &mut GameState,
    seat: Seat,
    slot: usize,
) -> Result<(), ActionError> {
    let opp = seat.opponent();
    check_slot(state, opp, slot)?;
    let cur = state.side(opp).slots[slot].muscles;
    if cur == 0 {
        return Err(ActionError::InsufficientShields);
    }
    state.side_mut(opp).slots[slot].muscles = cur - 1;
    Ok(())
}
