// ═══════════════════════════════════════════════════════════════════════
// Game setup — creates the initial GameState from a loaded catalog
// ═══════════════════════════════════════════════════════════════════════

use crate::types::{Card, CardType, GameState, PlayerState, Seat, TurnPhase};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Build the starting state: one boss per seat pulled from the catalog
/// into that seat's hand (when the catalog has them), the rest shuffled
/// into the deck. P1 opens turn 1.
pub fn create_initial_state(cards: Vec<Card>, rng: &mut ChaCha8Rng) -> GameState {
    let mut deck = cards;
    let mut sides = [PlayerState::new(Seat::P1), PlayerState::new(Seat::P2)];

    for side in sides.iter_mut() {
        if let Some(pos) = deck.iter().position(|c| c.card_type == CardType::Boss) {
            side.hand.push(deck.remove(pos));
        }
    }

    deck.shuffle(rng);

    GameState {
        deck,
        shelf: Vec::new(),
        discard: Vec::new(),
        sides,
        active_player: Seat::P1,
        turn_number: 1,
        phase: TurnPhase::Upkeep,
    }
}
