// ═══════════════════════════════════════════════════════════════════════
// Simulator — drives random action sequences and checks invariants
// ═══════════════════════════════════════════════════════════════════════

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use kingpin_engine::catalog::{self, CatalogSource};
use kingpin_engine::{Action, Room, Seat, TokenKind, Zone, MAX_MUSCLES, MAX_SLOTS, TOTAL_TOKENS};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kingpin-sim", about = "Kingpin rules-engine fuzzer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run random games against the engine and verify invariants
    Run {
        #[arg(short, long, default_value_t = 10)]
        games: u32,
        #[arg(short = 'n', long, default_value_t = 2_000)]
        steps: u32,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        /// Catalog file; format inferred from --source
        #[arg(long, default_value = "config/cards.yaml")]
        catalog: PathBuf,
        #[arg(long, default_value = "yaml")]
        source: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            games,
            steps,
            seed,
            catalog,
            source,
        } => cmd_run(games, steps, seed, &catalog, &source),
    }
}

fn cmd_run(
    games: u32,
    steps: u32,
    seed: u64,
    catalog_path: &PathBuf,
    source_tag: &str,
) -> anyhow::Result<()> {
    let source = CatalogSource::parse(source_tag)
        .with_context(|| format!("unknown catalog source: {source_tag}"))?;
    let cards = catalog::load_file(catalog_path, source)
        .with_context(|| format!("loading catalog from {}", catalog_path.display()))?;

    println!("=== Kingpin simulator: {games} games × {steps} steps, seed={seed} ===\n");

    let mut total_accepted = 0u64;
    let mut total_rejected = 0u64;
    for g in 0..games {
        let game_seed = seed.wrapping_add(g as u64 * 1000);
        let mut room = Room::new(cards.clone(), source, game_seed);
        let card_count = total_cards(&room);
        let mut rng = ChaCha8Rng::seed_from_u64(game_seed ^ 0x5EED);

        let mut accepted = 0u64;
        let mut rejected = 0u64;
        for step in 0..steps {
            let seat = if rng.gen_bool(0.5) { Seat::P1 } else { Seat::P2 };
            match room.apply(seat, random_action(&mut rng)) {
                Ok(()) => accepted += 1,
                Err(_) => rejected += 1,
            }
            check_invariants(&room, card_count)
                .with_context(|| format!("game {g}, step {step}, seed {game_seed}"))?;
        }
        total_accepted += accepted;
        total_rejected += rejected;
        println!(
            "game {:>3}: accepted {:>5}, rejected {:>5}, bank {:>2}, turn {}",
            g + 1,
            accepted,
            rejected,
            room.state.bank(),
            room.state.turn_number
        );
    }

    println!(
        "\n--- OK: {} accepted, {} rejected, no invariant violations ---",
        total_accepted, total_rejected
    );
    Ok(())
}

fn total_cards(room: &Room) -> usize {
    let st = &room.state;
    st.deck.len()
        + st.shelf.len()
        + st.discard.len()
        + st.sides
            .iter()
            .map(|p| p.hand.len() + p.slots.iter().filter(|s| s.card.is_some()).count())
            .sum::<usize>()
}

fn check_invariants(room: &Room, card_count: usize) -> anyhow::Result<()> {
    let bank = room.state.bank();
    if bank < 0 {
        bail!("bank went negative: {bank}");
    }
    let held: u32 = room
        .state
        .sides
        .iter()
        .map(|p| p.tokens.reserve_money + p.total_shields())
        .sum();
    if held > TOTAL_TOKENS {
        bail!("token supply exceeded: {held} > {TOTAL_TOKENS}");
    }
    for side in &room.state.sides {
        for (i, slot) in side.slots.iter().enumerate() {
            if slot.muscles > MAX_MUSCLES {
                bail!("slot {i} holds {} shields", slot.muscles);
            }
        }
    }
    if total_cards(room) != card_count {
        bail!(
            "card conservation broken: {} != {card_count}",
            total_cards(room)
        );
    }
    Ok(())
}

fn random_action(rng: &mut ChaCha8Rng) -> Action {
    let zone = |rng: &mut ChaCha8Rng| match rng.gen_range(0..4) {
        0 => Zone::Hand,
        1 => Zone::Slot,
        2 => Zone::Shelf,
        _ => Zone::Discard,
    };
    match rng.gen_range(0..17) {
        0 => Action::Draw,
        1 => Action::FlipCard {
            slot_index: rng.gen_range(0..MAX_SLOTS),
        },
        2 | 3 => Action::MoveCard {
            from: zone(rng),
            to: zone(rng),
            from_index: rng.gen_range(0..MAX_SLOTS),
            to_index: Some(rng.gen_range(0..MAX_SLOTS)),
        },
        4 => Action::SetVisibleSlots {
            count: rng.gen_range(0..12),
        },
        5 => Action::AddToken {
            kind: TokenKind::Money,
            count: rng.gen_range(0..4),
        },
        6 => Action::RemoveToken {
            kind: TokenKind::Money,
            count: rng.gen_range(0..4),
        },
        7 => Action::AddShieldFromReserve {
            slot_index: rng.gen_range(0..MAX_SLOTS),
            count: rng.gen_range(0..3),
        },
        8 => Action::RemoveShieldToReserve {
            slot_index: rng.gen_range(0..MAX_SLOTS),
            count: rng.gen_range(0..3),
        },
        9 => Action::AddShieldOnly {
            slot_index: rng.gen_range(0..MAX_SLOTS),
            count: rng.gen_range(0..3),
        },
        10 => Action::RemoveShieldOnly {
            slot_index: rng.gen_range(0..MAX_SLOTS),
            count: rng.gen_range(0..3),
        },
        11 => Action::RemoveOpponentShield {
            slot_index: rng.gen_range(0..MAX_SLOTS),
        },
        12 => Action::EndTurn,
        13 => Action::StartAttack {
            attacker_slots: (0..rng.gen_range(1..4))
                .map(|_| rng.gen_range(0..MAX_SLOTS))
                .collect(),
            target_slot: rng.gen_range(0..MAX_SLOTS),
        },
        14 => Action::AttackUpdatePlan {
            remove_shields: Some(rng.gen_range(0..5)),
            destroy_card: Some(rng.gen_bool(0.5)),
        },
        15 => Action::AttackPropose,
        _ => {
            if rng.gen_bool(0.5) {
                Action::AttackAccept
            } else {
                Action::AttackCancel
            }
        }
    }
}
