// ═══════════════════════════════════════════════════════════════════════
// Synergy — whole-board clan bonus and per-card pair bonus
// ═══════════════════════════════════════════════════════════════════════

use crate::types::Slot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClanSynergy {
    Gangsters,
    Authorities,
    Loners,
}

/// Flat stat bonus, applied at view/advisory time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatBonus {
    pub hp: i32,
    pub d: i32,
    pub rage: i32,
}

impl ClanSynergy {
    pub fn bonus(self) -> StatBonus {
        match self {
            ClanSynergy::Gangsters => StatBonus { hp: 0, d: 1, rage: 1 },
            ClanSynergy::Authorities => StatBonus { hp: 1, d: 1, rage: 0 },
            ClanSynergy::Loners => StatBonus { hp: 1, d: 0, rage: 1 },
        }
    }
}

/// Map a raw clan string onto a synergy family by substring.
pub fn classify_clan(clan: &str) -> Option<ClanSynergy> {
    let c = clan.trim().to_lowercase();
    if c.is_empty() {
        return None;
    }
    if c.contains("gang") {
        Some(ClanSynergy::Gangsters)
    } else if c.contains("author") {
        Some(ClanSynergy::Authorities)
    } else if c.contains("loner") || c.contains("solo") {
        Some(ClanSynergy::Loners)
    } else {
        None
    }
}

/// Whole-board clan synergy: every card with a clan must share one clan,
/// and that clan must map to a known family. Clanless cards do not break
/// the match; an empty board never qualifies.
pub fn detect_clan_synergy(slots: &[Slot]) -> Option<ClanSynergy> {
    let mut clans = slots
        .iter()
        .filter_map(|s| s.card.as_ref())
        .map(|c| c.clan.trim().to_lowercase())
        .filter(|c| !c.is_empty());
    let first = clans.next()?;
    if clans.all(|c| c == first) {
        classify_clan(&first)
    } else {
        None
    }
}

/// Pair synergy for the card in `slots[index]`: active when at least one
/// other board card shares its (non-empty) clan or faction. The bonus is
/// the card's own pair_* stats.
pub fn pair_bonus(slots: &[Slot], index: usize) -> Option<StatBonus> {
    let card = slots.get(index)?.card.as_ref()?;
    let clan = card.clan.trim().to_lowercase();
    let faction = card.faction.trim().to_string();
    let paired = slots.iter().enumerate().any(|(i, s)| {
        if i == index {
            return false;
        }
        let Some(other) = s.card.as_ref() else { return false };
        (!clan.is_empty() && other.clan.trim().to_lowercase() == clan)
            || (!faction.is_empty() && other.faction.trim() == faction)
    });
    if paired {
        Some(StatBonus {
            hp: card.pair_hp,
            d: card.pair_d,
            rage: card.pair_r,
        })
    } else {
        None
    }
}

/// Everything the view exposes about one board's synergies. Both variants
/// are computed independently; stacking is the consumer's call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSynergy {
    pub clan: Option<ClanSynergy>,
    pub clan_bonus: Option<StatBonus>,
    /// One entry per slot; None for empty or unpaired slots.
    pub pair: Vec<Option<StatBonus>>,
}

pub fn board_synergy(slots: &[Slot]) -> BoardSynergy {
    let clan = detect_clan_synergy(slots);
    BoardSynergy {
        clan,
        clan_bonus: clan.map(ClanSynergy::bonus),
        pair: (0..slots.len()).map(|i| pair_bonus(slots, i)).collect(),
    }
}
