// ═══════════════════════════════════════════════════════════════════════
// Catalog loader — card definitions from YAML or CSV
// ═══════════════════════════════════════════════════════════════════════

use crate::error::CatalogError;
use crate::types::{Card, CardType};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Yaml,
    Csv,
}

impl CatalogSource {
    pub fn parse(tag: &str) -> Option<CatalogSource> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(CatalogSource::Yaml),
            "csv" => Some(CatalogSource::Csv),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogSource::Yaml => "yaml",
            CatalogSource::Csv => "csv",
        }
    }
}

// ── YAML ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct YamlCatalog {
    #[serde(default)]
    cards: Vec<YamlCard>,
}

#[derive(Debug, Deserialize)]
struct YamlCard {
    id: String,
    name: String,
    #[serde(default, rename = "type")]
    card_type: Option<String>,
    #[serde(default)]
    faction: String,
    #[serde(default)]
    clan: String,
    #[serde(default)]
    hp: i32,
    #[serde(default)]
    atk: i32,
    #[serde(default)]
    d: i32,
    #[serde(default)]
    price: i32,
    #[serde(default)]
    corruption: i32,
    #[serde(default)]
    rage: i32,
    #[serde(default)]
    pair_hp: i32,
    #[serde(default)]
    pair_d: i32,
    #[serde(default)]
    pair_r: i32,
    #[serde(default)]
    notes: String,
    #[serde(default = "default_true")]
    in_deck: bool,
}

fn default_true() -> bool {
    true
}

impl From<YamlCard> for Card {
    fn from(c: YamlCard) -> Card {
        Card {
            id: c.id,
            name: c.name,
            card_type: c.card_type.as_deref().map(CardType::parse).unwrap_or_default(),
            faction: c.faction,
            clan: c.clan,
            hp: c.hp,
            atk: c.atk,
            d: c.d,
            price: c.price,
            corruption: c.corruption,
            rage: c.rage,
            pair_hp: c.pair_hp,
            pair_d: c.pair_d,
            pair_r: c.pair_r,
            notes: c.notes,
        }
    }
}

/// Parse a YAML catalog document. Entries flagged `in_deck: false` are
/// skipped entirely.
pub fn parse_yaml(text: &str) -> Result<Vec<Card>, CatalogError> {
    let doc: YamlCatalog = serde_yaml::from_str(text)?;
    let cards: Vec<Card> = doc
        .cards
        .into_iter()
        .filter(|c| c.in_deck)
        .map(Card::from)
        .collect();
    if cards.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(cards)
}

// ── CSV ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvCard {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type", default)]
    card_type: Option<String>,
    #[serde(rename = "Faction", default)]
    faction: Option<String>,
    #[serde(rename = "Clan", default)]
    clan: Option<String>,
    #[serde(rename = "HP", default)]
    hp: Option<i32>,
    #[serde(rename = "ATK", default)]
    atk: Option<i32>,
    #[serde(rename = "Defend", default)]
    d: Option<i32>,
    #[serde(rename = "Price", default)]
    price: Option<i32>,
    #[serde(rename = "Corruption", default)]
    corruption: Option<i32>,
    #[serde(rename = "Rage", default)]
    rage: Option<i32>,
    #[serde(rename = "Description", default)]
    notes: Option<String>,
    #[serde(rename = "InDeck", default)]
    in_deck: Option<String>,
    #[serde(rename = "PairHP", default)]
    pair_hp: Option<i32>,
    #[serde(rename = "PairD", default)]
    pair_d: Option<i32>,
    #[serde(rename = "PairR", default)]
    pair_r: Option<i32>,
}

impl CsvCard {
    /// Blank InDeck means included; only an explicit 0/false/no excludes.
    fn in_deck(&self) -> bool {
        match self.in_deck.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"),
        }
    }
}

impl From<CsvCard> for Card {
    fn from(c: CsvCard) -> Card {
        Card {
            id: c.id,
            name: c.name,
            card_type: c.card_type.as_deref().map(CardType::parse).unwrap_or_default(),
            faction: c.faction.unwrap_or_default(),
            clan: c.clan.unwrap_or_default(),
            hp: c.hp.unwrap_or(0),
            atk: c.atk.unwrap_or(0),
            d: c.d.unwrap_or(0),
            price: c.price.unwrap_or(0),
            corruption: c.corruption.unwrap_or(0),
            rage: c.rage.unwrap_or(0),
            pair_hp: c.pair_hp.unwrap_or(0),
            pair_d: c.pair_d.unwrap_or(0),
            pair_r: c.pair_r.unwrap_or(0),
            notes: c.notes.unwrap_or_default(),
        }
    }
}

/// Parse a CSV catalog with the standard header row.
pub fn parse_csv(text: &str) -> Result<Vec<Card>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut cards = Vec::new();
    for record in reader.deserialize::<CsvCard>() {
        let record = record?;
        if record.in_deck() {
            cards.push(Card::from(record));
        }
    }
    if cards.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(cards)
}

// ── Files ──────────────────────────────────────────────────────────────

pub fn load_file(path: &Path, source: CatalogSource) -> Result<Vec<Card>, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    match source {
        CatalogSource::Yaml => parse_yaml(&text),
        CatalogSource::Csv => parse_csv(&text),
    }
}

// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
cards:
  - id: g1
    name: Enforcer
    type: common
    faction: gangsters
    clan: gangsters
    hp: 3
    atk: 2
    price: 3
  - id: b1
    name: The Don
    type: boss
    clan: gangsters
    hp: 6
    atk: 4
  - id: x1
    name: Cut Content
    in_deck: false
"#;

    const CSV: &str = "\
ID,Name,Type,Faction,Clan,HP,ATK,Defend,Price,Corruption,Rage,Description,InDeck,PairHP,PairD,PairR
g1,Enforcer,common,gangsters,gangsters,3,2,1,3,0,1,Muscle for hire,,1,0,1
b1,The Don,boss,gangsters,gangsters,6,4,2,0,2,1,,1,0,0,0
x1,Cut Content,common,,,1,1,0,0,0,0,,0,0,0,0
";

    #[test]
    fn yaml_catalog_skips_excluded_cards() {
        let cards = parse_yaml(YAML).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, "g1");
        assert_eq!(cards[0].hp, 3);
        assert_eq!(cards[1].card_type, CardType::Boss);
        // omitted numeric fields default to zero
        assert_eq!(cards[0].rage, 0);
        assert_eq!(cards[1].d, 0);
    }

    #[test]
    fn csv_catalog_parses_header_row() {
        let cards = parse_csv(CSV).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].name, "Enforcer");
        assert_eq!(cards[0].d, 1);
        assert_eq!(cards[0].pair_hp, 1);
        assert_eq!(cards[0].notes, "Muscle for hire");
        assert_eq!(cards[1].card_type, CardType::Boss);
    }

    #[test]
    fn csv_blank_in_deck_means_included() {
        let cards = parse_csv(CSV).unwrap();
        assert!(cards.iter().any(|c| c.id == "g1"));
        assert!(cards.iter().all(|c| c.id != "x1"));
    }

    #[test]
    fn empty_catalog_is_an_error() {
        assert!(matches!(parse_yaml("cards: []"), Err(CatalogError::Empty)));
    }

    #[test]
    fn source_tags_parse() {
        assert_eq!(CatalogSource::parse("YAML"), Some(CatalogSource::Yaml));
        assert_eq!(CatalogSource::parse("yml"), Some(CatalogSource::Yaml));
        assert_eq!(CatalogSource::parse("csv"), Some(CatalogSource::Csv));
        assert_eq!(CatalogSource::parse("toml"), None);
    }
}
