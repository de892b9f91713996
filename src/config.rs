use crate::error::{EngineError, ParseError};
use serde::Deserialize;
use std::path::Path;

/// Immutable, process-wide game description. Read once at startup, never
/// mutated; every component holds a `&GameConfig` or a cheap `Clone`.
///
/// Field names mirror the parameter-file keys this is distilled from
/// (`GameName`, `MaxStreet`, ...), kept in `snake_case` per Rust convention
/// and mapped with `serde(rename)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    #[serde(rename = "GameName")]
    pub game_name: String,
    #[serde(rename = "MaxStreet")]
    pub max_street: u8,
    #[serde(rename = "NumPlayers")]
    pub num_players: usize,
    #[serde(rename = "NumRanks")]
    pub num_ranks: u8,
    #[serde(rename = "NumSuits")]
    pub num_suits: u8,
    #[serde(rename = "NumHoleCards")]
    pub num_hole_cards: u8,
    #[serde(rename = "NumFlopCards")]
    pub num_flop_cards: u8,
    #[serde(rename = "FirstToAct")]
    pub first_to_act: Vec<usize>,
    #[serde(rename = "SmallBlind")]
    pub small_blind: u32,
    #[serde(rename = "BigBlind")]
    pub big_blind: u32,
    #[serde(rename = "Ante")]
    #[serde(default)]
    pub ante: u32,
    #[serde(rename = "Stack")]
    pub stack: u32,
    /// Street at/after which the bot resolves a fresh endgame strategy
    /// rather than sampling the base strategy store directly (`spec.md`
    /// §4.8). Absent from real ACPC `game.params` files, so it defaults to
    /// the river, matching the conservative choice that resolving never
    /// runs without a fully-dealt board for the hand-value oracle.
    #[serde(rename = "EndgameStreet", default = "default_endgame_street")]
    pub endgame_street: u8,
}

fn default_endgame_street() -> u8 {
    3 // river
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, EngineError> {
        toml::from_str(text)
            .map_err(|e| EngineError::Parse(ParseError::Config(e.to_string())))
    }

    pub fn num_cards_in_deck(&self) -> u32 {
        self.num_ranks as u32 * self.num_suits as u32
    }

    /// Cards dealt on street `st` (0 = preflop deal, 1 = flop, 2 = turn, 3 = river).
    pub fn num_board_cards(&self, st: u8) -> u8 {
        match st {
            0 => 0,
            1 => self.num_flop_cards,
            _ => 1,
        }
    }

    pub fn num_hole_card_pairs(&self, st: u8) -> u64 {
        let board_cards: u64 = (1..=st).map(|s| self.num_board_cards(s) as u64).sum();
        let remaining = self.num_cards_in_deck() as u64 - board_cards;
        let k = self.num_hole_cards as u64;
        binomial(remaining, k)
    }

    pub fn num_card_permutations(&self) -> u64 {
        let n = self.num_cards_in_deck() as u64;
        (1..=n).product()
    }
}

fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut num = 1u64;
    let mut den = 1u64;
    for i in 0..k {
        num *= n - i;
        den *= i + 1;
    }
    num / den
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> &'static str {
        r#"
        GameName = "holdem"
        MaxStreet = 3
        NumPlayers = 2
        NumRanks = 13
        NumSuits = 4
        NumHoleCards = 2
        NumFlopCards = 3
        FirstToAct = [1, 0, 0, 0]
        SmallBlind = 50
        BigBlind = 100
        Stack = 20000
        "#
    }

    #[test]
    fn parses_minimal_config() {
        let cfg = GameConfig::parse(sample()).unwrap();
        assert_eq!(cfg.num_cards_in_deck(), 52);
        assert_eq!(cfg.ante, 0);
        assert_eq!(cfg.endgame_street, 3);
    }

    #[test]
    fn rejects_unknown_keys() {
        let bad = format!("{}\nBogusKey = 1\n", sample());
        assert!(GameConfig::parse(&bad).is_err());
    }

    #[test]
    fn derives_preflop_hole_pair_count() {
        let cfg = GameConfig::parse(sample()).unwrap();
        assert_eq!(cfg.num_hole_card_pairs(0), 1326);
    }
}
