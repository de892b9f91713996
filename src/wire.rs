//! ACPC wire protocol (`spec.md` §6.1): `MATCHSTATE` line parsing/emission
//! and the action-string grammar. Card-string grammar lives in
//! `crate::canon::wire` since it produces `Card`s.

use crate::canon::wire::{parse_card_string, print_card_string, CardString};
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireAction {
    Fold,
    Call,
    Bet(u32),
}

pub fn print_action(a: WireAction) -> String {
    match a {
        WireAction::Fold => "f".to_string(),
        WireAction::Call => "c".to_string(),
        WireAction::Bet(to) => format!("r{to}"),
    }
}

/// Parses one street's worth of actions: a run of `c`, `f`, `r<digits>`
/// tokens with no separators between them.
pub fn parse_action_run(s: &str) -> Result<Vec<WireAction>, ParseError> {
    let mut out = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] as char {
            'c' => {
                out.push(WireAction::Call);
                i += 1;
            }
            'f' => {
                out.push(WireAction::Fold);
                i += 1;
            }
            'r' => {
                let start = i + 1;
                let mut j = start;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j == start {
                    return Err(ParseError::Action(s.to_string()));
                }
                let amount: u32 = s[start..j]
                    .parse()
                    .map_err(|_| ParseError::Action(s.to_string()))?;
                out.push(WireAction::Bet(amount));
                i = j;
            }
            _ => return Err(ParseError::Action(s.to_string())),
        }
    }
    Ok(out)
}

/// Splits the full action string on `/` street separators and parses each
/// street's run independently.
pub fn parse_action_string(s: &str) -> Result<Vec<Vec<WireAction>>, ParseError> {
    s.split('/').map(parse_action_run).collect()
}

pub fn print_action_string(streets: &[Vec<WireAction>]) -> String {
    streets
        .iter()
        .map(|street| street.iter().map(|a| print_action(*a)).collect::<String>())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    pub position: usize,
    pub hand_no: u64,
    pub action_str: String,
    pub card_str: String,
}

impl MatchState {
    pub fn actions(&self) -> Result<Vec<Vec<WireAction>>, ParseError> {
        parse_action_string(&self.action_str)
    }

    pub fn cards(&self) -> Result<CardString, ParseError> {
        parse_card_string(&self.card_str)
    }
}

/// `MATCHSTATE:<pos>:<hand_no>:<action_str>:<card_str>` — exactly 5
/// colon-delimited components including the `MATCHSTATE` tag itself, per
/// the slumbot2017 ACPC client's own line parser.
pub fn parse_matchstate(line: &str) -> Result<MatchState, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() != 5 || parts[0] != "MATCHSTATE" {
        return Err(ParseError::MatchState(line.to_string()));
    }
    let position: usize = parts[1]
        .parse()
        .map_err(|_| ParseError::MatchState(line.to_string()))?;
    let hand_no: u64 = parts[2]
        .parse()
        .map_err(|_| ParseError::MatchState(line.to_string()))?;
    Ok(MatchState {
        position,
        hand_no,
        action_str: parts[3].to_string(),
        card_str: parts[4].to_string(),
    })
}

pub fn print_matchstate(m: &MatchState) -> String {
    format!(
        "MATCHSTATE:{}:{}:{}:{}",
        m.position, m.hand_no, m.action_str, m.card_str
    )
}

/// Our own reply line: `MATCHSTATE:...:<action>\r\n`.
pub fn print_reply(m: &MatchState, action: WireAction) -> String {
    format!("{}:{}\r\n", print_matchstate(m), print_action(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_matchstate_line() {
        let line = "MATCHSTATE:0:7139:r200c/r300c/r600c/cr1800r5400r20000:5d3d|/Qc3c9s/Qd/Js";
        let ms = parse_matchstate(line).unwrap();
        assert_eq!(ms.position, 0);
        assert_eq!(ms.hand_no, 7139);
        let streets = ms.actions().unwrap();
        assert_eq!(streets.len(), 4);
        let cs = ms.cards().unwrap();
        assert_eq!(cs.board.len(), 5);
    }

    #[test]
    fn roundtrips_matchstate_byte_for_byte() {
        let line = "MATCHSTATE:1:42:cr200c:AhKh|";
        let ms = parse_matchstate(line).unwrap();
        assert_eq!(print_matchstate(&ms), line);
    }

    #[test]
    fn rejects_wrong_component_count() {
        assert!(parse_matchstate("MATCHSTATE:0:1:c").is_err());
    }

    #[test]
    fn action_run_parses_bet_amount() {
        let actions = parse_action_run("cr200c").unwrap();
        assert_eq!(
            actions,
            vec![WireAction::Call, WireAction::Bet(200), WireAction::Call]
        );
    }

    #[test]
    fn rejects_malformed_bet_token() {
        assert!(parse_action_run("rX").is_err());
    }
}
