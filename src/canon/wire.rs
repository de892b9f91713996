use crate::canon::card::Card;
use crate::error::ParseError;

/// The parsed `<card_str>` field of a `MATCHSTATE` line: one hole-card hand
/// per seat (empty for a hidden opponent hand) plus the board cards dealt
/// so far, in street order. `spec.md` §6.1's grammar:
/// `<hole>(|<hole>)*(/<flop>(/<turn>(/<river>)?)?)?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardString {
    pub holes: Vec<Vec<Card>>,
    pub board: Vec<Card>,
}

pub fn parse_card_string(s: &str) -> Result<CardString, ParseError> {
    let (hole_part, board_part) = match s.split_once('/') {
        Some((h, b)) => (h, Some(b)),
        None => (s, None),
    };

    let mut holes = Vec::new();
    for tok in hole_part.split('|') {
        holes.push(parse_card_run(tok)?);
    }

    let mut board = Vec::new();
    if let Some(b) = board_part {
        for (i, street_tok) in b.split('/').enumerate() {
            let expected = match i {
                0 => 3, // flop
                1 => 1, // turn
                2 => 1, // river
                _ => return Err(ParseError::InvalidCardSyntax(s.to_string())),
            };
            let cards = parse_card_run(street_tok)?;
            if cards.len() != expected {
                return Err(ParseError::InvalidCardSyntax(s.to_string()));
            }
            board.extend(cards);
        }
    }

    check_no_duplicates(&holes, &board, s)?;
    Ok(CardString { holes, board })
}

fn parse_card_run(tok: &str) -> Result<Vec<Card>, ParseError> {
    if tok.is_empty() {
        return Ok(Vec::new());
    }
    let chars: Vec<char> = tok.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(ParseError::InvalidCardSyntax(tok.to_string()));
    }
    chars
        .chunks(2)
        .map(|pair| Card::parse(&pair.iter().collect::<String>()))
        .collect()
}

/// Bitmask-based duplicate check (`Card::to_bits`): cheaper than a
/// `HashSet` and the idiom the deck-union tests elsewhere in this crate
/// already expect for overlap checks.
fn check_no_duplicates(holes: &[Vec<Card>], board: &[Card], whole: &str) -> Result<(), ParseError> {
    let mut seen: u64 = 0;
    for c in holes.iter().flatten().chain(board.iter()) {
        let bit = c.to_bits();
        if seen & bit != 0 {
            return Err(ParseError::DuplicateCard(whole.to_string()));
        }
        seen |= bit;
    }
    Ok(())
}

/// Re-emits a `CardString` byte-for-byte compatible with what the wire
/// would have sent, given cards already in wire order (hole/flop sorted
/// high-to-low is the caller's responsibility upstream in canonicalization,
/// not re-imposed here — this function is a faithful printer, not a
/// canonicalizer).
pub fn print_card_string(cs: &CardString) -> String {
    let holes: Vec<String> = cs
        .holes
        .iter()
        .map(|h| h.iter().map(|c| c.print(4)).collect::<String>())
        .collect();
    let mut out = holes.join("|");

    if !cs.board.is_empty() {
        let flop: String = cs.board[0..3.min(cs.board.len())]
            .iter()
            .map(|c| c.print(4))
            .collect();
        out.push('/');
        out.push_str(&flop);
        if cs.board.len() > 3 {
            out.push('/');
            out.push_str(&cs.board[3].print(4));
        }
        if cs.board.len() > 4 {
            out.push('/');
            out.push_str(&cs.board[4].print(4));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_river_state() {
        let cs = parse_card_string("5d3d|/Qc3c9s/Qd/Js").unwrap();
        assert_eq!(cs.holes[0].len(), 2);
        assert_eq!(cs.holes[1].len(), 0);
        assert_eq!(cs.board.len(), 5);
    }

    #[test]
    fn parses_preflop_only() {
        let cs = parse_card_string("AdAc|KsKh").unwrap();
        assert_eq!(cs.holes.len(), 2);
        assert!(cs.board.is_empty());
    }

    #[test]
    fn parses_hole_then_flop_with_hidden_opponent() {
        let cs = parse_card_string("AdAc|/4s3h2d").unwrap();
        assert_eq!(cs.holes[0].len(), 2);
        assert_eq!(cs.holes[1].len(), 0);
        assert_eq!(cs.board.len(), 3);
    }

    #[test]
    fn roundtrip_print_matches_input() {
        let input = "5d3d|/Qc3c9s/Qd/Js";
        let cs = parse_card_string(input).unwrap();
        assert_eq!(print_card_string(&cs), input);
    }

    #[test]
    fn rejects_duplicate_card() {
        assert!(parse_card_string("AdAc|Ad2h").is_err());
    }
}
