//! Board tree: eager enumeration of canonical boards per street, with
//! predecessor/successor and local<->global index conversion
//! (`spec.md` §4.3).

use crate::canon::card::Card;
use crate::canon::canonical::canonicalize;
use crate::canon::street::Street;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StreetBoards {
    /// Canonical cards for each global board index on this street.
    boards: Vec<Vec<Card>>,
    /// canonical-cards key -> global board index.
    lookup: HashMap<Vec<u8>, u32>,
    /// Number of raw (non-canonical) boards that map to each global index.
    counts: Vec<u64>,
    /// Parent global index on the previous street, per board.
    parent: Vec<Option<u32>>,
}

/// Precomputed, shared-immutable once built. Construction enumerates every
/// raw board by extending the previous street's raw boards one card at a
/// time and canonicalizing, so cost grows combinatorially with deck size —
/// acceptable for the configs this crate targets (<= standard 52-card deck).
pub struct BoardTree {
    num_suits: u8,
    streets: Vec<StreetBoards>,
}

impl BoardTree {
    pub fn build(deck: &[Card], num_suits: u8, cards_per_street: &[u8]) -> Self {
        let mut streets = Vec::new();
        // Pre: single empty board.
        let mut raw_boards: Vec<(Vec<Card>, Option<u32>)> = vec![(Vec::new(), None)];
        let mut prev = canonicalize_street(&raw_boards, num_suits);
        streets.push(prev_to_dense(prev, &raw_boards));

        for &n_new in cards_per_street.iter().skip(1) {
            let prev_raws = raw_boards.clone();
            raw_boards = Vec::new();
            for (i, (board, _)) in prev_raws.iter().enumerate() {
                let used: std::collections::HashSet<u8> = board.iter().map(|c| c.0).collect();
                for combo in k_combinations(deck, &used, n_new as usize) {
                    let mut next = board.clone();
                    next.extend(combo);
                    raw_boards.push((next, Some(i as u32)));
                }
            }
            prev = canonicalize_street(&raw_boards, num_suits);
            streets.push(prev_to_dense(prev, &raw_boards));
        }

        BoardTree { num_suits, streets }
    }

    pub fn num_boards(&self, st: Street) -> u32 {
        self.streets[st.index() as usize].boards.len() as u32
    }

    pub fn board(&self, st: Street, gbd: u32) -> &[Card] {
        &self.streets[st.index() as usize].boards[gbd as usize]
    }

    pub fn board_count(&self, st: Street, gbd: u32) -> u64 {
        self.streets[st.index() as usize].counts[gbd as usize]
    }

    pub fn lookup_board(&self, st: Street, canon_cards: &[Card]) -> Option<u32> {
        let key: Vec<u8> = canon_cards.iter().map(|c| c.0).collect();
        self.streets[st.index() as usize].lookup.get(&key).copied()
    }

    /// Which suit groups remain interchangeable at this board under the
    /// symmetry the canonicalization already fixed — suits that appear on
    /// the board are pinned; unseen suits remain mutually interchangeable.
    pub fn suit_groups(&self, st: Street, gbd: u32) -> Vec<Vec<u8>> {
        let board = self.board(st, gbd);
        let seen: std::collections::HashSet<u8> =
            board.iter().map(|c| c.suit(self.num_suits)).collect();
        let unseen: Vec<u8> = (0..self.num_suits).filter(|s| !seen.contains(s)).collect();
        let mut groups: Vec<Vec<u8>> = seen.iter().map(|&s| vec![s]).collect();
        if !unseen.is_empty() {
            groups.push(unseen);
        }
        groups
    }

    /// Number of target-street boards that descend from `(root_st, root_gbd)`.
    pub fn num_local_boards(&self, root_st: Street, root_gbd: u32, target_st: Street) -> u32 {
        self.local_indices(root_st, root_gbd, target_st).len() as u32
    }

    pub fn global_index(&self, root_st: Street, root_gbd: u32, target_st: Street, lbd: u32) -> u32 {
        self.local_indices(root_st, root_gbd, target_st)[lbd as usize]
    }

    pub fn local_index(&self, root_st: Street, root_gbd: u32, target_st: Street, gbd: u32) -> u32 {
        self.local_indices(root_st, root_gbd, target_st)
            .iter()
            .position(|&g| g == gbd)
            .expect("gbd must descend from root") as u32
    }

    fn local_indices(&self, root_st: Street, root_gbd: u32, target_st: Street) -> Vec<u32> {
        let mut frontier = vec![root_gbd];
        let mut st = root_st.index();
        while st < target_st.index() {
            let next_level = &self.streets[(st + 1) as usize];
            let mut next_frontier = Vec::new();
            for (idx, parent) in next_level.parent.iter().enumerate() {
                if let Some(p) = parent {
                    if frontier.contains(p) {
                        next_frontier.push(idx as u32);
                    }
                }
            }
            frontier = next_frontier;
            st += 1;
        }
        frontier
    }
}

fn canonicalize_street(
    raw_boards: &[(Vec<Card>, Option<u32>)],
    num_suits: u8,
) -> Vec<(Vec<Card>, Option<u32>)> {
    raw_boards
        .iter()
        .map(|(board, parent)| {
            let c = canonicalize(board, &[], num_suits);
            (c.board, *parent)
        })
        .collect()
}

fn prev_to_dense(
    canon_raws: Vec<(Vec<Card>, Option<u32>)>,
    _orig: &[(Vec<Card>, Option<u32>)],
) -> StreetBoards {
    let mut boards = Vec::new();
    let mut lookup = HashMap::new();
    let mut counts = Vec::new();
    let mut parent_of_raw = Vec::new();

    for (board, parent) in canon_raws {
        let key: Vec<u8> = board.iter().map(|c| c.0).collect();
        let gbd = *lookup.entry(key).or_insert_with(|| {
            boards.push(board.clone());
            counts.push(0u64);
            parent_of_raw.push(parent);
            (boards.len() - 1) as u32
        });
        counts[gbd as usize] += 1;
    }

    StreetBoards {
        boards,
        lookup,
        counts,
        parent: parent_of_raw,
    }
}

fn k_combinations(deck: &[Card], used: &std::collections::HashSet<u8>, k: usize) -> Vec<Vec<Card>> {
    let available: Vec<Card> = deck.iter().copied().filter(|c| !used.contains(&c.0)).collect();
    let mut out = Vec::new();
    combo_rec(&available, k, 0, &mut Vec::new(), &mut out);
    out
}

fn combo_rec(avail: &[Card], k: usize, start: usize, cur: &mut Vec<Card>, out: &mut Vec<Vec<Card>>) {
    if cur.len() == k {
        out.push(cur.clone());
        return;
    }
    for i in start..avail.len() {
        cur.push(avail[i]);
        combo_rec(avail, k, i + 1, cur, out);
        cur.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::card::Card;

    fn small_deck() -> Vec<Card> {
        // A 2-suit, 4-rank toy deck to keep enumeration tiny in tests.
        let mut deck = Vec::new();
        for rank in 0..4u8 {
            for suit in 0..2u8 {
                deck.push(Card::new(rank, suit, 2));
            }
        }
        deck
    }

    #[test]
    fn preflop_has_single_canonical_board() {
        let tree = BoardTree::build(&small_deck(), 2, &[0, 2]);
        assert_eq!(tree.num_boards(Street::Pre), 1);
    }

    #[test]
    fn board_counts_sum_to_total_raw_boards() {
        let deck = small_deck();
        let tree = BoardTree::build(&deck, 2, &[0, 2]);
        let total: u64 = (0..tree.num_boards(Street::Flop))
            .map(|g| tree.board_count(Street::Flop, g))
            .sum();
        // C(8,2) raw 2-card boards
        assert_eq!(total, 28);
    }

    #[test]
    fn lookup_roundtrips_canonical_board() {
        let deck = small_deck();
        let tree = BoardTree::build(&deck, 2, &[0, 2]);
        for g in 0..tree.num_boards(Street::Flop) {
            let cards = tree.board(Street::Flop, g).to_vec();
            assert_eq!(tree.lookup_board(Street::Flop, &cards), Some(g));
        }
    }
}
