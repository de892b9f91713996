use crate::canon::card::Card;

/// The result of canonicalizing a (board, hole) pair: the canonical cards
/// for each, sorted high-to-low within their own block, plus the suit
/// permutation `sigma` (old suit index -> new suit index) that produced
/// them, so callers can canonicalize opponent hole cards consistently
/// (`spec.md` §4.2 guarantee (c)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalized {
    pub board: Vec<Card>,
    pub hole: Vec<Card>,
    pub sigma: Vec<u8>,
}

/// Computes the suit-permutation minimizing the concatenated (board, hole)
/// tuple under a street-wise lexicographic order, then applies it.
///
/// Cards are sorted high-to-low within each street's block before
/// comparison. Ties in rank within a block are left in their original
/// relative order (a stable sort) rather than broken by suit: the source
/// this is distilled from does not enforce a suit tiebreak on rank ties,
/// and `spec.md`'s open questions call for preserving that rather than
/// inventing one.
pub fn canonicalize(board: &[Card], hole: &[Card], num_suits: u8) -> Canonicalized {
    let mut best: Option<(Vec<Card>, Vec<Card>, Vec<u8>)> = None;

    for sigma in permutations(num_suits) {
        let mut b: Vec<Card> = board.iter().map(|c| c.permute_suit(&sigma, num_suits)).collect();
        let mut h: Vec<Card> = hole.iter().map(|c| c.permute_suit(&sigma, num_suits)).collect();
        sort_high_to_low(&mut b, num_suits);
        sort_high_to_low(&mut h, num_suits);

        let key: Vec<u8> = b.iter().chain(h.iter()).map(|c| c.0).collect();
        let better = match &best {
            None => true,
            Some((bb, bh, _)) => {
                let cur_key: Vec<u8> = bb.iter().chain(bh.iter()).map(|c| c.0).collect();
                key < cur_key
            }
        };
        if better {
            best = Some((b, h, sigma));
        }
    }

    let (board, hole, sigma) = best.expect("num_suits > 0");
    Canonicalized { board, hole, sigma }
}

fn sort_high_to_low(cards: &mut [Card], num_suits: u8) {
    cards.sort_by(|a, b| b.rank(num_suits).cmp(&a.rank(num_suits)));
}

/// All permutations of `0..n` as `sigma[old] = new`, via Heap's algorithm.
fn permutations(n: u8) -> Vec<Vec<u8>> {
    let mut v: Vec<u8> = (0..n).collect();
    let mut out = Vec::new();
    let mut c = vec![0usize; n as usize];
    out.push(v.clone());
    let mut i = 0usize;
    while i < n as usize {
        if c[i] < i {
            if i % 2 == 0 {
                v.swap(0, i);
            } else {
                v.swap(c[i], i);
            }
            out.push(v.clone());
            c[i] += 1;
            i = 0;
        } else {
            c[i] = 0;
            i += 1;
        }
    }
    out
}

/// Dense index over canonical hole-card pairs compatible with a given
/// canonical board (`spec.md` §4.2 HCP). `board` must already be canonical
/// cards (as `u8` deck indices); `hi > lo`.
pub fn hcp_pair(hi: Card, lo: Card, board: &[Card]) -> u64 {
    let below = |c: Card| board.iter().filter(|b| b.0 < c.0).count() as u64;
    let hi_idx = hi.0 as u64 - below(hi);
    let lo_idx = lo.0 as u64 - below(lo);
    (hi_idx - 1) * hi_idx / 2 + lo_idx
}

/// Single-card HCP, used for heads-up-vs-board indexing in resolved
/// (unbucketed) strategy lookups.
pub fn hcp_single(c: Card, board: &[Card]) -> u64 {
    let below = board.iter().filter(|b| b.0 < c.0).count() as u64;
    c.0 as u64 - below
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_sorts_high_to_low_within_block() {
        let board = [Card::parse("2c").unwrap(), Card::parse("Th").unwrap()];
        let hole = [Card::parse("3d").unwrap(), Card::parse("7s").unwrap()];
        let c = canonicalize(&board, &hole, 4);
        assert!(c.board[0].rank(4) >= c.board[1].rank(4));
        assert!(c.hole[0].rank(4) >= c.hole[1].rank(4));
    }

    #[test]
    fn suit_permutation_invariance() {
        // Any pure re-suiting of an identical hand must canonicalize identically.
        let board_a = [Card::new(10, 0, 4), Card::new(5, 1, 4)];
        let hole_a = [Card::new(12, 0, 4), Card::new(3, 2, 4)];
        // swap suits 0 and 1
        let board_b = [Card::new(10, 1, 4), Card::new(5, 0, 4)];
        let hole_b = [Card::new(12, 1, 4), Card::new(3, 2, 4)];

        let ca = canonicalize(&board_a, &hole_a, 4);
        let cb = canonicalize(&board_b, &hole_b, 4);
        assert_eq!(ca.board, cb.board);
        assert_eq!(ca.hole, cb.hole);
    }

    #[test]
    fn hcp_pair_is_dense_over_non_board_cards() {
        // board occupies ranks 0 and 1 (suit 0): cards 0 and 4 if num_suits=4
        let board = [Card::new(0, 0, 4), Card::new(1, 0, 4)];
        // smallest remaining two cards after removing board cards
        let lo = Card::new(0, 1, 4); // rank 0 suit 1 -> index 1
        let hi = Card::new(0, 2, 4); // rank 0 suit 2 -> index 2
        let idx = hcp_pair(hi, lo, &board);
        assert_eq!(idx, 0);
    }
}
