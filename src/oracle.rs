//! Hand-value oracle: the external collaborator that ranks a 7-card
//! showdown set. This crate never implements hand evaluation (`spec.md`
//! §1 Non-goals) — it only defines the contract the rest of the engine
//! calls through, and a couple of lightweight implementations useful for
//! tests and for the duplicate-pair match driver against a toy deck.

use crate::canon::card::Card;

/// A totally-ordered showdown rank. Higher is better. Two evaluators may
/// use incompatible internal scales; only comparisons within one
/// evaluator's output are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandRank(pub u32);

pub trait HandValueOracle: Send + Sync {
    /// `cards.len()` is exactly 7 for full hold'em showdowns (2 hole + 5 board).
    fn rank(&self, cards: &[Card]) -> HandRank;
}

/// A table-backed oracle, reading from `spec.md` §6.4's persisted format:
/// one contiguous array of 32-bit values indexed by a combinatorial rank
/// of the sorted 7-card tuple. Construction fails if the table is absent
/// or the wrong size — `TableMissing`, fatal at construction per
/// `spec.md` §7.
pub struct TableOracle {
    values: Vec<u32>,
    num_cards_in_deck: u32,
}

impl TableOracle {
    pub fn load(path: impl AsRef<std::path::Path>, num_cards_in_deck: u32) -> anyhow::Result<Self> {
        use byteorder::{LittleEndian, ReadBytesExt};
        use std::io::Read;

        let mut file = std::fs::File::open(path.as_ref())
            .map_err(|e| anyhow::anyhow!("hand-value table missing: {e}"))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        let mut cursor = std::io::Cursor::new(buf);
        let mut values = Vec::new();
        while let Ok(v) = cursor.read_u32::<LittleEndian>() {
            values.push(v);
        }
        Ok(TableOracle { values, num_cards_in_deck })
    }

    fn combinatorial_rank(&self, cards: &[Card]) -> usize {
        let mut sorted: Vec<u32> = cards.iter().map(|c| c.0 as u32).collect();
        sorted.sort_unstable();
        let mut rank = 0usize;
        for (i, &c) in sorted.iter().enumerate() {
            rank += binomial(c as u64, (i + 1) as u64) as usize;
        }
        rank
    }
}

impl HandValueOracle for TableOracle {
    fn rank(&self, cards: &[Card]) -> HandRank {
        let idx = self.combinatorial_rank(cards);
        HandRank(*self.values.get(idx).unwrap_or(&0))
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

/// A trivial oracle used by tests and the match driver's self-play
/// sanity checks: ranks purely by the sum of ranks in the 7-card set.
/// Never used for real strategy construction.
pub struct SumRankOracle {
    pub num_suits: u8,
}

impl HandValueOracle for SumRankOracle {
    fn rank(&self, cards: &[Card]) -> HandRank {
        let sum: u32 = cards.iter().map(|c| c.rank(self.num_suits) as u32).sum();
        HandRank(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_rank_oracle_orders_by_rank_sum() {
        let oracle = SumRankOracle { num_suits: 4 };
        let low = vec![Card::new(0, 0, 4); 7];
        let high = vec![Card::new(5, 0, 4); 7];
        assert!(oracle.rank(&high) > oracle.rank(&low));
    }
}
