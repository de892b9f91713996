//! Bucketing: `(street, canonical-board, hole-card-pair) -> bucket id`
//! (`spec.md` §2, §4.5's "offset" contract). Construction of the bucket
//! tables themselves (k-means over histograms) is an external
//! collaborator's job in principle, but this crate does ship the k-means
//! tool (`crate::bucketer`) used to produce them — see `spec.md`'s
//! "Supporting tool" line.

use crate::canon::street::Street;

/// Per-street bucket table, or "no abstraction" (`Unabstracted`) in which
/// case the caller must index by the raw HCP directly.
pub enum StreetBuckets {
    /// `table[gbd][hcp] = bucket_id`.
    Table(Vec<Vec<u32>>),
    Unabstracted,
}

pub struct Buckets {
    per_street: Vec<StreetBuckets>,
}

impl Buckets {
    pub fn new(per_street: Vec<StreetBuckets>) -> Self {
        Buckets { per_street }
    }

    /// `None` means "no abstraction on this street" — callers fall back to
    /// indexing the strategy store directly by HCP (`spec.md` §4.5's
    /// unbucketed offset formula).
    pub fn bucket(&self, st: Street, gbd: u32, hcp: u64) -> Option<u32> {
        match &self.per_street[st.index() as usize] {
            StreetBuckets::Unabstracted => None,
            StreetBuckets::Table(table) => Some(table[gbd as usize][hcp as usize]),
        }
    }

    pub fn is_abstracted(&self, st: Street) -> bool {
        !matches!(self.per_street[st.index() as usize], StreetBuckets::Unabstracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unabstracted_street_returns_none() {
        let buckets = Buckets::new(vec![StreetBuckets::Unabstracted]);
        assert_eq!(buckets.bucket(Street::Pre, 0, 5), None);
        assert!(!buckets.is_abstracted(Street::Pre));
    }

    #[test]
    fn table_lookup_returns_bucket_id() {
        let buckets = Buckets::new(vec![StreetBuckets::Table(vec![vec![7, 8, 9]])]);
        assert_eq!(buckets.bucket(Street::Pre, 0, 1), Some(8));
    }
}
