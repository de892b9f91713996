//! Strategy store (`spec.md` §4.5): read-only access to per-node
//! probabilities for each `(player, node, bucket, succ)`. The CFR training
//! engine that produces these tables is an external collaborator — this
//! module only defines the read contract and two backings for it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    U8,
    U16,
    I32,
    F64,
}

impl ScaleMode {
    pub fn quantize(self, p: f64) -> Vec<u8> {
        match self {
            ScaleMode::U8 => vec![(p.clamp(0.0, 1.0) * u8::MAX as f64).round() as u8],
            ScaleMode::U16 => ((p.clamp(0.0, 1.0) * u16::MAX as f64).round() as u16)
                .to_le_bytes()
                .to_vec(),
            ScaleMode::I32 => ((p.clamp(-1.0, 1.0) * i32::MAX as f64).round() as i32)
                .to_le_bytes()
                .to_vec(),
            ScaleMode::F64 => p.to_le_bytes().to_vec(),
        }
    }

    pub fn dequantize(self, bytes: &[u8]) -> f64 {
        match self {
            ScaleMode::U8 => bytes[0] as f64 / u8::MAX as f64,
            ScaleMode::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64 / u16::MAX as f64,
            ScaleMode::I32 => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
                    / i32::MAX as f64
            }
            ScaleMode::F64 => f64::from_le_bytes(bytes.try_into().unwrap()),
        }
    }
}

/// `(player, street, nonterminal_id)` key into the per-node probability
/// table. `offset` further selects a bucket or hand-card-pair row within
/// that node, per `spec.md` §3.1's formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub player: usize,
    pub street: u8,
    pub nonterminal_id: u32,
}

pub trait StrategyStore: Send + Sync {
    /// Returns a normalized distribution over `num_succs` successors. If
    /// every underlying regret is `<= 0`, returns `1.0` at
    /// `default_succ_index` and `0.0` elsewhere — regret-matching's
    /// conventional default.
    fn probs(
        &self,
        key: NodeKey,
        offset: u64,
        num_succs: usize,
        default_succ_index: usize,
    ) -> Vec<f64>;

    /// Follow-the-leader: `1.0` on the argmax succ, else `0.0`.
    fn ftl_current_prob(&self, key: NodeKey, offset: u64, succ: usize, num_succs: usize) -> f64 {
        let p = self.probs(key, offset, num_succs, 0);
        let argmax = p
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap_or(0);
        if succ == argmax {
            1.0
        } else {
            0.0
        }
    }
}

fn regret_matching(row: &[f64], default_succ_index: usize) -> Vec<f64> {
    let positive_sum: f64 = row.iter().map(|&r| r.max(0.0)).sum();
    if positive_sum <= 0.0 {
        let mut out = vec![0.0; row.len()];
        if default_succ_index < out.len() {
            out[default_succ_index] = 1.0;
        }
        return out;
    }
    row.iter().map(|&r| r.max(0.0) / positive_sum).collect()
}

/// Fully in-memory backing, loaded eagerly. Immutable after construction,
/// so `&InMemoryStore` is safe to share across concurrently-evaluating
/// bots without locking (`spec.md` §5).
pub struct InMemoryStore {
    rows: HashMap<(NodeKey, u64), Vec<f64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore { rows: HashMap::new() }
    }

    pub fn insert(&mut self, key: NodeKey, offset: u64, regrets: Vec<f64>) {
        self.rows.insert((key, offset), regrets);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyStore for InMemoryStore {
    fn probs(
        &self,
        key: NodeKey,
        offset: u64,
        num_succs: usize,
        default_succ_index: usize,
    ) -> Vec<f64> {
        match self.rows.get(&(key, offset)) {
            Some(row) => regret_matching(row, default_succ_index),
            None => {
                let mut out = vec![0.0; num_succs];
                if default_succ_index < out.len() {
                    out[default_succ_index] = 1.0;
                }
                out
            }
        }
    }
}

/// File-backed store with per-`(street, nonterminal_id)` lazy reads, one
/// file per node under `root/{street}/{nonterminal_id}.bin`, quantized per
/// `ScaleMode`. Reads are cached behind a `RwLock` so concurrent readers
/// never block each other after first touch.
pub struct FileBackedStore {
    root: PathBuf,
    scale: ScaleMode,
    cache: RwLock<HashMap<NodeKey, Vec<f64>>>,
}

impl FileBackedStore {
    pub fn open(root: impl AsRef<Path>, scale: ScaleMode) -> Self {
        FileBackedStore {
            root: root.as_ref().to_path_buf(),
            scale,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn load_node(&self, key: NodeKey) -> anyhow::Result<Vec<f64>> {
        let path = self
            .root
            .join(key.street.to_string())
            .join(format!("{}.bin", key.nonterminal_id));
        let bytes = std::fs::read(&path)
            .map_err(|e| anyhow::anyhow!("strategy table missing at {path:?}: {e}"))?;
        let width = match self.scale {
            ScaleMode::U8 => 1,
            ScaleMode::U16 => 2,
            ScaleMode::I32 => 4,
            ScaleMode::F64 => 8,
        };
        Ok(bytes
            .chunks(width)
            .map(|chunk| self.scale.dequantize(chunk))
            .collect())
    }

    fn row(&self, key: NodeKey, offset: u64, num_succs: usize) -> Vec<f64> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(full) = cache.get(&key) {
                return slice_row(full, offset, num_succs);
            }
        }
        let full = self.load_node(key).unwrap_or_default();
        let row = slice_row(&full, offset, num_succs);
        self.cache.write().unwrap().insert(key, full);
        row
    }
}

fn slice_row(full: &[f64], offset: u64, num_succs: usize) -> Vec<f64> {
    let start = offset as usize * num_succs;
    full.get(start..start + num_succs).map(|s| s.to_vec()).unwrap_or_default()
}

impl StrategyStore for FileBackedStore {
    fn probs(
        &self,
        key: NodeKey,
        offset: u64,
        num_succs: usize,
        default_succ_index: usize,
    ) -> Vec<f64> {
        let row = self.row(key, offset, num_succs);
        if row.is_empty() {
            let mut out = vec![0.0; num_succs];
            if default_succ_index < out.len() {
                out[default_succ_index] = 1.0;
            }
            return out;
        }
        regret_matching(&row, default_succ_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regret_matching_defaults_when_all_nonpositive() {
        let probs = regret_matching(&[-1.0, -2.0, 0.0], 2);
        assert_eq!(probs, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn regret_matching_normalizes_positive_regrets() {
        let probs = regret_matching(&[1.0, 3.0], 0);
        assert!((probs[0] - 0.25).abs() < 1e-9);
        assert!((probs[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn in_memory_store_sums_to_one() {
        let mut store = InMemoryStore::new();
        let key = NodeKey { player: 0, street: 0, nonterminal_id: 0 };
        store.insert(key, 7, vec![2.0, 2.0, 0.0]);
        let p = store.probs(key, 7, 3, 0);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scale_mode_u8_roundtrips_approximately() {
        let bytes = ScaleMode::U8.quantize(0.5);
        let back = ScaleMode::U8.dequantize(&bytes);
        assert!((back - 0.5).abs() < 0.01);
    }
}
