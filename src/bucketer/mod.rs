//! K-means bucketer (`spec.md` §2's "Supporting tool", §4.13): high-
//! dimensional k-means with pivot-based triangle-inequality pruning
//! (Elkan's algorithm), multi-threaded via `rayon`.
//!
//! Threading model follows `spec.md` §5: each phase (assign, update,
//! pivot-distances) runs as a `rayon` parallel pass over disjoint slices;
//! `rayon`'s join-before-return is the barrier — no shared writable state
//! survives across a phase boundary.

pub mod elkan;

pub use elkan::{ElkanKMeans, Point};
