use std::fmt;

/// A pot-normalized bet ratio, `numerator / denominator` of pot, exactly
/// the `Odds` concept the teacher's `gameplay::odds`/`mccfr::odds` both
/// carry (the same GRID constants appear in both snapshots, confirming
/// this is load-bearing rather than incidental).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Odds(pub i32, pub i32);

impl Odds {
    pub fn ratio(self) -> f64 {
        self.0 as f64 / self.1 as f64
    }

    /// Snap a raw pot ratio to the nearest grid entry (used for translating
    /// a real bet onto the abstraction's discrete sizes when no harmonic
    /// mixing is requested, and for `Game::edgify`-style reconstruction).
    pub fn nearest(grid: &[Odds], ratio: f64) -> Odds {
        grid.iter()
            .copied()
            .min_by(|a, b| {
                (a.ratio() - ratio)
                    .abs()
                    .partial_cmp(&(b.ratio() - ratio).abs())
                    .unwrap()
            })
            .expect("grid non-empty")
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// Full preflop grid: 1/4, 1/3, 1/2, 2/3, 3/4, 1/1, 3/2, 2/1, 3/1, 4/1 pot.
pub const PREF_RAISES: [Odds; 10] = [
    Odds(1, 4),
    Odds(1, 3),
    Odds(1, 2),
    Odds(2, 3),
    Odds(3, 4),
    Odds(1, 1),
    Odds(3, 2),
    Odds(2, 1),
    Odds(3, 1),
    Odds(4, 1),
];

/// Coarser flop grid.
pub const FLOP_RAISES: [Odds; 5] = [
    Odds(1, 2),
    Odds(3, 4),
    Odds(1, 1),
    Odds(3, 2),
    Odds(2, 1),
];

/// Late-street grid (turn/river), coarser still.
pub const LATE_RAISES: [Odds; 2] = [Odds(1, 1), Odds(2, 1)];

/// Deepest subgame-resolve grid: pot-size bet only.
pub const LAST_RAISES: [Odds; 1] = [Odds(1, 1)];

/// Grid in force for a given street, mirroring the teacher's per-street
/// coarsening of the bet-size abstraction.
pub fn grid_for_street(street_index: u8) -> &'static [Odds] {
    match street_index {
        0 => &PREF_RAISES,
        1 => &FLOP_RAISES,
        2 => &LATE_RAISES,
        _ => &LAST_RAISES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_picks_closest_grid_entry() {
        let chosen = Odds::nearest(&PREF_RAISES, 0.26);
        assert_eq!(chosen, Odds(1, 4));
    }

    #[test]
    fn ratio_matches_fraction() {
        assert_eq!(Odds(1, 2).ratio(), 0.5);
    }
}
