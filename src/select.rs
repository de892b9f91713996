//! Action selection (`spec.md` §4.9): merges strategy probabilities with
//! policy overrides in a fixed order, then samples.

use rand::Rng;

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionPolicy {
    pub forced_raise: bool,
    pub purify: bool,
    /// fold-round-up threshold; `None` disables the rule.
    pub theta: Option<f64>,
    /// minimum-probability floor; `None` disables the rule.
    pub mu: Option<f64>,
}

/// Indices of the fold and call successors among `p`, if legal at this node.
#[derive(Debug, Clone, Copy)]
pub struct SpecialSuccs {
    pub fold: Option<usize>,
    pub call: Option<usize>,
}

/// Applies, in this exact order: forced-raise override, purification,
/// fold-round-up, minimum-probability floor. Returns the post-processed
/// distribution (always normalized to sum to 1, unless `p` is empty).
pub fn postprocess(mut p: Vec<f64>, succs: SpecialSuccs, policy: SelectionPolicy) -> Vec<f64> {
    // 1. Forced-raise override.
    if policy.forced_raise {
        let mut zeroed = p.clone();
        if let Some(f) = succs.fold {
            zeroed[f] = 0.0;
        }
        if let Some(c) = succs.call {
            zeroed[c] = 0.0;
        }
        let mass: f64 = zeroed.iter().sum();
        if mass > 0.0 {
            p = zeroed.iter().map(|&v| v / mass).collect();
        }
        // else: fall through, keep raw distribution.
    }

    // 2. Purification.
    if policy.purify {
        let argmax = argmax_lowest_tie(&p);
        p = delta(p.len(), argmax);
    }

    // 3. Fold-round-up.
    if let (Some(theta), Some(fold)) = (policy.theta, succs.fold) {
        if p[fold] >= theta {
            p = delta(p.len(), fold);
        }
    }

    // 4. Minimum-probability floor.
    if let Some(mu) = policy.mu {
        let zeroed_mass: f64 = p.iter().filter(|&&v| v < mu).sum();
        if zeroed_mass <= 0.99 {
            let mut floored: Vec<f64> = p.iter().map(|&v| if v < mu { 0.0 } else { v }).collect();
            let mass: f64 = floored.iter().sum();
            if mass > 0.0 {
                for v in floored.iter_mut() {
                    *v /= mass;
                }
                p = floored;
            }
        }
    }

    p
}

fn argmax_lowest_tie(p: &[f64]) -> usize {
    let mut best = 0;
    for i in 1..p.len() {
        if p[i] > p[best] {
            best = i;
        }
    }
    best
}

fn delta(len: usize, index: usize) -> Vec<f64> {
    let mut v = vec![0.0; len];
    v[index] = 1.0;
    v
}

/// Draws `r` in `[0, 1)`, walks the cumulative sum, picks the first succ
/// whose running sum exceeds `r`. Fatal (`panic`) if `p` is empty — the
/// caller is responsible for never reaching this with zero successors
/// (`spec.md` §4.9: "If num_succs = 0, fatal").
pub fn sample(p: &[f64], rng: &mut impl Rng) -> usize {
    assert!(!p.is_empty(), "cannot sample with zero successors");
    let r: f64 = rng.gen_range(0.0..1.0);
    let mut cum = 0.0;
    for (i, &prob) in p.iter().enumerate() {
        cum += prob;
        if cum > r {
            return i;
        }
    }
    p.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn purification_collapses_to_argmax_lowest_tie() {
        let p = postprocess(
            vec![0.3, 0.3, 0.4],
            SpecialSuccs { fold: None, call: None },
            SelectionPolicy { purify: true, ..Default::default() },
        );
        assert_eq!(p, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn fold_round_up_forces_pure_fold() {
        let p = postprocess(
            vec![0.9, 0.1],
            SpecialSuccs { fold: Some(0), call: Some(1) },
            SelectionPolicy { theta: Some(0.8), ..Default::default() },
        );
        assert_eq!(p, vec![1.0, 0.0]);
    }

    #[test]
    fn minimum_floor_renormalizes_remainder() {
        let p = postprocess(
            vec![0.02, 0.48, 0.50],
            SpecialSuccs { fold: None, call: None },
            SelectionPolicy { mu: Some(0.05), ..Default::default() },
        );
        assert!(p[0] == 0.0);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn forced_raise_zeroes_fold_and_call() {
        let p = postprocess(
            vec![0.2, 0.2, 0.6],
            SpecialSuccs { fold: Some(0), call: Some(1) },
            SelectionPolicy { forced_raise: true, ..Default::default() },
        );
        assert_eq!(p[0], 0.0);
        assert_eq!(p[1], 0.0);
        assert!((p[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn purified_sampling_is_deterministic_across_draws() {
        let p = postprocess(
            vec![0.1, 0.1, 0.8],
            SpecialSuccs { fold: None, call: None },
            SelectionPolicy { purify: true, mu: Some(0.5), ..Default::default() },
        );
        let mut rng = SmallRng::seed_from_u64(1);
        let a = sample(&p, &mut rng);
        let b = sample(&p, &mut rng);
        assert_eq!(a, 2);
        assert_eq!(b, 2);
    }
}
