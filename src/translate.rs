//! Translation: maps a real opponent bet size onto the nearest
//! abstraction bet sizes (`spec.md` §4.6). The pseudo-harmonic mapping
//! formula here is ported directly from `translate_action::translate_action`
//! /`calc_pseudo_harmonic_mapping`, generalized to take real successor
//! bet-tos instead of two hardcoded constants.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    Nearest,
    Randomized,
    AlwaysLarger,
}

impl Default for TranslationMode {
    fn default() -> Self {
        TranslationMode::Randomized
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TranslatedAction {
    Fold,
    Call,
    /// Index of the chosen bet successor among the node's bet successors.
    Bet(usize),
}

/// `f_{A,B}(x) = (B - x)(1 + A) / ((B - A)(1 + x))`, all ratios relative to
/// a pot of 1. Returns the probability of choosing the *smaller* bet.
///
/// This is the exact formula validated against "Table 1" of the
/// pseudo-harmonic mapping paper in the unit tests below.
pub fn pseudo_harmonic_below_prob(below_frac: f64, above_frac: f64, actual_frac: f64) -> f64 {
    let numerator = (above_frac - actual_frac) * (1.0 + below_frac);
    let denominator = (above_frac - below_frac) * (1.0 + actual_frac);
    numerator / denominator
}

/// One bet successor available at the current decision node, as seen by
/// the translator: its within-abstraction bet-to amount and an opaque
/// index the caller uses to identify it afterward.
#[derive(Debug, Clone, Copy)]
pub struct BetSucc {
    pub index: usize,
    pub bet_to: u32,
}

/// Translate opponent's bet-to amount `x` onto the node's bet successors.
///
/// `last_bet_to` is the bet-to in force before this action; `d = 2 *
/// last_bet_to` is the current pot, matching `spec.md` §4.6 exactly.
/// `call_succ`/`fold_succ` indices stand in for the check/call and fold
/// successors so the "below is check/call" special case can be detected.
///
/// `smallest_bet_raise_prob` is our own current strategy's cumulative
/// probability of raising at the smallest-bet successor (the caller looks
/// this up in the strategy store before calling); it drives the
/// translate-bet-to-call special case below, per `spec.md` §4.6.
pub fn translate_bet(
    x: u32,
    last_bet_to: u32,
    bet_succs: &[BetSucc],
    call_succ_bet_to: u32,
    smallest_bet_raise_prob: f64,
    mode: TranslationMode,
    rng: &mut impl Rng,
) -> TranslatedAction {
    let d = (2 * last_bet_to).max(1) as f64;

    // below: greatest bet-to <= x, or call if no smaller bet exists.
    let below_bet_to = bet_succs
        .iter()
        .filter(|b| b.bet_to <= x)
        .max_by_key(|b| b.bet_to)
        .map(|b| b.bet_to)
        .unwrap_or(call_succ_bet_to);
    let below_is_call = below_bet_to == call_succ_bet_to
        && !bet_succs.iter().any(|b| b.bet_to == below_bet_to);

    // above: least bet-to >= x.
    let above = bet_succs.iter().filter(|b| b.bet_to >= x).min_by_key(|b| b.bet_to);

    let Some(above) = above else {
        // No successor above X: translate-bet-to-call territory, or an
        // unreachable state if below doesn't exist either (caller handles
        // that by supplying a synthetic call successor as the floor).
        return TranslatedAction::Call;
    };

    let actual_frac = (x as f64 - last_bet_to as f64) / d;
    let below_frac = (below_bet_to as f64 - last_bet_to as f64) / d;
    let above_frac = (above.bet_to as f64 - last_bet_to as f64) / d;

    if below_is_call {
        // translate-bet-to-call: the opponent's bet is small enough that
        // it could plausibly be "no bet at all". We never fold here, but
        // we still give our own smallest-bet successor a chance to fire:
        // if our strategy's cumulative raise probability there is at
        // least as large as a random draw, rewrite onto that successor
        // instead of flatly calling.
        let smallest = bet_succs.iter().min_by_key(|b| b.bet_to);
        return match smallest {
            Some(s) if rng.gen_range(0.0..1.0) <= smallest_bet_raise_prob => {
                TranslatedAction::Bet(s.index)
            }
            _ => TranslatedAction::Call,
        };
    }

    if (above_frac - below_frac).abs() < f64::EPSILON {
        return TranslatedAction::Bet(above.index);
    }

    let below_prob = pseudo_harmonic_below_prob(below_frac, above_frac, actual_frac);

    let pick_below = match mode {
        TranslationMode::AlwaysLarger => false,
        TranslationMode::Nearest => below_prob >= 0.5,
        TranslationMode::Randomized => rng.gen_range(0.0..1.0) < below_prob,
    };

    if pick_below {
        let below_index = bet_succs
            .iter()
            .find(|b| b.bet_to == below_bet_to)
            .map(|b| b.index);
        match below_index {
            Some(i) => TranslatedAction::Bet(i),
            None => TranslatedAction::Call,
        }
    } else {
        TranslatedAction::Bet(above.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn replicate_paper_table_1_results() {
        let b = 1.0;
        let x = 0.25;
        assert_eq!(pseudo_harmonic_below_prob(0.0, b, x), 0.6);
        let precision = 0.001;
        assert!((pseudo_harmonic_below_prob(0.001, b, x) - 0.601).abs() < precision);
        assert!((pseudo_harmonic_below_prob(0.010, b, x) - 0.612).abs() < precision);
        assert!((pseudo_harmonic_below_prob(0.050, b, x) - 0.663).abs() < precision);
        assert!((pseudo_harmonic_below_prob(0.100, b, x) - 0.733).abs() < precision);
    }

    #[test]
    fn below_prob_is_a_probability_within_bracket() {
        // property #4 from spec.md §8: 0 <= below_prob <= 1 whenever
        // below_to <= X <= above_to.
        let below = 100u32;
        let above = 300u32;
        for x in [100u32, 150, 200, 250, 300] {
            let last_bet_to = 50;
            let d = (2 * last_bet_to) as f64;
            let actual_frac = (x as f64 - last_bet_to as f64) / d;
            let below_frac = (below as f64 - last_bet_to as f64) / d;
            let above_frac = (above as f64 - last_bet_to as f64) / d;
            let p = pseudo_harmonic_below_prob(below_frac, above_frac, actual_frac);
            assert!((0.0..=1.0).contains(&p), "p={p} out of range for x={x}");
        }
    }

    #[test]
    fn undersized_bet_never_folds() {
        let mut rng = SmallRng::seed_from_u64(1);
        let succs = vec![BetSucc { index: 0, bet_to: 400 }];
        let action = translate_bet(201, 100, &succs, 100, 0.0, TranslationMode::Randomized, &mut rng);
        assert_ne!(action, TranslatedAction::Fold);
        assert_eq!(action, TranslatedAction::Call);
    }

    #[test]
    fn undersized_bet_rewrites_onto_smallest_raise_when_own_strategy_fires() {
        // smallest_bet_raise_prob = 1.0 always beats the random draw, so
        // the translation must rewrite onto that successor rather than
        // calling, per spec.md §4.6.
        let mut rng = SmallRng::seed_from_u64(1);
        let succs = vec![BetSucc { index: 0, bet_to: 400 }];
        let action = translate_bet(201, 100, &succs, 100, 1.0, TranslationMode::Randomized, &mut rng);
        assert_eq!(action, TranslatedAction::Bet(0));
    }

    #[test]
    fn nearest_mode_is_deterministic() {
        let mut rng = SmallRng::seed_from_u64(1);
        let succs = vec![
            BetSucc { index: 0, bet_to: 200 },
            BetSucc { index: 1, bet_to: 600 },
        ];
        let a = translate_bet(210, 100, &succs, 100, 0.0, TranslationMode::Nearest, &mut rng);
        let b = translate_bet(210, 100, &succs, 100, 0.0, TranslationMode::Nearest, &mut rng);
        assert_eq!(a, b);
    }
}
