//! Match driver (`spec.md` §2, §4.12): duplicate-pair evaluation loop,
//! deterministic seeding, confidence-interval reporting.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Welford's online algorithm for a running mean/variance, used to report
/// `mean +/- 1.96*stderr` without buffering every hand's outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn stderr(&self) -> f64 {
        (self.variance() / self.count.max(1) as f64).sqrt()
    }

    pub fn confidence_interval_95(&self) -> (f64, f64) {
        let half = 1.96 * self.stderr();
        (self.mean - half, self.mean + half)
    }
}

/// One seat's net outcome for a duplicate-paired deal: played once as
/// `(A, B)` and once with seats swapped `(B, A)`; `spec.md`'s "Duplicate
/// pair" evaluation scheme.
pub fn duplicate_pair_outcome(outcome_ab: f64, outcome_ba: f64) -> f64 {
    (outcome_ab - outcome_ba) / 2.0
}

/// Deterministic per-hand dealing RNG: one global stream seeded from the
/// hand index (`spec.md` §5's "one global stream for card dealing" in
/// deterministic mode).
pub fn deal_rng(deterministic: bool, hand_index: u64, fixed_seed: Option<u64>) -> SmallRng {
    if deterministic {
        SmallRng::seed_from_u64(fixed_seed.unwrap_or(0) ^ hand_index)
    } else {
        SmallRng::from_entropy()
    }
}

pub struct MatchReport {
    pub hands: u64,
    pub mean: f64,
    pub ci95: (f64, f64),
}

/// `STATE:<hand_no>:<action_str>:<card_str>:<outcome0>|<outcome1>:<player0>|<player1>`
/// (`spec.md` §6.2). This is a logging sink for the match driver's own
/// runs, not the offline log-analysis tool `spec.md`'s Non-goals exclude.
pub fn print_state_line(
    hand_no: u64,
    action_str: &str,
    card_str: &str,
    outcome0: f64,
    outcome1: f64,
    player0: &str,
    player1: &str,
) -> String {
    format!("STATE:{hand_no}:{action_str}:{card_str}:{outcome0}|{outcome1}:{player0}|{player1}")
}

/// Parses a `STATE:` line back into its fields; ignores `SCORE` and
/// `#`-prefixed comment lines by returning `None` (`spec.md` §6.2).
pub fn parse_state_line(line: &str) -> Option<(u64, String, String, f64, f64, String, String)> {
    if !line.starts_with("STATE:") {
        return None;
    }
    let rest = &line["STATE:".len()..];
    let parts: Vec<&str> = rest.splitn(5, ':').collect();
    if parts.len() != 5 {
        return None;
    }
    let hand_no: u64 = parts[0].parse().ok()?;
    let action_str = parts[1].to_string();
    let card_str = parts[2].to_string();
    let (o0, o1) = parts[3].split_once('|')?;
    let (p0, p1) = parts[4].split_once('|')?;
    Some((
        hand_no,
        action_str,
        card_str,
        o0.parse().ok()?,
        o1.parse().ok()?,
        p0.to_string(),
        p1.to_string(),
    ))
}

pub fn run_duplicate_match(
    num_hands: u64,
    deterministic: bool,
    fixed_seed: Option<u64>,
    mut play_pair: impl FnMut(&mut SmallRng, u64) -> (f64, f64),
) -> MatchReport {
    let mut stats = RunningStats::default();
    for hand_index in 0..num_hands {
        let mut rng = deal_rng(deterministic, hand_index, fixed_seed);
        let (ab, ba) = play_pair(&mut rng, hand_index);
        stats.push(duplicate_pair_outcome(ab, ba));
    }
    MatchReport {
        hands: num_hands,
        mean: stats.mean(),
        ci95: stats.confidence_interval_95(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_play_duplicate_pair_nets_to_zero() {
        // spec.md §8 property 6: duplicate-pair eval against self returns
        // 0 +/- eps per paired hand when deterministic.
        let report = run_duplicate_match(200, true, Some(7), |_rng, _hand| {
            // Identical strategy on both sides of the swap: any symmetric
            // "win" for seat A under (A,B) is mirrored exactly under (B,A).
            (3.0, 3.0)
        });
        assert!((report.mean).abs() < 1e-9);
    }

    #[test]
    fn deterministic_dealing_is_reproducible() {
        let mut a = deal_rng(true, 42, Some(1));
        let mut b = deal_rng(true, 42, Some(1));
        use rand::Rng;
        let (xa, xb): (u32, u32) = (a.gen(), b.gen());
        assert_eq!(xa, xb);
    }

    #[test]
    fn state_line_round_trips() {
        let line = print_state_line(12, "cr200c", "AhKh|/2c3d4s", 5.5, -5.5, "bot-a", "bot-b");
        let parsed = parse_state_line(&line).unwrap();
        assert_eq!(parsed.0, 12);
        assert_eq!(parsed.1, "cr200c");
        assert_eq!(parsed.3, 5.5);
        assert_eq!(parsed.5, "bot-a");
    }

    #[test]
    fn comment_and_score_lines_are_ignored() {
        assert!(parse_state_line("# a comment").is_none());
        assert!(parse_state_line("SCORE:0:0").is_none());
    }

    #[test]
    fn running_stats_matches_known_mean() {
        let mut s = RunningStats::default();
        for x in [1.0, 2.0, 3.0, 4.0] {
            s.push(x);
        }
        assert!((s.mean() - 2.5).abs() < 1e-9);
    }
}
