//! Legalization (`spec.md` §4.10): snaps a sampled abstract bet onto the
//! wire's min-bet and stack constraints.

use crate::wire::WireAction;

#[derive(Debug, Clone, Copy)]
pub struct LegalizeInput {
    pub abstract_bet_to: u32,
    pub last_actual_bet_to: u32,
    pub small_blind: u32,
    pub opponent_last_raise_increment: u32,
    pub stack_size: u32,
}

/// Applies steps (1)-(5) of `spec.md` §4.10 in order and returns the legal
/// wire action. Idempotent: re-legalizing the output (treating it as a new
/// `abstract_bet_to`) yields the same result (`spec.md` §8 property 5).
pub fn legalize(input: LegalizeInput) -> WireAction {
    let mut bet_to = input.abstract_bet_to.saturating_sub(0); // our_bet_size step folded into bet_to math below
    let our_bet_size_floor = input.last_actual_bet_to + 2 * input.small_blind;
    bet_to = bet_to.max(our_bet_size_floor);

    let min_raise_floor = input.last_actual_bet_to + input.opponent_last_raise_increment;
    bet_to = bet_to.max(min_raise_floor);

    bet_to = bet_to.min(input.stack_size);

    if bet_to == input.last_actual_bet_to {
        WireAction::Call
    } else {
        WireAction::Bet(bet_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_at_one_big_blind_raise() {
        let action = legalize(LegalizeInput {
            abstract_bet_to: 120,
            last_actual_bet_to: 100,
            small_blind: 50,
            opponent_last_raise_increment: 0,
            stack_size: 20000,
        });
        assert_eq!(action, WireAction::Bet(200));
    }

    #[test]
    fn caps_at_stack_and_downgrades_to_call_when_degenerate() {
        let action = legalize(LegalizeInput {
            abstract_bet_to: 25000,
            last_actual_bet_to: 20000,
            small_blind: 50,
            opponent_last_raise_increment: 0,
            stack_size: 20000,
        });
        assert_eq!(action, WireAction::Call);
    }

    #[test]
    fn legalization_is_idempotent() {
        let input = LegalizeInput {
            abstract_bet_to: 350,
            last_actual_bet_to: 100,
            small_blind: 50,
            opponent_last_raise_increment: 100,
            stack_size: 20000,
        };
        let once = legalize(input);
        let bet_to = match once {
            WireAction::Bet(b) => b,
            WireAction::Call => input.last_actual_bet_to,
            WireAction::Fold => panic!("unexpected fold"),
        };
        let twice = legalize(LegalizeInput { abstract_bet_to: bet_to, ..input });
        assert_eq!(once, twice);
    }
}
