//! Hand state machine (`spec.md` §4.7): per-hand advancement through the
//! abstract tree driven by real-game actions, including out-of-sync
//! recovery.

use crate::abstree::{BetNode, BettingTree, Edge};
use crate::stratstore::{NodeKey, StrategyStore};
use crate::translate::{translate_bet, BetSucc, TranslatedAction, TranslationMode};
use crate::wire::WireAction;
use petgraph::graph::NodeIndex;
use rand::Rng;

/// A single advance through the tree during hand replay.
/// `skip_action > 0` means an opponent action was subsumed by a previous
/// rounding and must be consumed without advancing (`spec.md` §3.1).
#[derive(Debug, Clone, Copy)]
pub struct RetraceStep {
    pub skip_action: u8,
    pub node: NodeIndex,
    pub succ_edge: Option<petgraph::graph::EdgeIndex>,
}

/// What the engine should do after processing a wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Not our turn; say nothing.
    NoAction,
    /// Safe sentinel: either the real game reached showdown/all-in-fold
    /// while the abstract tree had already terminated, or the real game
    /// undersized a bet into "treat as a call" territory.
    Call,
    /// Our turn: sample from the strategy at this node.
    Sample(NodeIndex),
}

/// Our cumulative probability of raising (choosing a `Bet`/`Shove`
/// successor) at `node`, per the current base strategy. Used to decide
/// whether translate-bet-to-call should rewrite onto our smallest bet
/// instead of calling (`spec.md` §4.6).
fn own_raise_prob(tree: &BettingTree, node: NodeIndex, store: &dyn StrategyStore, offset: u64) -> f64 {
    let BetNode::Decision { street, player_to_act, nonterminal_id, .. } = &tree.graph[node] else {
        return 0.0;
    };
    let succs = tree.successors(node);
    let key = NodeKey { player: *player_to_act, street: street.index(), nonterminal_id: *nonterminal_id };
    let probs = store.probs(key, offset, succs.len(), 0);
    succs
        .iter()
        .zip(probs.iter())
        .filter(|((_, _, edge), _)| matches!(edge, Edge::Bet(_) | Edge::Shove))
        .map(|(_, p)| p)
        .sum()
}

pub struct HandState {
    pub path: Vec<RetraceStep>,
    pub action_index: usize,
    pub last_hand_index: Option<u64>,
    pub folded: Vec<bool>,
    pub current: NodeIndex,
}

impl HandState {
    pub fn new(root: NodeIndex, num_players: usize) -> Self {
        HandState {
            path: Vec::new(),
            action_index: 0,
            last_hand_index: None,
            folded: vec![false; num_players],
            current: root,
        }
    }

    /// Resets per-hand state when `hand_index` advances; returns the
    /// deterministic per-seat RNG seed for the new hand
    /// (`hand_index * num_players + our_seat`), or `None` if this message
    /// belongs to the hand already in progress.
    pub fn maybe_reset(
        &mut self,
        hand_index: u64,
        root: NodeIndex,
        num_players: usize,
        our_seat: usize,
    ) -> Option<u64> {
        if self.last_hand_index == Some(hand_index) {
            return None;
        }
        self.path.clear();
        self.action_index = 0;
        self.folded = vec![false; num_players];
        self.current = root;
        self.last_hand_index = Some(hand_index);
        Some(hand_index * num_players as u64 + our_seat as u64)
    }

    fn node(&self, tree: &BettingTree) -> &BetNode {
        &tree.graph[self.current]
    }

    fn is_terminal(&self, tree: &BettingTree) -> bool {
        matches!(self.node(tree), BetNode::Terminal { .. })
    }

    fn player_to_act(&self, tree: &BettingTree) -> Option<usize> {
        match self.node(tree) {
            BetNode::Decision { player_to_act, .. } => Some(*player_to_act),
            BetNode::Terminal { .. } => None,
        }
    }

    fn advance_to(&mut self, tree: &BettingTree, edge: petgraph::graph::EdgeIndex) {
        let (_, target) = tree.graph.edge_endpoints(edge).unwrap();
        self.path.push(RetraceStep {
            skip_action: 0,
            node: self.current,
            succ_edge: Some(edge),
        });
        self.current = target;
    }

    fn skip(&mut self, level: u8) {
        self.path.push(RetraceStep {
            skip_action: level,
            node: self.current,
            succ_edge: None,
        });
    }

    /// Replays every opponent action not yet consumed (`from action_index
    /// to end` of the flattened, current-street action run), then
    /// determines whose turn it is.
    ///
    /// `our_seat` identifies which player in the tree we are; `all_actions`
    /// is the full flattened action list for the hand so far (across all
    /// streets, in order). `store`/`offset` are our own base strategy and
    /// hand-card-pair offset, consulted by the translate-bet-to-call
    /// special case (`spec.md` §4.6) — resolving hasn't happened yet at
    /// this point in the hand, so this is always the base store, never a
    /// resolved one.
    pub fn advance(
        &mut self,
        tree: &BettingTree,
        all_actions: &[WireAction],
        our_seat: usize,
        store: &dyn StrategyStore,
        offset: u64,
        mode: TranslationMode,
        rng: &mut impl Rng,
    ) -> Decision {
        while self.action_index < all_actions.len() {
            if self.is_terminal(tree) {
                // Abstract terminal reached while the real game continues:
                // return Call, do not advance the abstract state.
                return Decision::Call;
            }

            let actor = self.player_to_act(tree).expect("checked non-terminal above");
            let action = all_actions[self.action_index];

            match action {
                WireAction::Fold => {
                    match tree.fold_succ(self.current) {
                        Some(edge) => {
                            self.folded[actor] = true;
                            self.advance_to(tree, edge);
                        }
                        None => self.skip(1),
                    }
                }
                WireAction::Call => match tree.call_succ(self.current) {
                    Some(edge) => self.advance_to(tree, edge),
                    None => self.skip(1),
                },
                WireAction::Bet(x) => {
                    let bet_succs_with_targets: Vec<(BetSucc, NodeIndex)> = tree
                        .successors(self.current)
                        .into_iter()
                        .filter_map(|(_, target, edge)| match (edge, &tree.graph[target]) {
                            (Edge::Bet(_), BetNode::Decision { last_bet_to, .. })
                            | (Edge::Shove, BetNode::Decision { last_bet_to, .. }) => {
                                Some((*last_bet_to, target))
                            }
                            _ => None,
                        })
                        .enumerate()
                        .map(|(i, (bet_to, target))| (BetSucc { index: i, bet_to }, target))
                        .collect();
                    let bet_succs: Vec<BetSucc> =
                        bet_succs_with_targets.iter().map(|(b, _)| *b).collect();

                    let last_bet_to = match self.node(tree) {
                        BetNode::Decision { last_bet_to, .. } => *last_bet_to,
                        BetNode::Terminal { .. } => unreachable!(),
                    };
                    let call_succ_bet_to = last_bet_to;

                    if bet_succs.is_empty() {
                        // Abstraction has no more room to raise here: the
                        // bet was already rounded up to an all-in earlier,
                        // consume as a no-op.
                        self.skip(1);
                        continue;
                    }

                    // Our own cumulative raise probability at the
                    // smallest-bet successor, for the translate-bet-to-call
                    // special case (spec.md §4.6). The successor is a
                    // decision node where we act next.
                    let smallest_bet_raise_prob = bet_succs_with_targets
                        .iter()
                        .min_by_key(|(b, _)| b.bet_to)
                        .map(|(_, target)| own_raise_prob(tree, *target, store, offset))
                        .unwrap_or(0.0);

                    let translated = translate_bet(
                        x,
                        last_bet_to,
                        &bet_succs,
                        call_succ_bet_to,
                        smallest_bet_raise_prob,
                        mode,
                        rng,
                    );

                    match translated {
                        TranslatedAction::Call => match tree.call_succ(self.current) {
                            Some(edge) => self.advance_to(tree, edge),
                            None => self.skip(1),
                        },
                        TranslatedAction::Fold => unreachable!("translation never folds"),
                        TranslatedAction::Bet(chosen) => {
                            let edges: Vec<petgraph::graph::EdgeIndex> = tree
                                .successors(self.current)
                                .into_iter()
                                .filter(|(_, _, edge)| matches!(edge, Edge::Bet(_) | Edge::Shove))
                                .map(|(e, _, _)| e)
                                .collect();
                            self.advance_to(tree, edges[chosen]);
                        }
                    }
                }
            }
            self.action_index += 1;
        }

        if self.is_terminal(tree) {
            return Decision::Call;
        }
        let actor = self.player_to_act(tree).expect("non-terminal");
        if actor == our_seat {
            Decision::Sample(self.current)
        } else {
            Decision::NoAction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::street::Street;
    use crate::stratstore::InMemoryStore;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn small_tree() -> BettingTree {
        crate::abstree::create_no_limit_subtree(Street::Pre, 100, 0, 0, 20000, 50, 2, 3).0
    }

    #[test]
    fn reset_reseeds_and_clears_path() {
        let tree = small_tree();
        let mut hs = HandState::new(tree.root, 2);
        let seed = hs.maybe_reset(5, tree.root, 2, 1).unwrap();
        assert_eq!(seed, 5 * 2 + 1);
        assert!(hs.path.is_empty());
        assert!(hs.maybe_reset(5, tree.root, 2, 1).is_none());
    }

    #[test]
    fn not_our_turn_returns_no_action() {
        let tree = small_tree();
        let mut hs = HandState::new(tree.root, 2);
        let store = InMemoryStore::new();
        let mut rng = SmallRng::seed_from_u64(0);
        let decision = hs.advance(&tree, &[], 1, &store, 0, TranslationMode::Randomized, &mut rng);
        assert_eq!(decision, Decision::NoAction);
    }

    #[test]
    fn our_turn_returns_sample() {
        let tree = small_tree();
        let mut hs = HandState::new(tree.root, 2);
        let store = InMemoryStore::new();
        let mut rng = SmallRng::seed_from_u64(0);
        let decision = hs.advance(&tree, &[], 0, &store, 0, TranslationMode::Randomized, &mut rng);
        assert_eq!(decision, Decision::Sample(tree.root));
    }

    #[test]
    fn call_advances_to_next_decision() {
        let tree = small_tree();
        let mut hs = HandState::new(tree.root, 2);
        let store = InMemoryStore::new();
        let mut rng = SmallRng::seed_from_u64(0);
        let _ = hs.advance(
            &tree,
            &[WireAction::Call],
            1,
            &store,
            0,
            TranslationMode::Randomized,
            &mut rng,
        );
        assert_eq!(hs.action_index, 1);
        assert_ne!(hs.current, tree.root);
    }

    #[test]
    fn path_relation_holds_after_replay() {
        // spec.md §3.3 invariant 3: node i+1 is a successor of node i, or
        // node i was consumed as a skip step.
        let tree = small_tree();
        let mut hs = HandState::new(tree.root, 2);
        let store = InMemoryStore::new();
        let mut rng = SmallRng::seed_from_u64(0);
        let _ = hs.advance(
            &tree,
            &[WireAction::Call],
            1,
            &store,
            0,
            TranslationMode::Randomized,
            &mut rng,
        );
        for step in &hs.path {
            if let Some(edge) = step.succ_edge {
                let (src, _) = tree.graph.edge_endpoints(edge).unwrap();
                assert_eq!(src, step.node);
            }
        }
    }
}
