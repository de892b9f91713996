//! Betting abstraction & tree (`spec.md` §4.4). Nodes live in a
//! `petgraph::DiGraph` arena addressed by `NodeIndex`/`EdgeIndex` — this is
//! the REDESIGN-FLAGS-mandated replacement for a pointer-rich tree of
//! `Node*`, and is exactly the arena the teacher already reaches for in
//! `mccfr::tree::Tree` (`DiGraph<Node, Edge>`).

use crate::abstree::odds::{grid_for_street, Odds};
use crate::canon::street::Street;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Fold(usize),
    Showdown,
}

#[derive(Debug, Clone)]
pub enum BetNode {
    Decision {
        street: Street,
        player_to_act: usize,
        last_bet_to: u32,
        num_street_bets: u8,
        /// dense id per (street, player_to_act) pair, used to index the
        /// strategy store (`spec.md` §3.1's `nonterminal_id`).
        nonterminal_id: u32,
    },
    Terminal {
        kind: TerminalKind,
        pot_size: u32,
        terminal_id: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Fold,
    Call,
    Bet(Odds),
    Shove,
}

pub struct BettingTree {
    pub graph: DiGraph<BetNode, Edge>,
    pub root: NodeIndex,
    call_succ: HashMap<NodeIndex, EdgeIndex>,
    fold_succ: HashMap<NodeIndex, EdgeIndex>,
    default_succ: HashMap<NodeIndex, EdgeIndex>,
}

impl BettingTree {
    pub fn successors(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex, Edge)> {
        self.graph
            .edges(node)
            .map(|e| (e.id(), e.target(), *e.weight()))
            .collect()
    }

    pub fn call_succ(&self, node: NodeIndex) -> Option<EdgeIndex> {
        self.call_succ.get(&node).copied()
    }

    pub fn fold_succ(&self, node: NodeIndex) -> Option<EdgeIndex> {
        self.fold_succ.get(&node).copied()
    }

    pub fn default_succ(&self, node: NodeIndex) -> Option<EdgeIndex> {
        self.default_succ.get(&node).copied()
    }
}

struct Builder {
    graph: DiGraph<BetNode, Edge>,
    call_succ: HashMap<NodeIndex, EdgeIndex>,
    fold_succ: HashMap<NodeIndex, EdgeIndex>,
    default_succ: HashMap<NodeIndex, EdgeIndex>,
    memo: HashMap<(u8, usize, u8, u32), NodeIndex>,
    nonterminal_ids: HashMap<(u8, usize), u32>,
    terminal_ids: u32,
    stack: u32,
    small_blind: u32,
    max_raises_per_street: u8,
    max_street: u8,
}

/// Builds a two-player no-limit subtree rooted at the given state, used
/// both for the static base tree and (with a possibly different grid /
/// max-raises policy) for `CreateNoLimitSubtree` during endgame resolving.
pub fn create_no_limit_subtree(
    street: Street,
    last_bet_to: u32,
    num_street_bets: u8,
    player_acting: usize,
    stack: u32,
    small_blind: u32,
    max_raises_per_street: u8,
    max_street: u8,
) -> (BettingTree, u32) {
    let mut b = Builder {
        graph: DiGraph::new(),
        call_succ: HashMap::new(),
        fold_succ: HashMap::new(),
        default_succ: HashMap::new(),
        memo: HashMap::new(),
        nonterminal_ids: HashMap::new(),
        terminal_ids: 0,
        stack,
        small_blind,
        max_raises_per_street,
        max_street,
    };
    let root = b.decision(street, player_acting, last_bet_to, num_street_bets);
    let tree = BettingTree {
        graph: b.graph,
        root,
        call_succ: b.call_succ,
        fold_succ: b.fold_succ,
        default_succ: b.default_succ,
    };
    (tree, b.terminal_ids)
}

impl Builder {
    fn next_nonterminal_id(&mut self, street: Street, player: usize) -> u32 {
        let key = (street.index(), player);
        let counter = self.nonterminal_ids.entry(key).or_insert(0);
        let id = *counter;
        *counter += 1;
        id
    }

    fn terminal(&mut self, kind: TerminalKind, pot_size: u32) -> NodeIndex {
        let id = self.terminal_ids;
        self.terminal_ids += 1;
        self.graph.add_node(BetNode::Terminal {
            kind,
            pot_size,
            terminal_id: id,
        })
    }

    fn decision(
        &mut self,
        street: Street,
        player: usize,
        last_bet_to: u32,
        num_street_bets: u8,
    ) -> NodeIndex {
        let key = (street.index(), player, num_street_bets, last_bet_to);
        if let Some(&existing) = self.memo.get(&key) {
            return existing;
        }

        let nonterminal_id = self.next_nonterminal_id(street, player);
        let node = self.graph.add_node(BetNode::Decision {
            street,
            player_to_act: player,
            last_bet_to,
            num_street_bets,
            nonterminal_id,
        });
        self.memo.insert(key, node);

        let opponent = 1 - player;
        let pot = 2 * last_bet_to;

        // Fold successor (not legal for the blind-first action when nobody
        // has bet beyond the blinds, but callers that don't want it simply
        // never sample it — structurally we always offer it except at the
        // very first preflop choice where it would be degenerate).
        let fold_target = self.terminal(TerminalKind::Fold(player), pot);
        let fold_edge = self.graph.add_edge(node, fold_target, Edge::Fold);
        self.fold_succ.insert(node, fold_edge);

        // Call successor: moves to next street (or showdown on the river).
        let call_target = match street.next() {
            Some(next_street) if last_bet_to < self.stack => {
                self.decision(next_street, opponent, last_bet_to, 0)
            }
            _ => self.terminal(TerminalKind::Showdown, pot),
        };
        let call_edge = self.graph.add_edge(node, call_target, Edge::Call);
        self.call_succ.insert(node, call_edge);
        self.default_succ.insert(node, call_edge);

        // Bet successors, only while under the per-street raise cap and
        // below stack.
        if num_street_bets < self.max_raises_per_street && last_bet_to < self.stack {
            for &odds in grid_for_street(street.index()) {
                let raise_amount = (pot.max(2 * self.small_blind) as f64 * odds.ratio()) as u32;
                let bet_to = (last_bet_to + raise_amount.max(self.small_blind)).min(self.stack);
                if bet_to <= last_bet_to {
                    continue;
                }
                let target = self.decision(street, opponent, bet_to, num_street_bets + 1);
                self.graph.add_edge(node, target, Edge::Bet(odds));
            }
            // Shove: bet the entire remaining stack.
            if self.stack > last_bet_to {
                let target = self.decision(street, opponent, self.stack, num_street_bets + 1);
                self.graph.add_edge(node, target, Edge::Shove);
            }
        }

        let _ = self.max_street;
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_decision_node_has_call_and_fold() {
        let (tree, _) =
            create_no_limit_subtree(Street::Pre, 100, 0, 0, 20000, 50, 3, 3);
        for idx in tree.graph.node_indices() {
            if matches!(tree.graph[idx], BetNode::Decision { .. }) {
                assert!(tree.call_succ(idx).is_some());
                assert!(tree.fold_succ(idx).is_some());
            }
        }
    }

    #[test]
    fn bet_successors_strictly_increase_bet_to() {
        let (tree, _) =
            create_no_limit_subtree(Street::Pre, 100, 0, 0, 20000, 50, 3, 3);
        let bets: Vec<u32> = tree
            .successors(tree.root)
            .into_iter()
            .filter_map(|(_, target, edge)| match (edge, &tree.graph[target]) {
                (Edge::Bet(_), BetNode::Decision { last_bet_to, .. }) => Some(*last_bet_to),
                (Edge::Shove, BetNode::Decision { last_bet_to, .. }) => Some(*last_bet_to),
                _ => None,
            })
            .collect();
        let mut sorted = bets.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), bets.len(), "bet-to amounts must be distinct");
    }

    #[test]
    fn reaches_showdown_terminal_on_river_call() {
        let (tree, _) =
            create_no_limit_subtree(Street::River, 500, 0, 1, 20000, 50, 3, 3);
        let call_target = tree.graph.edge_endpoints(tree.call_succ(tree.root).unwrap()).unwrap().1;
        assert!(matches!(
            tree.graph[call_target],
            BetNode::Terminal { kind: TerminalKind::Showdown, .. }
        ));
    }
}
