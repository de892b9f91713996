//! ACPC bot: connects to a match server and plays hands using the
//! abstraction-backed decision engine. Synchronous, single-threaded per
//! `spec.md` §5 — one wire message in, one decision out, no suspension
//! mid-decision.

use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use robopoker_runtime::abstree::{create_no_limit_subtree, BetNode, BettingTree, Edge};
use robopoker_runtime::canon::canonical::hcp_pair;
use robopoker_runtime::canon::card::Card;
use robopoker_runtime::canon::street::Street;
use robopoker_runtime::canon::wire::CardString;
use robopoker_runtime::config::GameConfig;
use robopoker_runtime::error::{EngineError, Outcome, Policy};
use robopoker_runtime::handstate::{Decision, HandState};
use robopoker_runtime::legalize::{legalize, LegalizeInput};
use robopoker_runtime::oracle::{HandValueOracle, SumRankOracle, TableOracle};
use robopoker_runtime::resolve::{compute_t_values, map_subtree_nodes, resolve_combined};
use robopoker_runtime::select::{postprocess, sample, SelectionPolicy, SpecialSuccs};
use robopoker_runtime::stratstore::{FileBackedStore, InMemoryStore, NodeKey, ScaleMode, StrategyStore};
use robopoker_runtime::translate::TranslationMode;
use robopoker_runtime::wire::{parse_matchstate, print_reply, WireAction};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;
use petgraph::graph::NodeIndex;

/// Positional arguments mirror `spec.md` §6.3's evaluation-driver
/// contract, with `host`/`port` appended since the bot additionally needs
/// somewhere to connect to play live.
#[derive(Parser, Debug)]
struct Args {
    game_params_file: String,
    card_abstraction_params: String,
    betting_abstraction_params: String,
    cfr_params: String,
    runtime_params: String,
    iteration: u32,
    host: String,
    port: u16,

    #[arg(long)]
    debug: bool,
    #[arg(long)]
    eoe: bool,
    #[arg(long)]
    fs: bool,
    /// Path to a persisted hand-value table (`spec.md` §6.4); falls back to
    /// `SumRankOracle` when absent, since the real table is produced by an
    /// external collaborator this crate doesn't own.
    #[arg(long)]
    hand_value_table: Option<String>,
    /// CFR-D iterations run per endgame resolve (`spec.md` §4.8).
    #[arg(long, default_value_t = 200)]
    endgame_its: u32,
}

fn init_logging(debug: bool) {
    use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};
    let level = if debug { LevelFilter::Trace } else { LevelFilter::Info };
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn connect_with_retry(host: &str, port: u16) -> anyhow::Result<TcpStream> {
    let mut attempts = 0;
    loop {
        match TcpStream::connect((host, port)) {
            Ok(stream) => return Ok(stream),
            Err(e) if attempts < 10 => {
                attempts += 1;
                log::warn!("connect attempt {attempts} failed: {e}");
                std::thread::sleep(Duration::from_secs(30));
            }
            Err(e) => anyhow::bail!("failed to connect after {attempts} retries: {e}"),
        }
    }
}

/// Our own canonical hand-card-pair offset for this street's board, or `0`
/// if our hole cards aren't visible in this matchstate line yet (shouldn't
/// happen once the hand has started, but the wire format technically
/// allows a transient blank).
fn our_offset(cards: &CardString, seat: usize) -> u64 {
    match cards.holes.get(seat) {
        Some(h) if h.len() == 2 => {
            let (hi, lo) = if h[0].0 > h[1].0 { (h[0], h[1]) } else { (h[1], h[0]) };
            hcp_pair(hi, lo, &cards.board)
        }
        _ => 0,
    }
}

/// Builds a fresh endgame subtree rooted at `node`'s exact game state and
/// resolves a strategy over it via CFR-D combined resolving (`spec.md`
/// §4.8). Returns the resolved store plus the base-tree-to-endgame-tree
/// node map the bot uses to keep following the live hand through it.
fn resolve_endgame(
    base_tree: &BettingTree,
    node: NodeIndex,
    seat: usize,
    cards: &CardString,
    config: &GameConfig,
    oracle: &dyn HandValueOracle,
    num_iterations: u32,
) -> (InMemoryStore, std::collections::HashMap<NodeIndex, NodeIndex>) {
    let (street, player_to_act, last_bet_to, num_street_bets) = match &base_tree.graph[node] {
        BetNode::Decision { street, player_to_act, last_bet_to, num_street_bets, .. } => {
            (*street, *player_to_act, *last_bet_to, *num_street_bets)
        }
        BetNode::Terminal { .. } => unreachable!("resolve only triggers at decision nodes"),
    };

    let (endgame_tree, _) = create_no_limit_subtree(
        street,
        last_bet_to,
        num_street_bets,
        player_to_act,
        config.stack,
        config.small_blind,
        3,
        config.max_street,
    );

    let board = &cards.board;
    let our_hole = &cards.holes[seat];
    let (our_hi, our_lo) = if our_hole[0].0 > our_hole[1].0 {
        (our_hole[0], our_hole[1])
    } else {
        (our_hole[1], our_hole[0])
    };

    let mut known = 0u64;
    for c in board.iter().chain(our_hole.iter()) {
        known |= c.to_bits();
    }
    let remaining: Vec<Card> = (0..config.num_cards_in_deck() as u8)
        .map(Card::from)
        .filter(|c| known & c.to_bits() == 0)
        .collect();

    let mut opp_hands = Vec::new();
    for i in 0..remaining.len() {
        for j in (i + 1)..remaining.len() {
            opp_hands.push((remaining[i], remaining[j]));
        }
    }

    let our_range = vec![(our_hi, our_lo, 1.0)];
    let pot = 2.0 * last_bet_to as f64;
    let t_values = compute_t_values(oracle, board, &our_range, &opp_hands, pot);

    // Only our own known hand ever gets queried at serve time (our hole
    // cards are fixed once dealt), so the resolved rows only need to cover
    // that one offset — `opp_hands` above is purely for T-value weighting.
    let our_hole_pair = [(our_hi, our_lo)];
    let store = resolve_combined(&endgame_tree, street.index(), board, &our_hole_pair, &t_values, num_iterations);
    let node_map = map_subtree_nodes(base_tree, node, &endgame_tree, endgame_tree.root);
    (store, node_map)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Separate base/endgame abstraction and CFR parameter files are an
    // external collaborator's concern (`spec.md` §2) — this binary only
    // needs the game description and the trained strategy directory.
    let _ = (&args.card_abstraction_params, &args.betting_abstraction_params, &args.cfr_params, &args.runtime_params, args.iteration);

    let config = GameConfig::load(&args.game_params_file)?;
    let policy = Policy { exit_on_error: args.eoe };

    let (tree, _num_terminals) = robopoker_runtime::abstree::create_no_limit_subtree(
        Street::Pre,
        config.big_blind,
        0,
        1,
        config.stack,
        config.small_blind,
        3,
        config.max_street,
    );

    let store = FileBackedStore::open("strategy", ScaleMode::F64);
    let oracle: Box<dyn HandValueOracle> = match &args.hand_value_table {
        Some(path) => Box::new(TableOracle::load(path, config.num_cards_in_deck())?),
        None => Box::new(SumRankOracle { num_suits: config.num_suits }),
    };

    let mut stream = connect_with_retry(&args.host, args.port)?;
    stream.write_all(b"VERSION:2.0.0\r\n")?;

    let reader = BufReader::new(stream.try_clone()?);
    let mut our_seat: Option<usize> = None;
    let mut hs = HandState::new(tree.root, config.num_players);
    let mut rng = SmallRng::seed_from_u64(if args.fs { 0 } else { 0xC0FFEE });

    // Cache of this hand's resolved endgame strategy, cleared at the start
    // of every new hand (`spec.md` §4.7's "last hand's resolved strategy
    // still live: always delete").
    let mut resolved: Option<(InMemoryStore, std::collections::HashMap<NodeIndex, NodeIndex>)> = None;

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("socket read error: {e}");
                break;
            }
        };
        if line.starts_with("#GAMEOVER") || line.starts_with("ENDGAME") {
            break;
        }

        let ms = match parse_matchstate(&line) {
            Ok(ms) => ms,
            Err(e) => {
                if policy.resolve(&EngineError::Parse(e)) == Outcome::Fatal {
                    anyhow::bail!("fatal parse error on matchstate line");
                }
                log::warn!("unparseable matchstate line, skipping: {line}");
                continue;
            }
        };
        our_seat.get_or_insert(ms.position);
        let seat = our_seat.unwrap();

        if let Some(seed) = hs.maybe_reset(ms.hand_no, tree.root, config.num_players, seat) {
            rng = SmallRng::seed_from_u64(seed);
            resolved = None;
        }

        let all_actions: Vec<WireAction> = match ms.actions() {
            Ok(streets) => streets.into_iter().flatten().collect(),
            Err(e) => {
                if policy.resolve(&EngineError::Parse(e)) == Outcome::Fatal {
                    anyhow::bail!("fatal action-string parse error");
                }
                continue;
            }
        };

        let cards = ms.cards().ok();
        let offset = cards.as_ref().map(|c| our_offset(c, seat)).unwrap_or(0);

        let decision = hs.advance(&tree, &all_actions, seat, &store, offset, TranslationMode::Randomized, &mut rng);

        let action = match decision {
            Decision::NoAction => continue,
            Decision::Call => WireAction::Call,
            Decision::Sample(node) => {
                let (street_idx, nonterminal_id, node_last_bet_to) = match &tree.graph[node] {
                    BetNode::Decision { street, nonterminal_id, last_bet_to, .. } => {
                        (street.index(), *nonterminal_id, *last_bet_to)
                    }
                    BetNode::Terminal { .. } => unreachable!("Sample only returned for decision nodes"),
                };

                let succs = tree.successors(node);
                let num_succs = succs.len();
                let fold_idx = succs.iter().position(|(_, _, e)| matches!(e, Edge::Fold));
                let call_idx = succs.iter().position(|(_, _, e)| matches!(e, Edge::Call));
                let default_idx = call_idx.unwrap_or(0);

                // Endgame resolve trigger (spec.md §4.8): current street is
                // at/past the configured threshold, nothing has been
                // resolved yet this hand, and there's a real decision (more
                // than one successor) to make here.
                if street_idx >= config.endgame_street && resolved.is_none() && num_succs > 1 {
                    if let Some(cards) = &cards {
                        if cards.holes.get(seat).map(|h| h.len()) == Some(2) {
                            resolved = Some(resolve_endgame(&tree, node, seat, cards, &config, oracle.as_ref(), args.endgame_its));
                        }
                    }
                }

                let (key, active_store): (NodeKey, &dyn StrategyStore) = match &resolved {
                    Some((resolved_store, node_map)) => {
                        let mapped = node_map.get(&node).copied().unwrap_or(node);
                        (
                            NodeKey { player: seat, street: street_idx, nonterminal_id: mapped.index() as u32 },
                            resolved_store,
                        )
                    }
                    None => (
                        NodeKey { player: seat, street: street_idx, nonterminal_id },
                        &store,
                    ),
                };

                let raw = active_store.probs(key, offset, num_succs, default_idx);
                let p = postprocess(
                    raw,
                    SpecialSuccs { fold: fold_idx, call: call_idx },
                    SelectionPolicy { purify: false, ..Default::default() },
                );
                let choice = sample(&p, &mut rng);
                let (_, target, edge) = succs[choice];

                match edge {
                    Edge::Fold => WireAction::Fold,
                    Edge::Call => WireAction::Call,
                    Edge::Bet(_) | Edge::Shove => {
                        let abstract_bet_to = match &tree.graph[target] {
                            BetNode::Decision { last_bet_to, .. } => *last_bet_to,
                            BetNode::Terminal { pot_size, .. } => pot_size / 2,
                        };
                        legalize(LegalizeInput {
                            abstract_bet_to,
                            last_actual_bet_to: node_last_bet_to,
                            small_blind: config.small_blind,
                            opponent_last_raise_increment: config.big_blind,
                            stack_size: config.stack,
                        })
                    }
                }
            }
        };

        stream.write_all(print_reply(&ms, action).as_bytes())?;
    }

    Ok(())
}
