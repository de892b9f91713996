//! Offline evaluation driver: runs a duplicate-paired match between two
//! in-process strategies and reports a mean +/- 95% CI outcome
//! (`spec.md` §2, §4.12). Positional arguments follow `spec.md` §6.3's
//! evaluation-driver contract literally.

use clap::Parser;
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::Rng;
use robopoker_runtime::abstree::{create_no_limit_subtree, BetNode, BettingTree, Edge, TerminalKind};
use robopoker_runtime::canon::canonical::hcp_pair;
use robopoker_runtime::canon::card::Card;
use robopoker_runtime::canon::street::Street;
use robopoker_runtime::canon::wire::{print_card_string, CardString};
use robopoker_runtime::config::GameConfig;
use robopoker_runtime::matchplay::{print_state_line, run_duplicate_match};
use robopoker_runtime::oracle::{HandValueOracle, SumRankOracle};
use robopoker_runtime::select::{postprocess, sample, SelectionPolicy, SpecialSuccs};
use robopoker_runtime::stratstore::{FileBackedStore, NodeKey, ScaleMode, StrategyStore};

#[derive(Parser, Debug)]
struct Args {
    game_params_file: String,
    card_abstraction_params: String,
    betting_abstraction_params: String,
    cfr_params: String,
    runtime_params: String,
    iteration: u32,
    num_hands: u64,
    determinism: String,

    #[arg(long)]
    debug: bool,
    #[arg(long)]
    eoe: bool,
    #[arg(long)]
    fs: bool,
}

fn init_logging(debug: bool) {
    use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stdout, ColorChoice::Auto);
}

/// Plays one hand to a terminal, sampling each seat's action from its own
/// strategy store, and returns seat 0's and seat 1's net chip outcome
/// (`spec.md` §4.9's selection pipeline, without translation since both
/// sides act directly in the abstraction, never over the wire).
fn play_hand(
    tree: &BettingTree,
    stores: [&dyn StrategyStore; 2],
    holes: [(Card, Card); 2],
    board: &[Card],
    oracle: &dyn HandValueOracle,
    rng: &mut impl Rng,
) -> (f64, f64) {
    let mut node = tree.root;
    loop {
        match &tree.graph[node] {
            BetNode::Terminal { kind, pot_size, .. } => {
                let half = *pot_size as f64 / 2.0;
                return match kind {
                    TerminalKind::Fold(folder) if *folder == 0 => (-half, half),
                    TerminalKind::Fold(_) => (half, -half),
                    TerminalKind::Showdown => {
                        let mut c0 = vec![holes[0].0, holes[0].1];
                        c0.extend_from_slice(board);
                        let mut c1 = vec![holes[1].0, holes[1].1];
                        c1.extend_from_slice(board);
                        let r0 = oracle.rank(&c0);
                        let r1 = oracle.rank(&c1);
                        if r0 > r1 {
                            (half, -half)
                        } else if r1 > r0 {
                            (-half, half)
                        } else {
                            (0.0, 0.0)
                        }
                    }
                };
            }
            BetNode::Decision { street, player_to_act, nonterminal_id, .. } => {
                let actor = *player_to_act;
                let succs = tree.successors(node);
                let key = NodeKey { player: actor, street: street.index(), nonterminal_id: *nonterminal_id };
                let (hi, lo) = holes[actor];
                let offset = hcp_pair(hi, lo, board);
                let fold_idx = succs.iter().position(|(_, _, e)| matches!(e, Edge::Fold));
                let call_idx = succs.iter().position(|(_, _, e)| matches!(e, Edge::Call));
                let raw = stores[actor].probs(key, offset, succs.len(), call_idx.unwrap_or(0));
                let p = postprocess(
                    raw,
                    SpecialSuccs { fold: fold_idx, call: call_idx },
                    SelectionPolicy { purify: false, ..Default::default() },
                );
                let choice = sample(&p, rng);
                node = succs[choice].1;
            }
        }
    }
}

/// Deals holes for both seats plus a full river board from a single
/// shuffled deck, so both orientations of the duplicate pair see the same
/// deal (`spec.md`'s "Duplicate pair" evaluation scheme).
fn deal(config: &GameConfig, rng: &mut impl Rng) -> (CardString, [(Card, Card); 2]) {
    let mut deck: Vec<Card> = (0..config.num_cards_in_deck() as u8).map(Card::from).collect();
    deck.shuffle(rng);

    let hole0 = order_pair(deck[0], deck[1]);
    let hole1 = order_pair(deck[2], deck[3]);
    let board = deck[4..9].to_vec();

    let cards = CardString {
        holes: vec![vec![hole0.0, hole0.1], vec![hole1.0, hole1.1]],
        board: board.clone(),
    };
    (cards, [hole0, hole1])
}

fn order_pair(a: Card, b: Card) -> (Card, Card) {
    if a.0 > b.0 {
        (a, b)
    } else {
        (b, a)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let _ = (&args.card_abstraction_params, &args.betting_abstraction_params, &args.cfr_params, &args.runtime_params, args.iteration, args.eoe);

    let config = GameConfig::load(&args.game_params_file)?;
    let deterministic = match args.determinism.as_str() {
        "determ" => true,
        "nondeterm" => false,
        other => anyhow::bail!("unknown determinism mode {other:?}, expected determ|nondeterm"),
    };

    let store_a = FileBackedStore::open("strategy", ScaleMode::F64);
    let store_b = FileBackedStore::open("strategy", ScaleMode::F64);
    let oracle = SumRankOracle { num_suits: config.num_suits };
    let (tree, _) = create_no_limit_subtree(
        Street::Pre,
        config.big_blind,
        0,
        1,
        config.stack,
        config.small_blind,
        3,
        config.max_street,
    );

    let fixed_seed = args.fs.then_some(0u64);
    let report = run_duplicate_match(args.num_hands, deterministic, fixed_seed, |rng, hand_index| {
        let (cards, holes) = deal(&config, rng);

        // AB: bot-a in seat 0, bot-b in seat 1.
        let (seat0_ab, seat1_ab) = play_hand(&tree, [&store_a, &store_b], holes, &cards.board, &oracle, rng);
        // BA: same deal, seats swapped.
        let (seat0_ba, _seat1_ba) = play_hand(&tree, [&store_b, &store_a], holes, &cards.board, &oracle, rng);

        println!(
            "{}",
            print_state_line(hand_index, "", &print_card_string(&cards), seat0_ab, seat1_ab, "bot-a", "bot-b")
        );

        // seat 0's raw outcome in each orientation (bot-a in AB, bot-b in
        // BA) — `duplicate_pair_outcome` cancels the positional component
        // by differencing these, not by us pre-attributing outcomes to a
        // player.
        (seat0_ab, seat0_ba)
    });

    let summary = format!(
        "hands={} mean={:.4} ci95=[{:.4}, {:.4}]",
        report.hands, report.mean, report.ci95.0, report.ci95.1
    );
    let colored_summary = if report.mean > 0.0 {
        summary.green()
    } else if report.mean < 0.0 {
        summary.red()
    } else {
        summary.normal()
    };
    println!("{colored_summary}");
    log::info!("{summary}");

    Ok(())
}
