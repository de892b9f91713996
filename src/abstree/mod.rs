pub mod odds;
pub mod tree;

pub use odds::Odds;
pub use tree::{create_no_limit_subtree, BetNode, BettingTree, Edge, TerminalKind};
