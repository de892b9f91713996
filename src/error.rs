use thiserror::Error;

/// Error taxonomy for the decision engine.
///
/// `TimingOrDeadlineExceeded` is deliberately absent: the wire deadline is
/// enforced by the external match server, never observed locally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("table missing: {0}")]
    TableMissing(String),

    #[error("resource error: {0}")]
    Resource(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid card syntax: {0:?}")]
    InvalidCardSyntax(String),

    #[error("duplicate card in board+hole set: {0}")]
    DuplicateCard(String),

    #[error("malformed matchstate line: {0:?}")]
    MatchState(String),

    #[error("malformed action string: {0:?}")]
    Action(String),

    #[error("malformed config: {0}")]
    Config(String),
}

/// What the message-boundary handler should do when an `EngineError`
/// propagates up out of a single wire-message turn.
///
/// `eoe` (exit-on-error) is the CLI/config flag controlling this choice
/// per-process; `Policy::resolve` is the single place that choice is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub exit_on_error: bool,
}

impl Policy {
    pub fn resolve(&self, err: &EngineError) -> Outcome {
        match err {
            EngineError::Parse(_) => Outcome::Fallback,
            EngineError::InvariantViolation(_) => {
                if self.exit_on_error {
                    Outcome::Fatal
                } else {
                    Outcome::Fallback
                }
            }
            EngineError::TableMissing(_) => Outcome::Fatal,
            EngineError::Resource(_) => Outcome::Fatal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Return a safe default action (`Call` or `NoAction`) and keep playing.
    Fallback,
    /// Terminate the process.
    Fatal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_never_fatal() {
        let lenient = Policy { exit_on_error: true };
        let err = EngineError::Parse(ParseError::Action("??".into()));
        assert_eq!(lenient.resolve(&err), Outcome::Fallback);
    }

    #[test]
    fn invariant_violation_respects_eoe() {
        let err = EngineError::InvariantViolation("no succ".into());
        assert_eq!(
            Policy { exit_on_error: true }.resolve(&err),
            Outcome::Fatal
        );
        assert_eq!(
            Policy { exit_on_error: false }.resolve(&err),
            Outcome::Fallback
        );
    }

    #[test]
    fn table_missing_always_fatal() {
        let err = EngineError::TableMissing("strategy.bin".into());
        assert_eq!(
            Policy { exit_on_error: false }.resolve(&err),
            Outcome::Fatal
        );
    }
}
