// Errors returned by `MatchController` calls.

use santorini_protocol::{LedgerError, MoveIndex};
use santorini_sim::RulesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A resync is in progress; try again once it completes.
    #[error("synchronizing with the ledger, please wait")]
    PleaseWait,
    /// A local move is still waiting for the ledger. Moves are never queued.
    #[error("move {move_index} is still being submitted")]
    SubmissionPending { move_index: MoveIndex },
    #[error("it is not a local player's turn")]
    NotYourTurn,
    #[error("the match is over")]
    MatchOver,
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("resync failed {attempts} times in a row")]
    ResyncFailed { attempts: u32 },
    #[error("controller is detached")]
    Detached,
}
