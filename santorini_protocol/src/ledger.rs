// The move ledger contract.
//
// `MoveLedger` is what a client needs from whatever stores a match's moves:
// conditional append at an expected index, a full listing, the current
// match status, and a push subscription. Implementations can be remote
// services or the in-process `santorini_ledger::MemoryLedger`.
//
// Pushes arrive on a `Subscription`, a thin wrapper over an `mpsc`
// receiver. `poll()` drains whatever has arrived without blocking; the
// client calls it from its own update loop, so no async runtime is needed.
// A push is a hint that the log changed, not a guaranteed delivery: clients
// must tolerate lost, duplicated, and late pushes and use `list()` as the
// source of truth.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use thiserror::Error;

use crate::message::{AppendOutcome, AppendRequest, LedgerEntry, LedgerEvent, MatchStatus};
use crate::types::MatchId;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The backend could not be reached or failed mid-request. Retryable.
    #[error("ledger transport failure: {0}")]
    Transport(String),
    #[error("unknown match {0}")]
    UnknownMatch(MatchId),
}

pub trait MoveLedger {
    /// Store `request` if its index is the next free one in the match log.
    fn append(
        &self,
        match_id: &MatchId,
        request: AppendRequest,
    ) -> Result<AppendOutcome, LedgerError>;

    /// Every entry of the match, in index order.
    fn list(&self, match_id: &MatchId) -> Result<Vec<LedgerEntry>, LedgerError>;

    fn status(&self, match_id: &MatchId) -> Result<MatchStatus, LedgerError>;

    /// Start receiving pushes for the match. Dropping the subscription
    /// unsubscribes.
    fn subscribe(&self, match_id: &MatchId) -> Result<Subscription, LedgerError>;
}

impl<T: MoveLedger + ?Sized> MoveLedger for Arc<T> {
    fn append(
        &self,
        match_id: &MatchId,
        request: AppendRequest,
    ) -> Result<AppendOutcome, LedgerError> {
        (**self).append(match_id, request)
    }

    fn list(&self, match_id: &MatchId) -> Result<Vec<LedgerEntry>, LedgerError> {
        (**self).list(match_id)
    }

    fn status(&self, match_id: &MatchId) -> Result<MatchStatus, LedgerError> {
        (**self).status(match_id)
    }

    fn subscribe(&self, match_id: &MatchId) -> Result<Subscription, LedgerError> {
        (**self).subscribe(match_id)
    }
}

/// Receiving end of a match's push notifications.
#[derive(Debug)]
pub struct Subscription {
    inbox: Receiver<LedgerEvent>,
}

impl Subscription {
    /// A connected sender/subscription pair for backends to hand out.
    pub fn channel() -> (Sender<LedgerEvent>, Subscription) {
        let (tx, rx) = mpsc::channel();
        (tx, Subscription { inbox: rx })
    }

    /// Drain all pushes received so far. Never blocks.
    pub fn poll(&self) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.inbox.try_recv() {
            events.push(event);
        }
        events
    }

    /// True once the backend has dropped its sender and nothing is queued.
    pub fn is_closed(&self) -> bool {
        matches!(self.inbox.try_recv(), Err(TryRecvError::Disconnected))
    }
}
