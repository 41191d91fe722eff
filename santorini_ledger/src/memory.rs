// Append-only per-match move logs held in memory.
//
// `MemoryLedger` keeps a `BTreeMap<MatchId, MatchLog>` behind one `Mutex`.
// Every trait call takes the lock for its whole duration, so appends are
// linearizable: two clients racing for the same index see exactly one
// `Appended` and one `Conflict`.
//
// Append rules:
// - index == log length: stored, then broadcast as `MoveAppended`.
// - index < length: `Conflict { existing: Some(entry at index) }`.
// - index > length: `Conflict { existing: None }` (the client skipped ahead).
// - finished match: rejected like a gap, since no index is free any more.
//
// Broadcast sends to every subscriber's `mpsc::Sender` and prunes the ones
// whose receiver was dropped.
//
// Fault injection (for tests):
// - `set_offline(true)`: every trait call fails with `LedgerError::Transport`.
// - `drop_notifications(n)`: the next `n` broadcasts reach nobody.
// - `inject_event()`: deliver an arbitrary push, bypassing the log, to model
//   a misbehaving or stale backend.
//
// See also: `santorini_protocol::ledger` for the trait, the relay-style
// session bookkeeping this mirrors, and `santorini_sync` for the client.

use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard, PoisonError};

use santorini_protocol::{
    AppendOutcome, AppendRequest, LedgerEntry, LedgerError, LedgerEvent, MatchId, MatchStatus,
    MoveIndex, MoveLedger, Subscription,
};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    matches: BTreeMap<MatchId, MatchLog>,
    offline: bool,
    dropped_pushes_remaining: usize,
    next_match: u64,
}

#[derive(Debug)]
struct MatchLog {
    entries: Vec<LedgerEntry>,
    status: MatchStatus,
    subscribers: Vec<Sender<LedgerEvent>>,
}

impl MatchLog {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            status: MatchStatus::Active,
            subscribers: Vec::new(),
        }
    }
}

impl LedgerState {
    fn online(&self) -> Result<(), LedgerError> {
        if self.offline {
            return Err(LedgerError::Transport("ledger offline".into()));
        }
        Ok(())
    }

    fn log_mut(&mut self, match_id: &MatchId) -> Result<&mut MatchLog, LedgerError> {
        self.matches
            .get_mut(match_id)
            .ok_or_else(|| LedgerError::UnknownMatch(match_id.clone()))
    }

    fn log(&self, match_id: &MatchId) -> Result<&MatchLog, LedgerError> {
        self.matches
            .get(match_id)
            .ok_or_else(|| LedgerError::UnknownMatch(match_id.clone()))
    }

    /// Send `event` to every live subscriber of `match_id`, unless a
    /// dropped-push fault is pending.
    fn broadcast(&mut self, match_id: &MatchId, event: LedgerEvent) {
        if self.dropped_pushes_remaining > 0 {
            self.dropped_pushes_remaining -= 1;
            debug!("dropping push for {match_id}");
            return;
        }
        if let Some(log) = self.matches.get_mut(match_id) {
            log.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new, empty, active match with a generated id.
    pub fn create_match(&self) -> MatchId {
        let mut state = self.lock();
        let id = MatchId(format!("match-{}", state.next_match));
        state.next_match += 1;
        state.matches.insert(id.clone(), MatchLog::new());
        info!("created {id}");
        id
    }

    /// Open a match under a caller-chosen id. Returns `false` (and leaves
    /// the existing log alone) if the id is taken.
    pub fn create_match_with_id(&self, id: MatchId) -> bool {
        let mut state = self.lock();
        if state.matches.contains_key(&id) {
            return false;
        }
        info!("created {id}");
        state.matches.insert(id, MatchLog::new());
        true
    }

    /// Change the match status and push it to subscribers.
    pub fn set_status(&self, match_id: &MatchId, status: MatchStatus) -> Result<(), LedgerError> {
        let mut state = self.lock();
        state.log_mut(match_id)?.status = status;
        info!("{match_id} status is now {status:?}");
        state.broadcast(match_id, LedgerEvent::StatusChanged { status });
        Ok(())
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Silently swallow the next `count` broadcasts.
    pub fn drop_notifications(&self, count: usize) {
        self.lock().dropped_pushes_remaining = count;
    }

    /// Push `event` to the match's subscribers without touching the log.
    pub fn inject_event(&self, match_id: &MatchId, event: LedgerEvent) -> Result<(), LedgerError> {
        let mut state = self.lock();
        state.log(match_id)?;
        state.broadcast(match_id, event);
        Ok(())
    }

    /// Live subscriber count, after pruning on the last broadcast.
    pub fn subscriber_count(&self, match_id: &MatchId) -> usize {
        self.lock()
            .matches
            .get(match_id)
            .map_or(0, |log| log.subscribers.len())
    }
}

impl MoveLedger for MemoryLedger {
    fn append(
        &self,
        match_id: &MatchId,
        request: AppendRequest,
    ) -> Result<AppendOutcome, LedgerError> {
        let mut state = self.lock();
        state.online()?;
        let log = state.log_mut(match_id)?;
        let len = log.entries.len() as u64;
        let index = request.move_index.0;

        if index < len {
            let existing = log.entries.get(index as usize).cloned();
            debug!("{match_id}: append at {index} conflicts with stored entry");
            return Ok(AppendOutcome::Conflict { existing });
        }
        if index > len || log.status.is_finished() {
            debug!("{match_id}: append at {index} rejected (length {len})");
            return Ok(AppendOutcome::Conflict { existing: None });
        }

        let entry = request.into_entry(match_id.clone());
        log.entries.push(entry.clone());
        debug!(
            "{match_id}: appended {} at {}",
            entry.action, entry.move_index
        );
        state.broadcast(match_id, LedgerEvent::MoveAppended { entry });
        Ok(AppendOutcome::Appended)
    }

    fn list(&self, match_id: &MatchId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.lock();
        state.online()?;
        Ok(state.log(match_id)?.entries.clone())
    }

    fn status(&self, match_id: &MatchId) -> Result<MatchStatus, LedgerError> {
        let state = self.lock();
        state.online()?;
        Ok(state.log(match_id)?.status)
    }

    fn subscribe(&self, match_id: &MatchId) -> Result<Subscription, LedgerError> {
        let mut state = self.lock();
        state.online()?;
        let (tx, subscription) = Subscription::channel();
        state.log_mut(match_id)?.subscribers.push(tx);
        Ok(subscription)
    }
}

impl MemoryLedger {
    /// Number of entries in the match log (0 for unknown matches).
    pub fn len(&self, match_id: &MatchId) -> usize {
        self.lock()
            .matches
            .get(match_id)
            .map_or(0, |log| log.entries.len())
    }

    /// Index the next append must use.
    pub fn next_index(&self, match_id: &MatchId) -> MoveIndex {
        MoveIndex(self.len(match_id) as u64)
    }
}
