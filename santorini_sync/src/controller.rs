// Per-match synchronization controller.
//
// `MatchController` keeps a local, optimistic mirror of one match
// convergent with the match's append-only move ledger. It is the only
// place where local gestures, ledger pushes, and the local clock meet.
//
// State machine, in brief:
//
// - **Resync** (`resync()`): list the ledger, rebuild the mirror from the
//   newest importable embedded snapshot (or the initial snapshot) plus every
//   later entry, skipping entries the rules reject. Adopt the newest entry
//   clock unless that entry's clock is already adopted, so re-reading an
//   unchanged ledger keeps the local ticks and any expiry. While a resync is incomplete, `syncing` is set and gestures get
//   `PleaseWait`. A transport failure keeps the last good mirror, queues a
//   `Retry` notice, and leaves `syncing` set so the next `pump` retries.
//
// - **Gesture** (`submit_action`, `click`, oracle turns): validated against
//   the mirror, applied optimistically, and recorded as the single pending
//   marker `{move_index = ledger length, action}`. A second gesture while
//   the marker exists is refused, never queued.
//
// - **Submission**: the marker is appended at its index with the current
//   clock (plus a snapshot when the embedding policy says so). A conflict
//   holding our own action means it was already stored; a conflict holding
//   any other action, or a gap, means our guess lost and a resync follows.
//
// - **Pushes** (`pump()`): our own echo clears the marker. A different
//   action at the marker's index is a protocol violation: the local move is
//   discarded and the mirror rebuilt. Any other new entry triggers one
//   resync per pump.
//
// - **Pending across resync**: if the ledger already holds the marker's
//   index, the marker resolves against that entry. Otherwise, if the index
//   is the new ledger length and the action is still legal for a local
//   side, it is re-applied and resubmitted; if not, it is dropped.
//
// - **Timeouts** (`advance_clock()`): an acknowledged append that is never
//   echoed, or a long silence while a remote side is to move, forces a
//   resync. The local clock ticks the side to move and raises a provisional
//   time loss at zero; only a ledger status change finishes the match.
//
// See also: `santorini_protocol::ledger` for the ledger contract,
// `santorini_sim::game` for the mirror's history type, `clock.rs`,
// `oracle.rs`, `notice.rs`, `config.rs`.
//
// Everything runs on the caller's thread. The controller never blocks
// except inside ledger calls and never spawns threads.

use santorini_protocol::{
    AppendOutcome, AppendRequest, ClockState, LedgerEntry, LedgerError, LedgerEvent, MatchId,
    MatchStatus, MoveIndex, MoveLedger, Role, Subscription,
};
use santorini_sim::selector::{MoveSelector, Selection};
use santorini_sim::types::{BOARD_SIZE, Coord, Player};
use santorini_sim::{Action, Game, Snapshot};
use tracing::{debug, info, warn};

use crate::clock::LocalClock;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::notice::Notice;
use crate::oracle::{MoveOracle, OracleTicket};

pub const fn role_of(player: Player) -> Role {
    match player {
        Player::Zero => Role::Player0,
        Player::One => Role::Player1,
    }
}

pub const fn player_of(role: Role) -> Player {
    match role {
        Role::Player0 => Player::Zero,
        Role::Player1 => Player::One,
    }
}

/// The single local move awaiting ledger confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingMove {
    pub move_index: MoveIndex,
    pub action: Action,
    pub role: Role,
    /// `Game::applied_count()` of the mirror right after applying `action`.
    pub expected_mirror_len: usize,
    /// The ledger acknowledged the append; waiting for the echo.
    pub submitted: bool,
    /// Local time spent waiting for the echo since the acknowledgment.
    pub waited_ms: u64,
}

pub struct MatchController<L: MoveLedger> {
    match_id: MatchId,
    local: [bool; 2],
    ledger: L,
    subscription: Option<Subscription>,
    config: SyncConfig,
    mirror: Game,
    selector: MoveSelector,
    /// Ledger entries the mirror accounts for (replayed or skipped).
    ledger_len: u64,
    pending: Option<PendingMove>,
    syncing: bool,
    failed_resyncs: u32,
    /// Bumped on every mirror change; stale oracle tickets compare against it.
    generation: u64,
    clock: LocalClock,
    /// Entry whose `ClockState` the clock last adopted. `None` while the
    /// clock still runs from `initial_clock_ms`.
    adopted_clock: Option<MoveIndex>,
    quiet_ms: u64,
    status: MatchStatus,
    notices: Vec<Notice>,
    detached: bool,
}

impl<L: MoveLedger> MatchController<L> {
    /// Subscribe to `match_id` and build the mirror from the ledger.
    /// `local_players` are the seats this client may move for (both for a
    /// hot-seat game, none for a spectator).
    ///
    /// Transport failures do not fail the attach: the controller starts in
    /// the syncing state and retries on `pump`. Only a ledger that does not
    /// know the match is an error.
    pub fn attach(
        ledger: L,
        match_id: MatchId,
        local_players: &[Player],
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        let mut local = [false; 2];
        for player in local_players {
            local[player.index()] = true;
        }
        let clock = LocalClock::new(config.initial_clock_ms, config.clock_tick_ms);
        let mut controller = Self {
            match_id,
            local,
            ledger,
            subscription: None,
            config,
            mirror: Game::new(),
            selector: MoveSelector::new(),
            ledger_len: 0,
            pending: None,
            syncing: true,
            failed_resyncs: 0,
            generation: 0,
            clock,
            adopted_clock: None,
            quiet_ms: 0,
            status: MatchStatus::Active,
            notices: Vec::new(),
            detached: false,
        };
        // Subscribe before listing so no entry falls between the two.
        controller.ensure_subscribed()?;
        controller.resync()?;
        Ok(controller)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The mirror's current snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        self.mirror.current()
    }

    pub fn game(&self) -> &Game {
        &self.mirror
    }

    pub fn ledger_len(&self) -> u64 {
        self.ledger_len
    }

    pub fn pending(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    pub fn is_local(&self, player: Player) -> bool {
        self.local[player.index()]
    }

    pub fn is_local_turn(&self) -> bool {
        self.is_local(self.snapshot().active_player())
    }

    /// True once the rules or the ledger have decided the match.
    pub fn is_over(&self) -> bool {
        self.status.is_finished() || self.snapshot().is_terminal()
    }

    /// The side whose local clock ran out, until the ledger decides.
    pub fn provisional_time_loss(&self) -> Option<Player> {
        if self.status.is_finished() {
            return None;
        }
        self.clock.expired()
    }

    /// Take every queued notice. Consecutive `Resynced` notices are merged
    /// into the newest one; other notices accumulate until drained.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // Local gestures
    // -----------------------------------------------------------------------

    /// Why a gesture would be refused right now, if it would.
    fn check_gesture(&self) -> Result<(), SyncError> {
        if self.detached {
            return Err(SyncError::Detached);
        }
        if self.syncing {
            return Err(SyncError::PleaseWait);
        }
        if let Some(pending) = &self.pending {
            return Err(SyncError::SubmissionPending {
                move_index: pending.move_index,
            });
        }
        if self.is_over() {
            return Err(SyncError::MatchOver);
        }
        if !self.is_local_turn() {
            return Err(SyncError::NotYourTurn);
        }
        Ok(())
    }

    /// Apply `action` to the mirror and submit it to the ledger. On error
    /// nothing changes. A transport failure during submission is not an
    /// error: the move stays applied and is retried on `pump`.
    pub fn submit_action(&mut self, action: Action) -> Result<(), SyncError> {
        self.check_gesture()?;
        let mover = self.snapshot().active_player();
        self.mirror.apply(action)?;
        self.generation += 1;
        self.selector.reset();
        self.pending = Some(PendingMove {
            move_index: MoveIndex(self.ledger_len),
            action,
            role: role_of(mover),
            expected_mirror_len: self.mirror.applied_count(),
            submitted: false,
            waited_ms: 0,
        });
        debug!(
            "{}: applied {action} locally as move {}",
            self.match_id, self.ledger_len
        );
        self.rearm_clock();
        self.submit_pending()
    }

    /// Feed one board click to the move selector. A completed selection is
    /// submitted like `submit_action`.
    pub fn click(&mut self, cell: Coord) -> Result<Selection, SyncError> {
        self.check_gesture()?;
        let selection = self.selector.click(self.mirror.current(), cell);
        if let Selection::Complete(action) = selection {
            self.submit_action(action)?;
        }
        Ok(selection)
    }

    /// Cells a click would accept. All false while gestures are refused.
    pub fn selectable(&self) -> [[bool; BOARD_SIZE]; BOARD_SIZE] {
        if self.check_gesture().is_err() {
            return [[false; BOARD_SIZE]; BOARD_SIZE];
        }
        self.selector.selectable(self.mirror.current())
    }

    pub fn reset_selection(&mut self) {
        self.selector.reset();
    }

    // -----------------------------------------------------------------------
    // Oracle turns
    // -----------------------------------------------------------------------

    /// Ask `oracle` for a move and submit it. `Ok(None)` if it passed.
    pub fn play_oracle_turn(
        &mut self,
        oracle: &mut impl MoveOracle,
    ) -> Result<Option<Action>, SyncError> {
        self.check_gesture()?;
        let Some(action) = oracle.suggest_action(self.mirror.current()) else {
            return Ok(None);
        };
        self.submit_action(action)?;
        Ok(Some(action))
    }

    /// Start an asynchronous oracle turn, if a local gesture is allowed now.
    pub fn begin_oracle_turn(&self) -> Option<OracleTicket> {
        self.check_gesture().ok()?;
        Some(OracleTicket::new(self.generation, *self.mirror.current()))
    }

    /// Submit an asynchronous oracle's answer. Returns `Ok(false)` and
    /// changes nothing if the ticket is stale.
    pub fn complete_oracle_turn(
        &mut self,
        ticket: OracleTicket,
        action: Action,
    ) -> Result<bool, SyncError> {
        if ticket.generation != self.generation {
            debug!("{}: dropping stale oracle answer {action}", self.match_id);
            return Ok(false);
        }
        self.submit_action(action)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Ledger traffic
    // -----------------------------------------------------------------------

    /// Process pushes, retry anything that failed earlier, and resync if
    /// something unexpected arrived. Call regularly from the update loop.
    pub fn pump(&mut self) -> Result<(), SyncError> {
        if self.detached {
            return Err(SyncError::Detached);
        }
        let mut needs_resync = self.syncing;
        if self.subscription.is_none() && self.ensure_subscribed()? {
            needs_resync = true;
        }

        let events = self
            .subscription
            .as_ref()
            .map(Subscription::poll)
            .unwrap_or_default();
        for event in events {
            self.quiet_ms = 0;
            match event {
                LedgerEvent::MoveAppended { entry } => {
                    needs_resync |= self.on_entry_pushed(&entry);
                }
                LedgerEvent::StatusChanged { status } => self.set_status(status),
            }
        }

        if needs_resync {
            self.resync()
        } else {
            self.submit_pending()
        }
    }

    /// Advance local time by `elapsed_ms`: tick the clock, and resync if an
    /// echo or a remote move is overdue.
    pub fn advance_clock(&mut self, elapsed_ms: u64) -> Result<(), SyncError> {
        if self.detached {
            return Err(SyncError::Detached);
        }
        if let Some(player) = self.clock.advance(elapsed_ms) {
            info!("{}: {player} ran out of time locally", self.match_id);
            self.notices.push(Notice::TimeExpired { player });
        }

        let mut overdue = false;
        if let Some(pending) = self.pending.as_mut().filter(|p| p.submitted) {
            pending.waited_ms = pending.waited_ms.saturating_add(elapsed_ms);
            if pending.waited_ms >= self.config.echo_timeout_ms {
                warn!(
                    "{}: no echo for move {} after {} ms",
                    self.match_id, pending.move_index, pending.waited_ms
                );
                overdue = true;
            }
        }
        self.quiet_ms = self.quiet_ms.saturating_add(elapsed_ms);
        if !self.is_over() && !self.is_local_turn() && self.quiet_ms >= self.config.idle_resync_ms
        {
            debug!("{}: quiet for {} ms, checking ledger", self.match_id, self.quiet_ms);
            overdue = true;
        }

        if overdue { self.resync() } else { Ok(()) }
    }

    /// Handle one `MoveAppended` push. Returns whether a resync is needed.
    fn on_entry_pushed(&mut self, entry: &LedgerEntry) -> bool {
        if let Some(pending) = self.pending.filter(|p| p.move_index == entry.move_index) {
            if entry.action == u32::from(pending.action.0) {
                self.confirm_pending(entry);
                return false;
            }
            warn!(
                "{}: ledger holds {} at {} but we applied {}",
                self.match_id, entry.action, entry.move_index, pending.action
            );
            self.notices.push(Notice::ConflictDiscarded {
                move_index: pending.move_index,
            });
            self.pending = None;
            return true;
        }
        if entry.move_index.0 < self.ledger_len {
            debug!(
                "{}: ignoring repeated push for {}",
                self.match_id, entry.move_index
            );
            return false;
        }
        true
    }

    fn confirm_pending(&mut self, entry: &LedgerEntry) {
        debug!("{}: move {} confirmed", self.match_id, entry.move_index);
        self.pending = None;
        self.ledger_len = entry.move_index.0 + 1;
        if let Some(clock) = entry.clock {
            self.adopt_clock(entry.move_index, clock);
        }
        self.rearm_clock();
    }

    /// Adopt the clock of entry `index` unless an entry at least as new was
    /// already adopted. Re-reading the same entry keeps the local ticks.
    fn adopt_clock(&mut self, index: MoveIndex, clock: ClockState) {
        if self.adopted_clock.is_some_and(|adopted| adopted >= index) {
            return;
        }
        self.clock.adopt(clock);
        self.adopted_clock = Some(index);
    }

    /// Append the pending marker if it has not been acknowledged yet.
    fn submit_pending(&mut self) -> Result<(), SyncError> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        if pending.submitted {
            return Ok(());
        }
        if self.mirror.applied_count() != pending.expected_mirror_len {
            return Ok(());
        }

        let index = pending.move_index;
        let snapshot = if self.config.embeds_snapshot_at(index.0) {
            self.mirror
                .current()
                .to_value()
                .map_err(|err| warn!("{}: snapshot export failed: {err}", self.match_id))
                .ok()
        } else {
            None
        };
        let request = AppendRequest {
            move_index: index,
            action: u32::from(pending.action.0),
            role: pending.role,
            clock: Some(self.clock.state()),
            snapshot,
        };

        match self.ledger.append(&self.match_id, request) {
            Ok(AppendOutcome::Appended) => {
                debug!("{}: move {index} acknowledged", self.match_id);
                if let Some(p) = self.pending.as_mut() {
                    p.submitted = true;
                    p.waited_ms = 0;
                }
                Ok(())
            }
            Ok(AppendOutcome::Conflict {
                existing: Some(existing),
            }) if existing.action == u32::from(pending.action.0) => {
                debug!("{}: move {index} was already stored", self.match_id);
                self.confirm_pending(&existing);
                Ok(())
            }
            Ok(AppendOutcome::Conflict {
                existing: Some(existing),
            }) => {
                warn!(
                    "{}: lost move {index} to {} from {:?}",
                    self.match_id, existing.action, existing.submitting_role
                );
                self.notices.push(Notice::ConflictDiscarded { move_index: index });
                self.pending = None;
                self.resync()
            }
            Ok(AppendOutcome::Conflict { existing: None }) => {
                warn!("{}: move {index} is past the end of the ledger", self.match_id);
                self.resync()
            }
            Err(LedgerError::Transport(reason)) => {
                warn!("{}: submitting move {index} failed: {reason}", self.match_id);
                self.notices.push(Notice::Retry { reason });
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn set_status(&mut self, status: MatchStatus) {
        if status == self.status {
            return;
        }
        info!("{}: status {:?} -> {status:?}", self.match_id, self.status);
        self.status = status;
        if status.is_finished() {
            self.notices.push(Notice::MatchFinished { status });
        }
        self.rearm_clock();
    }

    /// Run the clock for the side to move while the match is live.
    fn rearm_clock(&mut self) {
        if self.detached || self.is_over() {
            self.clock.disarm();
        } else {
            self.clock.arm(self.snapshot().active_player());
        }
    }

    /// Subscribe if not already. Returns whether a new subscription was made.
    /// Transport failures leave the controller unsubscribed for a later try.
    fn ensure_subscribed(&mut self) -> Result<bool, SyncError> {
        if self.subscription.is_some() {
            return Ok(false);
        }
        match self.ledger.subscribe(&self.match_id) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(true)
            }
            Err(LedgerError::Transport(reason)) => {
                warn!("{}: subscribe failed: {reason}", self.match_id);
                self.notices.push(Notice::Retry { reason });
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Resync
    // -----------------------------------------------------------------------

    /// Rebuild the mirror from the ledger. Idempotent; safe to call any time.
    pub fn resync(&mut self) -> Result<(), SyncError> {
        if self.detached {
            return Err(SyncError::Detached);
        }
        self.syncing = true;
        info!("{}: resync started", self.match_id);

        let (entries, status) = match self.fetch() {
            Ok(fetched) => fetched,
            Err(LedgerError::Transport(reason)) => {
                self.failed_resyncs += 1;
                warn!(
                    "{}: resync failed ({} in a row): {reason}",
                    self.match_id, self.failed_resyncs
                );
                self.notices.push(Notice::Retry { reason });
                if self.failed_resyncs >= self.config.max_resync_attempts {
                    return Err(SyncError::ResyncFailed {
                        attempts: self.failed_resyncs,
                    });
                }
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let mut mirror = self.rebuild(&entries);
        let ledger_len = entries.len() as u64;

        if let Some((index, clock)) = entries
            .iter()
            .rev()
            .find_map(|e| e.clock.map(|clock| (e.move_index, clock)))
        {
            self.adopt_clock(index, clock);
        }

        let pending = self
            .pending
            .take()
            .and_then(|p| self.carry_pending(p, &entries, &mut mirror, status));

        self.mirror = mirror;
        self.ledger_len = ledger_len;
        self.pending = pending;
        self.generation += 1;
        self.selector.reset();
        self.syncing = false;
        self.failed_resyncs = 0;
        self.quiet_ms = 0;
        self.set_status(status);
        self.rearm_clock();
        info!("{}: resync finished at length {ledger_len}", self.match_id);
        match self.notices.last_mut() {
            Some(Notice::Resynced { length }) => *length = ledger_len,
            _ => self.notices.push(Notice::Resynced { length: ledger_len }),
        }

        self.submit_pending()
    }

    fn fetch(&self) -> Result<(Vec<LedgerEntry>, MatchStatus), LedgerError> {
        let entries = self.ledger.list(&self.match_id)?;
        let status = self.ledger.status(&self.match_id)?;
        Ok((entries, status))
    }

    /// Mirror for `entries`: newest importable embedded snapshot, then every
    /// later entry the rules accept.
    fn rebuild(&mut self, entries: &[LedgerEntry]) -> Game {
        let (base, replay_from) = entries
            .iter()
            .rev()
            .find_map(|entry| {
                let value = entry.snapshot.as_ref()?;
                match Snapshot::from_value(value) {
                    Ok(snapshot) => Some((snapshot, entry.move_index.0 + 1)),
                    Err(err) => {
                        warn!(
                            "{}: unusable snapshot at {}: {err}",
                            self.match_id, entry.move_index
                        );
                        None
                    }
                }
            })
            .unwrap_or((Snapshot::initial(), 0));

        let mut mirror = Game::from_snapshot(base);
        for entry in entries.iter().filter(|e| e.move_index.0 >= replay_from) {
            let result = u16::try_from(entry.action)
                .map_err(|_| format!("action {} out of range", entry.action))
                .and_then(|a| mirror.apply(Action(a)).map(|_| ()).map_err(|e| e.to_string()));
            if let Err(reason) = result {
                warn!(
                    "{}: skipping entry {}: {reason}",
                    self.match_id, entry.move_index
                );
                self.notices.push(Notice::ReplaySkipped {
                    move_index: entry.move_index,
                    reason,
                });
            }
        }
        mirror
    }

    /// Decide what happens to a pending marker after the ledger was re-read.
    fn carry_pending(
        &mut self,
        pending: PendingMove,
        entries: &[LedgerEntry],
        mirror: &mut Game,
        status: MatchStatus,
    ) -> Option<PendingMove> {
        let index = pending.move_index;
        if let Some(stored) = entries.get(index.0 as usize) {
            if stored.action == u32::from(pending.action.0) {
                debug!("{}: move {index} found in ledger", self.match_id);
            } else {
                warn!(
                    "{}: move {index} was taken by {}",
                    self.match_id, stored.action
                );
                self.notices.push(Notice::ConflictDiscarded { move_index: index });
            }
            return None;
        }

        let mover = mirror.current().active_player();
        let reapply = index.0 == entries.len() as u64
            && !status.is_finished()
            && role_of(mover) == pending.role
            && self.is_local(mover)
            && mirror.apply(pending.action).is_ok();
        if !reapply {
            info!("{}: dropping local move {index}", self.match_id);
            self.notices.push(Notice::PendingDropped { move_index: index });
            return None;
        }
        debug!("{}: re-applied local move {index}", self.match_id);
        Some(PendingMove {
            expected_mirror_len: mirror.applied_count(),
            submitted: false,
            waited_ms: 0,
            ..pending
        })
    }

    /// Stop all activity: the clock stops, the subscription is dropped, and
    /// every later call fails with `Detached`.
    pub fn detach(&mut self) {
        info!("{}: detached", self.match_id);
        self.detached = true;
        self.clock.disarm();
        self.subscription = None;
        self.selector.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use santorini_ledger::MemoryLedger;
    use santorini_protocol::FinishReason;
    use santorini_sim::rules;

    use super::*;
    use crate::oracle::FirstLegalOracle;

    fn request(index: u64, action: u16, role: Role) -> AppendRequest {
        AppendRequest {
            move_index: MoveIndex(index),
            action: u32::from(action),
            role,
            clock: None,
            snapshot: None,
        }
    }

    fn setup(local: &[Player]) -> (Arc<MemoryLedger>, MatchController<Arc<MemoryLedger>>) {
        let ledger = Arc::new(MemoryLedger::new());
        let id = ledger.create_match();
        let controller =
            MatchController::attach(Arc::clone(&ledger), id, local, SyncConfig::default()).unwrap();
        (ledger, controller)
    }

    fn replay(actions: &[u16]) -> Snapshot {
        actions.iter().fold(Snapshot::initial(), |s, &a| {
            rules::apply_action(&s, Action(a)).unwrap()
        })
    }

    #[test]
    fn attach_to_empty_match() {
        let (_, mut controller) = setup(&[Player::Zero]);
        assert!(!controller.is_syncing());
        assert_eq!(controller.ledger_len(), 0);
        assert_eq!(*controller.snapshot(), Snapshot::initial());
        assert_eq!(
            controller.drain_notices(),
            vec![Notice::Resynced { length: 0 }]
        );
        assert!(controller.drain_notices().is_empty());
    }

    #[test]
    fn local_move_is_appended_and_confirmed_by_echo() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        controller.submit_action(Action(12)).unwrap();
        let pending = *controller.pending().unwrap();
        assert_eq!(pending.move_index, MoveIndex(0));
        assert!(pending.submitted);
        assert_eq!(ledger.len(controller.match_id()), 1);

        controller.pump().unwrap();
        assert!(controller.pending().is_none());
        assert_eq!(controller.ledger_len(), 1);
        assert_eq!(*controller.snapshot(), replay(&[12]));
    }

    #[test]
    fn second_gesture_is_refused_while_pending() {
        let (_, mut controller) = setup(&[Player::Zero]);
        controller.submit_action(Action(12)).unwrap();
        assert!(matches!(
            controller.submit_action(Action(1)),
            Err(SyncError::SubmissionPending {
                move_index: MoveIndex(0)
            })
        ));
        assert_eq!(controller.game().applied_count(), 1);
    }

    #[test]
    fn illegal_and_remote_turn_gestures_are_rejected() {
        let (_, mut controller) = setup(&[Player::One]);
        assert!(matches!(
            controller.submit_action(Action(12)),
            Err(SyncError::NotYourTurn)
        ));

        let (_, mut controller) = setup(&[Player::Zero]);
        assert!(matches!(
            controller.submit_action(Action(500)),
            Err(SyncError::Rules(_))
        ));
        assert!(controller.pending().is_none());
        assert_eq!(*controller.snapshot(), Snapshot::initial());
    }

    #[test]
    fn replaying_entries_matches_direct_play() {
        let ledger = Arc::new(MemoryLedger::new());
        let id = ledger.create_match();
        for (i, a) in [0u16, 1, 2].into_iter().enumerate() {
            let role = if i < 2 { Role::Player0 } else { Role::Player1 };
            ledger.append(&id, request(i as u64, a, role)).unwrap();
        }
        let controller =
            MatchController::attach(Arc::clone(&ledger), id, &[], SyncConfig::default()).unwrap();
        assert_eq!(*controller.snapshot(), replay(&[0, 1, 2]));
        assert_eq!(controller.ledger_len(), 3);
    }

    #[test]
    fn newest_embedded_snapshot_is_the_base() {
        let ledger = Arc::new(MemoryLedger::new());
        let id = ledger.create_match();
        ledger.append(&id, request(0, 12, Role::Player0)).unwrap();
        let mut second = request(1, 1, Role::Player0);
        second.snapshot = Some(replay(&[12, 1]).to_value().unwrap());
        ledger.append(&id, second).unwrap();
        ledger.append(&id, request(2, 24, Role::Player1)).unwrap();

        let controller =
            MatchController::attach(Arc::clone(&ledger), id, &[], SyncConfig::default()).unwrap();
        assert_eq!(*controller.snapshot(), replay(&[12, 1, 24]));
        assert_eq!(*controller.game().base(), replay(&[12, 1]));
        assert_eq!(controller.game().applied_count(), 1);
    }

    #[test]
    fn broken_snapshot_falls_back_to_replay() {
        let ledger = Arc::new(MemoryLedger::new());
        let id = ledger.create_match();
        let mut first = request(0, 12, Role::Player0);
        first.snapshot = Some(serde_json::json!({"version": 9}));
        ledger.append(&id, first).unwrap();

        let controller =
            MatchController::attach(Arc::clone(&ledger), id, &[], SyncConfig::default()).unwrap();
        assert_eq!(*controller.snapshot(), replay(&[12]));
    }

    #[test]
    fn illegal_entry_is_skipped_with_notice() {
        let ledger = Arc::new(MemoryLedger::new());
        let id = ledger.create_match();
        ledger.append(&id, request(0, 12, Role::Player0)).unwrap();
        ledger.append(&id, request(1, 12, Role::Player0)).unwrap();
        ledger.append(&id, request(2, 1, Role::Player0)).unwrap();

        let mut controller =
            MatchController::attach(Arc::clone(&ledger), id, &[], SyncConfig::default()).unwrap();
        assert_eq!(*controller.snapshot(), replay(&[12, 1]));
        assert_eq!(controller.ledger_len(), 3);
        let notices = controller.drain_notices();
        assert!(notices.iter().any(|n| matches!(
            n,
            Notice::ReplaySkipped {
                move_index: MoveIndex(1),
                ..
            }
        )));
    }

    #[test]
    fn offline_submission_is_retried_on_pump() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        controller.drain_notices();
        ledger.set_offline(true);
        controller.submit_action(Action(12)).unwrap();
        assert!(!controller.pending().unwrap().submitted);
        assert!(matches!(
            controller.drain_notices().as_slice(),
            [Notice::Retry { .. }]
        ));

        ledger.set_offline(false);
        controller.pump().unwrap();
        assert!(controller.pending().unwrap().submitted);
        controller.pump().unwrap();
        assert!(controller.pending().is_none());
        assert_eq!(controller.ledger_len(), 1);
    }

    #[test]
    fn offline_resync_keeps_mirror_and_waits() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        controller.submit_action(Action(12)).unwrap();
        controller.pump().unwrap();
        ledger.set_offline(true);
        controller.resync().unwrap();
        assert!(controller.is_syncing());
        assert_eq!(*controller.snapshot(), replay(&[12]));
        assert!(matches!(
            controller.submit_action(Action(1)),
            Err(SyncError::PleaseWait)
        ));

        ledger.set_offline(false);
        controller.pump().unwrap();
        assert!(!controller.is_syncing());
        controller.submit_action(Action(1)).unwrap();
    }

    #[test]
    fn repeated_resync_failures_are_reported() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        ledger.set_offline(true);
        controller.resync().unwrap();
        controller.pump().unwrap();
        assert!(matches!(
            controller.pump(),
            Err(SyncError::ResyncFailed { attempts: 3 })
        ));
        ledger.set_offline(false);
        controller.pump().unwrap();
        assert!(!controller.is_syncing());
    }

    #[test]
    fn conflicting_append_discards_local_move() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        // Someone else already stored move 0.
        ledger
            .append(controller.match_id(), request(0, 7, Role::Player0))
            .unwrap();
        controller.drain_notices();
        controller.submit_action(Action(12)).unwrap();

        assert!(controller.pending().is_none());
        assert_eq!(*controller.snapshot(), replay(&[7]));
        let notices = controller.drain_notices();
        assert!(notices.contains(&Notice::ConflictDiscarded {
            move_index: MoveIndex(0)
        }));
    }

    #[test]
    fn already_stored_action_counts_as_confirmed() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        ledger
            .append(controller.match_id(), request(0, 12, Role::Player0))
            .unwrap();
        controller.submit_action(Action(12)).unwrap();
        assert!(controller.pending().is_none());
        assert_eq!(controller.ledger_len(), 1);
    }

    #[test]
    fn lost_echo_times_out_into_resync() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        ledger.drop_notifications(1);
        controller.submit_action(Action(12)).unwrap();
        controller.pump().unwrap();
        assert!(controller.pending().is_some());

        controller.advance_clock(4_000).unwrap();
        assert!(controller.pending().is_some());
        controller.advance_clock(1_000).unwrap();
        assert!(controller.pending().is_none());
        assert_eq!(controller.ledger_len(), 1);
    }

    #[test]
    fn clock_runs_for_side_to_move_and_adopts_entries() {
        let config = SyncConfig {
            initial_clock_ms: 1_000,
            ..SyncConfig::default()
        };
        let ledger = Arc::new(MemoryLedger::new());
        let id = ledger.create_match();
        let mut controller =
            MatchController::attach(Arc::clone(&ledger), id.clone(), &[Player::Zero], config)
                .unwrap();
        assert_eq!(controller.clock().running(), Some(Player::Zero));
        controller.advance_clock(250).unwrap();
        assert_eq!(controller.clock().remaining(Player::Zero), 800);

        controller.submit_action(Action(12)).unwrap();
        let stored = ledger.list(&id).unwrap();
        assert_eq!(stored[0].clock, Some(ClockState::new(800, 1_000)));

        controller.advance_clock(800).unwrap();
        assert_eq!(controller.provisional_time_loss(), Some(Player::Zero));
        assert!(
            controller
                .drain_notices()
                .contains(&Notice::TimeExpired {
                    player: Player::Zero
                })
        );
    }

    #[test]
    fn resync_without_new_entries_keeps_local_clock() {
        let config = SyncConfig {
            initial_clock_ms: 1_000,
            ..SyncConfig::default()
        };
        let ledger = Arc::new(MemoryLedger::new());
        let id = ledger.create_match();
        let mut controller =
            MatchController::attach(Arc::clone(&ledger), id, &[Player::One], config).unwrap();

        controller.advance_clock(400).unwrap();
        controller.resync().unwrap();
        assert_eq!(controller.clock().remaining(Player::Zero), 600);

        controller.advance_clock(600).unwrap();
        controller.resync().unwrap();
        assert_eq!(controller.clock().remaining(Player::Zero), 0);
        assert_eq!(controller.provisional_time_loss(), Some(Player::Zero));
    }

    #[test]
    fn repeated_resyncs_queue_one_notice() {
        let (_, mut controller) = setup(&[]);
        controller.resync().unwrap();
        controller.resync().unwrap();
        assert_eq!(
            controller.drain_notices(),
            vec![Notice::Resynced { length: 0 }]
        );
    }

    #[test]
    fn status_push_finishes_match_and_stops_clock() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        let status = MatchStatus::Finished {
            winner: Some(Role::Player1),
            reason: FinishReason::Time,
        };
        ledger.set_status(controller.match_id(), status).unwrap();
        controller.pump().unwrap();
        assert_eq!(controller.status(), status);
        assert_eq!(controller.clock().running(), None);
        assert!(matches!(
            controller.submit_action(Action(12)),
            Err(SyncError::MatchOver)
        ));
        assert!(
            controller
                .drain_notices()
                .contains(&Notice::MatchFinished { status })
        );
    }

    #[test]
    fn clicks_drive_a_placement() {
        let (_, mut controller) = setup(&[Player::Zero]);
        assert!(controller.selectable()[2][2]);
        assert_eq!(
            controller.click(Coord::new(2, 2)).unwrap(),
            Selection::Complete(Action(12))
        );
        assert!(matches!(
            controller.click(Coord::new(0, 0)),
            Err(SyncError::SubmissionPending { .. })
        ));
        assert!(controller.selectable().iter().flatten().all(|&b| !b));
    }

    #[test]
    fn oracle_turn_and_stale_ticket() {
        let (_, mut controller) = setup(&[Player::Zero]);
        let played = controller.play_oracle_turn(&mut FirstLegalOracle).unwrap();
        assert_eq!(played, Some(Action(0)));
        controller.pump().unwrap();

        let ticket = controller.begin_oracle_turn().unwrap();
        assert_eq!(*ticket.snapshot(), replay(&[0]));
        let stale = ticket.clone();
        assert!(controller.complete_oracle_turn(ticket, Action(1)).unwrap());
        controller.pump().unwrap();
        assert!(!controller.complete_oracle_turn(stale, Action(2)).unwrap());
        assert_eq!(controller.ledger_len(), 2);
    }

    #[test]
    fn detach_stops_everything() {
        let (ledger, mut controller) = setup(&[Player::Zero]);
        controller.detach();
        assert_eq!(controller.clock().running(), None);
        assert!(matches!(controller.pump(), Err(SyncError::Detached)));
        assert!(matches!(
            controller.submit_action(Action(12)),
            Err(SyncError::Detached)
        ));
        assert!(matches!(
            controller.advance_clock(100),
            Err(SyncError::Detached)
        ));
        ledger
            .append(controller.match_id(), request(0, 12, Role::Player0))
            .unwrap();
        assert_eq!(ledger.subscriber_count(controller.match_id()), 0);
    }

    #[test]
    fn unknown_match_fails_attach() {
        let ledger = Arc::new(MemoryLedger::new());
        let result = MatchController::attach(
            ledger,
            MatchId::new("missing"),
            &[Player::Zero],
            SyncConfig::default(),
        );
        assert!(matches!(
            result,
            Err(SyncError::Ledger(LedgerError::UnknownMatch(_)))
        ));
    }
}
