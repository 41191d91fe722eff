// Game history: a base snapshot plus the actions applied on top of it.
//
// `Game` owns every snapshot reached so far and a cursor into that list.
// Undo and redo only move the cursor; snapshots are immutable and never
// rebuilt. Applying a new action while the cursor is behind the newest
// snapshot discards the redo tail first.
//
// The base is usually `Snapshot::initial()`, but `restore()` can re-root the
// history at an imported snapshot (the sync controller does this when a
// ledger entry carries an embedded snapshot).
//
// See also: `rules.rs` for the transitions, the sync crate's controller for
// the optimistic mirror built on this type.

use crate::codec::Action;
use crate::error::RulesError;
use crate::rules::{ClassicRules, Ruleset};
use crate::snapshot::Snapshot;
use crate::types::Player;

#[derive(Clone, Debug)]
pub struct Game<R = ClassicRules> {
    rules: R,
    /// `states[0]` is the base; `states[i + 1]` follows from `actions[i]`.
    states: Vec<Snapshot>,
    actions: Vec<Action>,
    cursor: usize,
}

impl Game<ClassicRules> {
    /// A new game on the empty board.
    pub fn new() -> Self {
        Self::with_rules(ClassicRules, Snapshot::initial())
    }

    /// A new game rooted at `base`.
    pub fn from_snapshot(base: Snapshot) -> Self {
        Self::with_rules(ClassicRules, base)
    }
}

impl Default for Game<ClassicRules> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Ruleset> Game<R> {
    pub fn with_rules(rules: R, base: Snapshot) -> Self {
        Self {
            rules,
            states: vec![base],
            actions: Vec::new(),
            cursor: 0,
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn current(&self) -> &Snapshot {
        &self.states[self.cursor]
    }

    pub fn base(&self) -> &Snapshot {
        &self.states[0]
    }

    pub fn legal_actions(&self) -> Vec<Action> {
        self.rules.legal_actions(self.current())
    }

    /// Apply `action` to the current snapshot, discarding any redo tail.
    /// On error nothing changes.
    pub fn apply(&mut self, action: Action) -> Result<&Snapshot, RulesError> {
        let next = self.rules.apply_action(self.current(), action)?;
        self.states.truncate(self.cursor + 1);
        self.actions.truncate(self.cursor);
        self.states.push(next);
        self.actions.push(action);
        self.cursor += 1;
        Ok(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    /// Step back one action. Returns `false` at the base.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Step forward one undone action. Returns `false` if nothing to redo.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Actions applied between the base and the current snapshot.
    pub fn applied_count(&self) -> usize {
        self.cursor
    }

    /// The actions leading from the base to the current snapshot.
    pub fn actions(&self) -> &[Action] {
        &self.actions[..self.cursor]
    }

    pub fn last_action(&self) -> Option<Action> {
        self.actions().last().copied()
    }

    /// Undo back to the start of `player`'s most recent turn, so the
    /// current snapshot is the one in which they were about to act. During
    /// placement a turn spans both of a player's placements. Returns `false`
    /// if `player` has not acted since the base.
    pub fn revert_turn(&mut self, player: Player) -> bool {
        let Some(mut start) = (0..self.cursor)
            .rev()
            .find(|&i| self.states[i].active_player() == player)
        else {
            return false;
        };
        while start > 0 && self.states[start - 1].active_player() == player {
            start -= 1;
        }
        self.cursor = start;
        true
    }

    /// Re-root the history at `base`, dropping everything else.
    pub fn restore(&mut self, base: Snapshot) {
        self.states = vec![base];
        self.actions.clear();
        self.cursor = 0;
    }
}
