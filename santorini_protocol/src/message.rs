// Ledger records and push events.
//
// - `LedgerEntry`: one accepted move in a match's append-only log.
// - `AppendRequest`: what a client submits; the backend stamps the match id.
// - `AppendOutcome`: result of an append that reached the backend.
// - `LedgerEvent`: pushed to subscribers when the log or status changes.
// - `MatchStatus` / `FinishReason`: lifecycle of a match as the backend sees it.
//
// Actions are carried as plain integers and snapshots as opaque JSON values.
// The ledger never interprets either, which keeps this crate independent of
// the rules crate. Field names serialize in camelCase
// (`{matchId, moveIndex, action, submittingRole, clock?, snapshot?}`).

use serde::{Deserialize, Serialize};

use crate::types::{MatchId, MoveIndex, Role};

/// Remaining time on each side's clock, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    #[serde(rename = "aMs")]
    pub player0_remaining_ms: u64,
    #[serde(rename = "bMs")]
    pub player1_remaining_ms: u64,
}

impl ClockState {
    pub const fn new(player0_remaining_ms: u64, player1_remaining_ms: u64) -> Self {
        Self {
            player0_remaining_ms,
            player1_remaining_ms,
        }
    }

    /// Both sides start with `ms` remaining.
    pub const fn even(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    pub const fn remaining(&self, role: Role) -> u64 {
        match role {
            Role::Player0 => self.player0_remaining_ms,
            Role::Player1 => self.player1_remaining_ms,
        }
    }
}

/// An accepted move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub match_id: MatchId,
    pub move_index: MoveIndex,
    pub action: u32,
    pub submitting_role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<ClockState>,
    /// Full game snapshot after this move, in the rules crate's canonical
    /// JSON format. Optional; clients may resync from the newest one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
}

/// A move submitted for the next free index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendRequest {
    pub move_index: MoveIndex,
    pub action: u32,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<ClockState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
}

impl AppendRequest {
    pub fn into_entry(self, match_id: MatchId) -> LedgerEntry {
        LedgerEntry {
            match_id,
            move_index: self.move_index,
            action: self.action,
            submitting_role: self.role,
            clock: self.clock,
            snapshot: self.snapshot,
        }
    }
}

/// Result of an append the backend processed.
#[derive(Clone, Debug, PartialEq)]
pub enum AppendOutcome {
    /// Stored at the requested index.
    Appended,
    /// The index was not the next free one. `existing` holds the entry
    /// already at that index, or `None` if the index is past the end (a gap).
    Conflict { existing: Option<LedgerEntry> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishReason {
    Rules,
    Time,
    Resign,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum MatchStatus {
    Active,
    Finished {
        winner: Option<Role>,
        reason: FinishReason,
    },
}

impl MatchStatus {
    pub const fn is_finished(&self) -> bool {
        matches!(self, MatchStatus::Finished { .. })
    }
}

/// Pushed to every subscriber of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum LedgerEvent {
    MoveAppended { entry: LedgerEntry },
    StatusChanged { status: MatchStatus },
}
