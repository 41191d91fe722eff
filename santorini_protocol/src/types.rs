// Core ID types for the move ledger contract.
//
// Lightweight newtypes used by `message.rs` (ledger entries and events) and
// by ledger backends (`santorini_ledger`). Matches are named by an opaque
// string the backend assigns; moves are numbered contiguously from 0 within
// a match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned match identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of an entry in a match's move log. Contiguous from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveIndex(pub u64);

impl MoveIndex {
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for MoveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat of the participant who submitted an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Player0,
    Player1,
}

impl Role {
    pub const fn index(self) -> usize {
        match self {
            Role::Player0 => 0,
            Role::Player1 => 1,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Role::Player0),
            1 => Some(Role::Player1),
            _ => None,
        }
    }
}
