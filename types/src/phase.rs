//! Canonical message phases.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Normalized consensus message phase.
///
/// The set of canonical phases is closed, but the tag itself is open: a
/// token that matches no canonical phase is carried verbatim in
/// [`Phase::Other`] rather than rejected, so messages from protocols with a
/// richer vocabulary still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Leader proposes a block
    Proposal,
    /// Validators acknowledge the proposal
    Prepare,
    /// Prepare + Commit combined (HotStuff-style protocols)
    Vote,
    /// Validators commit to the block
    Commit,
    /// A validator asks to move to a new view
    ViewChange,
    /// The new leader announces the new view
    NewView,
    /// Unrecognized phase token, passed through unchanged
    Other(String),
}

impl Phase {
    /// The canonical phase names, in protocol order.
    pub const CANONICAL: [&'static str; 6] = [
        "Proposal",
        "Prepare",
        "Vote",
        "Commit",
        "ViewChange",
        "NewView",
    ];

    /// The phase token as it appears on the canonical wire.
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Proposal => "Proposal",
            Phase::Prepare => "Prepare",
            Phase::Vote => "Vote",
            Phase::Commit => "Commit",
            Phase::ViewChange => "ViewChange",
            Phase::NewView => "NewView",
            Phase::Other(token) => token,
        }
    }

    /// Whether this is one of the six canonical phases.
    pub fn is_canonical(&self) -> bool {
        !matches!(self, Phase::Other(_))
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Other(String::new())
    }
}

impl From<&str> for Phase {
    fn from(token: &str) -> Self {
        match token {
            "Proposal" => Phase::Proposal,
            "Prepare" => Phase::Prepare,
            "Vote" => Phase::Vote,
            "Commit" => Phase::Commit,
            "ViewChange" => Phase::ViewChange,
            "NewView" => Phase::NewView,
            other => Phase::Other(other.to_string()),
        }
    }
}

impl From<String> for Phase {
    fn from(token: String) -> Self {
        match token.as_str() {
            "Proposal" => Phase::Proposal,
            "Prepare" => Phase::Prepare,
            "Vote" => Phase::Vote,
            "Commit" => Phase::Commit,
            "ViewChange" => Phase::ViewChange,
            "NewView" => Phase::NewView,
            _ => Phase::Other(token),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Phase::from(token))
    }
}
