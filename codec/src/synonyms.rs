//! Static vocabulary tables mapping implementation-specific phase and
//! field names onto the canonical model.
//!
//! Both tables carry identity entries for canonical names, so resolving an
//! already-canonical token returns it unchanged. Lookups are exposed for
//! external tooling; the tables are built once and never mutated.

use std::collections::HashMap;

use anuvad_types::Phase;
use once_cell::sync::Lazy;

/// The canonical fields a structured key can route into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Height,
    Round,
    View,
    BlockHash,
    PrevHash,
    Timestamp,
    Proposer,
    Validator,
    Signature,
    CommitSeals,
    ViewChanges,
}

impl CanonicalField {
    /// The canonical lower-snake wire key for this field.
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Height => "height",
            CanonicalField::Round => "round",
            CanonicalField::View => "view",
            CanonicalField::BlockHash => "block_hash",
            CanonicalField::PrevHash => "prev_hash",
            CanonicalField::Timestamp => "timestamp",
            CanonicalField::Proposer => "proposer",
            CanonicalField::Validator => "validator",
            CanonicalField::Signature => "signature",
            CanonicalField::CommitSeals => "commit_seals",
            CanonicalField::ViewChanges => "view_changes",
        }
    }
}

static PHASE_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Canonical names map to themselves
        ("Proposal", "Proposal"),
        ("Prepare", "Prepare"),
        ("Vote", "Vote"),
        ("Commit", "Commit"),
        ("ViewChange", "ViewChange"),
        ("NewView", "NewView"),
        // Proposal phase: PBFT pre-prepare, Tendermint/HotStuff propose
        ("Propose", "Proposal"),
        ("PrePrepare", "Proposal"),
        ("Pre-Prepare", "Proposal"),
        ("Announce", "Proposal"),
        // Prepare phase
        ("Prepared", "Prepare"),
        ("Vote_Prepare", "Prepare"),
        ("PrepareVote", "Prepare"),
        // Commit phase: Tendermint precommit, HotStuff commit vote
        ("Precommit", "Commit"),
        ("Vote_Commit", "Commit"),
        ("CommitVote", "Commit"),
        ("Committed", "Commit"),
        // View change: IBFT round change
        ("RoundChange", "ViewChange"),
        ("Round_Change", "ViewChange"),
        ("View_Change", "ViewChange"),
        ("ChangeView", "ViewChange"),
        // New view
        ("New_View", "NewView"),
        ("NewRound", "NewView"),
    ])
});

static FIELD_SYNONYMS: Lazy<HashMap<&'static str, CanonicalField>> = Lazy::new(|| {
    use CanonicalField::*;
    HashMap::from([
        // height
        ("height", Height),
        ("Height", Height),
        ("seq_num", Height),
        ("seqNum", Height),
        ("sequence", Height),
        ("block_height", Height),
        ("blockHeight", Height),
        // round / epoch
        ("round", Round),
        ("Round", Round),
        ("round_num", Round),
        ("round_number", Round),
        ("epoch", Round),
        // view
        ("view", View),
        ("View", View),
        ("view_num", View),
        ("view_number", View),
        ("viewNumber", View),
        // block hash
        ("block_hash", BlockHash),
        ("BlockHash", BlockHash),
        ("blockHash", BlockHash),
        ("block_digest", BlockHash),
        ("digest", BlockHash),
        // previous block hash
        ("prev_hash", PrevHash),
        ("PrevHash", PrevHash),
        ("prevHash", PrevHash),
        ("parent_hash", PrevHash),
        ("parentHash", PrevHash),
        ("prev_block_hash", PrevHash),
        // timestamp
        ("timestamp", Timestamp),
        ("Timestamp", Timestamp),
        ("time", Timestamp),
        ("ts", Timestamp),
        ("created_at", Timestamp),
        ("createdAt", Timestamp),
        // proposer
        ("proposer", Proposer),
        ("Proposer", Proposer),
        ("leader", Proposer),
        ("primary", Proposer),
        ("author", Proposer),
        // validator
        ("validator", Validator),
        ("Validator", Validator),
        ("voter", Validator),
        ("replica", Validator),
        // signature
        ("signature", Signature),
        ("Signature", Signature),
        ("sig", Signature),
        ("seal", Signature),
        // commit seals
        ("commit_seals", CommitSeals),
        ("CommitSeals", CommitSeals),
        ("commitSeals", CommitSeals),
        ("committed_seals", CommitSeals),
        ("committedSeals", CommitSeals),
        ("seals", CommitSeals),
        // view changes
        ("view_changes", ViewChanges),
        ("ViewChanges", ViewChanges),
        ("viewChanges", ViewChanges),
        ("vc_entries", ViewChanges),
        ("round_changes", ViewChanges),
        ("roundChanges", ViewChanges),
    ])
});

/// Canonical phase name for `alias`, if the alias is known.
pub fn phase_synonym(alias: &str) -> Option<&'static str> {
    PHASE_SYNONYMS.get(alias).copied()
}

/// Canonical field for `alias`, if the alias is known.
pub fn field_synonym(alias: &str) -> Option<CanonicalField> {
    FIELD_SYNONYMS.get(alias).copied()
}

/// Resolve a decoded phase token: known aliases normalize to the canonical
/// phase, everything else passes through verbatim (open vocabulary).
pub fn resolve_phase(token: &str) -> Phase {
    match phase_synonym(token) {
        Some(canonical) => Phase::from(canonical),
        None => Phase::Other(token.to_string()),
    }
}
