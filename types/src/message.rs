//! The canonical message entity and its comparison helpers.

use chrono::{DateTime, SubsecRound, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;

/// One entry of a view-change justification list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewChangeEntry {
    /// View the validator wants to move to
    pub view: Option<BigInt>,
    /// Block height at the time of the request
    pub height: Option<BigInt>,
    /// Requesting validator ID
    pub validator: String,
    /// Validator signature over the request
    pub signature: String,
}

/// Canonical in-memory representation of one consensus message.
///
/// Every codec parses into this entity and serializes out of it. Numeric
/// protocol counters are arbitrary-precision so no implementation's height
/// or view number is ever truncated; everything the canonical model does
/// not recognize survives opaquely in [`extras`](Self::extras).
///
/// Equality ignores [`raw_payload`](Self::raw_payload) and the provenance
/// fields: two messages are equal when their canonical content is equal,
/// regardless of which wire format produced them.
#[derive(Debug, Clone, Default)]
pub struct AbstractMessage {
    /// Message phase (open tag, see [`crate::Phase`])
    pub phase: crate::Phase,
    /// Block height, absent when the source carried none (absent != zero)
    pub height: Option<BigInt>,
    /// Round or epoch counter
    pub round: Option<BigInt>,
    /// View number
    pub view: Option<BigInt>,
    /// Message creation time, UTC, second granularity after canonicalization
    pub timestamp: Option<DateTime<Utc>>,
    /// Hash of the proposed block
    pub block_hash: Option<String>,
    /// Hash of the previous block
    pub prev_hash: Option<String>,
    /// Proposer node ID
    pub proposer: Option<String>,
    /// Validator node ID
    pub validator: Option<String>,
    /// Message signature
    pub signature: Option<String>,
    /// Commit seals, order-significant
    pub commit_seals: Vec<String>,
    /// View-change justification entries, order-significant
    pub view_changes: Vec<ViewChangeEntry>,
    /// Fields outside the canonical set, preserved opaquely across round
    /// trips in first-seen order
    pub extras: IndexMap<String, Vec<u8>>,
    /// Original input bytes, diagnostics only (excluded from equality)
    pub raw_payload: Vec<u8>,

    /// Format the message was parsed from (informational)
    pub original_format: Option<String>,
    /// Un-normalized message-type token as it appeared on the wire
    pub original_msg_name: Option<String>,
    /// Original field name -> canonical field name, for keys that were
    /// renamed during normalization
    pub original_field_names: IndexMap<String, String>,
}

impl PartialEq for AbstractMessage {
    fn eq(&self, other: &Self) -> bool {
        self.phase == other.phase
            && self.height == other.height
            && self.round == other.round
            && self.view == other.view
            && self.timestamp == other.timestamp
            && self.block_hash == other.block_hash
            && self.prev_hash == other.prev_hash
            && self.proposer == other.proposer
            && self.validator == other.validator
            && self.signature == other.signature
            && self.commit_seals == other.commit_seals
            && self.view_changes == other.view_changes
            && self.extras == other.extras
    }
}

impl Eq for AbstractMessage {}

impl AbstractMessage {
    /// A copy normalized for comparison: timestamp truncated to whole
    /// seconds, diagnostics and provenance cleared.
    ///
    /// Absent and present-but-empty `commit_seals`/`view_changes`/`extras`
    /// already share one representation here (empty containers), so the
    /// nil-to-empty canonicalization other runtimes need is a no-op.
    pub fn canonicalized(&self) -> Self {
        let mut out = self.clone();
        out.timestamp = out.timestamp.map(|t| t.trunc_subsecs(0));
        out.raw_payload = Vec::new();
        out.original_format = None;
        out.original_msg_name = None;
        out.original_field_names = IndexMap::new();
        out
    }

    /// Compare against `other` under a per-format field mask, returning one
    /// human-readable line per mismatching field. Empty means equal.
    pub fn diff_profiled(&self, other: &Self, profile: &CompareProfile) -> Vec<String> {
        let mut diffs = Vec::new();

        fn check<T: PartialEq + std::fmt::Debug>(
            diffs: &mut Vec<String>,
            enabled: bool,
            name: &str,
            a: &T,
            b: &T,
        ) {
            if enabled && a != b {
                diffs.push(format!("{name}: {a:?} != {b:?}"));
            }
        }

        check(&mut diffs, profile.phase, "phase", &self.phase, &other.phase);
        check(&mut diffs, profile.height, "height", &self.height, &other.height);
        check(&mut diffs, profile.round, "round", &self.round, &other.round);
        check(&mut diffs, profile.view, "view", &self.view, &other.view);
        check(
            &mut diffs,
            profile.timestamp,
            "timestamp",
            &self.timestamp,
            &other.timestamp,
        );
        check(
            &mut diffs,
            profile.block_hash,
            "block_hash",
            &self.block_hash,
            &other.block_hash,
        );
        check(
            &mut diffs,
            profile.prev_hash,
            "prev_hash",
            &self.prev_hash,
            &other.prev_hash,
        );
        check(
            &mut diffs,
            profile.proposer,
            "proposer",
            &self.proposer,
            &other.proposer,
        );
        check(
            &mut diffs,
            profile.validator,
            "validator",
            &self.validator,
            &other.validator,
        );
        check(
            &mut diffs,
            profile.signature,
            "signature",
            &self.signature,
            &other.signature,
        );
        check(
            &mut diffs,
            profile.commit_seals,
            "commit_seals",
            &self.commit_seals,
            &other.commit_seals,
        );
        check(
            &mut diffs,
            profile.view_changes,
            "view_changes",
            &self.view_changes,
            &other.view_changes,
        );
        check(&mut diffs, profile.extras, "extras", &self.extras, &other.extras);
        check(
            &mut diffs,
            profile.raw_payload,
            "raw_payload",
            &self.raw_payload,
            &other.raw_payload,
        );

        diffs
    }
}

/// Field mask for per-format round-trip comparison.
///
/// Formats differ in what they can preserve: the protobuf bridge targets a
/// fixed external schema and legitimately drops fields that schema lacks,
/// and the generic text grammar cannot carry multi-element lists through a
/// re-parse. A profile says which fields a given format is expected to
/// reproduce.
#[derive(Debug, Clone, Copy)]
pub struct CompareProfile {
    pub phase: bool,
    pub height: bool,
    pub round: bool,
    pub view: bool,
    pub timestamp: bool,
    pub block_hash: bool,
    pub prev_hash: bool,
    pub proposer: bool,
    pub validator: bool,
    pub signature: bool,
    pub commit_seals: bool,
    pub view_changes: bool,
    pub extras: bool,
    pub raw_payload: bool,
}

impl CompareProfile {
    /// Every canonical field compared; `raw_payload` stays excluded since
    /// it is diagnostics, not content.
    pub fn full() -> Self {
        Self {
            phase: true,
            height: true,
            round: true,
            view: true,
            timestamp: true,
            block_hash: true,
            prev_hash: true,
            proposer: true,
            validator: true,
            signature: true,
            commit_seals: true,
            view_changes: true,
            extras: true,
            raw_payload: false,
        }
    }
}
