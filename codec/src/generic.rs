//! Generic human-readable text codec: `Phase(key=value, key=value, ...)`.
//!
//! List-typed fields use a compact sub-grammar: `commit_seals` is
//! comma-joined, `view_changes` entries are `view:height:validator:signature`
//! joined by commas. Because `,` doubles as the pair separator,
//! multi-element lists do not survive a re-parse; round-trip comparisons
//! profile them out.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use num_bigint::BigInt;

use anuvad_types::{AbstractMessage, ViewChangeEntry};

use crate::synonyms::{field_synonym, resolve_phase, CanonicalField};
use crate::{Codec, CodecError, Format, ParseOptions, SerializeOptions};

/// Generic text parsing and serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericCodec;

impl Codec for GenericCodec {
    fn parse(&self, data: &[u8], _opts: &ParseOptions) -> Result<AbstractMessage, CodecError> {
        let text = std::str::from_utf8(data).map_err(|e| CodecError::Format {
            format: Format::Generic,
            reason: format!("input is not UTF-8: {e}"),
        })?;
        let raw = text.trim();
        if raw.is_empty() {
            return Err(CodecError::Format {
                format: Format::Generic,
                reason: "empty input".to_string(),
            });
        }
        let open = raw.find('(').ok_or_else(|| CodecError::Format {
            format: Format::Generic,
            reason: format!("no '(' delimiter in {raw:?}"),
        })?;
        let msg_name = raw[..open].trim();
        let body = trim_brackets(raw);

        let mut message = AbstractMessage {
            raw_payload: raw.as_bytes().to_vec(),
            original_format: Some(Format::Generic.as_str().to_string()),
            original_msg_name: Some(msg_name.to_string()),
            ..Default::default()
        };
        message.phase = resolve_phase(msg_name);

        for (key, value) in split_key_value_pairs(body) {
            let Some(field) = field_synonym(key) else {
                message.extras.insert(key.to_string(), value.as_bytes().to_vec());
                continue;
            };
            if key != field.name() {
                message
                    .original_field_names
                    .insert(key.to_string(), field.name().to_string());
            }
            match field {
                CanonicalField::Height => message.height = BigInt::from_str(value).ok(),
                CanonicalField::Round => message.round = BigInt::from_str(value).ok(),
                CanonicalField::View => message.view = BigInt::from_str(value).ok(),
                CanonicalField::BlockHash => message.block_hash = Some(value.to_string()),
                CanonicalField::PrevHash => message.prev_hash = Some(value.to_string()),
                CanonicalField::Timestamp => message.timestamp = parse_timestamp(value),
                CanonicalField::Proposer => message.proposer = Some(value.to_string()),
                CanonicalField::Validator => message.validator = Some(value.to_string()),
                CanonicalField::Signature => message.signature = Some(value.to_string()),
                CanonicalField::CommitSeals => {
                    message.commit_seals = value.split(',').map(str::to_string).collect()
                }
                CanonicalField::ViewChanges => {
                    message.view_changes = parse_view_changes(value)
                }
            }
        }

        Ok(message)
    }

    fn serialize(
        &self,
        message: &AbstractMessage,
        _opts: &SerializeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(height) = &message.height {
            parts.push(format!("height={height}"));
        }
        if let Some(round) = &message.round {
            parts.push(format!("round={round}"));
        }
        if let Some(view) = &message.view {
            parts.push(format!("view={view}"));
        }
        if let Some(block_hash) = &message.block_hash {
            parts.push(format!("block_hash={block_hash}"));
        }
        if let Some(prev_hash) = &message.prev_hash {
            parts.push(format!("prev_hash={prev_hash}"));
        }
        if let Some(timestamp) = &message.timestamp {
            parts.push(format!(
                "timestamp={}",
                timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        if let Some(proposer) = &message.proposer {
            parts.push(format!("proposer={proposer}"));
        }
        if let Some(validator) = &message.validator {
            parts.push(format!("validator={validator}"));
        }
        if let Some(signature) = &message.signature {
            parts.push(format!("signature={signature}"));
        }
        if !message.commit_seals.is_empty() {
            parts.push(format!("commit_seals={}", message.commit_seals.join(",")));
        }
        if !message.view_changes.is_empty() {
            let entries: Vec<String> = message
                .view_changes
                .iter()
                .map(|e| {
                    format!(
                        "{}:{}:{}:{}",
                        e.view.as_ref().map(ToString::to_string).unwrap_or_default(),
                        e.height.as_ref().map(ToString::to_string).unwrap_or_default(),
                        e.validator,
                        e.signature
                    )
                })
                .collect();
            parts.push(format!("view_changes={}", entries.join(",")));
        }
        for (key, value) in &message.extras {
            parts.push(format!("{key}={}", String::from_utf8_lossy(value)));
        }
        Ok(format!("{}({})", message.phase.as_str(), parts.join(",")).into_bytes())
    }
}

/// Contents between the first `(` and the last `)`; the input unchanged
/// when the brackets are missing or unbalanced.
fn trim_brackets(s: &str) -> &str {
    if let Some(open) = s.find('(') {
        if let Some(close) = s.rfind(')') {
            if close > open {
                return &s[open + 1..close];
            }
        }
    }
    s
}

/// Split `k=v, k=v, ...`; parts without `=` are skipped.
fn split_key_value_pairs(body: &str) -> Vec<(&str, &str)> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    body.split(',')
        .filter_map(|part| {
            part.split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
        })
        .collect()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    let secs = value.parse::<i64>().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Parse `view:height:validator:signature` entries joined by commas;
/// entries with fewer than four parts are skipped.
fn parse_view_changes(raw: &str) -> Vec<ViewChangeEntry> {
    raw.split(',')
        .filter_map(|item| {
            let parts: Vec<&str> = item.trim().split(':').collect();
            if parts.len() < 4 {
                return None;
            }
            Some(ViewChangeEntry {
                view: BigInt::from_str(parts[0]).ok(),
                height: BigInt::from_str(parts[1]).ok(),
                validator: parts[2].to_string(),
                signature: parts[3].to_string(),
            })
        })
        .collect()
}
