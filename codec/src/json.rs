//! JSON codec, the normalization hub.
//!
//! Every binary bridge converts to or from canonical JSON text and lets
//! this codec do the field-by-field work: phase and field synonym
//! resolution on the way in, fixed-order canonical emission on the way
//! out. Arbitrary-precision integers are always carried as decimal
//! strings, never native JSON numbers, so no reader can truncate them.

use serde_json::{Map, Value};

use anuvad_types::{AbstractMessage, ViewChangeEntry};

use crate::coerce;
use crate::synonyms::{field_synonym, resolve_phase, CanonicalField};
use crate::{Codec, CodecError, Format, ParseOptions, SerializeOptions};

/// JSON parsing and serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn parse(&self, data: &[u8], opts: &ParseOptions) -> Result<AbstractMessage, CodecError> {
        let value: Value = serde_json::from_slice(data).map_err(|e| CodecError::Format {
            format: Format::Json,
            reason: e.to_string(),
        })?;
        let object = value.as_object().ok_or_else(|| CodecError::Format {
            format: Format::Json,
            reason: "top-level value is not an object".to_string(),
        })?;

        let mut message = AbstractMessage {
            raw_payload: data.to_vec(),
            original_format: Some(Format::Json.as_str().to_string()),
            ..Default::default()
        };

        if let Some(override_type) = &opts.override_msg_type {
            // Explicit override bypasses the synonym table
            message.phase = override_type.as_str().into();
        } else if let Some(Value::String(token)) = object.get("type") {
            message.phase = resolve_phase(token);
            message.original_msg_name = Some(token.clone());
        }

        for (key, value) in object {
            if key == "type" {
                continue;
            }
            let Some(field) = field_synonym(key) else {
                // Unrecognized keys keep their re-encoded textual form
                let bytes = serde_json::to_vec(value).map_err(|e| CodecError::Encode {
                    format: Format::Json,
                    reason: e.to_string(),
                })?;
                message.extras.insert(key.clone(), bytes);
                continue;
            };
            if key != field.name() {
                message
                    .original_field_names
                    .insert(key.clone(), field.name().to_string());
            }
            match field {
                CanonicalField::Height => message.height = coerce::to_bigint(value),
                CanonicalField::Round => message.round = coerce::to_bigint(value),
                CanonicalField::View => message.view = coerce::to_bigint(value),
                CanonicalField::Timestamp => message.timestamp = coerce::to_timestamp(value),
                CanonicalField::BlockHash => message.block_hash = coerce::to_opt_string(value),
                CanonicalField::PrevHash => message.prev_hash = coerce::to_opt_string(value),
                CanonicalField::Proposer => message.proposer = coerce::to_opt_string(value),
                CanonicalField::Validator => message.validator = coerce::to_opt_string(value),
                CanonicalField::Signature => message.signature = coerce::to_opt_string(value),
                CanonicalField::CommitSeals => {
                    message.commit_seals = coerce::to_string_list(value)
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
        let mut out = Map::new();
        out.insert(
            "type".to_string(),
            Value::String(message.phase.as_str().to_string()),
        );
        if let Some(height) = &message.height {
            out.insert("height".to_string(), Value::String(height.to_string()));
        }
        if let Some(round) = &message.round {
            out.insert("round".to_string(), Value::String(round.to_string()));
        }
        if let Some(view) = &message.view {
            out.insert("view".to_string(), Value::String(view.to_string()));
        }
        if let Some(block_hash) = &message.block_hash {
            out.insert("block_hash".to_string(), Value::String(block_hash.clone()));
        }
        if let Some(prev_hash) = &message.prev_hash {
            out.insert("prev_hash".to_string(), Value::String(prev_hash.clone()));
        }
        if let Some(timestamp) = &message.timestamp {
            out.insert(
                "timestamp".to_string(),
                Value::String(timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            );
        }
        if let Some(proposer) = &message.proposer {
            out.insert("proposer".to_string(), Value::String(proposer.clone()));
        }
        if let Some(validator) = &message.validator {
            out.insert("validator".to_string(), Value::String(validator.clone()));
        }
        if let Some(signature) = &message.signature {
            out.insert("signature".to_string(), Value::String(signature.clone()));
        }
        if !message.commit_seals.is_empty() {
            out.insert(
                "commit_seals".to_string(),
                Value::Array(
                    message
                        .commit_seals
                        .iter()
                        .map(|s| Value::String(s.clone()))
                        .collect(),
                ),
            );
        }
        if !message.view_changes.is_empty() {
            out.insert(
                "view_changes".to_string(),
                Value::Array(
                    message
                        .view_changes
                        .iter()
                        .map(view_change_to_value)
                        .collect(),
                ),
            );
        }
        // Extras merge last; a canonical key already present wins
        for (key, bytes) in &message.extras {
            if out.contains_key(key) {
                continue;
            }
            let value = serde_json::from_slice::<Value>(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()));
            out.insert(key.clone(), value);
        }

        serde_json::to_vec(&Value::Object(out)).map_err(|e| CodecError::Encode {
            format: Format::Json,
            reason: e.to_string(),
        })
    }
}

/// Decode a `view_changes` array-of-objects. The nested keys are fixed
/// canonical sub-keys, independent of the top-level synonym table.
fn parse_view_changes(value: &Value) -> Vec<ViewChangeEntry> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_object())
        .map(|entry| ViewChangeEntry {
            view: entry.get("view").and_then(coerce::to_bigint),
            height: entry.get("height").and_then(coerce::to_bigint),
            validator: entry
                .get("validator")
                .map(coerce::to_string_lossy)
                .unwrap_or_default(),
            signature: entry
                .get("signature")
                .map(coerce::to_string_lossy)
                .unwrap_or_default(),
        })
        .collect()
}

fn view_change_to_value(entry: &ViewChangeEntry) -> Value {
    let mut object = Map::new();
    object.insert(
        "view".to_string(),
        entry
            .view
            .as_ref()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
    );
    object.insert(
        "height".to_string(),
        entry
            .height
            .as_ref()
            .map_or(Value::Null, |h| Value::String(h.to_string())),
    );
    object.insert(
        "validator".to_string(),
        Value::String(entry.validator.clone()),
    );
    object.insert(
        "signature".to_string(),
        Value::String(entry.signature.clone()),
    );
    Value::Object(object)
}
