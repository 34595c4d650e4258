//! MessagePack bridge codec.
//!
//! Serialization re-encodes the canonical JSON structure as a MessagePack
//! map. Parsing unwraps an opaque binary payload first (a msgpack `bin`
//! holding JSON text), otherwise decodes the generic value tree and
//! bridges it through the JSON codec.

use serde_json::{Map, Value};

use anuvad_types::AbstractMessage;

use crate::json::JsonCodec;
use crate::{Codec, CodecError, Format, ParseOptions, SerializeOptions};

/// MessagePack parsing and serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl Codec for MsgPackCodec {
    fn parse(&self, data: &[u8], opts: &ParseOptions) -> Result<AbstractMessage, CodecError> {
        let mut cursor = data;
        let value = rmpv::decode::read_value(&mut cursor).map_err(|e| CodecError::Decode {
            format: Format::MsgPack,
            reason: e.to_string(),
        })?;

        let hub_opts = ParseOptions {
            format: Format::Json,
            override_msg_type: opts.override_msg_type.clone(),
            ..Default::default()
        };
        let mut message = if let rmpv::Value::Binary(inner) = &value {
            // Opaque wrap: the binary payload is the JSON document itself
            JsonCodec.parse(inner, &hub_opts)?
        } else {
            let tree = to_json_value(&value);
            let json = serde_json::to_vec(&tree).map_err(|e| CodecError::Decode {
                format: Format::MsgPack,
                reason: e.to_string(),
            })?;
            JsonCodec.parse(&json, &hub_opts)?
        };
        message.raw_payload = data.to_vec();
        message.original_format = Some(Format::MsgPack.as_str().to_string());
        Ok(message)
    }

    fn serialize(
        &self,
        message: &AbstractMessage,
        _opts: &SerializeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let json = JsonCodec.serialize(
            message,
            &SerializeOptions {
                format: Format::Json,
                ..Default::default()
            },
        )?;
        let value: Value = serde_json::from_slice(&json).map_err(|e| CodecError::Encode {
            format: Format::MsgPack,
            reason: e.to_string(),
        })?;
        rmp_serde::to_vec(&value).map_err(|e| CodecError::Encode {
            format: Format::MsgPack,
            reason: e.to_string(),
        })
    }
}

/// Total conversion from a decoded msgpack value to the generic JSON
/// value. Binary and extension payloads degrade to text; non-string map
/// keys are stringified.
fn to_json_value(value: &rmpv::Value) -> Value {
    match value {
        rmpv::Value::Nil => Value::Null,
        rmpv::Value::Boolean(b) => Value::Bool(*b),
        rmpv::Value::Integer(i) => {
            if let Some(n) = i.as_i64() {
                Value::from(n)
            } else if let Some(n) = i.as_u64() {
                Value::from(n)
            } else {
                i.as_f64().map(Value::from).unwrap_or(Value::Null)
            }
        }
        rmpv::Value::F32(f) => serde_json::Number::from_f64(f64::from(*f))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        rmpv::Value::F64(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        rmpv::Value::String(s) => Value::String(String::from_utf8_lossy(s.as_bytes()).into_owned()),
        rmpv::Value::Binary(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        rmpv::Value::Array(items) => Value::Array(items.iter().map(to_json_value).collect()),
        rmpv::Value::Map(entries) => {
            let mut object = Map::new();
            for (key, val) in entries {
                let key = match key {
                    rmpv::Value::String(s) => {
                        String::from_utf8_lossy(s.as_bytes()).into_owned()
                    }
                    other => other.to_string(),
                };
                object.insert(key, to_json_value(val));
            }
            Value::Object(object)
        }
        rmpv::Value::Ext(_, payload) => {
            Value::String(String::from_utf8_lossy(payload).into_owned())
        }
    }
}
