//! RLP bridge codec.
//!
//! Serialization wraps the canonical JSON text in a single RLP byte
//! string. Parsing unwraps that case first; a foreign RLP list is decoded
//! into a generic value tree, re-encoded as JSON text, and handed to the
//! JSON codec for normalization.

use alloy_rlp::Header;
use serde_json::Value;

use anuvad_types::AbstractMessage;

use crate::json::JsonCodec;
use crate::{Codec, CodecError, Format, ParseOptions, SerializeOptions};

/// RLP parsing and serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct RlpCodec;

impl Codec for RlpCodec {
    fn parse(&self, data: &[u8], opts: &ParseOptions) -> Result<AbstractMessage, CodecError> {
        let mut buf = data;
        let header = Header::decode(&mut buf).map_err(|e| decode_error(e.to_string()))?;
        if header.payload_length > buf.len() {
            return Err(decode_error("input too short".to_string()));
        }
        if buf.len() > header.payload_length {
            return Err(decode_error("trailing bytes after value".to_string()));
        }

        let hub_opts = ParseOptions {
            format: Format::Json,
            override_msg_type: opts.override_msg_type.clone(),
            ..Default::default()
        };
        let mut message = if header.list {
            // Foreign payload: rebuild the whole tree and bridge via JSON
            let mut cursor = data;
            let tree = decode_value(&mut cursor)?;
            let json = serde_json::to_vec(&tree).map_err(|e| decode_error(e.to_string()))?;
            JsonCodec.parse(&json, &hub_opts)?
        } else {
            // Payload-wrapping-JSON-text case: the byte string is the document
            JsonCodec.parse(&buf[..header.payload_length], &hub_opts)?
        };
        message.raw_payload = data.to_vec();
        message.original_format = Some(Format::Rlp.as_str().to_string());
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
        Ok(encode_bytes(&json))
    }
}

fn decode_error(reason: String) -> CodecError {
    CodecError::Decode {
        format: Format::Rlp,
        reason,
    }
}

/// Encode a payload as a single RLP byte string.
fn encode_bytes(payload: &[u8]) -> Vec<u8> {
    if payload.len() == 1 && payload[0] < 0x80 {
        return vec![payload[0]];
    }
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header {
        list: false,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(payload);
    out
}

/// Decode an arbitrary RLP item into a generic value: lists become arrays,
/// byte strings become text (UTF-8 where valid, `0x`-hex otherwise).
fn decode_value(buf: &mut &[u8]) -> Result<Value, CodecError> {
    let header = Header::decode(buf).map_err(|e| decode_error(e.to_string()))?;
    if header.payload_length > buf.len() {
        return Err(decode_error("input too short".to_string()));
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    if header.list {
        let mut items = Vec::new();
        let mut inner = payload;
        while !inner.is_empty() {
            items.push(decode_value(&mut inner)?);
        }
        Ok(Value::Array(items))
    } else {
        Ok(Value::String(text_of(payload)))
    }
}

fn text_of(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => format!("0x{}", hex::encode(bytes)),
    }
}
