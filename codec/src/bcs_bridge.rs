//! BCS bridge codec.
//!
//! BCS (Binary Canonical Serialization) is not self-describing, so the
//! bridge is the narrowest of the three: serialization always wraps the
//! canonical JSON text as a single BCS byte vector, and parsing unwraps
//! it. A payload that is not a BCS byte vector is a decode error, since
//! without a schema there is no generic-structure fallback to attempt.

use anuvad_types::AbstractMessage;

use crate::json::JsonCodec;
use crate::{Codec, CodecError, Format, ParseOptions, SerializeOptions};

/// BCS parsing and serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcsCodec;

impl Codec for BcsCodec {
    fn parse(&self, data: &[u8], opts: &ParseOptions) -> Result<AbstractMessage, CodecError> {
        let inner: Vec<u8> = bcs::from_bytes(data).map_err(|e| CodecError::Decode {
            format: Format::Bcs,
            reason: e.to_string(),
        })?;
        let mut message = JsonCodec.parse(
            &inner,
            &ParseOptions {
                format: Format::Json,
                override_msg_type: opts.override_msg_type.clone(),
                ..Default::default()
            },
        )?;
        message.raw_payload = data.to_vec();
        message.original_format = Some(Format::Bcs.as_str().to_string());
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
        bcs::to_bytes(&json).map_err(|e| CodecError::Encode {
            format: Format::Bcs,
            reason: e.to_string(),
        })
    }
}
