//! Normalization and multi-format codec engine for consensus messages.
//!
//! Different PBFT/HotStuff-family node implementations put the same
//! logical message on the wire with different field names, phase
//! vocabularies, and encodings. This crate converts any of six wire
//! formats into the canonical [`AbstractMessage`] and back:
//!
//! ```text
//! raw bytes ──► parse ──► format dispatch ──► codec strategy
//!                                                  │
//!                generic ─────────────────────────►│
//!                json ────────────────────────────►│  field-by-field
//!                protobuf ──► dynamic msg ──► JSON │  normalization via
//!                rlp ──────► generic value ──► JSON│  synonym tables +
//!                msgpack ──► generic value ──► JSON│  type coercion
//!                bcs ──────► byte unwrap ────► JSON│
//!                                                  ▼
//!                                          AbstractMessage
//! ```
//!
//! Serialization reverses the flow: every binary bridge asks the JSON
//! codec for the canonical JSON text and re-encodes it in its own format.
//!
//! ## Main Entry Points
//!
//! - [`parse`] / [`serialize`]: format-dispatching front door
//! - [`detect_format`]: best-effort format sniffing for `Format::Auto`
//! - [`DescriptorRegistry`] / [`DescriptorProvider`]: runtime protobuf
//!   schema resolution without compiled bindings
//! - [`phase_synonym`] / [`field_synonym`]: the vocabulary tables, exposed
//!   for external tooling
//!
//! Parsing and serializing are pure per call; the only process-wide state
//! is the optional descriptor registry, which is always handed in
//! explicitly through the options.

pub mod bcs_bridge;
pub mod coerce;
pub mod detect;
pub mod error;
pub mod generic;
pub mod json;
pub mod msgpack;
pub mod proto;
pub mod rlp;
pub mod synonyms;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

pub use anuvad_types::{AbstractMessage, CompareProfile, Phase, ViewChangeEntry};
pub use bcs_bridge::BcsCodec;
pub use detect::detect_format;
pub use error::CodecError;
pub use generic::GenericCodec;
pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;
pub use proto::{
    default_provider, process_registry, CompositeProvider, DescriptorProvider,
    DescriptorRegistry, GlobalPoolProvider, ProtoCodec,
};
pub use rlp::RlpCodec;
pub use synonyms::{field_synonym, phase_synonym, resolve_phase, CanonicalField};

/// Wire formats the engine understands.
///
/// The set is closed: dispatch is a `match`, not open-ended dynamic
/// dispatch, because no format is ever added at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Detect on parse, `Generic` on serialize
    #[default]
    Auto,
    /// Human-readable `Phase(key=value, ...)` text
    Generic,
    /// JSON, the normalization hub
    Json,
    /// Protocol Buffers via runtime descriptors
    Protobuf,
    /// Ethereum-style RLP
    Rlp,
    /// MessagePack
    MsgPack,
    /// Binary Canonical Serialization
    Bcs,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Auto => "auto",
            Format::Generic => "generic",
            Format::Json => "json",
            Format::Protobuf => "protobuf",
            Format::Rlp => "rlp",
            Format::MsgPack => "msgpack",
            Format::Bcs => "bcs",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Format::Auto),
            "generic" => Ok(Format::Generic),
            "json" => Ok(Format::Json),
            "protobuf" => Ok(Format::Protobuf),
            "rlp" => Ok(Format::Rlp),
            "msgpack" => Ok(Format::MsgPack),
            "bcs" => Ok(Format::Bcs),
            other => Err(CodecError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Options for [`parse`].
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// Explicit wire format; `Auto` sniffs with [`detect_format`]
    pub format: Format,
    /// Message-type override, used verbatim (bypasses phase synonyms)
    pub override_msg_type: Option<String>,
    /// Fully-qualified protobuf message name, e.g. `pbft.AbstractMessage`
    pub proto_message_full_name: Option<String>,
    /// Descriptor source for the protobuf codec; see [`default_provider`]
    pub descriptor_provider: Option<Arc<dyn DescriptorProvider>>,
    /// Drop JSON fields the protobuf schema does not know instead of erroring
    pub proto_discard_unknown: bool,
}

/// Options for [`serialize`].
#[derive(Clone, Default)]
pub struct SerializeOptions {
    /// Target wire format; `Auto` means `Generic`
    pub format: Format,
    /// Fully-qualified protobuf message name to serialize into
    pub proto_message_full_name: Option<String>,
    /// Descriptor source for the protobuf codec
    pub descriptor_provider: Option<Arc<dyn DescriptorProvider>>,
    /// Drop canonical fields the protobuf schema does not know instead of erroring
    pub proto_discard_unknown: bool,
}

/// The two-method contract every codec strategy implements.
pub trait Codec {
    /// Decode wire bytes into a fresh canonical message.
    fn parse(&self, data: &[u8], opts: &ParseOptions) -> Result<AbstractMessage, CodecError>;

    /// Encode a canonical message into this codec's wire format.
    fn serialize(
        &self,
        message: &AbstractMessage,
        opts: &SerializeOptions,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Parse wire bytes into an [`AbstractMessage`], selecting the codec by
/// the explicit format in `opts` or by detection for `Format::Auto`.
pub fn parse(data: &[u8], opts: &ParseOptions) -> Result<AbstractMessage, CodecError> {
    let format = match opts.format {
        Format::Auto => detect_format(data),
        explicit => explicit,
    };
    debug!(%format, len = data.len(), "parsing message");
    match format {
        Format::Generic => GenericCodec.parse(data, opts),
        Format::Json => JsonCodec.parse(data, opts),
        Format::Protobuf => ProtoCodec.parse(data, opts),
        Format::Rlp => RlpCodec.parse(data, opts),
        Format::MsgPack => MsgPackCodec.parse(data, opts),
        Format::Bcs => BcsCodec.parse(data, opts),
        Format::Auto => unreachable!("detect_format never yields Auto"),
    }
}

/// Serialize an [`AbstractMessage`] into the format in `opts`
/// (`Format::Auto` falls back to the human-readable generic text).
pub fn serialize(
    message: &AbstractMessage,
    opts: &SerializeOptions,
) -> Result<Vec<u8>, CodecError> {
    let format = match opts.format {
        Format::Auto => Format::Generic,
        explicit => explicit,
    };
    debug!(%format, "serializing message");
    match format {
        Format::Generic => GenericCodec.serialize(message, opts),
        Format::Json => JsonCodec.serialize(message, opts),
        Format::Protobuf => ProtoCodec.serialize(message, opts),
        Format::Rlp => RlpCodec.serialize(message, opts),
        Format::MsgPack => MsgPackCodec.serialize(message, opts),
        Format::Bcs => BcsCodec.serialize(message, opts),
        Format::Auto => unreachable!("Auto resolves to Generic above"),
    }
}
