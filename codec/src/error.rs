//! Engine error types.

use crate::Format;

/// Errors surfaced by [`crate::parse`] and [`crate::serialize`].
///
/// Individual field coercion failures are deliberately NOT here: a field
/// that cannot be coerced degrades to absent and the parse continues (see
/// [`crate::coerce`]). Errors are terminal for the call; the engine never
/// retries.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Input does not match the grammar of the selected format
    #[error("invalid {format} message: {reason}")]
    Format { format: Format, reason: String },

    /// The binary payload is structurally invalid for its codec
    #[error("{format} decode failed: {reason}")]
    Decode { format: Format, reason: String },

    /// The canonical message cannot be encoded in the target format
    #[error("{format} encode failed: {reason}")]
    Encode { format: Format, reason: String },

    /// Format selector token outside the closed set
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No provider in the chain knows the requested message name
    #[error("no descriptor found for message `{0}`")]
    DescriptorNotFound(String),

    /// A message name is already bound to a structurally different descriptor
    #[error("descriptor registration conflict: {0}")]
    DescriptorConflict(String),

    /// The protobuf codec cannot pick a schema without a full message name
    #[error("protobuf codec requires a fully-qualified message name")]
    MissingMessageName,

    /// The protobuf codec never reaches a process-wide registry implicitly
    #[error("protobuf codec requires a descriptor provider")]
    MissingDescriptorProvider,
}
