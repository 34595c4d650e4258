//! Reflective protobuf codec and the descriptor resolution chain.
//!
//! The protobuf format is the only one with no self-describing structure:
//! decoding needs a schema. Schemas arrive as serialized
//! `FileDescriptorSet` blobs registered at runtime, so the codec builds
//! [`DynamicMessage`]s from descriptors instead of compiled bindings.
//! This module is the one place genuine runtime reflection lives.
//!
//! Resolution walks a provider chain: a runtime-loaded
//! [`DescriptorRegistry`] first, then the pool of descriptors compiled
//! into the binary, so deployments can override compiled schemas without a
//! rebuild. The codec itself never reaches process-wide state: the
//! provider always arrives through the options (see [`default_provider`]
//! for the application-wiring default).

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prost::Message;
use prost_reflect::{DescriptorPool, DeserializeOptions, DynamicMessage, MessageDescriptor};
use prost_types::FileDescriptorSet;
use tracing::{debug, info};

use anuvad_types::AbstractMessage;

use crate::json::JsonCodec;
use crate::{Codec, CodecError, Format, ParseOptions, SerializeOptions};

/// Resolves a fully-qualified message name to its descriptor.
pub trait DescriptorProvider: Send + Sync {
    fn find_message_by_name(&self, full_name: &str) -> Option<MessageDescriptor>;
}

/// Mutable registry of descriptor sets loaded at runtime.
///
/// Registration takes the write lock; every protobuf parse/serialize takes
/// the read lock, so concurrent codec calls stay safe against concurrent
/// registration.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    pool: RwLock<DescriptorPool>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self {
            pool: RwLock::new(DescriptorPool::new()),
        }
    }

    /// Register every file contained in a serialized `FileDescriptorSet`.
    ///
    /// Re-registering a file identical to one already present is a no-op;
    /// binding a file name to a structurally different descriptor is a
    /// [`CodecError::DescriptorConflict`].
    pub fn register_descriptor_set(&self, bytes: &[u8]) -> Result<(), CodecError> {
        let set = FileDescriptorSet::decode(bytes).map_err(|e| CodecError::Decode {
            format: Format::Protobuf,
            reason: format!("descriptor set: {e}"),
        })?;
        let mut pool = self.pool.write();
        for file in set.file {
            let name = file.name().to_string();
            if let Some(existing) = pool.get_file_by_name(&name) {
                if existing.file_descriptor_proto() == &file {
                    debug!(file = %name, "descriptor file already registered");
                    continue;
                }
                return Err(CodecError::DescriptorConflict(format!(
                    "file `{name}` is already bound to a different descriptor"
                )));
            }
            pool.add_file_descriptor_proto(file)
                .map_err(|e| CodecError::Decode {
                    format: Format::Protobuf,
                    reason: format!("invalid descriptor file `{name}`: {e}"),
                })?;
            info!(file = %name, "registered descriptor file");
        }
        Ok(())
    }
}

impl DescriptorProvider for DescriptorRegistry {
    fn find_message_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        self.pool.read().get_message_by_name(full_name)
    }
}

/// The pool of descriptors statically compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPoolProvider;

impl DescriptorProvider for GlobalPoolProvider {
    fn find_message_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        DescriptorPool::global().get_message_by_name(full_name)
    }
}

/// Tries a primary provider, then a fallback.
pub struct CompositeProvider {
    primary: Arc<dyn DescriptorProvider>,
    fallback: Arc<dyn DescriptorProvider>,
}

impl CompositeProvider {
    pub fn new(primary: Arc<dyn DescriptorProvider>, fallback: Arc<dyn DescriptorProvider>) -> Self {
        Self { primary, fallback }
    }
}

impl DescriptorProvider for CompositeProvider {
    fn find_message_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        self.primary
            .find_message_by_name(full_name)
            .or_else(|| self.fallback.find_message_by_name(full_name))
    }
}

static PROCESS_REGISTRY: Lazy<Arc<DescriptorRegistry>> =
    Lazy::new(|| Arc::new(DescriptorRegistry::new()));

/// The per-process registry singleton. Intended for application wiring
/// (e.g. a CLI loading descriptor files at startup), not for core logic.
pub fn process_registry() -> Arc<DescriptorRegistry> {
    PROCESS_REGISTRY.clone()
}

/// The standard provider chain: runtime-loaded process registry first,
/// compiled-in global pool second. Pass this through the options at the
/// application boundary; the codec never assumes it.
pub fn default_provider() -> Arc<dyn DescriptorProvider> {
    Arc::new(CompositeProvider::new(
        process_registry(),
        Arc::new(GlobalPoolProvider),
    ))
}

/// Reflective protobuf parsing and serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoCodec;

fn resolve_descriptor(
    provider: Option<&Arc<dyn DescriptorProvider>>,
    full_name: Option<&String>,
) -> Result<MessageDescriptor, CodecError> {
    let provider = provider.ok_or(CodecError::MissingDescriptorProvider)?;
    let full_name = full_name.ok_or(CodecError::MissingMessageName)?;
    provider
        .find_message_by_name(full_name)
        .ok_or_else(|| CodecError::DescriptorNotFound(full_name.clone()))
}

impl Codec for ProtoCodec {
    fn parse(&self, data: &[u8], opts: &ParseOptions) -> Result<AbstractMessage, CodecError> {
        let descriptor = resolve_descriptor(
            opts.descriptor_provider.as_ref(),
            opts.proto_message_full_name.as_ref(),
        )?;
        debug!(message = %descriptor.full_name(), "decoding dynamic message");
        let dynamic = DynamicMessage::decode(descriptor, data).map_err(|e| CodecError::Decode {
            format: Format::Protobuf,
            reason: e.to_string(),
        })?;

        // Protobuf-JSON with proto field names, then normalize through the hub
        let mut serializer = serde_json::Serializer::new(Vec::new());
        let json_opts = prost_reflect::SerializeOptions::new().use_proto_field_name(true);
        dynamic
            .serialize_with_options(&mut serializer, &json_opts)
            .map_err(|e| CodecError::Decode {
                format: Format::Protobuf,
                reason: format!("to canonical json: {e}"),
            })?;
        let json = serializer.into_inner();

        let mut message = JsonCodec.parse(
            &json,
            &ParseOptions {
                format: Format::Json,
                override_msg_type: opts.override_msg_type.clone(),
                ..Default::default()
            },
        )?;
        message.raw_payload = data.to_vec();
        message.original_format = Some(Format::Protobuf.as_str().to_string());
        Ok(message)
    }

    fn serialize(
        &self,
        message: &AbstractMessage,
        opts: &SerializeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let descriptor = resolve_descriptor(
            opts.descriptor_provider.as_ref(),
            opts.proto_message_full_name.as_ref(),
        )?;
        let json = JsonCodec.serialize(
            message,
            &SerializeOptions {
                format: Format::Json,
                ..Default::default()
            },
        )?;

        let mut deserializer = serde_json::Deserializer::from_slice(&json);
        let json_opts = DeserializeOptions::new().deny_unknown_fields(!opts.proto_discard_unknown);
        let dynamic = DynamicMessage::deserialize_with_options(
            descriptor.clone(),
            &mut deserializer,
            &json_opts,
        )
        .map_err(|e| CodecError::Encode {
            format: Format::Protobuf,
            reason: format!("json to {}: {e}", descriptor.full_name()),
        })?;
        deserializer.end().map_err(|e| CodecError::Encode {
            format: Format::Protobuf,
            reason: e.to_string(),
        })?;

        Ok(dynamic.encode_to_vec())
    }
}
