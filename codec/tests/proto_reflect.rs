//! Reflective protobuf codec tests.
//!
//! The schema is built in-memory as a `FileDescriptorSet` and registered
//! through the public entry point, exactly the way a deployment would feed
//! a descriptor file produced by its build.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};

use anuvad_codec::{
    parse, serialize, AbstractMessage, CodecError, CompositeProvider, DescriptorRegistry,
    Format, GlobalPoolProvider, ParseOptions, Phase, SerializeOptions,
};

const MESSAGE_NAME: &str = "pbft.AbstractMessage";

fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

/// A fixed external schema carrying only the fields the protobuf format
/// is expected to preserve: type, height, round, timestamp, proposer,
/// validator, signature.
fn descriptor_set_bytes() -> Vec<u8> {
    let file = FileDescriptorProto {
        name: Some("consensus.proto".to_string()),
        package: Some("pbft".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("AbstractMessage".to_string()),
            field: vec![
                string_field("type", 1),
                string_field("height", 2),
                string_field("round", 3),
                string_field("timestamp", 4),
                string_field("proposer", 5),
                string_field("validator", 6),
                string_field("signature", 7),
            ],
            ..Default::default()
        }],
        ..Default::default()
    };
    FileDescriptorSet { file: vec![file] }.encode_to_vec()
}

fn registry_with_schema() -> Arc<DescriptorRegistry> {
    let registry = Arc::new(DescriptorRegistry::new());
    registry
        .register_descriptor_set(&descriptor_set_bytes())
        .unwrap();
    registry
}

fn proto_parse_opts(registry: &Arc<DescriptorRegistry>) -> ParseOptions {
    ParseOptions {
        format: Format::Protobuf,
        proto_message_full_name: Some(MESSAGE_NAME.to_string()),
        descriptor_provider: Some(registry.clone()),
        proto_discard_unknown: true,
        ..Default::default()
    }
}

fn proto_serialize_opts(registry: &Arc<DescriptorRegistry>) -> SerializeOptions {
    SerializeOptions {
        format: Format::Protobuf,
        proto_message_full_name: Some(MESSAGE_NAME.to_string()),
        descriptor_provider: Some(registry.clone()),
        proto_discard_unknown: true,
    }
}

fn sample_message() -> AbstractMessage {
    AbstractMessage {
        phase: Phase::Proposal,
        height: Some(BigInt::from(1000)),
        round: Some(BigInt::from(2)),
        view: Some(BigInt::from(7)),
        timestamp: Utc.timestamp_opt(1_700_000_000, 0).single(),
        block_hash: Some("0xdead".to_string()),
        proposer: Some("node-1".to_string()),
        validator: Some("node-1".to_string()),
        signature: Some("SIG".to_string()),
        commit_seals: vec!["seal".to_string()],
        ..Default::default()
    }
}

#[test]
fn test_round_trip_preserves_schema_fields() {
    let registry = registry_with_schema();
    let bytes = serialize(&sample_message(), &proto_serialize_opts(&registry)).unwrap();
    let parsed = parse(&bytes, &proto_parse_opts(&registry)).unwrap();

    // Fields in the schema survive
    assert_eq!(parsed.phase, Phase::Proposal);
    assert_eq!(parsed.height, Some(BigInt::from(1000)));
    assert_eq!(parsed.round, Some(BigInt::from(2)));
    assert_eq!(parsed.timestamp, sample_message().timestamp);
    assert_eq!(parsed.proposer.as_deref(), Some("node-1"));
    assert_eq!(parsed.validator.as_deref(), Some("node-1"));
    assert_eq!(parsed.signature.as_deref(), Some("SIG"));

    // Fields the fixed schema lacks are dropped
    assert_eq!(parsed.view, None);
    assert_eq!(parsed.block_hash, None);
    assert!(parsed.commit_seals.is_empty());
}

#[test]
fn test_serialize_without_discard_unknown_rejects_extra_fields() {
    let registry = registry_with_schema();
    let mut opts = proto_serialize_opts(&registry);
    opts.proto_discard_unknown = false;
    // view/block_hash/commit_seals are not in the schema
    let err = serialize(&sample_message(), &opts).unwrap_err();
    assert!(matches!(err, CodecError::Encode { .. }));
}

#[test]
fn test_missing_message_name_is_error() {
    let registry = registry_with_schema();
    let mut opts = proto_serialize_opts(&registry);
    opts.proto_message_full_name = None;
    assert!(matches!(
        serialize(&sample_message(), &opts),
        Err(CodecError::MissingMessageName)
    ));
}

#[test]
fn test_missing_provider_is_error() {
    let opts = ParseOptions {
        format: Format::Protobuf,
        proto_message_full_name: Some(MESSAGE_NAME.to_string()),
        ..Default::default()
    };
    assert!(matches!(
        parse(b"", &opts),
        Err(CodecError::MissingDescriptorProvider)
    ));
}

#[test]
fn test_unknown_message_name_is_descriptor_not_found() {
    let registry = registry_with_schema();
    let mut opts = proto_parse_opts(&registry);
    opts.proto_message_full_name = Some("pbft.NoSuchMessage".to_string());
    assert!(matches!(
        parse(b"", &opts),
        Err(CodecError::DescriptorNotFound(name)) if name == "pbft.NoSuchMessage"
    ));
}

#[test]
fn test_reregistering_identical_set_is_noop() {
    let registry = registry_with_schema();
    registry
        .register_descriptor_set(&descriptor_set_bytes())
        .unwrap();
    assert!(registry_resolves(&registry));
}

#[test]
fn test_conflicting_descriptor_is_rejected() {
    let registry = registry_with_schema();
    // Same file name, structurally different message
    let conflicting = FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("consensus.proto".to_string()),
            package: Some("pbft".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("AbstractMessage".to_string()),
                field: vec![string_field("type", 1), string_field("payload", 2)],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
    .encode_to_vec();
    assert!(matches!(
        registry.register_descriptor_set(&conflicting),
        Err(CodecError::DescriptorConflict(_))
    ));
    // Original binding still resolves
    assert!(registry_resolves(&registry));
}

#[test]
fn test_composite_provider_prefers_primary() {
    let registry = registry_with_schema();
    let provider = Arc::new(CompositeProvider::new(
        registry.clone(),
        Arc::new(GlobalPoolProvider),
    ));
    let opts = ParseOptions {
        format: Format::Protobuf,
        proto_message_full_name: Some(MESSAGE_NAME.to_string()),
        descriptor_provider: Some(provider),
        proto_discard_unknown: true,
        ..Default::default()
    };
    // An empty protobuf payload decodes to an empty message
    let parsed = parse(b"", &opts).unwrap();
    assert_eq!(parsed.height, None);
}

#[test]
fn test_malformed_descriptor_blob_is_decode_error() {
    let registry = DescriptorRegistry::new();
    assert!(matches!(
        registry.register_descriptor_set(&[0xff, 0xff, 0xff]),
        Err(CodecError::Decode { .. })
    ));
}

fn registry_resolves(registry: &Arc<DescriptorRegistry>) -> bool {
    use anuvad_codec::DescriptorProvider;
    registry.find_message_by_name(MESSAGE_NAME).is_some()
}
