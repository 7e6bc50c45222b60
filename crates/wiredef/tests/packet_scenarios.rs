#![cfg(feature = "types")]

use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};
use wiredef::codec::{Context, Fault, Stage};
use wiredef::{default_registry, CodecError, TypeRegistry, TypeSpec};

const PROTOCOL: &str = r#"{
    "varint": "native",
    "string": ["pstring", {"countType": "varint"}],
    "list": ["array", {"countType": "$countType", "type": "$type"}],
    "bytes": ["buffer", {"countType": "varint"}],
    "packet_kind": ["mapper", {"type": "u8", "mappings": {"0x00": "ping", "0x01": "chat"}}],
    "packet": ["container", [
        {"name": "kind", "type": "packet_kind"},
        {"name": "body", "type": ["switch", {
            "compareTo": "kind",
            "fields": {
                "ping": ["container", [{"name": "nonce", "type": "u32"}]],
                "chat": ["container", [
                    {"name": "from", "type": "string"},
                    {"name": "lines", "type": ["list", {"countType": "u8", "type": "string"}]}
                ]]
            }
        }]}
    ]]
}"#;

fn protocol_registry() -> TypeRegistry {
    let mut registry = default_registry();
    registry
        .load_protocol_str(PROTOCOL)
        .expect("protocol should load");
    registry
}

#[test]
fn u8_packet_decodes_single_byte() {
    let registry = default_registry();
    let parsed = registry
        .parse_packet_buffer(&json!("u8"), vec![0x05])
        .expect("u8 should decode");

    assert_eq!(parsed.data, json!(5));
    assert_eq!(parsed.metadata.size, 1);
    assert_eq!(&parsed.buffer[..], &[0x05]);
}

#[test]
fn count_prefixed_derived_list_decodes() {
    let mut registry = default_registry();
    registry
        .add_type(
            "list",
            TypeSpec::derived(json!(["array", {"countType": "$countType", "type": "$type"}])),
        )
        .expect("list should register");

    let descriptor = json!(["list", {"countType": "u8", "type": "u8"}]);
    let parsed = registry
        .parse_packet_buffer(&descriptor, vec![0x02, 0xAA, 0xBB])
        .expect("list should decode");

    assert_eq!(parsed.data, json!([170, 187]));
    assert_eq!(parsed.metadata.size, 3);
}

#[test]
fn nested_packet_round_trips_with_exact_size() {
    let registry = protocol_registry();
    let value = json!({
        "kind": "chat",
        "body": {"from": "ada", "lines": ["hi", "bye"]}
    });

    let size = registry
        .size_of(&value, &json!("packet"), &mut Context::new())
        .expect("size should compute");
    let packet = registry
        .create_packet_buffer(&json!("packet"), &value)
        .expect("packet should encode");
    assert_eq!(packet.len(), size);
    assert_eq!(
        &packet[..],
        &[0x01, 3, b'a', b'd', b'a', 2, 2, b'h', b'i', 3, b'b', b'y', b'e']
    );

    let parsed = registry
        .parse_packet_buffer(&json!("packet"), packet.clone())
        .expect("packet should decode");
    assert_eq!(parsed.data, value);
    assert_eq!(parsed.metadata.size, packet.len());
}

#[test]
fn write_failure_reports_dotted_field_path() {
    let registry = protocol_registry();
    let value = json!({"kind": "chat", "body": {"from": "ada", "lines": ["ok", 7]}});

    let err = registry
        .create_packet_buffer(&json!("packet"), &value)
        .expect_err("non-string line should fail");

    match &err {
        Fault::Packet { stage, field, .. } => {
            assert_eq!(*stage, Stage::SizeOf);
            assert_eq!(field, "body.lines.1");
        }
        other => panic!("unexpected fault: {other}"),
    }
    assert!(err.to_string().starts_with("SizeOf error for body.lines.1 : "));
}

#[test]
fn read_failure_reports_stage_and_path() {
    let registry = protocol_registry();
    let err = registry
        .parse_packet_buffer(&json!("packet"), vec![0x00, 0x01, 0x02])
        .expect_err("truncated nonce should fail");

    match err {
        Fault::Packet { stage, field, message } => {
            assert_eq!(stage, Stage::Read);
            assert_eq!(field, "body.nonce");
            assert!(message.contains("unexpected end of buffer"), "{message}");
        }
        other => panic!("unexpected fault: {other}"),
    }
}

#[test]
fn top_level_failure_falls_back_to_type_name() {
    let registry = default_registry();
    let err = registry
        .parse_packet_buffer(&json!("u16"), vec![0x01])
        .expect_err("short buffer should fail");
    assert!(err.to_string().starts_with("Read error for u16 : "), "{err}");
}

#[test]
fn missing_type_is_value_for_read_and_fault_for_size_of() {
    let registry = default_registry();
    let mut ctx = Context::new();

    let read = registry
        .read(&[0], 0, &json!("nope"), &mut ctx)
        .expect("read should not fault");
    assert_eq!(read, Err(CodecError::MissingType("nope".into())));
    assert_eq!(read.unwrap_err().to_string(), "missing data type: nope");

    let mut buf = [0u8; 1];
    let written = registry
        .write(&json!(1), &mut buf, 0, &json!("nope"), &mut ctx)
        .expect("write should not fault");
    assert!(matches!(written, Err(CodecError::MissingType(_))));

    let size = registry.size_of(&json!(1), &json!("nope"), &mut ctx);
    assert!(matches!(size, Err(Fault::MissingType(name)) if name == "nope"));
}

#[test]
fn trailing_bytes_are_left_unread() {
    let registry = protocol_registry();
    let parsed = registry
        .parse_packet_buffer(&json!("string"), vec![1, b'x', 0xff, 0xff])
        .expect("string should decode");
    assert_eq!(parsed.data, json!("x"));
    assert_eq!(parsed.metadata.size, 2);
    assert_eq!(parsed.buffer.len(), 4);
}

#[test]
fn template_stays_pure_across_interleaved_threads() {
    let registry = Arc::new(protocol_registry());

    let handles: Vec<_> = (0..4u8)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let (count_type, value): (&str, Value) = if n % 2 == 0 {
                    ("u8", json!([n, n]))
                } else {
                    ("varint", json!([n]))
                };
                let descriptor = json!(["list", {"countType": count_type, "type": "u8"}]);
                for _ in 0..50 {
                    let packet = registry
                        .create_packet_buffer(&descriptor, &value)
                        .expect("list should encode");
                    let parsed = registry
                        .parse_packet_buffer(&descriptor, packet)
                        .expect("list should decode");
                    assert_eq!(parsed.data, value);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker should not panic");
    }
}

#[test]
fn oversized_packets_are_refused_before_allocation() {
    let mut registry = TypeRegistry::with_config(wiredef::codec::RegistryConfig {
        max_packet_size: 2,
        ..Default::default()
    });
    wiredef::types::install(&mut registry);

    let err = registry
        .create_packet_buffer(&json!("u32"), &json!(1))
        .expect_err("packet over limit should fail");
    assert!(matches!(err, Fault::PacketTooLarge { size: 4, max: 2 }));
}
