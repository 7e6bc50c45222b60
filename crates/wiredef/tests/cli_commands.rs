#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "wiredef-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wiredef(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wiredef"))
        .env_remove("WIREDEF_PROTOCOL")
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("wiredef should run")
}

fn wiredef_json(args: &[&str]) -> Output {
    let mut full = vec!["--format", "json"];
    full.extend_from_slice(args);
    wiredef(&full)
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn encode_u8_prints_hex() {
    let output = wiredef_json(&["encode", "--type", "u8", "--json", "5"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout_json(&output);
    assert_eq!(out["type"], "u8");
    assert_eq!(out["size"], 1);
    assert_eq!(out["hex"], "05");
}

#[test]
fn decode_with_protocol_file() {
    let dir = unique_temp_dir("decode");
    let protocol = dir.join("protocol.json");
    std::fs::write(
        &protocol,
        r#"{"list": ["array", {"countType": "$countType", "type": "$type"}]}"#,
    )
    .expect("protocol should be writable");

    let output = wiredef_json(&[
        "decode",
        "--protocol",
        protocol.to_str().expect("utf-8 path"),
        "--type",
        r#"["list",{"countType":"u8","type":"u8"}]"#,
        "--hex",
        "02 aa bb",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout_json(&output);
    assert_eq!(out["value"], serde_json::json!([170, 187]));
    assert_eq!(out["size"], 3);
    assert_eq!(out["trailing"], 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn raw_encode_writes_packet_bytes() {
    let output = wiredef(&[
        "--format",
        "raw",
        "encode",
        "--type",
        r#"["pstring",{"countType":"u8"}]"#,
        "--json",
        "\"hi\"",
    ]);

    assert!(output.status.success());
    assert_eq!(output.stdout, vec![2, b'h', b'i']);
}

#[test]
fn decode_failure_reports_path_and_exit_code() {
    let output = wiredef_json(&[
        "decode",
        "--type",
        r#"["container",[{"name":"id","type":"u32"}]]"#,
        "--hex",
        "0001",
    ]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Read error for id : "), "{stderr}");
}

#[test]
fn unknown_type_is_reported_as_invalid_data() {
    let output = wiredef_json(&["encode", "--type", "nope", "--json", "1"]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SizeOf error for nope : missing data type: nope"), "{stderr}");
}

#[test]
fn missing_protocol_file_fails() {
    let output = wiredef_json(&["types", "--protocol", "/nonexistent/wiredef/protocol.json"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn types_lists_catalog() {
    let output = wiredef_json(&["types"]);

    assert!(output.status.success());
    let rows = stdout_json(&output);
    let rows = rows.as_array().expect("types should be an array");
    let varint = rows
        .iter()
        .find(|row| row["name"] == "varint")
        .expect("varint should be listed");
    assert_eq!(varint["kind"], "raw");
    assert_eq!(varint["fixed_size"], serde_json::Value::Null);

    let u16_row = rows
        .iter()
        .find(|row| row["name"] == "u16")
        .expect("u16 should be listed");
    assert_eq!(u16_row["fixed_size"], 2);
}

#[test]
fn version_prints_name() {
    let output = wiredef(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("wiredef "));
}
