use std::fs;

use serde_json::Value;
use tracing::debug;

use crate::cmd::{load_registry, parse_descriptor, EncodeArgs};
use crate::exit::{fault_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded, EncodeOutput, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.protocol.protocol.as_deref())?;
    let descriptor = parse_descriptor(&args.type_desc);
    let value = resolve_value(&args)?;

    let packet = registry
        .create_packet_buffer(&descriptor, &value)
        .map_err(|err| fault_error("encode failed", err))?;
    debug!(size = packet.len(), "packet encoded");

    let out = EncodeOutput {
        type_name: descriptor_label(&descriptor),
        size: packet.len(),
        hex: hex::encode(&packet),
    };
    print_encoded(&out, &packet, format);
    Ok(SUCCESS)
}

fn resolve_value(args: &EncodeArgs) -> CliResult<Value> {
    let (source, text) = match (&args.json, &args.file) {
        (Some(json), _) => ("--json".to_string(), json.clone()),
        (None, Some(path)) => (
            path.display().to_string(),
            fs::read_to_string(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        ),
        (None, None) => return Err(CliError::new(USAGE, "one of --json or --file is required")),
    };
    serde_json::from_str(&text)
        .map_err(|err| CliError::new(USAGE, format!("{source} is not valid JSON: {err}")))
}

/// Bare names print as themselves, anything else as compact JSON.
pub fn descriptor_label(descriptor: &Value) -> String {
    match descriptor {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}
