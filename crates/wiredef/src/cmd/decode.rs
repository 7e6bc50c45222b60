use std::fs;

use tracing::debug;

use crate::cmd::encode::descriptor_label;
use crate::cmd::{load_registry, parse_descriptor, DecodeArgs};
use crate::exit::{fault_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_decoded, DecodeOutput, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.protocol.protocol.as_deref())?;
    let descriptor = parse_descriptor(&args.type_desc);
    let bytes = resolve_bytes(&args)?;

    let parsed = registry
        .parse_packet_buffer(&descriptor, bytes)
        .map_err(|err| fault_error("decode failed", err))?;
    let trailing = parsed.buffer.len().saturating_sub(parsed.metadata.size);
    if trailing > 0 {
        debug!(trailing, "packet has unread trailing bytes");
    }

    let out = DecodeOutput {
        type_name: descriptor_label(&descriptor),
        size: parsed.metadata.size,
        trailing,
        value: parsed.data,
    };
    print_decoded(&out, format);
    Ok(SUCCESS)
}

fn resolve_bytes(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(text) = &args.hex {
        return parse_hex(text);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Err(CliError::new(USAGE, "one of --hex or --file is required"))
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    hex::decode(digits)
        .map_err(|err| CliError::new(USAGE, format!("--hex is not valid hex: {err}")))
}
