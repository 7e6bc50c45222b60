use clap::{Args, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;
use wiredef::codec::TypeRegistry;

use crate::exit::{fault_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod types;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered types.
    Types(TypesArgs),
    /// Encode a JSON value into a packet.
    Encode(EncodeArgs),
    /// Decode a packet into a JSON value.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Types(args) => types::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ProtocolArgs {
    /// Protocol file (JSON mapping of type names to descriptors).
    #[arg(long, short = 'p', value_name = "FILE", env = "WIREDEF_PROTOCOL")]
    pub protocol: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TypesArgs {
    #[command(flatten)]
    pub protocol: ProtocolArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub protocol: ProtocolArgs,
    /// Type descriptor: a name, or JSON such as '["pstring",{"countType":"u8"}]'.
    #[arg(long = "type", short = 't', value_name = "DESC")]
    pub type_desc: String,
    /// JSON value to encode.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub json: Option<String>,
    /// Read the JSON value from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub protocol: ProtocolArgs,
    /// Type descriptor: a name, or JSON such as '["pstring",{"countType":"u8"}]'.
    #[arg(long = "type", short = 't', value_name = "DESC")]
    pub type_desc: String,
    /// Packet bytes as hex (whitespace ignored).
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Read packet bytes from a file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Default catalog plus the protocol file, if any.
pub fn load_registry(protocol: Option<&Path>) -> CliResult<TypeRegistry> {
    let mut registry = wiredef::default_registry();
    if let Some(path) = protocol {
        let count = registry
            .load_protocol_file(path)
            .map_err(|err| fault_error("failed loading protocol", err))?;
        debug!(path = %path.display(), types = count, "protocol ready");
    }
    Ok(registry)
}

/// JSON when it parses, otherwise a bare type name.
pub fn parse_descriptor(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}
