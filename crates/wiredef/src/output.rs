use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct TypeRow {
    pub name: String,
    pub kind: String,
    pub fixed_size: Option<usize>,
}

#[derive(Serialize)]
pub struct EncodeOutput {
    #[serde(rename = "type")]
    pub type_name: String,
    pub size: usize,
    pub hex: String,
}

#[derive(Serialize)]
pub struct DecodeOutput {
    #[serde(rename = "type")]
    pub type_name: String,
    pub size: usize,
    pub trailing: usize,
    pub value: Value,
}

pub fn print_types(rows: &[TypeRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table(vec!["NAME", "KIND", "FIXED SIZE"]);
            for row in rows {
                table.add_row(vec![row.name.clone(), row.kind.clone(), fixed_size(row.fixed_size)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{:<16} {:<8} {}", row.name, row.kind, fixed_size(row.fixed_size));
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                println!("{}", row.name);
            }
        }
    }
}

pub fn print_encoded(out: &EncodeOutput, bytes: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TYPE", "SIZE", "HEX"]);
            table.add_row(vec![out.type_name.clone(), out.size.to_string(), out.hex.clone()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("type={} size={} hex={}", out.type_name, out.size, out.hex);
        }
        OutputFormat::Raw => print_raw(bytes),
    }
}

pub fn print_decoded(out: &DecodeOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TYPE", "SIZE", "TRAILING", "VALUE"]);
            table.add_row(vec![
                out.type_name.clone(),
                out.size.to_string(),
                out.trailing.to_string(),
                out.value.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("type={} size={} trailing={}", out.type_name, out.size, out.trailing);
            println!(
                "{}",
                serde_json::to_string_pretty(&out.value).unwrap_or_else(|_| out.value.to_string())
            );
        }
        OutputFormat::Raw => println!("{}", out.value),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json(out: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn fixed_size(size: Option<usize>) -> String {
    size.map_or_else(|| "-".to_string(), |n| n.to_string())
}
