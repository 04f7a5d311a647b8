//! ---
//! fl_section: "05-networking-external-interfaces"
//! fl_subsection: "binary"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Operator CLI for captured frame/host traffic."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use framelink_msg::{InboundMessage, OutboundMessage};
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Host to frame.
    Inbound,
    /// Frame to host.
    Outbound,
}

/// Options for `framelinkctl inspect`.
#[derive(Debug, Args)]
pub struct InspectOptions {
    /// NDJSON file with one message, or one `{"payload": ...}` record, per line.
    #[arg(value_name = "FILE")]
    pub capture: PathBuf,
    #[arg(long, value_enum)]
    pub direction: Direction,
}

pub fn run(options: InspectOptions) -> Result<()> {
    framelink_common::logging::init();
    let file = File::open(&options.capture)
        .with_context(|| format!("unable to open {}", options.capture.display()))?;

    let mut checked = 0usize;
    let mut invalid = 0usize;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        checked += 1;
        if let Err(reason) = check_line(&line, options.direction) {
            invalid += 1;
            println!("line {}: {}", index + 1, reason);
        }
    }

    println!("Checked: {checked}\nInvalid: {invalid}");
    if invalid > 0 {
        bail!("{invalid} of {checked} captured messages are outside the protocol");
    }
    Ok(())
}

fn check_line(line: &str, direction: Direction) -> std::result::Result<(), String> {
    let value: JsonValue = serde_json::from_str(line).map_err(|err| err.to_string())?;
    let message = unwrap_record(value);
    if message.is_null() {
        return Err("empty payload".to_owned());
    }
    let parsed = match direction {
        Direction::Inbound => InboundMessage::deserialize(&message).map(|_| ()),
        Direction::Outbound => OutboundMessage::deserialize(&message).map(|_| ()),
    };
    parsed.map_err(|err| err.to_string())
}

/// Accept both bare messages and replay capture records.
fn unwrap_record(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(mut map) if !map.contains_key("type") && map.contains_key("payload") => {
            map.remove("payload").unwrap_or(JsonValue::Null)
        }
        other => other,
    }
}
