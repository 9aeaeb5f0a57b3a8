use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use digimesh_frame::{Frame, FrameType, ParseSummary};
use serde::Serialize;

use crate::hex;

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

/// Inspected view of one frame. Only the fields meaningful for the frame type
/// are present.
#[derive(Serialize, Debug, Default)]
pub struct FrameOutput {
    pub frame_type: &'static str,
    pub type_byte: String,
    pub frame_id: u8,
    pub size: usize,
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_status: Option<String>,
    pub hex: String,
}

impl FrameOutput {
    pub fn from_frame(frame: &Frame) -> Self {
        let bytes = frame.as_bytes();
        let body = frame.body();
        let frame_type = frame.frame_type();
        let mut out = Self {
            frame_type: frame_type.name(),
            type_byte: format!("0x{:02X}", frame_type.as_byte()),
            frame_id: frame.frame_id(),
            size: frame.wire_size(),
            checksum: format!("0x{:02X}", frame.checksum()),
            hex: hex::encode(bytes),
            ..Self::default()
        };

        match frame_type {
            FrameType::LocalAtCommand => {
                out.command = body.get(2..4).map(mnemonic);
                out.value = body.get(4..).map(hex::encode);
            }
            FrameType::LocalAtCommandResponse => {
                out.command = match frame.at_response_command() {
                    Ok(Some(command)) => Some(command.to_string()),
                    _ => body.get(2..4).map(mnemonic),
                };
                out.status = frame.at_response_status().ok().map(|status| status.name());
                out.value = frame.at_response_value().ok().map(hex::encode);
            }
            FrameType::TransmitRequest => {
                out.destination = body.get(2..10).map(hex::encode);
                out.payload = body.get(14..).map(hex::encode);
            }
            FrameType::ReceivePacket => {
                out.source = body.get(1..9).map(hex::encode);
                out.payload = frame.receive_payload().ok().map(hex::encode);
            }
            FrameType::ExtendedTransmitStatus => {
                out.delivery_status = frame
                    .transmit_status()
                    .ok()
                    .map(|status| format!("0x{status:02X}"));
            }
            FrameType::Unknown(_) => {}
        }

        out
    }

    fn detail(&self) -> String {
        let mut parts = Vec::new();
        let fields = [
            ("command", self.command.as_deref()),
            ("status", self.status),
            ("value", self.value.as_deref()),
            ("dest", self.destination.as_deref()),
            ("source", self.source.as_deref()),
            ("payload", self.payload.as_deref()),
            ("delivery", self.delivery_status.as_deref()),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                if !value.is_empty() {
                    parts.push(format!("{name}={value}"));
                }
            }
        }
        parts.join(" ")
    }
}

#[derive(Serialize)]
struct EncodeReport {
    frames: Vec<FrameOutput>,
}

#[derive(Serialize)]
struct ParseReport {
    frames: Vec<FrameOutput>,
    consumed: usize,
    discarded: usize,
    buffered: usize,
}

/// Print frames produced by an encode command.
pub fn print_frames(frames: &[Frame], format: OutputFormat) {
    let outputs: Vec<FrameOutput> = frames.iter().map(FrameOutput::from_frame).collect();
    match format {
        OutputFormat::Json => {
            print_json(&EncodeReport { frames: outputs });
        }
        OutputFormat::Table => {
            println!("{}", frame_table(&outputs));
        }
        OutputFormat::Pretty => {
            print_pretty(&outputs);
        }
        OutputFormat::Raw => {
            print_raw(&concat(frames));
        }
    }
}

/// Print the frames recovered from a byte stream together with the parser
/// totals.
pub fn print_parse_report(
    frames: &[Frame],
    summary: &ParseSummary,
    buffered: usize,
    format: OutputFormat,
) {
    let outputs: Vec<FrameOutput> = frames.iter().map(FrameOutput::from_frame).collect();
    match format {
        OutputFormat::Json => {
            print_json(&ParseReport {
                frames: outputs,
                consumed: summary.consumed,
                discarded: summary.discarded,
                buffered,
            });
        }
        OutputFormat::Table => {
            println!("{}", frame_table(&outputs));
            println!(
                "frames={} consumed={} discarded={} buffered={}",
                summary.frames, summary.consumed, summary.discarded, buffered
            );
        }
        OutputFormat::Pretty => {
            print_pretty(&outputs);
            println!(
                "{} frame(s), {} byte(s) consumed, {} discarded, {} buffered",
                summary.frames, summary.consumed, summary.discarded, buffered
            );
        }
        OutputFormat::Raw => {
            print_raw(&concat(frames));
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_pretty(outputs: &[FrameOutput]) {
    for out in outputs {
        println!(
            "{} ({}) id={} size={} crc={} {}",
            out.frame_type,
            out.type_byte,
            out.frame_id,
            out.size,
            out.checksum,
            out.detail()
        );
    }
}

fn frame_table(outputs: &[FrameOutput]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["TYPE", "ID", "SIZE", "DETAIL", "HEX"]);
    for out in outputs {
        table.add_row(vec![
            out.frame_type.to_string(),
            out.frame_id.to_string(),
            out.size.to_string(),
            out.detail(),
            out.hex.clone(),
        ]);
    }
    table
}

fn concat(frames: &[Frame]) -> Vec<u8> {
    frames
        .iter()
        .flat_map(|frame| frame.as_bytes().iter().copied())
        .collect()
}

fn mnemonic(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
