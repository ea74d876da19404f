use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use micomlink_buzzer::Note;
use micomlink_frame::{command_name, Frame};
use serde::Serialize;

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
struct FrameOutput<'a> {
    event: &'a str,
    channel: u8,
    cmd1: u8,
    cmd2: u8,
    cmd3: u8,
    command: &'a str,
    target_id: u8,
    length: usize,
    crc: String,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wire_size: Option<usize>,
    timestamp: String,
}

impl<'a> FrameOutput<'a> {
    fn new(event: &'a str, frame: &Frame) -> Self {
        Self {
            event,
            channel: frame.header.channel,
            cmd1: frame.header.cmd1,
            cmd2: frame.header.cmd2,
            cmd3: frame.header.cmd3,
            command: command_name(frame.header.cmd1),
            target_id: frame.header.target_id,
            length: frame.length(),
            crc: format!("0x{:04X}", frame.crc),
            payload: hex(frame.payload.as_ref()),
            note: None,
            wire_size: None,
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print a frame taken off the wire.
pub fn print_frame(frame: &Frame, format: OutputFormat) {
    let mut out = FrameOutput::new("received", frame);
    out.note = frame
        .payload
        .first()
        .and_then(|&selector| Note::from_selector(selector))
        .map(Note::name);
    emit(&out, frame, format);
}

/// Print a summary of a frame written to the device.
pub fn print_sent(frame: &Frame, written: usize, format: OutputFormat) {
    let mut out = FrameOutput::new("sent", frame);
    out.wire_size = Some(written);
    emit(&out, frame, format);
}

fn emit(out: &FrameOutput<'_>, frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "CHANNEL", "CMD", "COMMAND", "TARGET", "LENGTH", "CRC", "PAYLOAD", "NOTE",
                ])
                .add_row(vec![
                    out.channel.to_string(),
                    format!("{:02X} {:02X} {:02X}", out.cmd1, out.cmd2, out.cmd3),
                    out.command.to_string(),
                    out.target_id.to_string(),
                    out.length.to_string(),
                    out.crc.clone(),
                    out.payload.clone(),
                    out.note.unwrap_or("-").to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let note = out.note.map(|n| format!(" note={n}")).unwrap_or_default();
            println!(
                "{} channel={} cmd={:02X}/{:02X}/{:02X} ({}) target={} length={} crc={} payload={}{}",
                out.event,
                out.channel,
                out.cmd1,
                out.cmd2,
                out.cmd3,
                out.command,
                out.target_id,
                out.length,
                out.crc,
                out.payload,
                note
            );
        }
        OutputFormat::Raw => print_raw(frame.payload.as_ref()),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02X}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use micomlink_frame::Header;

    use super::*;

    #[test]
    fn frame_output_fields() {
        let frame = Frame::new(Header::new(0, 1, 2, 1, 5), vec![0x12, 0x34, 0x56, 0x78]).unwrap();
        let out = FrameOutput::new("received", &frame);

        assert_eq!(out.command, "EDUCATION_CAN_DEMO");
        assert_eq!(out.crc, "0xAA7C");
        assert_eq!(out.payload, "12345678");
        assert_eq!(out.length, 4);

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["target_id"], 5);
        assert!(json.get("note").is_none());
    }
}
