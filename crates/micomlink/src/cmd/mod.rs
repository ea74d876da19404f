use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use micomlink_buzzer::DEFAULT_GPIO_ROOT;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod receive;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one frame and write it to the device.
    #[command(visible_alias = "snd")]
    Send(SendArgs),
    /// Print received frames and play their notes on the buzzer.
    #[command(visible_alias = "rev")]
    Receive(ReceiveArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Receive(args) => receive::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device node (or capture file) to write to.
    #[arg(long, short = 'd', env = "MICOMLINK_DEVICE", default_value = micomlink_transport::DEFAULT_DEVICE_PATH)]
    pub device: PathBuf,
    /// Channel byte.
    #[arg(long, short = 'c', default_value = "0", value_parser = parse_u8)]
    pub channel: u8,
    /// Command category.
    #[arg(long, default_value = "0x01", value_parser = parse_u8)]
    pub cmd1: u8,
    /// Command sub-action.
    #[arg(long, default_value = "0x02", value_parser = parse_u8)]
    pub cmd2: u8,
    /// Command argument.
    #[arg(long, default_value = "1", value_parser = parse_u8)]
    pub cmd3: u8,
    /// Destination node.
    #[arg(long, default_value = "0", value_parser = parse_u8)]
    pub target_id: u8,
    /// Payload as hex digits (whitespace ignored). Default: 12345678.
    #[arg(long, conflicts_with = "text")]
    pub hex: Option<String>,
    /// Payload as UTF-8 text.
    #[arg(long, conflicts_with = "hex")]
    pub text: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Device node (or capture file) to read from.
    #[arg(long, short = 'd', env = "MICOMLINK_DEVICE", default_value = micomlink_transport::DEFAULT_DEVICE_PATH)]
    pub device: PathBuf,
    /// Buzzer GPIO pin.
    #[arg(long, env = "MICOMLINK_GPIO_PIN", default_value = "89")]
    pub gpio_pin: u32,
    /// Sysfs GPIO root.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_GPIO_ROOT)]
    pub gpio_root: PathBuf,
    /// Do not touch GPIO; print frames only.
    #[arg(long)]
    pub mute: bool,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only handle these channels (comma-separated).
    #[arg(long, value_delimiter = ',', value_parser = parse_u8)]
    pub channels: Option<Vec<u8>>,
    /// How long each note sounds (e.g. 500ms, 1s).
    #[arg(long, default_value = "500ms")]
    pub note_duration: String,
    /// Read timeout used to notice shutdown requests.
    #[arg(long, default_value = "200ms")]
    pub poll_interval: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Accepts decimal or `0x`-prefixed hex.
pub fn parse_u8(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("expected a byte value (0-255 or 0x00-0xFF), got {input:?}"))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
