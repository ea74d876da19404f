use micomlink_frame::{Frame, Header};
use micomlink_session::{Session, SessionConfig};

use crate::cmd::SendArgs;
use crate::exit::{frame_error, session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_sent, OutputFormat};

const DEFAULT_PAYLOAD_HEX: &str = "12345678";

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let header = Header::new(args.channel, args.cmd1, args.cmd2, args.cmd3, args.target_id);
    let frame = Frame::new(header, payload).map_err(|err| frame_error("invalid frame", err))?;

    let session = Session::open(&args.device, SessionConfig::default())
        .map_err(|err| session_error("open failed", err))?;
    let written = session
        .send(&frame.header, &frame.payload)
        .map_err(|err| session_error("send failed", err))?;

    print_sent(&frame, written, format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(text) = &args.text {
        return Ok(text.as_bytes().to_vec());
    }
    parse_hex(args.hex.as_deref().unwrap_or(DEFAULT_PAYLOAD_HEX))
}

/// Decode a hex string, ignoring whitespace.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("--hex needs an even number of digits, got {}", digits.len()),
        ));
    }

    digits
        .chunks_exact(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(CliError::new(
                USAGE,
                format!(
                    "--hex contains a non-hex digit near {:?}",
                    String::from_utf8_lossy(pair)
                ),
            )),
        })
        .collect()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}
