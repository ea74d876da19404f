mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "micomlink", version, about = "Micom IPC link CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_defaults() {
        let cli = Cli::try_parse_from(["micomlink", "send", "--device", "/tmp/micom"])
            .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.channel, 0);
        assert_eq!((args.cmd1, args.cmd2, args.cmd3), (0x01, 0x02, 1));
        assert_eq!(args.target_id, 0);
        assert!(args.hex.is_none() && args.text.is_none());
    }

    #[test]
    fn snd_and_rev_aliases() {
        let cli = Cli::try_parse_from(["micomlink", "snd", "--cmd1", "0x10"])
            .expect("snd alias should parse");
        assert!(matches!(cli.command, Command::Send(ref a) if a.cmd1 == 0x10));

        let cli = Cli::try_parse_from(["micomlink", "rev", "--mute", "--count", "2"])
            .expect("rev alias should parse");
        assert!(matches!(cli.command, Command::Receive(ref a) if a.mute && a.count == Some(2)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from(["micomlink", "send", "--hex", "12", "--text", "hi"])
            .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn receive_defaults() {
        let cli = Cli::try_parse_from(["micomlink", "receive", "--channels", "0,0x02"])
            .expect("receive args should parse");
        let Command::Receive(args) = cli.command else {
            panic!("expected receive");
        };
        assert_eq!(args.channels, Some(vec![0, 2]));
        assert_eq!(args.note_duration, "500ms");
        assert_eq!(args.poll_interval, "200ms");
        assert!(!args.mute);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["micomlink", "version", "--format", "json", "--log-level", "debug"])
            .expect("global flags should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
