use micomlink_buzzer::{GpioGuard, SysfsGpio, SysfsPin, ToneConfig, TonePlayer};
use micomlink_session::{Session, SessionConfig, SessionError, ShutdownSignal};
use tracing::{debug, info};

use crate::cmd::{parse_duration, ReceiveArgs};
use crate::exit::{gpio_error, session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Buzzer output that stays exported for as long as it is alive.
struct Buzzer {
    player: TonePlayer<SysfsPin>,
    _guard: GpioGuard,
}

pub fn run(args: ReceiveArgs, format: OutputFormat) -> CliResult<i32> {
    let poll_interval = parse_duration(&args.poll_interval)?;
    let note_duration = parse_duration(&args.note_duration)?;

    let mut buzzer = if args.mute {
        None
    } else {
        let gpio = SysfsGpio::with_root(&args.gpio_root);
        let guard = GpioGuard::output(gpio, args.gpio_pin)
            .map_err(|err| gpio_error("buzzer setup failed", err))?;
        let config = ToneConfig {
            duration: note_duration,
            ..ToneConfig::default()
        };
        info!(pin = args.gpio_pin, "buzzer ready");
        Some(Buzzer {
            player: TonePlayer::with_config(guard.pin(), config),
            _guard: guard,
        })
    };

    let config = SessionConfig {
        poll_interval,
        ..SessionConfig::default()
    };
    let session =
        Session::open(&args.device, config).map_err(|err| session_error("open failed", err))?;
    let (_sender, handle, frames) = session
        .spawn_receiver()
        .map_err(|err| session_error("receiver start failed", err))?;
    install_ctrlc_handler(handle.shutdown_signal())?;

    let mut handled = 0usize;
    let mut failure = None;
    for frame in frames.iter() {
        if let Some(channels) = &args.channels {
            if !channels.contains(&frame.header.channel) {
                continue;
            }
        }

        print_frame(&frame, format);
        if let Some(buzzer) = buzzer.as_mut() {
            if let Err(err) = buzzer.player.play_frame(&frame) {
                failure = Some(gpio_error("tone playback failed", err));
                break;
            }
        }

        handled = handled.saturating_add(1);
        if args.count.is_some_and(|count| handled >= count) {
            break;
        }
    }

    handle.shutdown();
    drop(frames);
    let joined = handle.join();
    if let Some(err) = failure {
        return Err(err);
    }

    match joined {
        Ok(summary) => {
            debug!(reason = ?summary.reason, stats = ?summary.stats, "receive finished");
            Ok(SUCCESS)
        }
        // A capture file runs out once the requested frames were read.
        Err(SessionError::DeviceClosed(_)) if args.count.is_some_and(|count| handled >= count) => {
            Ok(SUCCESS)
        }
        Err(err) => Err(session_error("receive failed", err)),
    }
}

fn install_ctrlc_handler(shutdown: ShutdownSignal) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.request())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
