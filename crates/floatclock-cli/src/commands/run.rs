use std::io::Write;
use std::time::Duration;

use clap::Args;
use floatclock_core::mode::FLUSH_INTERVAL;
use floatclock_core::{Alerts, Event, Millis, Mode, ModeController, NotificationSink, SoundSink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use super::{open_gateway, CmdResult};

/// Upper bound on one sleep when nothing is queued.
const IDLE_WAKE: Duration = Duration::from_secs(1);

#[derive(Args)]
pub struct RunArgs {
    /// Mode to open in: clock, countdown or pomodoro
    #[arg(long)]
    mode: Option<Mode>,
    /// Countdown length in minutes (0 means the default)
    #[arg(long)]
    preset: Option<u32>,
    /// Start the active timer immediately
    #[arg(long)]
    start: bool,
}

/// One line of stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineCommand {
    Toggle,
    Reset,
    CycleMode,
    Skip,
    Quit,
}

impl LineCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "s" | "start" | "pause" => Some(Self::Toggle),
            "r" | "reset" => Some(Self::Reset),
            "m" | "mode" => Some(Self::CycleMode),
            "k" | "skip" => Some(Self::Skip),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Rings the terminal bell on stderr.
struct TerminalBell;

impl SoundSink for TerminalBell {
    fn play(&mut self) {
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

/// Prints notifications to stderr.
struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn send(&mut self, title: &str, body: &str) {
        eprintln!("[{title}] {body}");
    }
}

/// Run until `q` or end of input.
pub fn run(args: RunArgs) -> CmdResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(args));
    runtime.shutdown_background();
    result
}

async fn drive(args: RunArgs) -> CmdResult {
    let alerts = Alerts::new(TerminalBell, TerminalNotifier, true);
    let mut controller = ModeController::load(open_gateway(), alerts);

    if let Some(mode) = args.mode {
        controller.set_mode(mode);
    }
    if let Some(minutes) = args.preset {
        controller.set_countdown_preset(minutes);
    }
    if args.start {
        controller.toggle_start_pause();
    }
    controller.start_clock();
    controller.enable_periodic_flush(FLUSH_INTERVAL);

    let origin = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = None;

    loop {
        if shown != Some(controller.revision()) {
            println!("{}", controller.snapshot().headline());
            shown = Some(controller.revision());
        }

        let wake = controller
            .next_due()
            .map(|due| origin + Duration::from_millis(due))
            .unwrap_or_else(|| Instant::now() + IDLE_WAKE);

        tokio::select! {
            line = lines.next_line() => {
                report(controller.advance_to(elapsed(origin)));
                let Some(line) = line? else {
                    tracing::debug!("stdin closed");
                    break;
                };
                match LineCommand::parse(&line) {
                    Some(LineCommand::Quit) => break,
                    Some(command) => apply(&mut controller, command),
                    None if line.trim().is_empty() => {}
                    None => eprintln!("unknown command '{}' (s, r, m, k, q)", line.trim()),
                }
            }
            _ = tokio::time::sleep_until(wake) => {
                report(controller.advance_to(elapsed(origin)));
            }
        }
    }

    controller.persist();
    Ok(())
}

fn apply(controller: &mut ModeController, command: LineCommand) {
    let event = match command {
        LineCommand::Toggle => controller.toggle_start_pause(),
        LineCommand::Reset => controller.reset_current(),
        LineCommand::CycleMode => controller.cycle_mode(),
        LineCommand::Skip => controller.skip_phase(),
        LineCommand::Quit => None,
    };
    if event.is_none() {
        tracing::debug!(?command, mode = %controller.mode(), "command had no effect");
    }
}

/// Log completions; the sinks already surfaced them to the user.
fn report(events: Vec<Event>) {
    for event in events {
        match &event {
            Event::CountdownCompleted { .. } | Event::PhaseCompleted { .. } => {
                tracing::info!(?event, "timer completed");
            }
            _ => tracing::trace!(?event, "event"),
        }
    }
}

fn elapsed(origin: Instant) -> Millis {
    origin.elapsed().as_millis() as Millis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_commands() {
        assert_eq!(LineCommand::parse("s"), Some(LineCommand::Toggle));
        assert_eq!(LineCommand::parse(" Pause \n"), Some(LineCommand::Toggle));
        assert_eq!(LineCommand::parse("m"), Some(LineCommand::CycleMode));
        assert_eq!(LineCommand::parse("k"), Some(LineCommand::Skip));
        assert_eq!(LineCommand::parse("R"), Some(LineCommand::Reset));
        assert_eq!(LineCommand::parse("q"), Some(LineCommand::Quit));
        assert_eq!(LineCommand::parse("x"), None);
        assert_eq!(LineCommand::parse(""), None);
    }
}
