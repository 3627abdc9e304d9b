//! Foreground timer driven by line commands on stdin.

use std::sync::Arc;
use std::time::Duration;

use pomodash_core::{
    Config, ControllerOptions, Event, SessionApi, SessionMetadata, SessionRecorder, TerminalNotifier,
    TimerController, TimerEngine, TimerSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

const HELP: &str =
    "commands: start | pause | reset | skip | interrupt | status | tag <category> | set <focus|short|long|interval> <n> | help | quit";

const PRINTER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingField {
    Focus,
    ShortBreak,
    LongBreak,
    Interval,
}

impl SettingField {
    fn apply(self, settings: &mut TimerSettings, value: u32) {
        match self {
            SettingField::Focus => settings.focus_duration = value,
            SettingField::ShortBreak => settings.short_break_duration = value,
            SettingField::LongBreak => settings.long_break_duration = value,
            SettingField::Interval => settings.long_break_interval = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start,
    Pause,
    Reset,
    Skip,
    Interrupt,
    Status,
    /// `None` clears the category.
    Tag(Option<String>),
    Set(SettingField, u32),
    Help,
    Quit,
}

/// Parse one stdin line. Blank lines yield `Ok(None)`.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head {
        "start" => Command::Start,
        "pause" => Command::Pause,
        "reset" => Command::Reset,
        "skip" => Command::Skip,
        "interrupt" => Command::Interrupt,
        "status" => Command::Status,
        "tag" => {
            let category = words.collect::<Vec<_>>().join(" ");
            Command::Tag((!category.is_empty()).then_some(category))
        }
        "set" => {
            let (Some(field), Some(value)) = (words.next(), words.next()) else {
                return Err("usage: set <focus|short|long|interval> <n>".into());
            };
            let field = match field {
                "focus" => SettingField::Focus,
                "short" => SettingField::ShortBreak,
                "long" => SettingField::LongBreak,
                "interval" => SettingField::Interval,
                other => return Err(format!("unknown setting: {other}")),
            };
            let value = value.parse::<u32>().map_err(|_| format!("not a number: {value}"))?;
            Command::Set(field, value)
        }
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other} ({HELP})")),
    };
    Ok(Some(command))
}

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let api = super::api_client(&config, offline)?;

    let mut resolver = super::resolver(&config, api.clone());
    let resolved = resolver.load().await;
    tracing::info!(source = %resolved.source, "settings loaded");

    let mut builder = TimerController::builder(TimerEngine::new(resolved.settings))
        .options(ControllerOptions::from(&config.timer))
        .notifier(Arc::new(TerminalNotifier));
    if let Some(api) = api {
        builder = builder.recorder(SessionRecorder::spawn(api as Arc<dyn SessionApi>));
    }
    let controller = builder.build();

    let printer = tokio::spawn(print_events(controller.subscribe()));
    controller.announce_state().await;
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            Command::Start => {
                if !controller.start().await {
                    eprintln!("nothing to start");
                }
            }
            Command::Pause => {
                if !controller.pause().await {
                    eprintln!("timer is not running");
                }
            }
            Command::Reset => controller.reset().await,
            Command::Skip => controller.skip().await,
            Command::Interrupt => {
                if !controller.interrupt().await {
                    eprintln!("timer is not running");
                }
            }
            Command::Status => {
                controller.announce_state().await;
            }
            Command::Tag(category) => {
                controller
                    .set_session_metadata(SessionMetadata {
                        category,
                        ..SessionMetadata::default()
                    })
                    .await;
            }
            Command::Set(field, value) => {
                let mut settings = controller.settings().await;
                field.apply(&mut settings, value);
                match controller.save_settings(&mut resolver, settings).await {
                    Ok(saved) => print_json(&saved)?,
                    Err(e) => eprintln!("{e}"),
                }
            }
            Command::Help => eprintln!("{HELP}"),
            Command::Quit => break,
        }
    }

    if let Some(stats) = controller.shutdown().await {
        tracing::info!(
            created = stats.created,
            updated = stats.updated,
            failed = stats.failed,
            "session recorder flushed"
        );
    }
    // Last handle: the event channel closes and the printer drains.
    drop(controller);
    if tokio::time::timeout(PRINTER_DRAIN_TIMEOUT, printer).await.is_err() {
        tracing::warn!("event printer did not finish");
    }
    Ok(())
}

async fn print_events(mut rx: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Err(e) = print_json(&event) {
                    tracing::warn!("failed to print event: {e}");
                }
            }
            Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "event printer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
