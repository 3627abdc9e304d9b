use clap::Subcommand;
use pomodash_core::{Config, TimerSettings};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the resolved settings and where they came from
    Show {
        /// Skip the remote API
        #[arg(long)]
        offline: bool,
    },
    /// Change settings; unspecified fields keep their current values
    Save {
        /// Focus length in minutes
        #[arg(long)]
        focus: Option<u32>,
        /// Short break length in minutes
        #[arg(long)]
        short_break: Option<u32>,
        /// Long break length in minutes
        #[arg(long)]
        long_break: Option<u32>,
        /// Focus sessions before a long break
        #[arg(long)]
        interval: Option<u32>,
        /// Start breaks automatically
        #[arg(long)]
        auto_breaks: Option<bool>,
        /// Start focus sessions automatically after a break
        #[arg(long)]
        auto_pomodoros: Option<bool>,
        /// Play a sound on completion
        #[arg(long)]
        sound: Option<bool>,
        /// Sound volume, 0-100
        #[arg(long)]
        volume: Option<u8>,
        /// Save only to the local cache
        #[arg(long)]
        offline: bool,
    },
}

pub async fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        SettingsAction::Show { offline } => {
            let mut resolver = super::resolver(&config, super::api_client(&config, offline)?);
            let resolved = resolver.load().await;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        SettingsAction::Save {
            focus,
            short_break,
            long_break,
            interval,
            auto_breaks,
            auto_pomodoros,
            sound,
            volume,
            offline,
        } => {
            let mut resolver = super::resolver(&config, super::api_client(&config, offline)?);
            let current = resolver.load().await.settings;
            let updated = TimerSettings {
                focus_duration: focus.unwrap_or(current.focus_duration),
                short_break_duration: short_break.unwrap_or(current.short_break_duration),
                long_break_duration: long_break.unwrap_or(current.long_break_duration),
                long_break_interval: interval.unwrap_or(current.long_break_interval),
                auto_start_breaks: auto_breaks.unwrap_or(current.auto_start_breaks),
                auto_start_pomodoros: auto_pomodoros.unwrap_or(current.auto_start_pomodoros),
                sound_enabled: sound.unwrap_or(current.sound_enabled),
                sound_volume: volume.unwrap_or(current.sound_volume),
            };
            let saved = resolver.save(updated).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
    }
    Ok(())
}
