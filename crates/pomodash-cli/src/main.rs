use clap::{CommandFactory, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pomodash", version, about = "Pomodash focus timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer in the foreground, reading commands from stdin
    Run {
        /// Do not talk to the remote API; settings come from the local cache
        #[arg(long)]
        offline: bool,
    },
    /// Timer settings stored with your account
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Local configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    pomodash_core::logging::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { offline } => commands::run::run(offline).await,
        Commands::Settings { action } => commands::settings::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pomodash", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
