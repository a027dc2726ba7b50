//! Mystery Codes CLI — entry point.

use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use mystery_codes::Choice;
use mystery_codes_cli::batch::{parse_count, DEFAULT_PAUSE_MS};
use mystery_codes_cli::commands::{self, ChallengeSource, GenerateOptions};
use mystery_codes_cli::config::{resolve_config_path, resolve_history_path};
use mystery_codes_cli::history::HistoryStore;

#[derive(Parser)]
#[command(
    name = "mystery-codes",
    about = "Mystery Codes — acquire promotional redemption codes",
    version
)]
struct Cli {
    /// Path to the API config file (JSON).
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the history file.
    #[arg(long, global = true)]
    history: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate codes and add them to the history.
    Generate {
        /// Variant to confirm (beef, veggie).
        #[arg(short, long, default_value = "beef")]
        variant: Choice,

        /// Number of codes (2, 4, 6, 8, 10, 20).
        #[arg(short = 'n', long, default_value_t = 2, value_parser = parse_count)]
        count: usize,

        /// Pause between runs in milliseconds.
        #[arg(long, default_value_t = DEFAULT_PAUSE_MS)]
        pause_ms: u64,

        /// Challenge token to use for every run.
        /// Also reads from MYSTERY_CODES_CHALLENGE_TOKEN env var.
        #[arg(long)]
        challenge_token: Option<String>,

        /// Program and arguments that print a fresh challenge token,
        /// given after `--`.
        #[arg(last = true, value_name = "CHALLENGE_CMD")]
        challenge_cmd: Vec<String>,

        /// Output results as JSON.
        #[arg(long)]
        json: bool,

        /// Do not record the codes in the history.
        #[arg(long)]
        no_save: bool,
    },

    /// Show previously generated codes.
    History {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Remove all stored codes.
        #[arg(long)]
        clear: bool,
    },

    /// Validate the config file and print it (secret masked).
    ConfigCheck,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   mystery-codes completions bash > ~/.local/share/bash-completion/completions/mystery-codes
    ///   mystery-codes completions zsh > ~/.zfunc/_mystery-codes
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let history = HistoryStore::new(resolve_history_path(cli.history.as_deref()));

    match cli.command {
        Commands::Generate {
            variant,
            count,
            pause_ms,
            challenge_token,
            challenge_cmd,
            json,
            no_save,
        } => {
            let config_path = resolve_config_path(cli.config.as_deref());
            let config = commands::load_config(&config_path)?;
            tracing::debug!("Config: {}", config_path.display());

            let challenge = ChallengeSource {
                token: challenge_token,
                command: challenge_cmd,
            };
            let options = GenerateOptions {
                choice: variant,
                count,
                pause: Duration::from_millis(pause_ms),
                json,
                save: !no_save,
            };
            let code = commands::generate(config, challenge, &history, options).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::History { json, clear } => {
            commands::history(&history, json, clear)?;
        }

        Commands::ConfigCheck => {
            let config_path = resolve_config_path(cli.config.as_deref());
            if let Err(e) = commands::config_check(&config_path) {
                eprintln!("Invalid config: {e:#}");
                std::process::exit(1);
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mystery-codes", &mut std::io::stdout());
        }
    }

    Ok(())
}
