use chrono::Local;
use clap::Parser;
use color_eyre::Result;
use sleeplog::cli::{self, Cli, Commands};
use sleeplog::logging::{self, LogTarget};
use sleeplog::utils::get_data_dir;
use sleeplog::{Config, Profile};
use tracing::warn;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps config and logs apart from the real profile
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };
    let config = Config::load_with_profile(profile)?;

    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI owns the terminal, so it logs to a file
    let target = match (&command, get_data_dir(profile)) {
        (Commands::Tui, Some(dir)) => LogTarget::File(dir.join("sleeplog.log")),
        _ => LogTarget::Stderr,
    };
    logging::init(&config.log_filter, target)?;

    match command {
        Commands::Tui => {
            let client = match cli::client_for(&config, cli.api_url.as_deref()) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "starting without a backend");
                    None
                }
            };
            let app = sleeplog::tui::App::new(config, profile, client, Local::now().date_naive());
            sleeplog::tui::run_event_loop(app)?;
        }
        Commands::Add(args) => {
            let client = cli::client_for(&config, cli.api_url.as_deref())?;
            cli::handle_add(args, &client)?;
        }
        Commands::Goal { action } => {
            let client = cli::client_for(&config, cli.api_url.as_deref())?;
            cli::handle_goal(action, &client)?;
        }
        Commands::Stats { series, period } => {
            let client = cli::client_for(&config, cli.api_url.as_deref())?;
            cli::handle_stats(series, period, &client)?;
        }
        Commands::Catalog => cli::handle_catalog(),
    }

    Ok(())
}
