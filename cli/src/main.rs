mod commands;
mod config;
mod dispatcher;
mod notifier;
mod openweather;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_daemon, cmd_forecast, cmd_jobs, cmd_location_coords, cmd_location_reset, cmd_location_set,
    cmd_location_show, cmd_settings_notifications, cmd_settings_show, cmd_settings_units, cmd_show,
    cmd_sync,
};
use crate::config::Config;
use sunshine_core::db::Database;

#[derive(Parser)]
#[command(
    name = "sunshine",
    version,
    about = "A weather forecast cache for the terminal",
    long_about = "\n\n  \\ | /   sunshine
 -- O --  fourteen days of weather,
  / | \\   kept fresh in the background.
"
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the forecast now and replace the stored one
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored forecast from today onward
    Forecast {
        /// Number of days to show (default: all stored)
        #[arg(short, long)]
        days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show details for one day (default: today)
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the forecast location
    Location {
        #[command(subcommand)]
        command: LocationCommands,
    },
    /// Manage display and notification settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Run the recurring background sync until interrupted
    Daemon {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List registered background jobs
    Jobs {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LocationCommands {
    /// Show the location the next sync will use
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a place query (e.g. "94043,USA" or "London,UK")
    Set {
        /// City name or postal code with country
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pin the location to coordinates
    Coords {
        /// Latitude in degrees
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget pinned coordinates and use the place query again
    Reset {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show all settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set display units: metric or imperial
    Units {
        units: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Turn the daily weather notification on or off
    Notifications {
        /// on or off
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        let default = if matches!(cli.command, Commands::Daemon { .. }) {
            "info"
        } else {
            "warn"
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Arc::new(Database::open(&config.db_path)?);

    match cli.command {
        Commands::Sync { json } => cmd_sync(&db, &config, json),
        Commands::Forecast { days, json } => cmd_forecast(&db, days, json),
        Commands::Show { date, json } => cmd_show(&db, date.as_deref(), json),
        Commands::Location { command } => match command {
            LocationCommands::Show { json } => cmd_location_show(&db, json),
            LocationCommands::Set { query, json } => cmd_location_set(&db, &query, json),
            LocationCommands::Coords { lat, lon, json } => {
                cmd_location_coords(&db, lat, lon, json)
            }
            LocationCommands::Reset { json } => cmd_location_reset(&db, json),
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(&db, json),
            SettingsCommands::Units { units, json } => cmd_settings_units(&db, &units, json),
            SettingsCommands::Notifications { value, json } => {
                cmd_settings_notifications(&db, &value, json)
            }
        },
        Commands::Daemon { json } => cmd_daemon(db, &config, json).await,
        Commands::Jobs { json } => cmd_jobs(&config, json),
    }
}
