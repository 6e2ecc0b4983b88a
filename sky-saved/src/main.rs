//! sky-saved - Manage flights saved for offline viewing
//!
//! Unix-style tool over the local saved-flights store. Works without a
//! network connection.

use chrono::DateTime;
use clap::{Parser, Subcommand};
use libskyfare::formatters::{
    format_date, format_duration, format_price, format_stops, format_time_ago,
};
use libskyfare::{locale, Config, Database, Result, SavedFlight, SkyfareError};

#[derive(Parser, Debug)]
#[command(name = "sky-saved")]
#[command(version)]
#[command(about = "Manage flights saved for offline viewing")]
#[command(long_about = "\
sky-saved - Manage flights saved for offline viewing

DESCRIPTION:
    sky-saved reads and edits the local store of flights saved with
    sky-search. It never talks to the backend, so it works offline.

COMMANDS:
    list        List saved flights, most recent first
    favorites   List favorite flights only
    show        Show one saved flight with its segments
    toggle      Mark or unmark a flight as favorite
    delete      Delete a saved flight
    cleanup     Remove old non-favorite flights

USAGE EXAMPLES:
    # Everything saved so far
    sky-saved list

    # Favorites as JSON
    sky-saved favorites --format json

    # Star flight 4
    sky-saved toggle 4

    # Drop non-favorites searched more than two weeks ago
    sky-saved cleanup --days 14

CONFIGURATION:
    Configuration file: ~/.config/skyfare/config.toml
    Database location: ~/.local/share/skyfare/flights.db

    Override with environment variables:
        SKYFARE_CONFIG     - Path to config file
        SKYFARE_DB_PATH    - Path to database file

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Database or configuration error
    3 - Invalid input (unknown flight ID, bad format, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List saved flights
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List favorite flights
    Favorites {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a saved flight in detail
    Show {
        /// Saved flight ID
        id: i64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Toggle the favorite flag
    Toggle {
        /// Saved flight ID
        id: i64,
    },

    /// Delete a saved flight
    Delete {
        /// Saved flight ID
        id: i64,
    },

    /// Remove non-favorite flights older than the given age
    Cleanup {
        /// Age threshold in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libskyfare::logging::init_default(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    locale::set(config.preferences.locale);

    let db_path = config.db_path();
    tracing::debug!("Using database at {}", db_path.display());
    let db = Database::new(&db_path.to_string_lossy()).await?;

    match cli.command {
        Commands::List { format } => {
            validate_format(&format)?;
            let flights = db.list_flights().await?;
            output_list(&flights, &format)?;
        }
        Commands::Favorites { format } => {
            validate_format(&format)?;
            let flights = db.list_favorites().await?;
            output_list(&flights, &format)?;
        }
        Commands::Show { id, format } => {
            validate_format(&format)?;
            let flight = db
                .get_flight(id)
                .await?
                .ok_or_else(|| SkyfareError::InvalidInput(format!("Saved flight not found: {}", id)))?;
            if format == "json" {
                print_json(&flight)?;
            } else {
                output_detail(&flight);
            }
        }
        Commands::Toggle { id } => {
            if db.toggle_favorite(id).await? {
                println!("★ Flight #{} added to favorites", id);
            } else {
                println!("Flight #{} removed from favorites", id);
            }
        }
        Commands::Delete { id } => {
            if !db.delete_flight(id).await? {
                return Err(SkyfareError::InvalidInput(format!(
                    "Saved flight not found: {}",
                    id
                )));
            }
            println!("Deleted flight #{}", id);
        }
        Commands::Cleanup { days } => {
            let removed = db.cleanup(days).await?;
            println!("Removed {} flight(s) older than {} days", removed, days);
        }
    }

    Ok(())
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(SkyfareError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| SkyfareError::InvalidInput(format!("Failed to encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn output_list(flights: &[SavedFlight], format: &str) -> Result<()> {
    if format == "json" {
        return print_json(flights);
    }

    if flights.is_empty() {
        println!("No saved flights");
        return Ok(());
    }

    for flight in flights {
        println!("{}", summary_line(flight));
    }
    Ok(())
}

fn saved_ago(flight: &SavedFlight) -> String {
    let searched_at = DateTime::from_timestamp(flight.searched_at, 0).map(|dt| dt.to_rfc3339());
    format_time_ago(searched_at.as_deref())
}

fn summary_line(flight: &SavedFlight) -> String {
    format!(
        "#{}{} {}  {}  {}  {}  {}  {}  (saved {})",
        flight.id,
        if flight.is_favorite { " ★" } else { "" },
        flight.route(),
        format_date(&flight.travel_date),
        format_price(flight.price, &flight.currency),
        flight.airline.as_deref().unwrap_or("Unknown airline"),
        format_duration(flight.duration.as_ref()),
        format_stops(flight.stops),
        saved_ago(flight)
    )
}

fn output_detail(flight: &SavedFlight) {
    println!("{}", summary_line(flight));
    for segment in &flight.segments {
        let number = match (&segment.carrier_code, &segment.flight_number) {
            (Some(carrier), Some(number)) => format!("  {}{}", carrier, number),
            _ => String::new(),
        };
        println!("    {} → {}{}", segment.origin, segment.destination, number);
    }
}
