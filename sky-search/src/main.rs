//! sky-search - Search flights and save offers offline
//!
//! Unix-style tool that queries the flight backend, prints the cheapest
//! offers and optionally stores some of them in the local database.

use clap::Parser;
use libskyfare::error::ApiError;
use libskyfare::formatters::{
    format_date, format_duration, format_price, format_stops, format_time,
};
use libskyfare::service::search::SearchFlow;
use libskyfare::service::{Navigation, NetworkStatus, SearchStatus, SkyfareService, Tab};
use libskyfare::{Config, FlightOffer, Locale, Result, SavedFlight, SkyfareError};

#[derive(Parser, Debug)]
#[command(name = "sky-search")]
#[command(version)]
#[command(about = "Search flights and save offers offline")]
#[command(long_about = "\
sky-search - Search flights and save offers offline

DESCRIPTION:
    sky-search asks the flight backend for offers on a route and date and
    prints the five cheapest. Offers can be saved to the local database
    with --save, which also shows a \"flight saved\" notification.

    When the backend cannot be reached, the saved flights are printed
    instead so there is always something to look at offline.

USAGE EXAMPLES:
    # Default route (MEX -> VIE) one month from today
    sky-search

    # Specific route and date
    sky-search GDL MAD --date 2026-12-01

    # Only the single cheapest offer
    sky-search MEX CUN --cheapest

    # Save the first and third offers
    sky-search MEX VIE --save 1 --save 3

    # JSON output for scripting
    sky-search MEX VIE --format json | jq '.[0].price'

CONFIGURATION:
    Configuration file: ~/.config/skyfare/config.toml
    Database location: ~/.local/share/skyfare/flights.db

    Override with environment variables:
        SKYFARE_CONFIG     - Path to config file
        SKYFARE_DB_PATH    - Path to database file
        SKYFARE_API_URL    - Backend base URL

EXIT CODES:
    0 - Success
    1 - Search failed or backend unreachable
    2 - Database or configuration error
    3 - Invalid input (bad airport code, date, index, etc.)
")]
struct Cli {
    /// Origin airport code (default: MEX)
    origin: Option<String>,

    /// Destination airport code (default: VIE)
    destination: Option<String>,

    /// Departure date, YYYY-MM-DD (default: 30 days from today)
    #[arg(short, long)]
    date: Option<String>,

    /// Number of adult passengers
    #[arg(short, long, default_value_t = 1)]
    adults: u32,

    /// Ask for the single cheapest offer only
    #[arg(long)]
    cheapest: bool,

    /// Save the offer at this position (1-based, repeatable)
    #[arg(short, long = "save", value_name = "N")]
    save: Vec<usize>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Display language: en or es (overrides config)
    #[arg(long)]
    locale: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
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
    validate_format(&cli.format)?;

    let mut config = Config::load()?;
    if let Some(code) = &cli.locale {
        config.preferences.locale = parse_locale(code)?;
    }

    tracing::debug!("Using database at {}", config.db_path().display());
    let service = SkyfareService::from_config(config).await?;
    let mut search = service.search();
    apply_args(&mut search, &cli);
    search.form.validate()?;

    let status = if cli.cheapest {
        search.search_cheapest().await
    } else {
        search.search().await
    };

    let mut navigation = Navigation::new();
    let mut network = NetworkStatus::new();
    network.set_online(service.api().last_seen_online(), &mut navigation);

    if navigation.active_tab() == Tab::Saved {
        tracing::warn!("{} unreachable, falling back to saved flights", service.api().base_url());
        eprintln!("Backend unreachable, showing saved flights");
        let saved = service.database().list_flights().await?;
        output_saved(&saved, &cli.format)?;
        return Err(search_error(&search));
    }

    if status != SearchStatus::Success {
        return Err(search_error(&search));
    }

    // All positions are checked before anything is written
    let indices = save_indices(&cli.save, search.offers().len())?;
    let mut saved_ids = Vec::new();
    for index in indices {
        saved_ids.push(search.save_flight(index).await?);
    }

    if cli.format == "json" {
        output_offers_json(&search)?;
    } else {
        output_offers_text(&search);
        for id in saved_ids {
            eprintln!("Saved flight #{}", id);
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

/// 1-based `--save` positions as result indices
fn save_indices(positions: &[usize], available: usize) -> Result<Vec<usize>> {
    positions
        .iter()
        .map(|&position| {
            if position == 0 || position > available {
                Err(SkyfareError::InvalidInput(format!(
                    "No offer at position {} (have {})",
                    position, available
                )))
            } else {
                Ok(position - 1)
            }
        })
        .collect()
}

fn parse_locale(code: &str) -> Result<Locale> {
    code.parse().map_err(|_| {
        SkyfareError::InvalidInput(format!("Invalid locale '{}'. Must be 'en' or 'es'", code))
    })
}

fn apply_args(search: &mut SearchFlow, cli: &Cli) {
    if let Some(origin) = &cli.origin {
        search.form.origin = origin.clone();
    }
    if let Some(destination) = &cli.destination {
        search.form.destination = destination.clone();
    }
    if let Some(date) = &cli.date {
        search.form.departure_date = date.clone();
    }
    search.form.adults = cli.adults;
}

fn search_error(search: &SearchFlow) -> SkyfareError {
    let message = search.error().unwrap_or("Search failed").to_string();
    ApiError::Rejected(message).into()
}

fn output_offers_text(search: &SearchFlow) {
    if let Some(query) = search.query() {
        println!(
            "{} → {} · {}",
            query.origin,
            query.destination,
            format_date(&query.date)
        );
    }

    for (index, offer) in search.offers().iter().enumerate() {
        let saved = search
            .saved_id(index)
            .map(|id| format!("  [saved #{}]", id))
            .unwrap_or_default();
        println!(
            "{}. {:>10}  {}  {} → {}  {}  {}{}",
            index + 1,
            format_price(offer.price, &offer.currency),
            airline_label(offer),
            format_time(offer.departure_at.as_deref()),
            format_time(offer.arrival_at.as_deref()),
            format_duration(offer.duration.as_ref()),
            format_stops(offer.stops),
            saved
        );
    }
}

fn airline_label(offer: &FlightOffer) -> String {
    match (&offer.airline, &offer.airline_code) {
        (Some(name), Some(code)) => format!("{} ({})", name, code),
        (Some(name), None) => name.clone(),
        (None, Some(code)) => code.clone(),
        (None, None) => "Unknown airline".to_string(),
    }
}

fn output_offers_json(search: &SearchFlow) -> Result<()> {
    let json: Vec<serde_json::Value> = search
        .offers()
        .iter()
        .enumerate()
        .map(|(index, offer)| {
            serde_json::json!({
                "position": index + 1,
                "price": offer.price,
                "currency": offer.currency,
                "airline": offer.airline,
                "airline_code": offer.airline_code,
                "departure_at": offer.departure_at,
                "arrival_at": offer.arrival_at,
                "duration": offer.duration,
                "stops": offer.stops,
                "segments": offer.segments,
                "saved_id": search.saved_id(index),
            })
        })
        .collect();

    print_json(&json)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| SkyfareError::InvalidInput(format!("Failed to encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn output_saved(flights: &[SavedFlight], format: &str) -> Result<()> {
    if format == "json" {
        return print_json(flights);
    }

    for flight in flights {
        println!(
            "#{} {}  {}  {}",
            flight.id,
            flight.route(),
            format_date(&flight.travel_date),
            format_price(flight.price, &flight.currency)
        );
    }
    Ok(())
}
