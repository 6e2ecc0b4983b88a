//! sky-watch - Manage price watchers and alerts
//!
//! Unix-style tool for the server-side price watchers tied to this device
//! and the alerts they raise.

use clap::{Parser, Subcommand};
use libskyfare::formatters::{format_date, format_date_time, format_price, format_time_ago};
use libskyfare::service::{
    is_price_below_target, price_trend, PriceWatcherFlow, SearchForm, SkyfareService,
};
use libskyfare::types::TrendDirection;
use libskyfare::{Config, Locale, PriceAlert, PriceWatcher, Result, SkyfareError};

#[derive(Parser, Debug)]
#[command(name = "sky-watch")]
#[command(version)]
#[command(about = "Manage price watchers and alerts")]
#[command(long_about = "\
sky-watch - Manage price watchers and alerts

DESCRIPTION:
    sky-watch manages price watchers: standing requests that the backend
    checks periodically, raising an alert when a route drops below the
    target price. Watchers belong to this device's identifier, which is
    created on first use and kept next to the database.

COMMANDS:
    list        List watchers
    create      Watch a route and date for a target price
    pause       Stop checking a watcher
    resume      Start checking a paused watcher again
    toggle      Pause an active watcher or resume a paused one
    delete      Delete a watcher
    history     Show the recorded price checks of a watcher
    alerts      List price alerts
    read        Mark an alert as read
    device      Show or reset this device's identifier

USAGE EXAMPLES:
    # Watch MEX -> MAD on Dec 1st for anything under $15,000
    sky-watch create MEX MAD 2026-12-01 15000

    # Active watchers only
    sky-watch list --active

    # Unread alerts, with a desktop notification for each
    sky-watch alerts --unread --notify

    # Price checks as JSON
    sky-watch history w1 --format json

CONFIGURATION:
    Configuration file: ~/.config/skyfare/config.toml
    Database location: ~/.local/share/skyfare/flights.db

    Override with environment variables:
        SKYFARE_CONFIG     - Path to config file
        SKYFARE_DB_PATH    - Path to database file
        SKYFARE_API_URL    - Backend base URL

EXIT CODES:
    0 - Success
    1 - Operation failed (backend rejected or unreachable)
    2 - Database or configuration error
    3 - Invalid input (bad airport code, price, unknown watcher, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Display language: en or es (overrides config)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List watchers
    List {
        /// Only active watchers
        #[arg(long, conflicts_with = "paused")]
        active: bool,

        /// Only paused watchers
        #[arg(long)]
        paused: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create a watcher
    Create {
        /// Origin airport code
        origin: String,

        /// Destination airport code
        destination: String,

        /// Travel date, YYYY-MM-DD
        date: String,

        /// Alert when the price drops below this amount
        target: f64,
    },

    /// Pause a watcher
    Pause {
        /// Watcher ID
        id: String,
    },

    /// Resume a paused watcher
    Resume {
        /// Watcher ID
        id: String,
    },

    /// Pause or resume a watcher depending on its current state
    Toggle {
        /// Watcher ID
        id: String,
    },

    /// Delete a watcher
    Delete {
        /// Watcher ID
        id: String,
    },

    /// Show price history for a watcher
    History {
        /// Watcher ID
        id: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List price alerts
    Alerts {
        /// Only unread alerts
        #[arg(long)]
        unread: bool,

        /// Show a notification for each unread alert
        #[arg(long)]
        notify: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Mark an alert as read
    Read {
        /// Alert ID
        id: String,
    },

    /// Show this device's identifier
    Device {
        /// Forget the current identifier and create a new one
        #[arg(long)]
        reset: bool,
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
    let mut config = Config::load()?;
    if let Some(code) = &cli.locale {
        config.preferences.locale = code.parse::<Locale>().map_err(|_| {
            SkyfareError::InvalidInput(format!("Invalid locale '{}'. Must be 'en' or 'es'", code))
        })?;
    }

    tracing::debug!(
        "Using backend at {} (database {})",
        config.api.base_url,
        config.db_path().display()
    );
    let service = SkyfareService::from_config(config).await?;
    let mut flow = service.watchers();

    match cli.command {
        Commands::List {
            active,
            paused,
            format,
        } => {
            validate_format(&format)?;
            flow.fetch_watchers().await?;
            let watchers: Vec<&PriceWatcher> = if active {
                flow.active_watchers()
            } else if paused {
                flow.paused_watchers()
            } else {
                flow.watchers().iter().collect()
            };
            output_watchers(&watchers, &format)?;
        }
        Commands::Create {
            origin,
            destination,
            date,
            target,
        } => {
            let form = SearchForm {
                origin,
                destination,
                departure_date: date,
                ..SearchForm::default()
            };
            form.validate()?;
            let id = flow
                .create_watcher(&form.origin, &form.destination, &form.departure_date, target)
                .await?;
            let route = flow.watcher(&id).map(PriceWatcher::route).unwrap_or_default();
            println!("Created watcher {} ({})", id, route);
        }
        Commands::Pause { id } => {
            flow.pause_watcher(&id).await?;
            println!("Paused watcher {}", id);
        }
        Commands::Resume { id } => {
            flow.resume_watcher(&id).await?;
            println!("Resumed watcher {}", id);
        }
        Commands::Toggle { id } => {
            flow.fetch_watchers().await?;
            if flow.toggle_watcher(&id).await? {
                println!("Resumed watcher {}", id);
            } else {
                println!("Paused watcher {}", id);
            }
        }
        Commands::Delete { id } => {
            flow.delete_watcher(&id).await?;
            println!("Deleted watcher {}", id);
        }
        Commands::History { id, format } => {
            validate_format(&format)?;
            let entries = flow.price_history(&id).await;
            tracing::debug!("Watcher {} has {} price check(s)", id, entries.len());
            if format == "json" {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("No price history for watcher {}", id);
            } else {
                for entry in &entries {
                    println!(
                        "{}  {}",
                        format_date_time(&entry.checked_at),
                        format_price(entry.price, service.config().preferences.currency.as_str())
                    );
                }
            }
        }
        Commands::Alerts {
            unread,
            notify,
            format,
        } => {
            validate_format(&format)?;
            flow.fetch_alerts(unread).await?;
            output_alerts(&flow, &format)?;
            if notify {
                let sent = flow.notify_unread().await;
                eprintln!("Sent {} notification(s)", sent);
            }
        }
        Commands::Read { id } => {
            flow.fetch_alerts(false).await?;
            flow.mark_alert_read(&id).await?;
            println!("Marked alert {} as read ({} unread)", id, flow.unread_count());
        }
        Commands::Device { reset } => {
            if reset {
                service.device().reset_device_id()?;
            }
            println!("{}", service.device().device_id()?);
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

fn output_watchers(watchers: &[&PriceWatcher], format: &str) -> Result<()> {
    if format == "json" {
        let json: Vec<serde_json::Value> = watchers
            .iter()
            .map(|w| {
                let trend = price_trend(w);
                serde_json::json!({
                    "watcher": w,
                    "below_target": is_price_below_target(w),
                    "trend": trend,
                })
            })
            .collect();
        return print_json(&json);
    }

    if watchers.is_empty() {
        println!("No watchers");
        return Ok(());
    }

    for watcher in watchers {
        println!("{}", watcher_line(watcher));
    }
    Ok(())
}

fn watcher_line(watcher: &PriceWatcher) -> String {
    let mut line = format!(
        "{} {} {}  {}  target {}",
        watcher.id,
        if watcher.is_active { "●" } else { "○" },
        watcher.route(),
        format_date(&watcher.travel_date),
        format_price(watcher.target_price, &watcher.currency)
    );

    if let Some(last) = watcher.last_price {
        let trend = price_trend(watcher);
        let arrow = match trend.direction {
            TrendDirection::Up => "↑",
            TrendDirection::Down => "↓",
            TrendDirection::Stable => "→",
        };
        line.push_str(&format!(
            "  last {} {} {:.1}%",
            format_price(last, &watcher.currency),
            arrow,
            trend.percent
        ));
    }
    line.push_str(&format!(
        "  checked {}",
        format_time_ago(watcher.last_checked_at.as_deref())
    ));
    if is_price_below_target(watcher) {
        line.push_str("  ✓ below target");
    }
    line
}

fn output_alerts(flow: &PriceWatcherFlow, format: &str) -> Result<()> {
    if format == "json" {
        return print_json(&serde_json::json!({
            "alerts": flow.alerts(),
            "unread_count": flow.unread_count(),
        }));
    }

    if flow.alerts().is_empty() {
        println!("No alerts");
    }
    for alert in flow.alerts() {
        println!("{}", alert_line(alert));
    }
    println!("{} unread", flow.unread_count());
    Ok(())
}

fn alert_line(alert: &PriceAlert) -> String {
    format!(
        "{} {} {}  {} → {}  ({})",
        alert.id,
        if alert.is_read { " " } else { "•" },
        alert.route,
        format_price(alert.old_price, "MXN"),
        format_price(alert.new_price, "MXN"),
        format_time_ago(Some(&alert.triggered_at))
    )
}
