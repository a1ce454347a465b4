//! Mail Message CLI - Render message bodies and tracking values from files.
//!
//! Quote collapsing prints HTML; tracking value formatting prints JSON for
//! integration with other tools.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mail_message_core::{
    content::sanitize, ApiResponse, Catalog, Config, MessageBody, ReadMoreLabels,
    TrackingFormatter, TrackingValue,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "mail-message")]
#[command(about = "Mail message CLI - quote collapsing and tracking values")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ~/.mail-message/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collapse quoted content of an HTML body behind "read more" toggles
    Quotes {
        /// HTML file
        file: PathBuf,
        /// Sanitize the body before transforming it
        #[arg(long)]
        sanitize: bool,
    },
    /// Format a JSON list of tracking values
    Tracking {
        /// JSON file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    let catalog = match &config.locale {
        Some(locale) => Catalog::load(locale),
        None => Catalog::detect(),
    };

    let output = match cli.command {
        Commands::Quotes { file, sanitize } => handle_quotes(&file, sanitize, &catalog)?,
        Commands::Tracking { file } => handle_tracking(&file, &config, catalog)?,
    };

    println!("{}", output);
    Ok(())
}

fn handle_quotes(file: &Path, sanitize_body: bool, catalog: &Catalog) -> Result<String> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let html = if sanitize_body { sanitize(&raw) } else { raw };

    let mut body = MessageBody::new(ReadMoreLabels::from_catalog(catalog));
    body.update(&html);
    tracing::info!(
        "Collapsed {} quote groups in {}",
        body.groups().len(),
        file.display()
    );
    Ok(body.to_html())
}

fn handle_tracking(file: &Path, config: &Config, catalog: Catalog) -> Result<String> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let entries: Vec<TrackingValue> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => return Ok(serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string()))?),
    };

    let formatter = TrackingFormatter::from_config(config, catalog);
    let output = match formatter.format_tracking_values(&entries) {
        Ok(values) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
            "tracking_values": values,
            "count": values.len(),
        })))?,
        Err(e) => serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string()))?,
    };
    Ok(output)
}
