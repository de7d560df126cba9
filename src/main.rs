use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use cogs::config;
use cogs::export;
use cogs::orders::OrdersClient;
use cogs::sheets::{self, SheetPublisher};

/// Fetches WooCommerce orders and saves them to CSV.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Path to the JSON file holding the WooCommerce credentials
    #[arg(long, default_value = config::DEFAULT_CONFIG)]
    config: PathBuf,
    /// Path to an auth JSON file; if given, the CSV is also uploaded to
    /// Google Sheets
    #[arg(long)]
    auth_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let creds = config::load_or_prompt(&args.config)?;

    // The auth file must exist before any network activity begins.
    if let Some(auth_file) = &args.auth_file {
        if !auth_file.exists() {
            bail!("Auth file {} not found", auth_file.display());
        }
        println!("Using auth file: {}", auth_file.display());
    }

    let orders = OrdersClient::new(creds).fetch_all()?;
    let rows = export::write_csv(export::EXPORT_PATH, &orders)?;
    println!(
        "Wrote {} orders ({rows} rows) to {}",
        orders.len(),
        export::EXPORT_PATH
    );

    if let Some(auth_file) = &args.auth_file {
        let publisher = SheetPublisher::from_auth_file(auth_file)?;
        let grid = sheets::read_grid(export::EXPORT_PATH)?;
        let uploaded = publisher.publish(&grid)?;
        println!("Uploaded {uploaded} rows to Google Sheet {}", sheets::SHEET_NAME);
    }

    Ok(())
}
