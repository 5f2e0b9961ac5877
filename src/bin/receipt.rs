//! Receipt scanning utility
//!
//! Uploads a receipt image to the OCR service, polls for the parsed
//! result, and prints a summary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use sourdough::receipt::{Client, PollConfig, ProcessOptions};

#[derive(Parser)]
#[command(
    name = "sourdough-receipt",
    about = "Upload a receipt image and print the parsed summary"
)]
struct Args {
    /// Path to the receipt image (JPEG)
    image: PathBuf,

    /// Region hint for date and number parsing
    #[arg(long, default_value = "gb")]
    region: String,

    /// Document type to request
    #[arg(long, default_value = "receipt")]
    document_type: String,

    /// Seconds to wait for the scan result
    #[arg(long, default_value_t = 90)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let api_key = std::env::var("TABSCANNER_API_KEY")
        .or_else(|_| std::env::var("API_KEY"))
        .context(
            "Missing API key. Set TABSCANNER_API_KEY (recommended) or API_KEY \
             in your environment/.env",
        )?;

    let client = Client::new(api_key)?;
    let options = ProcessOptions {
        region: args.region,
        document_type: args.document_type,
    };

    println!("Uploading {}...", args.image.display());
    let token = client.process(&args.image, &options).await?;
    println!("Token: {}", token);

    println!("Waiting for result...");
    let schedule = PollConfig {
        timeout: Duration::from_secs(args.timeout),
        ..PollConfig::default()
    };
    let payload = client.poll_result(&token, &schedule).await?;

    match payload.result {
        Some(receipt) => print!("\n{}", receipt.summary()),
        None => println!("Scan finished but returned no parsed receipt."),
    }

    Ok(())
}
