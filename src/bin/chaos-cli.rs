use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use chaos_proxy::config::ChaosConfig;

#[derive(Parser)]
#[command(name = "chaos-cli")]
#[command(about = "Management CLI for the chaos proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy system status
    Status,
    /// Print the live chaos configuration
    Show,
    /// List the fault kinds that can currently fire
    Active,
    /// Replace the chaos configuration with the contents of a JSON file
    Apply { file: PathBuf },
    /// Turn chaos on, keeping the rest of the configuration
    Enable,
    /// Turn chaos off, keeping the rest of the configuration
    Disable,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;

    let chaos_url = format!("{}/admin/chaos", cli.url);

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Show => {
            let res = client.get(&chaos_url).send().await?;
            print_response(res).await?;
        }
        Commands::Active => {
            let res = client.get(format!("{chaos_url}/active")).send().await?;
            print_response(res).await?;
        }
        Commands::Apply { file } => {
            let content = tokio::fs::read_to_string(&file).await?;
            let config: ChaosConfig = serde_json::from_str(&content)?;
            let res = client.put(&chaos_url).json(&config).send().await?;
            print_response(res).await?;
        }
        Commands::Enable => set_enabled(&client, &chaos_url, true).await?,
        Commands::Disable => set_enabled(&client, &chaos_url, false).await?,
    }

    Ok(())
}

/// Read-modify-write of the `enabled` flag.
async fn set_enabled(
    client: &reqwest::Client,
    chaos_url: &str,
    enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let res = client.get(chaos_url).send().await?.error_for_status()?;
    let mut config: ChaosConfig = res.json().await?;
    config.enabled = enabled;
    let res = client.put(chaos_url).json(&config).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
