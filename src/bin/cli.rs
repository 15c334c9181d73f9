//! Chatroom CLI
//!
//! Command-line client for the Chatroom REST API:
//! - List, inspect, create and delete rooms
//! - Check server status
//! - Generate a config file

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatroom-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage rooms on a Chatroom server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all rooms
    Rooms,

    /// Show a room and its members
    Show {
        /// Room name
        name: String,
    },

    /// Create a room
    Create {
        /// Room name
        name: String,
        /// Maximum number of members
        #[arg(short, long, default_value = "50")]
        capacity: i64,
    },

    /// Close a room, disconnecting its members
    Delete {
        /// Room name
        name: String,
    },

    /// Show server health
    Health,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Rooms => {
            let response = client
                .get(format!("{}/api/v1/rooms", cli.api_url))
                .send()
                .await
                .with_context(|| format!("Cannot connect to Chatroom API at {}", cli.api_url))?;
            let data = expect_success(response).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
                return Ok(());
            }

            let default_room = data["default_room"].as_str().unwrap_or("");
            println!("{:<24} {:>8} {:>9}", "Room", "Members", "Capacity");
            println!("{}", "-".repeat(43));

            for room in data["rooms"].as_array().into_iter().flatten() {
                let name = room["name"].as_str().unwrap_or("-");
                let marker = if name == default_room { " *" } else { "" };
                println!(
                    "{:<24} {:>8} {:>9}",
                    format!("{}{}", name, marker),
                    room["members"].as_u64().unwrap_or(0),
                    room["capacity"].as_u64().unwrap_or(0)
                );
            }
            println!();
            println!("* default room");
        }

        Commands::Show { name } => {
            let response = client
                .get(room_url(&cli.api_url, &name)?)
                .send()
                .await?;
            let data = expect_success(response).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
                return Ok(());
            }

            let members: Vec<&str> = data["members"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|m| m.as_str())
                .collect();

            println!("Room:     {}", data["name"].as_str().unwrap_or("-"));
            println!(
                "Members:  {}/{}",
                members.len(),
                data["capacity"].as_u64().unwrap_or(0)
            );
            println!("Created:  {}", data["created_at"].as_str().unwrap_or("-"));
            for member in members {
                println!("  - {}", member);
            }
        }

        Commands::Create { name, capacity } => {
            let body = serde_json::json!({
                "name": name,
                "capacity": capacity,
            });

            let response = client
                .post(format!("{}/api/v1/rooms", cli.api_url))
                .json(&body)
                .send()
                .await?;
            let data = expect_success(response).await?;

            println!(
                "Created room {} (capacity {})",
                data["name"].as_str().unwrap_or(&name),
                data["capacity"].as_u64().unwrap_or(0)
            );
        }

        Commands::Delete { name } => {
            let response = client
                .delete(room_url(&cli.api_url, &name)?)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Delete failed ({}): {}", status, text);
            }
            println!("Deleted room {}", name);
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.api_url))
                .send()
                .await
                .with_context(|| {
                    format!(
                        "Cannot connect to Chatroom API at {}; is `cargo run --bin chatroom` running?",
                        cli.api_url
                    )
                })?;
            let health = expect_success(response).await?;

            println!("Chatroom v{}", health["version"].as_str().unwrap_or("unknown"));
            println!();
            println!("Status:   {}", health["status"].as_str().unwrap_or("unknown"));
            println!("Rooms:    {}", health["rooms"].as_u64().unwrap_or(0));
            println!("Sessions: {}", health["sessions"].as_u64().unwrap_or(0));
            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!("Uptime:   {}", format_duration(uptime));
            }
        }

        Commands::Config { output } => {
            let content = chatroom::config::generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Wrote default config to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// URL of a single room, with the name percent-encoded as one path segment
fn room_url(api_url: &str, name: &str) -> Result<reqwest::Url> {
    let mut url =
        reqwest::Url::parse(api_url).with_context(|| format!("Invalid API URL: {}", api_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("API URL cannot take a path: {}", api_url))?
        .pop_if_empty()
        .extend(["api", "v1", "rooms", name]);
    Ok(url)
}

/// Parse a JSON body, or fail with the server's error message
async fn expect_success(response: reqwest::Response) -> Result<serde_json::Value> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let message = body["error"]["message"].as_str().unwrap_or("no details");
    bail!("Request failed ({}): {}", status, message)
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
