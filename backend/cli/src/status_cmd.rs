//! CLI Status Command
//!
//! Reports gateway health, providers and active sessions.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::terminal_output::{note_error, note_success};

pub async fn run(base_url: &str) -> Result<()> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let response = match reqwest::Client::new().get(&url).send().await {
        Ok(response) => response,
        Err(_) => {
            note_error(&format!("Sports GPT is not running at {base_url}"));
            return Ok(());
        }
    };

    let body: Value = response
        .json()
        .await
        .context("Failed to parse health response")?;
    note_success(&format!(
        "Sports GPT {} is {}",
        body["version"].as_str().unwrap_or("?"),
        body["status"].as_str().unwrap_or("unknown")
    ));
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
