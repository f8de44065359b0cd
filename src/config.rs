//! Configuration and CLI argument handling

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "tab-reloader")]
#[command(about = "A state-managed daemon for automatic browser tab reloading")]
#[command(version)]
pub struct Config {
    /// Port to bind the status surface to
    #[arg(short, long, default_value = "20717")]
    pub port: u16,

    /// Host address to bind the status surface to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Durable storage file (defaults to the platform data directory)
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Deadline in milliseconds for collaborator-extension round-trips
    #[arg(long, default_value = "250")]
    pub collaborator_timeout_ms: u64,

    /// Delay in seconds before the second startup restore pass
    #[arg(long, default_value = "5")]
    pub restore_delay_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Resolved durable storage path
    pub fn storage_path(&self) -> PathBuf {
        self.storage.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tab-reloader")
                .join("storage.json")
        })
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn restore_delay(&self) -> Duration {
        Duration::from_secs(self.restore_delay_secs)
    }
}
