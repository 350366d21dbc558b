//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── gemini: GeminiConfig   # Endpoint, model, timeouts
//! ├── gemini_api_key         # GEMINI_API_KEY
//! ├── brand / nutrition      # Image files
//! └── output / quiet         # Where and how results are shown
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//!
//! # Example
//!
//! ```bash
//! nutriscan --brand front.jpg --nutrition label.jpg
//!
//! # Or via environment variables
//! GEMINI_API_KEY="..." GEMINI_MODEL="gemini-1.5-pro" nutriscan --brand front.jpg --nutrition label.jpg
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use nutriscan_gemini::{GeminiConfig, GeminiCredentials};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "nutriscan")]
#[command(about = "Analyze food product labels with Gemini")]
#[command(version)]
pub struct Cli {
    /// Gemini endpoint and model configuration.
    #[clap(flatten)]
    pub gemini: GeminiConfig,

    /// Gemini API key.
    #[arg(long = "gemini-api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Image of the product's brand side.
    #[arg(long, value_name = "PATH")]
    pub brand: Option<PathBuf>,

    /// Image of the nutrition facts panel.
    #[arg(long, value_name = "PATH")]
    pub nutrition: Option<PathBuf>,

    /// File overwritten with the current output as it changes.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Suppress progress lines on stderr.
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so that its
    /// variables can serve as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.gemini
            .validate()
            .context("invalid Gemini configuration")?;
        Ok(())
    }

    /// Builds the API credentials.
    ///
    /// A missing key is reported here, before any submission is made.
    pub fn credentials(&self) -> anyhow::Result<GeminiCredentials> {
        let key = self
            .gemini_api_key
            .as_deref()
            .context("no Gemini API key configured; pass --gemini-api-key or set GEMINI_API_KEY")?;

        GeminiCredentials::api_key(key).context("invalid Gemini API key")
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            base_url = %self.gemini.base_url,
            model = %self.gemini.model,
            timeout_secs = self.gemini.timeout_secs,
            connect_timeout_secs = self.gemini.connect_timeout_secs,
            api_key_set = self.gemini_api_key.is_some(),
            "Gemini configuration"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            brand = ?self.brand,
            nutrition = ?self.nutrition,
            output = ?self.output,
            quiet = self.quiet,
            "Submission configuration"
        );
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
