use crate::config::toml_config::PhoneIntelConfig;
use crate::core::availability::AvailabilitySettings;
use crate::domain::ports::CheckerSettings;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "phone-intel")]
#[command(about = "Detect, normalize and check phone numbers")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, global = true, help = "Channel verification endpoint")]
    pub endpoint: Option<String>,

    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    #[arg(long, global = true)]
    pub min_digits: Option<usize>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Guess the country of digits typed without `+`
    Detect { digits: String },
    /// Normalize and validate a full number, or national digits with --calling-code
    Validate {
        number: String,
        #[arg(long)]
        calling_code: Option<String>,
    },
    /// Ask the verification service whether the number has a chat channel
    Check { number: String },
    /// Read successive field values from stdin and report debounced availability
    Watch,
}

impl CliConfig {
    /// CLI 參數優先於設定檔
    pub fn resolve_endpoint<'a>(&'a self, file: Option<&'a PhoneIntelConfig>) -> Option<&'a str> {
        self.endpoint
            .as_deref()
            .or_else(|| file.map(|f| f.endpoint()))
    }

    pub fn resolve_settings(&self, file: Option<&PhoneIntelConfig>) -> AvailabilitySettings {
        let base = file
            .map(|f| f.availability_settings())
            .unwrap_or_default();

        AvailabilitySettings {
            debounce: self
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(base.debounce()),
            min_digits: self.min_digits.unwrap_or(base.min_digits()),
            timeout: self
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(base.timeout()),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        if let Some(endpoint) = &self.endpoint {
            validation::validate_url("endpoint", endpoint)?;
        }
        if let Some(timeout) = self.timeout_ms {
            validation::validate_positive_number("timeout_ms", timeout, 1)?;
        }
        if let Some(min_digits) = self.min_digits {
            validation::validate_range("min_digits", min_digits, 1, 15)?;
        }
        if let Command::Validate {
            calling_code: Some(code),
            ..
        } = &self.command
        {
            validation::validate_digits("calling_code", code.trim_start_matches('+'))?;
        }
        Ok(())
    }
}
