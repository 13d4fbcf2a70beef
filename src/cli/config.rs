use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::form::descriptor::DEFAULT_TIMEOUT_MS;
use crate::notify::notifier::ToastDurations;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "formpost",
    version,
    about = "Classify and submit HTML forms described in a page file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: formpost.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which forms on a page would be intercepted, and why
    Classify {
        /// Page description (YAML)
        #[arg(long)]
        page: String,
    },

    /// Fill in and submit one form from a page
    Submit {
        /// Page description (YAML)
        #[arg(long)]
        page: String,

        /// Identifier of the form to submit
        #[arg(long)]
        form: String,

        /// Field assignment, repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Fallback request timeout for forms without data-timeout
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `formpost.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    pub user_agent: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_toast_ms")]
    pub toast_ms: u64,

    #[serde(default = "default_error_toast_ms")]
    pub error_toast_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            toast_ms: 3000,
            error_toast_ms: 5000,
        }
    }
}

impl NotifyConfig {
    pub fn durations(&self) -> ToastDurations {
        ToastDurations {
            default: Duration::from_millis(self.toast_ms),
            error: Duration::from_millis(self.error_toast_ms),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// JSONL trace output; unset disables tracing
    pub path: Option<String>,
}

// Serde default helpers
fn default_timeout_ms() -> u64 { DEFAULT_TIMEOUT_MS }
fn default_toast_ms() -> u64 { 3000 }
fn default_error_toast_ms() -> u64 { 5000 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("formpost.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

/// Apply CLI overrides on top of the loaded config.
pub fn merge_cli_overrides(mut config: AppConfig, timeout_ms: Option<u64>) -> AppConfig {
    if let Some(t) = timeout_ms.filter(|t| *t > 0) {
        config.request.default_timeout_ms = t;
    }
    config
}
