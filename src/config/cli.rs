use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use placard_api_types::AssetUpdate;

/// Command-line arguments for the Placard binary.
#[derive(Debug, Parser)]
#[command(
    name = "placard",
    version,
    about = "Placard UI asset distribution client"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PLACARD_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Load the UI config through the session cache and print it.
    Load,
    /// Drop the cached snapshot, fetch a fresh one and print it.
    Refresh,
    /// Drop the cached snapshot.
    Invalidate,
    /// List editable assets grouped by section.
    Assets(AssetsArgs),
    /// Update one asset value.
    Set(SetArgs),
    /// Update several asset values in one batch.
    #[command(name = "set-many")]
    SetMany(SetManyArgs),
    /// Apply the UI config to an HTML document and print the result.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the asset store base URL.
    #[arg(long = "store-url", value_name = "URL", global = true)]
    pub store_url: Option<String>,

    /// Override the admin session cookie sent on admin requests.
    #[arg(
        long = "store-session-cookie",
        env = "PLACARD_SESSION_COOKIE",
        value_name = "COOKIE",
        global = true,
        hide_env_values = true
    )]
    pub store_session_cookie: Option<String>,

    /// Override the snapshot cache TTL in milliseconds.
    #[arg(long = "cache-ttl-ms", value_name = "MILLIS", global = true)]
    pub cache_ttl_ms: Option<u64>,

    /// Override the cache storage backend (memory|file|disabled).
    #[arg(long = "cache-storage", value_name = "KIND", global = true)]
    pub cache_storage: Option<String>,

    /// Override the session directory used by file storage.
    #[arg(long = "cache-directory", value_name = "PATH", global = true)]
    pub cache_directory: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct AssetsArgs {
    /// Print the grouped listing as JSON instead of a table.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SetArgs {
    /// Asset key to update.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// New value; an empty string clears the asset.
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Debug, Args, Clone)]
pub struct SetManyArgs {
    /// Updates written as KEY=VALUE.
    #[arg(value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub updates: Vec<AssetUpdate>,

    /// JSON file holding `[{"key": ..., "value": ...}]`; merged after inline updates.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// HTML document whose `data-ui-key` elements receive config values.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Sanitize `raw_html` values before inserting them.
    #[arg(long = "sanitize-markup", action = clap::ArgAction::SetTrue)]
    pub sanitize_markup: bool,
}

fn parse_assignment(raw: &str) -> Result<AssetUpdate, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok(AssetUpdate::new(key, value))
}
