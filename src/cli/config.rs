use clap::{Parser, Subcommand};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "schema-form",
    version,
    about = "Compile server-described forms and submit their data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: schema-form.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append form lifecycle events to this JSONL file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a layout file (JSON or YAML) and print the control tree
    Compile {
        /// Layout list, or a form config object with a `layout` key
        #[arg(long)]
        layout: String,
    },

    /// Flatten a tree-shaped value into a submission record
    Flatten {
        /// Layout the value was produced from
        #[arg(long)]
        layout: String,

        /// Tree-shaped value (JSON or YAML object)
        #[arg(long)]
        value: String,
    },

    /// Normalize an action list
    Actions {
        /// Action list, or a form config object with an `actions` key
        #[arg(long)]
        file: String,
    },

    /// Fetch a form from the server and print its compiled tree
    Fetch {
        /// Resource URL (overrides server.url from the config file)
        #[arg(long)]
        url: Option<String>,
    },

    /// Fill a server form from a flat data file and submit it
    Submit {
        /// Resource URL (overrides server.url from the config file)
        #[arg(long)]
        url: Option<String>,

        /// Flat `{field id: value}` record
        #[arg(long)]
        data: String,

        /// Id of the pressed action button
        #[arg(long)]
        button: Option<String>,

        /// Report a cancel instead of submitting
        #[arg(long, default_value_t = false)]
        cancel: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `schema-form.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Query parameters for the form request, merged under submitted data
    #[serde(default)]
    pub extra_form_data: Map<String, Value>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
            extra_form_data: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: Option<String>,
}

fn default_timeout_secs() -> u64 { 30 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("schema-form.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// CLI value first, then config file.
pub fn resolve_url(cli_url: Option<&str>, config: &AppConfig) -> Option<String> {
    cli_url
        .map(str::to_string)
        .or_else(|| config.server.url.clone())
}

/// `-v` count to a log filter; warnings are always shown.
pub fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
