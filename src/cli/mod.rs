//! CLI module for apimon
//!
//! Command-line interface definitions and handlers for the API health monitor.
//!
//! # Commands
//!
//! - `status` - Refresh once and print the endpoint table
//! - `watch` - Auto-refresh and re-render on every change
//! - `test` - Re-test one endpoint now
//! - `login` / `logout` - Manage the saved session
//! - `params` - Show or edit the saved parameter set
//! - `admin` - Manage the endpoint registry and users (admin role)
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! apimon login --project-key RS_P_1 --api-key RS5:... --role user
//! apimon status --category Match --status offline
//! apimon test api_1a2b3c4d123456
//! ```

pub mod admin;
pub mod completions;
pub mod config;
pub mod login;
pub mod output;
pub mod params;
pub mod status;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::admin::AdminError;
use crate::client::MonitorError;
use crate::config::ApimonConfig;
use crate::params::{ParamField, ParameterStore};
use crate::session::{Role, SessionStore};
use crate::snapshot::{EngineError, HttpMethod};
use crate::storage::LocalStore;
use crate::view::{CategoryFilter, SportFilter, StatusFilter};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// apimon - API health monitor client
#[derive(Parser, Debug)]
#[command(name = "apimon", version, about = "Monitor the health of registered APIs")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "apimon.toml", env = "APIMON_CONFIG")]
    pub config: PathBuf,

    /// Override the monitor backend URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override the local state file
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh once and show endpoint health
    Status(StatusArgs),
    /// Keep refreshing and re-render on every change
    Watch(WatchArgs),
    /// Re-test one endpoint now
    Test(TestArgs),
    /// Sign in and save the session
    Login(LoginArgs),
    /// Forget the saved session
    Logout,
    /// Saved request parameters
    #[command(subcommand)]
    Params(ParamsCommands),
    /// Registry administration (admin role)
    #[command(subcommand)]
    Admin(AdminCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only show this category ("All" for every category)
    #[arg(long, default_value = "All")]
    pub category: CategoryFilter,

    /// Only show endpoints in this state (all, online, offline, failed)
    #[arg(short, long, default_value = "all")]
    pub status: StatusFilter,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Seconds between refreshes (defaults to monitor.refresh_interval_seconds)
    #[arg(short, long)]
    pub interval_seconds: Option<u64>,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// Endpoint key to re-test
    pub key: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Project key
    #[arg(long)]
    pub project_key: String,

    /// API key issued for the project
    #[arg(long, env = "APIMON_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Role to sign in as (admin, user)
    #[arg(long, default_value = "user")]
    pub role: Role,
}

#[derive(Subcommand, Debug)]
pub enum ParamsCommands {
    /// Show the saved parameter set
    Show,
    /// Change one parameter
    Set(ParamsSetArgs),
    /// Restore the default parameter set
    Reset,
}

#[derive(Args, Debug)]
pub struct ParamsSetArgs {
    /// Field name (e.g. matchKey, match_key, MATCH_KEY)
    pub field: ParamField,
    /// New value
    pub value: String,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Manage registered endpoints
    #[command(subcommand)]
    Endpoints(EndpointsCommands),
    /// Manage users
    #[command(subcommand)]
    Users(UsersCommands),
}

#[derive(Subcommand, Debug)]
pub enum EndpointsCommands {
    /// List registered endpoints
    List(EndpointsListArgs),
    /// Register a new endpoint
    Add(EndpointAddArgs),
    /// Change fields of a registered endpoint
    Update(EndpointUpdateArgs),
    /// Remove a registered endpoint
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct EndpointsListArgs {
    /// Only show this category
    #[arg(long, default_value = "All")]
    pub category: CategoryFilter,

    /// Only show this sport
    #[arg(long, default_value = "All")]
    pub sport: SportFilter,

    /// Page to show (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Rows per page
    #[arg(long, default_value = "10")]
    pub per_page: usize,

    /// Output as JSON (all matching rows, no paging)
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EndpointAddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub url: String,
    /// GET, POST, PUT or DELETE
    #[arg(long, default_value = "GET")]
    pub method: HttpMethod,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub sport: String,
}

#[derive(Args, Debug)]
pub struct EndpointUpdateArgs {
    /// API key of the endpoint to change
    pub api_key: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub method: Option<HttpMethod>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub sport: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Key of the record to delete
    pub key: String,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List users
    List(UsersListArgs),
    /// Add a user
    Add(UserAddArgs),
    /// Change a user
    Update(UserUpdateArgs),
    /// Remove a user
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct UsersListArgs {
    /// Page to show (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Rows per page
    #[arg(long, default_value = "10")]
    pub per_page: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct UserAddArgs {
    #[arg(long)]
    pub project_key: String,
    #[arg(long)]
    pub username: String,
    #[arg(long, hide_env_values = true, env = "APIMON_USER_API_KEY")]
    pub api_key: String,
    #[arg(long, default_value = "user")]
    pub role: Role,
}

#[derive(Args, Debug)]
pub struct UserUpdateArgs {
    /// Project key the user is currently stored under
    pub project_key: String,
    /// Move the user to a new project key
    #[arg(long)]
    pub new_project_key: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub role: Option<Role>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "apimon.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Everything a command handler needs: resolved config and the local stores.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: ApimonConfig,
    pub sessions: SessionStore,
    pub params: ParameterStore,
}

impl AppContext {
    pub fn new(config: ApimonConfig) -> Self {
        let store = LocalStore::new(&config.storage.path);
        Self {
            sessions: SessionStore::new(store.clone()),
            params: ParameterStore::new(store),
            config,
        }
    }
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(cli: &Cli) -> anyhow::Result<ApimonConfig> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if cli.config.exists() {
        ApimonConfig::load(Some(&cli.config))?
    } else {
        tracing::debug!(path = %cli.config.display(), "Config file not found, using defaults");
        ApimonConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(ref url) = cli.base_url {
        config.monitor.base_url = url.clone();
    }
    if let Some(ref path) = cli.state {
        config.storage.path = path.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// The error means the operator has to sign in (again).
pub fn requires_login(err: &anyhow::Error) -> bool {
    if let Some(e) = err.downcast_ref::<EngineError>() {
        return e.requires_login();
    }
    if let Some(e) = err.downcast_ref::<MonitorError>() {
        return e.requires_login();
    }
    if let Some(e) = err.downcast_ref::<AdminError>() {
        return e.requires_login();
    }
    false
}
