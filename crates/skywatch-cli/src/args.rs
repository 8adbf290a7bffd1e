//! Command line overrides shared by the binaries.

use clap::Args;
use skywatch_core::ModeSwitchPolicy;
use skywatch_sdk::{Config, HistoryFailurePolicy};

/// Backend connection flags. Anything left unset keeps the value from the
/// environment.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// REST API base URL (e.g. http://localhost:5000/api)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Push channel URL (e.g. ws://localhost:5000)
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Drone addressed by mode commands
    #[arg(long)]
    pub drone_id: Option<String>,

    /// activate-only or exclusive
    #[arg(long)]
    pub mode_policy: Option<ModeSwitchPolicy>,

    /// clear or keep
    #[arg(long)]
    pub history_failure: Option<HistoryFailurePolicy>,
}

impl BackendArgs {
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(api_url) = self.api_url {
            config.api_url = api_url;
        }
        if let Some(ws_url) = self.ws_url {
            config.ws_url = ws_url;
        }
        if let Some(drone_id) = self.drone_id {
            config.drone_id = drone_id;
        }
        if let Some(policy) = self.mode_policy {
            config.mode_policy = policy;
        }
        if let Some(policy) = self.history_failure {
            config.history_failure = policy;
        }
        config
    }

    /// Environment config with these flags applied.
    pub fn into_config(self) -> Config {
        self.apply(Config::from_env())
    }
}
