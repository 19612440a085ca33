pub mod config;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use rssync_core::{config as core_config, ConfigFile, ConfigOverrides, RunConfig};

/// Connection and substitution flags shared by every command that resolves a
/// run configuration. Each one overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Config file to read instead of ~/.rssync/config.yaml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report server URL (base URL or the ReportService2010.asmx address).
    #[arg(short = 'H', long, value_name = "URL")]
    pub endpoint: Option<String>,

    #[arg(short, long)]
    pub username: Option<String>,

    #[arg(long, env = "RSSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Catalog folder every path is created under (must start with '/').
    #[arg(short, long, value_name = "FOLDER")]
    pub root: Option<String>,

    /// Define a substitution property; repeatable.
    #[arg(short, long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ConnectionArgs {
    /// Read the config file these flags point at, or the default one.
    pub fn load_file(&self) -> Result<ConfigFile> {
        match &self.config {
            Some(path) => core_config::load_file(path)
                .with_context(|| format!("failed to load config file {}", path.display())),
            None => core_config::load_default().context("failed to load ~/.rssync/config.yaml"),
        }
    }

    /// Merge the config file with these flags.
    pub fn resolve(&self, descriptor: PathBuf) -> Result<RunConfig> {
        let file = self.load_file()?;
        let overrides = ConfigOverrides {
            endpoint: self.endpoint.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            root: self.root.clone(),
            timeout_secs: self.timeout,
            properties: self.properties.clone(),
        };
        RunConfig::resolve(descriptor, file, overrides).context("invalid configuration")
    }
}
