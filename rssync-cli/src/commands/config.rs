//! `rssync config`: inspect configuration.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use rssync_core::config::config_path_at;

use super::ConnectionArgs;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the default config file location.
    Path,

    /// Print the effective settings after merging the file with flags.
    Show {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Serialize)]
struct EffectiveConfig<'a> {
    endpoint: Option<&'a str>,
    username: Option<&'a str>,
    password: &'static str,
    root: &'a str,
    timeout_secs: u64,
    properties: &'a rssync_core::PropertyTable,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Path => {
            let home = dirs::home_dir().context("could not determine home directory")?;
            println!("{}", config_path_at(&home).display());
        }
        ConfigCommand::Show { connection } => {
            let config = connection.resolve(Default::default())?;
            let effective = EffectiveConfig {
                endpoint: config.endpoint.as_deref(),
                username: config.username.as_deref(),
                password: if config.password.is_some() { "********" } else { "" },
                root: &config.root,
                timeout_secs: config.timeout.as_secs(),
                properties: &config.properties,
            };
            print!("{}", serde_yaml::to_string(&effective)?);
        }
    }
    Ok(())
}
