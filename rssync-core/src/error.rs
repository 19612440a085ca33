//! Error types for rssync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while assembling a run configuration.
///
/// Every variant is fatal and is raised before any remote call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A `key=value` property definition without `=` or with an empty key.
    #[error("malformed property '{0}'; expected key=value")]
    MalformedProperty(String),

    /// The root folder override does not begin with `/`.
    #[error("invalid root folder '{0}'; the root must begin with '/'")]
    InvalidRoot(String),

    /// A setting needed for this run was not supplied on the command line or in the config file.
    #[error("missing required setting '{0}'")]
    MissingSetting(&'static str),

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.rssync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
