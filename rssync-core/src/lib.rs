//! rssync core library: catalog domain types, the remote catalog contract,
//! run configuration, errors.
//!
//! - [`types`]: item kinds, data-source definitions, links, roles
//! - [`catalog`]: the [`CatalogClient`] trait and [`ClientError`]
//! - [`config`]: [`RunConfig`], [`PropertyTable`], YAML config file
//! - [`error`]: [`ConfigError`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

pub use catalog::{join_path, CatalogClient, ClientError};
pub use config::{ConfigFile, ConfigOverrides, PropertyTable, RunConfig};
pub use error::ConfigError;
pub use types::{
    CredentialRetrieval, DataSourceDefinition, DataSourceLink, ItemKind, ItemReference, RoleSpec,
    TaskId, DEFAULT_ROOT,
};
