//! The remote catalog contract.
//!
//! [`CatalogClient`] is the only network boundary of a sync run. Implementors
//! own transport concerns (protocol version, compression, keep-alive); callers
//! only see the request/response shape below.

use thiserror::Error;

use crate::types::{DataSourceDefinition, DataSourceLink, ItemKind, ItemReference, RoleSpec};

/// Errors returned by a [`CatalogClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The item being created is already present in the catalog.
    #[error("item already exists: {path}")]
    AlreadyExists { path: String },

    /// The catalog rejected the call.
    #[error("catalog fault {code}: {message}")]
    Fault { code: String, message: String },

    /// The request never produced a catalog response (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The catalog responded with something that is not a valid reply.
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl ClientError {
    /// `true` for the one outcome folder creation treats as success.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClientError::AlreadyExists { .. })
    }
}

/// Request/response calls against the remote catalog, in the order a sync
/// run may issue them.
///
/// Paths are absolute catalog paths. The root folder is `/`; every other path
/// has no trailing separator.
pub trait CatalogClient {
    /// Create folder `name` under `parent`.
    fn create_folder(&mut self, name: &str, parent: &str) -> Result<(), ClientError>;

    /// Create (or overwrite) a shared data source.
    fn create_data_source(
        &mut self,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &DataSourceDefinition,
    ) -> Result<(), ClientError>;

    /// Upload a dataset or report definition. Returns the created item's path.
    fn create_catalog_item(
        &mut self,
        kind: ItemKind,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &[u8],
    ) -> Result<String, ClientError>;

    /// Bind an item's data source slots to shared data sources.
    fn set_item_data_sources(
        &mut self,
        item_path: &str,
        sources: &[DataSourceLink],
    ) -> Result<(), ClientError>;

    /// Bind an item's references (e.g. shared datasets) to catalog items.
    fn set_item_references(
        &mut self,
        item_path: &str,
        references: &[ItemReference],
    ) -> Result<(), ClientError>;

    fn create_role(&mut self, role: &RoleSpec) -> Result<(), ClientError>;
}

/// Join a child name onto a catalog folder path.
///
/// The catalog root is `/` while every other folder path has no trailing
/// separator, so only a parent already ending in `/` is joined without one.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

impl<C: CatalogClient + ?Sized> CatalogClient for &mut C {
    fn create_folder(&mut self, name: &str, parent: &str) -> Result<(), ClientError> {
        (**self).create_folder(name, parent)
    }

    fn create_data_source(
        &mut self,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &DataSourceDefinition,
    ) -> Result<(), ClientError> {
        (**self).create_data_source(name, parent, overwrite, definition)
    }

    fn create_catalog_item(
        &mut self,
        kind: ItemKind,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &[u8],
    ) -> Result<String, ClientError> {
        (**self).create_catalog_item(kind, name, parent, overwrite, definition)
    }

    fn set_item_data_sources(
        &mut self,
        item_path: &str,
        sources: &[DataSourceLink],
    ) -> Result<(), ClientError> {
        (**self).set_item_data_sources(item_path, sources)
    }

    fn set_item_references(
        &mut self,
        item_path: &str,
        references: &[ItemReference],
    ) -> Result<(), ClientError> {
        (**self).set_item_references(item_path, references)
    }

    fn create_role(&mut self, role: &RoleSpec) -> Result<(), ClientError> {
        (**self).create_role(role)
    }
}
