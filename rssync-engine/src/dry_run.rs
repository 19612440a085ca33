//! In-process catalog that accepts every call and records it.
//!
//! Used by `rssync sync --dry-run` to print the plan a real run would
//! execute, in document order.

use serde::Serialize;

use rssync_core::{
    CatalogClient, ClientError, DataSourceDefinition, DataSourceLink, ItemKind, ItemReference,
    RoleSpec,
};

use crate::path_stack::join_path;

/// One remote call, as it would have been issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CatalogCall {
    CreateFolder {
        name: String,
        parent: String,
    },
    CreateDataSource {
        name: String,
        parent: String,
        overwrite: bool,
        definition: DataSourceDefinition,
    },
    CreateCatalogItem {
        kind: ItemKind,
        name: String,
        parent: String,
        overwrite: bool,
        bytes: usize,
    },
    SetItemDataSources {
        item_path: String,
        sources: Vec<DataSourceLink>,
    },
    SetItemReferences {
        item_path: String,
        references: Vec<ItemReference>,
    },
    CreateRole {
        role: RoleSpec,
    },
}

impl CatalogCall {
    /// One-line human description, e.g. `CreateFolder /Sales`.
    pub fn describe(&self) -> String {
        match self {
            CatalogCall::CreateFolder { name, parent } => {
                format!("CreateFolder {}", join_path(parent, name))
            }
            CatalogCall::CreateDataSource { name, parent, .. } => {
                format!("CreateDataSource {}", join_path(parent, name))
            }
            CatalogCall::CreateCatalogItem {
                kind, name, parent, ..
            } => format!("CreateCatalogItem {kind} {}", join_path(parent, name)),
            CatalogCall::SetItemDataSources { item_path, sources } => {
                let refs: Vec<_> = sources.iter().map(|s| s.reference.as_str()).collect();
                format!("SetItemDataSources {item_path} -> {}", refs.join(", "))
            }
            CatalogCall::SetItemReferences {
                item_path,
                references,
            } => {
                let refs: Vec<_> = references.iter().map(|r| r.reference.as_str()).collect();
                format!("SetItemReferences {item_path} -> {}", refs.join(", "))
            }
            CatalogCall::CreateRole { role } => {
                format!("CreateRole {} ({} task(s))", role.name, role.task_ids.len())
            }
        }
    }
}

/// Catalog stand-in that records calls instead of sending them.
#[derive(Debug, Default)]
pub struct DryRunClient {
    calls: Vec<CatalogCall>,
}

impl DryRunClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[CatalogCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<CatalogCall> {
        self.calls
    }

    fn record(&mut self, call: CatalogCall) {
        tracing::debug!("[dry-run] {}", call.describe());
        self.calls.push(call);
    }
}

impl CatalogClient for DryRunClient {
    fn create_folder(&mut self, name: &str, parent: &str) -> Result<(), ClientError> {
        self.record(CatalogCall::CreateFolder {
            name: name.to_string(),
            parent: parent.to_string(),
        });
        Ok(())
    }

    fn create_data_source(
        &mut self,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &DataSourceDefinition,
    ) -> Result<(), ClientError> {
        self.record(CatalogCall::CreateDataSource {
            name: name.to_string(),
            parent: parent.to_string(),
            overwrite,
            definition: definition.clone(),
        });
        Ok(())
    }

    fn create_catalog_item(
        &mut self,
        kind: ItemKind,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &[u8],
    ) -> Result<String, ClientError> {
        self.record(CatalogCall::CreateCatalogItem {
            kind,
            name: name.to_string(),
            parent: parent.to_string(),
            overwrite,
            bytes: definition.len(),
        });
        Ok(join_path(parent, name))
    }

    fn set_item_data_sources(
        &mut self,
        item_path: &str,
        sources: &[DataSourceLink],
    ) -> Result<(), ClientError> {
        self.record(CatalogCall::SetItemDataSources {
            item_path: item_path.to_string(),
            sources: sources.to_vec(),
        });
        Ok(())
    }

    fn set_item_references(
        &mut self,
        item_path: &str,
        references: &[ItemReference],
    ) -> Result<(), ClientError> {
        self.record(CatalogCall::SetItemReferences {
            item_path: item_path.to_string(),
            references: references.to_vec(),
        });
        Ok(())
    }

    fn create_role(&mut self, role: &RoleSpec) -> Result<(), ClientError> {
        self.record(CatalogCall::CreateRole { role: role.clone() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_item_path_joins_parent_and_name() {
        let mut client = DryRunClient::new();
        let path = client
            .create_catalog_item(ItemKind::Report, "Sales", "/", true, b"<Report/>")
            .expect("create");
        assert_eq!(path, "/Sales");
        let path = client
            .create_catalog_item(ItemKind::DataSet, "Q", "/Finance", true, b"")
            .expect("create");
        assert_eq!(path, "/Finance/Q");
        assert_eq!(client.calls().len(), 2);
    }

    #[test]
    fn describe_is_human_readable() {
        let call = CatalogCall::SetItemDataSources {
            item_path: "/Finance/Sales".into(),
            sources: vec![DataSourceLink {
                name: "Main".into(),
                reference: "/Finance/Main".into(),
            }],
        };
        assert_eq!(call.describe(), "SetItemDataSources /Finance/Sales -> /Finance/Main");
    }

    #[test]
    fn calls_serialize_with_tag() {
        let call = CatalogCall::CreateFolder {
            name: "a".into(),
            parent: "/".into(),
        };
        let json = serde_json::to_value(&call).expect("json");
        assert_eq!(json["call"], "create_folder");
        assert_eq!(json["parent"], "/");
    }
}
