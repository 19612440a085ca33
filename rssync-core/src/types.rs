//! Domain types for catalog items.
//!
//! These mirror the shapes the remote catalog accepts. Items themselves are
//! owned by the remote service; the engine only ever holds these request
//! payloads for the duration of a single call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The catalog's root folder. Non-root paths never carry a trailing separator.
pub const DEFAULT_ROOT: &str = "/";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identifier for a catalog security task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of item uploaded through `CreateCatalogItem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    DataSet,
    Report,
}

impl ItemKind {
    /// The `ItemType` string the catalog expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::DataSet => "DataSet",
            ItemKind::Report => "Report",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a data source obtains credentials at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CredentialRetrieval {
    #[default]
    Prompt,
    Store,
    Integrated,
    None,
}

impl CredentialRetrieval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialRetrieval::Prompt => "Prompt",
            CredentialRetrieval::Store => "Store",
            CredentialRetrieval::Integrated => "Integrated",
            CredentialRetrieval::None => "None",
        }
    }
}

impl fmt::Display for CredentialRetrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialRetrieval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PROMPT" => Ok(Self::Prompt),
            "STORE" => Ok(Self::Store),
            "INTEGRATED" => Ok(Self::Integrated),
            "NONE" => Ok(Self::None),
            _ => Err(format!(
                "unknown credential retrieval '{s}'; expected: Prompt, Store, Integrated, None"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Connection definition sent with `CreateDataSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceDefinition {
    pub connect_string: String,
    /// Data processing extension, e.g. `SQL`.
    pub extension: String,
    pub enabled: bool,
    pub use_original_connect_string: bool,
    pub original_connect_string_expression_based: bool,
    pub windows_credentials: bool,
    pub impersonate_user: bool,
    pub credential_retrieval: CredentialRetrieval,
    /// Prompt text shown to users; only set for [`CredentialRetrieval::Prompt`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Stored user name; only set for [`CredentialRetrieval::Store`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for DataSourceDefinition {
    fn default() -> Self {
        Self {
            connect_string: String::new(),
            extension: "SQL".to_string(),
            enabled: true,
            use_original_connect_string: false,
            original_connect_string_expression_based: false,
            windows_credentials: false,
            impersonate_user: false,
            credential_retrieval: CredentialRetrieval::Prompt,
            prompt: Some(String::new()),
            user_name: None,
            password: None,
        }
    }
}

/// One entry of a `SetItemDataSources` call: binds an item's data source
/// slot to a shared data source by absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceLink {
    pub name: String,
    pub reference: String,
}

/// One entry of a `SetItemReferences` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReference {
    pub name: String,
    pub reference: String,
}

/// A role definition accumulated from a `ROLE` element and its `TASK` children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
