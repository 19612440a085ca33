//! Catalog sync driver: walks descriptor events and issues catalog calls.
//!
//! ## Element handlers
//!
//! | Element         | Open                                              | Close                   |
//! |-----------------|---------------------------------------------------|-------------------------|
//! | `FOLDER`        | `CreateFolder` (already-exists is success), push  | pop path                |
//! | `DATASOURCE`    | `CreateDataSource`                                | -                       |
//! | `DATASET`       | rewrite data source reference, `CreateCatalogItem`| -                       |
//! | `REPORT`        | `CreateCatalogItem`, `SetItemDataSources`, push   | pop pending document    |
//! | `ITEMREFERENCE` | `SetItemReferences` on the enclosing report       | -                       |
//! | `ROLE`          | push pending role                                 | pop, `CreateRole`       |
//! | `TASK`          | append task id to the enclosing role              | -                       |
//!
//! ## Failure policy
//!
//! - Folder creation: already-exists is swallowed; anything else is fatal.
//! - Every other remote call is best-effort: logged, recorded in the
//!   [`SyncReport`], and traversal moves on to the next element.
//! - Descriptor problems (missing attribute, unreadable definition, unknown
//!   credential retrieval, stack misuse) are fatal.

use std::path::{Path, PathBuf};

use rssync_core::{
    CatalogClient, ClientError, CredentialRetrieval, DataSourceDefinition, DataSourceLink,
    ItemKind, ItemReference, PropertyTable, RoleSpec, RunConfig, TaskId, DEFAULT_ROOT,
};

use crate::definition::{definition_path, read_definition, rewrite_data_source_reference};
use crate::descriptor::{Attributes, DescriptorEvent, ElementKind};
use crate::error::SyncError;
use crate::path_stack::{join_path, PathStack};
use crate::pending::{PendingDocument, PendingItem, PendingStack};
use crate::report::{ItemFailure, SyncReport};
use crate::resolve::{leaf_name, resolve};
use crate::substitute::substitute;

// ---------------------------------------------------------------------------
// Element attribute access
// ---------------------------------------------------------------------------

/// An open element with its substituted attributes.
struct Element<'e> {
    name: &'e str,
    attrs: &'e Attributes,
    line: u64,
}

impl<'e> Element<'e> {
    fn required(&self, key: &'static str) -> Result<&'e str, SyncError> {
        self.attrs
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| SyncError::MissingAttribute {
                element: self.name.to_string(),
                attribute: key,
                line: self.line,
            })
    }

    fn optional(&self, key: &str) -> Option<&'e str> {
        self.attrs.get(key).map(String::as_str)
    }

    fn get_or(&self, key: &str, default: &'e str) -> &'e str {
        self.optional(key).unwrap_or(default)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.optional(key) {
            Some(value) => value.eq_ignore_ascii_case("true"),
            None => default,
        }
    }
}

/// Build a connection definition, applying descriptor defaults.
fn data_source_definition(el: &Element<'_>) -> Result<DataSourceDefinition, SyncError> {
    let mode = el.get_or("CREDENTIALRETRIEVAL", "Prompt");
    let credential_retrieval: CredentialRetrieval = mode
        .parse()
        .map_err(|_| SyncError::InvalidCredentialRetrieval(mode.to_string()))?;

    let mut definition = DataSourceDefinition {
        connect_string: el.get_or("CONNECTSTRING", "").to_string(),
        extension: el.get_or("EXTENSION", "SQL").to_string(),
        enabled: el.flag("ENABLED", true),
        use_original_connect_string: el.flag("USEORIGINALCONNECTSTRING", false),
        original_connect_string_expression_based: el
            .flag("ORIGINALCONNECTSTRINGEXPRESSIONBASED", false),
        windows_credentials: el.flag("WINDOWSCREDENTIALS", false),
        impersonate_user: el.flag("IMPERSONATEUSER", false),
        credential_retrieval,
        prompt: None,
        user_name: None,
        password: None,
    };

    match credential_retrieval {
        CredentialRetrieval::Prompt => {
            definition.prompt = Some(el.get_or("PROMPT", "").to_string());
        }
        CredentialRetrieval::Store => {
            definition.user_name = Some(el.get_or("USERNAME", "").to_string());
            definition.password = Some(el.get_or("PASSWORD", "").to_string());
        }
        CredentialRetrieval::Integrated | CredentialRetrieval::None => {}
    }

    Ok(definition)
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Mutable state of one traversal. Created per run, dropped at the end.
struct Traversal {
    paths: PathStack,
    pending: PendingStack,
    report: SyncReport,
}

/// Walks descriptor events and issues catalog calls in document order.
pub struct SyncDriver<'a, C> {
    client: C,
    properties: &'a PropertyTable,
    root: String,
    base_dir: PathBuf,
}

impl<'a, C: CatalogClient> SyncDriver<'a, C> {
    /// Driver for `config`; relative definition paths resolve against the
    /// descriptor's directory.
    pub fn new(client: C, config: &'a RunConfig) -> Self {
        let base_dir = config
            .descriptor
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            client,
            properties: &config.properties,
            root: config.root.clone(),
            base_dir,
        }
    }

    /// Bootstrap the root folder, then consume `events` to the end.
    pub fn run<I>(&mut self, events: I) -> Result<SyncReport, SyncError>
    where
        I: IntoIterator<Item = Result<DescriptorEvent, SyncError>>,
    {
        let mut t = Traversal {
            paths: PathStack::new(self.root.clone()),
            pending: PendingStack::new(),
            report: SyncReport::new(self.root.clone()),
        };

        self.bootstrap_root(&mut t.report)?;

        let mut last_line = 0;
        for event in events {
            match event? {
                DescriptorEvent::Open { name, attrs, line } => {
                    last_line = line;
                    let attrs = substitute(attrs, self.properties);
                    let el = Element {
                        name: &name,
                        attrs: &attrs,
                        line,
                    };
                    self.open(&mut t, &el)?;
                }
                DescriptorEvent::Close { name, line } => {
                    last_line = line;
                    self.close(&mut t, &name, line)?;
                }
            }
        }

        if t.paths.depth() != 1 || !t.pending.is_empty() {
            return Err(SyncError::Xml {
                line: last_line,
                message: format!(
                    "descriptor ended inside {} folder(s) and {} pending item(s)",
                    t.paths.depth() - 1,
                    t.pending.len()
                ),
            });
        }

        t.report.finish();
        Ok(t.report)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn open(&mut self, t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let Some(kind) = ElementKind::from_name(el.name) else {
            tracing::debug!(element = el.name, line = el.line, "ignoring element");
            return Ok(());
        };
        match kind {
            ElementKind::Folder => self.enter_folder(t, el),
            ElementKind::DataSource => self.create_data_source(t, el),
            ElementKind::DataSet => self.create_data_set(t, el),
            ElementKind::Report => self.enter_report(t, el),
            ElementKind::ItemReference => self.add_item_reference(t, el),
            ElementKind::Role => Self::enter_role(t, el),
            ElementKind::Task => Self::add_task(t, el),
        }
    }

    fn close(&mut self, t: &mut Traversal, name: &str, line: u64) -> Result<(), SyncError> {
        match ElementKind::from_name(name) {
            Some(ElementKind::Folder) => {
                t.paths.pop().ok_or_else(|| SyncError::StackUnderflow {
                    element: name.to_string(),
                    expected: "folder",
                    line,
                })?;
                Ok(())
            }
            Some(ElementKind::Report) => match pop_pending(t, name, "document", line)? {
                PendingItem::Document(_) => Ok(()),
                other => Err(unexpected(name, "document", &other, line)),
            },
            Some(ElementKind::Role) => match pop_pending(t, name, "role", line)? {
                PendingItem::Role(role) => {
                    self.exit_role(t, role);
                    Ok(())
                }
                other => Err(unexpected(name, "role", &other, line)),
            },
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Folders
    // -----------------------------------------------------------------------

    /// Create the configured root's folder chain under `/`.
    fn bootstrap_root(&mut self, report: &mut SyncReport) -> Result<(), SyncError> {
        if self.root == DEFAULT_ROOT {
            return Ok(());
        }
        let root = self.root.clone();
        let mut parent = DEFAULT_ROOT.to_string();
        for segment in root.split('/').filter(|s| !s.is_empty()) {
            self.ensure_folder(report, segment, &parent)?;
            parent = join_path(&parent, segment);
        }
        Ok(())
    }

    fn ensure_folder(
        &mut self,
        report: &mut SyncReport,
        name: &str,
        parent: &str,
    ) -> Result<(), SyncError> {
        let path = join_path(parent, name);
        tracing::info!("Creating folder: {path}");
        match self.client.create_folder(name, parent) {
            Ok(()) => {
                report.folders_created += 1;
                Ok(())
            }
            Err(err) if err.is_already_exists() => {
                tracing::debug!(path = %path, "folder already exists");
                report.folders_existing += 1;
                Ok(())
            }
            Err(source) => Err(SyncError::Remote {
                operation: "CreateFolder",
                target: path,
                source,
            }),
        }
    }

    fn enter_folder(&mut self, t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let name = el.required("NAME")?;
        let parent = t.paths.top().to_string();
        self.ensure_folder(&mut t.report, name, &parent)?;
        t.paths.push(name);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    fn create_data_source(&mut self, t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let name = el.required("NAME")?;
        let definition = data_source_definition(el)?;
        let overwrite = el.flag("OVERWRITE", true);
        let parent = t.paths.top().to_string();
        let target = join_path(&parent, name);

        tracing::info!("Creating data source: {target}");
        let created = self.best_effort(&mut t.report, "data source", &target, |c| {
            c.create_data_source(name, &parent, overwrite, &definition)
        });
        if created.is_some() {
            t.report.data_sources += 1;
        }
        Ok(())
    }

    fn create_data_set(&mut self, t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let name = el.required("NAME")?;
        let path = definition_path(&self.base_dir, el.required("DEFINITION")?);
        let mut definition = read_definition(&path)?;
        if let Some(reference) = el.optional("DATASOURCEREF") {
            let resolved = resolve(reference, &self.root);
            definition = rewrite_data_source_reference(&definition, &resolved, &path)?;
        }
        let overwrite = el.flag("OVERWRITE", true);
        let parent = t.paths.top().to_string();
        let target = join_path(&parent, name);

        tracing::info!("Creating dataset: {target}");
        let created = self.best_effort(&mut t.report, "dataset", &target, |c| {
            c.create_catalog_item(ItemKind::DataSet, name, &parent, overwrite, &definition)
        });
        if created.is_some() {
            t.report.data_sets += 1;
        }
        Ok(())
    }

    fn enter_report(&mut self, t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let name = el.required("NAME")?;
        let path = definition_path(&self.base_dir, el.required("DEFINITION")?);
        let definition = read_definition(&path)?;
        let overwrite = el.flag("OVERWRITE", true);
        let parent = t.paths.top().to_string();
        let target = join_path(&parent, name);

        tracing::info!("Creating report: {target}");
        let item_path = self.best_effort(&mut t.report, "report", &target, |c| {
            c.create_catalog_item(ItemKind::Report, name, &parent, overwrite, &definition)
        });
        if item_path.is_some() {
            t.report.documents += 1;
        }

        if let Some(reference) = el.optional("DATASOURCEREF") {
            match item_path.as_deref() {
                Some(item) => {
                    let link = DataSourceLink {
                        name: el
                            .optional("DATASOURCEREFNAME")
                            .unwrap_or_else(|| leaf_name(reference))
                            .to_string(),
                        reference: resolve(reference, &self.root),
                    };
                    let linked = self.best_effort(&mut t.report, "data source link", item, |c| {
                        c.set_item_data_sources(item, std::slice::from_ref(&link))
                    });
                    if linked.is_some() {
                        t.report.data_source_links += 1;
                    }
                }
                None => {
                    tracing::warn!(path = %target, "report was not created; skipping data source link");
                }
            }
        }

        t.pending.push(PendingItem::Document(PendingDocument {
            folder: parent,
            name: name.to_string(),
            item_path,
        }));
        Ok(())
    }

    fn add_item_reference(&mut self, t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let name = el.required("NAME")?;
        let reference = el.required("REFERENCE")?;
        let document = match t.pending.top() {
            Some(PendingItem::Document(doc)) => doc,
            Some(other) => return Err(unexpected(el.name, "document", other, el.line)),
            None => {
                return Err(SyncError::StackUnderflow {
                    element: el.name.to_string(),
                    expected: "document",
                    line: el.line,
                })
            }
        };
        let Some(item_path) = document.item_path.clone() else {
            tracing::warn!(
                path = %join_path(&document.folder, &document.name),
                reference,
                "report was not created; skipping item reference"
            );
            return Ok(());
        };

        let entry = ItemReference {
            name: name.to_string(),
            reference: resolve(reference, &self.root),
        };
        tracing::info!("Setting reference {} on {item_path}", entry.reference);
        let set = self.best_effort(&mut t.report, "item reference", &item_path, |c| {
            c.set_item_references(&item_path, std::slice::from_ref(&entry))
        });
        if set.is_some() {
            t.report.item_references += 1;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    fn enter_role(t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let role = RoleSpec {
            name: el.required("NAME")?.to_string(),
            description: el.get_or("DESCRIPTION", "").to_string(),
            task_ids: Vec::new(),
        };
        t.pending.push(PendingItem::Role(role));
        Ok(())
    }

    fn add_task(t: &mut Traversal, el: &Element<'_>) -> Result<(), SyncError> {
        let id = el.required("ID")?;
        match t.pending.top_mut() {
            Some(PendingItem::Role(role)) => {
                role.task_ids.push(TaskId::from(id));
                Ok(())
            }
            Some(other) => Err(unexpected(el.name, "role", other, el.line)),
            None => Err(SyncError::StackUnderflow {
                element: el.name.to_string(),
                expected: "role",
                line: el.line,
            }),
        }
    }

    fn exit_role(&mut self, t: &mut Traversal, role: RoleSpec) {
        tracing::info!("Creating role: {}", role.name);
        let name = role.name.clone();
        if self
            .best_effort(&mut t.report, "role", &name, |c| c.create_role(&role))
            .is_some()
        {
            t.report.roles += 1;
        }
    }

    // -----------------------------------------------------------------------
    // Best-effort calls
    // -----------------------------------------------------------------------

    /// Issue a recoverable remote call. Failures are logged and recorded;
    /// `None` tells the caller the call did not take effect.
    fn best_effort<T>(
        &mut self,
        report: &mut SyncReport,
        kind: &'static str,
        target: &str,
        call: impl FnOnce(&mut C) -> Result<T, ClientError>,
    ) -> Option<T> {
        match call(&mut self.client) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(kind, target, error = %err, "remote call failed; continuing");
                report.failures.push(ItemFailure {
                    kind,
                    target: target.to_string(),
                    message: err.to_string(),
                });
                None
            }
        }
    }
}

fn pop_pending(
    t: &mut Traversal,
    element: &str,
    expected: &'static str,
    line: u64,
) -> Result<PendingItem, SyncError> {
    t.pending.pop().ok_or_else(|| SyncError::StackUnderflow {
        element: element.to_string(),
        expected,
        line,
    })
}

fn unexpected(element: &str, expected: &'static str, found: &PendingItem, line: u64) -> SyncError {
    SyncError::UnexpectedPending {
        element: element.to_string(),
        expected,
        found: found.kind(),
        line,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
