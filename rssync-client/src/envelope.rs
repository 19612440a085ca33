//! SOAP 1.1 request bodies for the ReportService2010 endpoint.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::escape::escape;

use rssync_core::{DataSourceDefinition, DataSourceLink, ItemKind, ItemReference, RoleSpec};

/// Target namespace of the ReportService2010 web service.
pub const NAMESPACE: &str =
    "http://schemas.microsoft.com/sqlserver/reporting/2010/03/01/ReportServer";

/// Value of the `SOAPAction` header for `operation`.
pub fn soap_action(operation: &str) -> String {
    format!("{NAMESPACE}/{operation}")
}

/// Incrementally built operation element.
struct Body {
    xml: String,
}

impl Body {
    fn new() -> Self {
        Self { xml: String::new() }
    }

    fn text(&mut self, name: &str, value: &str) -> &mut Self {
        let _ = write!(self.xml, "<{name}>{}</{name}>", escape(value));
        self
    }

    fn flag(&mut self, name: &str, value: bool) -> &mut Self {
        self.text(name, if value { "true" } else { "false" })
    }

    fn open(&mut self, name: &str) -> &mut Self {
        let _ = write!(self.xml, "<{name}>");
        self
    }

    fn close(&mut self, name: &str) -> &mut Self {
        let _ = write!(self.xml, "</{name}>");
        self
    }

    fn wrap(&self, operation: &str) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" "#,
                r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
                r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema">"#,
                r#"<soap:Body><{op} xmlns="{ns}">{body}</{op}></soap:Body></soap:Envelope>"#,
            ),
            op = operation,
            ns = NAMESPACE,
            body = self.xml,
        )
    }
}

pub fn create_folder(name: &str, parent: &str) -> String {
    Body::new()
        .text("Folder", name)
        .text("Parent", parent)
        .wrap("CreateFolder")
}

pub fn create_data_source(
    name: &str,
    parent: &str,
    overwrite: bool,
    definition: &DataSourceDefinition,
) -> String {
    let mut body = Body::new();
    body.text("DataSource", name)
        .text("Parent", parent)
        .flag("Overwrite", overwrite)
        .open("Definition")
        .text("Extension", &definition.extension)
        .text("ConnectString", &definition.connect_string)
        .flag("UseOriginalConnectString", definition.use_original_connect_string)
        .flag(
            "OriginalConnectStringExpressionBased",
            definition.original_connect_string_expression_based,
        )
        .text("CredentialRetrieval", definition.credential_retrieval.as_str())
        .flag("WindowsCredentials", definition.windows_credentials)
        .flag("ImpersonateUser", definition.impersonate_user);
    if let Some(prompt) = &definition.prompt {
        body.text("Prompt", prompt);
    }
    if let Some(user_name) = &definition.user_name {
        body.text("UserName", user_name);
    }
    if let Some(password) = &definition.password {
        body.text("Password", password);
    }
    body.flag("Enabled", definition.enabled)
        .close("Definition")
        .wrap("CreateDataSource")
}

pub fn create_catalog_item(
    kind: ItemKind,
    name: &str,
    parent: &str,
    overwrite: bool,
    definition: &[u8],
) -> String {
    Body::new()
        .text("ItemType", kind.as_str())
        .text("Name", name)
        .text("Parent", parent)
        .flag("Overwrite", overwrite)
        .text("Definition", &STANDARD.encode(definition))
        .wrap("CreateCatalogItem")
}

pub fn set_item_data_sources(item_path: &str, sources: &[DataSourceLink]) -> String {
    let mut body = Body::new();
    body.text("ItemPath", item_path).open("DataSources");
    for source in sources {
        body.open("DataSource")
            .text("Name", &source.name)
            .open("DataSourceReference")
            .text("Reference", &source.reference)
            .close("DataSourceReference")
            .close("DataSource");
    }
    body.close("DataSources").wrap("SetItemDataSources")
}

pub fn set_item_references(item_path: &str, references: &[ItemReference]) -> String {
    let mut body = Body::new();
    body.text("ItemPath", item_path).open("ItemReferences");
    for reference in references {
        body.open("ItemReference")
            .text("Name", &reference.name)
            .text("Reference", &reference.reference)
            .close("ItemReference");
    }
    body.close("ItemReferences").wrap("SetItemReferences")
}

pub fn create_role(role: &RoleSpec) -> String {
    let mut body = Body::new();
    body.text("Name", &role.name)
        .text("Description", &role.description)
        .open("TaskIDs");
    for task in &role.task_ids {
        body.text("string", &task.0);
    }
    body.close("TaskIDs").wrap("CreateRole")
}
