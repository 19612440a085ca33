use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use rssync_core::{
    join_path, CatalogClient, ClientError, ConfigError, DataSourceDefinition, DataSourceLink,
    ItemKind, ItemReference, RoleSpec, RunConfig,
};

use crate::envelope::{self, soap_action};
use crate::error::{protocol_err, transport_err};
use crate::response::{self, SoapResponse};

const SERVICE_FILE: &str = "ReportService2010.asmx";

/// Full service URL for `endpoint`.
///
/// An endpoint that already names an `.asmx` file is used as given; otherwise
/// it is taken to be the report server base URL.
pub fn service_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.to_ascii_lowercase().ends_with(".asmx") {
        endpoint.to_string()
    } else {
        format!("{}/{SERVICE_FILE}", endpoint.trim_end_matches('/'))
    }
}

/// [`CatalogClient`] speaking SOAP 1.1 to a report server.
///
/// One [`ureq::Agent`] is held for the client's lifetime so connections are
/// kept alive across the calls of a run.
pub struct SoapCatalogClient {
    agent: ureq::Agent,
    url: String,
    authorization: Option<String>,
}

impl SoapCatalogClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: service_url(endpoint),
            authorization: None,
        }
    }

    /// Send HTTP basic credentials with every request.
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        self.authorization = Some(format!("Basic {token}"));
        self
    }

    /// Client for the endpoint, credentials and timeout of `config`.
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        let client = Self::new(config.require_endpoint()?, config.timeout);
        Ok(match &config.username {
            Some(user) => client.with_basic_auth(user, config.password.as_deref().unwrap_or("")),
            None => client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST one envelope. Faults are mapped with `target` as the item path.
    fn call(&self, operation: &str, body: &str, target: &str) -> Result<SoapResponse, ClientError> {
        tracing::debug!(operation, target, url = %self.url, "sending SOAP request");

        let mut request = self
            .agent
            .post(&self.url)
            .set("Content-Type", "text/xml; charset=utf-8")
            .set("SOAPAction", &format!("\"{}\"", soap_action(operation)));
        if let Some(auth) = &self.authorization {
            request = request.set("Authorization", auth);
        }

        let (status, text) = match request.send_string(body) {
            Ok(resp) => (resp.status(), resp.into_string().map_err(transport_err)?),
            Err(ureq::Error::Status(status, resp)) => (status, resp.into_string().unwrap_or_default()),
            Err(ureq::Error::Transport(err)) => return Err(transport_err(err)),
        };

        let parsed = response::parse(&text)
            .map_err(|e| protocol_err(format!("{operation}: HTTP {status}: {e}")))?;
        if let Some(fault) = parsed.fault {
            tracing::debug!(operation, target, code = %fault.code, "SOAP fault");
            return Err(fault.into_client_error(target));
        }
        if status >= 400 {
            return Err(protocol_err(format!("{operation}: HTTP {status} without a SOAP fault")));
        }
        Ok(parsed)
    }
}

impl CatalogClient for SoapCatalogClient {
    fn create_folder(&mut self, name: &str, parent: &str) -> Result<(), ClientError> {
        let body = envelope::create_folder(name, parent);
        self.call("CreateFolder", &body, &join_path(parent, name))?;
        Ok(())
    }

    fn create_data_source(
        &mut self,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &DataSourceDefinition,
    ) -> Result<(), ClientError> {
        let body = envelope::create_data_source(name, parent, overwrite, definition);
        self.call("CreateDataSource", &body, &join_path(parent, name))?;
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
        let body = envelope::create_catalog_item(kind, name, parent, overwrite, definition);
        let target = join_path(parent, name);
        let reply = self.call("CreateCatalogItem", &body, &target)?;
        reply
            .item_path
            .ok_or_else(|| protocol_err(format!("CreateCatalogItem {target}: reply has no ItemInfo/Path")))
    }

    fn set_item_data_sources(
        &mut self,
        item_path: &str,
        sources: &[DataSourceLink],
    ) -> Result<(), ClientError> {
        let body = envelope::set_item_data_sources(item_path, sources);
        self.call("SetItemDataSources", &body, item_path)?;
        Ok(())
    }

    fn set_item_references(
        &mut self,
        item_path: &str,
        references: &[ItemReference],
    ) -> Result<(), ClientError> {
        let body = envelope::set_item_references(item_path, references);
        self.call("SetItemReferences", &body, item_path)?;
        Ok(())
    }

    fn create_role(&mut self, role: &RoleSpec) -> Result<(), ClientError> {
        let body = envelope::create_role(role);
        self.call("CreateRole", &body, &role.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://rs/ReportServer", "http://rs/ReportServer/ReportService2010.asmx")]
    #[case("http://rs/ReportServer/", "http://rs/ReportServer/ReportService2010.asmx")]
    #[case(
        "http://rs/ReportServer/ReportService2010.asmx",
        "http://rs/ReportServer/ReportService2010.asmx"
    )]
    #[case("https://rs/RS/reportservice2010.ASMX", "https://rs/RS/reportservice2010.ASMX")]
    fn service_url_cases(#[case] endpoint: &str, #[case] expected: &str) {
        assert_eq!(service_url(endpoint), expected);
    }

    #[test]
    fn from_config_requires_endpoint() {
        let config = RunConfig::new("layout.xml");
        assert!(matches!(
            SoapCatalogClient::from_config(&config),
            Err(ConfigError::MissingSetting("endpoint"))
        ));
    }

    #[test]
    fn from_config_sets_basic_auth() {
        let mut config = RunConfig::new("layout.xml");
        config.endpoint = Some("http://rs/ReportServer".into());
        config.username = Some("svc".into());
        config.password = Some("pw".into());
        let client = SoapCatalogClient::from_config(&config).expect("client");
        assert_eq!(client.authorization.as_deref(), Some("Basic c3ZjOnB3"));
        assert_eq!(client.url(), "http://rs/ReportServer/ReportService2010.asmx");
    }
}
