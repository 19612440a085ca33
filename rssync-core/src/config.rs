//! Run configuration.
//!
//! # Sources
//!
//! ```text
//! ~/.rssync/
//!   config.yaml     (optional defaults: endpoint, credentials, root, properties)
//! ```
//!
//! Command-line values override the file. Properties from both sources are
//! merged into one ordered [`PropertyTable`]: a later definition of a name
//! replaces the earlier value without moving it.
//!
//! # API pattern
//!
//! Functions that touch the home directory have two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{io_err, ConfigError};
use crate::types::DEFAULT_ROOT;

/// Seconds to wait for a single catalog call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

// ---------------------------------------------------------------------------
// 1. Property table
// ---------------------------------------------------------------------------

/// Ordered `name -> replacement` table consulted for `${name}` placeholders.
///
/// Iteration order is insertion order; substitution applies entries in that order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyTable {
    entries: Vec<(String, String)>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Parse and insert a `key=value` definition.
    pub fn define(&mut self, spec: &str) -> Result<(), ConfigError> {
        let (name, value) = parse_property(spec)?;
        self.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = PropertyTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl Serialize for PropertyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

/// Scalars allowed as property values in YAML; numbers and booleans are
/// kept as their textual form.
#[derive(Deserialize)]
#[serde(untagged)]
enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = PropertyTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of property names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut table = PropertyTable::new();
                while let Some((name, value)) = map.next_entry::<String, PropertyValue>()? {
                    table.insert(name, value.to_string());
                }
                Ok(table)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(PropertyTable::new())
            }
        }

        deserializer.deserialize_any(TableVisitor)
    }
}

/// Split a `key=value` definition at the first `=`.
///
/// The value may be empty or contain further `=` characters; the key may not be empty.
pub fn parse_property(spec: &str) -> Result<(String, String), ConfigError> {
    match spec.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::MalformedProperty(spec.to_string())),
    }
}

// ---------------------------------------------------------------------------
// 2. Root folder
// ---------------------------------------------------------------------------

/// Validate a root folder override.
///
/// The root must begin with `/`. A trailing `/` is trimmed from any root other
/// than `/` itself, since only the catalog root may end in a separator.
pub fn normalize_root(root: &str) -> Result<String, ConfigError> {
    if !root.starts_with('/') {
        return Err(ConfigError::InvalidRoot(root.to_string()));
    }
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        Ok(DEFAULT_ROOT.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// 3. Config file
// ---------------------------------------------------------------------------

/// On-disk defaults, all optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub properties: PropertyTable,
}

/// `<home>/.rssync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".rssync").join("config.yaml")
}

/// Load a config file from an explicit path.
///
/// Returns `ConfigError::Io` if unreadable, `ConfigError::Parse` (with path +
/// line context) if malformed YAML. An empty file is an empty config.
pub fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `<home>/.rssync/config.yaml` if it exists, otherwise an empty config.
pub fn load_default_at(home: &Path) -> Result<ConfigFile, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    load_file(&path)
}

/// `load_default_at` convenience wrapper.
pub fn load_default() -> Result<ConfigFile, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_default_at(&home)
}

// ---------------------------------------------------------------------------
// 4. Resolved run configuration
// ---------------------------------------------------------------------------

/// Values supplied on the command line; `None` falls back to the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub root: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Raw `key=value` definitions, applied after the file's properties.
    pub properties: Vec<String>,
}

/// Everything a sync run needs, fixed for the duration of the run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Descriptor XML file.
    pub descriptor: PathBuf,
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Normalized root folder (`/` by default).
    pub root: String,
    pub properties: PropertyTable,
    pub timeout: Duration,
}

impl RunConfig {
    /// A configuration for `descriptor` with defaults everywhere else.
    pub fn new(descriptor: impl Into<PathBuf>) -> Self {
        Self {
            descriptor: descriptor.into(),
            endpoint: None,
            username: None,
            password: None,
            root: DEFAULT_ROOT.to_string(),
            properties: PropertyTable::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Merge the config file with command-line overrides and validate the result.
    pub fn resolve(
        descriptor: impl Into<PathBuf>,
        file: ConfigFile,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let root = match overrides.root.or(file.root) {
            Some(root) => normalize_root(&root)?,
            None => DEFAULT_ROOT.to_string(),
        };

        let mut properties = file.properties;
        for spec in &overrides.properties {
            properties.define(spec)?;
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            descriptor: descriptor.into(),
            endpoint: overrides.endpoint.or(file.endpoint),
            username: overrides.username.or(file.username),
            password: overrides.password.or(file.password),
            root,
            properties,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The catalog endpoint, required for any run that talks to the network.
    pub fn require_endpoint(&self) -> Result<&str, ConfigError> {
        self.endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(ConfigError::MissingSetting("endpoint"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("env=prod", "env", "prod")]
    #[case("conn=Data Source=db;Initial Catalog=x", "conn", "Data Source=db;Initial Catalog=x")]
    #[case("empty=", "empty", "")]
    #[case(" padded =v", "padded", "v")]
    fn parse_property_splits_at_first_equals(
        #[case] spec: &str,
        #[case] key: &str,
        #[case] value: &str,
    ) {
        let (k, v) = parse_property(spec).expect("parse");
        assert_eq!(k, key);
        assert_eq!(v, value);
    }

    #[rstest]
    #[case("novalue")]
    #[case("=value")]
    #[case("")]
    fn parse_property_rejects_malformed(#[case] spec: &str) {
        let err = parse_property(spec).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedProperty(_)), "got: {err}");
    }

    #[rstest]
    #[case("/", "/")]
    #[case("/reports", "/reports")]
    #[case("/reports/", "/reports")]
    #[case("/a/b//", "/a/b")]
    #[case("///", "/")]
    fn normalize_root_trims_trailing_separator(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_root(input).unwrap(), expected);
    }

    #[test]
    fn normalize_root_requires_leading_separator() {
        let err = normalize_root("reports").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot(_)));
    }

    #[test]
    fn property_insert_replaces_in_place() {
        let mut table = PropertyTable::new();
        table.insert("a", "1");
        table.insert("b", "2");
        table.insert("a", "3");
        let entries: Vec<_> = table.iter().collect();
        assert_eq!(entries, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn overrides_win_over_file() {
        let mut file_props = PropertyTable::new();
        file_props.insert("env", "dev");
        file_props.insert("db", "main");
        let file = ConfigFile {
            endpoint: Some("http://file/ReportService2010.asmx".into()),
            root: Some("/file".into()),
            properties: file_props,
            ..ConfigFile::default()
        };
        let overrides = ConfigOverrides {
            endpoint: Some("http://cli/ReportService2010.asmx".into()),
            properties: vec!["env=prod".into()],
            ..ConfigOverrides::default()
        };

        let config = RunConfig::resolve("layout.xml", file, overrides).expect("resolve");
        assert_eq!(config.endpoint.as_deref(), Some("http://cli/ReportService2010.asmx"));
        assert_eq!(config.root, "/file");
        assert_eq!(config.properties.get("env"), Some("prod"));
        assert_eq!(config.properties.get("db"), Some("main"));
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn resolve_rejects_bad_root() {
        let overrides = ConfigOverrides {
            root: Some("relative".into()),
            ..ConfigOverrides::default()
        };
        let err = RunConfig::resolve("layout.xml", ConfigFile::default(), overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot(_)));
    }

    #[test]
    fn missing_endpoint_is_reported() {
        let config = RunConfig::new("layout.xml");
        let err = config.require_endpoint().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting("endpoint")));
    }

    #[test]
    fn yaml_properties_keep_order_and_stringify_scalars() {
        let yaml = "properties:\n  zeta: last\n  port: 1433\n  enabled: true\n";
        let file: ConfigFile = serde_yaml::from_str(yaml).expect("parse");
        let entries: Vec<_> = file.properties.iter().collect();
        assert_eq!(
            entries,
            vec![("zeta", "last"), ("port", "1433"), ("enabled", "true")]
        );
    }
}
