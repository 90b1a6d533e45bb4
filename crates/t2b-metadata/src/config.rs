//! Metadata configuration
//!
//! Loaded from an optional `.properties` file. Keys prefixed `class.` feed
//! the unit scope; `method.` or unprefixed keys feed the member scope.

use crate::error::ConfigError;
use crate::properties::{parse_properties, SystemProperties};
use crate::template::VariableTemplate;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// System property naming the configuration file
pub const CONFIG_PATH_PROPERTY: &str = "t2b.metadata.cfg.path";

/// Configuration file used when the property is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/metadata.properties";

/// Key prefix routing an entry to the unit scope
pub const UNIT_KEY_PREFIX: &str = "class.";

/// Key prefix routing an entry to the member scope
pub const MEMBER_KEY_PREFIX: &str = "method.";

/// Member entry identifying the run
pub const SESSION_KEY: &str = "session";
/// Member entry naming the wrapped method
pub const WRAPPED_METHOD_NAME_KEY: &str = "wrappedApiMethodName";
/// Member entry hashing the wrapped method signature
pub const WRAPPED_METHOD_HASH_KEY: &str = "wrappedApiMethodHash";

const MEMBER_DEFAULTS: [(&str, &str); 3] = [
    (SESSION_KEY, "${sys#t2b.session.id}"),
    (WRAPPED_METHOD_NAME_KEY, "${method.qualified.name}"),
    (WRAPPED_METHOD_HASH_KEY, "${method.signature.hash}"),
];

static GLOBAL: OnceLock<ResolutionConfig> = OnceLock::new();

/// Templates for both scopes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionConfig {
    unit: BTreeMap<String, String>,
    member: BTreeMap<String, String>,
}

impl Default for ResolutionConfig {
    /// Empty unit scope; member scope holds only the guaranteed entries
    fn default() -> Self {
        let mut config = Self {
            unit: BTreeMap::new(),
            member: BTreeMap::new(),
        };
        config.ensure_defaults();
        config
    }
}

impl ResolutionConfig {
    /// Load from the file named by `t2b.metadata.cfg.path`, or the default
    /// path when unset. Problems are logged; the result is always usable.
    pub fn load(properties: &SystemProperties) -> Self {
        match properties.get(CONFIG_PATH_PROPERTY) {
            Some(path) => Self::load_from(Path::new(path), true),
            None => Self::load_from(Path::new(DEFAULT_CONFIG_PATH), false),
        }
    }

    /// Load from `path`; `explicit` selects the log level for a missing file
    pub fn load_from(path: &Path, explicit: bool) -> Self {
        if !path.exists() {
            if explicit {
                tracing::warn!(
                    "System property {} defined metadata configuration file {} not found!",
                    CONFIG_PATH_PROPERTY,
                    path.display()
                );
            } else {
                tracing::info!("Default metadata configuration file {} not found!", path.display());
            }
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                tracing::debug!(
                    path = %path.display(),
                    unit_entries = config.unit.len(),
                    member_entries = config.member.len(),
                    "Loaded metadata configuration"
                );
                config
            }
            Err(e) => {
                tracing::error!(
                    "Failed to load metadata config from: {}, reason: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Read and parse a configuration file
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_properties_text(&text))
    }

    /// Build from `.properties` text
    pub fn from_properties_text(text: &str) -> Self {
        Self::from_pairs(parse_properties(text))
    }

    /// Build from raw key/value pairs, routing by key prefix
    ///
    /// Invalid unit entries are dropped with a warning; member defaults are
    /// filled in afterwards.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self {
            unit: BTreeMap::new(),
            member: BTreeMap::new(),
        };

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();
            if let Some(unit_key) = key.strip_prefix(UNIT_KEY_PREFIX) {
                if let Err(e) = config.insert_unit(unit_key, value) {
                    tracing::warn!("{}", e);
                }
            } else {
                let member_key = key.strip_prefix(MEMBER_KEY_PREFIX).unwrap_or(key);
                config.insert_member(member_key, value);
            }
        }

        config.ensure_defaults();
        config
    }

    /// Add a unit-scope entry; templates using `method.` variables are rejected
    pub fn insert_unit(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        if VariableTemplate::parse(&value).references_member_scope() {
            return Err(ConfigError::InvalidUnitTemplate {
                key: format!("{}{}", UNIT_KEY_PREFIX, key),
                value,
            });
        }
        self.unit.insert(key.to_string(), value);
        Ok(())
    }

    /// Add or replace a member-scope entry
    pub fn insert_member(&mut self, key: &str, value: String) {
        self.member.insert(key.to_string(), value);
    }

    /// Fill empty or missing guaranteed member entries
    pub fn ensure_defaults(&mut self) {
        for (key, template) in MEMBER_DEFAULTS {
            let entry = self.member.entry(key.to_string()).or_default();
            if entry.is_empty() {
                *entry = template.to_string();
            }
        }
    }

    /// Unit-scope templates in key order
    pub fn unit_entries(&self) -> &BTreeMap<String, String> {
        &self.unit
    }

    /// Member-scope templates in key order
    pub fn member_entries(&self) -> &BTreeMap<String, String> {
        &self.member
    }

    /// Install the process-wide configuration
    ///
    /// Returns the rejected value when one was already installed.
    pub fn init_global(config: ResolutionConfig) -> Result<&'static ResolutionConfig, ResolutionConfig> {
        GLOBAL.set(config)?;
        Ok(GLOBAL.get_or_init(ResolutionConfig::default))
    }

    /// Process-wide configuration, loaded on first access with no system
    /// properties unless [`ResolutionConfig::init_global`] ran first
    pub fn global() -> &'static ResolutionConfig {
        GLOBAL.get_or_init(|| ResolutionConfig::load(&SystemProperties::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_present() {
        let config = ResolutionConfig::default();
        assert!(config.unit_entries().is_empty());
        assert_eq!(config.member_entries()[SESSION_KEY], "${sys#t2b.session.id}");
        assert_eq!(config.member_entries()[WRAPPED_METHOD_NAME_KEY], "${method.qualified.name}");
        assert_eq!(config.member_entries()[WRAPPED_METHOD_HASH_KEY], "${method.signature.hash}");
    }

    #[test]
    fn test_prefix_routing() {
        let config = ResolutionConfig::from_properties_text(
            "class.owner=${sys#user}\nmethod.tag=fast\nplain=value\n",
        );
        assert_eq!(config.unit_entries()["owner"], "${sys#user}");
        assert_eq!(config.member_entries()["tag"], "fast");
        assert_eq!(config.member_entries()["plain"], "value");
        assert_eq!(config.member_entries().len(), 5);
    }

    #[test]
    fn test_unit_entry_with_member_variable_is_dropped() {
        let config = ResolutionConfig::from_properties_text("class.bad=${method.name}\nclass.good=x\n");
        assert!(!config.unit_entries().contains_key("bad"));
        assert_eq!(config.unit_entries()["good"], "x");
    }

    #[test]
    fn test_empty_default_entry_is_replaced() {
        let config = ResolutionConfig::from_properties_text("method.session=\n");
        assert_eq!(config.member_entries()[SESSION_KEY], "${sys#t2b.session.id}");
    }

    #[test]
    fn test_configured_session_overrides_default() {
        let config = ResolutionConfig::from_properties_text("method.session=${sys#run.id}\n");
        assert_eq!(config.member_entries()[SESSION_KEY], "${sys#run.id}");
    }

    #[test]
    fn test_missing_explicit_file_yields_defaults() {
        let props = SystemProperties::new().with(CONFIG_PATH_PROPERTY, "/nonexistent/t2b/metadata.properties");
        assert_eq!(ResolutionConfig::load(&props), ResolutionConfig::default());
    }
}
