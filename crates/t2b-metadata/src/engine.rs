//! Metadata resolution

use crate::config::ResolutionConfig;
use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::properties::SystemProperties;
use crate::resolvers::resolve_variable;
use crate::template::VariableTemplate;
use crate::variable::Variable;
use std::collections::BTreeMap;

/// Value used when no token of a template yields anything
pub const FALLBACK_VALUE: &str = "-";

/// Which configuration map to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `class.` entries
    Unit,
    /// `method.` and unprefixed entries
    Member,
}

/// Resolves configured templates into concrete metadata
#[derive(Debug, Clone, Copy)]
pub struct MetadataResolver<'a> {
    config: &'a ResolutionConfig,
    properties: &'a SystemProperties,
}

impl<'a> MetadataResolver<'a> {
    /// Create a resolver over a configuration and property set
    pub fn new(config: &'a ResolutionConfig, properties: &'a SystemProperties) -> Self {
        Self { config, properties }
    }

    /// Configuration in use
    pub fn config(&self) -> &'a ResolutionConfig {
        self.config
    }

    /// System properties in use
    pub fn properties(&self) -> &'a SystemProperties {
        self.properties
    }

    /// Resolve every entry of `scope` against `context`
    ///
    /// Never fails: each value is either resolved, a written default, or
    /// [`FALLBACK_VALUE`].
    pub fn resolve(&self, scope: Scope, context: ResolutionContext<'_>) -> BTreeMap<String, String> {
        let entries = match scope {
            Scope::Unit => self.config.unit_entries(),
            Scope::Member => self.config.member_entries(),
        };
        entries
            .iter()
            .map(|(key, template)| (key.clone(), self.resolve_template(template, context)))
            .collect()
    }

    /// Resolve a single template
    pub fn resolve_template(&self, template: &str, context: ResolutionContext<'_>) -> String {
        let parsed = VariableTemplate::parse(template);
        if !parsed.has_variables() {
            return template.to_string();
        }

        let value = parsed
            .tokens()
            .iter()
            .find_map(|token| {
                self.lookup(&token.name, context)
                    .filter(|v| !v.is_empty())
                    .or_else(|| token.default.clone())
                    .filter(|v| !v.is_empty())
            })
            .unwrap_or_else(|| FALLBACK_VALUE.to_string());

        parsed.expand(&value)
    }

    fn lookup(&self, name: &str, context: ResolutionContext<'_>) -> Option<String> {
        let result = Variable::parse(name)
            .and_then(|variable| resolve_variable(&variable, context, self.properties));
        match result {
            Ok(value) => value,
            Err(e @ ResolveError::Malformed { .. }) => {
                tracing::error!("{}", e);
                None
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }
}
