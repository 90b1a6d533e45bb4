//! Resolution and configuration errors

use thiserror::Error;

/// Errors raised while resolving a single variable
///
/// None of these abort a resolution pass; the engine logs them and moves on
/// to the next token or the fallback value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Name matches no known namespace
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Namespace is known but the field is not
    #[error("Unknown {namespace} scope variable: {field}")]
    UnknownField {
        /// Namespace prefix, e.g. `method`
        namespace: &'static str,
        /// Unrecognized field name
        field: String,
    },

    /// A member variable was used where only a unit is available
    #[error("Variable {0} requires a member context")]
    ScopeMismatch(String),

    /// A reflection variable was used without any unit or member
    #[error("Variable {0} requires a class context")]
    NoContext(String),

    /// The member descriptor could not be interpreted
    #[error("Failed to resolve variable value for: {variable}, reason: {reason}")]
    Malformed {
        /// Variable being resolved
        variable: String,
        /// What could not be interpreted
        reason: String,
    },
}

/// Errors raised while loading a resolution configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to load metadata config: {0}")]
    IoError(#[from] std::io::Error),

    /// Unit-scope template references member-scope variables
    #[error("Found invalid metadata configuration property for class scope: {key}={value}")]
    InvalidUnitTemplate {
        /// Configuration key, `class.` prefix included
        key: String,
        /// Offending template
        value: String,
    },

    /// Malformed `-D` style assignment
    #[error("Invalid property assignment '{0}', expected key=value")]
    InvalidAssignment(String),
}
