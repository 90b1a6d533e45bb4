//! Transformation tunables

use std::path::{Path, PathBuf};
use t2b_metadata::config::{CONFIG_PATH_PROPERTY, DEFAULT_CONFIG_PATH};
use t2b_metadata::{ResolutionConfig, SystemProperties};

/// System property overriding the rename suffix
pub const SUFFIX_PROPERTY: &str = "t2b.bench.class.name.suffix";

/// Suffix appended to renamed units
pub const DEFAULT_SUFFIX: &str = "BenchmarkByT2B";

/// Settings fixed for the lifetime of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSettings {
    /// Appended to the outermost simple name of every renamed unit
    pub suffix: String,
    /// Metadata configuration file, when one was named explicitly
    pub config_path: Option<PathBuf>,
    /// Root directory for rewritten class files
    pub output_dir: PathBuf,
}

impl TransformSettings {
    /// Settings with the default suffix
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            config_path: None,
            output_dir: output_dir.into(),
        }
    }

    /// Read tunables from system properties
    pub fn from_properties(properties: &SystemProperties, output_dir: impl Into<PathBuf>) -> Self {
        let suffix = properties
            .get(SUFFIX_PROPERTY)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUFFIX)
            .to_string();
        Self {
            suffix,
            config_path: properties.get(CONFIG_PATH_PROPERTY).map(PathBuf::from),
            output_dir: output_dir.into(),
        }
    }

    /// Load the metadata configuration named by `config_path`, falling back
    /// to the default location
    ///
    /// A missing file is only worth a warning when it was named explicitly.
    pub fn resolution_config(&self) -> ResolutionConfig {
        match &self.config_path {
            Some(path) => ResolutionConfig::load_from(path, true),
            None => ResolutionConfig::load_from(Path::new(DEFAULT_CONFIG_PATH), false),
        }
    }

    /// Override the suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}
