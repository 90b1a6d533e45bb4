//! Jar manifest parsing (`META-INF/MANIFEST.MF`)
//!
//! Supplies package version/title/vendor attributes for units loaded from a
//! classpath root.

use crate::error::LoadError;
use std::collections::BTreeMap;
use std::path::Path;
use t2b_metadata::PackageInfo;

/// Location of the manifest inside a classpath root
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

type Attributes = BTreeMap<String, String>;

/// A parsed manifest: main attributes plus per-entry sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Attributes,
    sections: BTreeMap<String, Attributes>,
}

impl Manifest {
    /// Read the manifest of a classpath root, if it has one
    pub fn read_from_root(root: &Path) -> Result<Option<Self>, LoadError> {
        let path = root.join(MANIFEST_PATH);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|source| LoadError::IoError { path, source })?;
        Ok(Some(Self::parse(&text)))
    }

    /// Parse manifest text
    ///
    /// Lines starting with a single space continue the previous value.
    /// Sections are separated by blank lines; a section's `Name` attribute
    /// is its key.
    pub fn parse(text: &str) -> Self {
        let mut manifest = Manifest::default();
        let mut current = Attributes::new();
        let mut in_main = true;
        let mut last_key: Option<String> = None;

        for line in text.lines() {
            if line.is_empty() {
                if in_main || !current.is_empty() {
                    manifest.flush(&mut current, &mut in_main);
                }
                last_key = None;
                continue;
            }
            if let Some(continued) = line.strip_prefix(' ') {
                if let Some(value) = last_key.as_ref().and_then(|k| current.get_mut(k)) {
                    value.push_str(continued);
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim().to_string();
                current.insert(key.clone(), value.trim_start().to_string());
                last_key = Some(key);
            }
        }
        if in_main || !current.is_empty() {
            manifest.flush(&mut current, &mut in_main);
        }

        manifest
    }

    fn flush(&mut self, attributes: &mut Attributes, in_main: &mut bool) {
        if *in_main {
            self.main = std::mem::take(attributes);
            *in_main = false;
        } else if let Some(name) = attributes.remove("Name") {
            self.sections.insert(name, std::mem::take(attributes));
        } else {
            attributes.clear();
        }
    }

    /// Main section attribute
    pub fn main_attribute(&self, key: &str) -> Option<&str> {
        self.main.get(key).map(String::as_str)
    }

    /// Package attributes for an internal package name (`com/acme`)
    ///
    /// A `Name: com/acme/` section takes precedence per attribute over the
    /// main section. `None` when neither supplies anything.
    pub fn package_info(&self, package: &str) -> Option<PackageInfo> {
        let section = self.sections.get(&format!("{}/", package));
        let get = |key: &str| {
            section
                .and_then(|s| s.get(key))
                .or_else(|| self.main.get(key))
                .cloned()
        };

        let info = PackageInfo {
            implementation_version: get("Implementation-Version"),
            implementation_title: get("Implementation-Title"),
            implementation_vendor: get("Implementation-Vendor"),
            specification_version: get("Specification-Version"),
            specification_title: get("Specification-Title"),
            specification_vendor: get("Specification-Vendor"),
        };
        (info != PackageInfo::default()).then_some(info)
    }
}
