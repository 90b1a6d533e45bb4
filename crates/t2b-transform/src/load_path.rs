//! Class lookup and definition
//!
//! A load path is an ordered list of class directories plus a registry of
//! units defined in this process. Lookups prefer defined units, so a
//! rewritten class shadows the file it was read from.

use crate::error::LoadError;
use crate::manifest::Manifest;
use crate::unit::{CompiledUnit, LoadedUnit};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use t2b_classfile::descriptor::qualified_to_internal;
use t2b_classfile::verify_class;
use t2b_metadata::{Member, PackageInfo};

/// A class directory and its optional manifest
#[derive(Debug, Clone)]
pub struct ClassRoot {
    dir: PathBuf,
    manifest: Option<Manifest>,
}

impl ClassRoot {
    /// Open a class directory, reading `META-INF/MANIFEST.MF` when present
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let dir = dir.into();
        let manifest = Manifest::read_from_root(&dir)?;
        Ok(Self { dir, manifest })
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Manifest attributes for an internal package name
    pub fn package_info(&self, package: &str) -> Option<PackageInfo> {
        self.manifest.as_ref()?.package_info(package)
    }

    fn class_path(&self, internal_name: &str) -> PathBuf {
        self.dir.join(format!("{}.class", internal_name))
    }
}

/// Ordered class roots plus the in-process unit registry
#[derive(Debug, Default)]
pub struct LoadPath {
    roots: Vec<ClassRoot>,
    defined: RwLock<HashMap<String, Arc<LoadedUnit>>>,
}

impl LoadPath {
    /// Empty load path
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a class directory
    pub fn add_root(&mut self, dir: impl Into<PathBuf>) -> Result<(), LoadError> {
        let root = ClassRoot::open(dir)?;
        tracing::debug!(root = %root.dir.display(), manifest = root.manifest.is_some(), "Added class root");
        self.roots.push(root);
        Ok(())
    }

    /// Class roots in lookup order
    pub fn roots(&self) -> &[ClassRoot] {
        &self.roots
    }

    /// Whether a unit with this name has been defined or loaded
    pub fn contains(&self, name: &str) -> bool {
        self.defined.read().contains_key(&qualified_to_internal(name))
    }

    /// Find a unit by internal (`a/b/C`) or qualified (`a.b.C`) name
    ///
    /// `Ok(None)` when no root has it; `Err` when a file exists but cannot be
    /// loaded.
    pub fn find(&self, name: &str) -> Result<Option<Arc<LoadedUnit>>, LoadError> {
        let internal = qualified_to_internal(name);
        if let Some(unit) = self.defined.read().get(&internal) {
            return Ok(Some(Arc::clone(unit)));
        }

        for root in &self.roots {
            let path = root.class_path(&internal);
            if !path.is_file() {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|source| LoadError::IoError {
                path: path.clone(),
                source,
            })?;
            let unit = CompiledUnit::from_bytes(&bytes, Some(&path))?;
            if unit.internal_name() != internal {
                return Err(LoadError::NameMismatch {
                    expected: internal,
                    found: unit.internal_name().to_string(),
                    path,
                });
            }
            verify_class(unit.class())?;
            let info = root.package_info(unit.package());
            let unit = unit.with_package_info(info);

            tracing::debug!(class = %unit.qualified_name(), path = %path.display(), "Loaded class");
            let mut defined = self.defined.write();
            let loaded = defined
                .entry(internal)
                .or_insert_with(|| Arc::new(LoadedUnit::new(unit)));
            return Ok(Some(Arc::clone(loaded)));
        }

        Ok(None)
    }

    /// Like [`LoadPath::find`], but a missing unit is an error
    pub fn load(&self, name: &str) -> Result<Arc<LoadedUnit>, LoadError> {
        self.find(name)?
            .ok_or_else(|| LoadError::NotFound(name.to_string()))
    }

    /// Define a unit from class file bytes, replacing any earlier definition
    pub fn define(&self, bytes: &[u8], origin: Option<&Path>) -> Result<Arc<LoadedUnit>, LoadError> {
        let unit = CompiledUnit::from_bytes(bytes, origin)?;
        self.define_unit(unit)
    }

    /// Define an already decoded unit as a new generation
    pub fn define_unit(&self, unit: CompiledUnit) -> Result<Arc<LoadedUnit>, LoadError> {
        verify_class(unit.class())?;
        let unit = match unit.package_info() {
            Some(_) => unit,
            None => {
                let info = self.package_info(unit.package());
                unit.with_package_info(info)
            }
        };

        let loaded = Arc::new(LoadedUnit::new(unit));
        let previous = self
            .defined
            .write()
            .insert(loaded.name().to_string(), Arc::clone(&loaded));
        tracing::debug!(
            class = %loaded.unit().qualified_name(),
            id = %loaded.id(),
            replaced = previous.is_some(),
            "Defined class"
        );
        Ok(loaded)
    }

    /// Manifest attributes of the first root that has any for `package`
    pub fn package_info(&self, package: &str) -> Option<PackageInfo> {
        self.roots.iter().find_map(|root| root.package_info(package))
    }

    /// Superclasses of `unit` reachable on this load path, nearest first
    ///
    /// The walk stops at the first superclass that cannot be found (usually
    /// `java/lang/Object`).
    pub fn ancestors(&self, unit: &LoadedUnit) -> Vec<Arc<LoadedUnit>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([unit.name().to_string()]);
        let mut next = unit.unit().super_name().map(str::to_string);

        while let Some(name) = next.take() {
            if !seen.insert(name.clone()) {
                break;
            }
            match self.find(&name) {
                Ok(Some(parent)) => {
                    next = parent.unit().super_name().map(str::to_string);
                    chain.push(parent);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to load superclass {}: {}", name, e),
            }
        }

        chain
    }

    /// Declared methods followed by inherited ones
    ///
    /// A method overridden lower in the hierarchy hides the inherited one
    /// with the same name and descriptor.
    pub fn members(&self, unit: &LoadedUnit) -> Vec<Member> {
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        let ancestors = self.ancestors(unit);
        for generation in std::iter::once(unit).chain(ancestors.iter().map(Arc::as_ref)) {
            for member in generation.declared_members() {
                if seen.insert((member.name.clone(), member.descriptor.clone())) {
                    members.push(member);
                }
            }
        }
        members
    }

    /// Whether `unit` or any reachable superclass declares an instance field
    pub fn has_instance_fields(&self, unit: &LoadedUnit) -> bool {
        unit.unit().has_instance_fields()
            || self
                .ancestors(unit)
                .iter()
                .any(|parent| parent.unit().has_instance_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use t2b_classfile::{access, ClassFile};

    fn class_bytes(name: &str, super_name: &str, methods: &[&str], fields: &[(u16, &str)]) -> Vec<u8> {
        let mut class = ClassFile::new(name, super_name).unwrap();
        class.access_flags = access::PUBLIC | access::SUPER;
        for method in methods {
            class.add_method(access::PUBLIC, method, "()V").unwrap();
        }
        for (flags, field) in fields {
            class.add_field(*flags, field, "I").unwrap();
        }
        class.encode()
    }

    fn write_class(root: &Path, name: &str, bytes: &[u8]) {
        let path = root.join(format!("{}.class", name));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_find_from_root_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), "com/acme/Foo", &class_bytes("com/acme/Foo", "java/lang/Object", &["a"], &[]));

        let mut path = LoadPath::new();
        path.add_root(dir.path()).unwrap();
        assert!(!path.contains("com.acme.Foo"));

        let first = path.load("com.acme.Foo").unwrap();
        let second = path.load("com/acme/Foo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(path.contains("com.acme.Foo"));
        assert!(path.find("com/acme/Missing").unwrap().is_none());
        assert!(matches!(path.load("com/acme/Missing"), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_name_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), "com/acme/Foo", &class_bytes("com/acme/Bar", "java/lang/Object", &[], &[]));

        let mut path = LoadPath::new();
        path.add_root(dir.path()).unwrap();
        assert!(matches!(path.find("com/acme/Foo"), Err(LoadError::NameMismatch { .. })));
    }

    #[test]
    fn test_define_replaces_generation() {
        let path = LoadPath::new();
        let bytes = class_bytes("com/acme/Foo", "java/lang/Object", &["a"], &[]);
        let first = path.define(&bytes, None).unwrap();
        let second = path.define(&bytes, None).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(Arc::ptr_eq(&path.load("com/acme/Foo").unwrap(), &second));
    }

    #[test]
    fn test_define_rejects_garbage() {
        let path = LoadPath::new();
        assert!(matches!(path.define(&[0xCA, 0xFE], None), Err(LoadError::ClassFile(_))));
    }

    #[test]
    fn test_members_include_inherited() {
        let path = LoadPath::new();
        path.define(&class_bytes("com/acme/Base", "java/lang/Object", &["shared", "baseOnly"], &[(0, "count")]), None)
            .unwrap();
        let child = path
            .define(&class_bytes("com/acme/Child", "com/acme/Base", &["shared", "childOnly"], &[]), None)
            .unwrap();

        let names: Vec<_> = path.members(&child).into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["shared", "childOnly", "baseOnly"]);
        assert!(!child.unit().has_instance_fields());
        assert!(path.has_instance_fields(&child));
    }

    #[test]
    fn test_static_fields_do_not_count() {
        let path = LoadPath::new();
        let unit = path
            .define(&class_bytes("com/acme/Foo", "java/lang/Object", &[], &[(access::STATIC, "COUNT")]), None)
            .unwrap();
        assert!(!path.has_instance_fields(&unit));
    }

    #[test]
    fn test_package_info_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("META-INF")).unwrap();
        std::fs::write(
            dir.path().join(crate::manifest::MANIFEST_PATH),
            "Manifest-Version: 1.0\nImplementation-Version: 2.4\n",
        )
        .unwrap();
        write_class(dir.path(), "com/acme/Foo", &class_bytes("com/acme/Foo", "java/lang/Object", &[], &[]));

        let mut path = LoadPath::new();
        path.add_root(dir.path()).unwrap();
        let unit = path.load("com/acme/Foo").unwrap();
        let info = unit.unit().package_info().unwrap();
        assert_eq!(info.implementation_version.as_deref(), Some("2.4"));

        let redefined = path.define(&unit.unit().to_bytes(), None).unwrap();
        assert!(redefined.unit().package_info().is_some());
    }
}
