//! Compiled and loaded units

use crate::error::{InjectError, LoadError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use t2b_classfile::descriptor::internal_to_qualified;
use t2b_classfile::{access, ClassFile, ClassFileError, MethodDescriptor, Visibility};
use t2b_metadata::{AnnotationInfo, Member, PackageInfo, UnitId, UnitInfo};

/// Instance initializer name
pub const CONSTRUCTOR: &str = "<init>";
/// Static initializer name
pub const STATIC_INITIALIZER: &str = "<clinit>";

/// A class file together with the facts the transformer tracks about it
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    class: ClassFile,
    name: String,
    frozen: bool,
    package_info: Option<PackageInfo>,
    origin: Option<PathBuf>,
}

impl CompiledUnit {
    /// Decode class file bytes; the result starts frozen
    pub fn from_bytes(bytes: &[u8], origin: Option<&Path>) -> Result<Self, LoadError> {
        let class = ClassFile::decode(bytes)?;
        let mut unit = Self::from_class(class)?;
        unit.origin = origin.map(Path::to_path_buf);
        Ok(unit)
    }

    /// Wrap an already decoded class file; the result starts frozen
    pub fn from_class(class: ClassFile) -> Result<Self, LoadError> {
        let name = class
            .this_name()
            .ok_or(ClassFileError::BadConstantIndex(class.this_class))?
            .to_string();
        Ok(Self {
            class,
            name,
            frozen: true,
            package_info: None,
            origin: None,
        })
    }

    /// Attach manifest attributes for the unit's package
    pub fn with_package_info(mut self, package_info: Option<PackageInfo>) -> Self {
        self.package_info = package_info;
        self
    }

    /// Record the file the unit was read from or written to
    pub fn with_origin(mut self, origin: &Path) -> Self {
        self.origin = Some(origin.to_path_buf());
        self
    }

    /// Internal name
    pub fn internal_name(&self) -> &str {
        &self.name
    }

    /// Binary name
    pub fn qualified_name(&self) -> String {
        internal_to_qualified(&self.name)
    }

    /// Simple name including any nesting (`Outer$Inner`)
    pub fn simple_name(&self) -> &str {
        t2b_classfile::simple_name(&self.name)
    }

    /// Internal package name
    pub fn package(&self) -> &str {
        t2b_classfile::package_of(&self.name)
    }

    /// Nested units keep their host-assigned visibility
    pub fn is_nested(&self) -> bool {
        self.simple_name().contains('$')
    }

    /// Superclass internal name
    pub fn super_name(&self) -> Option<&str> {
        self.class.super_name()
    }

    /// Manifest attributes
    pub fn package_info(&self) -> Option<&PackageInfo> {
        self.package_info.as_ref()
    }

    /// File the unit was read from
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Read-only class file
    pub fn class(&self) -> &ClassFile {
        &self.class
    }

    /// Mutable class file; `None` while frozen
    pub fn class_mut(&mut self) -> Option<&mut ClassFile> {
        if self.frozen {
            None
        } else {
            Some(&mut self.class)
        }
    }

    /// Whether structural edits are blocked
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Block structural edits
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Allow structural edits
    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    /// Rename the unit; fails while frozen
    pub fn rename(&mut self, new_name: &str) -> Result<(), InjectError> {
        let frozen = self.name.clone();
        let class = self.class_mut().ok_or(InjectError::Frozen(frozen))?;
        class.rename_class(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }

    /// Name under which a transformed copy is stored
    pub fn altered_name(&self, suffix: &str) -> String {
        t2b_classfile::suffixed_name(&self.name, suffix)
    }

    /// Whether the name already carries the suffix on its outermost segment
    pub fn is_altered(&self, suffix: &str) -> bool {
        let outer = self.simple_name().split('$').next().unwrap_or_default();
        !suffix.is_empty() && outer.ends_with(suffix)
    }

    /// Reflection view used for variable resolution
    pub fn info(&self) -> UnitInfo {
        let mut info = UnitInfo::new(
            self.name.clone(),
            self.super_name().map(str::to_string),
            self.class.access_flags,
        );
        info.package_info = self.package_info.clone();
        info
    }

    /// Whether any declared field is non-static
    pub fn has_instance_fields(&self) -> bool {
        self.class
            .fields
            .iter()
            .any(|f| !access::is_static(f.access_flags))
    }

    /// Declared methods, initializers excluded, as owned snapshots
    pub fn declared_members(&self, unit: UnitId) -> Vec<Member> {
        let pool = &self.class.constant_pool;
        let declaring = Arc::new(self.info());
        self.class
            .methods
            .iter()
            .filter_map(|method| {
                let name = method.name(pool)?;
                if name == CONSTRUCTOR || name == STATIC_INITIALIZER {
                    return None;
                }
                let annotations = [Visibility::Visible, Visibility::Invisible]
                    .into_iter()
                    .filter_map(|v| method.annotations(v))
                    .flat_map(|attr| attr.annotations.iter())
                    .filter_map(|a| AnnotationInfo::from_annotation(a, pool))
                    .collect();
                Some(Member {
                    unit,
                    declaring: Arc::clone(&declaring),
                    name: name.to_string(),
                    descriptor: method.descriptor(pool)?.to_string(),
                    access_flags: method.access_flags,
                    annotations,
                })
            })
            .collect()
    }

    /// Raise the class (unless nested) and its zero/one-argument
    /// constructors to public; returns a description of each change
    pub fn normalize_visibility(&mut self) -> Vec<String> {
        let mut changes = Vec::new();
        let name = self.qualified_name();
        let nested = self.is_nested();
        let Some(class) = self.class_mut() else {
            return changes;
        };

        if !nested && !access::is_public(class.access_flags) {
            class.access_flags = access::make_public(class.access_flags);
            changes.push(format!("class {} to public", name));
        }

        let pool = &class.constant_pool;
        for method in &mut class.methods {
            if method.name(pool) != Some(CONSTRUCTOR) || access::is_public(method.access_flags) {
                continue;
            }
            let params = method
                .descriptor(pool)
                .and_then(|d| MethodDescriptor::parse(d).ok())
                .map(|d| d.parameters.len());
            if matches!(params, Some(0 | 1)) {
                method.access_flags = access::make_public(method.access_flags);
                changes.push(format!(
                    "constructor {}{} to public",
                    name,
                    method.descriptor(pool).unwrap_or_default()
                ));
            }
        }

        changes
    }

    /// Encode to class file bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.class.encode()
    }

    /// `<package path>/<Simple>.class` relative to an output root
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.class", self.name))
    }
}

/// An immutable, shareable generation of a unit
#[derive(Debug)]
pub struct LoadedUnit {
    id: UnitId,
    unit: CompiledUnit,
}

impl LoadedUnit {
    /// Freeze `unit` and assign it a fresh id
    pub fn new(mut unit: CompiledUnit) -> Self {
        unit.freeze();
        Self {
            id: UnitId::next(),
            unit,
        }
    }

    /// Generation id
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Frozen unit
    pub fn unit(&self) -> &CompiledUnit {
        &self.unit
    }

    /// Internal name
    pub fn name(&self) -> &str {
        self.unit.internal_name()
    }

    /// Declared methods of this generation
    pub fn declared_members(&self) -> Vec<Member> {
        self.unit.declared_members(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> CompiledUnit {
        let mut class = ClassFile::new(name, "java/lang/Object").unwrap();
        class.access_flags = access::SUPER;
        class.add_method(access::PRIVATE, CONSTRUCTOR, "()V").unwrap();
        class.add_method(access::PRIVATE, CONSTRUCTOR, "(II)V").unwrap();
        class.add_method(access::STATIC, STATIC_INITIALIZER, "()V").unwrap();
        class.add_method(access::PUBLIC, "testAdd", "()V").unwrap();
        class.add_field(access::PRIVATE, "calc", "Lcom/acme/Calc;").unwrap();
        CompiledUnit::from_class(class).unwrap()
    }

    #[test]
    fn test_names() {
        let unit = unit("com/acme/Outer$Inner");
        assert_eq!(unit.qualified_name(), "com.acme.Outer$Inner");
        assert_eq!(unit.simple_name(), "Outer$Inner");
        assert_eq!(unit.package(), "com/acme");
        assert!(unit.is_nested());
        assert_eq!(unit.altered_name("Bench"), "com/acme/OuterBench$Inner");
        assert_eq!(unit.relative_path(), PathBuf::from("com/acme/Outer$Inner.class"));
    }

    #[test]
    fn test_is_altered() {
        assert!(unit("com/acme/FooBench$Inner").is_altered("Bench"));
        assert!(!unit("com/acme/Foo$InnerBench").is_altered("Bench"));
        assert!(!unit("com/acme/Foo").is_altered(""));
    }

    #[test]
    fn test_frozen_unit_rejects_edits() {
        let mut unit = unit("com/acme/Foo");
        assert!(unit.is_frozen());
        assert!(unit.class_mut().is_none());
        assert!(unit.rename("com/acme/Bar").is_err());
        unit.thaw();
        unit.rename("com/acme/Bar").unwrap();
        assert_eq!(unit.internal_name(), "com/acme/Bar");
    }

    #[test]
    fn test_declared_members_skip_initializers() {
        let unit = unit("com/acme/Foo");
        let members = unit.declared_members(UnitId::next());
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "testAdd");
        assert_eq!(members[0].declaring.qualified_name(), "com.acme.Foo");
        assert!(unit.has_instance_fields());
    }

    #[test]
    fn test_normalize_visibility() {
        let mut unit = unit("com/acme/Foo");
        unit.thaw();
        let changes = unit.normalize_visibility();
        assert_eq!(changes.len(), 2);
        let class = unit.class();
        assert!(access::is_public(class.access_flags));
        assert!(access::is_public(class.methods[0].access_flags));
        assert!(!access::is_public(class.methods[1].access_flags));
        assert!(unit.clone().normalize_visibility().is_empty());
    }

    #[test]
    fn test_nested_class_keeps_visibility() {
        let mut unit = unit("com/acme/Foo$Inner");
        unit.thaw();
        unit.normalize_visibility();
        assert!(!access::is_public(unit.class().access_flags));
    }
}
