//! Resolution context views
//!
//! Owned snapshots of the unit and member being annotated. A `Member` never
//! borrows from the class file it came from, so it stays valid across a
//! commit; the `unit` field records which generation it was taken from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use t2b_classfile::descriptor::internal_to_qualified;
use t2b_classfile::{access, Annotation, ConstantPool, ElementValue, MethodDescriptor};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of one loaded generation of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    /// Allocate the next id; ids increase monotonically
    pub fn next() -> Self {
        UnitId(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Package attributes taken from a jar-style manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// `Implementation-Version`
    pub implementation_version: Option<String>,
    /// `Implementation-Title`
    pub implementation_title: Option<String>,
    /// `Implementation-Vendor`
    pub implementation_vendor: Option<String>,
    /// `Specification-Version`
    pub specification_version: Option<String>,
    /// `Specification-Title`
    pub specification_title: Option<String>,
    /// `Specification-Vendor`
    pub specification_vendor: Option<String>,
}

/// Class-level facts about a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    /// Internal name, e.g. `com/acme/Foo$Bar`
    pub internal_name: String,
    /// Superclass internal name, `None` for `java/lang/Object` itself
    pub super_name: Option<String>,
    /// Class access flags
    pub access_flags: u16,
    /// Manifest attributes for the unit's package, if any were found
    pub package_info: Option<PackageInfo>,
}

impl UnitInfo {
    /// Create a view with no manifest information
    pub fn new(internal_name: impl Into<String>, super_name: Option<String>, access_flags: u16) -> Self {
        Self {
            internal_name: internal_name.into(),
            super_name,
            access_flags,
            package_info: None,
        }
    }

    /// Binary name, e.g. `com.acme.Foo$Bar`
    pub fn qualified_name(&self) -> String {
        internal_to_qualified(&self.internal_name)
    }

    /// Name without package, e.g. `Foo$Bar`
    pub fn simple_name(&self) -> &str {
        t2b_classfile::simple_name(&self.internal_name)
    }

    /// Dotted package name, empty for the default package
    pub fn package_name(&self) -> String {
        internal_to_qualified(t2b_classfile::package_of(&self.internal_name))
    }

    /// Superclass binary name
    pub fn super_qualified_name(&self) -> Option<String> {
        self.super_name.as_deref().map(internal_to_qualified)
    }

    /// Nested units carry `$` in their simple name
    pub fn is_nested(&self) -> bool {
        self.simple_name().contains('$')
    }
}

/// An annotation element value, detached from its constant pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    /// String constant
    String(String),
    /// Integral constant (`B C I S Z`)
    Int(i32),
    /// Enum constant name
    Enum(String),
    /// Any other value kind
    Other,
}

/// An annotation present on a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationInfo {
    /// Type descriptor, e.g. `Lorg/junit/Test;`
    pub descriptor: String,
    /// Elements by name
    pub elements: BTreeMap<String, AnnotationValue>,
}

impl AnnotationInfo {
    /// Snapshot an annotation; entries with dangling pool indices are skipped
    pub fn from_annotation(annotation: &Annotation, pool: &ConstantPool) -> Option<Self> {
        let descriptor = annotation.type_descriptor(pool)?.to_string();
        let elements = annotation
            .elements
            .iter()
            .filter_map(|pair| {
                let name = pool.utf8(pair.name_index)?.to_string();
                let value = match &pair.value {
                    v @ ElementValue::Const { tag: b's', .. } => {
                        AnnotationValue::String(v.as_str(pool)?.to_string())
                    }
                    v @ ElementValue::Const { .. } => {
                        v.as_int(pool).map(AnnotationValue::Int).unwrap_or(AnnotationValue::Other)
                    }
                    ElementValue::Enum {
                        const_name_index, ..
                    } => AnnotationValue::Enum(pool.utf8(*const_name_index)?.to_string()),
                    _ => AnnotationValue::Other,
                };
                Some((name, value))
            })
            .collect();
        Some(Self {
            descriptor,
            elements,
        })
    }
}

/// A method of a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Generation the snapshot was taken from
    pub unit: UnitId,
    /// Declaring unit (a superclass for inherited members)
    pub declaring: Arc<UnitInfo>,
    /// Simple name
    pub name: String,
    /// Method descriptor
    pub descriptor: String,
    /// Access flags
    pub access_flags: u16,
    /// Annotations from both retention tiers
    pub annotations: Vec<AnnotationInfo>,
}

impl Member {
    /// Deterministic signature: `<class>.<name><descriptor>` with dotted names
    ///
    /// `com.acme.FooTest.testAdd(Ljava.lang.String;)V`
    pub fn signature(&self) -> String {
        format!(
            "{}.{}{}",
            self.declaring.qualified_name(),
            self.name,
            self.descriptor.replace('/', ".")
        )
    }

    /// `<declaring class>.<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring.qualified_name(), self.name)
    }

    /// Parsed descriptor
    pub fn method_descriptor(&self) -> Result<MethodDescriptor, t2b_classfile::DescriptorError> {
        MethodDescriptor::parse(&self.descriptor)
    }

    /// Number of declared parameters (0 when the descriptor is malformed)
    pub fn parameter_count(&self) -> usize {
        self.method_descriptor().map(|d| d.parameters.len()).unwrap_or(0)
    }

    /// Static method
    pub fn is_static(&self) -> bool {
        access::is_static(self.access_flags)
    }

    /// Annotation by type descriptor
    pub fn annotation(&self, descriptor: &str) -> Option<&AnnotationInfo> {
        self.annotations.iter().find(|a| a.descriptor == descriptor)
    }

    /// Whether an annotation with the given type descriptor is present
    pub fn has_annotation(&self, descriptor: &str) -> bool {
        self.annotation(descriptor).is_some()
    }
}

/// What a template is being resolved against
#[derive(Debug, Clone, Copy)]
pub enum ResolutionContext<'a> {
    /// Unit scope
    Unit(&'a UnitInfo),
    /// Member scope; class and package variables use the declaring unit
    Member(&'a Member),
    /// No reflection target; only `sys#`, `env#` and `vm#` resolve
    Detached,
}

impl<'a> ResolutionContext<'a> {
    /// Unit the context refers to
    pub fn unit(&self) -> Option<&'a UnitInfo> {
        match *self {
            ResolutionContext::Unit(unit) => Some(unit),
            ResolutionContext::Member(member) => Some(member.declaring.as_ref()),
            ResolutionContext::Detached => None,
        }
    }

    /// Member the context refers to
    pub fn member(&self) -> Option<&'a Member> {
        match *self {
            ResolutionContext::Member(member) => Some(member),
            _ => None,
        }
    }
}
