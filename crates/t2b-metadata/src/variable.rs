//! Variable names
//!
//! Each namespace has a closed vocabulary; anything outside it is rejected
//! at parse time.

use crate::error::ResolveError;
use std::fmt;

/// System property prefix
pub const SYS_PREFIX: &str = "sys#";
/// Environment variable prefix
pub const ENV_PREFIX: &str = "env#";
/// Generated value prefix
pub const VM_PREFIX: &str = "vm#";
/// Class reflection prefix
pub const CLASS_PREFIX: &str = "class.";
/// Method reflection prefix
pub const METHOD_PREFIX: &str = "method.";
/// Package reflection prefix
pub const PACKAGE_PREFIX: &str = "package.";

/// A parsed variable reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    /// `sys#<name>`
    System(String),
    /// `env#<name>`
    Env(String),
    /// `vm#<field>`
    Generated(GeneratedVar),
    /// `class.<field>`
    Class(ClassField),
    /// `method.<field>`
    Method(MethodField),
    /// `package.<field>`
    Package(PackageField),
}

/// Values produced fresh on every lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedVar {
    /// Wall clock milliseconds since the Unix epoch
    TimeMillis,
    /// Monotonic nanoseconds since process start
    TimeNanos,
    /// Random v4 UUID
    Uuid,
    /// Integer in `[0, 10000)`
    Random,
}

/// Class reflection fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassField {
    /// Simple name
    Name,
    /// Binary name
    QualifiedName,
    /// Package name
    Package,
    /// Superclass binary name
    Super,
}

/// Method reflection fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodField {
    /// Simple name
    Name,
    /// Full signature
    Signature,
    /// Declaring class binary name
    Class,
    /// Return type as a Java source name
    ReturnType,
    /// `<class>.<name>`
    QualifiedName,
    /// Parameter types, `[int, java.lang.String]`
    Parameters,
    /// SHA-256 hex digest of the signature
    SignatureHash,
}

/// Package manifest fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageField {
    /// Package name
    Name,
    /// `Implementation-Version`
    Version,
    /// `Implementation-Title`
    Title,
    /// `Implementation-Vendor`
    Vendor,
    /// `Specification-Version`
    SpecVersion,
    /// `Specification-Title`
    SpecTitle,
    /// `Specification-Vendor`
    SpecVendor,
}

impl Variable {
    /// Parse a variable name as it appears inside `${...}`
    pub fn parse(name: &str) -> Result<Self, ResolveError> {
        let unknown = |namespace: &'static str, field: &str| ResolveError::UnknownField {
            namespace,
            field: field.to_string(),
        };

        if let Some(rest) = non_empty(name, SYS_PREFIX) {
            return Ok(Variable::System(rest.to_string()));
        }
        if let Some(rest) = non_empty(name, ENV_PREFIX) {
            return Ok(Variable::Env(rest.to_string()));
        }
        if let Some(rest) = non_empty(name, VM_PREFIX) {
            let var = match rest {
                "time.millis" => GeneratedVar::TimeMillis,
                "time.nanos" => GeneratedVar::TimeNanos,
                "uuid" => GeneratedVar::Uuid,
                "random" => GeneratedVar::Random,
                other => return Err(unknown("VM", other)),
            };
            return Ok(Variable::Generated(var));
        }
        if let Some(rest) = non_empty(name, CLASS_PREFIX) {
            let field = match rest {
                "name" => ClassField::Name,
                "qualified.name" => ClassField::QualifiedName,
                "package" => ClassField::Package,
                "super" => ClassField::Super,
                other => return Err(unknown("CLASS", other)),
            };
            return Ok(Variable::Class(field));
        }
        if let Some(rest) = non_empty(name, METHOD_PREFIX) {
            let field = match rest {
                "name" => MethodField::Name,
                "signature" => MethodField::Signature,
                "class" => MethodField::Class,
                "return.type" => MethodField::ReturnType,
                "qualified.name" => MethodField::QualifiedName,
                "parameters" => MethodField::Parameters,
                "signature.hash" => MethodField::SignatureHash,
                other => return Err(unknown("METHOD", other)),
            };
            return Ok(Variable::Method(field));
        }
        if let Some(rest) = non_empty(name, PACKAGE_PREFIX) {
            let field = match rest {
                "name" => PackageField::Name,
                "version" => PackageField::Version,
                "title" => PackageField::Title,
                "vendor" => PackageField::Vendor,
                "spec.version" => PackageField::SpecVersion,
                "spec.title" => PackageField::SpecTitle,
                "spec.vendor" => PackageField::SpecVendor,
                other => return Err(unknown("PACKAGE", other)),
            };
            return Ok(Variable::Package(field));
        }

        Err(ResolveError::UnknownVariable(name.to_string()))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::System(name) => write!(f, "{}{}", SYS_PREFIX, name),
            Variable::Env(name) => write!(f, "{}{}", ENV_PREFIX, name),
            Variable::Generated(var) => {
                let field = match var {
                    GeneratedVar::TimeMillis => "time.millis",
                    GeneratedVar::TimeNanos => "time.nanos",
                    GeneratedVar::Uuid => "uuid",
                    GeneratedVar::Random => "random",
                };
                write!(f, "{}{}", VM_PREFIX, field)
            }
            Variable::Class(field) => {
                let field = match field {
                    ClassField::Name => "name",
                    ClassField::QualifiedName => "qualified.name",
                    ClassField::Package => "package",
                    ClassField::Super => "super",
                };
                write!(f, "{}{}", CLASS_PREFIX, field)
            }
            Variable::Method(field) => {
                let field = match field {
                    MethodField::Name => "name",
                    MethodField::Signature => "signature",
                    MethodField::Class => "class",
                    MethodField::ReturnType => "return.type",
                    MethodField::QualifiedName => "qualified.name",
                    MethodField::Parameters => "parameters",
                    MethodField::SignatureHash => "signature.hash",
                };
                write!(f, "{}{}", METHOD_PREFIX, field)
            }
            Variable::Package(field) => {
                let field = match field {
                    PackageField::Name => "name",
                    PackageField::Version => "version",
                    PackageField::Title => "title",
                    PackageField::Vendor => "vendor",
                    PackageField::SpecVersion => "spec.version",
                    PackageField::SpecTitle => "spec.title",
                    PackageField::SpecVendor => "spec.vendor",
                };
                write!(f, "{}{}", PACKAGE_PREFIX, field)
            }
        }
    }
}

fn non_empty<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}
