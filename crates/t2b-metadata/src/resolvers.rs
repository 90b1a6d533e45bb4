//! Resolver namespaces
//!
//! `Ok(None)` means the variable is well-formed but has no value here (unset
//! property, class without a superclass, package without a manifest).

use crate::context::{Member, ResolutionContext, UnitInfo};
use crate::error::ResolveError;
use crate::properties::SystemProperties;
use crate::variable::{ClassField, GeneratedVar, MethodField, PackageField, Variable};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Resolve one parsed variable against a context
pub fn resolve_variable(
    variable: &Variable,
    context: ResolutionContext<'_>,
    properties: &SystemProperties,
) -> Result<Option<String>, ResolveError> {
    match variable {
        Variable::System(name) => Ok(properties.get(name).map(str::to_string)),
        Variable::Env(name) => Ok(std::env::var(name).ok()),
        Variable::Generated(var) => Ok(Some(generated(*var))),
        Variable::Class(field) => {
            let unit = context
                .unit()
                .ok_or_else(|| ResolveError::NoContext(variable.to_string()))?;
            Ok(class_value(*field, unit))
        }
        Variable::Method(field) => match context {
            ResolutionContext::Member(member) => method_value(*field, member).map(Some),
            ResolutionContext::Unit(_) => Err(ResolveError::ScopeMismatch(variable.to_string())),
            ResolutionContext::Detached => Err(ResolveError::NoContext(variable.to_string())),
        },
        Variable::Package(field) => {
            let unit = context
                .unit()
                .ok_or_else(|| ResolveError::NoContext(variable.to_string()))?;
            Ok(package_value(*field, unit))
        }
    }
}

/// Produce a fresh generated value
pub fn generated(var: GeneratedVar) -> String {
    match var {
        GeneratedVar::TimeMillis => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
            .to_string(),
        GeneratedVar::TimeNanos => PROCESS_START
            .get_or_init(Instant::now)
            .elapsed()
            .as_nanos()
            .to_string(),
        GeneratedVar::Uuid => uuid::Uuid::new_v4().to_string(),
        GeneratedVar::Random => rand::thread_rng().gen_range(0..10_000).to_string(),
    }
}

fn class_value(field: ClassField, unit: &UnitInfo) -> Option<String> {
    match field {
        ClassField::Name => Some(unit.simple_name().to_string()),
        ClassField::QualifiedName => Some(unit.qualified_name()),
        ClassField::Package => Some(unit.package_name()),
        ClassField::Super => unit.super_qualified_name(),
    }
}

fn method_value(field: MethodField, member: &Member) -> Result<String, ResolveError> {
    let descriptor = || {
        member.method_descriptor().map_err(|e| ResolveError::Malformed {
            variable: format!("method {}", member.name),
            reason: e.to_string(),
        })
    };

    let value = match field {
        MethodField::Name => member.name.clone(),
        MethodField::Signature => member.signature(),
        MethodField::Class => member.declaring.qualified_name(),
        MethodField::ReturnType => descriptor()?.return_java_name(),
        MethodField::QualifiedName => member.qualified_name(),
        MethodField::Parameters => format!("[{}]", descriptor()?.parameter_java_names().join(", ")),
        MethodField::SignatureHash => signature_hash(&member.signature()),
    };
    Ok(value)
}

/// SHA-256 hex digest of a member signature
pub fn signature_hash(signature: &str) -> String {
    hex::encode(Sha256::digest(signature.as_bytes()))
}

fn package_value(field: PackageField, unit: &UnitInfo) -> Option<String> {
    let info = || unit.package_info.as_ref();
    match field {
        PackageField::Name => Some(unit.package_name()),
        PackageField::Version => info()?.implementation_version.clone(),
        PackageField::Title => info()?.implementation_title.clone(),
        PackageField::Vendor => info()?.implementation_vendor.clone(),
        PackageField::SpecVersion => info()?.specification_version.clone(),
        PackageField::SpecTitle => info()?.specification_title.clone(),
        PackageField::SpecVendor => info()?.specification_vendor.clone(),
    }
}
