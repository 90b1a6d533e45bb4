//! Annotation injection and write-back
//!
//! An [`Injector`] owns the working copy of one unit for the duration of a
//! session. The first edit renames the unit (`Foo` to `Foo<suffix>`) unless a
//! renamed generation already exists; [`Injector::commit`] writes the result
//! and defines it on the load path.

use crate::builder::BuildAnnotation;
use crate::error::{InjectError, LoadError};
use crate::load_path::LoadPath;
use crate::names::display_name;
use crate::settings::TransformSettings;
use crate::unit::{CompiledUnit, LoadedUnit};
use std::fmt;
use std::sync::Arc;
use t2b_classfile::classfile::{annotations_mut_or_insert, find_annotations};
use t2b_classfile::{access, verify_class, ClassFile, MemberInfo, Visibility};
use t2b_metadata::Member;

/// Where an annotation goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The class itself
    Unit,
    /// A method declared on the unit
    Member {
        /// Simple name
        name: String,
        /// Method descriptor
        descriptor: String,
    },
}

impl Target {
    /// Target for a discovered member
    pub fn member(member: &Member) -> Self {
        Target::Member {
            name: member.name.clone(),
            descriptor: member.descriptor.clone(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Unit => write!(f, "class"),
            Target::Member { name, descriptor } => write!(f, "method {}{}", name, descriptor),
        }
    }
}

fn find_method<'c>(class: &'c ClassFile, name: &str, descriptor: &str) -> Option<&'c MemberInfo> {
    let pool = &class.constant_pool;
    class
        .methods
        .iter()
        .find(|m| m.name(pool) == Some(name) && m.descriptor(pool) == Some(descriptor))
}

fn has_annotation_on(class: &ClassFile, target: &Target, descriptor: &str) -> bool {
    let attributes = match target {
        Target::Unit => &class.attributes,
        Target::Member {
            name,
            descriptor: method_descriptor,
        } => match find_method(class, name, method_descriptor) {
            Some(method) => &method.attributes,
            None => return false,
        },
    };
    [Visibility::Visible, Visibility::Invisible].into_iter().any(|visibility| {
        find_annotations(attributes, visibility)
            .and_then(|a| a.find(descriptor, &class.constant_pool))
            .is_some()
    })
}

/// Edits one unit and writes it back
pub struct Injector<'a> {
    load_path: &'a LoadPath,
    settings: &'a TransformSettings,
    original: Arc<LoadedUnit>,
    working: Option<CompiledUnit>,
    reused: Option<Arc<LoadedUnit>>,
    mutated: bool,
    committed: Option<Arc<LoadedUnit>>,
}

impl<'a> Injector<'a> {
    /// Injector for `original`; nothing is copied or renamed until the
    /// first edit
    pub fn new(load_path: &'a LoadPath, settings: &'a TransformSettings, original: Arc<LoadedUnit>) -> Self {
        Self {
            load_path,
            settings,
            original,
            working: None,
            reused: None,
            mutated: false,
            committed: None,
        }
    }

    /// Handle the injector was created with
    pub fn original(&self) -> &Arc<LoadedUnit> {
        &self.original
    }

    /// Internal name of the working copy, once one exists
    pub fn working_name(&self) -> Option<&str> {
        self.working.as_ref().map(CompiledUnit::internal_name)
    }

    /// Whether edits are pending since the last commit
    pub fn is_mutated(&self) -> bool {
        self.mutated
    }

    /// Whether `target` already carries an annotation of this type, looking
    /// at the working copy when there is one
    pub fn has_annotation(&self, target: &Target, descriptor: &str) -> bool {
        let unit = self.working.as_ref().unwrap_or_else(|| self.original.unit());
        has_annotation_on(unit.class(), target, descriptor)
    }

    /// Append the annotation produced by `builder` to `target`
    ///
    /// A target that already carries an annotation of the same type is left
    /// alone; none of the injected types are repeatable.
    pub fn inject(&mut self, target: &Target, builder: &dyn BuildAnnotation) -> Result<(), InjectError> {
        let annotation = display_name(builder.type_descriptor());
        match self.try_inject(target, builder) {
            Ok(None) => {
                tracing::debug!(target = %target, "Annotation @{} already present on {}", annotation, target);
                Ok(())
            }
            Ok(Some(unit)) => {
                tracing::info!(
                    action = "Added",
                    kind = "annotation",
                    target = %target,
                    "Added annotation @{} to {} of {}",
                    annotation,
                    target,
                    unit
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    action = "Skipping",
                    kind = "annotation",
                    target = %target,
                    "Failed to add annotation @{} to {} of {}: {}",
                    annotation,
                    target,
                    self.original.unit().qualified_name(),
                    e
                );
                Err(e)
            }
        }
    }

    fn try_inject(&mut self, target: &Target, builder: &dyn BuildAnnotation) -> Result<Option<String>, InjectError> {
        let unit = self.working_unit()?;
        if has_annotation_on(unit.class(), target, builder.type_descriptor()) {
            return Ok(None);
        }
        unit.thaw();
        let unit_name = unit.qualified_name();
        for change in unit.normalize_visibility() {
            tracing::info!(action = "Changed", kind = "visibility", target = %unit_name, "Changed {}", change);
        }

        let class = unit
            .class_mut()
            .ok_or_else(|| InjectError::Frozen(unit_name.clone()))?;

        match target {
            Target::Unit => {
                let annotation = builder.build(&mut class.constant_pool)?;
                annotations_mut_or_insert(&mut class.attributes, Visibility::Visible, &mut class.constant_pool)?
                    .add(annotation);
            }
            Target::Member { name, descriptor } => {
                let pool = &class.constant_pool;
                let position = class
                    .methods
                    .iter()
                    .position(|m| m.name(pool) == Some(name.as_str()) && m.descriptor(pool) == Some(descriptor.as_str()))
                    .ok_or_else(|| InjectError::MemberNotFound {
                        unit: unit_name.clone(),
                        member: format!("{}{}", name, descriptor),
                    })?;

                let annotation = builder.build(&mut class.constant_pool)?;
                let method = &mut class.methods[position];
                if !access::is_public(method.access_flags) {
                    method.access_flags = access::make_public(method.access_flags);
                    tracing::info!(
                        action = "Changed",
                        kind = "visibility",
                        target = %unit_name,
                        "Changed method {}{} to public",
                        name,
                        descriptor
                    );
                }
                annotations_mut_or_insert(&mut method.attributes, Visibility::Visible, &mut class.constant_pool)?
                    .add(annotation);
            }
        }

        self.mutated = true;
        Ok(Some(unit_name))
    }

    /// Working copy, created on first use
    ///
    /// A unit that already carries the suffix is edited in place. Otherwise
    /// a renamed generation on the load path is reused; only when none
    /// exists is the original copied and renamed.
    fn working_unit(&mut self) -> Result<&mut CompiledUnit, InjectError> {
        let working = match self.working.take() {
            Some(working) => working,
            None => self.create_working()?,
        };
        Ok(self.working.insert(working))
    }

    fn create_working(&mut self) -> Result<CompiledUnit, InjectError> {
        let original = self.original.unit();
        let suffix = &self.settings.suffix;
        if original.is_altered(suffix) {
            return Ok(original.clone());
        }

        let altered = original.altered_name(suffix);
        match self.load_path.find(&altered) {
            Ok(Some(existing)) => {
                tracing::debug!(class = %existing.unit().qualified_name(), "Reusing altered class");
                let unit = existing.unit().clone();
                self.reused = Some(existing);
                Ok(unit)
            }
            Ok(None) => {
                let mut unit = original.clone();
                unit.thaw();
                unit.rename(&altered)?;
                tracing::info!(
                    action = "Rename",
                    kind = "class",
                    target = %original.qualified_name(),
                    "Renamed class {} to {}",
                    original.qualified_name(),
                    unit.qualified_name()
                );
                Ok(unit)
            }
            Err(source) => Err(InjectError::Lookup { name: altered, source }),
        }
    }

    /// Write and define the working copy
    ///
    /// Without pending edits this returns the last committed handle, then
    /// a reused renamed generation, then the original. Failures are logged
    /// and yield the original; the injector stays mutated.
    pub fn commit(&mut self) -> Arc<LoadedUnit> {
        if !self.mutated {
            let unchanged = self.committed.as_ref().or(self.reused.as_ref());
            return Arc::clone(unchanged.unwrap_or(&self.original));
        }

        match self.try_commit() {
            Ok(loaded) => {
                self.mutated = false;
                self.committed = Some(Arc::clone(&loaded));
                loaded
            }
            Err(e) => {
                tracing::error!(
                    action = "Skipping",
                    kind = "commit",
                    target = %self.original.unit().qualified_name(),
                    "Failed to save altered class {}: {}",
                    self.working_name().unwrap_or_else(|| self.original.name()),
                    e
                );
                Arc::clone(&self.original)
            }
        }
    }

    fn try_commit(&self) -> Result<Arc<LoadedUnit>, InjectError> {
        let Some(unit) = self.working.as_ref() else {
            return Ok(Arc::clone(&self.original));
        };
        verify_class(unit.class()).map_err(LoadError::from)?;

        // Nothing reaches the output directory unless it decodes and verifies
        let bytes = unit.to_bytes();
        let reloaded = CompiledUnit::from_bytes(&bytes, None)?.with_package_info(unit.package_info().cloned());
        verify_class(reloaded.class()).map_err(LoadError::from)?;

        let path = self.settings.output_dir.join(unit.relative_path());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| InjectError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, &bytes).map_err(|source| InjectError::Write {
            path: path.clone(),
            source,
        })?;
        let path = path.canonicalize().unwrap_or(path);

        let reloaded = reloaded.with_origin(&path);
        let loaded = self.load_path.define_unit(reloaded)?;
        tracing::info!(
            action = "Added",
            kind = "class",
            target = %loaded.unit().qualified_name(),
            "Saved class {} to {}",
            loaded.unit().qualified_name(),
            path.display()
        );
        Ok(loaded)
    }
}

/// Replace stale member snapshots with their counterparts in `committed`
///
/// Matching prefers name and descriptor, then name alone. Members with no
/// counterpart stay in place and their names are returned.
pub fn rebind(members: &mut [Member], committed: &LoadedUnit, load_path: &LoadPath) -> Vec<String> {
    let fresh = load_path.members(committed);
    let mut unresolved = Vec::new();

    for member in members.iter_mut() {
        let counterpart = fresh
            .iter()
            .find(|m| m.name == member.name && m.descriptor == member.descriptor)
            .or_else(|| fresh.iter().find(|m| m.name == member.name));
        match counterpart {
            Some(counterpart) => *member = counterpart.clone(),
            None => unresolved.push(member.name.clone()),
        }
    }

    unresolved
}
