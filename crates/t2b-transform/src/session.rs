//! Transformation session
//!
//! One session turns one unit into its benchmark counterpart:
//!
//! 1. state marker when the unit (or a superclass) has instance fields
//! 2. class metadata list
//! 3. per member: benchmark, setup, teardown, or skipped
//! 4. commit and re-bind the benchmark members to the committed generation

use crate::builder::{ArrayAnnotation, BuildAnnotation, EnumAnnotation, StringAnnotation};
use crate::classifier::{classify_with, Classifier, Verdict};
use crate::injector::{rebind, Injector, Target};
use crate::load_path::LoadPath;
use crate::names;
use crate::settings::TransformSettings;
use crate::unit::LoadedUnit;
use serde::Serialize;
use std::sync::Arc;
use t2b_metadata::{
    Member, MetadataResolver, ResolutionConfig, ResolutionContext, Scope, SystemProperties,
};
use uuid::Builder;

/// `BenchmarkTag` value for a member: the MD5 name-based (version 3) UUID
/// of its signature bytes, with no namespace prefix
///
/// Matches `java.util.UUID.nameUUIDFromBytes`, so tags agree with ones
/// produced on the JVM side and repeat across runs.
pub fn benchmark_tag(member: &Member) -> String {
    let digest = md5::compute(member.signature().as_bytes());
    Builder::from_md5_bytes(digest.0).into_uuid().to_string()
}

/// A member left out of the benchmark set, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMember {
    /// Member signature
    pub member: String,
    /// Why it was skipped
    pub reason: String,
}

/// Summary of one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Qualified name of the input unit
    pub unit: String,
    /// Qualified name of the unit the session ended with
    pub output: String,
    /// Whether a rewritten unit was committed
    pub altered: bool,
    /// Benchmark signatures
    pub benchmarks: Vec<String>,
    /// Setup member signatures
    pub setup: Vec<String>,
    /// Teardown member signatures
    pub teardown: Vec<String>,
    /// Invalid members
    pub skipped: Vec<SkippedMember>,
    /// Number of annotations that could not be injected, plus one when the
    /// rewritten unit could not be saved
    pub failures: usize,
    /// Benchmark names with no counterpart after commit
    pub unresolved: Vec<String>,
}

/// What a session produced
#[derive(Debug)]
pub struct SessionOutcome {
    /// Committed generation, or the input when nothing changed
    pub unit: Arc<LoadedUnit>,
    /// Benchmark members, bound to `unit`
    pub eligible: Vec<Member>,
    /// Benchmark names that could not be re-bound
    pub unresolved: Vec<String>,
    /// Summary
    pub report: SessionReport,
}

/// Runs transformations against a load path
pub struct Session<'a> {
    load_path: &'a LoadPath,
    settings: &'a TransformSettings,
    resolver: MetadataResolver<'a>,
}

impl<'a> Session<'a> {
    /// Create a session context
    pub fn new(
        load_path: &'a LoadPath,
        settings: &'a TransformSettings,
        config: &'a ResolutionConfig,
        properties: &'a SystemProperties,
    ) -> Self {
        Self {
            load_path,
            settings,
            resolver: MetadataResolver::new(config, properties),
        }
    }

    /// Load path in use
    pub fn load_path(&self) -> &'a LoadPath {
        self.load_path
    }

    /// Transform one unit
    pub fn run(&self, unit: Arc<LoadedUnit>, classifiers: &[&dyn Classifier]) -> SessionOutcome {
        let mut edits = Edits {
            injector: Injector::new(self.load_path, self.settings, Arc::clone(&unit)),
            failures: 0,
        };

        if self.load_path.has_instance_fields(&unit) {
            edits.ensure_state();
        }

        let info = unit.unit().info();
        let unit_metadata = self.resolver.resolve(Scope::Unit, ResolutionContext::Unit(&info));
        if !unit_metadata.is_empty() {
            edits.apply(&Target::Unit, &ArrayAnnotation::metadata_list(&unit_metadata));
        }

        let mut eligible = Vec::new();
        let mut setup = Vec::new();
        let mut teardown = Vec::new();
        let mut skipped = Vec::new();

        for member in self.load_path.members(&unit) {
            let target = Target::member(&member);
            match classify_with(classifiers, &member) {
                Verdict::Eligible => {
                    edits.apply(&target, &StringAnnotation::new(names::BENCHMARK));
                    edits.apply(
                        &target,
                        &StringAnnotation::new(names::BENCHMARK_TAG).member(names::TAG, benchmark_tag(&member)),
                    );
                    let metadata = self.resolver.resolve(Scope::Member, ResolutionContext::Member(&member));
                    if !metadata.is_empty() {
                        edits.apply(&target, &ArrayAnnotation::metadata_list(&metadata));
                    }
                    eligible.push(member);
                }
                _ if classifiers.iter().any(|c| c.is_setup_phase(&member)) => {
                    if edits.apply(&target, &EnumAnnotation::setup()) {
                        setup.push(member.signature());
                    }
                    edits.ensure_state();
                }
                _ if classifiers.iter().any(|c| c.is_teardown_phase(&member)) => {
                    if edits.apply(&target, &EnumAnnotation::tear_down()) {
                        teardown.push(member.signature());
                    }
                    edits.ensure_state();
                }
                Verdict::Invalid(reason) => {
                    tracing::warn!(
                        action = "Skipping",
                        kind = "method",
                        target = %member.qualified_name(),
                        "Skipping method {}: {}",
                        member.signature(),
                        reason
                    );
                    skipped.push(SkippedMember {
                        member: member.signature(),
                        reason,
                    });
                }
                Verdict::NotCandidate => {}
            }
        }

        let committed = edits.injector.commit();
        if edits.injector.is_mutated() {
            edits.failures += 1;
        }
        let unresolved = rebind(&mut eligible, &committed, self.load_path);
        for name in &unresolved {
            tracing::warn!(
                class = %committed.unit().qualified_name(),
                "Benchmark method {} not found after saving",
                name
            );
        }

        let report = SessionReport {
            unit: unit.unit().qualified_name(),
            output: committed.unit().qualified_name(),
            altered: !Arc::ptr_eq(&committed, &unit),
            benchmarks: eligible.iter().map(Member::signature).collect(),
            setup,
            teardown,
            skipped,
            failures: edits.failures,
            unresolved: unresolved.clone(),
        };

        SessionOutcome {
            unit: committed,
            eligible,
            unresolved,
            report,
        }
    }
}

struct Edits<'a> {
    injector: Injector<'a>,
    failures: usize,
}

impl Edits<'_> {
    /// Inject, counting failures; the injector has already logged them
    fn apply(&mut self, target: &Target, builder: &dyn BuildAnnotation) -> bool {
        let ok = self.injector.inject(target, builder).is_ok();
        if !ok {
            self.failures += 1;
        }
        ok
    }

    fn ensure_state(&mut self) {
        if !self.injector.has_annotation(&Target::Unit, names::STATE) {
            self.apply(&Target::Unit, &EnumAnnotation::state());
        }
    }
}
