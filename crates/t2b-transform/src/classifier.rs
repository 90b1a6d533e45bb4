//! Member classification
//!
//! A classifier decides whether a member becomes a benchmark, a lifecycle
//! hook, or nothing. The built-in classifiers read test-framework
//! annotations.

use t2b_classfile::MethodDescriptor;
use t2b_metadata::Member;

/// Outcome of classifying one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Becomes a benchmark
    Eligible,
    /// Not something this classifier recognizes
    NotCandidate,
    /// Recognized as a test but cannot be benchmarked
    Invalid(String),
}

/// Decides the role of each member of a unit
pub trait Classifier {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Benchmark eligibility
    fn classify(&self, member: &Member) -> Verdict;

    /// Runs once before benchmarks (`@Setup(Level.Trial)`)
    fn is_setup_phase(&self, member: &Member) -> bool;

    /// Runs once after benchmarks (`@TearDown(Level.Trial)`)
    fn is_teardown_phase(&self, member: &Member) -> bool;
}

struct FrameworkRules {
    name: &'static str,
    tests: &'static [&'static str],
    disabled: &'static [&'static str],
    /// `(annotation, element)` pairs declaring an expected exception
    expects_exception: &'static [(&'static str, &'static str)],
    setup: &'static [&'static str],
    teardown: &'static [&'static str],
}

impl FrameworkRules {
    fn classify(&self, member: &Member) -> Verdict {
        if !self.tests.iter().any(|d| member.has_annotation(d)) {
            return Verdict::NotCandidate;
        }
        if self.disabled.iter().any(|d| member.has_annotation(d)) {
            return Verdict::Invalid("ignored".to_string());
        }
        let expects_exception = self.expects_exception.iter().any(|(annotation, element)| {
            member
                .annotation(annotation)
                .is_some_and(|a| a.elements.contains_key(*element))
        });
        if expects_exception {
            return Verdict::Invalid("exception expected".to_string());
        }

        match MethodDescriptor::parse(&member.descriptor) {
            Ok(descriptor) if !descriptor.parameters.is_empty() => {
                Verdict::Invalid("has parameters".to_string())
            }
            Ok(descriptor) if descriptor.return_type.is_some() => {
                Verdict::Invalid("wrong return type".to_string())
            }
            Ok(_) => Verdict::Eligible,
            Err(e) => Verdict::Invalid(e.to_string()),
        }
    }

    fn has_any(&self, member: &Member, descriptors: &[&str]) -> bool {
        descriptors.iter().any(|d| member.has_annotation(d))
    }
}

const JUNIT4: FrameworkRules = FrameworkRules {
    name: "junit4",
    tests: &["Lorg/junit/Test;"],
    disabled: &["Lorg/junit/Ignore;"],
    expects_exception: &[("Lorg/junit/Test;", "expected")],
    setup: &["Lorg/junit/Before;", "Lorg/junit/BeforeClass;"],
    teardown: &["Lorg/junit/After;", "Lorg/junit/AfterClass;"],
};

const JUNIT5: FrameworkRules = FrameworkRules {
    name: "junit5",
    tests: &["Lorg/junit/jupiter/api/Test;"],
    disabled: &["Lorg/junit/jupiter/api/Disabled;"],
    expects_exception: &[],
    setup: &["Lorg/junit/jupiter/api/BeforeEach;", "Lorg/junit/jupiter/api/BeforeAll;"],
    teardown: &["Lorg/junit/jupiter/api/AfterEach;", "Lorg/junit/jupiter/api/AfterAll;"],
};

const TESTNG: FrameworkRules = FrameworkRules {
    name: "testng",
    tests: &["Lorg/testng/annotations/Test;"],
    disabled: &["Lorg/testng/annotations/Ignore;"],
    expects_exception: &[("Lorg/testng/annotations/Test;", "expectedExceptions")],
    setup: &[
        "Lorg/testng/annotations/BeforeMethod;",
        "Lorg/testng/annotations/BeforeClass;",
    ],
    teardown: &[
        "Lorg/testng/annotations/AfterMethod;",
        "Lorg/testng/annotations/AfterClass;",
    ],
};

macro_rules! framework_classifier {
    ($(#[$doc:meta])* $name:ident, $rules:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Classifier for $name {
            fn name(&self) -> &str {
                $rules.name
            }

            fn classify(&self, member: &Member) -> Verdict {
                $rules.classify(member)
            }

            fn is_setup_phase(&self, member: &Member) -> bool {
                $rules.has_any(member, $rules.setup)
            }

            fn is_teardown_phase(&self, member: &Member) -> bool {
                $rules.has_any(member, $rules.teardown)
            }
        }
    };
}

framework_classifier!(
    /// JUnit 4 (`org.junit.Test`)
    JUnit4Classifier,
    JUNIT4
);
framework_classifier!(
    /// JUnit 5 (`org.junit.jupiter.api.Test`)
    JUnit5Classifier,
    JUNIT5
);
framework_classifier!(
    /// TestNG (`org.testng.annotations.Test`)
    TestNgClassifier,
    TESTNG
);

/// All built-in classifiers
pub fn default_classifiers() -> Vec<Box<dyn Classifier + Send + Sync>> {
    vec![
        Box::new(JUnit4Classifier),
        Box::new(JUnit5Classifier),
        Box::new(TestNgClassifier),
    ]
}

/// First verdict other than [`Verdict::NotCandidate`]
pub fn classify_with(classifiers: &[&dyn Classifier], member: &Member) -> Verdict {
    classifiers
        .iter()
        .map(|c| c.classify(member))
        .find(|v| *v != Verdict::NotCandidate)
        .unwrap_or(Verdict::NotCandidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use t2b_metadata::{AnnotationInfo, AnnotationValue, UnitId, UnitInfo};

    fn member(descriptor: &str, annotations: &[(&str, &[&str])]) -> Member {
        Member {
            unit: UnitId::next(),
            declaring: Arc::new(UnitInfo::new("com/acme/FooTest", None, 0)),
            name: "testAdd".to_string(),
            descriptor: descriptor.to_string(),
            access_flags: 0,
            annotations: annotations
                .iter()
                .map(|(d, elements)| AnnotationInfo {
                    descriptor: d.to_string(),
                    elements: elements
                        .iter()
                        .map(|e| (e.to_string(), AnnotationValue::Other))
                        .collect::<BTreeMap<_, _>>(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_junit4() {
        let c = JUnit4Classifier;
        assert_eq!(c.classify(&member("()V", &[("Lorg/junit/Test;", &[])])), Verdict::Eligible);
        assert_eq!(c.classify(&member("()V", &[])), Verdict::NotCandidate);
        assert_eq!(
            c.classify(&member("()V", &[("Lorg/junit/Test;", &[]), ("Lorg/junit/Ignore;", &[])])),
            Verdict::Invalid("ignored".to_string())
        );
        assert_eq!(
            c.classify(&member("()V", &[("Lorg/junit/Test;", &["expected"])])),
            Verdict::Invalid("exception expected".to_string())
        );
        assert_eq!(
            c.classify(&member("(I)V", &[("Lorg/junit/Test;", &[])])),
            Verdict::Invalid("has parameters".to_string())
        );
        assert_eq!(
            c.classify(&member("()I", &[("Lorg/junit/Test;", &[])])),
            Verdict::Invalid("wrong return type".to_string())
        );
        assert!(c.is_setup_phase(&member("()V", &[("Lorg/junit/BeforeClass;", &[])])));
        assert!(c.is_teardown_phase(&member("()V", &[("Lorg/junit/After;", &[])])));
    }

    #[test]
    fn test_frameworks_do_not_overlap() {
        let jupiter = member("()V", &[("Lorg/junit/jupiter/api/Test;", &[])]);
        assert_eq!(JUnit4Classifier.classify(&jupiter), Verdict::NotCandidate);
        assert_eq!(JUnit5Classifier.classify(&jupiter), Verdict::Eligible);
        assert_eq!(TestNgClassifier.classify(&jupiter), Verdict::NotCandidate);
    }

    #[test]
    fn test_testng_expected_exceptions() {
        let m = member("()V", &[("Lorg/testng/annotations/Test;", &["expectedExceptions"])]);
        assert_eq!(TestNgClassifier.classify(&m), Verdict::Invalid("exception expected".to_string()));
    }

    #[test]
    fn test_classify_with_first_decisive_verdict() {
        let classifiers = default_classifiers();
        let refs: Vec<&dyn Classifier> = classifiers.iter().map(|c| c.as_ref() as &dyn Classifier).collect();
        let m = member("()V", &[("Lorg/testng/annotations/Test;", &[])]);
        assert_eq!(classify_with(&refs, &m), Verdict::Eligible);
        assert_eq!(classify_with(&refs, &member("()V", &[])), Verdict::NotCandidate);
    }
}
