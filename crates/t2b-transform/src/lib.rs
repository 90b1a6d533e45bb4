//! Test-to-Benchmark Class Transformation
//!
//! Rewrites compiled test classes into benchmark classes: eligible test
//! methods gain `@Benchmark`, a stable `@BenchmarkTag` and resolved metadata;
//! lifecycle methods gain `@Setup`/`@TearDown`; the class is renamed, written
//! to an output directory and defined on the load path.
//!
//! # Example
//!
//! ```no_run
//! use t2b_metadata::{ResolutionConfig, SystemProperties};
//! use t2b_transform::{default_classifiers, Classifier, LoadPath, Session, TransformSettings};
//!
//! let mut load_path = LoadPath::new();
//! load_path.add_root("target/test-classes").unwrap();
//! let properties = SystemProperties::new();
//! let config = ResolutionConfig::load(&properties);
//! let settings = TransformSettings::from_properties(&properties, "target/benchmarks");
//!
//! let classifiers = default_classifiers();
//! let classifiers: Vec<&dyn Classifier> = classifiers.iter().map(|c| c.as_ref() as &dyn Classifier).collect();
//! let session = Session::new(&load_path, &settings, &config, &properties);
//! let unit = load_path.load("com.acme.CalcTest").unwrap();
//! let outcome = session.run(unit, &classifiers);
//! println!("{} benchmarks", outcome.eligible.len());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod classifier;
pub mod error;
pub mod injector;
pub mod load_path;
pub mod manifest;
pub mod names;
pub mod session;
pub mod settings;
pub mod unit;

pub use builder::{ArrayAnnotation, BuildAnnotation, EnumAnnotation, StringAnnotation};
pub use classifier::{
    classify_with, default_classifiers, Classifier, JUnit4Classifier, JUnit5Classifier, TestNgClassifier, Verdict,
};
pub use error::{InjectError, LoadError};
pub use injector::{rebind, Injector, Target};
pub use load_path::{ClassRoot, LoadPath};
pub use manifest::Manifest;
pub use session::{benchmark_tag, Session, SessionOutcome, SessionReport, SkippedMember};
pub use settings::TransformSettings;
pub use unit::{CompiledUnit, LoadedUnit};
