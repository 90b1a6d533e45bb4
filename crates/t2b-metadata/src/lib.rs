//! Benchmark Metadata Resolution
//!
//! Turns configured templates such as `${sys#run.id}` or
//! `${method.signature.hash}` into concrete strings for a unit or member.
//!
//! # Example
//!
//! ```
//! use t2b_metadata::{MetadataResolver, ResolutionConfig, ResolutionContext, SystemProperties};
//!
//! let config = ResolutionConfig::from_properties_text("method.session=${sys#run.id}\n");
//! let props = SystemProperties::new().with("run.id", "42");
//! let resolver = MetadataResolver::new(&config, &props);
//! assert_eq!(resolver.resolve_template("${sys#run.id}", ResolutionContext::Detached), "42");
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod properties;
pub mod resolvers;
pub mod template;
pub mod variable;

pub use config::ResolutionConfig;
pub use context::{AnnotationInfo, AnnotationValue, Member, PackageInfo, ResolutionContext, UnitId, UnitInfo};
pub use engine::{MetadataResolver, Scope, FALLBACK_VALUE};
pub use error::{ConfigError, ResolveError};
pub use properties::{parse_properties, SystemProperties};
pub use resolvers::signature_hash;
pub use template::{Token, VariableTemplate};
pub use variable::Variable;
