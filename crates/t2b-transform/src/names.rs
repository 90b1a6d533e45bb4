//! Annotation type descriptors written by the session

/// `@org.openjdk.jmh.annotations.Benchmark`
pub const BENCHMARK: &str = "Lorg/openjdk/jmh/annotations/Benchmark;";
/// `@org.openjdk.jmh.annotations.State`
pub const STATE: &str = "Lorg/openjdk/jmh/annotations/State;";
/// `org.openjdk.jmh.annotations.Scope`
pub const SCOPE: &str = "Lorg/openjdk/jmh/annotations/Scope;";
/// `@org.openjdk.jmh.annotations.Setup`
pub const SETUP: &str = "Lorg/openjdk/jmh/annotations/Setup;";
/// `@org.openjdk.jmh.annotations.TearDown`
pub const TEAR_DOWN: &str = "Lorg/openjdk/jmh/annotations/TearDown;";
/// `org.openjdk.jmh.annotations.Level`
pub const LEVEL: &str = "Lorg/openjdk/jmh/annotations/Level;";

/// `@com.gocypher.cybench.core.annotation.BenchmarkTag`
pub const BENCHMARK_TAG: &str = "Lcom/gocypher/cybench/core/annotation/BenchmarkTag;";
/// `@com.gocypher.cybench.core.annotation.BenchmarkMetaData`
pub const BENCHMARK_METADATA: &str = "Lcom/gocypher/cybench/core/annotation/BenchmarkMetaData;";
/// `@com.gocypher.cybench.core.annotation.CyBenchMetadataList`
pub const METADATA_LIST: &str = "Lcom/gocypher/cybench/core/annotation/CyBenchMetadataList;";

/// `Scope.Benchmark`
pub const SCOPE_BENCHMARK: &str = "Benchmark";
/// `Level.Trial`
pub const LEVEL_TRIAL: &str = "Trial";

/// Element holding the single value of an annotation
pub const VALUE: &str = "value";
/// `BenchmarkTag.tag`
pub const TAG: &str = "tag";
/// `BenchmarkMetaData.key`
pub const KEY: &str = "key";

/// Java source form of a descriptor, for log messages
pub fn display_name(descriptor: &str) -> String {
    descriptor
        .strip_prefix('L')
        .and_then(|d| d.strip_suffix(';'))
        .unwrap_or(descriptor)
        .replace('/', ".")
}
