//! End-to-end resolution from a configuration file on disk

use std::io::Write;
use std::sync::Arc;
use t2b_metadata::config::CONFIG_PATH_PROPERTY;
use t2b_metadata::{
    signature_hash, Member, MetadataResolver, PackageInfo, ResolutionConfig, ResolutionContext, Scope,
    SystemProperties, UnitId, UnitInfo, FALLBACK_VALUE,
};

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write config");
    file
}

fn sample_member() -> Member {
    let mut unit = UnitInfo::new("com/acme/CalculatorTest", Some("java/lang/Object".into()), 0x21);
    unit.package_info = Some(PackageInfo {
        implementation_version: Some("2.0.1".into()),
        implementation_vendor: Some("Acme".into()),
        ..Default::default()
    });
    Member {
        unit: UnitId::next(),
        declaring: Arc::new(unit),
        name: "testAdd".into(),
        descriptor: "()V".into(),
        access_flags: 0x0001,
        annotations: Vec::new(),
    }
}

#[test]
fn test_session_from_system_property() {
    let file = write_config("method.session=${sys#run.id}\n");
    let props = SystemProperties::new()
        .with(CONFIG_PATH_PROPERTY, file.path().to_string_lossy())
        .with("run.id", "42");
    let config = ResolutionConfig::load(&props);
    let member = sample_member();

    let resolved = MetadataResolver::new(&config, &props).resolve(Scope::Member, ResolutionContext::Member(&member));

    assert_eq!(resolved.get("session").map(String::as_str), Some("42"));
}

#[test]
fn test_missing_env_uses_inline_default() {
    let file = write_config("method.tag=${env#T2B_SURELY_UNSET_VARIABLE}:default-tag}\n");
    let props = SystemProperties::new().with(CONFIG_PATH_PROPERTY, file.path().to_string_lossy());
    let config = ResolutionConfig::load(&props);
    let member = sample_member();

    let resolved = MetadataResolver::new(&config, &props).resolve(Scope::Member, ResolutionContext::Member(&member));

    assert_eq!(resolved.get("tag").map(String::as_str), Some("default-tag"));
}

#[test]
fn test_default_member_entries_resolve() {
    let config = ResolutionConfig::default();
    let props = SystemProperties::new();
    let member = sample_member();

    let resolved = MetadataResolver::new(&config, &props).resolve(Scope::Member, ResolutionContext::Member(&member));

    assert_eq!(resolved["session"], FALLBACK_VALUE);
    assert_eq!(resolved["wrappedApiMethodName"], "com.acme.CalculatorTest.testAdd");
    assert_eq!(
        resolved["wrappedApiMethodHash"],
        signature_hash("com.acme.CalculatorTest.testAdd()V")
    );
}

#[test]
fn test_unit_scope_with_package_manifest() {
    let config = ResolutionConfig::from_properties_text(
        "class.version=${package.version}\nclass.vendor=by ${package.vendor}\nclass.title=${package.title}:{untitled}\n",
    );
    let props = SystemProperties::new();
    let member = sample_member();

    let resolved =
        MetadataResolver::new(&config, &props).resolve(Scope::Unit, ResolutionContext::Unit(&member.declaring));

    assert_eq!(resolved["version"], "2.0.1");
    assert_eq!(resolved["vendor"], "by Acme");
    assert_eq!(resolved["title"], "untitled");
}

#[test]
fn test_resolution_never_returns_empty() {
    let config = ResolutionConfig::from_properties_text(
        "a=${sys#empty}\nb=${unknown}\nc=${vm#nope}:{}\nd=${method.name}\n",
    );
    let props = SystemProperties::new().with("empty", "");
    let unit = UnitInfo::new("Foo", None, 0);

    let resolved = MetadataResolver::new(&config, &props).resolve(Scope::Member, ResolutionContext::Unit(&unit));

    for key in ["a", "b", "c", "d"] {
        assert_eq!(resolved[key], FALLBACK_VALUE, "key {}", key);
    }
}

#[test]
fn test_generated_values_are_fresh() {
    let config = ResolutionConfig::default();
    let props = SystemProperties::new();
    let resolver = MetadataResolver::new(&config, &props);
    let a = resolver.resolve_template("${vm#uuid}", ResolutionContext::Detached);
    let b = resolver.resolve_template("${vm#uuid}", ResolutionContext::Detached);
    assert_ne!(a, b);
}
