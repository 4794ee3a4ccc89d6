//! `staplay --version` reports `STAPLAY_VERSION` as a bare version number.
//! A release tag such as `v1.2.0` is stored as `1.2.0`; without one the
//! package version is used.

const VERSION: &str = env!("STAPLAY_VERSION");

#[test]
fn release_tag_prefix_is_stripped() {
    assert!(!VERSION.starts_with('v'), "got {VERSION:?}");
}

#[test]
fn version_is_numeric() {
    let core = VERSION.split(['-', '+']).next().unwrap_or_default();
    assert!(
        !core.is_empty() && core.split('.').all(|part| part.parse::<u64>().is_ok()),
        "got {VERSION:?}"
    );
}

#[test]
fn untagged_build_uses_package_version() {
    if option_env!("STAPLAY_RELEASE_VERSION").is_none() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
