const RELEASE_VAR: &str = "STAPLAY_RELEASE_VERSION";

fn main() {
    println!("cargo:rerun-if-env-changed={RELEASE_VAR}");

    let version = match std::env::var(RELEASE_VAR) {
        Ok(tag) => tag.trim().trim_start_matches('v').to_string(),
        Err(_) => env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("cargo:rustc-env=STAPLAY_VERSION={version}");

    // Unreleased builds keep their data under `staplay-dev`.
    println!("cargo:rustc-check-cfg=cfg(dev_build)");
    if version.contains("-dev") {
        println!("cargo:rustc-cfg=dev_build");
    }
}
