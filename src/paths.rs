//! Centralized path resolution for application data files.
//!
//! This module resolves paths to:
//! - Config file (`~/.config/staplay[-dev]/config.toml`)
//! - Data directory holding session stores (`~/.local/share/staplay[-dev]/`)
//! - Log directory (`~/.local/share/staplay[-dev]/logs/`)
//!
//! Dev builds (`0.0.0-dev`) use `staplay-dev` subdirectories so they never
//! touch the stores of an installed release binary.
//!
//! ## Production Behavior
//!
//! Follows the XDG Base Directory Specification:
//! - Prefers `$XDG_CONFIG_HOME` for config, fallback to `$HOME/.config`
//! - Prefers `$XDG_DATA_HOME` for data, fallback to `$HOME/.local/share`
//!
//! ## Testing Behavior
//!
//! Tests can redirect every path under a temporary directory:
//! ```ignore
//! let temp_dir = tempfile::TempDir::new().unwrap();
//! let _guard = TestPathGuard::new(temp_dir.path());
//! assert_eq!(config_file().unwrap(), temp_dir.path().join("config.toml"));
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Returns "staplay-dev" for dev builds, "staplay" for release builds.
fn app_dir_name() -> &'static str {
    if cfg!(dev_build) {
        "staplay-dev"
    } else {
        "staplay"
    }
}

/// Categories of application paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Config file: `~/.config/staplay/config.toml`
    Config,
    /// Data directory: `~/.local/share/staplay/`
    DataDir,
    /// Log directory: `~/.local/share/staplay/logs/`
    LogDir,
}

/// Path resolution strategy (thread-local).
#[derive(Debug, PartialEq)]
enum PathStrategy {
    Xdg,
    Override(PathBuf),
}

thread_local! {
    static PATH_STRATEGY: RefCell<PathStrategy> = const { RefCell::new(PathStrategy::Xdg) };
}

/// Resolve a path based on the current strategy.
///
/// Returns `None` when the path cannot be determined (e.g. `HOME` unset).
pub fn resolve(kind: PathKind) -> Option<PathBuf> {
    PATH_STRATEGY.with(|strategy| match *strategy.borrow() {
        PathStrategy::Xdg => resolve_xdg(kind),
        PathStrategy::Override(ref base) => Some(resolve_override(base, kind)),
    })
}

fn xdg_base(var: &str, fallback: &[&str]) -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os(var) {
        return Some(PathBuf::from(xdg));
    }
    std::env::var_os("HOME").map(|h| {
        let mut p = PathBuf::from(h);
        p.extend(fallback);
        p
    })
}

fn resolve_xdg(kind: PathKind) -> Option<PathBuf> {
    match kind {
        PathKind::Config => xdg_base("XDG_CONFIG_HOME", &[".config"])
            .map(|p| p.join(app_dir_name()).join("config.toml")),
        PathKind::DataDir => {
            xdg_base("XDG_DATA_HOME", &[".local", "share"]).map(|p| p.join(app_dir_name()))
        }
        PathKind::LogDir => xdg_base("XDG_DATA_HOME", &[".local", "share"])
            .map(|p| p.join(app_dir_name()).join("logs")),
    }
}

fn resolve_override(base: &Path, kind: PathKind) -> PathBuf {
    match kind {
        PathKind::Config => base.join("config.toml"),
        PathKind::DataDir => base.to_path_buf(),
        PathKind::LogDir => base.join("logs"),
    }
}

pub fn config_file() -> Option<PathBuf> {
    resolve(PathKind::Config)
}

pub fn data_directory() -> Option<PathBuf> {
    resolve(PathKind::DataDir)
}

pub fn log_directory() -> Option<PathBuf> {
    resolve(PathKind::LogDir)
}

/// Redirect every path of the current thread under `base`.
pub fn set_test_dir(base: impl Into<PathBuf>) {
    PATH_STRATEGY.with(|strategy| {
        *strategy.borrow_mut() = PathStrategy::Override(base.into());
    });
}

/// Reset path resolution back to XDG.
pub fn reset_to_xdg() {
    PATH_STRATEGY.with(|strategy| {
        *strategy.borrow_mut() = PathStrategy::Xdg;
    });
}

/// RAII guard for test path overrides. Resets to XDG on drop.
pub struct TestPathGuard;

impl TestPathGuard {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        set_test_dir(base_dir);
        TestPathGuard
    }
}

impl Drop for TestPathGuard {
    fn drop(&mut self) {
        reset_to_xdg();
    }
}
