//! Process-invariant version facts, memoized once per process.
use std::{process::Command, sync::OnceLock};

/// Version of this crate, reported in the server-info resource.
pub const EXTENSIONS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version reported when the integrator does not supply one.
pub const FALLBACK_PACKAGE_VERSION: &str = "0.0.0+dev";

static GIT_SHA: OnceLock<Option<String>> = OnceLock::new();

/// Short git revision of the working directory, or `None` outside a repository.
///
/// The external `git` process runs at most once per process.
pub fn git_sha() -> Option<&'static str> {
    GIT_SHA.get_or_init(read_git_sha).as_deref()
}

fn read_git_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8(output.stdout).ok()?;
    let sha = sha.trim();
    if sha.is_empty() {
        return None;
    }
    Some(sha.to_string())
}
