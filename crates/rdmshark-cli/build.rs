//! Embeds the source revision into `rdmshark --version`.
//!
//! Lookup order for the commit: `RDMSHARK_GIT_SHA` (set by packagers building
//! from a tarball), `GITHUB_SHA` (CI), then the local git checkout. A checkout
//! with uncommitted tracked changes gets a `-dirty` suffix.

use std::env;
use std::path::Path;
use std::process::Command;

const UNKNOWN: &str = "unknown";

struct BuildInfo {
    commit_full: String,
    commit_short: String,
    date: String,
}

impl BuildInfo {
    fn collect() -> Self {
        let from_env = ["RDMSHARK_GIT_SHA", "GITHUB_SHA"]
            .iter()
            .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
            .map(|v| v.trim().to_string());

        let (commit_full, dirty) = match from_env {
            Some(sha) => (sha, false),
            None => match run_git(&["rev-parse", "HEAD"]) {
                Some(sha) => (sha, worktree_is_dirty()),
                None => (UNKNOWN.to_string(), false),
            },
        };

        let mut commit_short = if commit_full == UNKNOWN {
            UNKNOWN.to_string()
        } else {
            commit_full.chars().take(7).collect()
        };
        if dirty {
            commit_short.push_str("-dirty");
        }

        let date = run_git(&["log", "-1", "--format=%cI"])
            .or_else(source_date_epoch)
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            commit_full,
            commit_short,
            date,
        }
    }

    fn emit(&self) {
        println!("cargo:rustc-env=RDMSHARK_BUILD_COMMIT={}", self.commit_short);
        println!("cargo:rustc-env=RDMSHARK_BUILD_COMMIT_FULL={}", self.commit_full);
        println!("cargo:rustc-env=RDMSHARK_BUILD_DATE={}", self.date);
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RDMSHARK_GIT_SHA");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    let head = Path::new("../../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    BuildInfo::collect().emit();
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn worktree_is_dirty() -> bool {
    run_git(&["status", "--porcelain", "--untracked-files=no"]).is_some()
}

/// Reproducible-build timestamp, reported as raw unix seconds.
fn source_date_epoch() -> Option<String> {
    let secs: u64 = env::var("SOURCE_DATE_EPOCH").ok()?.trim().parse().ok()?;
    Some(format!("@{secs}"))
}
