//! Stamps the binary with its build version.
//!
//! `AGON_VERSION` is the package version, suffixed with the short commit
//! hash when built from a git checkout (`0.1.0+3f2a9c1`). It is shown by
//! `--version` and sent in the `User-Agent` header.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let package = env!("CARGO_PKG_VERSION");
    let version = match commit_hash() {
        Some(hash) => format!("{package}+{hash}"),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=AGON_VERSION={version}");
}

fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}
