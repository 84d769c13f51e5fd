//! Build script for radio-core
//!
//! Embeds build identification reported by `GET /health`:
//! - RADIO_GIT_HASH: short commit hash, or "unknown" outside a checkout
//! - RADIO_BUILD_TIMESTAMP: RFC 3339 UTC time of the build
//! - RADIO_BUILD_PROFILE: cargo profile (debug/release)

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=RADIO_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=RADIO_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:rustc-env=RADIO_BUILD_PROFILE={}", profile);

    // Only rerun when HEAD moves, not on every build
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
