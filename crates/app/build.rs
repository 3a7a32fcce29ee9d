//! Bakes the values read by `common::build_info!` into the binary

use std::env;
use std::process::Command;

/// Set to pin the reported revision, e.g. from a release pipeline
const REVISION_OVERRIDE: &str = "POSTCRYPT_REVISION";

/// Trimmed first line of a command's stdout, if it ran and succeeded
fn first_line(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let line = stdout.lines().next()?.trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn revision() -> String {
    env::var(REVISION_OVERRIDE)
        .ok()
        .filter(|revision| !revision.is_empty())
        .or_else(|| first_line("git", &["describe", "--always", "--dirty", "--tags"]))
        .unwrap_or_else(|| "unknown".to_string())
}

fn rustc_version() -> String {
    // Cargo points RUSTC at the compiler building this crate
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    first_line(&rustc, &["--version"]).unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-env-changed={REVISION_OVERRIDE}");

    let exports = [
        ("BUILD_REVISION", revision()),
        (
            "BUILD_PROFILE",
            env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()),
        ),
        ("BUILD_TIMESTAMP", chrono::Utc::now().to_rfc3339()),
        ("BUILD_RUSTC", rustc_version()),
    ];
    for (key, value) in exports {
        println!("cargo:rustc-env={key}={value}");
    }

    if let Ok(target) = env::var("TARGET") {
        println!("cargo:rustc-env=BUILD_TARGET={target}");
    }
}
