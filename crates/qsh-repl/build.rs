//! Stamps the qsh binary with the commit it was built from.
//!
//! `QSH_GIT_HASH` and `QSH_BUILD_DATE` feed `version_string()` in main.rs,
//! which the kernel receives through `KernelConfig::with_shell_version`. That
//! string is what `\VERSION` and `qsh --version` print.

use std::process::Command;

fn main() {
    // .git is absent in packaged crate builds
    if std::path::Path::new("../../.git").exists() {
        println!("cargo::rerun-if-changed=../../.git/HEAD");
        println!("cargo::rerun-if-changed=../../.git/refs/heads/");
    }

    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();

    println!("cargo:rustc-env=QSH_GIT_HASH={git_hash}");
    println!("cargo:rustc-env=QSH_BUILD_DATE={build_date}");
}
