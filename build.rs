// build.rs

use std::env;
use std::process::Command;

fn main() {
    // --- 1. Determine the commit using a prioritized approach ---
    // Priority 1: an explicit NECRO_COMMIT (set by release pipelines).
    // Priority 2: ask git. Priority 3: "none".
    let commit = env::var("NECRO_COMMIT")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .or_else(|| {
            Command::new("git")
                .args(["rev-parse", "--short", "HEAD"])
                .output()
                .ok()
                .filter(|out| out.status.success())
                .and_then(|out| String::from_utf8(out.stdout).ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "none".to_string());

    // --- 2. Build date is only known when the pipeline provides it ---
    let date = env::var("NECRO_BUILD_DATE")
        .ok()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=NECRO_COMMIT_EFFECTIVE={}", commit);
    println!("cargo:rustc-env=NECRO_BUILD_DATE_EFFECTIVE={}", date);

    // --- 3. Inform Cargo about rerun triggers ---
    println!("cargo:rerun-if-env-changed=NECRO_COMMIT");
    println!("cargo:rerun-if-env-changed=NECRO_BUILD_DATE");
    println!("cargo:rerun-if-changed=build.rs");
}
