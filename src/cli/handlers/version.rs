// src/cli/handlers/version.rs

use anyhow::Result;

/// Commit hash recorded at build time (`NECRO_COMMIT`, else `git rev-parse`, else `none`).
pub const COMMIT: &str = env!("NECRO_COMMIT_EFFECTIVE");

/// Build date recorded at build time (`NECRO_BUILD_DATE`, else `unknown`).
pub const BUILD_DATE: &str = env!("NECRO_BUILD_DATE_EFFECTIVE");

/// The one-line version banner.
pub fn version_line() -> String {
    format!(
        "necro {} (commit={}, date={})",
        env!("CARGO_PKG_VERSION"),
        COMMIT,
        BUILD_DATE
    )
}

/// Prints the version banner.
pub fn handle(_args: Vec<String>) -> Result<()> {
    println!("{}", version_line());
    Ok(())
}
