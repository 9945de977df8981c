/*!
 * distrokit - offline tooling for game launcher distribution manifests
 *
 * Builds a locally usable distribution file from a canonical one:
 * - Discovers local content and computes size and checksum for each file
 * - Merges discovered modules with structural modules kept first
 * - Injects loader modules and their version metadata idempotently
 * - Deduplicates by (type, id) and verifies local artifacts
 *
 * The manifest model and its pure transformations live in
 * `distrokit-core-manifest`; this crate adds the filesystem, configuration
 * and command-line layers.
 */

pub mod cli_style;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod provider;

// Re-export commonly used types
pub use config::{ContentSource, DistroConfig, LogLevel, VersionManifestEntry};
pub use core::{discover, HashAlgorithm};
pub use error::{DistroError, Result};
pub use provider::{FileManifestProvider, ManifestProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
