/*!
 * Filesystem-facing operations: hashing, content discovery and artifact verification
 */

pub mod checksum;
pub mod discovery;
pub mod integrity;

pub use checksum::{compute_digest, FileDigest, HashAlgorithm};
pub use discovery::{discover, discover_with_progress, Discovery, DiscoveryReport};
pub use integrity::{verify_artifacts, IntegrityFailure, IntegrityProblem, IntegrityReport};
