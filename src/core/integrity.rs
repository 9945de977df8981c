/*!
 * Integrity check of local artifacts against their recorded size and checksum
 */

use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use distrokit_core_manifest::{Distribution, Locator, Module, ModuleKey};

use super::checksum::{compute_digest, HashAlgorithm};
use crate::error::{DistroError, Result};

/// What is wrong with one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityProblem {
    Missing,
    SizeMismatch { expected: u64, actual: u64 },
    ChecksumMismatch { expected: String, actual: String },
    Unreadable(String),
}

/// One failed artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityFailure {
    pub module: ModuleKey,
    pub path: PathBuf,
    pub problem: IntegrityProblem,
}

impl fmt::Display for IntegrityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): ", self.module, self.path.display())?;
        match &self.problem {
            IntegrityProblem::Missing => write!(f, "file missing"),
            IntegrityProblem::SizeMismatch { expected, actual } => {
                write!(f, "size {} recorded, {} on disk", expected, actual)
            }
            IntegrityProblem::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum {} recorded, {} on disk", expected, actual)
            }
            IntegrityProblem::Unreadable(e) => write!(f, "unreadable: {}", e),
        }
    }
}

/// Outcome of [`verify_artifacts`]
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    /// Local artifacts examined
    pub checked: usize,
    /// Artifacts with only a remote URL
    pub remote: usize,
    pub failures: Vec<IntegrityFailure>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct LocalArtifact<'a> {
    module: &'a Module,
    path: PathBuf,
}

/// Check every local artifact of the selected servers
///
/// Sizes are always compared. Checksums are compared when `algorithm` is
/// given and the recorded checksum has that algorithm's length; placeholder
/// checksums are never compared.
pub fn verify_artifacts(
    distribution: &Distribution,
    servers: &[usize],
    root: &Path,
    algorithm: Option<HashAlgorithm>,
    workers: usize,
) -> Result<IntegrityReport> {
    let mut report = IntegrityReport::default();
    let mut local = Vec::new();

    for &idx in servers {
        for top in &distribution.servers[idx].modules {
            for module in top.walk() {
                let Some(artifact) = &module.artifact else {
                    continue;
                };
                match artifact.locator() {
                    Some(Locator::Local(path)) => local.push(LocalArtifact {
                        module,
                        path: root.join(path),
                    }),
                    Some(Locator::FileUrl(url)) => match file_url_path(url) {
                        Some(path) => local.push(LocalArtifact { module, path }),
                        None => report.failures.push(IntegrityFailure {
                            module: module.key(),
                            path: PathBuf::from(url),
                            problem: IntegrityProblem::Unreadable("malformed file URL".into()),
                        }),
                    },
                    Some(Locator::Remote(_)) | None => report.remote += 1,
                }
            }
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| DistroError::Other(format!("Failed to build hashing pool: {}", e)))?;

    let results: Vec<Option<IntegrityFailure>> =
        pool.install(|| local.par_iter().map(|a| check_one(a, algorithm)).collect());

    report.checked = local.len();
    report.failures.extend(results.into_iter().flatten());
    for failure in &report.failures {
        tracing::warn!("integrity failure: {}", failure);
    }
    Ok(report)
}

fn check_one(artifact: &LocalArtifact<'_>, algorithm: Option<HashAlgorithm>) -> Option<IntegrityFailure> {
    let fail = |problem| {
        Some(IntegrityFailure {
            module: artifact.module.key(),
            path: artifact.path.clone(),
            problem,
        })
    };
    // Present by construction
    let recorded = artifact.module.artifact.as_ref()?;

    let metadata = match std::fs::metadata(&artifact.path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return fail(IntegrityProblem::Missing)
        }
        Err(e) => return fail(IntegrityProblem::Unreadable(e.to_string())),
    };
    if metadata.len() != recorded.size {
        return fail(IntegrityProblem::SizeMismatch {
            expected: recorded.size,
            actual: metadata.len(),
        });
    }

    let algorithm = algorithm?;
    if recorded.has_sentinel_checksum() || recorded.checksum.len() != algorithm.hex_len() {
        tracing::debug!(
            module = %artifact.module.key(),
            "checksum not comparable with {}, size checked only",
            algorithm
        );
        return None;
    }

    match compute_digest(&artifact.path, algorithm) {
        Ok(digest) if digest.checksum.eq_ignore_ascii_case(&recorded.checksum) => None,
        Ok(digest) => fail(IntegrityProblem::ChecksumMismatch {
            expected: recorded.checksum.clone(),
            actual: digest.checksum,
        }),
        Err(e) => fail(IntegrityProblem::Unreadable(e.to_string())),
    }
}

fn file_url_path(url: &str) -> Option<PathBuf> {
    url::Url::parse(url).ok()?.to_file_path().ok()
}
