/*!
 * Content discovery: scan configured directories and describe every file as a module
 */

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;
use walkdir::WalkDir;

use distrokit_core_manifest::{Artifact, Module, Required};

use super::checksum::{compute_digest, FileDigest, HashAlgorithm};
use crate::config::{ContentSource, DistroConfig};
use crate::error::{DistroError, Result};

/// Modules found by a scan, in scan order
#[derive(Debug, Clone)]
pub struct Discovery {
    pub modules: Vec<Module>,
    pub report: DiscoveryReport,
}

/// Counters collected while scanning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// Files found per scanned directory
    pub per_source: Vec<(PathBuf, usize)>,
    /// Optional sources whose directory is absent
    pub skipped_sources: Vec<PathBuf>,
    /// Files that could not be read; their checksum is the all-zero sentinel
    pub unreadable: Vec<PathBuf>,
    /// Directory entries the walk could not enter; skipped
    pub unwalkable: Vec<PathBuf>,
    /// Sum of artifact sizes
    pub total_bytes: u64,
}

impl DiscoveryReport {
    /// Total number of files found
    pub fn files(&self) -> usize {
        self.per_source.iter().map(|(_, n)| n).sum()
    }
}

/// A file waiting to be hashed
#[derive(Debug, Clone)]
struct Candidate {
    abs_path: PathBuf,
    /// Path relative to the instance root, `/`-separated
    rel_path: String,
    file_name: String,
    stem: String,
    source: usize,
}

/// Scan every configured content source
pub fn discover(config: &DistroConfig) -> Result<Discovery> {
    discover_with_progress(config, &ProgressBar::hidden())
}

/// Scan every configured content source, ticking `progress` once per hashed file
pub fn discover_with_progress(config: &DistroConfig, progress: &ProgressBar) -> Result<Discovery> {
    let root = &config.instance_root;
    let mut report = DiscoveryReport::default();
    let mut candidates = Vec::new();
    let mut scanned_dirs = Vec::new();

    for (idx, source) in config.content_sources.iter().enumerate() {
        let dir = root.join(&source.dir);
        if !dir.is_dir() {
            if source.optional {
                tracing::info!(dir = %dir.display(), "optional content directory absent, skipping");
                report.skipped_sources.push(dir);
                continue;
            }
            return Err(DistroError::ContentDirNotFound(dir));
        }

        let found = scan_source(root, &dir, source, idx, &mut report.unwalkable);
        tracing::info!(dir = %dir.display(), files = found.len(), "scanned content directory");
        report.per_source.push((dir.clone(), found.len()));
        scanned_dirs.push(dir);
        candidates.extend(found);
    }

    if candidates.is_empty() {
        return Err(DistroError::NoContentFound(scanned_dirs));
    }

    progress.set_length(candidates.len() as u64);
    let digests = hash_candidates(
        &candidates,
        config.hash_algorithm,
        config.effective_workers(),
        progress,
    )?;
    progress.finish_and_clear();

    let mut modules = Vec::with_capacity(candidates.len());
    for (candidate, digest) in candidates.iter().zip(digests) {
        let digest = match digest {
            Some(d) => d,
            None => {
                report.unreadable.push(candidate.abs_path.clone());
                sentinel_digest(&candidate.abs_path, config.hash_algorithm)
            }
        };
        report.total_bytes += digest.size;

        let source = &config.content_sources[candidate.source];
        modules.push(build_module(config, source, candidate, digest)?);
    }

    Ok(Discovery { modules, report })
}

/// List accepted files under `dir` in sorted file-name order
fn scan_source(
    root: &Path,
    dir: &Path,
    source: &ContentSource,
    source_idx: usize,
    unwalkable: &mut Vec<PathBuf>,
) -> Vec<Candidate> {
    let max_depth = if source.recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                tracing::warn!(path = %path.display(), "skipping unreadable directory entry: {}", e);
                unwalkable.push(path);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !source.accepts(&file_name) {
            continue;
        }

        let abs_path = entry.path().to_path_buf();
        let rel_path = relative_slash_path(root, &abs_path);
        let stem = Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());

        found.push(Candidate {
            abs_path,
            rel_path,
            file_name,
            stem,
            source: source_idx,
        });
    }

    found
}

/// Hash all candidates on a bounded pool; output order matches input order
fn hash_candidates(
    candidates: &[Candidate],
    algorithm: HashAlgorithm,
    workers: usize,
    progress: &ProgressBar,
) -> Result<Vec<Option<FileDigest>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| DistroError::Other(format!("Failed to build hashing pool: {}", e)))?;

    Ok(pool.install(|| {
        candidates
            .par_iter()
            .map(|candidate| {
                let digest = match compute_digest(&candidate.abs_path, algorithm) {
                    Ok(d) => Some(d),
                    Err(e) => {
                        tracing::warn!(
                            path = %candidate.abs_path.display(),
                            "unreadable content file, recording placeholder checksum: {}",
                            e
                        );
                        None
                    }
                };
                progress.inc(1);
                digest
            })
            .collect()
    }))
}

fn sentinel_digest(path: &Path, algorithm: HashAlgorithm) -> FileDigest {
    FileDigest {
        size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
        checksum: algorithm.sentinel(),
    }
}

fn build_module(
    config: &DistroConfig,
    source: &ContentSource,
    candidate: &Candidate,
    digest: FileDigest,
) -> Result<Module> {
    let url = artifact_url(config, candidate)?;
    let artifact = Artifact::new(digest.size, digest.checksum)
        .with_path(candidate.rel_path.clone())
        .with_url(url);

    let required = Required {
        value: source.required,
        def: None,
    };

    Ok(Module::new(
        conforming_id(&render_template(&source.id_template, candidate)),
        render_template(&source.name_template, candidate),
        source.module_type,
    )
    .with_required(required)
    .with_artifact(artifact))
}

/// `base_url/<rel_path>[?query]`, or an absolute `file://` URL
fn artifact_url(config: &DistroConfig, candidate: &Candidate) -> Result<String> {
    if let Some(base) = &config.base_url {
        let mut url = format!("{}/{}", base.trim_end_matches('/'), candidate.rel_path);
        if let Some(query) = &config.url_query {
            url.push('?');
            url.push_str(query.trim_start_matches('?'));
        }
        return Ok(url);
    }

    let absolute = std::fs::canonicalize(&candidate.abs_path)
        .unwrap_or_else(|_| candidate.abs_path.clone());
    url::Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .map_err(|()| {
            DistroError::Other(format!(
                "cannot express {} as a file URL",
                absolute.display()
            ))
        })
}

fn render_template(template: &str, candidate: &Candidate) -> String {
    template
        .replace("{stem}", &candidate.stem)
        .replace("{file}", &candidate.file_name)
        .replace("{path}", &candidate.rel_path)
}

/// Replace characters a module id cannot carry (whitespace, control) with `_`
fn conforming_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect()
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
