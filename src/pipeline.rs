/*!
 * Batch operations on a distribution file
 *
 * Each operation loads the configured base manifest, applies one
 * transformation and saves the result atomically to the configured output.
 * A failed precondition returns before anything is written.
 */

use std::path::PathBuf;

use indicatif::ProgressBar;

use distrokit_core_manifest::{
    append_submodule_if_absent, lint_distribution, merge_into, persist, remove_by_predicate,
    upsert_by_predicate, Distribution, LintIssue, MergeReport, Module, ModuleSelector, ModuleType,
    Position, ServerSelector,
};

use crate::config::{DistroConfig, VersionManifestEntry};
use crate::core::discovery::{discover_with_progress, DiscoveryReport};
use crate::core::integrity::{verify_artifacts, IntegrityReport};
use crate::error::{DistroError, Result};
use crate::provider::{FileManifestProvider, ManifestProvider};

/// Result of [`regenerate`]
#[derive(Debug, Clone)]
pub struct RegenerateReport {
    pub discovery: DiscoveryReport,
    pub merge: MergeReport,
    pub output: PathBuf,
    pub module_count: usize,
}

/// Result of [`inject_loader`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderInjection {
    pub loader_id: String,
    /// Loader modules replaced in the target server
    pub replaced: usize,
    pub output: PathBuf,
}

/// Result of [`verify`]
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub lint: Vec<LintIssue>,
    pub integrity: IntegrityReport,
}

impl VerifyReport {
    /// Map findings to an error carrying the right exit code
    pub fn into_result(self) -> Result<Self> {
        if !self.integrity.is_clean() {
            return Err(DistroError::IntegrityFailed {
                failures: self.integrity.failures.len(),
            });
        }
        if !self.lint.is_empty() {
            return Err(DistroError::LintFailed {
                issues: self.lint.len(),
            });
        }
        Ok(self)
    }
}

/// Load the base, discover local content, merge it into the target server, save
///
/// Running it again over unchanged inputs rewrites a byte-identical file.
pub fn regenerate(config: &DistroConfig, progress: &ProgressBar) -> Result<RegenerateReport> {
    let mut provider = base_provider(config);
    let base = provider.refresh_or_fallback()?;

    let discovery = discover_with_progress(config, progress)?;
    tracing::info!(
        files = discovery.report.files(),
        bytes = discovery.report.total_bytes,
        unreadable = discovery.report.unreadable.len(),
        "discovery complete"
    );

    let outcome = merge_into(&base, discovery.modules, &config.server_selector())?;
    tracing::info!("merge: {}", outcome.report);

    let output = save_output(config, &outcome.distribution)?;
    Ok(RegenerateReport {
        discovery: discovery.report,
        merge: outcome.report,
        output,
        module_count: outcome.distribution.module_count(),
    })
}

/// Copy the loader module from a reference manifest to the head of the target server
pub fn inject_loader(
    config: &DistroConfig,
    reference: &mut dyn ManifestProvider,
) -> Result<LoaderInjection> {
    let mut target = persist::load_populated(&config.base_manifest)?;
    let reference = reference.refresh_or_fallback()?;

    let loader = find_loader(&reference)?;
    let loader_id = loader.id.clone();

    let server = target.server_mut(&config.server_selector())?;
    let selector = ModuleSelector::Type(ModuleType::LoaderHosted);
    let replaced = upsert_by_predicate(&mut server.modules, selector.predicate(), loader, Position::Head)?;
    tracing::info!(loader = %loader_id, replaced, server = server.label(), "loader injected");

    let output = save_output(config, &target)?;
    Ok(LoaderInjection {
        loader_id,
        replaced,
        output,
    })
}

/// Attach version metadata under the target server's loader, if it has none
///
/// Returns `true` if the entry was added.
pub fn inject_version_manifest(config: &DistroConfig, entry: &VersionManifestEntry) -> Result<bool> {
    let mut target = persist::load_populated(&config.base_manifest)?;
    let server = target.server_mut(&config.server_selector())?;
    let label = server.label().to_string();

    let added = append_submodule_if_absent(
        &mut server.modules,
        ModuleSelector::Type(ModuleType::LoaderHosted).predicate(),
        ModuleType::VersionManifest,
        || entry.to_module(),
    )
    .map_err(|e| match e {
        distrokit_core_manifest::Error::ModuleNotFound { .. } => DistroError::ModuleNotFound(
            format!("server {} has no {} module", label, ModuleType::LoaderHosted),
        ),
        other => other.into(),
    })?;

    if added {
        tracing::info!(id = %entry.id, server = %label, "version manifest attached");
    } else {
        tracing::info!(server = %label, "loader already has a version manifest");
    }

    save_output(config, &target)?;
    Ok(added)
}

/// Remove matching modules from the target server; returns how many went
pub fn remove_modules(config: &DistroConfig, selector: &ModuleSelector) -> Result<usize> {
    let mut target = persist::load_populated(&config.base_manifest)?;
    let server = target.server_mut(&config.server_selector())?;
    let removed = remove_by_predicate(&mut server.modules, selector.predicate());
    tracing::info!(selector = %selector, removed, server = server.label(), "modules removed");

    save_output(config, &target)?;
    Ok(removed)
}

/// Collapse duplicate keys and restore structural-first order
pub fn dedupe(config: &DistroConfig, servers: &ServerSelector) -> Result<MergeReport> {
    let base = persist::load_populated(&config.base_manifest)?;
    let outcome = merge_into(&base, Vec::new(), servers)?;
    tracing::info!(removed = outcome.report.base_duplicates_removed, "dedupe complete");

    save_output(config, &outcome.distribution)?;
    Ok(outcome.report)
}

/// Lint the whole manifest and check local artifacts of the selected servers
pub fn verify(config: &DistroConfig, servers: &ServerSelector) -> Result<VerifyReport> {
    let distribution = persist::load_populated(&config.base_manifest)?;
    let lint = lint_distribution(&distribution);

    let indices = distribution.select(servers)?;
    let algorithm = config.verify_checksums.then_some(config.hash_algorithm);
    let integrity = verify_artifacts(
        &distribution,
        &indices,
        &config.instance_root,
        algorithm,
        config.effective_workers(),
    )?;

    tracing::info!(
        lint_issues = lint.len(),
        checked = integrity.checked,
        failures = integrity.failures.len(),
        "verify complete"
    );
    Ok(VerifyReport { lint, integrity })
}

fn base_provider(config: &DistroConfig) -> FileManifestProvider {
    let provider = FileManifestProvider::new(&config.base_manifest);
    match &config.fallback_manifest {
        Some(fallback) => provider.with_fallback(fallback),
        None => provider,
    }
}

/// First loader module of the reference's primary server
fn find_loader(reference: &Distribution) -> Result<Module> {
    let server = reference.server(&ServerSelector::Primary)?;
    server
        .modules
        .iter()
        .find(|m| m.module_type == ModuleType::LoaderHosted)
        .cloned()
        .ok_or_else(|| {
            DistroError::ModuleNotFound(format!(
                "reference manifest server {} has no {} module",
                server.label(),
                ModuleType::LoaderHosted
            ))
        })
}

fn save_output(config: &DistroConfig, distribution: &Distribution) -> Result<PathBuf> {
    let output = config.output_path().to_path_buf();
    persist::save(distribution, &output)?;
    tracing::debug!(path = %output.display(), "wrote distribution");
    Ok(output)
}
