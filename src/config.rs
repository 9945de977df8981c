/*!
 * Configuration types for distrokit
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use distrokit_core_manifest::{Artifact, Module, ModuleType, ServerSelector};

use crate::core::checksum::HashAlgorithm;
use crate::error::{DistroError, Result};

/// Main configuration for manifest operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistroConfig {
    /// Distribution file to read
    #[serde(default = "default_base_manifest")]
    pub base_manifest: PathBuf,

    /// Where to write the result; `None` rewrites `base_manifest`
    #[serde(default)]
    pub output_manifest: Option<PathBuf>,

    /// Last-known-good copy used when the base cannot be read
    #[serde(default)]
    pub fallback_manifest: Option<PathBuf>,

    /// Manifest the loader module is copied from by `inject-loader`
    #[serde(default)]
    pub reference_manifest: Option<PathBuf>,

    /// Instance directory that content sources and artifact paths are relative to
    #[serde(default = "default_instance_root")]
    pub instance_root: PathBuf,

    /// Directories scanned by discovery
    #[serde(default = "default_content_sources")]
    pub content_sources: Vec<ContentSource>,

    /// Hashing threads (0 = one per CPU)
    #[serde(default)]
    pub workers: usize,

    /// Digest written to the artifact checksum field
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Prefix for artifact URLs; `None` writes absolute `file://` URLs
    #[serde(default)]
    pub base_url: Option<String>,

    /// Query string appended to every `base_url` URL (without the `?`)
    #[serde(default)]
    pub url_query: Option<String>,

    /// Server id or name to operate on; `None` selects the main server
    #[serde(default)]
    pub target_server: Option<String>,

    /// Also compare checksums (not only sizes) during `verify`
    #[serde(default)]
    pub verify_checksums: bool,

    /// Version metadata entry attached by `inject-version-manifest`
    #[serde(default)]
    pub version_manifest: Option<VersionManifestEntry>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (JSON lines); `None` logs to stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Verbose logging (overrides log_level to debug)
    #[serde(default)]
    pub verbose: bool,
}

/// One directory scanned for content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSource {
    /// Directory relative to the instance root
    pub dir: PathBuf,

    /// Accepted file extensions without the dot; empty accepts every file
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Exact file names to take; when set, `extensions` is ignored
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,

    /// Module type of discovered entries (`ForgeMod` or `File`)
    #[serde(default = "default_module_type")]
    pub module_type: ModuleType,

    /// Module id pattern; `{stem}`, `{file}` and `{path}` are substituted
    #[serde(default = "default_id_template")]
    pub id_template: String,

    /// Display name pattern, same placeholders as `id_template`
    #[serde(default = "default_name_template")]
    pub name_template: String,

    /// Whether discovered modules are required
    #[serde(default = "default_true")]
    pub required: bool,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Skip the source instead of failing when `dir` does not exist
    #[serde(default)]
    pub optional: bool,
}

/// Fixed data for a version metadata module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionManifestEntry {
    pub id: String,
    #[serde(default = "default_version_manifest_name")]
    pub name: String,
    pub size: u64,
    pub checksum: String,
    pub url: String,
}

impl VersionManifestEntry {
    /// Module node attached under the loader
    pub fn to_module(&self) -> Module {
        Module::new(self.id.clone(), self.name.clone(), ModuleType::VersionManifest)
            .with_artifact(Artifact::new(self.size, self.checksum.clone()).with_url(self.url.clone()))
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = DistroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(DistroError::Config(format!("unknown log level: {}", other))),
        }
    }
}

impl Default for DistroConfig {
    fn default() -> Self {
        Self {
            base_manifest: default_base_manifest(),
            output_manifest: None,
            fallback_manifest: None,
            reference_manifest: None,
            instance_root: default_instance_root(),
            content_sources: default_content_sources(),
            workers: 0,
            hash_algorithm: HashAlgorithm::default(),
            base_url: None,
            url_query: None,
            target_server: None,
            verify_checksums: false,
            version_manifest: None,
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
        }
    }
}

impl ContentSource {
    /// Source of required content mods in `dir`
    pub fn mods<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            extensions: default_extensions(),
            names: Vec::new(),
            module_type: default_module_type(),
            id_template: default_id_template(),
            name_template: default_name_template(),
            required: true,
            recursive: false,
            optional: false,
        }
    }

    /// Source of static files in `dir`, ids keyed by relative path
    pub fn files<P: Into<PathBuf>>(dir: P, extensions: &[&str]) -> Self {
        Self {
            dir: dir.into(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            names: Vec::new(),
            module_type: ModuleType::File,
            id_template: "file:{path}".to_string(),
            name_template: default_name_template(),
            required: true,
            recursive: true,
            optional: true,
        }
    }

    /// Named files directly in the instance root, such as `options.txt`
    pub fn root_files(names: &[&str]) -> Self {
        Self {
            extensions: Vec::new(),
            names: names.iter().map(|n| n.to_string()).collect(),
            recursive: false,
            ..Self::files(".", &[])
        }
    }

    /// True if `file_name` is listed in `names`, or has an accepted extension
    pub fn accepts(&self, file_name: &str) -> bool {
        if !self.names.is_empty() {
            return self.names.iter().any(|n| n == file_name);
        }
        if self.extensions.is_empty() {
            return true;
        }
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_base_manifest() -> PathBuf {
    PathBuf::from("distribution.json")
}

fn default_instance_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_content_sources() -> Vec<ContentSource> {
    vec![ContentSource::mods("mods")]
}

fn default_extensions() -> Vec<String> {
    vec!["jar".to_string()]
}

fn default_module_type() -> ModuleType {
    ModuleType::ContentMod
}

fn default_id_template() -> String {
    "mod:local:{stem}:1.0".to_string()
}

fn default_name_template() -> String {
    "{file}".to_string()
}

fn default_version_manifest_name() -> String {
    "version.json".to_string()
}

impl DistroConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DistroError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: DistroConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject settings discovery cannot work with
    pub fn validate(&self) -> Result<()> {
        for source in &self.content_sources {
            if !matches!(source.module_type, ModuleType::ContentMod | ModuleType::File) {
                return Err(DistroError::Config(format!(
                    "content source {} has module_type {}, only ForgeMod and File can be discovered",
                    source.dir.display(),
                    source.module_type
                )));
            }
            if source.id_template.trim().is_empty() {
                return Err(DistroError::Config(format!(
                    "content source {} has an empty id_template",
                    source.dir.display()
                )));
            }
        }
        if self.url_query.is_some() && self.base_url.is_none() {
            return Err(DistroError::Config(
                "url_query is set but base_url is not".to_string(),
            ));
        }
        Ok(())
    }

    /// Output path: explicit output, else the base manifest itself
    pub fn output_path(&self) -> &Path {
        self.output_manifest
            .as_deref()
            .unwrap_or(&self.base_manifest)
    }

    /// Server targeted by single-server operations
    pub fn server_selector(&self) -> ServerSelector {
        match &self.target_server {
            Some(name) => ServerSelector::Named(name.clone()),
            None => ServerSelector::Primary,
        }
    }

    /// Worker count with `0` resolved to the CPU count
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            get_cpu_count()
        } else {
            self.workers
        }
    }
}

/// Get the number of available CPU cores
fn get_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
