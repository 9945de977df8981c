/*!
 * distrokit CLI - Command Line Interface
 */

use clap::{Parser, Subcommand, ValueEnum};
use distrokit::{
    cli_style::{
        self, format_bytes, format_duration, module_table, print_error, print_findings,
        print_info, print_success, section_header, stats_table, Theme,
    },
    config::{DistroConfig, LogLevel, VersionManifestEntry},
    core::{discover_with_progress, HashAlgorithm},
    error::{DistroError, Result, EXIT_SUCCESS},
    logging, pipeline,
    provider::FileManifestProvider,
};
use distrokit_core_manifest::{persist, ModuleSelector, ModuleType, Server, ServerSelector};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "distrokit")]
#[command(version, about = "Build, patch and verify launcher distribution manifests", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base distribution file (overrides base_manifest)
    #[arg(short = 'b', long, global = true, value_name = "FILE")]
    base: Option<PathBuf>,

    /// Output file (overrides output_manifest; default rewrites the base)
    #[arg(short = 'o', long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Server id or name to operate on (default: the main server)
    #[arg(short = 's', long, global = true)]
    server: Option<String>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write JSON logs to this file instead of the terminal
    #[arg(long, global = true, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Enable verbose logging (equivalent to --log-level=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover local content and merge it into the base distribution
    Generate {
        #[command(flatten)]
        scan: ScanArgs,

        /// Last-known-good distribution used when the base is unusable
        #[arg(long, value_name = "FILE")]
        fallback: Option<PathBuf>,
    },

    /// List what discovery would add, without writing anything
    Discover {
        #[command(flatten)]
        scan: ScanArgs,

        /// Print discovered modules as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy the loader module from a reference distribution to the head of the target server
    InjectLoader {
        /// Distribution holding the loader to copy
        #[arg(short, long, value_name = "FILE")]
        reference: Option<PathBuf>,

        /// Used when the reference is unusable
        #[arg(long, value_name = "FILE")]
        reference_fallback: Option<PathBuf>,
    },

    /// Attach version metadata under the loader module if it has none
    InjectVersionManifest {
        /// Module id (overrides [version_manifest].id)
        #[arg(long)]
        id: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Artifact size in bytes
        #[arg(long)]
        size: Option<u64>,

        /// Artifact checksum (hex)
        #[arg(long)]
        checksum: Option<String>,

        /// Artifact URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Remove modules by type or id from the target server
    Remove {
        /// Module type (ForgeHosted, Library, File, VersionManifest, ForgeMod)
        #[arg(long = "type", value_parser = parse_module_type)]
        types: Vec<ModuleType>,

        /// Module id
        #[arg(long = "id")]
        ids: Vec<String>,
    },

    /// Collapse duplicate modules and restore structural-first order
    Dedupe {
        /// Apply to every server instead of the target server
        #[arg(long)]
        all: bool,
    },

    /// Lint the distribution and check local artifacts
    Verify {
        /// Instance directory artifact paths are relative to
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Compare checksums as well as sizes
        #[arg(long)]
        checksums: bool,

        /// Check every server instead of the target server
        #[arg(long)]
        all: bool,
    },

    /// Show servers and modules of the distribution
    Info {
        /// Show every server instead of the target server
        #[arg(long)]
        all: bool,
    },

    /// Write a config file with default settings
    InitConfig {
        /// Destination of the config file
        #[arg(default_value = "distrokit.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Discovery settings shared by `generate` and `discover`
#[derive(clap::Args)]
struct ScanArgs {
    /// Instance directory content sources are relative to
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Hashing threads (0 = one per CPU)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Checksum algorithm
    #[arg(long = "hash", value_enum)]
    hash: Option<HashArg>,

    /// Prefix for artifact URLs instead of file:// URLs
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Query string appended to base-url URLs
    #[arg(long)]
    url_query: Option<String>,

    /// Hide the hashing progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum HashArg {
    Md5,
    Sha256,
    Blake3,
}

impl From<HashArg> for HashAlgorithm {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Md5 => HashAlgorithm::Md5,
            HashArg::Sha256 => HashAlgorithm::Sha256,
            HashArg::Blake3 => HashAlgorithm::Blake3,
        }
    }
}

fn parse_module_type(s: &str) -> std::result::Result<ModuleType, String> {
    s.parse::<ModuleType>().map_err(|e| e.to_string())
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            tracing::error!(category = %e.category(), "{}", e);
            print_error(&e.to_string(), e.remedy());
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => DistroConfig::from_file(path)?,
        None => DistroConfig::default(),
    };

    // Global CLI overrides
    if let Some(base) = cli.base.clone() {
        config.base_manifest = base;
    }
    if cli.output.is_some() {
        config.output_manifest = cli.output.clone();
    }
    if cli.server.is_some() {
        config.target_server = cli.server.clone();
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    if let Err(e) = logging::init_logging(&config) {
        cli_style::print_warning(&format!("Failed to initialize logging: {}", e));
    }

    handle_command(cli.command, config)
}

fn handle_command(command: Commands, mut config: DistroConfig) -> Result<()> {
    match command {
        Commands::Generate { scan, fallback } => {
            let show_progress = !scan.no_progress;
            apply_scan_args(&mut config, scan);
            if fallback.is_some() {
                config.fallback_manifest = fallback;
            }
            config.validate()?;

            let start = Instant::now();
            let progress = hashing_progress(show_progress);
            let report = pipeline::regenerate(&config, &progress)?;

            section_header("Generate");
            println!(
                "{}",
                stats_table(&[
                    ("Files discovered", report.discovery.files().to_string()),
                    ("Content size", format_bytes(report.discovery.total_bytes)),
                    ("Added", report.merge.added.to_string()),
                    ("Replaced", report.merge.replaced.to_string()),
                    (
                        "Duplicates removed",
                        report.merge.base_duplicates_removed.to_string()
                    ),
                    ("Rejected", report.merge.rejected.len().to_string()),
                    ("Unreadable", report.discovery.unreadable.len().to_string()),
                    ("Modules in output", report.module_count.to_string()),
                    ("Elapsed", format_duration(start.elapsed().as_secs_f64())),
                ])
            );
            for rejected in &report.merge.rejected {
                cli_style::print_warning(&format!(
                    "skipped {:?} ({}): {}",
                    rejected.id, rejected.name, rejected.reason
                ));
            }
            for path in &report.discovery.unreadable {
                cli_style::print_warning(&format!(
                    "unreadable, placeholder checksum written: {}",
                    path.display()
                ));
            }
            for path in &report.discovery.unwalkable {
                cli_style::print_warning(&format!("could not scan, skipped: {}", path.display()));
            }
            for label in &report.merge.reordered {
                print_info(&format!("server {} reordered structural-first", label));
            }
            print_success(&format!("Wrote {}", report.output.display()));
            Ok(())
        }

        Commands::Discover { scan, json } => {
            let show_progress = !scan.no_progress && !json;
            apply_scan_args(&mut config, scan);
            config.validate()?;

            let discovery = discover_with_progress(&config, &hashing_progress(show_progress))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&discovery.modules)?);
            } else {
                let preview = Server::new("discovered", "").with_modules(discovery.modules);
                println!("{}", module_table(&preview));
                print_info(&format!(
                    "{} file(s), {}",
                    discovery.report.files(),
                    format_bytes(discovery.report.total_bytes)
                ));
            }
            Ok(())
        }

        Commands::InjectLoader {
            reference,
            reference_fallback,
        } => {
            let reference_path = reference
                .or_else(|| config.reference_manifest.clone())
                .ok_or_else(|| {
                    DistroError::Config(
                        "no reference manifest: pass --reference or set reference_manifest"
                            .to_string(),
                    )
                })?;

            let mut provider = FileManifestProvider::new(reference_path);
            if let Some(fallback) = reference_fallback {
                provider = provider.with_fallback(fallback);
            }

            let injected = pipeline::inject_loader(&config, &mut provider)?;
            print_success(&format!(
                "Loader {} injected ({} replaced), wrote {}",
                injected.loader_id,
                injected.replaced,
                injected.output.display()
            ));
            Ok(())
        }

        Commands::InjectVersionManifest {
            id,
            name,
            size,
            checksum,
            url,
        } => {
            let entry = version_manifest_entry(&config, id, name, size, checksum, url)?;
            if pipeline::inject_version_manifest(&config, &entry)? {
                print_success(&format!("Version manifest {} attached", entry.id));
            } else {
                print_info("Loader already has a version manifest, nothing to add");
            }
            Ok(())
        }

        Commands::Remove { types, ids } => {
            let mut selectors: Vec<ModuleSelector> =
                types.into_iter().map(ModuleSelector::Type).collect();
            selectors.extend(ids.into_iter().map(ModuleSelector::Id));
            if selectors.is_empty() {
                return Err(DistroError::Validation(
                    "remove needs at least one --type or --id".to_string(),
                ));
            }

            let selector = if selectors.len() == 1 {
                selectors.remove(0)
            } else {
                ModuleSelector::AnyOf(selectors)
            };
            let removed = pipeline::remove_modules(&config, &selector)?;
            print_success(&format!("Removed {} module(s) matching {}", removed, selector));
            Ok(())
        }

        Commands::Dedupe { all } => {
            let servers = servers_for(&config, all);
            let report = pipeline::dedupe(&config, &servers)?;
            print_success(&format!(
                "{} duplicate(s) removed across {} server(s)",
                report.base_duplicates_removed,
                report.servers.len()
            ));
            Ok(())
        }

        Commands::Verify {
            root,
            checksums,
            all,
        } => {
            if let Some(root) = root {
                config.instance_root = root;
            }
            config.verify_checksums |= checksums;
            let servers = servers_for(&config, all);

            let report = pipeline::verify(&config, &servers)?;
            section_header("Verify");
            println!(
                "{}",
                stats_table(&[
                    ("Lint issues", report.lint.len().to_string()),
                    ("Local artifacts checked", report.integrity.checked.to_string()),
                    ("Remote artifacts", report.integrity.remote.to_string()),
                    ("Integrity failures", report.integrity.failures.len().to_string()),
                ])
            );
            print_findings(&report.lint);
            print_findings(&report.integrity.failures);

            report.into_result()?;
            print_success("Distribution is consistent");
            Ok(())
        }

        Commands::Info { all } => {
            let distribution = persist::load_populated(&config.base_manifest)?;
            let servers = servers_for(&config, all);

            for idx in distribution.select(&servers)? {
                let server = &distribution.servers[idx];
                section_header(&format!("Server {}", server.label()));

                let type_rows: Vec<(String, String)> = server
                    .type_counts()
                    .iter()
                    .map(|(t, n)| (format!("  {}", t), n.to_string()))
                    .collect();
                let order = if server.is_ordered() {
                    "structural first".to_string()
                } else {
                    Theme::warning("content before structural").to_string()
                };

                let mut rows = vec![
                    ("Name", server.name.clone()),
                    ("Game version", server.minecraft_version.clone()),
                    ("Main server", server.main_server.to_string()),
                    ("Modules", server.modules.len().to_string()),
                    ("Order", order),
                ];
                rows.extend(type_rows.iter().map(|(t, n)| (t.as_str(), n.clone())));

                println!("{}", stats_table(&rows));
                println!("{}", module_table(server));
            }
            Ok(())
        }

        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                return Err(DistroError::Config(format!(
                    "{} already exists, pass --force to overwrite",
                    path.display()
                )));
            }
            DistroConfig::default().to_file(&path)?;
            print_success(&format!("Wrote {}", path.display()));
            Ok(())
        }
    }
}

fn apply_scan_args(config: &mut DistroConfig, scan: ScanArgs) {
    if let Some(root) = scan.root {
        config.instance_root = root;
    }
    if let Some(workers) = scan.workers {
        config.workers = workers;
    }
    if let Some(hash) = scan.hash {
        config.hash_algorithm = hash.into();
    }
    if scan.base_url.is_some() {
        config.base_url = scan.base_url;
    }
    if scan.url_query.is_some() {
        config.url_query = scan.url_query;
    }
}

fn servers_for(config: &DistroConfig, all: bool) -> ServerSelector {
    if all {
        ServerSelector::All
    } else {
        config.server_selector()
    }
}

fn hashing_progress(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template("{spinner:.cyan} hashing {pos}/{len} {wide_bar:.cyan/blue}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(0).with_style(style)
}

/// Version metadata entry from CLI flags, falling back to the config file
fn version_manifest_entry(
    config: &DistroConfig,
    id: Option<String>,
    name: Option<String>,
    size: Option<u64>,
    checksum: Option<String>,
    url: Option<String>,
) -> Result<VersionManifestEntry> {
    let base = config.version_manifest.clone();
    let missing = |field: &str| {
        DistroError::Config(format!(
            "version manifest {} missing: pass --{} or set [version_manifest].{}",
            field,
            field,
            field
        ))
    };

    Ok(VersionManifestEntry {
        id: id
            .or_else(|| base.as_ref().map(|b| b.id.clone()))
            .ok_or_else(|| missing("id"))?,
        name: name
            .or_else(|| base.as_ref().map(|b| b.name.clone()))
            .unwrap_or_else(|| "version.json".to_string()),
        size: size
            .or_else(|| base.as_ref().map(|b| b.size))
            .ok_or_else(|| missing("size"))?,
        checksum: checksum
            .or_else(|| base.as_ref().map(|b| b.checksum.clone()))
            .ok_or_else(|| missing("checksum"))?,
        url: url
            .or_else(|| base.as_ref().map(|b| b.url.clone()))
            .ok_or_else(|| missing("url"))?,
    })
}
