/*!
 * End-to-end pipeline scenarios against a temporary instance directory
 *
 * Each test builds a small instance (base distribution plus a mods folder)
 * and drives the library operations the CLI uses.
 */

use distrokit::{
    config::{ContentSource, DistroConfig, VersionManifestEntry},
    error::DistroError,
    pipeline,
};
use distrokit_core_manifest::{
    persist, Artifact, Distribution, Module, ModuleType, Server, ServerSelector,
};
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FORGE_ID: &str = "net.minecraftforge:forge:1.20.1-47.3.0";

fn structural_modules() -> Vec<Module> {
    vec![
        Module::new(FORGE_ID, "Forge", ModuleType::LoaderHosted).with_artifact(
            Artifact::new(1200, "5d41402abc4b2a76b9719d911017c592")
                .with_url("https://maven.example.net/forge-47.3.0.jar"),
        ),
        Module::new("org.ow2.asm:asm:9.5", "ASM", ModuleType::Library).with_artifact(
            Artifact::new(800, "7d793037a0760186574b0282f2f435e7")
                .with_url("https://maven.example.net/asm-9.5.jar"),
        ),
    ]
}

/// Base distribution with two structural modules and a mods folder of three jars
fn instance() -> (TempDir, DistroConfig) {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("distribution.json");
    let dist = Distribution::new(vec![Server::new("Survival", "1.20.1")
        .with_id("survival")
        .as_main()
        .with_modules(structural_modules())]);
    persist::save(&dist, &base).unwrap();

    let mods = dir.path().join("mods");
    fs::create_dir(&mods).unwrap();
    fs::write(mods.join("alpha.jar"), b"abc").unwrap();
    fs::write(mods.join("beta.jar"), b"hello").unwrap();
    fs::write(mods.join("gamma.jar"), b"1234567").unwrap();
    fs::write(mods.join("notes.txt"), b"not a mod").unwrap();

    let config = DistroConfig {
        base_manifest: base,
        instance_root: dir.path().to_path_buf(),
        workers: 2,
        ..Default::default()
    };
    (dir, config)
}

fn regenerate(config: &DistroConfig) -> pipeline::RegenerateReport {
    pipeline::regenerate(config, &ProgressBar::hidden()).unwrap()
}

fn primary(path: &Path) -> Server {
    let dist = persist::load(path).unwrap();
    dist.server(&ServerSelector::Primary).unwrap().clone()
}

#[test]
fn test_fresh_regenerate_orders_structural_first() {
    let (_dir, config) = instance();

    let report = regenerate(&config);
    assert_eq!(report.discovery.files(), 3);
    assert_eq!(report.merge.added, 3);
    assert_eq!(report.module_count, 5);

    let server = primary(&config.base_manifest);
    let ids: Vec<&str> = server.modules.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            FORGE_ID,
            "org.ow2.asm:asm:9.5",
            "mod:local:alpha:1.0",
            "mod:local:beta:1.0",
            "mod:local:gamma:1.0",
        ]
    );
    assert!(server.is_ordered());
}

#[test]
fn test_discovered_artifacts_match_files() {
    let (_dir, config) = instance();
    regenerate(&config);

    let server = primary(&config.base_manifest);
    let beta = server
        .modules
        .iter()
        .find(|m| m.id == "mod:local:beta:1.0")
        .unwrap();
    let artifact = beta.artifact.as_ref().unwrap();
    assert_eq!(artifact.size, 5);
    assert_eq!(artifact.checksum, "5d41402abc4b2a76b9719d911017c592");
    assert_eq!(artifact.path.as_deref(), Some("mods/beta.jar"));
    assert!(artifact.url.as_deref().unwrap().starts_with("file://"));
    assert!(beta.is_required());

    let report = pipeline::verify(&config, &ServerSelector::All).unwrap();
    assert!(report.lint.is_empty());
    assert_eq!(report.integrity.checked, 3);
    assert_eq!(report.integrity.remote, 2);
    assert!(report.integrity.is_clean());
}

#[test]
fn test_rerun_is_byte_identical() {
    let (_dir, config) = instance();
    regenerate(&config);
    let first = fs::read(&config.base_manifest).unwrap();

    let report = regenerate(&config);
    assert_eq!(report.merge.added, 0);
    assert_eq!(report.merge.replaced, 3);
    assert_eq!(fs::read(&config.base_manifest).unwrap(), first);
}

#[test]
fn test_output_path_leaves_base_untouched() {
    let (dir, mut config) = instance();
    let before = fs::read(&config.base_manifest).unwrap();
    config.output_manifest = Some(dir.path().join("out").join("distribution.json"));
    fs::create_dir(dir.path().join("out")).unwrap();

    let report = regenerate(&config);
    assert_eq!(report.output, dir.path().join("out").join("distribution.json"));
    assert_eq!(fs::read(&config.base_manifest).unwrap(), before);
    assert_eq!(primary(&report.output).modules.len(), 5);
}

#[test]
fn test_base_url_rewrites_artifact_urls() {
    let (_dir, mut config) = instance();
    config.base_url = Some("https://cdn.example.net/pack/".to_string());
    config.url_query = Some("v=3".to_string());
    regenerate(&config);

    let server = primary(&config.base_manifest);
    let alpha = server
        .modules
        .iter()
        .find(|m| m.id == "mod:local:alpha:1.0")
        .unwrap();
    assert_eq!(
        alpha.artifact.as_ref().unwrap().url.as_deref(),
        Some("https://cdn.example.net/pack/mods/alpha.jar?v=3")
    );
}

#[test]
fn test_config_files_source_is_recursive_and_optional() {
    let (dir, mut config) = instance();
    config
        .content_sources
        .push(ContentSource::files("config", &["toml", "json"]));
    config
        .content_sources
        .push(ContentSource::files("shaderpacks", &["zip"]));

    let nested = dir.path().join("config").join("jei");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("jei-client.toml"), b"[ui]\n").unwrap();

    let report = regenerate(&config);
    assert_eq!(report.discovery.files(), 4);
    assert_eq!(report.discovery.skipped_sources.len(), 1);

    let server = primary(&config.base_manifest);
    let file = server
        .modules
        .iter()
        .find(|m| m.module_type == ModuleType::File)
        .unwrap();
    assert_eq!(
        file.artifact.as_ref().unwrap().path.as_deref(),
        Some("config/jei/jei-client.toml")
    );
    assert!(server.is_ordered());
}

#[test]
fn test_missing_mods_dir_is_fatal_and_writes_nothing() {
    let (dir, config) = instance();
    fs::remove_dir_all(dir.path().join("mods")).unwrap();
    let before = fs::read(&config.base_manifest).unwrap();

    let err = pipeline::regenerate(&config, &ProgressBar::hidden()).unwrap_err();
    assert!(matches!(err, DistroError::ContentDirNotFound(_)));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(fs::read(&config.base_manifest).unwrap(), before);
}

#[test]
fn test_fallback_base_used_when_primary_is_corrupt() {
    let (dir, mut config) = instance();
    let fallback = dir.path().join("distribution.last-good.json");
    fs::copy(&config.base_manifest, &fallback).unwrap();
    fs::write(&config.base_manifest, b"{ not json").unwrap();
    config.fallback_manifest = Some(fallback);

    let report = regenerate(&config);
    assert_eq!(report.module_count, 5);
    assert!(primary(&config.base_manifest).is_ordered());
}

#[test]
fn test_version_manifest_injected_once() {
    let (_dir, config) = instance();
    let entry = VersionManifestEntry {
        id: "1.20.1-forge-47.3.0".to_string(),
        name: "version.json".to_string(),
        size: 14401,
        checksum: "5f6cc71adb7eb5d7b6a0cd90c8804f71".to_string(),
        url: "https://maven.example.net/forge-47.3.0.json".to_string(),
    };

    assert!(pipeline::inject_version_manifest(&config, &entry).unwrap());
    assert!(!pipeline::inject_version_manifest(&config, &entry).unwrap());

    let server = primary(&config.base_manifest);
    let loader = &server.modules[0];
    assert_eq!(loader.id, FORGE_ID);
    assert_eq!(loader.sub_modules.len(), 1);
    assert_eq!(loader.sub_modules[0].module_type, ModuleType::VersionManifest);

    // discovery keeps nested modules of structural entries intact
    regenerate(&config);
    assert_eq!(primary(&config.base_manifest).modules[0].sub_modules.len(), 1);
}

#[test]
fn test_version_manifest_without_loader_leaves_file_unmodified() {
    let (_dir, config) = instance();
    let dist = Distribution::new(vec![Server::new("Survival", "1.20.1")
        .as_main()
        .with_modules(vec![Module::new("org.ow2.asm:asm:9.5", "ASM", ModuleType::Library)])]);
    persist::save(&dist, &config.base_manifest).unwrap();
    let before = fs::read(&config.base_manifest).unwrap();

    let entry = VersionManifestEntry {
        id: "1.20.1-forge-47.3.0".to_string(),
        name: "version.json".to_string(),
        size: 1,
        checksum: "5f6cc71adb7eb5d7b6a0cd90c8804f71".to_string(),
        url: "https://maven.example.net/forge.json".to_string(),
    };
    let err = pipeline::inject_version_manifest(&config, &entry).unwrap_err();
    assert!(matches!(err, DistroError::ModuleNotFound(_)));
    assert_eq!(fs::read(&config.base_manifest).unwrap(), before);
}

#[test]
fn test_verify_detects_changed_content() {
    let (dir, mut config) = instance();
    regenerate(&config);
    fs::write(dir.path().join("mods").join("alpha.jar"), b"abd").unwrap();
    fs::remove_file(dir.path().join("mods").join("gamma.jar")).unwrap();

    // same size: only a checksum comparison catches the edit
    let report = pipeline::verify(&config, &ServerSelector::Primary).unwrap();
    assert_eq!(report.integrity.failures.len(), 1);

    config.verify_checksums = true;
    let report = pipeline::verify(&config, &ServerSelector::Primary).unwrap();
    assert_eq!(report.integrity.failures.len(), 2);
    assert_eq!(report.into_result().unwrap_err().exit_code(), 3);
}

#[test]
fn test_spaced_jar_name_is_kept() {
    let (dir, config) = instance();
    fs::remove_file(dir.path().join("mods").join("beta.jar")).unwrap();
    fs::write(dir.path().join("mods").join("Just Enough Items.jar"), b"hello").unwrap();

    let report = regenerate(&config);
    assert!(report.merge.rejected.is_empty());
    assert_eq!(report.module_count, 5);

    let server = primary(&config.base_manifest);
    let jei = server
        .modules
        .iter()
        .find(|m| m.name == "Just Enough Items.jar")
        .unwrap();
    assert_eq!(jei.id, "mod:local:Just_Enough_Items:1.0");

    let report = pipeline::verify(&config, &ServerSelector::All).unwrap();
    assert!(report.lint.is_empty());
    assert!(report.integrity.is_clean());
}

#[test]
fn test_regenerate_leaves_every_server_ordered() {
    let (_dir, config) = instance();
    let dist = Distribution::new(vec![
        Server::new("Survival", "1.20.1")
            .with_id("survival")
            .as_main()
            .with_modules(structural_modules()),
        Server::new("Creative", "1.20.1").with_id("creative").with_modules(vec![
            Module::new("mod:remote:a:1.0", "a.jar", ModuleType::ContentMod),
            Module::new("org.ow2.asm:asm:9.5", "ASM", ModuleType::Library),
        ]),
    ]);
    persist::save(&dist, &config.base_manifest).unwrap();

    let report = regenerate(&config);
    assert_eq!(report.merge.servers, vec!["survival".to_string()]);
    assert_eq!(report.merge.reordered, vec!["creative".to_string()]);

    let saved = persist::load(&config.base_manifest).unwrap();
    assert!(saved.servers.iter().all(|s| s.is_ordered()));
    assert_eq!(saved.servers[0].modules.len(), 5);
    let creative: Vec<&str> = saved.servers[1].modules.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(creative, vec!["org.ow2.asm:asm:9.5", "mod:remote:a:1.0"]);

    let report = pipeline::verify(&config, &ServerSelector::All).unwrap();
    assert!(report.lint.is_empty());
}

#[test]
fn test_root_files_added_without_stray_files() {
    let (dir, mut config) = instance();
    fs::write(dir.path().join("options.txt"), b"fov:70\n").unwrap();
    fs::write(dir.path().join("minecraftinstance.json"), b"{}").unwrap();
    config
        .content_sources
        .push(ContentSource::root_files(&["minecraftinstance.json", "options.txt"]));

    let report = regenerate(&config);
    assert_eq!(report.discovery.files(), 5);

    let server = primary(&config.base_manifest);
    let files: Vec<&str> = server
        .modules
        .iter()
        .filter(|m| m.module_type == ModuleType::File)
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(files, vec!["file:minecraftinstance.json", "file:options.txt"]);
    assert!(server.modules.iter().all(|m| !m.id.contains("distribution")));
    assert!(server.is_ordered());
}
