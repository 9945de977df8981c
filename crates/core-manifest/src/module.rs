//! Module nodes
//!
//! A module is one manifest entry describing an installable unit. Loader
//! modules carry nested modules (their version metadata) in `subModules`.

use crate::artifact::Artifact;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kind of installable unit
///
/// Serialized with the launcher's wire names; the Rust names are neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleType {
    /// Mod loader package hosted alongside the distribution
    #[serde(rename = "ForgeHosted")]
    LoaderHosted,
    /// Shared library on the runtime classpath
    Library,
    /// Static file copied into the instance
    File,
    /// Version metadata consumed by the loader
    VersionManifest,
    /// Content mod loaded after all structural modules
    #[serde(rename = "ForgeMod")]
    ContentMod,
}

/// Ordering group of a module type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Loader, libraries, files and version metadata
    Structural,
    /// Content mods
    Content,
}

impl ModuleType {
    /// All module types in wire order
    pub const ALL: [ModuleType; 5] = [
        ModuleType::LoaderHosted,
        ModuleType::Library,
        ModuleType::File,
        ModuleType::VersionManifest,
        ModuleType::ContentMod,
    ];

    /// Wire name used in distribution files
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::LoaderHosted => "ForgeHosted",
            ModuleType::Library => "Library",
            ModuleType::File => "File",
            ModuleType::VersionManifest => "VersionManifest",
            ModuleType::ContentMod => "ForgeMod",
        }
    }

    /// Ordering group this type belongs to
    pub fn precedence(&self) -> Precedence {
        match self {
            ModuleType::LoaderHosted
            | ModuleType::Library
            | ModuleType::File
            | ModuleType::VersionManifest => Precedence::Structural,
            ModuleType::ContentMod => Precedence::Content,
        }
    }

    /// True for types the base runtime needs before any content loads
    pub fn is_structural(&self) -> bool {
        self.precedence() == Precedence::Structural
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = Error;

    /// Accepts wire names and the neutral names, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forgehosted" | "loaderhosted" | "loader" => Ok(ModuleType::LoaderHosted),
            "library" => Ok(ModuleType::Library),
            "file" => Ok(ModuleType::File),
            "versionmanifest" => Ok(ModuleType::VersionManifest),
            "forgemod" | "contentmod" | "mod" => Ok(ModuleType::ContentMod),
            _ => Err(Error::UnknownModuleType(s.to_string())),
        }
    }
}

/// `required` object of a module
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Required {
    /// Whether the module must always be installed
    #[serde(default = "default_true")]
    pub value: bool,

    /// Default enablement for optional modules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<bool>,
}

impl Required {
    /// Required module
    pub fn yes() -> Self {
        Self {
            value: true,
            def: None,
        }
    }

    /// Optional module, enabled by default
    pub fn optional() -> Self {
        Self {
            value: false,
            def: Some(true),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Dedup and match key of a module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey {
    pub module_type: ModuleType,
    pub id: String,
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module_type, self.id)
    }
}

/// One manifest entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Module {
    /// Identifier, unique per type within a server
    pub id: String,

    /// Display label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Module kind
    #[serde(rename = "type")]
    pub module_type: ModuleType,

    /// Requirement flag; absent means required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,

    /// Downloadable content, absent for purely structural entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,

    /// Nested modules (loader version metadata)
    #[serde(
        rename = "subModules",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sub_modules: Vec<Module>,

    /// Fields this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Module {
    /// Create a module with no artifact and default requirement
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, module_type: ModuleType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            module_type,
            required: None,
            artifact: None,
            sub_modules: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach an artifact
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifact = Some(artifact);
        self
    }

    /// Set the requirement flag
    pub fn with_required(mut self, required: Required) -> Self {
        self.required = Some(required);
        self
    }

    /// Append a nested module
    pub fn with_sub_module(mut self, module: Module) -> Self {
        self.sub_modules.push(module);
        self
    }

    /// Dedup key `(type, id)`
    pub fn key(&self) -> ModuleKey {
        ModuleKey {
            module_type: self.module_type,
            id: self.id.clone(),
        }
    }

    /// True if this module shares `other`'s key
    pub fn same_key(&self, other: &Module) -> bool {
        self.module_type == other.module_type && self.id == other.id
    }

    /// Effective requirement; absent `required` means required
    pub fn is_required(&self) -> bool {
        self.required.map(|r| r.value).unwrap_or(true)
    }

    /// Ordering group of this module
    pub fn precedence(&self) -> Precedence {
        self.module_type.precedence()
    }

    /// True if a direct child of `module_type` exists
    pub fn has_sub_module_of_type(&self, module_type: ModuleType) -> bool {
        self.sub_modules
            .iter()
            .any(|m| m.module_type == module_type)
    }

    /// Depth-first iterator over this module and all nested modules
    pub fn walk(&self) -> Vec<&Module> {
        let mut out = vec![self];
        for child in &self.sub_modules {
            out.extend(child.walk());
        }
        out
    }
}

/// Check that a module id can serve as a stable key
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::InvalidModuleId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_names() {
        for module_type in ModuleType::ALL {
            let json = serde_json::to_value(module_type).unwrap();
            assert_eq!(json, Value::from(module_type.as_str()));
            let back: ModuleType = serde_json::from_value(json).unwrap();
            assert_eq!(back, module_type);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let raw = r#"{"id":"x","name":"x","type":"FabricMod"}"#;
        assert!(serde_json::from_str::<Module>(raw).is_err());
    }

    #[test]
    fn test_from_str_accepts_both_names() {
        assert_eq!("ForgeHosted".parse::<ModuleType>().unwrap(), ModuleType::LoaderHosted);
        assert_eq!("loaderhosted".parse::<ModuleType>().unwrap(), ModuleType::LoaderHosted);
        assert_eq!("contentmod".parse::<ModuleType>().unwrap(), ModuleType::ContentMod);
        assert!("shader".parse::<ModuleType>().is_err());
    }

    #[test]
    fn test_precedence() {
        assert!(ModuleType::LoaderHosted.is_structural());
        assert!(ModuleType::Library.is_structural());
        assert!(ModuleType::File.is_structural());
        assert!(ModuleType::VersionManifest.is_structural());
        assert!(!ModuleType::ContentMod.is_structural());
        assert!(Precedence::Structural < Precedence::Content);
    }

    #[test]
    fn test_required_defaults() {
        let module: Module =
            serde_json::from_str(r#"{"id":"a","name":"a","type":"Library"}"#).unwrap();
        assert!(module.required.is_none());
        assert!(module.is_required());

        let module: Module = serde_json::from_str(
            r#"{"id":"a","name":"a","type":"ForgeMod","required":{"value":false}}"#,
        )
        .unwrap();
        assert!(!module.is_required());

        let module: Module =
            serde_json::from_str(r#"{"id":"a","type":"ForgeMod","required":{}}"#).unwrap();
        assert!(module.is_required());
    }

    #[test]
    fn test_sub_modules_wire_name() {
        let loader = Module::new("net.loader:loader:1.0", "Loader", ModuleType::LoaderHosted)
            .with_sub_module(Module::new("1.0-loader", "version.json", ModuleType::VersionManifest));
        let json = serde_json::to_value(&loader).unwrap();
        assert_eq!(json["subModules"][0]["type"], "VersionManifest");
        assert!(loader.has_sub_module_of_type(ModuleType::VersionManifest));

        let bare = Module::new("lib", "lib", ModuleType::Library);
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("subModules").is_none());
        assert!(json.get("required").is_none());
    }

    #[test]
    fn test_key_and_same_key() {
        let a = Module::new("mod:x", "x", ModuleType::ContentMod);
        let b = Module::new("mod:x", "other name", ModuleType::ContentMod);
        let c = Module::new("mod:x", "x", ModuleType::File);
        assert!(a.same_key(&b));
        assert!(!a.same_key(&c));
        assert_eq!(a.key().to_string(), "ForgeMod:mod:x");
    }

    #[test]
    fn test_walk_includes_nested() {
        let tree = Module::new("root", "root", ModuleType::LoaderHosted).with_sub_module(
            Module::new("child", "child", ModuleType::Library)
                .with_sub_module(Module::new("leaf", "leaf", ModuleType::File)),
        );
        let ids: Vec<&str> = tree.walk().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "child", "leaf"]);
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("mod:local:jei:1.0").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("has space").is_err());
        assert!(validate_id("tab\there").is_err());
    }
}
