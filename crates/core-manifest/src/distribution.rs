//! Distribution (manifest tree) data structures
//!
//! A distribution is the top-level document the launcher consumes: an ordered
//! list of servers, each with an ordered module list.

use crate::error::{Error, Result};
use crate::module::{Module, ModuleType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Distribution document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Distribution {
    /// Document version string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Server definitions, in launcher display order
    pub servers: Vec<Server>,

    /// Fields this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One server definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    /// Server identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Target runtime version
    #[serde(rename = "minecraftVersion", default)]
    pub minecraft_version: String,

    /// Whether the launcher selects this server by default
    #[serde(rename = "mainServer", default)]
    pub main_server: bool,

    /// Ordered module list; structural modules precede content
    #[serde(default)]
    pub modules: Vec<Module>,

    /// Fields this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which servers an operation targets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerSelector {
    /// The main server, or the first one if none is flagged
    #[default]
    Primary,
    /// Every server
    All,
    /// Server whose id or name equals the given string
    Named(String),
}

impl Distribution {
    /// Create a distribution with the given servers
    pub fn new(servers: Vec<Server>) -> Self {
        Self {
            version: None,
            servers,
            extra: Map::new(),
        }
    }

    /// Index of the main server, falling back to the first server
    pub fn primary_index(&self) -> Option<usize> {
        self.servers
            .iter()
            .position(|s| s.main_server)
            .or_else(|| (!self.servers.is_empty()).then_some(0))
    }

    /// Indices of the servers matched by `selector`
    pub fn select(&self, selector: &ServerSelector) -> Result<Vec<usize>> {
        if self.servers.is_empty() {
            return Err(Error::validation("distribution has no servers"));
        }

        let indices: Vec<usize> = match selector {
            ServerSelector::Primary => self.primary_index().into_iter().collect(),
            ServerSelector::All => (0..self.servers.len()).collect(),
            ServerSelector::Named(wanted) => self
                .servers
                .iter()
                .enumerate()
                .filter(|(_, s)| s.id.as_deref() == Some(wanted.as_str()) || s.name == *wanted)
                .map(|(i, _)| i)
                .collect(),
        };

        if indices.is_empty() {
            return Err(Error::validation(format!(
                "no server matches {:?}",
                selector
            )));
        }
        Ok(indices)
    }

    /// First server matched by `selector`
    pub fn server(&self, selector: &ServerSelector) -> Result<&Server> {
        let idx = self.select(selector)?[0];
        Ok(&self.servers[idx])
    }

    /// Mutable access to the first server matched by `selector`
    pub fn server_mut(&mut self, selector: &ServerSelector) -> Result<&mut Server> {
        let idx = self.select(selector)?[0];
        Ok(&mut self.servers[idx])
    }

    /// Total number of top-level modules across all servers
    pub fn module_count(&self) -> usize {
        self.servers.iter().map(|s| s.modules.len()).sum()
    }
}

impl Server {
    /// Create a server with an empty module list
    pub fn new<N: Into<String>, V: Into<String>>(name: N, minecraft_version: V) -> Self {
        Self {
            id: None,
            name: name.into(),
            minecraft_version: minecraft_version.into(),
            main_server: false,
            modules: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Set the server id
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Flag as main server
    pub fn as_main(mut self) -> Self {
        self.main_server = true;
        self
    }

    /// Replace the module list
    pub fn with_modules(mut self, modules: Vec<Module>) -> Self {
        self.modules = modules;
        self
    }

    /// Label used in diagnostics: id if present, otherwise name
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// Count of top-level modules per type
    pub fn type_counts(&self) -> BTreeMap<ModuleType, usize> {
        let mut counts = BTreeMap::new();
        for module in &self.modules {
            *counts.entry(module.module_type).or_insert(0) += 1;
        }
        counts
    }

    /// True if no content module precedes a structural module
    pub fn is_ordered(&self) -> bool {
        self.modules
            .windows(2)
            .all(|w| w[0].precedence() <= w[1].precedence())
    }

    /// Stable structural-first reorder; returns `true` if anything moved
    pub fn order_structural_first(&mut self) -> bool {
        if self.is_ordered() {
            return false;
        }
        self.modules.sort_by_key(|m| m.precedence());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Distribution {
        Distribution::new(vec![
            Server::new("Lobby", "1.20.1").with_id("lobby"),
            Server::new("Survival", "1.20.1").with_id("survival").as_main(),
        ])
    }

    #[test]
    fn test_primary_prefers_main_server() {
        let dist = sample();
        assert_eq!(dist.primary_index(), Some(1));

        let dist = Distribution::new(vec![Server::new("Only", "1.20.1")]);
        assert_eq!(dist.primary_index(), Some(0));
    }

    #[test]
    fn test_select_variants() {
        let dist = sample();
        assert_eq!(dist.select(&ServerSelector::Primary).unwrap(), vec![1]);
        assert_eq!(dist.select(&ServerSelector::All).unwrap(), vec![0, 1]);
        assert_eq!(
            dist.select(&ServerSelector::Named("lobby".into())).unwrap(),
            vec![0]
        );
        assert_eq!(
            dist.select(&ServerSelector::Named("Survival".into())).unwrap(),
            vec![1]
        );
        assert!(dist.select(&ServerSelector::Named("pvp".into())).is_err());
    }

    #[test]
    fn test_select_on_empty_distribution() {
        let dist = Distribution::new(Vec::new());
        let err = dist.select(&ServerSelector::Primary).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_server_wire_names_and_extras() {
        let raw = r#"{
            "version": "1.0.0",
            "rss": "https://example.net/feed",
            "servers": [{
                "id": "og",
                "name": "OG",
                "minecraftVersion": "1.20.1",
                "mainServer": true,
                "address": "play.example.net:25565",
                "modules": []
            }]
        }"#;
        let dist: Distribution = serde_json::from_str(raw).unwrap();
        assert_eq!(dist.version.as_deref(), Some("1.0.0"));
        assert_eq!(dist.extra["rss"], "https://example.net/feed");
        assert_eq!(dist.servers[0].minecraft_version, "1.20.1");
        assert!(dist.servers[0].main_server);
        assert_eq!(dist.servers[0].extra["address"], "play.example.net:25565");

        let json = serde_json::to_value(&dist).unwrap();
        assert_eq!(json["servers"][0]["address"], "play.example.net:25565");
        assert_eq!(json["servers"][0]["minecraftVersion"], "1.20.1");
    }

    #[test]
    fn test_ordering_check() {
        let ordered = Server::new("s", "1").with_modules(vec![
            Module::new("loader", "l", ModuleType::LoaderHosted),
            Module::new("lib", "l", ModuleType::Library),
            Module::new("mod", "m", ModuleType::ContentMod),
        ]);
        assert!(ordered.is_ordered());

        let unordered = Server::new("s", "1").with_modules(vec![
            Module::new("mod", "m", ModuleType::ContentMod),
            Module::new("lib", "l", ModuleType::Library),
        ]);
        assert!(!unordered.is_ordered());
    }

    #[test]
    fn test_order_structural_first_is_stable() {
        let mut server = Server::new("s", "1").with_modules(vec![
            Module::new("mod:b", "b", ModuleType::ContentMod),
            Module::new("lib", "l", ModuleType::Library),
            Module::new("mod:a", "a", ModuleType::ContentMod),
            Module::new("loader", "l", ModuleType::LoaderHosted),
        ]);
        assert!(server.order_structural_first());
        let ids: Vec<&str> = server.modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["lib", "loader", "mod:b", "mod:a"]);
        assert!(!server.order_structural_first());
    }

    #[test]
    fn test_type_counts() {
        let server = Server::new("s", "1").with_modules(vec![
            Module::new("a", "a", ModuleType::ContentMod),
            Module::new("b", "b", ModuleType::ContentMod),
            Module::new("c", "c", ModuleType::Library),
        ]);
        let counts = server.type_counts();
        assert_eq!(counts[&ModuleType::ContentMod], 2);
        assert_eq!(counts[&ModuleType::Library], 1);
        assert!(!counts.contains_key(&ModuleType::File));
    }
}
