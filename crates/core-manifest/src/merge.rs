//! Module merge engine
//!
//! Combines a base distribution with modules found by a discovery pass.
//! Every write leaves each targeted server with structural modules first and
//! content modules after them, and with at most one module per `(type, id)`.
//! Servers outside the selection keep their modules but are reordered the
//! same way if needed.

use crate::distribution::{Distribution, ServerSelector};
use crate::error::{Error, Result};
use crate::module::{validate_id, Module, ModuleKey, Precedence};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Result of a merge: the new distribution plus what happened to it
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub distribution: Distribution,
    pub report: MergeReport,
}

/// Counters collected while merging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Labels of the servers that received the merge
    pub servers: Vec<String>,
    /// Discovered modules appended as new entries
    pub added: usize,
    /// Discovered modules that replaced an existing entry in place
    pub replaced: usize,
    /// Duplicate `(type, id)` entries dropped from the base lists
    pub base_duplicates_removed: usize,
    /// Discovered modules skipped because their id cannot serve as a key
    pub rejected: Vec<RejectedModule>,
    /// Labels of unselected servers whose modules had to be reordered
    pub reordered: Vec<String>,
}

/// A discovered module the engine refused
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedModule {
    pub id: String,
    pub name: String,
    pub reason: String,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} replaced, {} duplicate(s) removed, {} rejected",
            self.added,
            self.replaced,
            self.base_duplicates_removed,
            self.rejected.len()
        )
    }
}

/// Per-list counters
#[derive(Debug, Default)]
struct ListStats {
    added: usize,
    replaced: usize,
    duplicates_removed: usize,
}

/// Merge `discovered` into every server of `base`
pub fn merge(base: &Distribution, discovered: Vec<Module>) -> Result<MergeOutcome> {
    merge_into(base, discovered, &ServerSelector::All)
}

/// Merge `discovered` into the servers matched by `selector`
///
/// Fails if `base` has no servers or the selector matches none. Modules with
/// an unusable id are skipped and listed in the report.
pub fn merge_into(
    base: &Distribution,
    discovered: Vec<Module>,
    selector: &ServerSelector,
) -> Result<MergeOutcome> {
    if base.servers.is_empty() {
        return Err(Error::validation(
            "base distribution has zero servers, nothing to merge into",
        ));
    }
    let targets = base.select(selector)?;

    let (accepted, rejected) = screen(discovered);
    let mut distribution = base.clone();
    let mut report = MergeReport {
        rejected,
        ..MergeReport::default()
    };

    for (idx, server) in distribution.servers.iter_mut().enumerate() {
        if !targets.contains(&idx) {
            if server.order_structural_first() {
                tracing::info!(server = server.label(), "reordered unselected server");
                report.reordered.push(server.label().to_string());
            }
            continue;
        }
        let stats = merge_modules(&mut server.modules, &accepted);
        tracing::debug!(
            server = server.label(),
            added = stats.added,
            replaced = stats.replaced,
            duplicates_removed = stats.duplicates_removed,
            "merged module list"
        );
        report.added += stats.added;
        report.replaced += stats.replaced;
        report.base_duplicates_removed += stats.duplicates_removed;
        report.servers.push(server.label().to_string());
    }

    Ok(MergeOutcome {
        distribution,
        report,
    })
}

/// Split discovered modules into usable ones and rejects
fn screen(discovered: Vec<Module>) -> (Vec<Module>, Vec<RejectedModule>) {
    let mut accepted = Vec::with_capacity(discovered.len());
    let mut rejected = Vec::new();

    for module in discovered {
        match validate_id(&module.id) {
            Ok(()) => accepted.push(module),
            Err(e) => {
                tracing::warn!(id = %module.id, name = %module.name, "skipping discovered module: {}", e);
                rejected.push(RejectedModule {
                    id: module.id,
                    name: module.name,
                    reason: e.to_string(),
                });
            }
        }
    }

    (accepted, rejected)
}

/// Merge into one module list in place
fn merge_modules(modules: &mut Vec<Module>, discovered: &[Module]) -> ListStats {
    let mut stats = ListStats::default();
    let mut structural: Vec<Module> = Vec::new();
    let mut content: Vec<Module> = Vec::new();
    let mut index: HashMap<ModuleKey, (Precedence, usize)> = HashMap::new();

    for module in std::mem::take(modules) {
        let key = module.key();
        if index.contains_key(&key) {
            tracing::debug!(key = %key, "dropping duplicate base module");
            stats.duplicates_removed += 1;
            continue;
        }
        let group = group_mut(&mut structural, &mut content, module.precedence());
        index.insert(key, (module.precedence(), group.len()));
        group.push(module);
    }

    let base_keys: HashSet<ModuleKey> = index.keys().cloned().collect();
    let mut replaced_keys: HashSet<ModuleKey> = HashSet::new();

    for module in discovered {
        let key = module.key();
        match index.get(&key) {
            Some(&(precedence, pos)) => {
                group_mut(&mut structural, &mut content, precedence)[pos] = module.clone();
                if base_keys.contains(&key) {
                    replaced_keys.insert(key);
                }
            }
            None => {
                let group = group_mut(&mut structural, &mut content, module.precedence());
                index.insert(key, (module.precedence(), group.len()));
                group.push(module.clone());
                stats.added += 1;
            }
        }
    }
    stats.replaced = replaced_keys.len();

    structural.append(&mut content);
    *modules = structural;
    stats
}

fn group_mut<'a>(
    structural: &'a mut Vec<Module>,
    content: &'a mut Vec<Module>,
    precedence: Precedence,
) -> &'a mut Vec<Module> {
    match precedence {
        Precedence::Structural => structural,
        Precedence::Content => content,
    }
}
