//! Predicate-driven patch operations on a module list
//!
//! Each operation can be applied any number of times with the same result,
//! so a patch can run against a manifest an earlier run already patched.
//! Insert positions are relative to the inserted module's precedence group,
//! which keeps structural modules ahead of content modules.

use crate::error::{Error, Result};
use crate::module::{Module, ModuleKey, ModuleType, Precedence};
use std::fmt;

/// Where `upsert_by_predicate` places the new module within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Head,
    Tail,
}

/// Declarative module predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSelector {
    /// Every module of a type
    Type(ModuleType),
    /// Every module with an id, whatever its type
    Id(String),
    /// The module with a `(type, id)` key
    Key(ModuleKey),
    /// Modules matching any of the inner selectors
    AnyOf(Vec<ModuleSelector>),
}

impl ModuleSelector {
    /// Whether `module` is selected
    pub fn matches(&self, module: &Module) -> bool {
        match self {
            ModuleSelector::Type(t) => module.module_type == *t,
            ModuleSelector::Id(id) => module.id == *id,
            ModuleSelector::Key(key) => module.module_type == key.module_type && module.id == key.id,
            ModuleSelector::AnyOf(selectors) => selectors.iter().any(|s| s.matches(module)),
        }
    }

    /// Borrowing closure form, for the predicate-taking operations
    pub fn predicate(&self) -> impl Fn(&Module) -> bool + '_ {
        move |m| self.matches(m)
    }
}

impl fmt::Display for ModuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSelector::Type(t) => write!(f, "type {}", t),
            ModuleSelector::Id(id) => write!(f, "id {}", id),
            ModuleSelector::Key(key) => write!(f, "key {}", key),
            ModuleSelector::AnyOf(selectors) => {
                let parts: Vec<String> = selectors.iter().map(|s| s.to_string()).collect();
                write!(f, "any of [{}]", parts.join(", "))
            }
        }
    }
}

/// Remove every module matching `predicate`, then insert `node` at `position`
///
/// `node` must itself satisfy `predicate`; otherwise a second run would keep
/// it and insert another copy. Returns the number of modules removed.
pub fn upsert_by_predicate<P>(
    modules: &mut Vec<Module>,
    predicate: P,
    node: Module,
    position: Position,
) -> Result<usize>
where
    P: Fn(&Module) -> bool,
{
    if !predicate(&node) {
        return Err(Error::validation(format!(
            "upsert of {} would not be idempotent: the new module does not match its own predicate",
            node.key()
        )));
    }

    let removed = remove_by_predicate(modules, &predicate);
    let idx = insertion_index(modules, node.precedence(), position);
    modules.insert(idx, node);
    Ok(removed)
}

/// Remove every module matching `predicate`; returns how many were removed
pub fn remove_by_predicate<P>(modules: &mut Vec<Module>, predicate: P) -> usize
where
    P: Fn(&Module) -> bool,
{
    let before = modules.len();
    modules.retain(|m| !predicate(m));
    before - modules.len()
}

/// Append a child of `child_type` under the first module matching `parent_predicate`
///
/// Nothing is appended if the parent already has a child of that type.
/// Returns `true` if a child was appended. Fails with `ModuleNotFound` if no
/// parent matches.
pub fn append_submodule_if_absent<P, F>(
    modules: &mut [Module],
    parent_predicate: P,
    child_type: ModuleType,
    factory: F,
) -> Result<bool>
where
    P: Fn(&Module) -> bool,
    F: FnOnce() -> Module,
{
    let parent = modules
        .iter_mut()
        .find(|m| parent_predicate(m))
        .ok_or_else(|| {
            Error::module_not_found(format!("no parent module to attach a {} to", child_type))
        })?;

    if parent.has_sub_module_of_type(child_type) {
        return Ok(false);
    }

    let child = factory();
    if child.module_type != child_type {
        return Err(Error::validation(format!(
            "factory built a {} module, expected {}",
            child.module_type, child_type
        )));
    }

    parent.sub_modules.push(child);
    Ok(true)
}

fn insertion_index(modules: &[Module], precedence: Precedence, position: Position) -> usize {
    let first_content = modules
        .iter()
        .position(|m| m.precedence() == Precedence::Content)
        .unwrap_or(modules.len());

    match (precedence, position) {
        (Precedence::Structural, Position::Head) => 0,
        (Precedence::Structural, Position::Tail) => first_content,
        (Precedence::Content, Position::Head) => first_content,
        (Precedence::Content, Position::Tail) => modules.len(),
    }
}
