//! Core manifest data structures for distrokit
//!
//! This crate models the distribution file a game launcher consumes and the
//! operations that rewrite it: merging discovered content, patching specific
//! modules, validating, and persisting.
//!
//! # Key Concepts
//!
//! - **Distribution**: Top-level document holding an ordered list of servers
//! - **Module**: One installable unit; structural modules (loader, libraries,
//!   files, version metadata) always precede content mods
//! - **Module Key**: `(type, id)` pair; at most one module per key per server
//! - **Artifact**: Size, checksum and locator of a module's downloadable file
//!
//! # Example
//!
//! ```no_run
//! use distrokit_core_manifest::{merge, persist, Artifact, Module, ModuleType};
//!
//! let base = persist::load_populated("distribution.json")?;
//! let discovered = vec![Module::new("mod:local:jei:1.0", "jei.jar", ModuleType::ContentMod)
//!     .with_artifact(Artifact::new(1024, "5d41402abc4b2a76b9719d911017c592").with_path("mods/jei.jar"))];
//!
//! let outcome = merge(&base, discovered)?;
//! persist::save(&outcome.distribution, "distribution.json")?;
//! # Ok::<(), distrokit_core_manifest::Error>(())
//! ```

pub mod artifact;
pub mod distribution;
pub mod error;
pub mod merge;
pub mod module;
pub mod patch;
pub mod persist;
pub mod validate;

// Re-export main types for convenience
pub use artifact::{Artifact, Locator};
pub use distribution::{Distribution, Server, ServerSelector};
pub use error::{Error, Result};
pub use merge::{merge, merge_into, MergeOutcome, MergeReport, RejectedModule};
pub use module::{validate_id, Module, ModuleKey, ModuleType, Precedence, Required};
pub use patch::{
    append_submodule_if_absent, remove_by_predicate, upsert_by_predicate, ModuleSelector,
    Position,
};
pub use validate::{
    lint_distribution, validate_distribution, validate_distribution_document, LintIssue,
    LintKind,
};
