//! Validation functions for distribution documents
//!
//! Two layers: a JSON Schema check of the raw document (run on every load,
//! before typed decoding) and a semantic lint of a decoded distribution
//! (ordering, duplicate keys, artifact shape).

use crate::distribution::{Distribution, Server};
use crate::error::{Error, Result};
use crate::module::{validate_id, Module, ModuleKey};
use jsonschema::{ValidationError, Validator};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;

/// Validate a raw distribution document against its JSON Schema
pub fn validate_distribution_document(document: &Value) -> Result<()> {
    let schema = get_distribution_schema();
    let compiled = Validator::new(&schema)
        .map_err(|e| Error::validation(format!("Failed to compile schema: {}", e)))?;

    if let Err(errors) = compiled.validate(document) {
        let error_messages: Vec<String> = errors
            .map(|e| format_validation_error(&e))
            .collect();

        return Err(Error::validation(format!(
            "Distribution validation failed:\n  - {}",
            error_messages.join("\n  - ")
        )));
    }

    Ok(())
}

/// Format a validation error into a readable string
fn format_validation_error(error: &ValidationError) -> String {
    let pointer = error.instance_path.to_string();
    if pointer.is_empty() {
        format!("(root): {}", error)
    } else {
        format!("{}: {}", pointer, error)
    }
}

/// Get the distribution JSON Schema
fn get_distribution_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["servers"],
        "properties": {
            "version": { "type": "string" },
            "servers": {
                "type": "array",
                "items": { "$ref": "#/$defs/server" }
            }
        },
        "$defs": {
            "server": {
                "type": "object",
                "required": ["name", "minecraftVersion", "modules"],
                "properties": {
                    "id": { "type": "string" },
                    "name": { "type": "string" },
                    "minecraftVersion": { "type": "string" },
                    "mainServer": { "type": "boolean" },
                    "modules": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/module" }
                    }
                }
            },
            "module": {
                "type": "object",
                "required": ["id", "type"],
                "properties": {
                    "id": { "type": "string" },
                    "name": { "type": "string" },
                    "type": {
                        "type": "string",
                        "enum": ["ForgeHosted", "Library", "File", "VersionManifest", "ForgeMod"]
                    },
                    "required": {
                        "type": "object",
                        "properties": {
                            "value": { "type": "boolean" },
                            "def": { "type": "boolean" }
                        }
                    },
                    "artifact": { "$ref": "#/$defs/artifact" },
                    "subModules": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/module" }
                    }
                }
            },
            "artifact": {
                "type": "object",
                "required": ["size", "MD5"],
                "properties": {
                    "size": { "type": "integer", "minimum": 0 },
                    "MD5": { "type": "string" },
                    "path": { "type": "string" },
                    "url": { "type": "string" }
                },
                "anyOf": [
                    { "required": ["path"] },
                    { "required": ["url"] }
                ]
            }
        }
    })
}

/// Kind of problem found by [`lint_distribution`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintKind {
    /// A content module precedes a structural module
    ContentBeforeStructural,
    /// Another module with the same `(type, id)` appeared earlier
    DuplicateKey,
    /// The id cannot serve as a dedup key
    InvalidId(String),
    /// Artifact locator or checksum is malformed
    BadArtifact(String),
    /// Artifact checksum is the all-zero placeholder for an unreadable file
    SentinelChecksum,
}

/// One lint finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub server: String,
    pub module: ModuleKey,
    pub kind: LintKind,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match &self.kind {
            LintKind::ContentBeforeStructural => "content module precedes structural modules".to_string(),
            LintKind::DuplicateKey => "duplicate (type, id)".to_string(),
            LintKind::InvalidId(reason) => reason.clone(),
            LintKind::BadArtifact(reason) => reason.clone(),
            LintKind::SentinelChecksum => "placeholder checksum, file was unreadable when hashed".to_string(),
        };
        write!(f, "[{}] {}: {}", self.server, self.module, what)
    }
}

/// Report every semantic problem in `distribution`
pub fn lint_distribution(distribution: &Distribution) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    for server in &distribution.servers {
        lint_server(server, &mut issues);
    }
    issues
}

fn lint_server(server: &Server, issues: &mut Vec<LintIssue>) {
    let label = server.label().to_string();
    let issue = |module: &Module, kind: LintKind| LintIssue {
        server: label.clone(),
        module: module.key(),
        kind,
    };

    let mut seen: HashSet<ModuleKey> = HashSet::new();
    let mut content_seen = false;

    for module in &server.modules {
        if module.module_type.is_structural() && content_seen {
            issues.push(issue(module, LintKind::ContentBeforeStructural));
        }
        content_seen |= !module.module_type.is_structural();

        if !seen.insert(module.key()) {
            issues.push(issue(module, LintKind::DuplicateKey));
        }

        for nested in module.walk() {
            if let Err(e) = validate_id(&nested.id) {
                issues.push(issue(nested, LintKind::InvalidId(e.to_string())));
            }
            if let Some(artifact) = &nested.artifact {
                if let Err(e) = artifact.validate() {
                    issues.push(issue(nested, LintKind::BadArtifact(e.to_string())));
                } else if artifact.has_sentinel_checksum() {
                    issues.push(issue(nested, LintKind::SentinelChecksum));
                }
            }
        }
    }
}

/// Fail with a validation error listing every lint issue
pub fn validate_distribution(distribution: &Distribution) -> Result<()> {
    let issues = lint_distribution(distribution);
    if issues.is_empty() {
        return Ok(());
    }

    let lines: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
    Err(Error::validation(format!(
        "{} problem(s) found:\n  - {}",
        issues.len(),
        lines.join("\n  - ")
    )))
}
