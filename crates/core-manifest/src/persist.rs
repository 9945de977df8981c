//! Loading and saving distribution files
//!
//! Loads run the schema check before typed decoding, so a structurally
//! broken file is reported as a parse error naming the file. Saves write a
//! sibling temporary file and rename it over the target; a failed save
//! leaves the previous contents in place.

use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::validate::validate_distribution_document;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

/// Load a distribution from a JSON file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Distribution> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::manifest_not_found(path));
    }

    let contents = std::fs::read_to_string(path)?;
    parse_str(&contents, path)
}

/// Load a distribution and require at least one server
pub fn load_populated<P: AsRef<Path>>(path: P) -> Result<Distribution> {
    let path = path.as_ref();
    let distribution = load(path)?;
    if distribution.servers.is_empty() {
        return Err(Error::parse(path, "distribution has zero servers"));
    }
    Ok(distribution)
}

/// Parse distribution text; `origin` only labels errors
pub fn parse_str(contents: &str, origin: &Path) -> Result<Distribution> {
    let document: Value = serde_json::from_str(contents)
        .map_err(|e| Error::parse(origin, format!("malformed JSON: {}", e)))?;

    validate_distribution_document(&document).map_err(|e| match e {
        Error::Validation { message } => Error::parse(origin, message),
        other => other,
    })?;

    serde_json::from_value(document).map_err(|e| Error::parse(origin, e.to_string()))
}

/// Render a distribution the way `save` writes it: two-space indent, trailing newline
pub fn to_pretty_json(distribution: &Distribution) -> Result<String> {
    let mut json = serde_json::to_string_pretty(distribution)?;
    json.push('\n');
    Ok(json)
}

/// Atomically replace `path` with the serialized distribution
pub fn save<P: AsRef<Path>>(distribution: &Distribution, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = to_pretty_json(distribution)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = json.len(), "saved distribution");
    Ok(())
}
