//! Artifact descriptors
//!
//! An artifact pairs a content identity (checksum and size) with the place the
//! launcher retrieves it from: a path relative to the instance directory, a
//! download URL, or both.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Integrity and location metadata for one installable file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// Size of the content in bytes
    pub size: u64,

    /// Lowercase hex digest of the content
    #[serde(rename = "MD5")]
    pub checksum: String,

    /// Path relative to the instance directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Retrieval URL (`file://` or `https://`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Fields this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where an artifact can be fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    /// Relative on-disk path
    Local(&'a str),
    /// `file://` URL pointing at a local file
    FileUrl(&'a str),
    /// Remote URL
    Remote(&'a str),
}

impl Artifact {
    /// Create an artifact with no locator yet
    pub fn new<S: Into<String>>(size: u64, checksum: S) -> Self {
        Self {
            size,
            checksum: checksum.into(),
            path: None,
            url: None,
            extra: Map::new(),
        }
    }

    /// Set the relative on-disk path
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the retrieval URL
    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Preferred locator: the relative path wins over the URL
    pub fn locator(&self) -> Option<Locator<'_>> {
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            return Some(Locator::Local(path));
        }
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|url| {
                if url.starts_with("file:") {
                    Locator::FileUrl(url)
                } else {
                    Locator::Remote(url)
                }
            })
    }

    /// True when the checksum is the all-zero placeholder written for unreadable files
    pub fn has_sentinel_checksum(&self) -> bool {
        !self.checksum.is_empty() && self.checksum.bytes().all(|b| b == b'0')
    }

    /// Check locator presence and checksum shape
    pub fn validate(&self) -> Result<()> {
        if self.locator().is_none() {
            return Err(Error::validation(
                "artifact needs at least one of `path` or `url`",
            ));
        }

        if self.checksum.is_empty() {
            return Err(Error::validation("artifact checksum is empty"));
        }

        if !self.checksum.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::validation(format!(
                "artifact checksum is not hex: {}",
                self.checksum
            )));
        }

        if !matches!(self.checksum.len(), 32 | 40 | 64) {
            return Err(Error::validation(format!(
                "artifact checksum has unexpected length {}",
                self.checksum.len()
            )));
        }

        Ok(())
    }
}
