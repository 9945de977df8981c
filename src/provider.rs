/*!
 * Manifest providers: where a base distribution comes from
 */

use std::path::{Path, PathBuf};

use distrokit_core_manifest::{persist, Distribution};

use crate::error::{DistroError, Result};

/// Supplies the current distribution, falling back to a known-good copy
pub trait ManifestProvider {
    /// Reload from the primary source, or from the fallback if that fails
    fn refresh_or_fallback(&mut self) -> Result<Distribution>;

    /// Last distribution successfully loaded
    fn current(&self) -> Option<&Distribution>;
}

/// Where the last successful load came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Primary,
    Fallback,
}

/// Provider reading distribution files from disk
#[derive(Debug)]
pub struct FileManifestProvider {
    primary: PathBuf,
    fallback: Option<PathBuf>,
    current: Option<Distribution>,
    origin: Option<LoadOrigin>,
}

impl FileManifestProvider {
    pub fn new<P: Into<PathBuf>>(primary: P) -> Self {
        Self {
            primary: primary.into(),
            fallback: None,
            current: None,
            origin: None,
        }
    }

    /// Use `fallback` when the primary file is missing or invalid
    pub fn with_fallback<P: Into<PathBuf>>(mut self, fallback: P) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn primary(&self) -> &Path {
        &self.primary
    }

    /// Origin of the current distribution
    pub fn origin(&self) -> Option<LoadOrigin> {
        self.origin
    }

    fn accept(&mut self, distribution: Distribution, origin: LoadOrigin) -> Distribution {
        self.current = Some(distribution.clone());
        self.origin = Some(origin);
        distribution
    }
}

impl ManifestProvider for FileManifestProvider {
    fn refresh_or_fallback(&mut self) -> Result<Distribution> {
        let primary_err = match persist::load_populated(&self.primary) {
            Ok(dist) => return Ok(self.accept(dist, LoadOrigin::Primary)),
            Err(e) => DistroError::from(e),
        };

        let Some(fallback) = self.fallback.clone() else {
            return Err(primary_err);
        };

        tracing::warn!(
            primary = %self.primary.display(),
            fallback = %fallback.display(),
            "primary manifest unusable ({}), trying fallback",
            primary_err
        );

        match persist::load_populated(&fallback) {
            Ok(dist) => Ok(self.accept(dist, LoadOrigin::Fallback)),
            Err(e) => {
                tracing::error!(fallback = %fallback.display(), "fallback manifest unusable: {}", e);
                Err(primary_err)
            }
        }
    }

    fn current(&self) -> Option<&Distribution> {
        self.current.as_ref()
    }
}
