use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::extension::error::ExtensionError;
use crate::extension::verifier::ChecksumKind;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String)")]
pub struct CatalogEntry {
    pub url: String,
    pub checksum: String,
}

impl CatalogEntry {
    /// `None` when the checksum is neither an MD5 nor a SHA-256 hex digest.
    pub fn checksum_kind(&self) -> Option<ChecksumKind> {
        ChecksumKind::for_expected(&self.checksum)
    }
}

impl From<(String, String)> for CatalogEntry {
    fn from((url, checksum): (String, String)) -> Self {
        Self { url, checksum }
    }
}

/// Downloadable extensions keyed by identifier, in identifier order.
pub type Catalog = BTreeMap<String, CatalogEntry>;

/// Parses the manifest at `path`. Any defect rejects the whole manifest.
pub fn load_catalog(path: &Path) -> Result<Catalog, ExtensionError> {
    let unavailable = |reason: String| ExtensionError::CatalogUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let raw = fs::read_to_string(path).map_err(|err| unavailable(err.to_string()))?;
    let catalog: Catalog = serde_json::from_str(&raw).map_err(|err| unavailable(err.to_string()))?;

    for (id, entry) in &catalog {
        if entry.checksum_kind().is_none() {
            tracing::warn!("{id}: unsupported checksum {:?}, not downloadable", entry.checksum);
        }
    }

    tracing::info!(
        "loaded catalog {} ({} extensions)",
        path.display(),
        catalog.len()
    );
    Ok(catalog)
}
