use std::fs;
use std::path::Path;

use crate::extension::error::RemoveError;
use crate::extension::registry::InstalledExtension;

/// Deletes the extension's payload tree, then its registration tree.
///
/// A failure on the payload leaves everything in place. A failure on the
/// registration is reported with `partial` set; nothing is restored.
pub fn remove_extension(ext: &InstalledExtension) -> Result<(), RemoveError> {
    remove_tree(&ext.payload_path, false)?;
    remove_tree(&ext.registration_path, true)?;

    tracing::info!("removed extension {}", ext.name);
    Ok(())
}

fn remove_tree(path: &Path, partial: bool) -> Result<(), RemoveError> {
    fs::remove_dir_all(path).map_err(|source| {
        tracing::error!("failed to remove {}: {source}", path.display());
        RemoveError {
            path: path.to_path_buf(),
            partial,
            source,
        }
    })
}
