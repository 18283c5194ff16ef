use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::extension::error::ExtensionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub icon_name: String,
}

/// An extension currently on disk, as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledExtension {
    pub name: String,
    pub icon_name: String,
    pub payload_path: PathBuf,
    pub registration_path: PathBuf,
}

/// The accounts subsystem's view of installed webservices.
///
/// The three listings are parallel: index `i` of each describes the same
/// extension.
pub trait Registry {
    fn list_services(&self) -> io::Result<Vec<Service>>;
    fn list_module_paths(&self) -> io::Result<Vec<PathBuf>>;
    fn list_account_paths(&self) -> io::Result<Vec<PathBuf>>;
    fn service_name(&self, module_path: &Path) -> String;
}

/// Snapshot of installed extensions. Re-query to observe later changes.
pub fn list_installed(registry: &dyn Registry) -> Result<Vec<InstalledExtension>, ExtensionError> {
    let services = registry.list_services().map_err(ExtensionError::Registry)?;
    let modules = registry
        .list_module_paths()
        .map_err(ExtensionError::Registry)?;
    let accounts = registry
        .list_account_paths()
        .map_err(ExtensionError::Registry)?;

    if services.len() != modules.len() || modules.len() != accounts.len() {
        tracing::warn!(
            "registry listings disagree: {} services, {} modules, {} account paths",
            services.len(),
            modules.len(),
            accounts.len()
        );
    }

    Ok(services
        .into_iter()
        .zip(modules)
        .zip(accounts)
        .map(|((service, module_path), account_path)| {
            let mut name = registry.service_name(&module_path);
            if name.is_empty() {
                name = service.name;
            }
            InstalledExtension {
                registration_path: account_path.join(&name),
                name,
                icon_name: service.icon_name,
                payload_path: module_path,
            }
        })
        .collect())
}

/// Registry backed by the profile's extension directories.
#[derive(Debug, Clone)]
pub struct FsRegistry {
    webservice_dir: PathBuf,
    webaccount_dir: PathBuf,
}

impl FsRegistry {
    pub fn new(webservice_dir: PathBuf, webaccount_dir: PathBuf) -> Self {
        Self {
            webservice_dir,
            webaccount_dir,
        }
    }

    fn module_dirs(&self) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.webservice_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn icon_name(module_path: &Path, fallback: &str) -> String {
        let Ok(entries) = fs::read_dir(module_path.join("icons")) else {
            return fallback.to_string();
        };

        let mut icons: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        icons.sort();
        icons.into_iter().next().unwrap_or_else(|| fallback.to_string())
    }
}

impl Registry for FsRegistry {
    fn list_services(&self) -> io::Result<Vec<Service>> {
        Ok(self
            .module_dirs()?
            .into_iter()
            .map(|path| {
                let name = self.service_name(&path);
                Service {
                    icon_name: Self::icon_name(&path, &name),
                    name,
                }
            })
            .collect())
    }

    fn list_module_paths(&self) -> io::Result<Vec<PathBuf>> {
        self.module_dirs()
    }

    fn list_account_paths(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .module_dirs()?
            .iter()
            .map(|_| self.webaccount_dir.clone())
            .collect())
    }

    fn service_name(&self, module_path: &Path) -> String {
        module_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
