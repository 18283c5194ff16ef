use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extension::VerifyPolicy;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub download: DownloadConfig,
    pub theme: ThemeConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub profile_path: String,
    pub catalog_path: String,
    pub scratch_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub verify_attempts: u32,
    pub verify_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeConfig {
    /// Desktop colour string, `"stroke,fill"`.
    pub xo_color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub webservice_dir: String,
    pub webaccount_dir: String,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user = directories::ProjectDirs::from("", "", "webinstall")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|path| path.exists())
            .map(fs::read_to_string)
            .transpose()?;

        let mut config = Self::layered(user.as_deref())?;
        config.expand_home()?;
        Ok(config)
    }

    /// Defaults with `user` (a partial TOML document) merged on top.
    pub fn layered(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Value = toml::from_str(DEFAULTS)?;
        if let Some(user) = user {
            let overlay: toml::Value = toml::from_str(user)?;
            merge(&mut merged, overlay);
        }
        Ok(merged.try_into()?)
    }

    fn expand_home(&mut self) -> Result<()> {
        for path in [
            &mut self.general.profile_path,
            &mut self.general.catalog_path,
            &mut self.general.scratch_dir,
        ] {
            if path.starts_with('~') {
                let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
                *path = expand_with(path, &home).to_string_lossy().into_owned();
            }
        }
        Ok(())
    }

    pub fn profile_path(&self) -> PathBuf {
        PathBuf::from(&self.general.profile_path)
    }

    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.general.catalog_path)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.scratch_dir)
    }

    pub fn webservice_dir(&self) -> PathBuf {
        self.under_profile(&self.registry.webservice_dir)
    }

    pub fn webaccount_dir(&self) -> PathBuf {
        self.under_profile(&self.registry.webaccount_dir)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs)
    }

    pub fn verify_policy(&self) -> VerifyPolicy {
        VerifyPolicy {
            attempts: self.download.verify_attempts,
            interval: Duration::from_millis(self.download.verify_interval_ms),
        }
    }

    fn under_profile(&self, dir: &str) -> PathBuf {
        let dir = Path::new(dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.profile_path().join(dir)
        }
    }
}

/// Recursively overlays tables; any other value in `overlay` replaces `base`.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Expands a leading `~` in a user-typed path to the home directory.
pub fn expand_tilde(raw: &str) -> PathBuf {
    match dirs_home() {
        Some(home) => expand_with(raw, &home),
        None => PathBuf::from(raw),
    }
}

fn expand_with(raw: &str, home: &Path) -> PathBuf {
    match raw.strip_prefix('~') {
        Some("") => home.to_path_buf(),
        Some(rest) if rest.starts_with('/') => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(raw),
    }
}
