//! CLI configuration management.
//!
//! Settings live in `~/.config/chunkvault/config.json`. The environment
//! variables `TOKEN`, `GUILD_ID` and `CHUNKVAULT_API_BASE` override the
//! file, so existing `.env`-style setups keep working.

use std::path::{Path, PathBuf};

use chunkvault_orchestrator::VaultSettings;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "chunkvault";

/// CLI configuration, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    /// Discord bot token.
    pub token: String,

    /// Guild the upload channels are created in.
    pub guild_id: String,

    /// Alternative API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Chunk size in bytes. 0 uses the default (10 MiB).
    pub chunk_size: usize,

    /// Manifest location. Defaults to `uploads.json` next to the config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,

    /// Download directory. Defaults to `downloads` in the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Loads the configuration file and applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads `path`. A missing file yields defaults; an unparsable one is
    /// logged and also yields defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Overrides fields from the variables `lookup` resolves. Empty values
    /// are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("TOKEN") {
            self.token = token;
        }
        if let Some(guild_id) = var("GUILD_ID") {
            self.guild_id = guild_id;
        }
        if let Some(api_base) = var("CHUNKVAULT_API_BASE") {
            self.api_base = Some(api_base);
        }
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    /// Writes pretty JSON to `path` readable only by the owner.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        set_permissions_0600(path);

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Returns an error naming the first missing credential.
    pub fn require_credentials(&self) -> anyhow::Result<()> {
        if self.token.trim().is_empty() {
            anyhow::bail!("bot token is not configured (set TOKEN or \"token\" in the config file)");
        }
        if self.guild_id.trim().is_empty() {
            anyhow::bail!("guild id is not configured (set GUILD_ID or \"guildId\" in the config file)");
        }
        Ok(())
    }

    /// Resolved manifest location.
    pub fn manifest_path(&self) -> anyhow::Result<PathBuf> {
        match &self.manifest_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_base_dir()?.join(APP_DIR).join("uploads.json")),
        }
    }

    pub fn vault_settings(&self) -> VaultSettings {
        let defaults = VaultSettings::default();
        VaultSettings {
            chunk_size: if self.chunk_size == 0 {
                defaults.chunk_size
            } else {
                self.chunk_size
            },
            download_dir: self.download_dir.clone().unwrap_or(defaults.download_dir),
        }
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Location of the configuration file.
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join(APP_DIR).join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return Ok(PathBuf::from(xdg));
            }
        }
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
