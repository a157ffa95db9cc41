use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::detail::Mode;

// ── Profile ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Backend base URL (the advice server's API root)
    pub endpoint: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Advice mode active at startup
    #[serde(default)]
    pub default_mode: Mode,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            timeout_secs: default_timeout_secs(),
            default_mode: Mode::Career,
        }
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Which profile to use when none is specified
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

fn default_profile_name() -> String {
    "default".to_string()
}

impl ConfigFile {
    /// Load from disk, or return a default config if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    /// Write a starter config file to disk (only if it doesn't exist).
    pub fn write_default_if_missing() -> Result<PathBuf> {
        let path = config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, DEFAULT_CONFIG_TOML)?;
        Ok(path)
    }

    /// Resolve the active profile given an optional override name.
    pub fn resolve_profile(&self, name: Option<&str>) -> Option<&Profile> {
        let key = name.unwrap_or(&self.default_profile);
        self.profiles.get(key)
    }
}

// ── Resolved runtime config (after merging file + CLI overrides) ──────────────

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub mode: Mode,
    /// Profile name that was resolved (for display)
    pub profile_name: String,
}

impl ResolvedConfig {
    /// Merge config file profile with CLI overrides.
    /// Priority: CLI args > env vars (handled by clap) > config file profile > built-in defaults
    pub fn resolve(
        file: &ConfigFile,
        profile_override: Option<&str>,
        endpoint_override: Option<&str>,
        mode_override: Option<Mode>,
    ) -> Self {
        let profile_name = profile_override
            .unwrap_or(&file.default_profile)
            .to_string();

        let base = file
            .resolve_profile(profile_override)
            .cloned()
            .unwrap_or_default();

        Self {
            endpoint: endpoint_override
                .map(str::to_string)
                .unwrap_or(base.endpoint),
            timeout_secs: base.timeout_secs,
            mode: mode_override.unwrap_or(base.default_mode),
            profile_name,
        }
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────────

pub fn config_path() -> PathBuf {
    dirs_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jobot")
        .join("config.toml")
}

fn dirs_config_dir() -> Option<PathBuf> {
    // XDG_CONFIG_HOME or ~/.config on Linux/macOS
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

// ── Default config template written on first run ──────────────────────────────

const DEFAULT_CONFIG_TOML: &str = r#"# Jobot configuration
# Run `jobot --init` to regenerate this file.

default_profile = "local"

# ── Local advice server (default) ─────────────────────────────────────────────
[profiles.local]
endpoint     = "http://127.0.0.1:5000"
timeout_secs = 30
default_mode = "career"

# ── Skill-first profile example ───────────────────────────────────────────────
# [profiles.skills]
# endpoint     = "http://127.0.0.1:5000"
# default_mode = "skill"

# ── Remote deployment example ─────────────────────────────────────────────────
# [profiles.prod]
# endpoint     = "https://advice.example.com"
# timeout_secs = 60
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with_profile(name: &str, endpoint: &str, mode: Mode) -> ConfigFile {
        let mut profiles = HashMap::new();
        profiles.insert(
            name.to_string(),
            Profile { endpoint: endpoint.to_string(), timeout_secs: 10, default_mode: mode },
        );
        ConfigFile { default_profile: name.to_string(), profiles }
    }

    #[test]
    fn test_resolve_prefers_cli_overrides() {
        let file = file_with_profile("local", "http://file:5000", Mode::Skill);
        let resolved = ResolvedConfig::resolve(
            &file,
            None,
            Some("http://cli:5000"),
            Some(Mode::Career),
        );
        assert_eq!(resolved.endpoint, "http://cli:5000");
        assert_eq!(resolved.mode, Mode::Career);
        assert_eq!(resolved.profile_name, "local");
        assert_eq!(resolved.timeout_secs, 10);
    }

    #[test]
    fn test_resolve_falls_back_to_profile_then_defaults() {
        let file = file_with_profile("local", "http://file:5000", Mode::Skill);
        let resolved = ResolvedConfig::resolve(&file, None, None, None);
        assert_eq!(resolved.endpoint, "http://file:5000");
        assert_eq!(resolved.mode, Mode::Skill);

        let resolved = ResolvedConfig::resolve(&file, Some("missing"), None, None);
        assert_eq!(resolved.endpoint, "http://127.0.0.1:5000");
        assert_eq!(resolved.mode, Mode::Career);
        assert_eq!(resolved.profile_name, "missing");
    }

    #[test]
    fn test_default_template_parses() {
        let parsed: ConfigFile = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed.default_profile, "local");
        let local = parsed.profiles.get("local").unwrap();
        assert_eq!(local.default_mode, Mode::Career);
    }
}
