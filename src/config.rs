//! Configuration management for hwinfo-ffi
//!
//! Config file location:
//! - Linux: ~/.config/hwinfo-ffi/config.toml
//! - macOS: ~/Library/Application Support/io.hwinfo.hwinfo-ffi/config.toml
//! - Windows: %APPDATA%/hwinfo/hwinfo-ffi/config/config.toml
//!
//! You can override the config location by setting `HWINFO_FFI_CONFIG_PATH`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "HWINFO_FFI_CONFIG_PATH";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How hardware is probed and cached
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Diagnostic output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path. A missing file yields the defaults.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config from {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("io", "hwinfo", "hwinfo-ffi")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Create default config file if it doesn't exist
    pub fn init() -> Result<Self> {
        let config = Self::load()?;

        // Save default config if file doesn't exist
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            config.save()?;
        }

        Ok(config)
    }
}

/// Probe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Cache OS, memory and mainboard like the list categories instead of
    /// re-probing them on every call
    #[serde(default)]
    pub cache_singletons: bool,

    /// Window between the two readings of a CPU utilization sample
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Ask `nvidia-smi` for NVIDIA GPU details
    #[serde(default = "default_true")]
    pub use_nvidia_smi: bool,

    /// Ask `dmidecode` for RAM module details (needs root)
    #[serde(default = "default_true")]
    pub use_dmidecode: bool,

    #[serde(default = "default_sys_root")]
    pub sys_root: PathBuf,

    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            cache_singletons: false,
            sample_interval_ms: default_sample_interval_ms(),
            use_nvidia_smi: default_true(),
            use_dmidecode: default_true(),
            sys_root: default_sys_root(),
            proc_root: default_proc_root(),
        }
    }
}

fn default_sample_interval_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

fn default_sys_root() -> PathBuf {
    PathBuf::from("/sys")
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Install a subscriber when the library is loaded through the C boundary.
    /// The binary always logs.
    #[serde(default)]
    pub enabled: bool,

    /// `EnvFilter` directives, overridden by `HWINFO_FFI_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "warn".to_string()
}
