//! Test configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Layout and timing of an encryption test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    /// First cell that counts toward the score. The cell before it is the
    /// warm-up cell.
    #[serde(default = "default_first_scored_cell")]
    pub first_scored_cell: u32,
    /// Last cell of the answer form; the payload must carry exactly this many.
    #[serde(default = "default_last_cell")]
    pub last_cell: u32,
    /// Countdown length once the warm-up cell is filled.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,
    /// Timer label; `{seconds}` is replaced with the remaining seconds.
    #[serde(default = "default_timer_label")]
    pub timer_label: String,
}

fn default_first_scored_cell() -> u32 {
    11
}
fn default_last_cell() -> u32 {
    120
}
fn default_duration_secs() -> u32 {
    90
}
fn default_timer_label() -> String {
    "Seconds left: {seconds}".to_string()
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            first_scored_cell: default_first_scored_cell(),
            last_cell: default_last_cell(),
            duration_secs: default_duration_secs(),
            timer_label: default_timer_label(),
        }
    }
}

impl TestConfig {
    /// Render the timer label for `seconds` remaining.
    pub fn timer_label(&self, seconds: u32) -> String {
        self.timer_label.replace("{seconds}", &seconds.to_string())
    }

    /// The unscored cell whose first value starts the countdown.
    pub fn warm_up_cell(&self) -> u32 {
        self.first_scored_cell.saturating_sub(1)
    }

    /// Digits shown in the key legend; symbol `n` is answered with `n`.
    pub fn key_legend(&self) -> [u8; 9] {
        [1, 2, 3, 4, 5, 6, 7, 8, 9]
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_u32("CIPHERTEST_DURATION_SECS")? {
            self.duration_secs = v;
        }
        if let Some(v) = env_u32("CIPHERTEST_FIRST_SCORED_CELL")? {
            self.first_scored_cell = v;
        }
        if let Some(v) = env_u32("CIPHERTEST_LAST_CELL")? {
            self.last_cell = v;
        }
        Ok(())
    }
}

fn env_u32(name: &str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got '{raw}'")),
        Err(_) => Ok(None),
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `ciphertest.toml` in the current directory
/// 2. `~/.config/ciphertest/config.toml`
///
/// Environment variable overrides: `CIPHERTEST_DURATION_SECS`,
/// `CIPHERTEST_FIRST_SCORED_CELL`, `CIPHERTEST_LAST_CELL`.
pub fn load_config_from(path: Option<&Path>) -> Result<TestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("ciphertest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config_file(&path)?,
        None => TestConfig::default(),
    };
    config.apply_env_overrides()?;
    tracing::debug!(?config, "configuration loaded");

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<TestConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<TestConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("ciphertest"))
}
