//! Composer settings
//!
//! Tunables for the composition pipeline, loadable from a TOML file. Every
//! field has a default, so a partial file or no file at all yields a working
//! configuration.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where layer sheets are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchBackend {
    /// Local asset tree rooted at `root`.
    Files { root: PathBuf },
    /// Remote catalog, paths resolved against `base_url`.
    Http { base_url: String },
}

impl Default for FetchBackend {
    fn default() -> Self {
        Self::Files {
            root: PathBuf::from("assets"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// Per-asset fetch deadline before the load counts as failed.
    pub load_timeout_secs: u64,
    /// Composed sheets kept before least-recently-used eviction.
    pub composition_cache_capacity: usize,
    /// Scratch frame buffers shared by concurrent compositions.
    pub scratch_pool_limit: usize,
    /// Authored frame edge in the source sheets.
    pub source_frame_px: u32,
    /// Frame edge of published sheets after downsampling.
    pub display_frame_px: u32,
    pub fetch: FetchBackend,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            load_timeout_secs: 10,
            composition_cache_capacity: 16,
            scratch_pool_limit: 4,
            source_frame_px: 64,
            display_frame_px: 32,
            fetch: FetchBackend::default(),
        }
    }
}

impl ComposerSettings {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.load_timeout_secs > 0, "load_timeout_secs must be positive");
        ensure!(
            self.composition_cache_capacity > 0,
            "composition_cache_capacity must be positive"
        );
        ensure!(self.scratch_pool_limit > 0, "scratch_pool_limit must be positive");
        ensure!(self.source_frame_px > 0, "source_frame_px must be positive");
        ensure!(self.display_frame_px > 0, "display_frame_px must be positive");
        ensure!(
            self.display_frame_px <= self.source_frame_px,
            "display_frame_px cannot exceed source_frame_px"
        );
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings: Self = toml::from_str(&data)
            .with_context(|| format!("parsing settings file {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating settings directory {}", parent.display()))?;
        }
        let rendered = toml::to_string_pretty(self).context("serializing settings")?;
        fs::write(path, rendered)
            .with_context(|| format!("writing settings file {}", path.display()))?;
        Ok(())
    }
}
