//! Sprite-sheet composition pipeline
//!
//! Takes the ordered layer list for one avatar, fetches every layer sheet,
//! draws the full direction/animation frame grid with tinting and
//! row-fallback alignment, downsamples to display resolution and publishes
//! the result as a cached texture.

pub mod cache;
pub mod driver;
pub mod frame;
pub mod scratch;
pub mod sheet;

pub use cache::{CompositionCache, CompositionCacheStats};
pub use driver::{CompositionDriver, DriverUpdate};
pub use sheet::SheetComposer;

use crate::assets::ResourceIdentity;
use image::RgbaImage;
use thiserror::Error;
use uuid::Uuid;

/// Frame rows in the composed grid: four animations by four directions.
pub const GRID_ROWS: u32 = 16;
/// Frame columns in the composed grid, sized for the longest clip.
pub const GRID_COLS: u32 = 9;

/// Opaque identifier of one published sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(Uuid);

impl TextureHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TextureHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully composed, display-resolution sprite sheet.
///
/// Owned by the composition cache behind `Arc`; eviction drops the cache's
/// strong reference and the sheet dies with the last outstanding clone.
pub struct ComposedTexture {
    pub handle: TextureHandle,
    pub sheet: RgbaImage,
    pub frame_width: u32,
    pub frame_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl std::fmt::Debug for ComposedTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedTexture")
            .field("handle", &self.handle)
            .field("width", &self.sheet.width())
            .field("height", &self.sheet.height())
            .field("frame", &(self.frame_width, self.frame_height))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("composition missing required assets: {}", .missing.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "))]
    MissingAssets { missing: Vec<ResourceIdentity> },

    #[error("scratch buffer acquisition failed: {reason}")]
    BufferAcquisition { reason: String },

    #[error("composition cancelled before completion")]
    Cancelled,
}

pub type ComposeResult<T> = Result<T, ComposeError>;
