//! Animation clip registration
//!
//! A composed sheet carries four animations by four facing directions on
//! fixed rows. The registrar turns a published texture into the named clips
//! a sprite-animation player consumes, and keeps the definitions until the
//! texture is retired.

use crate::compose::{ComposedTexture, TextureHandle};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// (animation, first row of its block, frame count, frames per second)
const CLIP_SPECS: &[(&str, u32, u32, u32)] = &[
    ("walk", 0, 9, 12),
    ("run", 4, 8, 15),
    ("idle", 8, 2, 2),
    ("sit", 12, 3, 6),
];

/// (direction, row offset within each block)
const DIRECTIONS: &[(&str, u32)] = &[("down", 0), ("left", 1), ("right", 2), ("up", 3)];

/// One named clip over a composed sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationClip {
    /// `{animation}_{direction}`, e.g. `walk_down`.
    pub name: String,
    /// Sheet row the clip plays from.
    pub row: u32,
    /// Frames played from column 0 of the row.
    pub frame_count: u32,
    pub frame_rate: u32,
    pub looped: bool,
}

impl AnimationClip {
    /// Linear frame indices for players that number frames row-major.
    pub fn frame_indices(&self, sheet_columns: u32) -> Vec<u32> {
        (0..self.frame_count)
            .map(|frame| self.row * sheet_columns + frame)
            .collect()
    }
}

fn build_clips(texture: &ComposedTexture) -> Vec<AnimationClip> {
    let mut clips = Vec::with_capacity(CLIP_SPECS.len() * DIRECTIONS.len());
    for (animation, block_row, frame_count, frame_rate) in CLIP_SPECS {
        for (direction, offset) in DIRECTIONS {
            let row = block_row + offset;
            if row >= texture.rows {
                continue;
            }
            clips.push(AnimationClip {
                name: format!("{animation}_{direction}"),
                row,
                frame_count: (*frame_count).min(texture.columns),
                frame_rate: *frame_rate,
                looped: true,
            });
        }
    }
    clips
}

/// Clip definitions per published sheet, idempotent per handle.
#[derive(Debug, Default)]
pub struct AnimationRegistrar {
    clips: HashMap<TextureHandle, Vec<AnimationClip>>,
}

impl AnimationRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the sheet's clips. Re-registering an already-registered
    /// texture is a no-op returning the existing definitions.
    pub fn register(&mut self, texture: &ComposedTexture) -> &[AnimationClip] {
        let entry = self.clips.entry(texture.handle);
        let clips = match entry {
            std::collections::hash_map::Entry::Occupied(existing) => existing.into_mut(),
            std::collections::hash_map::Entry::Vacant(vacant) => {
                debug!(handle = %texture.handle, "registering animation clips");
                vacant.insert(build_clips(texture))
            }
        };
        clips.as_slice()
    }

    pub fn is_registered(&self, handle: TextureHandle) -> bool {
        self.clips.contains_key(&handle)
    }

    pub fn clips(&self, handle: TextureHandle) -> Option<&[AnimationClip]> {
        self.clips.get(&handle).map(Vec::as_slice)
    }

    /// Drop a retired texture's clips. Returns whether anything was removed.
    pub fn unregister(&mut self, handle: TextureHandle) -> bool {
        self.clips.remove(&handle).is_some()
    }

    pub fn clear(&mut self) -> usize {
        let count = self.clips.len();
        self.clips.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
