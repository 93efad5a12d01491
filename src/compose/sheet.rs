//! Full-sheet composition
//!
//! `SheetComposer` owns the whole pipeline for one avatar look: derive the
//! layer list, fetch every layer's sheet through the resource cache, draw
//! the 16x9 frame grid at source resolution, downsample to display
//! resolution and publish the result into the composition cache.
//!
//! Identical looks requested concurrently share one composition; later
//! requests for a published look are pure cache hits.

use crate::assets::{RasterSheet, ResourceCache, ResourceIdentity};
use crate::avatar::animations::AnimationRegistrar;
use crate::avatar::configuration::AvatarConfiguration;
use crate::avatar::layers::build_layers;
use crate::compose::cache::CompositionCache;
use crate::compose::frame::{draw_cell, row_frame_count, PreparedLayer};
use crate::compose::scratch::ScratchPool;
use crate::compose::{
    ComposeError, ComposeResult, ComposedTexture, TextureHandle, GRID_COLS, GRID_ROWS,
};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

type ComposeCell = Arc<OnceCell<ComposeResult<Arc<ComposedTexture>>>>;

pub struct SheetComposer {
    resources: Arc<ResourceCache>,
    cache: Arc<CompositionCache>,
    animations: Arc<RwLock<AnimationRegistrar>>,
    scratch: ScratchPool,
    /// One cell per look currently being composed; concurrent requests for
    /// the same key await the same cell instead of composing twice.
    in_flight: Mutex<HashMap<String, ComposeCell>>,
    source_frame: u32,
    display_frame: u32,
}

impl SheetComposer {
    pub fn new(
        resources: Arc<ResourceCache>,
        cache: Arc<CompositionCache>,
        animations: Arc<RwLock<AnimationRegistrar>>,
        scratch_buffers: usize,
        source_frame: u32,
        display_frame: u32,
    ) -> Self {
        info!(
            source_frame,
            display_frame, scratch_buffers, "sheet composer initialized"
        );
        Self {
            resources,
            cache,
            animations,
            scratch: ScratchPool::new(scratch_buffers, source_frame),
            in_flight: Mutex::new(HashMap::new()),
            source_frame,
            display_frame,
        }
    }

    pub fn resources(&self) -> &Arc<ResourceCache> {
        &self.resources
    }

    pub fn cache(&self) -> &Arc<CompositionCache> {
        &self.cache
    }

    pub fn animations(&self) -> &Arc<RwLock<AnimationRegistrar>> {
        &self.animations
    }

    /// Compose the configuration's sheet, or return the cached one.
    ///
    /// Failures are returned to every waiter but never memoized here, so a
    /// later request retries the composition. Permanently missing assets
    /// are still remembered by the resource cache underneath, which keeps
    /// the retry cheap.
    pub async fn compose(
        &self,
        config: &AvatarConfiguration,
    ) -> ComposeResult<Arc<ComposedTexture>> {
        let key = config.cache_key();
        if let Some(texture) = self.cache.get(&key).await {
            debug!(handle = %texture.handle, "composition cache hit");
            return Ok(texture);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let result = cell
            .get_or_init(|| self.compose_uncached(config, &key))
            .await
            .clone();

        // Drop the in-flight entry once settled, unless a newer attempt
        // already replaced it.
        let mut in_flight = self.in_flight.lock().await;
        if let Some(current) = in_flight.get(&key) {
            if Arc::ptr_eq(current, &cell) {
                in_flight.remove(&key);
            }
        }

        result
    }

    async fn compose_uncached(
        &self,
        config: &AvatarConfiguration,
        key: &str,
    ) -> ComposeResult<Arc<ComposedTexture>> {
        // A caller that missed the cache can still win a fresh in-flight
        // cell after the look was published; reuse the published sheet.
        if let Some(texture) = self.cache.get(key).await {
            debug!(handle = %texture.handle, "look published before build started");
            return Ok(texture);
        }

        let started = Instant::now();
        let layers = build_layers(config);

        // Fetch every layer sheet in parallel and keep collecting after a
        // failure, so one pass reports the complete missing set.
        let mut fetches = JoinSet::new();
        for (index, layer) in layers.iter().enumerate() {
            let resources = Arc::clone(&self.resources);
            let identity = layer.identity.clone();
            fetches.spawn(async move { (index, resources.request(&identity).await) });
        }

        let mut sheets: Vec<Option<Arc<RasterSheet>>> = vec![None; layers.len()];
        let mut missing: Vec<ResourceIdentity> = Vec::new();
        while let Some(joined) = fetches.join_next().await {
            let (index, fetched) = joined.map_err(|_| ComposeError::Cancelled)?;
            match fetched {
                Ok(sheet) => sheets[index] = Some(sheet),
                Err(failure) => {
                    warn!(
                        identity = %layers[index].identity,
                        error = %failure,
                        "layer asset unavailable"
                    );
                    missing.push(layers[index].identity.clone());
                }
            }
        }

        if !missing.is_empty() {
            missing.sort_by_key(|identity| identity.to_string());
            return Err(ComposeError::MissingAssets { missing });
        }

        let prepared: Vec<PreparedLayer> = layers
            .into_iter()
            .zip(sheets)
            .filter_map(|(layer, sheet)| sheet.map(|sheet| PreparedLayer { layer, sheet }))
            .collect();

        let mut scratch = self.scratch.acquire()?;
        let mut sheet = RgbaImage::new(
            GRID_COLS * self.source_frame,
            GRID_ROWS * self.source_frame,
        );
        for row in 0..GRID_ROWS {
            for col in 0..row_frame_count(row) {
                draw_cell(&mut sheet, &prepared, col, row, self.source_frame, &mut scratch);
            }
        }
        drop(scratch);

        let display = if self.display_frame == self.source_frame {
            sheet
        } else {
            imageops::resize(
                &sheet,
                GRID_COLS * self.display_frame,
                GRID_ROWS * self.display_frame,
                FilterType::Lanczos3,
            )
        };

        let texture = Arc::new(ComposedTexture {
            handle: TextureHandle::new(),
            sheet: display,
            frame_width: self.display_frame,
            frame_height: self.display_frame,
            columns: GRID_COLS,
            rows: GRID_ROWS,
        });

        if let Some(displaced) = self
            .cache
            .insert(key.to_string(), Arc::clone(&texture))
            .await
        {
            if self.animations.write().await.unregister(displaced.handle) {
                debug!(handle = %displaced.handle, "retired clips of displaced sheet");
            }
        }

        info!(
            handle = %texture.handle,
            layers = prepared.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "composed avatar sheet"
        );

        Ok(texture)
    }
}

impl std::fmt::Debug for SheetComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetComposer")
            .field("source_frame", &self.source_frame)
            .field("display_frame", &self.display_frame)
            .finish()
    }
}
