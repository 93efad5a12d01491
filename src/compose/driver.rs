//! Composition driver for interactive editing
//!
//! During editing an avatar changes faster than sheets compose. The driver
//! accepts every submitted look but keeps at most one composition in flight
//! and one look waiting; a newer submission replaces the waiting one, so a
//! burst of edits settles with the latest look composed and the stale
//! intermediates skipped entirely.

use crate::avatar::configuration::AvatarConfiguration;
use crate::compose::sheet::SheetComposer;
use crate::compose::{ComposeError, ComposedTexture};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Broadcast to subscribers after each settled composition.
#[derive(Debug, Clone)]
pub enum DriverUpdate {
    /// No composition has settled yet.
    Idle,
    Composed {
        key: String,
        texture: Arc<ComposedTexture>,
    },
    Failed {
        key: String,
        error: ComposeError,
    },
}

#[derive(Debug, Default)]
struct DriverState {
    in_flight: bool,
    pending: Option<AvatarConfiguration>,
}

pub struct CompositionDriver {
    composer: Arc<SheetComposer>,
    state: Arc<Mutex<DriverState>>,
    updates: watch::Sender<DriverUpdate>,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl CompositionDriver {
    pub fn new(composer: Arc<SheetComposer>) -> Self {
        let (updates, _) = watch::channel(DriverUpdate::Idle);
        Self {
            composer,
            state: Arc::new(Mutex::new(DriverState::default())),
            updates,
            worker: std::sync::Mutex::new(None),
        }
    }

    /// Watch settled compositions. Subscribe before submitting to observe
    /// the resulting update.
    pub fn subscribe(&self) -> watch::Receiver<DriverUpdate> {
        self.updates.subscribe()
    }

    /// Submit the latest look.
    ///
    /// Returns immediately. If a composition is already running the look is
    /// parked as pending, replacing any previously parked look.
    pub async fn submit(&self, config: AvatarConfiguration) {
        let mut state = self.state.lock().await;
        if state.in_flight {
            if state.pending.replace(config).is_some() {
                debug!("replaced pending look with a newer submission");
            }
            return;
        }
        state.in_flight = true;
        drop(state);

        let composer = Arc::clone(&self.composer);
        let state = Arc::clone(&self.state);
        let updates = self.updates.clone();
        let handle = tokio::spawn(async move {
            let mut next = config;
            loop {
                let key = next.cache_key();
                match composer.compose(&next).await {
                    Ok(texture) => {
                        updates.send_replace(DriverUpdate::Composed { key, texture });
                    }
                    Err(error) => {
                        warn!(error = %error, "driver composition failed");
                        updates.send_replace(DriverUpdate::Failed { key, error });
                    }
                }

                let mut state = state.lock().await;
                match state.pending.take() {
                    Some(parked) => next = parked,
                    None => {
                        state.in_flight = false;
                        break;
                    }
                }
            }
        });

        let mut worker = self.worker.lock().unwrap_or_else(|p| p.into_inner());
        *worker = Some(handle);
    }

    /// Whether a composition is currently running or parked.
    pub async fn is_busy(&self) -> bool {
        let state = self.state.lock().await;
        state.in_flight || state.pending.is_some()
    }
}

impl Drop for CompositionDriver {
    fn drop(&mut self) {
        let mut worker = self.worker.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = worker.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CompositionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionDriver").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetFetch, ResourceCache};
    use crate::avatar::animations::AnimationRegistrar;
    use crate::compose::cache::CompositionCache;
    use crate::compose::GRID_COLS;
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::{Rgba, RgbaImage};
    use std::time::Duration;
    use tokio::sync::RwLock;
    use tokio::time::timeout;

    const FRAME: u32 = 4;

    fn png_bytes() -> Bytes {
        let image = RgbaImage::from_pixel(GRID_COLS * FRAME, 4 * FRAME, Rgba([9, 9, 9, 255]));
        let mut buf = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    /// Slow fetcher that records every requested path.
    struct RecordingFetcher {
        delay: Duration,
        paths: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingFetcher {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                paths: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn paths(&self) -> Vec<String> {
            self.paths.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AssetFetch for RecordingFetcher {
        async fn fetch_bytes(&self, path: &str) -> anyhow::Result<Bytes> {
            self.paths.lock().unwrap().push(path.to_string());
            tokio::time::sleep(self.delay).await;
            Ok(png_bytes())
        }
    }

    fn driver(fetcher: Arc<dyn AssetFetch>) -> CompositionDriver {
        let resources = Arc::new(ResourceCache::new(fetcher, Duration::from_secs(5), FRAME));
        let composer = Arc::new(SheetComposer::new(
            resources,
            Arc::new(CompositionCache::new(4)),
            Arc::new(RwLock::new(AnimationRegistrar::new())),
            2,
            FRAME,
            FRAME,
        ));
        CompositionDriver::new(composer)
    }

    async fn wait_for_key(rx: &mut watch::Receiver<DriverUpdate>, key: &str) {
        timeout(Duration::from_secs(5), async {
            loop {
                rx.changed().await.unwrap();
                let update = rx.borrow().clone();
                if let DriverUpdate::Composed { key: seen, .. } = update {
                    if seen == key {
                        break;
                    }
                }
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_submit_broadcasts_composed_update() {
        let driver = driver(Arc::new(RecordingFetcher::new(Duration::ZERO)));
        let mut rx = driver.subscribe();

        let config = AvatarConfiguration::default();
        let key = config.cache_key();
        driver.submit(config).await;

        wait_for_key(&mut rx, &key).await;
        assert!(!driver.is_busy().await);
    }

    #[tokio::test]
    async fn test_burst_skips_intermediate_look() {
        let fetcher = Arc::new(RecordingFetcher::new(Duration::from_millis(40)));
        let backend: Arc<dyn AssetFetch> = fetcher.clone();
        let driver = driver(backend);
        let mut rx = driver.subscribe();

        let first = AvatarConfiguration::default();
        let mut skipped = AvatarConfiguration::default();
        skipped.body.skin = "amber".to_string();
        let mut last = AvatarConfiguration::default();
        last.body.skin = "olive".to_string();
        let last_key = last.cache_key();

        driver.submit(first).await;
        driver.submit(skipped).await;
        driver.submit(last).await;

        wait_for_key(&mut rx, &last_key).await;

        // The middle look was replaced while parked; its body sheet was
        // never requested.
        let paths = fetcher.paths();
        assert!(paths.iter().any(|p| p.contains("olive")));
        assert!(!paths.iter().any(|p| p.contains("amber")));
    }
}
