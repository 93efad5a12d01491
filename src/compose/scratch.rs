//! Scratch buffer pool
//!
//! Tinted frames are staged in a frame-sized scratch surface before being
//! composited. The pool bounds how many buffers can be out at once and
//! recycles returned ones. Guards return their buffer on drop, so a
//! composition future abandoned mid-draw still gives the buffer back.

use crate::compose::{ComposeError, ComposeResult};
use image::RgbaImage;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

struct PoolState {
    free: Vec<RgbaImage>,
    outstanding: usize,
}

struct PoolInner {
    state: Mutex<PoolState>,
    limit: usize,
    frame_size: u32,
}

#[derive(Clone)]
pub(crate) struct ScratchPool {
    inner: Arc<PoolInner>,
}

impl ScratchPool {
    pub fn new(limit: usize, frame_size: u32) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    free: Vec::new(),
                    outstanding: 0,
                }),
                limit: limit.max(1),
                frame_size,
            }),
        }
    }

    /// Take a frame-sized buffer, failing when the pool is exhausted.
    pub fn acquire(&self) -> ComposeResult<ScratchGuard> {
        let mut state = self.inner.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.outstanding >= self.inner.limit {
            return Err(ComposeError::BufferAcquisition {
                reason: format!("all {} scratch buffers are in use", self.inner.limit),
            });
        }
        state.outstanding += 1;
        let buffer = state
            .free
            .pop()
            .unwrap_or_else(|| RgbaImage::new(self.inner.frame_size, self.inner.frame_size));
        drop(state);
        Ok(ScratchGuard {
            pool: Arc::clone(&self.inner),
            buffer,
        })
    }

    #[cfg(test)]
    fn outstanding(&self) -> usize {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .outstanding
    }
}

pub(crate) struct ScratchGuard {
    pool: Arc<PoolInner>,
    buffer: RgbaImage,
}

impl Deref for ScratchGuard {
    type Target = RgbaImage;

    fn deref(&self) -> &RgbaImage {
        &self.buffer
    }
}

impl DerefMut for ScratchGuard {
    fn deref_mut(&mut self) -> &mut RgbaImage {
        &mut self.buffer
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        let buffer = std::mem::replace(&mut self.buffer, RgbaImage::new(0, 0));
        let mut state = self.pool.state.lock().unwrap_or_else(|p| p.into_inner());
        state.outstanding = state.outstanding.saturating_sub(1);
        state.free.push(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_bounded() {
        let pool = ScratchPool::new(2, 8);
        let first = pool.acquire().unwrap();
        let _second = pool.acquire().unwrap();
        let exhausted = pool.acquire();
        assert!(matches!(
            exhausted,
            Err(ComposeError::BufferAcquisition { .. })
        ));

        drop(first);
        assert!(pool.acquire().is_ok());
    }

    #[test]
    fn test_buffers_are_recycled_with_dimensions() {
        let pool = ScratchPool::new(1, 16);
        {
            let guard = pool.acquire().unwrap();
            assert_eq!(guard.width(), 16);
            assert_eq!(guard.height(), 16);
        }
        assert_eq!(pool.outstanding(), 0);
        let guard = pool.acquire().unwrap();
        assert_eq!(guard.width(), 16);
    }

    #[test]
    fn test_guard_is_writable() {
        let pool = ScratchPool::new(1, 4);
        let mut guard = pool.acquire().unwrap();
        guard.put_pixel(0, 0, image::Rgba([1, 2, 3, 4]));
        assert_eq!(*guard.get_pixel(0, 0), image::Rgba([1, 2, 3, 4]));
    }
}
