use image::GrayImage;
use std::sync::{Arc, Mutex};

/// Holds the last raster that rendered from real data.
#[derive(Default)]
pub struct FrameCache {
    state: Mutex<Option<Arc<GrayImage>>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Arc<GrayImage>> {
        match self.state.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap in `frame` as the new last good raster.
    pub fn replace(&self, frame: GrayImage) -> Arc<GrayImage> {
        let frame = Arc::new(frame);
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Arc::clone(&frame));
        frame
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_none()
    }
}
