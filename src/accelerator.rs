//! The process-wide, mutex-guarded entry point (§5): a single `Accelerator` instance is meant to
//! be shared across a process, serializing every caller onto one GPU device and queue.
//!
//! All public operations take the mutex and hold it for their whole duration; there is no
//! facility for a caller to re-enter a method it's already inside on another thread. That's a
//! deliberate simplification of the concurrency model, not an oversight: the nine-stage pipeline
//! assumes exclusive access to its pooled buffers for the length of one dispatch.

use std::sync::{Arc, Mutex};

use wgpu::{Device, Queue};

use crate::color::Color;
use crate::composite::TargetBuffer;
use crate::dispatcher::{ComputeDispatcher, Diagnostics, Image, PathInput};
use crate::error::RasterError;

/// Owns one [`ComputeDispatcher`] behind a single mutex, per the concurrency model's
/// one-accelerator-one-queue rule.
pub struct Accelerator {
    dispatcher: Mutex<ComputeDispatcher>,
}

impl Accelerator {
    /// Creates an accelerator with its own headless device. Returns `None` if no GPU adapter is
    /// available.
    pub async fn try_new() -> Option<Self> {
        Some(Self {
            dispatcher: Mutex::new(ComputeDispatcher::try_new().await?),
        })
    }

    /// Creates an accelerator with its own headless device, panicking if none is available.
    pub async fn new() -> Self {
        Self {
            dispatcher: Mutex::new(ComputeDispatcher::new().await),
        }
    }

    /// Adopts an externally-owned device/queue rather than creating one.
    pub fn adopt_shared(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        Self {
            dispatcher: Mutex::new(ComputeDispatcher::adopt_shared(device, queue)),
        }
    }

    /// Renders `paths` directly, without compositing onto a target. Equivalent to
    /// [`ComputeDispatcher::render`], but taken under the process-wide mutex.
    pub fn render(
        &self,
        width: u32,
        height: u32,
        bg_color: Color,
        paths: &[PathInput],
    ) -> Result<Image, RasterError> {
        let mut dispatcher = self.dispatcher.lock().expect("accelerator mutex poisoned");
        dispatcher.render(width, height, bg_color, paths)
    }

    /// Renders `paths` and composites the result over `target` using Porter-Duff source-over.
    pub fn render_onto(
        &self,
        bg_color: Color,
        paths: &[PathInput],
        target: &mut TargetBuffer,
    ) -> Result<(), RasterError> {
        let mut dispatcher = self.dispatcher.lock().expect("accelerator mutex poisoned");
        let image = dispatcher.render(target.width, target.height, bg_color, paths)?;
        crate::composite::composite_source_over(target, image.width, image.height, &image.pixels);
        Ok(())
    }

    /// The most recent frame's diagnostics, if any frame has been rendered yet.
    pub fn last_diagnostics(&self) -> Option<Diagnostics> {
        self.dispatcher
            .lock()
            .expect("accelerator mutex poisoned")
            .last_diagnostics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_onto_acquires_and_releases_the_mutex() {
        let Some(accel) = futures::executor::block_on(Accelerator::try_new()) else {
            eprintln!("skipping: no GPU adapter available");
            return;
        };
        let mut data = vec![255u8; 16];
        {
            let mut target = TargetBuffer::new(2, 2, 8, &mut data);
            accel
                .render_onto(Color::WHITE, &[], &mut target)
                .unwrap();
        }
        // Empty paths is the fast path: bg_color opaque white composited over opaque white is a
        // no-op, and the mutex must already be released here (no deadlock on the second call).
        assert!(accel.last_diagnostics().is_some());
    }
}
