//! Accumulates submitted paths into pending work for one frame, and flushes them through a
//! [`ComputeDispatcher`] onto a caller-owned target buffer.
//!
//! Paths are flattened eagerly on submission rather than at flush time: an empty flattened
//! result (property 3) must neither append to pending work nor later cause the dispatcher to
//! allocate GPU buffers for it, so the emptiness check has to happen before anything is queued.

use crate::color::Color;
use crate::composite::{composite_source_over, TargetBuffer};
use crate::dispatcher::{ComputeDispatcher, PathInput};
use crate::error::RasterError;
use crate::flatten::flatten_path_default;
use crate::geometry::{FillRule, Path};

/// One path queued for the next flush, paired with the paint it was submitted with.
struct Pending {
    path: Path,
    color: Color,
    fill_rule: FillRule,
}

/// Per-frame pending-work accumulator. Create one per frame (or reuse across frames by calling
/// `flush` between them); it holds no GPU state of its own.
#[derive(Default)]
pub struct SceneBuilder {
    pending: Vec<Pending>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `path` with the given paint for the next `flush`. Flattens the path immediately
    /// (at the default tolerance) purely to decide whether it contributes any geometry; an empty
    /// result is dropped without being queued.
    pub fn submit_path(&mut self, path: Path, color: Color, fill_rule: FillRule) {
        let flattened = flatten_path_default(&path, color, fill_rule);
        if flattened.is_empty() {
            return;
        }
        self.pending.push(Pending {
            path,
            color,
            fill_rule,
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Renders all pending paths and composites the result over `target` using Porter-Duff
    /// source-over, then clears pending work. A call with nothing pending is a no-op that leaves
    /// `target` untouched and still returns `Ok(())`.
    pub fn flush(
        &mut self,
        dispatcher: &mut ComputeDispatcher,
        bg_color: Color,
        target: &mut TargetBuffer,
    ) -> Result<(), RasterError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let inputs: Vec<PathInput> = self
            .pending
            .drain(..)
            .map(|p| PathInput {
                path: p.path,
                color: p.color,
                fill_rule: p.fill_rule,
            })
            .collect();

        let image = dispatcher.render(target.width, target.height, bg_color, &inputs)?;
        composite_source_over(target, image.width, image.height, &image.pixels);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn empty_path_does_not_become_pending_work() {
        let mut builder = SceneBuilder::new();
        let mut path = Path::new();
        path.move_to(Point::new(10.0, 10.0));
        builder.submit_path(path, Color::BLACK, FillRule::NonZero);
        assert_eq!(builder.pending_count(), 0);
    }

    #[test]
    fn flush_with_nothing_pending_leaves_target_untouched() {
        let Some(mut dispatcher) = futures::executor::block_on(ComputeDispatcher::try_new())
        else {
            eprintln!("skipping: no GPU adapter available");
            return;
        };
        let mut builder = SceneBuilder::new();
        let mut data = vec![255u8; 16];
        let original = data.clone();
        {
            let mut target = TargetBuffer::new(2, 2, 8, &mut data);
            builder
                .flush(&mut dispatcher, Color::WHITE, &mut target)
                .unwrap();
        }
        assert_eq!(data, original);
    }

    #[test]
    fn non_empty_path_becomes_pending_work() {
        let mut builder = SceneBuilder::new();
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        path.line_to(Point::new(10.0, 10.0));
        path.close();
        builder.submit_path(path, Color::rgb(255, 0, 0), FillRule::NonZero);
        assert_eq!(builder.pending_count(), 1);
    }
}
