//! Adaptive filler switch: chooses between the 16x16-tile compute pipeline and the sparse
//! 4x4-tile strip fallback, based on estimated segment count and canvas area. This module only
//! makes the choice; the sparse-strip filler itself is an out-of-core collaborator.

use crate::config::{ADAPTIVE_AREA_THRESHOLD, ADAPTIVE_SEGMENT_THRESHOLD, SPARSE_TILE_SIZE, TILE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillerKind {
    /// The compute pipeline, tiled 16x16.
    Compute,
    /// The sparse-strip fallback, tiled 4x4.
    SparseStrip,
}

impl FillerKind {
    pub fn tile_size(self) -> u32 {
        match self {
            FillerKind::Compute => TILE_SIZE,
            FillerKind::SparseStrip => SPARSE_TILE_SIZE,
        }
    }
}

/// Estimates the number of line-soup segments a path's element count will flatten to.
pub fn estimate_segments(element_count: usize) -> usize {
    element_count.saturating_mul(3)
}

/// Chooses the filler for a frame given the total submitted element count and canvas dimensions.
///
/// The compute path is chosen iff `estimated_segments > 10_000 AND canvas_area > 2_000_000`.
pub fn choose_filler(element_count: usize, canvas_width: u32, canvas_height: u32) -> FillerKind {
    let estimated_segments = estimate_segments(element_count);
    let canvas_area = canvas_width as u64 * canvas_height as u64;

    if estimated_segments > ADAPTIVE_SEGMENT_THRESHOLD && canvas_area > ADAPTIVE_AREA_THRESHOLD {
        FillerKind::Compute
    } else {
        FillerKind::SparseStrip
    }
}
