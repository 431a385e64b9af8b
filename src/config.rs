//! Compile-time engine constants.
//!
//! These are design constants rather than tunables: capacities are chosen so worst-case
//! dispatches still fit device storage limits, per the bump-allocation discipline in the
//! compute dispatcher.

use std::time::Duration;

/// Side length, in pixels, of a tile under the compute (dense) filler.
pub const TILE_SIZE: u32 = 16;

/// Side length, in pixels, of a strip under the sparse-strip fallback filler.
pub const SPARSE_TILE_SIZE: u32 = 4;

/// Fixed PTCL capacity per global tile, in words.
pub const PTCL_MAX_PER_TILE: usize = 64;

/// The constant draw tag for a colored fill (the only draw kind this pipeline supports).
pub const DRAW_TAG_COLOR_FILL: u32 = 0x44;

/// Default flattener tolerance, in pixels (max perpendicular error).
pub const DEFAULT_FLATTEN_TOLERANCE: f32 = 0.25;

/// Default fence-wait timeout for GPU readback.
pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_secs(3);

/// Estimated-segment threshold above which the adaptive filler prefers the compute path.
pub const ADAPTIVE_SEGMENT_THRESHOLD: usize = 10_000;

/// Canvas-area threshold (in pixels²) above which the adaptive filler prefers the compute path.
pub const ADAPTIVE_AREA_THRESHOLD: u64 = 2_000_000;

/// Conservative per-line multiplier used to size the worst-case `Segments` buffer when a
/// post-`path_count` readback isn't available: a line can cross at most this many tile rows or
/// columns before its bounding tile range is exhausted.
pub const MAX_TILES_PER_LINE: usize = 64;
