//! # vello-compute-raster
//!
//! A GPU-accelerated 2D vector rasterizer built around a nine-stage `wgpu` compute pipeline.
//! Callers submit paths with a paint (straight-alpha color, fill rule); the engine flattens
//! curves into line segments, packs a frame's paths into a compact scene encoding, and dispatches
//! the compute pipeline to produce anti-aliased premultiplied-RGBA pixels, which it then
//! composites over a caller-owned target buffer using Porter-Duff source-over.
//!
//! ## Layers
//!
//! - [`geometry`] / [`flatten`] — the caller-facing path grammar and the flattener that turns it
//!   into a [`flatten::PathDef`] line soup.
//! - [`linesoup`] / [`scene`] / [`paths_meta`] — CPU-side encoding: the flat GPU line array, the
//!   packed six-section scene buffer, and per-path tile-space bounding boxes.
//! - [`dispatcher`] — owns the device, the nine compiled compute pipelines, and the buffers
//!   pooled across frames; [`dispatcher::ComputeDispatcher::render`] is the synchronous
//!   entry point for a single frame.
//! - [`accelerator`] — the process-wide, mutex-guarded handle most callers should hold instead of
//!   a bare `ComputeDispatcher`.
//! - [`composite`] / [`scene_builder`] — compositing a rendered frame over a caller's target
//!   buffer, and a small per-frame pending-path accumulator built on top of that.
//! - [`adaptive`] — the filler-selection heuristic (this compute path vs. a sparse-strip
//!   fallback) based on estimated segment count and canvas area.
//!
//! ## Getting started
//!
//! ```rust,no_run
//! use futures::executor::block_on;
//! use vello_compute_raster::{Accelerator, Color, FillRule, Path, PathInput, Point, TargetBuffer};
//!
//! let accelerator = block_on(Accelerator::new());
//!
//! let mut path = Path::new();
//! path.move_to(Point::new(50.0, 50.0));
//! path.line_to(Point::new(150.0, 50.0));
//! path.line_to(Point::new(150.0, 150.0));
//! path.line_to(Point::new(50.0, 150.0));
//! path.close();
//!
//! let inputs = [PathInput {
//!     path,
//!     color: Color::rgb(255, 0, 0),
//!     fill_rule: FillRule::NonZero,
//! }];
//!
//! let mut target_pixels = vec![255u8; 200 * 200 * 4];
//! let mut target = TargetBuffer::new(200, 200, 200 * 4, &mut target_pixels);
//! accelerator
//!     .render_onto(Color::WHITE, &inputs, &mut target)
//!     .expect("rasterization to succeed");
//! ```

pub mod accelerator;
pub mod adaptive;
pub mod color;
pub mod composite;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod flatten;
pub mod geometry;
pub mod gpu_data;
pub mod linesoup;
pub mod paths_meta;
pub mod scene;
pub mod scene_builder;

pub use accelerator::Accelerator;
pub use adaptive::{choose_filler, estimate_segments, FillerKind};
pub use color::Color;
pub use composite::{composite_source_over, TargetBuffer};
pub use config::{
    ADAPTIVE_AREA_THRESHOLD, ADAPTIVE_SEGMENT_THRESHOLD, DEFAULT_FENCE_TIMEOUT,
    DEFAULT_FLATTEN_TOLERANCE, PTCL_MAX_PER_TILE, SPARSE_TILE_SIZE, TILE_SIZE,
};
pub use dispatcher::{ComputeDispatcher, Diagnostics, FillerKindSnapshot, Image, PathInput};
pub use error::RasterError;
pub use flatten::{flatten_path, flatten_path_default, PathDef};
pub use geometry::{is_convex, FillRule, Path, PathElement, Point, Point32};
pub use scene_builder::SceneBuilder;

pub use wgpu;
