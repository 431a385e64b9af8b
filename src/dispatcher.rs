//! The GPU compute dispatcher: owns the device, the nine compute pipelines, and the pooled
//! buffers they share across frames, and orchestrates a full render as the nine-stage dispatch
//! sequence the compute-stage contract describes.

use std::sync::Arc;
use std::time::Instant;

use wgpu::{Device, InstanceDescriptor, Queue};

use crate::adaptive::{choose_filler, FillerKind};
use crate::color::Color;
use crate::config::{DEFAULT_FENCE_TIMEOUT, MAX_TILES_PER_LINE, PTCL_MAX_PER_TILE, TILE_SIZE};
use crate::device::DeviceState;
use crate::error::RasterError;
use crate::flatten::{flatten_path_default, PathDef};
use crate::geometry::{FillRule, Path, PathElement};
use crate::gpu_data::{BumpAlloc, VelloComputeConfig};
use crate::linesoup::build_line_soup;
use crate::paths_meta::build_path_metadata;
use crate::scene::pack_scene;

mod buffers;
mod passes;
mod pipelines;
mod readback;

use buffers::PooledBuffers;
use pipelines::Pipelines;

/// A rendered frame: premultiplied RGBA bytes, row-major, 4 bytes per pixel, no padding.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Non-fatal, informational readout of a frame's internal counters. Never affects the rendered
/// pixels; purely diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    pub bump_alloc: BumpAllocSnapshot,
    pub total_path_tiles: u32,
    pub num_lines: u32,
    pub filler: Option<FillerKindSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BumpAllocSnapshot {
    pub seg_counts: u32,
    pub segments_allocated: u32,
    pub ptcl_overflow_count: u32,
}

impl From<BumpAlloc> for BumpAllocSnapshot {
    fn from(b: BumpAlloc) -> Self {
        Self {
            seg_counts: b.seg_counts,
            segments_allocated: b.segments_allocated,
            ptcl_overflow_count: b.ptcl_overflow_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillerKindSnapshot {
    Compute,
    SparseStrip,
}

impl From<FillerKind> for FillerKindSnapshot {
    fn from(f: FillerKind) -> Self {
        match f {
            FillerKind::Compute => FillerKindSnapshot::Compute,
            FillerKind::SparseStrip => FillerKindSnapshot::SparseStrip,
        }
    }
}

/// One path's fill as the dispatcher's public API takes it: the path geometry, its paint, and
/// its fill rule.
pub struct PathInput {
    pub path: Path,
    pub color: Color,
    pub fill_rule: FillRule,
}

/// Owns the device/queue, the compiled compute pipelines, and the buffers pooled across frames.
/// Not `Sync` on its own; the concurrency model wraps it in a single process-wide mutex (see
/// [`crate::accelerator::Accelerator`]).
pub struct ComputeDispatcher {
    state: DeviceState,
    pipelines: Option<Pipelines>,
    buffers: PooledBuffers,
    last_diagnostics: Option<Diagnostics>,
}

impl ComputeDispatcher {
    /// Creates a dispatcher with its own headless GPU device. Returns `None` if no suitable
    /// adapter is available, so callers (tests especially) can skip gracefully instead of
    /// panicking in GPU-less environments.
    pub async fn try_new() -> Option<Self> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vello-compute-raster device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .ok()?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);
        let pipelines = Pipelines::build(&device);

        let mut state = DeviceState::default();
        state.set_owned(device, queue);

        Some(Self {
            state,
            pipelines: Some(pipelines),
            buffers: PooledBuffers::default(),
            last_diagnostics: None,
        })
    }

    /// Creates a dispatcher with its own headless GPU device, panicking if none is available.
    pub async fn new() -> Self {
        Self::try_new()
            .await
            .expect("no suitable GPU adapter available for compute rasterization")
    }

    /// Adopts an externally-owned device/queue pair rather than creating one, per the shared
    /// device-provider contract: the dispatcher never destroys a device it did not create.
    pub fn adopt_shared(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        let pipelines = Pipelines::build(&device);
        let mut state = DeviceState::default();
        state.adopt_shared(device, queue);
        Self {
            state,
            pipelines: Some(pipelines),
            buffers: PooledBuffers::default(),
            last_diagnostics: None,
        }
    }

    pub fn last_diagnostics(&self) -> Option<Diagnostics> {
        self.last_diagnostics
    }

    /// Renders `paths` onto a `width` x `height` canvas whose baseline is `bg_color`, returning
    /// premultiplied RGBA pixels.
    ///
    /// An empty `paths` list is a fast path: the device is never touched, and the result is
    /// simply `bg_color` repeated across the canvas.
    pub fn render(
        &mut self,
        width: u32,
        height: u32,
        bg_color: Color,
        paths: &[PathInput],
    ) -> Result<Image, RasterError> {
        if paths.is_empty() {
            let px = bg_color.premultiply_to_u32().to_le_bytes();
            let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);
            for _ in 0..(width as usize * height as usize) {
                pixels.extend_from_slice(&px);
            }
            self.last_diagnostics = Some(Diagnostics {
                filler: None,
                ..Default::default()
            });
            return Ok(Image {
                width,
                height,
                pixels,
            });
        }

        // `choose_filler` is the adaptive-dispatch heuristic an outer caller would consult to
        // pick between this compute pipeline and the sparse-strip fallback (out of this core's
        // scope); `ComputeDispatcher` only ever implements the compute path, so calling `render`
        // directly always runs it regardless of which filler the heuristic would have picked.
        // The choice is still recorded in the frame's diagnostics for callers that want to know.
        let element_count: usize = paths.iter().map(|p| p.path.elements.len()).sum();
        let filler = choose_filler(element_count, width, height);

        let (device, queue) = self
            .state
            .device_queue()
            .ok_or_else(|| RasterError::InvalidInput("no device available".to_string()))?;
        let pipelines = self
            .pipelines
            .as_ref()
            .expect("pipelines are built alongside the device");

        let defs: Vec<PathDef> = paths
            .iter()
            .map(|p| flatten_path_default(&p.path, p.color, p.fill_rule))
            .collect();
        let original_elements: Vec<Vec<PathElement>> =
            paths.iter().map(|p| p.path.elements.clone()).collect();

        let metadata = build_path_metadata(&defs, width, height, TILE_SIZE);
        let line_soup = build_line_soup(&defs);
        let scene = pack_scene(&defs, &original_elements);
        let path_tag_counts: Vec<u32> = original_elements
            .iter()
            .map(|elements| elements.len() as u32)
            .collect();

        let width_in_tiles = width.div_ceil(TILE_SIZE);
        let height_in_tiles = height.div_ceil(TILE_SIZE);
        let total_tiles = (width_in_tiles as u64) * (height_in_tiles as u64);

        let config = VelloComputeConfig {
            width_in_tiles,
            height_in_tiles,
            target_width: width,
            target_height: height,
            num_draw_obj: scene.layout.num_draw_objects,
            num_paths: scene.layout.num_paths,
            num_clips: scene.layout.num_clips,
            path_tag_base: scene.layout.path_tag_base,
            path_data_base: scene.layout.path_data_base,
            draw_tag_base: scene.layout.draw_tag_base,
            draw_data_base: scene.layout.draw_data_base,
            transform_base: scene.layout.transform_base,
            style_base: scene.layout.style_base,
            num_lines: line_soup.lines.len() as u32,
            bg_color: bg_color.premultiply_to_u32(),
        };

        let frame = self
            .buffers
            .prepare_frame(
                device,
                &config,
                &metadata,
                &path_tag_counts,
                &line_soup,
                &scene,
                total_tiles,
                MAX_TILES_PER_LINE,
                PTCL_MAX_PER_TILE,
            )
            .map_err(RasterError::ResourceExhausted)?;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("vello-compute-raster dispatch"),
        });
        passes::encode_all(&mut encoder, device, pipelines, &frame, &config, total_tiles);
        queue.submit(std::iter::once(encoder.finish()));

        let submitted_at = Instant::now();
        let pixels = readback::read_output(
            device,
            queue,
            &frame.output,
            &frame.output_staging,
            width,
            height,
            DEFAULT_FENCE_TIMEOUT,
        )?;
        let bump = readback::read_bump_alloc(device, queue, &frame.bump, DEFAULT_FENCE_TIMEOUT)?;
        log::debug!(
            "compute rasterization of {} paths ({}x{}) took {:?}",
            paths.len(),
            width,
            height,
            submitted_at.elapsed()
        );

        self.last_diagnostics = Some(Diagnostics {
            bump_alloc: bump.into(),
            total_path_tiles: metadata.total_path_tiles,
            num_lines: line_soup.lines.len() as u32,
            filler: Some(filler.into()),
        });

        Ok(Image {
            width,
            height,
            pixels,
        })
    }
}
