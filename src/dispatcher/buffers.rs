//! Owns the buffers the nine compute pipelines read and write, pooling them across frames rather
//! than reallocating: a buffer is only recreated when the frame's requirement outgrows it, the
//! same reuse-if-large-enough discipline `renderer/types.rs`'s `decide_buffer_sizing` applies to
//! the rasterizer's vertex/index buffers.

use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages, Device};

use crate::gpu_data::{BumpAlloc, DrawMonoid, LineGpu, PathRecord, Segment, VelloComputeConfig};
use crate::linesoup::LineSoup;
use crate::paths_meta::PathMetadata;
use crate::scene::PackedScene;

const WG_SIZE: u64 = 256;

fn workgroup_count(n: u32) -> u32 {
    (n as u64).div_ceil(WG_SIZE).max(1) as u32
}

/// Mirrors `renderer::types::decide_buffer_sizing`: a buffer is reallocated only when too small,
/// never shrunk, so a pooled buffer's capacity only ever grows across frames.
fn decide_buffer_sizing(existing_size: Option<u64>, required_size: u64) -> bool {
    existing_size.map(|size| size < required_size).unwrap_or(true)
}

#[derive(Default)]
struct Slot {
    buffer: Option<Buffer>,
}

impl Slot {
    fn upload(&mut self, device: &Device, label: &str, bytes: &[u8], usage: BufferUsages) -> Buffer {
        let bytes = if bytes.is_empty() { &[0u8; 4] } else { bytes };
        let needed = bytes.len() as u64;
        if decide_buffer_sizing(self.buffer.as_ref().map(|b| b.size()), needed) {
            self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage,
            }));
        }
        self.buffer.clone().expect("just populated above")
    }

    /// Like [`Self::upload`] but zero-fills instead of copying caller data, for buffers the
    /// `prepare` compute pass clears GPU-side rather than the CPU writing zeros into them.
    fn reserve(&mut self, device: &Device, label: &str, size: u64, usage: BufferUsages) -> Buffer {
        let size = size.max(4);
        if decide_buffer_sizing(self.buffer.as_ref().map(|b| b.size()), size) {
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            }));
        }
        self.buffer.clone().expect("just populated above")
    }
}

/// Buffers pooled across frames. A fresh [`ComputeDispatcher`](crate::dispatcher::ComputeDispatcher)
/// starts with every slot empty; the first `render` call populates all of them.
#[derive(Default)]
pub(super) struct PooledBuffers {
    config: Slot,
    path_tag_counts: Slot,
    reduced_pathtag: Slot,
    path_tag_offsets: Slot,
    reduced_draw: Slot,
    draw_monoids: Slot,
    scene: Slot,
    paths: Slot,
    path_styles: Slot,
    lines: Slot,
    path_line_offsets: Slot,
    tile_backdrop: Slot,
    tile_seg_count: Slot,
    segments: Slot,
    ptcl: Slot,
    bump: Slot,
    output: Slot,
    output_staging: Slot,
}

/// One frame's fully-populated buffer set, plus the dispatch counts `passes::encode_all` needs to
/// size each stage's workgroup grid.
pub(super) struct FrameBuffers {
    pub config: Buffer,
    pub path_tag_counts: Buffer,
    pub reduced_pathtag: Buffer,
    pub path_tag_offsets: Buffer,
    pub reduced_draw: Buffer,
    pub draw_monoids: Buffer,
    pub scene: Buffer,
    pub paths: Buffer,
    pub path_styles: Buffer,
    pub lines: Buffer,
    pub path_line_offsets: Buffer,
    pub tile_backdrop: Buffer,
    pub tile_seg_count: Buffer,
    pub segments: Buffer,
    pub ptcl: Buffer,
    pub bump: Buffer,
    pub output: Buffer,
    pub output_staging: Buffer,

    pub num_paths: u32,
    pub num_draw_obj: u32,
    pub num_lines: u32,
    pub total_tiles: u64,
    pub total_path_tiles: u64,
    pub max_path_height_tiles: u32,
    pub output_bytes: u64,
}

const STORAGE_RW: BufferUsages = BufferUsages::STORAGE.union(BufferUsages::COPY_DST);
const STORAGE_RO: BufferUsages =
    BufferUsages::STORAGE.union(BufferUsages::COPY_DST).union(BufferUsages::COPY_SRC);

impl PooledBuffers {
    /// Allocates or resizes every buffer this frame needs and uploads CPU-prepared data into the
    /// read-only ones. Buffers the `prepare` compute pass clears (the Tiles arrays and
    /// `BumpAlloc`) are reserved at this frame's required capacity but left with whatever bytes
    /// they held before; `prepare` is always the first pass `passes::encode_all` dispatches.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn prepare_frame(
        &mut self,
        device: &Device,
        config: &VelloComputeConfig,
        metadata: &PathMetadata,
        path_tag_counts: &[u32],
        line_soup: &LineSoup,
        scene: &PackedScene,
        total_tiles: u64,
        max_tiles_per_line: usize,
        ptcl_max_per_tile: usize,
    ) -> Result<FrameBuffers, String> {
        let num_paths = metadata.records.len() as u32;
        let max_path_height_tiles = metadata
            .records
            .iter()
            .map(|r| r.height_tiles().max(0) as u32)
            .max()
            .unwrap_or(0);
        let num_draw_obj = scene.layout.num_draw_objects;
        let num_lines = line_soup.lines.len() as u32;
        let total_path_tiles = metadata.total_path_tiles.max(1) as u64;

        let config_buf = self.config.upload(
            device,
            "vello-compute config",
            bytemuck::bytes_of(config),
            BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        );

        let path_tag_counts_buf = self.path_tag_counts.upload(
            device,
            "path_tag_counts",
            bytemuck::cast_slice(path_tag_counts),
            STORAGE_RO,
        );
        let reduced_pathtag_buf = self.reduced_pathtag.reserve(
            device,
            "reduced_pathtag",
            workgroup_count(num_paths) as u64 * 4,
            STORAGE_RW,
        );
        let path_tag_offsets_buf = self.path_tag_offsets.reserve(
            device,
            "path_tag_offsets",
            num_paths.max(1) as u64 * 4,
            STORAGE_RW,
        );
        let reduced_draw_buf = self.reduced_draw.reserve(
            device,
            "reduced_draw",
            workgroup_count(num_draw_obj) as u64 * 4,
            STORAGE_RW,
        );
        let draw_monoids_buf = self.draw_monoids.reserve(
            device,
            "draw_monoids",
            num_draw_obj.max(1) as u64 * std::mem::size_of::<DrawMonoid>() as u64,
            STORAGE_RW,
        );

        let scene_buf = self
            .scene
            .upload(device, "scene", &scene.data, STORAGE_RO);
        let paths_buf = self.paths.upload(
            device,
            "paths",
            bytemuck::cast_slice(&metadata.records),
            STORAGE_RO,
        );
        let path_styles_buf = self.path_styles.upload(
            device,
            "path_styles",
            bytemuck::cast_slice(&metadata.styles),
            STORAGE_RO,
        );
        let lines_buf = self.lines.upload(
            device,
            "lines",
            bytemuck::cast_slice(&line_soup.lines),
            STORAGE_RO,
        );
        let path_line_offsets_buf = self.path_line_offsets.upload(
            device,
            "path_line_offsets",
            bytemuck::cast_slice(&line_soup.path_line_offsets),
            STORAGE_RO,
        );

        let tile_backdrop_buf = self.tile_backdrop.reserve(
            device,
            "tile_backdrop",
            total_path_tiles * 4,
            STORAGE_RW,
        );
        let tile_seg_count_buf = self.tile_seg_count.reserve(
            device,
            "tile_seg_count",
            total_path_tiles * 4,
            STORAGE_RW,
        );

        let segments_capacity = (num_lines.max(1) as u64) * (max_tiles_per_line as u64);
        let segments_buf = self.segments.reserve(
            device,
            "segments",
            segments_capacity * std::mem::size_of::<Segment>() as u64,
            STORAGE_RW,
        );

        let ptcl_buf = self.ptcl.reserve(
            device,
            "ptcl",
            total_tiles * ptcl_max_per_tile as u64 * 4,
            STORAGE_RW,
        );

        let bump_buf = self.bump.reserve(
            device,
            "bump",
            std::mem::size_of::<BumpAlloc>() as u64,
            STORAGE_RW,
        );

        let output_bytes = (config.target_width as u64) * (config.target_height as u64) * 4;
        let output_buf = self.output.reserve(
            device,
            "output",
            output_bytes,
            BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST,
        );
        let output_staging_buf = self.output_staging.reserve(
            device,
            "output staging",
            output_bytes,
            BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        );

        Ok(FrameBuffers {
            config: config_buf,
            path_tag_counts: path_tag_counts_buf,
            reduced_pathtag: reduced_pathtag_buf,
            path_tag_offsets: path_tag_offsets_buf,
            reduced_draw: reduced_draw_buf,
            draw_monoids: draw_monoids_buf,
            scene: scene_buf,
            paths: paths_buf,
            path_styles: path_styles_buf,
            lines: lines_buf,
            path_line_offsets: path_line_offsets_buf,
            tile_backdrop: tile_backdrop_buf,
            tile_seg_count: tile_seg_count_buf,
            segments: segments_buf,
            ptcl: ptcl_buf,
            bump: bump_buf,
            output: output_buf,
            output_staging: output_staging_buf,
            num_paths,
            num_draw_obj,
            num_lines,
            total_tiles,
            total_path_tiles,
            max_path_height_tiles,
            output_bytes,
        })
    }
}
