//! Encodes the nine compute passes into a single command encoder, in dispatch order.
//!
//! `prepare` runs first despite being stage 9 in the stage table: its job is clearing this
//! frame's slice of the pooled Tiles arrays, which must happen before `path_count` starts
//! accumulating into them.

use wgpu::{CommandEncoder, ComputePassDescriptor, Device};

use super::buffers::FrameBuffers;
use super::pipelines::Pipelines;
use crate::gpu_data::VelloComputeConfig;

const WG_SIZE: u64 = 256;

fn dispatch_count(n: u64, wg: u64) -> u32 {
    n.div_ceil(wg).max(1) as u32
}

fn bind_group(
    device: &Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    buffers: &[&wgpu::Buffer],
) -> wgpu::BindGroup {
    let entries: Vec<wgpu::BindGroupEntry> = buffers
        .iter()
        .enumerate()
        .map(|(i, b)| wgpu::BindGroupEntry {
            binding: i as u32,
            resource: b.as_entire_binding(),
        })
        .collect();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    })
}

pub(super) fn encode_all(
    encoder: &mut CommandEncoder,
    device: &Device,
    pipelines: &Pipelines,
    frame: &FrameBuffers,
    _config: &VelloComputeConfig,
    total_tiles: u64,
) {
    let prepare_bg = bind_group(
        device,
        &pipelines.prepare_bgl,
        "prepare bind group",
        &[&frame.config, &frame.tile_backdrop, &frame.tile_seg_count, &frame.bump],
    );
    let pathtag_reduce_bg = bind_group(
        device,
        &pipelines.pathtag_reduce_bgl,
        "pathtag_reduce bind group",
        &[&frame.config, &frame.path_tag_counts, &frame.reduced_pathtag],
    );
    let pathtag_scan_bg = bind_group(
        device,
        &pipelines.pathtag_scan_bgl,
        "pathtag_scan bind group",
        &[
            &frame.config,
            &frame.path_tag_counts,
            &frame.reduced_pathtag,
            &frame.path_tag_offsets,
        ],
    );
    let draw_reduce_bg = bind_group(
        device,
        &pipelines.draw_reduce_bgl,
        "draw_reduce bind group",
        &[&frame.config, &frame.reduced_draw],
    );
    let draw_leaf_bg = bind_group(
        device,
        &pipelines.draw_leaf_bgl,
        "draw_leaf bind group",
        &[&frame.config, &frame.reduced_draw, &frame.draw_monoids],
    );
    let path_count_bg = bind_group(
        device,
        &pipelines.path_count_bgl,
        "path_count bind group",
        &[
            &frame.config,
            &frame.lines,
            &frame.paths,
            &frame.tile_backdrop,
            &frame.tile_seg_count,
            &frame.bump,
        ],
    );
    let backdrop_bg = bind_group(
        device,
        &pipelines.backdrop_bgl,
        "backdrop bind group",
        &[&frame.config, &frame.paths, &frame.tile_backdrop],
    );
    let coarse_bg = bind_group(
        device,
        &pipelines.coarse_bgl,
        "coarse bind group",
        &[
            &frame.config,
            &frame.paths,
            &frame.path_styles,
            &frame.scene,
            &frame.tile_backdrop,
            &frame.tile_seg_count,
            &frame.lines,
            &frame.path_line_offsets,
            &frame.segments,
            &frame.ptcl,
            &frame.bump,
        ],
    );
    let fine_bg = bind_group(
        device,
        &pipelines.fine_bgl,
        "fine bind group",
        &[&frame.config, &frame.ptcl, &frame.segments, &frame.output],
    );

    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("prepare"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.prepare);
        pass.set_bind_group(0, &prepare_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(frame.total_path_tiles, WG_SIZE), 1, 1);
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("pathtag_reduce"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.pathtag_reduce);
        pass.set_bind_group(0, &pathtag_reduce_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(frame.num_paths as u64, WG_SIZE), 1, 1);
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("pathtag_scan"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.pathtag_scan);
        pass.set_bind_group(0, &pathtag_scan_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(frame.num_paths as u64, WG_SIZE), 1, 1);
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("draw_reduce"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.draw_reduce);
        pass.set_bind_group(0, &draw_reduce_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(frame.num_draw_obj as u64, WG_SIZE), 1, 1);
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("draw_leaf"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.draw_leaf);
        pass.set_bind_group(0, &draw_leaf_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(frame.num_draw_obj as u64, WG_SIZE), 1, 1);
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("path_count"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.path_count);
        pass.set_bind_group(0, &path_count_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(frame.num_lines as u64, WG_SIZE), 1, 1);
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("backdrop"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.backdrop);
        pass.set_bind_group(0, &backdrop_bg, &[]);
        pass.dispatch_workgroups(
            dispatch_count(frame.num_paths as u64, 64),
            frame.max_path_height_tiles.max(1),
            1,
        );
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("coarse"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.coarse);
        pass.set_bind_group(0, &coarse_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(total_tiles, 64), 1, 1);
    }
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("fine"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.fine);
        pass.set_bind_group(0, &fine_bg, &[]);
        pass.dispatch_workgroups(dispatch_count(total_tiles, 64), 1, 1);
    }
}
