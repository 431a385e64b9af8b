//! Builds the nine compute pipelines once per device, concatenating `shaders/common.wgsl` onto
//! each stage's own source since WGSL has no `#include`.

use wgpu::{BindGroupLayout, ComputePipeline, Device};

const COMMON: &str = include_str!("../shaders/common.wgsl");

fn build_stage(
    device: &Device,
    label: &str,
    source: &str,
    entries: &[wgpu::BindGroupLayoutEntry],
) -> (ComputePipeline, BindGroupLayout) {
    let full_source = format!("{COMMON}\n{source}");
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(full_source.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries,
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    (pipeline, bind_group_layout)
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub struct Pipelines {
    pub pathtag_reduce: ComputePipeline,
    pub pathtag_reduce_bgl: BindGroupLayout,
    pub pathtag_scan: ComputePipeline,
    pub pathtag_scan_bgl: BindGroupLayout,
    pub draw_reduce: ComputePipeline,
    pub draw_reduce_bgl: BindGroupLayout,
    pub draw_leaf: ComputePipeline,
    pub draw_leaf_bgl: BindGroupLayout,
    pub prepare: ComputePipeline,
    pub prepare_bgl: BindGroupLayout,
    pub path_count: ComputePipeline,
    pub path_count_bgl: BindGroupLayout,
    pub backdrop: ComputePipeline,
    pub backdrop_bgl: BindGroupLayout,
    pub coarse: ComputePipeline,
    pub coarse_bgl: BindGroupLayout,
    pub fine: ComputePipeline,
    pub fine_bgl: BindGroupLayout,
}

impl Pipelines {
    pub fn build(device: &Device) -> Self {
        let (pathtag_reduce, pathtag_reduce_bgl) = build_stage(
            device,
            "pathtag_reduce",
            include_str!("../shaders/pathtag_reduce.wgsl"),
            &[uniform_entry(0), storage_entry(1, true), storage_entry(2, false)],
        );

        let (pathtag_scan, pathtag_scan_bgl) = build_stage(
            device,
            "pathtag_scan",
            include_str!("../shaders/pathtag_scan.wgsl"),
            &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
            ],
        );

        let (draw_reduce, draw_reduce_bgl) = build_stage(
            device,
            "draw_reduce",
            include_str!("../shaders/draw_reduce.wgsl"),
            &[uniform_entry(0), storage_entry(1, false)],
        );

        let (draw_leaf, draw_leaf_bgl) = build_stage(
            device,
            "draw_leaf",
            include_str!("../shaders/draw_leaf.wgsl"),
            &[uniform_entry(0), storage_entry(1, true), storage_entry(2, false)],
        );

        let (prepare, prepare_bgl) = build_stage(
            device,
            "prepare",
            include_str!("../shaders/prepare.wgsl"),
            &[
                uniform_entry(0),
                storage_entry(1, false),
                storage_entry(2, false),
                storage_entry(3, false),
            ],
        );

        let (path_count, path_count_bgl) = build_stage(
            device,
            "path_count",
            include_str!("../shaders/path_count.wgsl"),
            &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, false),
                storage_entry(5, false),
            ],
        );

        let (backdrop, backdrop_bgl) = build_stage(
            device,
            "backdrop",
            include_str!("../shaders/backdrop.wgsl"),
            &[uniform_entry(0), storage_entry(1, true), storage_entry(2, false)],
        );

        let (coarse, coarse_bgl) = build_stage(
            device,
            "coarse",
            include_str!("../shaders/coarse.wgsl"),
            &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, true),
                storage_entry(5, true),
                storage_entry(6, true),
                storage_entry(7, true),
                storage_entry(8, false),
                storage_entry(9, false),
                storage_entry(10, false),
            ],
        );

        let (fine, fine_bgl) = build_stage(
            device,
            "fine",
            include_str!("../shaders/fine.wgsl"),
            &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
            ],
        );

        Self {
            pathtag_reduce,
            pathtag_reduce_bgl,
            pathtag_scan,
            pathtag_scan_bgl,
            draw_reduce,
            draw_reduce_bgl,
            draw_leaf,
            draw_leaf_bgl,
            prepare,
            prepare_bgl,
            path_count,
            path_count_bgl,
            backdrop,
            backdrop_bgl,
            coarse,
            coarse_bgl,
            fine,
            fine_bgl,
        }
    }
}
