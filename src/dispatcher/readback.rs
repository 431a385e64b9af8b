//! Maps pooled storage buffers back to the CPU after a dispatch, grounded on the same
//! mpsc-channel-plus-`map_async` pattern `renderer::readback::map_readback_buffer_into` uses for
//! the render pipeline's own frame and ARGB readbacks.
//!
//! Unlike that pipeline's texture-to-buffer copies, these buffers are already linear storage
//! buffers, so no per-row padding stripping is needed: a plain `copy_buffer_to_buffer` into a
//! `MAP_READ` staging buffer is byte-for-byte what the caller wants.

use std::time::Duration;

use wgpu::{Buffer, Device, Queue};

use crate::error::RasterError;
use crate::gpu_data::BumpAlloc;

fn map_and_copy(
    device: &Device,
    buffer: &Buffer,
    len: u64,
    timeout: Duration,
) -> Result<Vec<u8>, RasterError> {
    let slice = buffer.slice(..len);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        if sender.send(result).is_err() {
            log::warn!("failed to send map_async result from readback callback");
        }
    });

    let _ = device.poll(wgpu::MaintainBase::Wait);

    let map_result = receiver
        .recv_timeout(timeout)
        .map_err(|_| RasterError::Timeout(timeout))?;
    map_result.map_err(|e| RasterError::ResourceExhausted(format!("buffer map failed: {e:?}")))?;

    let mapped = slice.get_mapped_range();
    let bytes = mapped.to_vec();
    drop(mapped);
    buffer.unmap();
    Ok(bytes)
}

/// Copies the `output` storage buffer into a mappable staging buffer and reads it back as
/// premultiplied RGBA bytes, row-major, `width * height * 4` bytes.
pub(super) fn read_output(
    device: &Device,
    queue: &Queue,
    output: &Buffer,
    staging: &Buffer,
    width: u32,
    height: u32,
    timeout: Duration,
) -> Result<Vec<u8>, RasterError> {
    let len = (width as u64) * (height as u64) * 4;

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("output readback copy"),
    });
    encoder.copy_buffer_to_buffer(output, 0, staging, 0, len);
    queue.submit(std::iter::once(encoder.finish()));

    map_and_copy(device, staging, len, timeout)
}

/// Reads back the frame's `BumpAlloc` scratch counters for diagnostics. Uses `output`'s own
/// staging buffer convention but with its own small mappable copy, since `BumpAlloc` is tiny and
/// read every frame regardless of canvas size.
pub(super) fn read_bump_alloc(
    device: &Device,
    queue: &Queue,
    bump: &Buffer,
    timeout: Duration,
) -> Result<BumpAlloc, RasterError> {
    let len = std::mem::size_of::<BumpAlloc>() as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("bump readback staging"),
        size: len,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("bump readback copy"),
    });
    encoder.copy_buffer_to_buffer(bump, 0, &staging, 0, len);
    queue.submit(std::iter::once(encoder.finish()));

    let bytes = map_and_copy(device, &staging, len, timeout)?;
    Ok(*bytemuck::from_bytes::<BumpAlloc>(&bytes))
}
