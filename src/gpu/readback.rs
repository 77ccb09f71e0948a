//! Diagnostic GPU readback
//!
//! Copies a buffer range into a staging buffer and maps it. Never used on the
//! per-frame path; status reports and tests only.

use crate::error::{buffer_mapping_error, GatherResult};
use crate::gpu::buffer_layouts::usage;
use bytemuck::Pod;

/// Read `count` records of `T` from the start of `source`
pub async fn read_records<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    count: usize,
    label: &str,
) -> GatherResult<Vec<T>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let size = (std::mem::size_of::<T>() * count) as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{} Staging", label)),
        size,
        usage: usage::READBACK,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some(&format!("{} Readback Encoder", label)),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(Some(encoder.finish()));

    let buffer_slice = staging.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        sender.send(result).ok();
    });
    device.poll(wgpu::Maintain::Wait);

    receiver
        .await
        .map_err(|_| buffer_mapping_error(label))?
        .map_err(|_| buffer_mapping_error(label))?;

    let data = buffer_slice.get_mapped_range();
    let records = bytemuck::cast_slice::<u8, T>(&data).to_vec();

    drop(data);
    staging.unmap();

    log::trace!("[readback::read_records] Read {} records from {}", count, label);
    Ok(records)
}
