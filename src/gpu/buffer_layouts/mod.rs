//! Centralized GPU buffer layout definitions
//!
//! This module provides a single source of truth for all GPU buffer layouts,
//! sizes and binding indices used by the processor stages.

pub mod camera;
pub mod commands;
pub mod compute;
pub mod instance;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use crate::constants::buffer_layouts::*;
pub use camera::FrameUniforms;
pub use commands::{DispatchIndirectCommand, IndirectDrawIndexedCommand};
pub use compute::{CountHeader, CountRow, LayoutUniforms};
pub use instance::{InputObject, LodRecord, OutputAttribute, OutputAttributeLayout};

/// Buffer binding indices for consistency across the stage kernels
pub mod bindings {
    /// Clear stage
    pub mod clear {
        pub const LAYOUT: u32 = 0;
        pub const COUNT_DATA: u32 = 1;
        pub const DISPATCH: u32 = 2;
    }

    /// LOD stage
    pub mod lod {
        pub const LAYOUT: u32 = 0;
        pub const FRAME: u32 = 1;
        pub const INPUT_DATA: u32 = 2;
        pub const COUNT_DATA: u32 = 3;
        pub const LOD_DATA: u32 = 4;
        pub const HIZ: u32 = 5;
    }

    /// Rearrange stage; templates occupy five consecutive bindings in category order
    pub mod rearrange {
        pub const LAYOUT: u32 = 0;
        pub const COUNT_DATA: u32 = 1;
        pub const DISPATCH: u32 = 2;
        pub const FIRST_TEMPLATE: u32 = 3;
        pub const DRAW_ARGS: u32 = 8;
    }

    /// Gather stage; outputs occupy five consecutive bindings in category order
    pub mod gather {
        pub const LAYOUT: u32 = 0;
        pub const COUNT_DATA: u32 = 1;
        pub const LOD_DATA: u32 = 2;
        pub const INPUT_DATA: u32 = 3;
        pub const FIRST_OUTPUT: u32 = 4;
    }
}

/// Helper functions for buffer calculations
pub mod calculations {
    use super::*;

    /// Size of the counter channel for `max_sub` rows
    #[inline]
    pub fn count_data_size(max_sub: u32) -> u64 {
        COUNT_HEADER_SIZE + max_sub.max(1) as u64 * COUNT_ROW_SIZE
    }

    /// Size of the input channel
    #[inline]
    pub fn input_buffer_size(capacity: u32) -> u64 {
        capacity.max(1) as u64 * INPUT_OBJECT_SIZE
    }

    /// Size of the LOD channel
    #[inline]
    pub fn lod_buffer_size(records: u32) -> u64 {
        records.max(1) as u64 * LOD_RECORD_SIZE
    }

    /// Size of a per-category output channel
    #[inline]
    pub fn output_buffer_size(capacity: u32) -> u64 {
        capacity.max(1) as u64 * OUTPUT_ATTRIBUTE_SIZE
    }

    /// Size of a template buffer holding `count` indexed draw commands
    #[inline]
    pub fn template_buffer_size(count: u32) -> u64 {
        count.max(1) as u64 * INDIRECT_INDEXED_COMMAND_SIZE
    }

    /// Size of the draw argument channel covering `meshes` templates
    #[inline]
    pub fn draw_args_size(meshes: u32) -> u64 {
        meshes.max(1) as u64 * INDIRECT_INDEXED_COMMAND_SIZE
    }

    /// Align size to GPU requirements
    #[inline]
    pub fn align_buffer_size(size: u64, alignment: u64) -> u64 {
        (size + alignment - 1) & !(alignment - 1)
    }
}

/// Buffer usage patterns for optimization
pub mod usage {
    use wgpu::BufferUsages;

    /// Standard storage buffer usage
    pub const STORAGE: BufferUsages = BufferUsages::STORAGE.union(BufferUsages::COPY_DST);

    /// Storage buffer with readback capability
    pub const STORAGE_READ: BufferUsages = STORAGE.union(BufferUsages::COPY_SRC);

    /// Uniform buffer usage
    pub const UNIFORM: BufferUsages = BufferUsages::UNIFORM.union(BufferUsages::COPY_DST);

    /// Indirect argument buffer written by a compute stage
    pub const INDIRECT: BufferUsages = BufferUsages::INDIRECT
        .union(BufferUsages::STORAGE)
        .union(BufferUsages::COPY_DST)
        .union(BufferUsages::COPY_SRC);

    /// Per-instance attribute buffer written by a compute stage
    pub const ATTRIBUTE: BufferUsages = BufferUsages::VERTEX
        .union(BufferUsages::STORAGE)
        .union(BufferUsages::COPY_SRC);

    /// Staging buffer for diagnostic readback
    pub const READBACK: BufferUsages = BufferUsages::MAP_READ.union(BufferUsages::COPY_DST);
}

/// Bind group layout descriptors
pub mod layouts {
    use wgpu::{BindGroupLayoutEntry, BindingType, BufferBindingType, ShaderStages};

    /// Create a storage buffer binding entry
    pub fn storage_buffer_entry(binding: u32, read_only: bool) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    /// Create a uniform buffer binding entry
    pub fn uniform_buffer_entry(binding: u32) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    /// Create an unfilterable 2D float texture entry (Hi-Z pyramid, read with textureLoad)
    pub fn depth_pyramid_entry(binding: u32) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }
    }
}
