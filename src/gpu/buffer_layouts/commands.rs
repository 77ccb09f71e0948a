//! Indirect command buffer layout definitions
//!
//! Defines GPU buffer structures for indirect drawing and compute dispatch.

use bytemuck::{Pod, Zeroable};

/// GPU indirect draw indexed command structure
/// Matches wgpu's DrawIndexedIndirect command layout exactly
/// Total size: 20 bytes
///
/// The mesh database supplies one of these per mesh as an immutable template.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct IndirectDrawIndexedCommand {
    /// Number of indices to draw
    pub index_count: u32,

    /// Number of instances to draw
    pub instance_count: u32,

    /// First index in the index buffer
    pub first_index: u32,

    /// Value added to each index
    pub base_vertex: i32,

    /// First instance index
    pub first_instance: u32,
}

impl IndirectDrawIndexedCommand {
    /// Template for a mesh occupying `index_count` indices from `first_index`
    pub fn template(index_count: u32, first_index: u32, base_vertex: i32) -> Self {
        Self {
            index_count,
            instance_count: 0,
            first_index,
            base_vertex,
            first_instance: 0,
        }
    }

    /// Concrete draw for `instance_count` instances starting at `first_instance`
    pub fn with_instances(self, first_instance: u32, instance_count: u32) -> Self {
        Self {
            first_instance,
            instance_count,
            ..self
        }
    }
}

/// Compute dispatch arguments read by `dispatch_workgroups_indirect`
/// Total size: 16 bytes
///
/// The first three words are the dispatch arguments; `work_items` records the
/// exact number of threads that carry work so tail threads can be rejected.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DispatchIndirectCommand {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub work_items: u32,
}

impl DispatchIndirectCommand {
    /// Total number of threads launched for a work group size
    #[inline]
    pub fn launched_threads(&self, workgroup_size: u32) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64 * workgroup_size as u64
    }
}
