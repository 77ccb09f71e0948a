// Processor constants - single source of truth
//
// Shared by the host code and mirrored in the WGSL stage kernels
// (`renderer/gpu_driven/shaders/common.wgsl`). Change both together.

/// Category and counter layout
pub mod category {
    /// Number of rendering categories (normal, single, billboard, animated, transparent)
    pub const CATEGORY_COUNT: usize = 5;

    /// u32 lanes reserved per counter row; categories use the first five
    pub const COUNTER_LANES: usize = 8;

    /// Header lane that counts LOD writes rejected by the capacity check
    pub const OVERFLOW_LANE: usize = 5;

    /// Header lane of the gather base table holding the total work item count
    pub const TOTAL_LANE: usize = 5;
}

/// Compute dispatch constants
pub mod dispatch {
    /// Threads per work group for the LOD and Gather kernels
    pub const WORKGROUP_SIZE: u32 = 64;

    /// Threads per work group for the Clear and Rearrange kernels (one per counter lane)
    pub const ROW_WORKGROUP_SIZE: u32 = 8;

    /// Number of work groups needed to cover `items` threads
    #[inline]
    pub const fn workgroups_for(items: u32) -> u32 {
        (items + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE
    }
}

/// Fixed channel slots of the processor buffer set
pub mod channels {
    pub const CHANNEL_COUNT: usize = 15;

    pub const DISPATCH: usize = 0;
    pub const COUNT_DATA: usize = 1;
    pub const IND_NORMAL: usize = 2;
    pub const IND_SINGLE: usize = 3;
    pub const IND_BILLBOARD: usize = 4;
    pub const IND_ANIMATED: usize = 5;
    pub const IND_TRANSPARENT: usize = 6;
    pub const INPUT_DATA: usize = 7;
    pub const LOD_DATA: usize = 8;
    pub const OUTPUT_NORMAL: usize = 9;
    pub const OUTPUT_SINGLE: usize = 10;
    pub const OUTPUT_BILLBOARD: usize = 11;
    pub const OUTPUT_ANIMATED: usize = 12;
    pub const OUTPUT_TRANSPARENT: usize = 13;
    /// Per-mesh draw arguments written by Rearrange, category-major
    pub const DRAW_ARGS: usize = 14;
}

/// GPU record sizes in bytes
pub mod buffer_layouts {
    pub const INPUT_OBJECT_SIZE: u64 = 96;
    pub const LOD_RECORD_SIZE: u64 = 32;
    pub const OUTPUT_ATTRIBUTE_SIZE: u64 = 64;
    pub const DISPATCH_BLOCK_SIZE: u64 = 16;
    pub const COUNT_HEADER_SIZE: u64 = 64;
    pub const COUNT_ROW_SIZE: u64 = 64;
    pub const INDIRECT_INDEXED_COMMAND_SIZE: u64 = 20;
    pub const LAYOUT_UNIFORMS_SIZE: u64 = 144;
    pub const FRAME_UNIFORMS_SIZE: u64 = 304;
}

/// LOD selection
pub mod lod {
    /// Number of LOD levels selectable from two distance bands
    pub const LOD_LEVELS: u32 = 3;

    /// Default `uDist` bands in world units
    pub const DEFAULT_BANDS: [f32; 2] = [50.0, 150.0];
}
