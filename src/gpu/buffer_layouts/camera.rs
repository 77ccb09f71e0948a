//! Per-frame LOD stage uniform layout
//!
//! Carries the culling camera (current and previous view-projection, frustum
//! planes), the LOD bands and the occlusion parameters.

use bytemuck::{Pod, Zeroable};

/// Frame uniforms for the LOD kernel
/// Total size: 304 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    /// View-projection matrix
    pub view_proj: [[f32; 4]; 4],

    /// Previous frame view-projection, used to reproject into the Hi-Z pyramid
    pub prev_view_proj: [[f32; 4]; 4],

    /// Frustum planes for GPU culling
    /// Order: [left, right, bottom, top, near, far]
    /// Each plane: [a, b, c, d] where ax + by + cz + d = 0
    pub frustum_planes: [[f32; 4]; 6],

    /// Eye position (xyz), w unused
    pub eye_pos: [f32; 4],

    /// LOD distance bands (x, y), z/w unused
    pub lod_dist: [f32; 4],

    /// Viewport size (xy) and camera near/far (zw)
    pub viewport: [f32; 4],

    /// x = maximum Hi-Z mip level, y = linear depth bias, z/w unused
    pub occlusion: [f32; 4],

    /// x = input object count, y = shadow pass, z = occlusion enabled, w unused
    pub flags: [u32; 4],
}

impl FrameUniforms {
    #[inline]
    pub fn object_count(&self) -> u32 {
        self.flags[0]
    }

    #[inline]
    pub fn is_shadow_pass(&self) -> bool {
        self.flags[1] != 0
    }

    #[inline]
    pub fn occlusion_enabled(&self) -> bool {
        self.flags[2] != 0
    }
}
