use super::culling_pipeline::extract_frustum_planes;
use crate::config::ProcessorConfig;
use crate::constants::lod::DEFAULT_BANDS;
use crate::gpu::buffer_layouts::FrameUniforms;
use crate::renderer::gpu_culling::HizSource;
use cgmath::{Matrix4, SquareMatrix, Vector3};

/// Distance bands selecting one of three LOD levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodBands {
    /// Objects closer than this use LOD 0
    pub near: f32,

    /// Objects closer than this (and not closer than `near`) use LOD 1; LOD 2 beyond
    pub far: f32,
}

impl LodBands {
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Select LOD based on distance
    #[inline]
    pub fn select(&self, distance: f32) -> u32 {
        if distance < self.near {
            0
        } else if distance < self.far {
            1
        } else {
            2
        }
    }

    pub fn as_array(&self) -> [f32; 2] {
        [self.near, self.far]
    }
}

impl Default for LodBands {
    fn default() -> Self {
        Self::new(DEFAULT_BANDS[0], DEFAULT_BANDS[1])
    }
}

impl From<[f32; 2]> for LodBands {
    fn from(bands: [f32; 2]) -> Self {
        Self::new(bands[0], bands[1])
    }
}

/// Per-frame parameters of the LOD stage
///
/// A main-view pass supplies the previous frame's view-projection and a Hi-Z
/// pyramid; a shadow pass supplies neither and only frustum-culls.
#[derive(Clone, Copy)]
pub struct LodParam<'a> {
    pub view_proj: Matrix4<f32>,
    pub prev_view_proj: Matrix4<f32>,
    pub eye_pos: Vector3<f32>,
    pub bands: LodBands,
    pub shadow_pass: bool,
    /// Render target size in pixels
    pub viewport: [f32; 2],
    /// Camera near and far plane distances, used to linearize depth
    pub near_far: [f32; 2],
    pub hiz: Option<&'a dyn HizSource>,
}

impl<'a> LodParam<'a> {
    /// Main view pass with occlusion against `hiz`
    pub fn main_view(
        view_proj: Matrix4<f32>,
        prev_view_proj: Matrix4<f32>,
        eye_pos: Vector3<f32>,
        viewport: [f32; 2],
        near_far: [f32; 2],
        hiz: &'a dyn HizSource,
    ) -> Self {
        Self {
            view_proj,
            prev_view_proj,
            eye_pos,
            bands: LodBands::default(),
            shadow_pass: false,
            viewport,
            near_far,
            hiz: Some(hiz),
        }
    }

    /// Shadow pass; never reads a Hi-Z pyramid or the previous matrix
    pub fn shadow(view_proj: Matrix4<f32>, eye_pos: Vector3<f32>) -> Self {
        Self {
            view_proj,
            prev_view_proj: Matrix4::identity(),
            eye_pos,
            bands: LodBands::default(),
            shadow_pass: true,
            viewport: [0.0, 0.0],
            near_far: [0.0, 0.0],
            hiz: None,
        }
    }

    pub fn with_bands(mut self, bands: LodBands) -> Self {
        self.bands = bands;
        self
    }

    /// Whether this pass runs the occlusion test under `config`
    pub fn occlusion_enabled(&self, config: &ProcessorConfig) -> bool {
        !self.shadow_pass && config.occlusion_culling
    }

    /// Pack the frame uniforms for `object_count` input objects
    ///
    /// Shadow passes and passes with occlusion switched off leave the previous
    /// matrix, viewport and occlusion parameters zeroed.
    pub fn frame_uniforms(&self, object_count: u32, config: &ProcessorConfig) -> FrameUniforms {
        let occlusion = self.occlusion_enabled(config);
        let mut uniforms = FrameUniforms {
            view_proj: self.view_proj.into(),
            prev_view_proj: [[0.0; 4]; 4],
            frustum_planes: extract_frustum_planes(&self.view_proj),
            eye_pos: [self.eye_pos.x, self.eye_pos.y, self.eye_pos.z, 1.0],
            lod_dist: [self.bands.near, self.bands.far, 0.0, 0.0],
            viewport: [0.0; 4],
            occlusion: [0.0; 4],
            flags: [object_count, self.shadow_pass as u32, occlusion as u32, 0],
        };

        if occlusion {
            uniforms.prev_view_proj = self.prev_view_proj.into();
            uniforms.viewport = [
                self.viewport[0],
                self.viewport[1],
                self.near_far[0],
                self.near_far[1],
            ];
            let max_level = self.hiz.map(|hiz| hiz.max_level()).unwrap_or(0);
            uniforms.occlusion = [max_level as f32, config.depth_bias, 0.0, 0.0];
        }

        uniforms
    }
}
