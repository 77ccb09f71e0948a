/// Hierarchical Z-Buffer contract
///
/// The processor never builds the pyramid; it only needs a view over an
/// R32Float mip chain of conservative (farthest) depth and the deepest usable
/// mip level. `DepthPyramid` is a plain holder for such a chain that an
/// external generator (or a test) fills level by level.
use wgpu::{Device, Queue, Texture, TextureView};

/// Source of the Hi-Z pyramid consumed by the LOD stage
pub trait HizSource {
    /// View over every mip level of the pyramid
    fn depth_view(&self) -> &TextureView;

    /// Deepest mip level that may be sampled
    fn max_level(&self) -> u32;
}

pub struct DepthPyramid {
    texture: Texture,
    view: TextureView,
    width: u32,
    height: u32,
    mip_levels: u32,
}

impl DepthPyramid {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        // Get device limits to ensure we don't exceed GPU capabilities
        let max_dimension = device.limits().max_texture_dimension_2d;

        let clamped_width = width.clamp(1, max_dimension);
        let clamped_height = height.clamp(1, max_dimension);

        if clamped_width != width || clamped_height != height {
            log::warn!(
                "[DepthPyramid::new] Pyramid dimensions clamped from {}x{} to {}x{} (max: {})",
                width, height, clamped_width, clamped_height, max_dimension
            );
        }

        let mip_levels = Self::mip_count(clamped_width, clamped_height);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Hi-Z Pyramid"),
            size: wgpu::Extent3d {
                width: clamped_width,
                height: clamped_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Hi-Z Pyramid View"),
            ..Default::default()
        });

        log::debug!(
            "[DepthPyramid::new] Created {}x{} pyramid with {} levels",
            clamped_width, clamped_height, mip_levels
        );

        Self {
            texture,
            view,
            width: clamped_width,
            height: clamped_height,
            mip_levels,
        }
    }

    /// Full mip chain length for a base size
    pub fn mip_count(width: u32, height: u32) -> u32 {
        32 - width.max(height).max(1).leading_zeros()
    }

    /// Dimensions of a mip level
    pub fn level_size(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }

    /// Upload one level; `depths` is row-major, `level_size(level)` texels
    pub fn write_level(&self, queue: &Queue, level: u32, depths: &[f32]) {
        let (width, height) = self.level_size(level);
        debug_assert_eq!(depths.len(), (width * height) as usize);

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(depths),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Fill every level with one depth value
    pub fn fill(&self, queue: &Queue, depth: f32) {
        for level in 0..self.mip_levels {
            let (width, height) = self.level_size(level);
            self.write_level(queue, level, &vec![depth; (width * height) as usize]);
        }
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }
}

impl HizSource for DepthPyramid {
    fn depth_view(&self) -> &TextureView {
        &self.view
    }

    fn max_level(&self) -> u32 {
        self.mip_levels - 1
    }
}
