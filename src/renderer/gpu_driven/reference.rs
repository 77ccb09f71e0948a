/// CPU mirror of the four stage kernels
///
/// Runs the same frustum, occlusion and LOD math sequentially, with objects
/// visited in index order. The GPU allocates slots in an arbitrary order, so
/// comparisons against a GPU frame should treat each category (and each mesh
/// range) as a set.
use super::category::{Category, PerCategory};
use super::culling_pipeline::sphere_in_frustum;
use super::lod_system::LodBands;
use crate::constants::category::{CATEGORY_COUNT, OVERFLOW_LANE, TOTAL_LANE};
use crate::constants::dispatch::workgroups_for;
use crate::gpu::buffer_layouts::{
    CountHeader, CountRow, DispatchIndirectCommand, FrameUniforms, InputObject, LayoutUniforms,
    LodRecord, OutputAttribute,
};
use crate::renderer::gpu_culling::DepthPyramid;
use cgmath::{InnerSpace, Matrix4, Vector2, Vector3, Vector4};

/// Host copy of a farthest-depth mip chain
#[derive(Debug, Clone, PartialEq)]
pub struct CpuDepthPyramid {
    width: u32,
    height: u32,
    levels: Vec<Vec<f32>>,
}

impl CpuDepthPyramid {
    /// Build the full chain from a base depth image, keeping the farthest depth
    /// of every footprint
    pub fn from_depth(width: u32, height: u32, depth: Vec<f32>) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        debug_assert_eq!(depth.len(), (width * height) as usize);

        let mip_levels = DepthPyramid::mip_count(width, height);
        let mut levels = vec![depth];

        for level in 1..mip_levels {
            let (pw, ph) = level_size(width, height, level - 1);
            let (w, h) = level_size(width, height, level);
            let previous = &levels[level as usize - 1];
            let mut next = Vec::with_capacity((w * h) as usize);

            for y in 0..h {
                let y0 = y * 2;
                let y1 = if y == h - 1 { ph - 1 } else { (y * 2 + 1).min(ph - 1) };
                for x in 0..w {
                    let x0 = x * 2;
                    let x1 = if x == w - 1 { pw - 1 } else { (x * 2 + 1).min(pw - 1) };

                    let mut farthest = f32::MIN;
                    for sy in y0..=y1 {
                        for sx in x0..=x1 {
                            farthest = farthest.max(previous[(sy * pw + sx) as usize]);
                        }
                    }
                    next.push(farthest);
                }
            }
            levels.push(next);
        }

        Self {
            width,
            height,
            levels,
        }
    }

    /// Every texel at one depth
    pub fn uniform(width: u32, height: u32, depth: f32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self::from_depth(width, height, vec![depth; (width * height) as usize])
    }

    pub fn level_size(&self, level: u32) -> (u32, u32) {
        level_size(self.width, self.height, level)
    }

    pub fn level(&self, level: u32) -> &[f32] {
        &self.levels[level as usize]
    }

    pub fn mip_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn max_level(&self) -> u32 {
        self.mip_levels() - 1
    }

    pub fn load(&self, level: u32, x: u32, y: u32) -> f32 {
        let (w, _) = self.level_size(level);
        self.levels[level as usize][(y * w + x) as usize]
    }

    /// Copy every level into a GPU pyramid of the same size
    pub fn upload(&self, pyramid: &DepthPyramid, queue: &wgpu::Queue) {
        for level in 0..self.mip_levels().min(pyramid.mip_levels()) {
            pyramid.write_level(queue, level, self.level(level));
        }
    }
}

fn level_size(width: u32, height: u32, level: u32) -> (u32, u32) {
    ((width >> level).max(1), (height >> level).max(1))
}

/// Expected content of every processor channel after one frame
#[derive(Debug, Clone)]
pub struct ReferenceFrame {
    pub header: CountHeader,
    pub rows: Vec<CountRow>,
    pub dispatch: DispatchIndirectCommand,
    /// LOD records per category in slot order
    pub lod_records: PerCategory<Vec<LodRecord>>,
    /// Live output records per category
    pub outputs: PerCategory<Vec<OutputAttribute>>,
}

impl ReferenceFrame {
    pub fn count(&self, category: Category) -> u32 {
        self.header.total(category.index())
    }

    pub fn survivors(&self) -> u32 {
        self.header.survivors()
    }
}

fn linearize_depth(frame: &FrameUniforms, depth: f32) -> f32 {
    let near = frame.viewport[2];
    let far = frame.viewport[3];
    near * far / (far - depth * (far - near))
}

/// Occlusion test of a world-space sphere against the previous frame's pyramid
pub fn is_occluded(
    center: Vector3<f32>,
    radius: f32,
    frame: &FrameUniforms,
    hiz: &CpuDepthPyramid,
) -> bool {
    let prev = Matrix4::from(frame.prev_view_proj);
    let mut uv_min = Vector2::new(1.0e9f32, 1.0e9);
    let mut uv_max = Vector2::new(-1.0e9f32, -1.0e9);
    let mut nearest = 1.0f32;

    for k in 0..8u32 {
        let corner = Vector3::new(
            if k & 1 != 0 { 1.0 } else { -1.0 },
            if k & 2 != 0 { 1.0 } else { -1.0 },
            if k & 4 != 0 { 1.0 } else { -1.0 },
        );
        let p = center + corner * radius;
        let clip = prev * Vector4::new(p.x, p.y, p.z, 1.0);
        if clip.w <= 0.0 {
            return false;
        }

        let ndc = clip.truncate() / clip.w;
        let u = ndc.x * 0.5 + 0.5;
        let v = 0.5 - ndc.y * 0.5;
        uv_min = Vector2::new(uv_min.x.min(u), uv_min.y.min(v));
        uv_max = Vector2::new(uv_max.x.max(u), uv_max.y.max(v));
        nearest = nearest.min(ndc.z);
    }

    if uv_max.x < 0.0 || uv_max.y < 0.0 || uv_min.x > 1.0 || uv_min.y > 1.0 || nearest <= 0.0 {
        return false;
    }

    let uv_min = Vector2::new(uv_min.x.clamp(0.0, 1.0), uv_min.y.clamp(0.0, 1.0));
    let uv_max = Vector2::new(uv_max.x.clamp(0.0, 1.0), uv_max.y.clamp(0.0, 1.0));

    let extent_x = (uv_max.x - uv_min.x) * frame.viewport[0];
    let extent_y = (uv_max.y - uv_min.y) * frame.viewport[1];
    let level = extent_x
        .max(extent_y)
        .max(1.0)
        .log2()
        .ceil()
        .clamp(0.0, frame.occlusion[0]) as u32;
    let level = level.min(hiz.max_level());

    let (w, h) = hiz.level_size(level);
    let lo_x = ((uv_min.x * w as f32) as u32).min(w - 1);
    let lo_y = ((uv_min.y * h as f32) as u32).min(h - 1);
    let hi_x = ((uv_max.x * w as f32) as u32).min(w - 1);
    let hi_y = ((uv_max.y * h as f32) as u32).min(h - 1);

    let farthest = hiz
        .load(level, lo_x, lo_y)
        .max(hiz.load(level, hi_x, lo_y))
        .max(hiz.load(level, lo_x, hi_y))
        .max(hiz.load(level, hi_x, hi_y));

    linearize_depth(frame, nearest) > linearize_depth(frame, farthest) + frame.occlusion[1]
}

/// Visibility and LOD of one object; None when rejected
pub fn classify(
    object: &InputObject,
    layout: &LayoutUniforms,
    frame: &FrameUniforms,
    hiz: Option<&CpuDepthPyramid>,
) -> Option<u32> {
    let category = object.category_index() as usize;
    if category >= CATEGORY_COUNT || object.mesh_index() >= layout.mesh_count(category) {
        return None;
    }

    let (center, radius) = object.world_sphere();
    if !sphere_in_frustum(&frame.frustum_planes, center, radius) {
        return None;
    }

    if !frame.is_shadow_pass() && frame.occlusion_enabled() {
        if let Some(hiz) = hiz {
            if is_occluded(center, radius, frame, hiz) {
                return None;
            }
        }
    }

    let eye = Vector3::new(frame.eye_pos[0], frame.eye_pos[1], frame.eye_pos[2]);
    let bands = LodBands::new(frame.lod_dist[0], frame.lod_dist[1]);
    Some(bands.select((center - eye).magnitude()))
}

/// Clear, LOD, Rearrange and Gather over `objects`
pub fn run_frame(
    objects: &[InputObject],
    layout: &LayoutUniforms,
    frame: &FrameUniforms,
    hiz: Option<&CpuDepthPyramid>,
) -> ReferenceFrame {
    // Clear
    let mut header = CountHeader::default();
    let mut rows = vec![CountRow::default(); layout.max_sub() as usize];
    let mut lod_records: PerCategory<Vec<LodRecord>> = PerCategory::default();

    // LOD
    let count = (frame.object_count() as usize).min(objects.len());
    for (index, object) in objects[..count].iter().enumerate() {
        let Some(lod) = classify(object, layout, frame, hiz) else {
            continue;
        };

        let c = object.category_index() as usize;
        let mesh = object.mesh_index();
        let slot = header.totals[c];
        header.totals[c] += 1;
        if slot >= layout.lod_capacity(c) {
            header.totals[OVERFLOW_LANE] += 1;
            continue;
        }

        let row = &mut rows[mesh as usize];
        let mesh_slot = row.count[c];
        row.count[c] += 1;

        lod_records.0[c].push(LodRecord {
            object: index as u32,
            category: c as u32,
            mesh,
            lod,
            mesh_slot,
            _padding: [0; 3],
        });
    }

    // Rearrange
    for c in 0..CATEGORY_COUNT {
        let mut base = 0;
        for row in rows.iter_mut().take(layout.mesh_count(c) as usize) {
            row.base[c] = base;
            base += row.count[c];
        }
    }

    let mut running = 0;
    for c in 0..CATEGORY_COUNT {
        header.gather_base[c] = running;
        running += header.totals[c].min(layout.lod_capacity(c));
    }
    header.gather_base[TOTAL_LANE] = running;

    let dispatch = DispatchIndirectCommand {
        x: workgroups_for(running),
        y: 1,
        z: 1,
        work_items: running,
    };

    // Gather
    let outputs = PerCategory::from_fn(|category| {
        let c = category.index();
        let records = &lod_records[category];
        let mut output = vec![OutputAttribute::default(); records.len()];
        for record in records {
            let slot = rows[record.mesh as usize].base[c] + record.mesh_slot;
            if slot < layout.capacity(c) {
                output[slot as usize] = OutputAttribute::from_object(&objects[record.object as usize], record);
            }
        }
        output
    });

    ReferenceFrame {
        header,
        rows,
        dispatch,
        lod_records,
        outputs,
    }
}
