//! Per-object buffer layout definitions
//!
//! Input objects flow in from the object database, LOD records are the
//! intermediate visibility results, output attributes are the compacted
//! per-instance payload consumed by instanced draws.

use bytemuck::{Pod, Zeroable};
use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// Candidate object awaiting visibility and LOD processing
/// Total size: 96 bytes (aligned)
///
/// Memory layout:
/// - Offset 0-63: World transform (column-major 4x4)
/// - Offset 64-79: Local bounding sphere (xyz = center, w = radius)
/// - Offset 80-95: Ids (x = category, y = mesh index, z = material, w = flags)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InputObject {
    /// World transform
    pub transform: [[f32; 4]; 4],

    /// Bounding sphere in object space
    pub bounds: [f32; 4],

    /// Category index, mesh index within the category, material id, flags
    pub ids: [u32; 4],
}

impl InputObject {
    /// Create an input object from a transform and a local bounding sphere
    pub fn new(
        transform: Matrix4<f32>,
        center: Vector3<f32>,
        radius: f32,
        category: u32,
        mesh: u32,
    ) -> Self {
        Self {
            transform: transform.into(),
            bounds: [center.x, center.y, center.z, radius],
            ids: [category, mesh, 0, 0],
        }
    }

    /// Attach a material id
    pub fn with_material(mut self, material: u32) -> Self {
        self.ids[2] = material;
        self
    }

    #[inline]
    pub fn category_index(&self) -> u32 {
        self.ids[0]
    }

    #[inline]
    pub fn mesh_index(&self) -> u32 {
        self.ids[1]
    }

    #[inline]
    pub fn material(&self) -> u32 {
        self.ids[2]
    }

    /// World-space bounding sphere (center, radius) scaled by the largest axis scale
    pub fn world_sphere(&self) -> (Vector3<f32>, f32) {
        let m = Matrix4::from(self.transform);
        let center = m * Vector4::new(self.bounds[0], self.bounds[1], self.bounds[2], 1.0);
        let scale = m
            .x
            .truncate()
            .magnitude()
            .max(m.y.truncate().magnitude())
            .max(m.z.truncate().magnitude());
        (center.truncate(), self.bounds[3] * scale)
    }
}

/// Visibility result written by the LOD stage, read only by Gather
/// Total size: 32 bytes (aligned)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct LodRecord {
    /// Index of the source object in the input buffer
    pub object: u32,

    /// Category index
    pub category: u32,

    /// Mesh index within the category
    pub mesh: u32,

    /// Selected LOD level
    pub lod: u32,

    /// Position among the survivors of the same mesh
    pub mesh_slot: u32,

    /// Padding for alignment
    pub _padding: [u32; 3],
}

/// Compacted per-instance payload
/// Total size: 64 bytes (four vec4 attribute slots)
///
/// Slots 0-2 hold the rows of the affine world transform so a vertex shader
/// computes `dot(row_n, vec4(position, 1.0))`. Slot 3 holds
/// (material, lod, mesh, object) as floats.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct OutputAttribute {
    pub rows: [[f32; 4]; 3],
    pub info: [f32; 4],
}

impl OutputAttribute {
    /// Build the payload the Gather kernel writes for `object`
    pub fn from_object(object: &InputObject, record: &LodRecord) -> Self {
        let t = object.transform;
        Self {
            rows: [
                [t[0][0], t[1][0], t[2][0], t[3][0]],
                [t[0][1], t[1][1], t[2][1], t[3][1]],
                [t[0][2], t[1][2], t[2][2], t[3][2]],
            ],
            info: [
                object.material() as f32,
                record.lod as f32,
                record.mesh as f32,
                record.object as f32,
            ],
        }
    }

    #[inline]
    pub fn lod(&self) -> u32 {
        self.info[1] as u32
    }

    #[inline]
    pub fn object(&self) -> u32 {
        self.info[3] as u32
    }

    /// World translation stored in the transform rows
    #[inline]
    pub fn translation(&self) -> [f32; 3] {
        [self.rows[0][3], self.rows[1][3], self.rows[2][3]]
    }
}

/// Vertex buffer layout for binding an output buffer as per-instance attributes
pub struct OutputAttributeLayout;

impl OutputAttributeLayout {
    /// Attribute descriptors starting at `first_location`
    pub fn attributes(first_location: u32) -> [VertexAttribute; 4] {
        let mut attributes = [VertexAttribute {
            offset: 0,
            shader_location: first_location,
            format: VertexFormat::Float32x4,
        }; 4];
        for (i, attribute) in attributes.iter_mut().enumerate() {
            attribute.offset = (i * 16) as u64;
            attribute.shader_location = first_location + i as u32;
        }
        attributes
    }

    /// Per-instance layout over caller-owned attribute descriptors
    pub fn desc(attributes: &[VertexAttribute]) -> VertexBufferLayout<'_> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<OutputAttribute>() as wgpu::BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes,
        }
    }
}
