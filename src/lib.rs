//! GPU visibility and instance compaction
//!
//! A four-stage compute processor that culls candidate objects against the
//! view frustum and a Hi-Z pyramid, selects a LOD per survivor and packs the
//! survivors into dense per-category instance buffers for indirect drawing.

pub mod config;
pub mod constants;
pub mod error;
pub mod gpu;
pub mod renderer;

pub use config::ProcessorConfig;
pub use error::{GatherError, GatherResult};
pub use gpu::buffer_layouts::{
    DispatchIndirectCommand, IndirectDrawIndexedCommand, InputObject, LodRecord, OutputAttribute,
};
pub use renderer::gpu_culling::{DepthPyramid, HizSource};
pub use renderer::gpu_driven::{
    Category, FrameCounts, LodBands, LodParam, MeshCategorySource, MeshCategoryTable, ObjectSource,
    ObjectTable, PerCategory, Processor, ProcessorStatus, Stage,
};
