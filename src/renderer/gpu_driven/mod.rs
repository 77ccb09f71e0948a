/// GPU-driven visibility and instance compaction
///
/// The GPU decides what is drawn: a four-stage compute pipeline culls the
/// input objects, selects their LOD and packs the survivors into per-category
/// instance buffers that instanced indirect draws consume directly.
///
/// Key components:
/// - Fixed fifteen-channel buffer set
/// - Clear / LOD / Rearrange / Gather stage kernels
/// - GPU-written per-mesh draw arguments for indirect draws
/// - Per-mesh sub-partition counters for per-mesh draws
/// - CPU reference of the stage kernels for diagnostics and tests

pub mod buffer_set;
pub mod category;
pub mod culling_pipeline;
pub mod indirect_commands;
pub mod instance_buffer;
pub mod lod_system;
pub mod pipelines;
pub mod processor;
pub mod reference;
pub mod stage;
pub mod status;

#[cfg(test)]
mod tests;

pub use buffer_set::{output_channel, template_channel, BufferSet, ChannelBuffer, UsageHint};
pub use category::{Category, PerCategory};
pub use culling_pipeline::{extract_frustum_planes, sphere_in_frustum, view_projection, OPENGL_TO_WGPU_MATRIX};
pub use indirect_commands::{compose_mesh_draws, MeshCategorySource, MeshCategoryTable};
pub use instance_buffer::{ObjectSource, ObjectTable};
pub use lod_system::{LodBands, LodParam};
pub use pipelines::{ProcessorPipelines, StageSources};
pub use processor::Processor;
pub use reference::{CpuDepthPyramid, ReferenceFrame};
pub use stage::{Barrier, Stage, StageTracker};
pub use status::{FrameCounts, ProcessorStatus};
