pub mod gpu_culling;
pub mod gpu_driven;

pub use gpu_culling::{DepthPyramid, HizSource};
pub use gpu_driven::{
    Category, FrameCounts, LodParam, MeshCategorySource, ObjectSource, Processor, ProcessorStatus,
};
