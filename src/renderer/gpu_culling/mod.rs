/// GPU occlusion inputs
///
/// Hi-Z pyramid contract consumed by the LOD stage.
pub mod hzb_builder;

pub use hzb_builder::{DepthPyramid, HizSource};
