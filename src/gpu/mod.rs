//! GPU record layouts and helpers
//!
//! Every buffer the processor touches has its record type defined in
//! `buffer_layouts`, with sizes checked against the WGSL side by `validation`.

pub mod buffer_layouts;
pub mod readback;
pub mod validation;

pub use readback::read_records;
pub use validation::validate_all_gpu_types;
