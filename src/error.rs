//! Processor error handling
//!
//! Error types and helper constructors shared by every processor module.
//! Library code returns `GatherResult<T>`; binaries wrap it in `anyhow`.

use crate::renderer::gpu_driven::{Category, Stage};
use thiserror::Error;

/// Type alias for processor operation results
pub type GatherResult<T> = Result<T, GatherError>;

#[derive(Debug, Error)]
pub enum GatherError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Category {category} has no capacity (maximum object count is zero)")]
    ZeroCapacity { category: Category },

    #[error("Capacity overflow in {category}: {requested} survivors, capacity {capacity}")]
    CapacityOverflow {
        category: Category,
        requested: u32,
        capacity: u32,
    },

    #[error("Input overflow: {requested} objects pushed, input buffer holds {capacity}")]
    InputOverflow { requested: u32, capacity: u32 },

    #[error("Stage {requested} cannot run after {current}")]
    StageOrder { current: Stage, requested: Stage },

    #[error("Occlusion pass requested without a Hi-Z pyramid")]
    MissingHiz,

    #[error("Missing buffer channel {channel}")]
    MissingChannel { channel: usize },

    #[error("GPU operation '{operation}' failed: {error}")]
    GpuOperationFailed { operation: String, error: String },

    #[error("Failed to map GPU buffer: {0}")]
    BufferMapping(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Helper trait for attaching processor context to foreign errors
pub trait GatherErrorContext<T> {
    fn gather_context(self, context: &str) -> GatherResult<T>;
}

impl<T, E> GatherErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn gather_context(self, context: &str) -> GatherResult<T> {
        self.map_err(|e| gpu_operation_error(context, e))
    }
}

impl<T> GatherErrorContext<T> for Option<T> {
    fn gather_context(self, context: &str) -> GatherResult<T> {
        self.ok_or_else(|| GatherError::Configuration(context.to_string()))
    }
}

/// Create a GPU operation error
pub fn gpu_operation_error(operation: &str, error: impl std::fmt::Display) -> GatherError {
    GatherError::GpuOperationFailed {
        operation: operation.to_string(),
        error: error.to_string(),
    }
}

/// Create a buffer mapping error
pub fn buffer_mapping_error(buffer: &str) -> GatherError {
    GatherError::BufferMapping(buffer.to_string())
}

/// Create a configuration error
pub fn configuration_error(reason: impl std::fmt::Display) -> GatherError {
    GatherError::Configuration(reason.to_string())
}
