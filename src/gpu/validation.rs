//! Runtime validation for GPU record layouts

use crate::gpu::buffer_layouts::*;

/// Validate all GPU record sizes against the constants shared with WGSL
///
/// Logs each size at debug level and returns the first mismatch.
pub fn validate_all_gpu_types() -> Result<(), String> {
    log::debug!("[GPU Validation] Starting GPU record validation...");

    check_buffer_size::<InputObject>(INPUT_OBJECT_SIZE)?;
    check_buffer_size::<LodRecord>(LOD_RECORD_SIZE)?;
    check_buffer_size::<OutputAttribute>(OUTPUT_ATTRIBUTE_SIZE)?;
    check_buffer_size::<DispatchIndirectCommand>(DISPATCH_BLOCK_SIZE)?;
    check_buffer_size::<CountHeader>(COUNT_HEADER_SIZE)?;
    check_buffer_size::<CountRow>(COUNT_ROW_SIZE)?;
    check_buffer_size::<IndirectDrawIndexedCommand>(INDIRECT_INDEXED_COMMAND_SIZE)?;
    check_buffer_size::<LayoutUniforms>(LAYOUT_UNIFORMS_SIZE)?;
    check_buffer_size::<FrameUniforms>(FRAME_UNIFORMS_SIZE)?;

    log::debug!("[GPU Validation] All GPU records validated");
    Ok(())
}

/// Runtime size checker for debugging
pub fn check_buffer_size<T>(expected: u64) -> Result<(), String> {
    let actual = std::mem::size_of::<T>() as u64;
    log::debug!("[GPU Validation] {} = {} bytes", std::any::type_name::<T>(), actual);
    if actual != expected {
        Err(format!(
            "Buffer size mismatch for {}: expected {} bytes, got {} bytes",
            std::any::type_name::<T>(),
            expected,
            actual
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_records_validate() {
        assert!(validate_all_gpu_types().is_ok());
    }

    #[test]
    fn test_mismatch_is_reported() {
        let error = check_buffer_size::<LodRecord>(16).unwrap_err();
        assert!(error.contains("expected 16 bytes, got 32 bytes"));
    }
}
