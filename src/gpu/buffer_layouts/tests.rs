//! Tests for GPU buffer layouts

#[cfg(test)]
mod tests {
    use super::super::*;
    use cgmath::{Matrix4, Vector3};
    use std::mem;

    #[test]
    fn test_buffer_sizes() {
        // Sizes must match the WGSL structs in common.wgsl
        assert_eq!(mem::size_of::<InputObject>() as u64, INPUT_OBJECT_SIZE);
        assert_eq!(mem::size_of::<LodRecord>() as u64, LOD_RECORD_SIZE);
        assert_eq!(mem::size_of::<OutputAttribute>() as u64, OUTPUT_ATTRIBUTE_SIZE);
        assert_eq!(mem::size_of::<DispatchIndirectCommand>() as u64, DISPATCH_BLOCK_SIZE);
        assert_eq!(mem::size_of::<CountHeader>() as u64, COUNT_HEADER_SIZE);
        assert_eq!(mem::size_of::<CountRow>() as u64, COUNT_ROW_SIZE);
        assert_eq!(
            mem::size_of::<IndirectDrawIndexedCommand>() as u64,
            INDIRECT_INDEXED_COMMAND_SIZE
        );
        assert_eq!(mem::size_of::<LayoutUniforms>() as u64, LAYOUT_UNIFORMS_SIZE);
        assert_eq!(mem::size_of::<FrameUniforms>() as u64, FRAME_UNIFORMS_SIZE);
    }

    #[test]
    fn test_layout_uniform_packing() {
        let layout = LayoutUniforms::new([3, 1, 2, 4, 5], [10, 20, 30, 40, 50], [10, 8, 8, 8, 8], 5, 8);

        assert_eq!(layout.mesh_count(4), 5);
        assert_eq!(layout.mesh_counts[1][0], 5);
        assert_eq!(layout.capacity(2), 30);
        assert_eq!(layout.max_sub(), 5);

        // LOD regions are laid out back to back in category order
        assert_eq!(layout.lod_base(0), 0);
        assert_eq!(layout.lod_base(1), 10);
        assert_eq!(layout.lod_base(4), 34);
        assert_eq!(layout.lod_records(), 42);
    }

    #[test]
    fn test_output_attribute_rows() {
        let transform = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let object = InputObject::new(transform, Vector3::new(0.0, 0.0, 0.0), 1.0, 0, 2).with_material(7);
        let record = LodRecord {
            object: 11,
            category: 0,
            mesh: 2,
            lod: 1,
            ..Default::default()
        };

        let output = OutputAttribute::from_object(&object, &record);
        assert_eq!(output.translation(), [1.0, 2.0, 3.0]);
        assert_eq!(output.rows[0][0], 1.0);
        assert_eq!(output.info, [7.0, 1.0, 2.0, 11.0]);
        assert_eq!(output.object(), 11);
        assert_eq!(output.lod(), 1);
    }

    #[test]
    fn test_world_sphere_scales_radius() {
        let transform = Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0))
            * Matrix4::from_nonuniform_scale(1.0, 3.0, 2.0);
        let object = InputObject::new(transform, Vector3::new(0.0, 1.0, 0.0), 2.0, 0, 0);

        let (center, radius) = object.world_sphere();
        assert!((center.y - 8.0).abs() < 1e-5);
        assert!((radius - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_output_attribute_layout() {
        let attributes = OutputAttributeLayout::attributes(5);
        assert_eq!(attributes[3].shader_location, 8);
        assert_eq!(attributes[3].offset, 48);

        let layout = OutputAttributeLayout::desc(&attributes);
        assert_eq!(layout.array_stride, 64);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn test_dispatch_thread_count() {
        let dispatch = DispatchIndirectCommand { x: 3, y: 1, z: 1, work_items: 130 };
        assert_eq!(dispatch.launched_threads(64), 192);

        assert_eq!(calculations::count_data_size(0), COUNT_HEADER_SIZE + COUNT_ROW_SIZE);
        assert_eq!(calculations::align_buffer_size(20, 16), 32);
    }
}
