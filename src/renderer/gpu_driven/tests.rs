#[cfg(test)]
mod tests {
    use super::super::processor::check_device_limits;
    use super::super::reference::{classify, run_frame};
    use super::super::*;
    use crate::config::ProcessorConfig;
    use crate::error::GatherError;
    use crate::gpu::buffer_layouts::{
        CountHeader, CountRow, DispatchIndirectCommand, IndirectDrawIndexedCommand, InputObject,
        LayoutUniforms,
    };
    use cgmath::{Matrix4, Point3, Vector3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    const NEAR: f32 = 0.1;
    const FAR: f32 = 1000.0;

    fn camera() -> Matrix4<f32> {
        view_projection(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            60.0,
            1.0,
            NEAR,
            FAR,
        )
    }

    fn object_at(x: f32, y: f32, z: f32, category: Category, mesh: u32) -> InputObject {
        InputObject::new(
            Matrix4::from_translation(Vector3::new(x, y, z)),
            Vector3::new(0.0, 0.0, 0.0),
            1.0,
            category.index() as u32,
            mesh,
        )
    }

    fn layout(mesh_counts: [u32; 5], capacity: u32, input: u32) -> LayoutUniforms {
        let max_sub = mesh_counts.iter().copied().max().unwrap_or(0);
        LayoutUniforms::new(
            mesh_counts,
            [capacity; 5],
            [capacity.min(input); 5],
            max_sub,
            input,
        )
    }

    fn main_view<'a>(hiz: &'a dyn crate::renderer::gpu_culling::HizSource) -> LodParam<'a> {
        LodParam::main_view(
            camera(),
            camera(),
            Vector3::new(0.0, 0.0, 0.0),
            [256.0, 256.0],
            [NEAR, FAR],
            hiz,
        )
    }

    /// Random scene around the camera; roughly half of it in view
    fn random_scene(rng: &mut StdRng, count: usize, mesh_counts: [u32; 5]) -> Vec<InputObject> {
        (0..count)
            .map(|_| {
                let category = Category::ALL[rng.gen_range(0..5)];
                let mesh = rng.gen_range(0..mesh_counts[category.index()].max(1));
                let mut object = object_at(
                    rng.gen_range(-60.0..60.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-300.0..40.0),
                    category,
                    mesh,
                );
                object.bounds[3] = rng.gen_range(0.1..4.0);
                object
            })
            .collect()
    }

    struct FixedHiz;

    impl crate::renderer::gpu_culling::HizSource for FixedHiz {
        fn depth_view(&self) -> &wgpu::TextureView {
            unreachable!("host-only tests never bind the pyramid")
        }

        fn max_level(&self) -> u32 {
            8
        }
    }

    #[test]
    fn test_stage_order_is_enforced() {
        let mut tracker = StageTracker::new();

        let error = tracker.advance(Stage::Culled).unwrap_err();
        assert!(matches!(
            error,
            GatherError::StageOrder {
                current: Stage::Idle,
                requested: Stage::Culled
            }
        ));

        assert_eq!(tracker.advance(Stage::Cleared).unwrap(), Some(Barrier::StorageAndCommand));
        assert!(tracker.advance(Stage::Rearranged).is_err());
        assert_eq!(tracker.advance(Stage::Culled).unwrap(), Some(Barrier::Storage));
        assert_eq!(tracker.advance(Stage::Rearranged).unwrap(), Some(Barrier::Storage));
        assert!(tracker.advance(Stage::Cleared).is_err());
        assert_eq!(tracker.advance(Stage::Gathered).unwrap(), Some(Barrier::StorageAndCommand));
        assert_eq!(tracker.frames(), 1);

        // A new frame starts from Clear only
        assert!(tracker.advance(Stage::Culled).is_err());
        assert!(tracker.advance(Stage::Cleared).is_ok());
        assert!(tracker.advance(Stage::Cleared).is_ok());
        assert_eq!(tracker.current(), Stage::Cleared);
    }

    #[test]
    fn test_category_indices() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
            assert_eq!(Category::from_index(i as u32), Some(*category));
        }
        assert_eq!(Category::from_index(5), None);
        assert_eq!(Category::Transparent.to_string(), "transparent");

        let mut lanes = PerCategory([0u32; 5]);
        lanes[Category::Animated] = 7;
        assert_eq!(lanes.0[3], 7);
        assert_eq!(lanes.sum(), 7);
    }

    #[test]
    fn test_lod_band_boundaries() {
        let bands = LodBands::new(50.0, 150.0);
        assert_eq!(bands.select(0.0), 0);
        assert_eq!(bands.select(49.9), 0);
        assert_eq!(bands.select(50.0), 1);
        assert_eq!(bands.select(149.9), 1);
        assert_eq!(bands.select(150.0), 2);
        assert_eq!(bands.select(10_000.0), 2);
    }

    #[test]
    fn test_frustum_planes() {
        let planes = extract_frustum_planes(&camera());

        assert!(sphere_in_frustum(&planes, Vector3::new(0.0, 0.0, -10.0), 1.0));
        assert!(!sphere_in_frustum(&planes, Vector3::new(0.0, 0.0, 10.0), 1.0));
        assert!(!sphere_in_frustum(&planes, Vector3::new(-100.0, 0.0, -10.0), 1.0));
        assert!(!sphere_in_frustum(&planes, Vector3::new(0.0, 0.0, -2000.0), 1.0));
        // Straddling the left plane
        assert!(sphere_in_frustum(&planes, Vector3::new(-6.3, 0.0, -10.0), 1.0));
    }

    #[test]
    fn test_shadow_pass_uploads_no_occlusion_state() {
        let config = ProcessorConfig::default();
        let mut param = LodParam::shadow(camera(), Vector3::new(0.0, 0.0, 0.0));
        param.prev_view_proj = Matrix4::from_scale(3.0);
        param.viewport = [640.0, 480.0];

        let uniforms = param.frame_uniforms(12, &config);
        assert!(uniforms.is_shadow_pass());
        assert!(!uniforms.occlusion_enabled());
        assert_eq!(uniforms.prev_view_proj, [[0.0; 4]; 4]);
        assert_eq!(uniforms.viewport, [0.0; 4]);
        assert_eq!(uniforms.occlusion, [0.0; 4]);
        assert_eq!(uniforms.object_count(), 12);
    }

    #[test]
    fn test_main_view_uploads_occlusion_state() {
        let config = ProcessorConfig {
            depth_bias: 0.5,
            ..Default::default()
        };
        let hiz = FixedHiz;
        let uniforms = main_view(&hiz).frame_uniforms(3, &config);

        assert!(!uniforms.is_shadow_pass());
        assert!(uniforms.occlusion_enabled());
        assert_eq!(uniforms.occlusion[0], 8.0);
        assert_eq!(uniforms.occlusion[1], 0.5);
        assert_eq!(uniforms.viewport, [256.0, 256.0, NEAR, FAR]);

        let disabled = ProcessorConfig {
            occlusion_culling: false,
            ..Default::default()
        };
        assert!(!main_view(&hiz).frame_uniforms(3, &disabled).occlusion_enabled());
    }

    #[test]
    fn test_reference_hundred_objects_forty_normal_visible() {
        let mut objects = Vec::new();
        for i in 0..40 {
            objects.push(object_at((i % 8) as f32 - 4.0, 0.0, -20.0 - i as f32, Category::Normal, 0));
        }
        for i in 0..60 {
            // Behind the camera
            objects.push(object_at(0.0, 0.0, 20.0 + i as f32, Category::ALL[i % 5], 0));
        }

        let layout = layout([1; 5], 100, 100);
        let frame = LodParam::shadow(camera(), Vector3::new(0.0, 0.0, 0.0)).frame_uniforms(100, &ProcessorConfig::default());
        let result = run_frame(&objects, &layout, &frame, None);

        assert_eq!(result.count(Category::Normal), 40);
        for category in &Category::ALL[1..] {
            assert_eq!(result.count(*category), 0);
        }
        assert_eq!(
            result.dispatch,
            DispatchIndirectCommand {
                x: 1,
                y: 1,
                z: 1,
                work_items: 40
            }
        );
        assert_eq!(result.outputs[Category::Normal].len(), 40);

        let gathered: HashSet<u32> = result.outputs[Category::Normal].iter().map(|o| o.object()).collect();
        assert_eq!(gathered, (0..40).collect::<HashSet<u32>>());
    }

    #[test]
    fn test_reference_zero_objects() {
        let layout = layout([2, 1, 1, 1, 1], 16, 16);
        let frame = LodParam::shadow(camera(), Vector3::new(0.0, 0.0, 0.0)).frame_uniforms(0, &ProcessorConfig::default());
        let result = run_frame(&[], &layout, &frame, None);

        assert_eq!(result.header, CountHeader::default());
        assert_eq!(result.dispatch.x, 0);
        assert_eq!(result.dispatch.work_items, 0);
        assert!(result.rows.iter().all(|row| *row == CountRow::default()));
    }

    #[test]
    fn test_reference_slots_are_dense_and_unique() {
        let mesh_counts = [4, 1, 2, 3, 2];
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let objects = random_scene(&mut rng, 2000, mesh_counts);

        let layout = layout(mesh_counts, 2000, 2000);
        let frame = LodParam::shadow(camera(), Vector3::new(0.0, 0.0, 0.0)).frame_uniforms(2000, &ProcessorConfig::default());
        let result = run_frame(&objects, &layout, &frame, None);

        let visible = objects
            .iter()
            .filter(|o| classify(o, &layout, &frame, None).is_some())
            .count();
        assert_eq!(result.survivors() as usize, visible);
        assert!(result.survivors() > 0 && (result.survivors() as usize) < objects.len());

        for category in Category::ALL {
            let c = category.index();
            let records = &result.lod_records[category];
            assert_eq!(records.len() as u32, result.count(category));

            // Per mesh: contiguous output range, unique zero-based mesh slots
            let mut next_base = 0;
            for (mesh, row) in result.rows.iter().enumerate().take(mesh_counts[c] as usize) {
                assert_eq!(row.base[c], next_base);
                next_base += row.count[c];

                let mut slots: Vec<u32> = records
                    .iter()
                    .filter(|r| r.mesh == mesh as u32)
                    .map(|r| r.mesh_slot)
                    .collect();
                slots.sort_unstable();
                assert_eq!(slots, (0..row.count[c]).collect::<Vec<_>>());
            }
            assert_eq!(next_base, result.count(category));

            // Outputs are grouped by mesh
            for (slot, output) in result.outputs[category].iter().enumerate() {
                let mesh = output.info[2] as usize;
                let row = &result.rows[mesh];
                assert!(slot as u32 >= row.base[c] && (slot as u32) < row.base[c] + row.count[c]);
                assert_eq!(objects[output.object() as usize].category_index(), c as u32);
            }
        }

        let work_items: u32 = Category::ALL.iter().map(|&c| result.count(c)).sum();
        assert_eq!(result.dispatch.work_items, work_items);
        assert_eq!(result.dispatch.x, (work_items + 63) / 64);
    }

    #[test]
    fn test_reference_rejects_invalid_ids() {
        let layout = layout([1, 1, 1, 1, 1], 8, 8);
        let frame = LodParam::shadow(camera(), Vector3::new(0.0, 0.0, 0.0)).frame_uniforms(3, &ProcessorConfig::default());

        let mut bad_category = object_at(0.0, 0.0, -10.0, Category::Normal, 0);
        bad_category.ids[0] = 9;
        let bad_mesh = object_at(0.0, 0.0, -10.0, Category::Single, 4);
        let good = object_at(0.0, 0.0, -10.0, Category::Billboard, 0);

        let result = run_frame(&[bad_category, bad_mesh, good], &layout, &frame, None);
        assert_eq!(result.survivors(), 1);
        assert_eq!(result.count(Category::Billboard), 1);
    }

    #[test]
    fn test_reference_overflow_is_counted() {
        let objects: Vec<InputObject> = (0..10)
            .map(|i| object_at(0.0, 0.0, -10.0 - i as f32, Category::Animated, 0))
            .collect();
        let layout = LayoutUniforms::new([1; 5], [4, 10, 10, 4, 10], [4, 10, 10, 4, 10], 1, 10);
        let frame = LodParam::shadow(camera(), Vector3::new(0.0, 0.0, 0.0)).frame_uniforms(10, &ProcessorConfig::default());
        let result = run_frame(&objects, &layout, &frame, None);

        assert_eq!(result.count(Category::Animated), 10);
        assert_eq!(result.header.overflow(), 6);
        assert_eq!(result.dispatch.work_items, 4);
        assert_eq!(result.outputs[Category::Animated].len(), 4);

        let counts = FrameCounts {
            header: result.header,
            rows: result.rows.clone(),
            dispatch: result.dispatch,
        };
        let error = counts.check_capacity(&PerCategory([4, 10, 10, 4, 10])).unwrap_err();
        assert!(matches!(
            error,
            GatherError::CapacityOverflow {
                category: Category::Animated,
                requested: 10,
                capacity: 4
            }
        ));
    }

    #[test]
    fn test_shadow_pass_matches_occlusion_off() {
        let mesh_counts = [2, 2, 2, 2, 2];
        let mut rng = StdRng::seed_from_u64(7);
        let objects = random_scene(&mut rng, 500, mesh_counts);
        let layout = layout(mesh_counts, 500, 500);

        // A pyramid at the near plane would occlude everything
        let hiz = CpuDepthPyramid::uniform(256, 256, 0.0);
        let fixed = FixedHiz;

        let shadow = LodParam::shadow(camera(), Vector3::new(0.0, 0.0, 0.0))
            .frame_uniforms(500, &ProcessorConfig::default());
        let always_pass = main_view(&fixed).frame_uniforms(
            500,
            &ProcessorConfig {
                occlusion_culling: false,
                ..Default::default()
            },
        );
        let occluding = main_view(&fixed).frame_uniforms(500, &ProcessorConfig::default());

        let shadow_result = run_frame(&objects, &layout, &shadow, Some(&hiz));
        let pass_result = run_frame(&objects, &layout, &always_pass, Some(&hiz));
        let occluded_result = run_frame(&objects, &layout, &occluding, Some(&hiz));

        assert_eq!(shadow_result.header, pass_result.header);
        assert_eq!(shadow_result.lod_records, pass_result.lod_records);
        assert!(shadow_result.survivors() > 0);
        assert!(occluded_result.survivors() < shadow_result.survivors());

        // Only spheres reaching the near plane escape a pyramid at depth zero
        for records in occluded_result.lod_records.0.iter() {
            for record in records {
                let (center, radius) = objects[record.object as usize].world_sphere();
                assert!(center.z + radius >= -NEAR - 1.0e-3);
            }
        }
    }

    #[test]
    fn test_occlusion_against_far_depth_keeps_objects() {
        let layout = layout([1; 5], 8, 8);
        let fixed = FixedHiz;
        let frame = main_view(&fixed).frame_uniforms(2, &ProcessorConfig::default());

        let objects = [
            object_at(0.0, 0.0, -10.0, Category::Normal, 0),
            object_at(2.0, 0.0, -40.0, Category::Normal, 0),
        ];

        let far_wall = CpuDepthPyramid::uniform(256, 256, 1.0);
        assert_eq!(run_frame(&objects, &layout, &frame, Some(&far_wall)).survivors(), 2);

        // Wall at linear depth 20 hides only the object at 40
        let d = FAR / (FAR - NEAR) * (1.0 - NEAR / 20.0);
        let wall = CpuDepthPyramid::uniform(256, 256, d);
        let result = run_frame(&objects, &layout, &frame, Some(&wall));
        assert_eq!(result.survivors(), 1);
        assert_eq!(result.lod_records[Category::Normal][0].object, 0);
    }

    #[test]
    fn test_cpu_pyramid_keeps_farthest_depth() {
        #[rustfmt::skip]
        let base = vec![
            0.1, 0.2, 0.3, 0.4, 0.9,
            0.1, 0.1, 0.1, 0.1, 0.1,
            0.5, 0.1, 0.1, 0.1, 0.1,
        ];
        let pyramid = CpuDepthPyramid::from_depth(5, 3, base);

        assert_eq!(pyramid.mip_levels(), 3);
        assert_eq!(pyramid.level_size(1), (2, 1));
        // Odd edges fold into the last texel
        assert_eq!(pyramid.level(1), &[0.5, 0.9]);
        assert_eq!(pyramid.level(2), &[0.9]);
    }

    #[test]
    fn test_compose_mesh_draws() {
        let templates = [
            IndirectDrawIndexedCommand::template(36, 0, 0),
            IndirectDrawIndexedCommand::template(120, 36, 24),
        ];
        let mut rows = vec![CountRow::default(); 2];
        rows[0].count[Category::Single.index()] = 3;
        rows[1].count[Category::Single.index()] = 5;
        rows[1].base[Category::Single.index()] = 3;

        let draws = compose_mesh_draws(&templates, &rows, Category::Single);
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].first_instance, draws[0].instance_count), (0, 3));
        assert_eq!((draws[1].first_instance, draws[1].instance_count), (3, 5));
        assert_eq!(draws[1].index_count, 120);
        assert_eq!(draws[1].base_vertex, 24);

        let none = compose_mesh_draws(&templates, &rows, Category::Normal);
        assert!(none.iter().all(|d| d.instance_count == 0));
    }

    #[test]
    fn test_object_table_limits() {
        let mut table = ObjectTable::new(3, PerCategory([3, 1, 1, 1, 1]));
        let object = object_at(0.0, 0.0, -5.0, Category::Normal, 0);

        assert_eq!(table.push(object), Some(0));
        assert_eq!(table.extend_from_slice(&[object, object, object]), 2);
        assert_eq!(table.push(object), None);
        assert_eq!(table.input_count(), 3);
        assert_eq!(table.max_category_count(Category::Single), 1);

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.input_count(), 0);
    }

    #[test]
    fn test_status_report_lists_categories() {
        let status = ProcessorStatus {
            label: "Main".to_string(),
            template_counts: PerCategory([4, 0, 1, 2, 3]),
            max_sub: 4,
            capacities: PerCategory([100; 5]),
            lod_capacities: PerCategory([50; 5]),
            input_capacity: 50,
            input_count: 12,
            input_pushed: true,
            stage: Stage::Gathered,
            frames: 3,
            owned_bytes: 1024 * 1024,
        };

        let report = status.to_string();
        assert!(report.starts_with("Main:"));
        for category in Category::ALL {
            assert!(report.contains(category.name()));
        }
        assert!(report.contains("maxSub 4"));
        assert!(report.contains("input 12/50 (pushed: true)"));
        assert!(report.contains("stage gather"));
    }

    #[test]
    fn test_stage_kernels_pass_shader_validation() {
        for (stage, source) in StageSources::default().iter() {
            let module = match naga::front::wgsl::parse_str(source) {
                Ok(module) => module,
                Err(error) => panic!("{} kernel failed to parse:\n{}", stage, error.emit_to_string(source)),
            };

            let mut validator = naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::empty(),
            );
            if let Err(error) = validator.validate(&module) {
                panic!("{} kernel failed validation: {:?}", stage, error.into_inner());
            }
        }
    }

    #[test]
    fn test_device_limits_reject_oversized_dispatch() {
        let limits = wgpu::Limits {
            max_compute_workgroups_per_dimension: 16,
            ..wgpu::Limits::default()
        };
        let capacities = PerCategory([1024; 5]);

        // 16 groups of 64 cover exactly 1024 inputs
        let fits = LayoutUniforms::new([4; 5], [1024; 5], [200; 5], 4, 1024);
        assert!(check_device_limits(&limits, &fits, &capacities, 20).is_ok());

        let too_many_inputs = LayoutUniforms::new([4; 5], [1024; 5], [200; 5], 4, 1025);
        match check_device_limits(&limits, &too_many_inputs, &capacities, 20) {
            Err(GatherError::Configuration(reason)) => assert!(reason.contains("lod stage"), "{}", reason),
            other => panic!("expected a configuration error, got {:?}", other),
        }

        let too_many_records = LayoutUniforms::new([4; 5], [1024; 5], [1024; 5], 4, 1024);
        match check_device_limits(&limits, &too_many_records, &capacities, 20) {
            Err(GatherError::Configuration(reason)) => assert!(reason.contains("gather stage"), "{}", reason),
            other => panic!("expected a configuration error, got {:?}", other),
        }

        let too_many_rows = LayoutUniforms::new([17; 5], [1024; 5], [200; 5], 17, 1024);
        assert!(matches!(
            check_device_limits(&limits, &too_many_rows, &capacities, 85),
            Err(GatherError::Configuration(_))
        ));
    }

    #[test]
    fn test_device_limits_reject_oversized_bindings() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 4096,
            ..wgpu::Limits::default()
        };
        // 64 outputs of 64 bytes fill the binding exactly
        let layout = LayoutUniforms::new([1; 5], [64; 5], [8; 5], 1, 40);
        assert!(check_device_limits(&limits, &layout, &PerCategory([64; 5]), 5).is_ok());

        let result = check_device_limits(&limits, &layout, &PerCategory([64, 64, 65, 64, 64]), 5);
        assert!(matches!(result, Err(GatherError::Configuration(_))));
    }
}
