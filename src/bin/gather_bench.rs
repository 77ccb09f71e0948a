/// Headless processor benchmark
///
/// Builds a random scene, runs it through the four stages for a number of
/// frames and logs the per-category counts read back after each frame.
///
/// Usage: gather_bench [config.toml]
use anyhow::{Context, Result};
use cgmath::{Matrix4, Point3, Vector3};
use instance_gather::renderer::gpu_driven::view_projection;
use instance_gather::{
    Category, DepthPyramid, IndirectDrawIndexedCommand, InputObject, LodParam, MeshCategoryTable,
    ObjectSource, ObjectTable, PerCategory, Processor, ProcessorConfig,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;

const OBJECT_COUNT: u32 = 50_000;
const FRAMES: u32 = 8;
const VIEWPORT: (u32, u32) = (1280, 720);

async fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ProcessorConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => ProcessorConfig::default(),
    };

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        })
        .await
        .context("Failed to find adapter")?;

    // Per-mesh draws need a non-zero first instance
    let required_features = adapter.features() & wgpu::Features::INDIRECT_FIRST_INSTANCE;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Gather Bench Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("Failed to create device")?;

    let device = Arc::new(device);
    let queue = Arc::new(queue);

    log::info!(
        "GPU: {} ({:?})",
        adapter.get_info().name,
        adapter.get_info().backend
    );

    let mut rng = rand::thread_rng();

    let templates = PerCategory::from_fn(|category| {
        let meshes = match category {
            Category::Normal => 8,
            Category::Single => 1,
            Category::Billboard => 2,
            Category::Animated => 4,
            Category::Transparent => 3,
        };
        (0..meshes)
            .map(|m| IndirectDrawIndexedCommand::template(36 * (m + 1), 0, 0))
            .collect::<Vec<_>>()
    });
    let meshes = MeshCategoryTable::new(&device, templates.clone());

    let mut objects = ObjectTable::uniform(OBJECT_COUNT);
    for _ in 0..OBJECT_COUNT {
        let category = Category::ALL[rng.gen_range(0..Category::ALL.len())];
        let mesh = rng.gen_range(0..templates[category].len() as u32);
        let transform = Matrix4::from_translation(Vector3::new(
            rng.gen_range(-500.0..500.0),
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-500.0..500.0),
        )) * Matrix4::from_scale(rng.gen_range(0.5..3.0));
        objects.push(
            InputObject::new(transform, Vector3::new(0.0, 0.0, 0.0), 1.0, category.index() as u32, mesh)
                .with_material(rng.gen_range(0..16)),
        );
    }

    let mut processor = Processor::new(device.clone(), queue.clone(), &meshes, &objects, config)?;
    processor.update(&objects)?;
    processor.show_log()?;

    let pyramid = DepthPyramid::new(&device, VIEWPORT.0, VIEWPORT.1);
    pyramid.fill(&queue, 1.0);

    let near_far = [0.1, 1000.0];
    let aspect = VIEWPORT.0 as f32 / VIEWPORT.1 as f32;
    let mut previous = None;

    for frame in 0..FRAMES {
        let angle = frame as f32 * 0.25;
        let eye = Point3::new(0.0, 10.0, 0.0);
        let target = Point3::new(angle.sin(), 10.0, -angle.cos());
        let view_proj = view_projection(eye, target, 60.0, aspect, near_far[0], near_far[1]);
        let prev_view_proj = previous.unwrap_or(view_proj);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Gather Bench Encoder"),
        });

        let param = LodParam::main_view(
            view_proj,
            prev_view_proj,
            Vector3::new(eye.x, eye.y, eye.z),
            [VIEWPORT.0 as f32, VIEWPORT.1 as f32],
            near_far,
            &pyramid,
        );

        let start = Instant::now();
        processor.run_frame(&mut encoder, &param)?;
        queue.submit(Some(encoder.finish()));
        device.poll(wgpu::Maintain::Wait);
        let elapsed = start.elapsed();

        let counts = processor.read_counts().await?;
        counts.check_capacity(processor.lod_capacities())?;

        log::info!(
            "Frame {}: {:.2}ms, {} of {} visible | {}",
            frame,
            elapsed.as_secs_f32() * 1000.0,
            counts.survivors(),
            objects.input_count(),
            counts
        );

        previous = Some(view_proj);
    }

    // Draw arguments the last frame left for an indirect draw issuer
    for category in Category::ALL {
        let draws = processor.read_draws(category).await?;
        log::debug!(
            "{} draws at byte {}: {:?}",
            category,
            processor.draw_offset(category),
            draws
        );
    }

    // Shadow pass from above, frustum only
    let light = view_projection(
        Point3::new(0.0, 400.0, 0.1),
        Point3::new(0.0, 0.0, 0.0),
        90.0,
        1.0,
        1.0,
        1000.0,
    );
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Gather Bench Shadow Encoder"),
    });
    processor.run_frame(&mut encoder, &LodParam::shadow(light, Vector3::new(0.0, 400.0, 0.1)))?;
    queue.submit(Some(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);

    let counts = processor.read_counts().await?;
    log::info!("Shadow pass: {} visible | {}", counts.survivors(), counts);

    processor.show_log()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    pollster::block_on(run())
}
