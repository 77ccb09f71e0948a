/// Stage compute pipelines
///
/// All four pipelines and their bind group layouts are created eagerly when a
/// processor is built and owned by it.
use crate::constants::category::CATEGORY_COUNT;
use crate::error::{configuration_error, GatherResult};
use crate::gpu::buffer_layouts::bindings;
use crate::gpu::buffer_layouts::layouts::{
    depth_pyramid_entry, storage_buffer_entry, uniform_buffer_entry,
};

pub(crate) const CLEAR_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/clear_processor.wgsl")
);
pub(crate) const LOD_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/lod_processor.wgsl")
);
pub(crate) const REARRANGE_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/rearrange_processor.wgsl")
);
pub(crate) const GATHER_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/gather_processor.wgsl")
);

/// WGSL source of every stage kernel, shared prelude included
#[derive(Debug, Clone, Copy)]
pub struct StageSources<'a> {
    pub clear: &'a str,
    pub lod: &'a str,
    pub rearrange: &'a str,
    pub gather: &'a str,
}

impl Default for StageSources<'static> {
    fn default() -> Self {
        Self {
            clear: CLEAR_SHADER,
            lod: LOD_SHADER,
            rearrange: REARRANGE_SHADER,
            gather: GATHER_SHADER,
        }
    }
}

impl<'a> StageSources<'a> {
    /// (stage name, source) pairs in stage order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'a str)> {
        [
            ("clear", self.clear),
            ("lod", self.lod),
            ("rearrange", self.rearrange),
            ("gather", self.gather),
        ]
        .into_iter()
    }
}

/// One compiled stage
pub struct StagePipeline {
    pub pipeline: wgpu::ComputePipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl StagePipeline {
    fn new(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        entries: &[wgpu::BindGroupLayoutEntry],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Shader", label)),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Bind Group Layout", label)),
            entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", label)),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&format!("{} Pipeline", label)),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }
}

/// The four stage pipelines of a processor
pub struct ProcessorPipelines {
    pub clear: StagePipeline,
    pub lod: StagePipeline,
    pub rearrange: StagePipeline,
    pub gather: StagePipeline,
}

impl ProcessorPipelines {
    /// Build the pipelines of the bundled stage kernels
    pub fn new(device: &wgpu::Device, label: &str) -> GatherResult<Self> {
        Self::from_sources(device, label, &StageSources::default())
    }

    /// Build the pipelines from explicit kernel sources
    ///
    /// Shader or layout validation failures are returned as configuration
    /// errors instead of reaching the device's uncaptured error handler.
    pub fn from_sources(device: &wgpu::Device, label: &str, sources: &StageSources<'_>) -> GatherResult<Self> {
        use bindings::{clear, gather, lod, rearrange};

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let clear = StagePipeline::new(
            device,
            &format!("{} Clear", label),
            sources.clear,
            &[
                uniform_buffer_entry(clear::LAYOUT),
                storage_buffer_entry(clear::COUNT_DATA, false),
                storage_buffer_entry(clear::DISPATCH, false),
            ],
        );

        let lod = StagePipeline::new(
            device,
            &format!("{} Lod", label),
            sources.lod,
            &[
                uniform_buffer_entry(lod::LAYOUT),
                uniform_buffer_entry(lod::FRAME),
                storage_buffer_entry(lod::INPUT_DATA, true),
                storage_buffer_entry(lod::COUNT_DATA, false),
                storage_buffer_entry(lod::LOD_DATA, false),
                depth_pyramid_entry(lod::HIZ),
            ],
        );

        let mut rearrange_entries = vec![
            uniform_buffer_entry(rearrange::LAYOUT),
            storage_buffer_entry(rearrange::COUNT_DATA, false),
            storage_buffer_entry(rearrange::DISPATCH, false),
        ];
        rearrange_entries.extend(
            (0..CATEGORY_COUNT as u32).map(|c| storage_buffer_entry(rearrange::FIRST_TEMPLATE + c, true)),
        );
        rearrange_entries.push(storage_buffer_entry(rearrange::DRAW_ARGS, false));
        let rearrange = StagePipeline::new(
            device,
            &format!("{} Rearrange", label),
            sources.rearrange,
            &rearrange_entries,
        );

        let mut gather_entries = vec![
            uniform_buffer_entry(gather::LAYOUT),
            storage_buffer_entry(gather::COUNT_DATA, true),
            storage_buffer_entry(gather::LOD_DATA, true),
            storage_buffer_entry(gather::INPUT_DATA, true),
        ];
        gather_entries.extend(
            (0..CATEGORY_COUNT as u32).map(|c| storage_buffer_entry(gather::FIRST_OUTPUT + c, false)),
        );
        let gather = StagePipeline::new(
            device,
            &format!("{} Gather", label),
            sources.gather,
            &gather_entries,
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            log::error!("[ProcessorPipelines::new] '{}' stage kernels rejected: {}", label, error);
            return Err(configuration_error(format!(
                "stage pipelines for '{}' failed validation: {}",
                label, error
            )));
        }

        log::debug!("[ProcessorPipelines::new] Created stage pipelines for '{}'", label);

        Ok(Self {
            clear,
            lod,
            rearrange,
            gather,
        })
    }
}
