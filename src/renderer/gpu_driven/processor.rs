/// Visibility and instance compaction processor
///
/// Owns the buffer set and drives the four compute stages:
///
/// 1. Clear: zero counters and the dispatch block
/// 2. LOD: cull each input object, pick its LOD, claim a dense slot
/// 3. Rearrange: turn counters into per-mesh bases, per-mesh draw arguments
///    and Gather dispatch args
/// 4. Gather: indirect dispatch writing compacted per-category outputs
///
/// Each stage records its own compute pass; the end of a pass is the barrier
/// that makes its writes visible to the next stage.
use super::buffer_set::{output_channel, template_channel, BufferSet, UsageHint};
use super::category::{Category, PerCategory};
use super::indirect_commands::MeshCategorySource;
use super::instance_buffer::ObjectSource;
use super::lod_system::LodParam;
use super::pipelines::ProcessorPipelines;
use super::stage::{Stage, StageTracker};
use super::status::{FrameCounts, ProcessorStatus};
use crate::config::ProcessorConfig;
use crate::constants::channels::*;
use crate::constants::dispatch::workgroups_for;
use crate::error::{configuration_error, gpu_operation_error, GatherError, GatherErrorContext, GatherResult};
use crate::gpu::buffer_layouts::{
    calculations, usage, CountHeader, CountRow, DispatchIndirectCommand, IndirectDrawIndexedCommand,
    LayoutUniforms, LodRecord, OutputAttribute, DISPATCH_BLOCK_SIZE, FRAME_UNIFORMS_SIZE,
    INDIRECT_INDEXED_COMMAND_SIZE,
};
use crate::gpu::{read_records, validate_all_gpu_types};
use crate::renderer::gpu_culling::{DepthPyramid, HizSource};
use std::sync::Arc;
use wgpu::util::DeviceExt;

pub struct Processor {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: ProcessorConfig,

    buffers: BufferSet,
    pipelines: ProcessorPipelines,
    layout: LayoutUniforms,
    layout_buffer: wgpu::Buffer,
    frame_buffer: wgpu::Buffer,

    clear_bind_group: wgpu::BindGroup,
    rearrange_bind_group: wgpu::BindGroup,
    gather_bind_group: wgpu::BindGroup,

    /// Binds a 1x1 pyramid when occlusion is off; never read
    placeholder_lod_bind_group: wgpu::BindGroup,
    /// LOD bind group of the last Hi-Z view seen
    hiz_lod_bind_group: Option<(wgpu::Id<wgpu::TextureView>, wgpu::BindGroup)>,

    template_counts: PerCategory<u32>,
    draw_offsets: PerCategory<u64>,
    capacities: PerCategory<u32>,
    lod_capacities: PerCategory<u32>,
    max_sub: u32,
    input_capacity: u32,

    input_object_count: u32,
    input_pushed: bool,
    stages: StageTracker,
}

/// Owned and borrowed channels plus the two uniform blocks
struct Allocation {
    buffers: BufferSet,
    layout_buffer: wgpu::Buffer,
    frame_buffer: wgpu::Buffer,
    placeholder_hiz: DepthPyramid,
}

impl Processor {
    /// Size and allocate every channel, borrow the template buffers and build
    /// the stage pipelines
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        meshes: &dyn MeshCategorySource,
        objects: &dyn ObjectSource,
        config: ProcessorConfig,
    ) -> GatherResult<Self> {
        validate_all_gpu_types().map_err(configuration_error)?;

        let template_counts = PerCategory::from_fn(|c| meshes.template_count(c));
        let max_sub = meshes.max_sub_count();
        if let Some((category, count)) = template_counts.iter().find(|(_, count)| **count > max_sub) {
            return Err(configuration_error(format!(
                "{} has {} templates but maxSub is {}",
                category, count, max_sub
            )));
        }

        let templates = PerCategory::from_fn(|c| meshes.template_buffer(c));
        if let Some((category, _)) = templates
            .iter()
            .find(|(_, buffer)| !buffer.usage().contains(wgpu::BufferUsages::STORAGE))
        {
            return Err(configuration_error(format!(
                "{} template buffer is not bindable as storage",
                category
            )));
        }

        let input_capacity = objects.max_object_count();
        if input_capacity == 0 {
            return Err(configuration_error("maximum object count is zero"));
        }

        let capacities = PerCategory::from_fn(|c| objects.max_category_count(c));
        if let Some((category, _)) = capacities.iter().find(|(_, capacity)| **capacity == 0) {
            return Err(GatherError::ZeroCapacity { category });
        }

        // A category never holds more survivors than there are inputs
        let lod_capacities = capacities.map(|_, &capacity| capacity.min(input_capacity));

        let layout = LayoutUniforms::new(
            template_counts.values(),
            capacities.values(),
            lod_capacities.values(),
            max_sub,
            input_capacity,
        );

        // Draw arguments are laid out category-major
        let mut draw_records = 0u32;
        let draw_offsets = template_counts.map(|_, &count| {
            let offset = draw_records as u64 * INDIRECT_INDEXED_COMMAND_SIZE;
            draw_records += count;
            offset
        });

        check_device_limits(&device.limits(), &layout, &capacities, draw_records)?;

        let pipelines = ProcessorPipelines::new(&device, &config.label)?;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let allocation = allocate(&device, &config, &layout, &capacities, &templates, draw_records);

        // Both scopes are popped before any error is reported
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(error) = out_of_memory {
            return Err(gpu_operation_error("allocate buffer set", error));
        }
        if let Some(error) = validation {
            return Err(configuration_error(format!("buffer set rejected: {}", error)));
        }
        let Allocation {
            buffers,
            layout_buffer,
            frame_buffer,
            placeholder_hiz,
        } = allocation?;

        buffers.validate()?;

        let clear_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&config.label_for("Clear Bind Group")),
            layout: &pipelines.clear.bind_group_layout,
            entries: &[
                buffer_entry(0, &layout_buffer),
                buffer_entry(1, buffers.buffer(COUNT_DATA)?),
                buffer_entry(2, buffers.buffer(DISPATCH)?),
            ],
        });

        let rearrange_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&config.label_for("Rearrange Bind Group")),
            layout: &pipelines.rearrange.bind_group_layout,
            entries: &[
                buffer_entry(0, &layout_buffer),
                buffer_entry(1, buffers.buffer(COUNT_DATA)?),
                buffer_entry(2, buffers.buffer(DISPATCH)?),
                buffer_entry(3, buffers.buffer(IND_NORMAL)?),
                buffer_entry(4, buffers.buffer(IND_SINGLE)?),
                buffer_entry(5, buffers.buffer(IND_BILLBOARD)?),
                buffer_entry(6, buffers.buffer(IND_ANIMATED)?),
                buffer_entry(7, buffers.buffer(IND_TRANSPARENT)?),
                buffer_entry(8, buffers.buffer(DRAW_ARGS)?),
            ],
        });

        let gather_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&config.label_for("Gather Bind Group")),
            layout: &pipelines.gather.bind_group_layout,
            entries: &[
                buffer_entry(0, &layout_buffer),
                buffer_entry(1, buffers.buffer(COUNT_DATA)?),
                buffer_entry(2, buffers.buffer(LOD_DATA)?),
                buffer_entry(3, buffers.buffer(INPUT_DATA)?),
                buffer_entry(4, buffers.buffer(OUTPUT_NORMAL)?),
                buffer_entry(5, buffers.buffer(OUTPUT_SINGLE)?),
                buffer_entry(6, buffers.buffer(OUTPUT_BILLBOARD)?),
                buffer_entry(7, buffers.buffer(OUTPUT_ANIMATED)?),
                buffer_entry(8, buffers.buffer(OUTPUT_TRANSPARENT)?),
            ],
        });

        let placeholder_lod_bind_group = lod_bind_group(
            &device,
            &pipelines,
            &layout_buffer,
            &frame_buffer,
            &buffers,
            placeholder_hiz.depth_view(),
            &config.label_for("Lod Bind Group"),
        )?;

        log::info!(
            "[Processor::new] '{}' ready: templates {:?}, maxSub {}, capacities {:?}, input {}, {:.2} MB",
            config.label,
            template_counts.0,
            max_sub,
            capacities.0,
            input_capacity,
            buffers.owned_bytes() as f64 / (1024.0 * 1024.0)
        );

        Ok(Self {
            device,
            queue,
            config,
            buffers,
            pipelines,
            layout,
            layout_buffer,
            frame_buffer,
            clear_bind_group,
            rearrange_bind_group,
            gather_bind_group,
            placeholder_lod_bind_group,
            hiz_lod_bind_group: None,
            template_counts,
            draw_offsets,
            capacities,
            lod_capacities,
            max_sub,
            input_capacity,
            input_object_count: 0,
            input_pushed: false,
            stages: StageTracker::new(),
        })
    }

    /// Upload the object database's current objects
    ///
    /// Returns whether a push happened. The next LOD stage always covers the
    /// database's current count; an empty database skips the upload and leaves
    /// the input buffer and the push flag untouched.
    pub fn update(&mut self, objects: &dyn ObjectSource) -> GatherResult<bool> {
        let input = objects.input_objects();
        let count = input.len() as u32;

        if count == 0 {
            self.input_object_count = 0;
            log::trace!("[Processor::update] No input objects, nothing pushed");
            return Ok(false);
        }

        if count > self.input_capacity {
            return Err(GatherError::InputOverflow {
                requested: count,
                capacity: self.input_capacity,
            });
        }

        self.queue
            .write_buffer(self.buffers.buffer(INPUT_DATA)?, 0, bytemuck::cast_slice(input));
        self.input_object_count = count;
        self.input_pushed = true;

        log::trace!("[Processor::update] Pushed {} input objects", count);
        Ok(true)
    }

    /// Stage 1: zero the counters and the dispatch block
    pub fn clear(&mut self, encoder: &mut wgpu::CommandEncoder) -> GatherResult<()> {
        self.stages.check(Stage::Cleared)?;

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&self.config.label_for("Clear Pass")),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.clear.pipeline);
            pass.set_bind_group(0, &self.clear_bind_group, &[]);
            pass.dispatch_workgroups(self.max_sub.max(1), 1, 1);
        }

        self.finish_stage(Stage::Cleared)
    }

    /// Stage 2: cull, select LOD and claim slots for every input object
    ///
    /// Frame uniforms go through `Queue::write_buffer`, so they take effect at
    /// the next submission: record one LOD stage per submission.
    pub fn lod(&mut self, encoder: &mut wgpu::CommandEncoder, param: &LodParam<'_>) -> GatherResult<()> {
        self.stages.check(Stage::Culled)?;

        let count = self.input_object_count;
        if count == 0 {
            log::trace!("[Processor::lod] No input objects, dispatch skipped");
            return self.finish_stage(Stage::Culled);
        }

        let occlusion = param.occlusion_enabled(&self.config);
        if occlusion {
            let view = param.hiz.ok_or(GatherError::MissingHiz)?.depth_view();
            let id = view.global_id();
            if !matches!(&self.hiz_lod_bind_group, Some((cached, _)) if *cached == id) {
                log::debug!("[Processor::lod] Binding new Hi-Z view {:?}", id);
                let group = lod_bind_group(
                    &self.device,
                    &self.pipelines,
                    &self.layout_buffer,
                    &self.frame_buffer,
                    &self.buffers,
                    view,
                    &self.config.label_for("Lod Hi-Z Bind Group"),
                )?;
                self.hiz_lod_bind_group = Some((id, group));
            }
        }

        let uniforms = param.frame_uniforms(count, &self.config);
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = match (&self.hiz_lod_bind_group, occlusion) {
            (Some((_, group)), true) => group,
            _ => &self.placeholder_lod_bind_group,
        };

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&self.config.label_for("Lod Pass")),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.lod.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups_for(count), 1, 1);
        }

        self.finish_stage(Stage::Culled)
    }

    /// Stage 3: per-mesh bases, Gather base table and dispatch block
    pub fn rearrange(&mut self, encoder: &mut wgpu::CommandEncoder) -> GatherResult<()> {
        self.stages.check(Stage::Rearranged)?;

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&self.config.label_for("Rearrange Pass")),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.rearrange.pipeline);
            pass.set_bind_group(0, &self.rearrange_bind_group, &[]);
            pass.dispatch_workgroups(self.max_sub.max(1), 1, 1);
        }

        self.finish_stage(Stage::Rearranged)
    }

    /// Stage 4: indirect dispatch writing the compacted outputs
    pub fn gather(&mut self, encoder: &mut wgpu::CommandEncoder) -> GatherResult<()> {
        self.stages.check(Stage::Gathered)?;

        {
            let dispatch = self.buffers.buffer(DISPATCH)?;
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&self.config.label_for("Gather Pass")),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.gather.pipeline);
            pass.set_bind_group(0, &self.gather_bind_group, &[]);
            pass.dispatch_workgroups_indirect(dispatch, 0);
        }

        self.finish_stage(Stage::Gathered)
    }

    /// All four stages in order
    pub fn run_frame(&mut self, encoder: &mut wgpu::CommandEncoder, param: &LodParam<'_>) -> GatherResult<()> {
        self.clear(encoder)?;
        self.lod(encoder, param)?;
        self.rearrange(encoder)?;
        self.gather(encoder)
    }

    fn finish_stage(&mut self, stage: Stage) -> GatherResult<()> {
        let barrier = self.stages.advance(stage)?;
        log::trace!(
            "[Processor::{}] Stage recorded, closed by {:?} barrier",
            stage,
            barrier
        );
        Ok(())
    }

    /// Output buffer of a category, bindable as a per-instance vertex buffer
    pub fn output_buffer(&self, category: Category) -> GatherResult<&wgpu::Buffer> {
        self.buffers.buffer(output_channel(category))
    }

    /// Borrowed template buffer of a category
    pub fn template_buffer(&self, category: Category) -> GatherResult<&wgpu::Buffer> {
        self.buffers.buffer(template_channel(category))
    }

    /// Per-mesh draw arguments of every category, written by Rearrange
    ///
    /// Holds `template_count(c)` indexed-draw commands for each category at
    /// `draw_offset(c)`, ready for `draw_indexed_indirect` or
    /// `multi_draw_indexed_indirect`.
    pub fn draw_buffer(&self) -> GatherResult<&wgpu::Buffer> {
        self.buffers.buffer(DRAW_ARGS)
    }

    /// Byte offset of a category's first draw command in `draw_buffer`
    pub fn draw_offset(&self, category: Category) -> u64 {
        self.draw_offsets[category]
    }

    /// Counter channel: header then `max_sub` per-mesh rows
    pub fn count_buffer(&self) -> GatherResult<&wgpu::Buffer> {
        self.buffers.buffer(COUNT_DATA)
    }

    pub fn dispatch_buffer(&self) -> GatherResult<&wgpu::Buffer> {
        self.buffers.buffer(DISPATCH)
    }

    pub fn buffers(&self) -> &BufferSet {
        &self.buffers
    }

    pub fn layout(&self) -> &LayoutUniforms {
        &self.layout
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stages.current()
    }

    pub fn frames(&self) -> u64 {
        self.stages.frames()
    }

    /// Whether any `update` has pushed objects; never reset
    pub fn input_pushed(&self) -> bool {
        self.input_pushed
    }

    /// Object count used by the next LOD stage
    pub fn input_object_count(&self) -> u32 {
        self.input_object_count
    }

    pub fn template_count(&self, category: Category) -> u32 {
        self.template_counts[category]
    }

    pub fn capacity(&self, category: Category) -> u32 {
        self.capacities[category]
    }

    pub fn lod_capacities(&self) -> &PerCategory<u32> {
        &self.lod_capacities
    }

    pub fn max_sub(&self) -> u32 {
        self.max_sub
    }

    /// Every channel registered
    pub fn validate(&self) -> GatherResult<()> {
        self.buffers.validate()
    }

    pub fn status(&self) -> ProcessorStatus {
        ProcessorStatus {
            label: self.config.label.clone(),
            template_counts: self.template_counts,
            max_sub: self.max_sub,
            capacities: self.capacities,
            lod_capacities: self.lod_capacities,
            input_capacity: self.input_capacity,
            input_count: self.input_object_count,
            input_pushed: self.input_pushed,
            stage: self.stages.current(),
            frames: self.stages.frames(),
            owned_bytes: self.buffers.owned_bytes(),
        }
    }

    /// Log the status report; fails when the input channel is missing
    pub fn show_log(&self) -> GatherResult<()> {
        if !self.buffers.is_present(INPUT_DATA) {
            log::error!("[Processor::show_log] '{}' has no input channel", self.config.label);
            return Err(GatherError::MissingChannel {
                channel: INPUT_DATA,
            });
        }

        log::info!("[Processor::show_log] {}", self.status());
        Ok(())
    }

    /// Read back the counter channel and dispatch block
    ///
    /// Diagnostic only: submits a copy and blocks on the device.
    pub async fn read_counts(&self) -> GatherResult<FrameCounts> {
        let records: Vec<CountRow> = read_records(
            &self.device,
            &self.queue,
            self.buffers.buffer(COUNT_DATA)?,
            1 + self.max_sub.max(1) as usize,
            &self.config.label_for("Counters"),
        )
        .await?;

        let (first, rows) = records
            .split_first()
            .gather_context("counter readback returned no header")?;
        let header: CountHeader = bytemuck::cast(*first);

        let dispatch: Vec<DispatchIndirectCommand> = read_records(
            &self.device,
            &self.queue,
            self.buffers.buffer(DISPATCH)?,
            1,
            &self.config.label_for("Dispatch Block"),
        )
        .await?;

        Ok(FrameCounts {
            header,
            rows: rows[..self.max_sub as usize].to_vec(),
            dispatch: dispatch
                .first()
                .copied()
                .gather_context("dispatch readback returned no record")?,
        })
    }

    /// Read back the live LOD records of a category, in slot order
    pub async fn read_lod_records(&self, category: Category) -> GatherResult<Vec<LodRecord>> {
        let counts = self.read_counts().await?;
        let live = counts.count(category).min(self.lod_capacities[category]);
        let base = self.layout.lod_base(category.index()) as usize;

        let records: Vec<LodRecord> = read_records(
            &self.device,
            &self.queue,
            self.buffers.buffer(LOD_DATA)?,
            base + live as usize,
            &self.config.label_for("Lod Records"),
        )
        .await?;

        Ok(records[base..].to_vec())
    }

    /// Read back a category's draw arguments
    pub async fn read_draws(&self, category: Category) -> GatherResult<Vec<IndirectDrawIndexedCommand>> {
        let count = self.template_counts[category] as usize;
        if count == 0 {
            return Ok(Vec::new());
        }
        let first = (self.draw_offsets[category] / INDIRECT_INDEXED_COMMAND_SIZE) as usize;

        let records: Vec<IndirectDrawIndexedCommand> = read_records(
            &self.device,
            &self.queue,
            self.draw_buffer()?,
            first + count,
            &self.config.label_for("Draw Arguments"),
        )
        .await?;

        Ok(records[first..].to_vec())
    }

    /// Read back the live output records of a category
    pub async fn read_outputs(&self, category: Category) -> GatherResult<Vec<OutputAttribute>> {
        let counts = self.read_counts().await?;
        let live = counts.count(category).min(self.lod_capacities[category]);

        read_records(
            &self.device,
            &self.queue,
            self.output_buffer(category)?,
            live as usize,
            &self.config.label_for(&format!("Output {}", category)),
        )
        .await
    }
}

fn buffer_entry(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

/// Allocate every owned channel, borrow the templates and create the uniforms
fn allocate(
    device: &wgpu::Device,
    config: &ProcessorConfig,
    layout: &LayoutUniforms,
    capacities: &PerCategory<u32>,
    templates: &PerCategory<Arc<wgpu::Buffer>>,
    draw_records: u32,
) -> GatherResult<Allocation> {
    let mut buffers = BufferSet::new();
    buffers.allocate(
        device,
        DISPATCH,
        config.label_for("Dispatch Block"),
        DISPATCH_BLOCK_SIZE,
        usage::INDIRECT,
        UsageHint::Stream,
    )?;
    buffers.allocate(
        device,
        COUNT_DATA,
        config.label_for("Counters"),
        calculations::count_data_size(layout.max_sub()),
        usage::STORAGE_READ,
        UsageHint::Stream,
    )?;
    for category in Category::ALL {
        buffers.borrow(
            template_channel(category),
            config.label_for(&format!("Templates {}", category)),
            Arc::clone(&templates[category]),
            UsageHint::Static,
        )?;
    }
    buffers.allocate(
        device,
        INPUT_DATA,
        config.label_for("Input Objects"),
        calculations::input_buffer_size(layout.input_capacity()),
        usage::STORAGE_READ,
        UsageHint::Dynamic,
    )?;
    buffers.allocate(
        device,
        LOD_DATA,
        config.label_for("Lod Records"),
        calculations::lod_buffer_size(layout.lod_records()),
        usage::STORAGE_READ,
        UsageHint::Stream,
    )?;
    for category in Category::ALL {
        buffers.allocate(
            device,
            output_channel(category),
            config.label_for(&format!("Output {}", category)),
            calculations::output_buffer_size(capacities[category]),
            usage::ATTRIBUTE,
            UsageHint::Stream,
        )?;
    }
    buffers.allocate(
        device,
        DRAW_ARGS,
        config.label_for("Draw Arguments"),
        calculations::draw_args_size(draw_records),
        usage::INDIRECT,
        UsageHint::Stream,
    )?;

    let layout_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&config.label_for("Layout Uniforms")),
        contents: bytemuck::bytes_of(layout),
        usage: usage::UNIFORM,
    });
    let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&config.label_for("Frame Uniforms")),
        size: FRAME_UNIFORMS_SIZE,
        usage: usage::UNIFORM,
        mapped_at_creation: false,
    });

    Ok(Allocation {
        buffers,
        layout_buffer,
        frame_buffer,
        placeholder_hiz: DepthPyramid::new(device, 1, 1),
    })
}

fn lod_bind_group(
    device: &wgpu::Device,
    pipelines: &ProcessorPipelines,
    layout_buffer: &wgpu::Buffer,
    frame_buffer: &wgpu::Buffer,
    buffers: &BufferSet,
    hiz_view: &wgpu::TextureView,
    label: &str,
) -> GatherResult<wgpu::BindGroup> {
    Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &pipelines.lod.bind_group_layout,
        entries: &[
            buffer_entry(0, layout_buffer),
            buffer_entry(1, frame_buffer),
            buffer_entry(2, buffers.buffer(INPUT_DATA)?),
            buffer_entry(3, buffers.buffer(COUNT_DATA)?),
            buffer_entry(4, buffers.buffer(LOD_DATA)?),
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(hiz_view),
            },
        ],
    }))
}

/// Reject layouts the device cannot bind or dispatch
pub(crate) fn check_device_limits(
    limits: &wgpu::Limits,
    layout: &LayoutUniforms,
    capacities: &PerCategory<u32>,
    draw_records: u32,
) -> GatherResult<()> {
    let max_binding = limits.max_storage_buffer_binding_size as u64;
    let sizes = [
        ("input", calculations::input_buffer_size(layout.input_capacity())),
        ("lod", calculations::lod_buffer_size(layout.lod_records())),
        ("counter", calculations::count_data_size(layout.max_sub())),
        ("draw argument", calculations::draw_args_size(draw_records)),
    ];
    for (name, size) in sizes
        .into_iter()
        .chain(capacities.0.iter().map(|&c| ("output", calculations::output_buffer_size(c))))
    {
        if size > max_binding {
            return Err(configuration_error(format!(
                "{} buffer needs {} bytes, device binding limit is {}",
                name, size, max_binding
            )));
        }
    }

    let max_groups = limits.max_compute_workgroups_per_dimension;
    let dispatches = [
        ("lod", workgroups_for(layout.input_capacity())),
        ("gather", workgroups_for(layout.lod_records())),
        ("clear/rearrange", layout.max_sub().max(1)),
    ];
    for (stage, groups) in dispatches {
        if groups > max_groups {
            return Err(configuration_error(format!(
                "{} stage needs {} workgroups, device limit is {}",
                stage, groups, max_groups
            )));
        }
    }

    Ok(())
}
