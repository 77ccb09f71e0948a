use super::category::{Category, PerCategory};
use crate::gpu::buffer_layouts::{calculations, usage, CountRow, IndirectDrawIndexedCommand};
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Read-only mesh category database
///
/// Supplies one immutable indexed-draw template per mesh, grouped by category.
/// The processor borrows the template buffers; it never writes them.
pub trait MeshCategorySource {
    /// Number of meshes (templates) in a category
    fn template_count(&self, category: Category) -> u32;

    /// GPU buffer holding the category's templates
    fn template_buffer(&self, category: Category) -> Arc<wgpu::Buffer>;

    /// Largest per-category mesh count; sizes the per-mesh counter rows
    fn max_sub_count(&self) -> u32 {
        Category::ALL
            .iter()
            .map(|&c| self.template_count(c))
            .max()
            .unwrap_or(0)
    }
}

/// Mesh category database backed by host-side template lists
pub struct MeshCategoryTable {
    templates: PerCategory<Vec<IndirectDrawIndexedCommand>>,
    buffers: PerCategory<Arc<wgpu::Buffer>>,
    max_sub: u32,
}

impl MeshCategoryTable {
    /// Upload one template buffer per category
    pub fn new(device: &wgpu::Device, templates: PerCategory<Vec<IndirectDrawIndexedCommand>>) -> Self {
        let buffers = templates.map(|category, commands| {
            let label = format!("Mesh Templates {}", category);
            let buffer = if commands.is_empty() {
                // Empty categories still get a bindable buffer
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&label),
                    size: calculations::template_buffer_size(0),
                    usage: usage::INDIRECT,
                    mapped_at_creation: false,
                })
            } else {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&label),
                    contents: bytemuck::cast_slice(commands),
                    usage: usage::INDIRECT,
                })
            };
            Arc::new(buffer)
        });

        let max_sub = templates.0.iter().map(|t| t.len() as u32).max().unwrap_or(0);

        log::debug!(
            "[MeshCategoryTable::new] Uploaded templates {:?}, maxSub {}",
            templates.0.iter().map(Vec::len).collect::<Vec<_>>(),
            max_sub
        );

        Self {
            templates,
            buffers,
            max_sub,
        }
    }

    /// Host copy of a category's templates
    pub fn templates(&self, category: Category) -> &[IndirectDrawIndexedCommand] {
        &self.templates[category]
    }
}

impl MeshCategorySource for MeshCategoryTable {
    fn template_count(&self, category: Category) -> u32 {
        self.templates[category].len() as u32
    }

    fn template_buffer(&self, category: Category) -> Arc<wgpu::Buffer> {
        Arc::clone(&self.buffers[category])
    }

    fn max_sub_count(&self) -> u32 {
        self.max_sub
    }
}

/// Per-mesh draws for one category
///
/// Each template is combined with its mesh's row: the instances of mesh `s`
/// occupy `[base, base + count)` of the category's output buffer.
pub fn compose_mesh_draws(
    templates: &[IndirectDrawIndexedCommand],
    rows: &[CountRow],
    category: Category,
) -> Vec<IndirectDrawIndexedCommand> {
    templates
        .iter()
        .zip(rows.iter())
        .map(|(template, row)| {
            template.with_instances(row.base[category.index()], row.count[category.index()])
        })
        .collect()
}
