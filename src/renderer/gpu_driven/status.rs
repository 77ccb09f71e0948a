use super::category::{Category, PerCategory};
use super::indirect_commands::compose_mesh_draws;
use super::stage::Stage;
use crate::error::{GatherError, GatherResult};
use crate::gpu::buffer_layouts::{
    CountHeader, CountRow, DispatchIndirectCommand, IndirectDrawIndexedCommand,
};
use std::fmt;

/// Static state report of a processor
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorStatus {
    pub label: String,
    pub template_counts: PerCategory<u32>,
    pub max_sub: u32,
    pub capacities: PerCategory<u32>,
    pub lod_capacities: PerCategory<u32>,
    pub input_capacity: u32,
    pub input_count: u32,
    pub input_pushed: bool,
    pub stage: Stage,
    pub frames: u64,
    pub owned_bytes: u64,
}

impl fmt::Display for ProcessorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        for (category, count) in self.template_counts.iter() {
            writeln!(
                f,
                "  {:<12} templates {:>5}  capacity {:>8}  lod region {:>8}",
                category,
                count,
                self.capacities[category],
                self.lod_capacities[category]
            )?;
        }
        writeln!(f, "  maxSub {}", self.max_sub)?;
        writeln!(
            f,
            "  input {}/{} (pushed: {})",
            self.input_count, self.input_capacity, self.input_pushed
        )?;
        write!(
            f,
            "  stage {}, frames {}, {:.2} MB owned",
            self.stage,
            self.frames,
            self.owned_bytes as f64 / (1024.0 * 1024.0)
        )
    }
}

/// Counter channel and dispatch block read back after a frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCounts {
    pub header: CountHeader,
    pub rows: Vec<CountRow>,
    pub dispatch: DispatchIndirectCommand,
}

impl FrameCounts {
    /// Survivors counted for a category (may exceed capacity on overflow)
    pub fn count(&self, category: Category) -> u32 {
        self.header.total(category.index())
    }

    pub fn counts(&self) -> PerCategory<u32> {
        PerCategory::from_fn(|c| self.count(c))
    }

    pub fn survivors(&self) -> u32 {
        self.header.survivors()
    }

    /// LOD writes rejected by the capacity check
    pub fn overflow(&self) -> u32 {
        self.header.overflow()
    }

    /// Survivors that reached the Gather stage
    pub fn work_items(&self) -> u32 {
        self.header.work_items()
    }

    /// Instances of `mesh` within a category and the first slot they occupy
    pub fn mesh_range(&self, category: Category, mesh: u32) -> Option<(u32, u32)> {
        self.rows
            .get(mesh as usize)
            .map(|row| (row.base[category.index()], row.count[category.index()]))
    }

    /// Report an observed overflow as a fatal capacity error
    pub fn check_capacity(&self, lod_capacities: &PerCategory<u32>) -> GatherResult<()> {
        for category in Category::ALL {
            let requested = self.count(category);
            let capacity = lod_capacities[category];
            if requested > capacity {
                log::error!(
                    "[FrameCounts::check_capacity] {} survivors in {} exceed capacity {}",
                    requested,
                    category,
                    capacity
                );
                return Err(GatherError::CapacityOverflow {
                    category,
                    requested,
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Per-mesh draw commands for a category
    pub fn mesh_draws(
        &self,
        category: Category,
        templates: &[IndirectDrawIndexedCommand],
    ) -> Vec<IndirectDrawIndexedCommand> {
        compose_mesh_draws(templates, &self.rows, category)
    }
}

impl fmt::Display for FrameCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (category, count) in self.counts().iter() {
            write!(f, "{}={} ", category, count)?;
        }
        write!(
            f,
            "| work items {} in {} groups, overflow {}",
            self.work_items(),
            self.dispatch.x,
            self.overflow()
        )
    }
}
