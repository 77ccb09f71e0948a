//! Compute stage buffer layout definitions
//!
//! The counter channel is a `CountHeader` followed by `maxSub` `CountRow`s.
//! LOD increments header totals (dense LOD slots) and the row of the object's
//! mesh; Rearrange fills row bases and the header gather table.

use crate::constants::category::{CATEGORY_COUNT, COUNTER_LANES, OVERFLOW_LANE, TOTAL_LANE};
use bytemuck::{Pod, Zeroable};

/// Header of the counter channel
/// Total size: 64 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CountHeader {
    /// Atomic survivor count per category; lane 5 counts rejected overflow writes
    pub totals: [u32; COUNTER_LANES],

    /// First linear Gather index of each category; lane 5 is the work item total
    pub gather_base: [u32; COUNTER_LANES],
}

impl CountHeader {
    #[inline]
    pub fn total(&self, category: usize) -> u32 {
        self.totals[category]
    }

    #[inline]
    pub fn overflow(&self) -> u32 {
        self.totals[OVERFLOW_LANE]
    }

    #[inline]
    pub fn work_items(&self) -> u32 {
        self.gather_base[TOTAL_LANE]
    }

    /// Sum of all category totals
    pub fn survivors(&self) -> u32 {
        self.totals[..CATEGORY_COUNT].iter().sum()
    }
}

/// Per-mesh sub-partition row
/// Total size: 64 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CountRow {
    /// Survivors of this mesh per category (atomic on the GPU)
    pub count: [u32; COUNTER_LANES],

    /// First output slot of this mesh per category
    pub base: [u32; COUNTER_LANES],
}

/// Static processor layout, written once at construction and bound in every stage
/// Total size: 144 bytes
///
/// Category `c` lives at `[c / 4][c % 4]` of each table.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct LayoutUniforms {
    /// Template (mesh) count per category; `[1][0]` is the transparent sub-count
    pub mesh_counts: [[u32; 4]; 2],

    /// Output capacity per category
    pub capacity: [[u32; 4]; 2],

    /// First LOD record of each category region
    pub lod_base: [[u32; 4]; 2],

    /// LOD region capacity per category
    pub lod_capacity: [[u32; 4]; 2],

    /// x = maxSub, y = input capacity, z/w unused
    pub limits: [u32; 4],
}

impl LayoutUniforms {
    /// Pack per-category tables into the uniform layout
    pub fn new(
        mesh_counts: [u32; CATEGORY_COUNT],
        capacity: [u32; CATEGORY_COUNT],
        lod_capacity: [u32; CATEGORY_COUNT],
        max_sub: u32,
        input_capacity: u32,
    ) -> Self {
        let mut lod_base = [0u32; CATEGORY_COUNT];
        let mut running = 0;
        for (base, region) in lod_base.iter_mut().zip(lod_capacity.iter()) {
            *base = running;
            running += region;
        }

        Self {
            mesh_counts: pack(&mesh_counts),
            capacity: pack(&capacity),
            lod_base: pack(&lod_base),
            lod_capacity: pack(&lod_capacity),
            limits: [max_sub, input_capacity, 0, 0],
        }
    }

    #[inline]
    pub fn mesh_count(&self, category: usize) -> u32 {
        unpack(&self.mesh_counts, category)
    }

    #[inline]
    pub fn capacity(&self, category: usize) -> u32 {
        unpack(&self.capacity, category)
    }

    #[inline]
    pub fn lod_base(&self, category: usize) -> u32 {
        unpack(&self.lod_base, category)
    }

    #[inline]
    pub fn lod_capacity(&self, category: usize) -> u32 {
        unpack(&self.lod_capacity, category)
    }

    #[inline]
    pub fn max_sub(&self) -> u32 {
        self.limits[0]
    }

    #[inline]
    pub fn input_capacity(&self) -> u32 {
        self.limits[1]
    }

    /// Total LOD records across all category regions
    pub fn lod_records(&self) -> u32 {
        (0..CATEGORY_COUNT).map(|c| self.lod_capacity(c)).sum()
    }
}

fn pack(values: &[u32; CATEGORY_COUNT]) -> [[u32; 4]; 2] {
    let mut table = [[0u32; 4]; 2];
    for (c, value) in values.iter().enumerate() {
        table[c / 4][c % 4] = *value;
    }
    table
}

#[inline]
fn unpack(table: &[[u32; 4]; 2], category: usize) -> u32 {
    table[category / 4][category % 4]
}
