/// Processor stage state machine
///
/// The four stages run in a fixed order, each closed by a memory barrier. In
/// wgpu a barrier is the end of a compute pass: every stage records its own
/// pass, and the next stage's pass only starts after the previous one ends.
use crate::error::{GatherError, GatherResult};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Constructed, no stage recorded yet
    Idle,
    /// Counters and dispatch block zeroed
    Cleared,
    /// LOD records and counters written
    Culled,
    /// Dispatch block and row bases written
    Rearranged,
    /// Output attributes written
    Gathered,
}

/// Resource classes made visible by the barrier closing a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Barrier {
    /// Storage writes only
    Storage,
    /// Storage writes plus indirect command reads
    StorageAndCommand,
}

impl Stage {
    /// Whether `next` may be recorded after `self`
    pub fn can_advance(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Idle | Stage::Cleared | Stage::Gathered, Stage::Cleared)
                | (Stage::Cleared, Stage::Culled)
                | (Stage::Culled, Stage::Rearranged)
                | (Stage::Rearranged, Stage::Gathered)
        )
    }

    /// Barrier issued when this stage completes
    pub fn barrier(self) -> Option<Barrier> {
        match self {
            Stage::Idle => None,
            Stage::Cleared | Stage::Gathered => Some(Barrier::StorageAndCommand),
            Stage::Culled | Stage::Rearranged => Some(Barrier::Storage),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Cleared => "clear",
            Stage::Culled => "lod",
            Stage::Rearranged => "rearrange",
            Stage::Gathered => "gather",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the current stage and completed frames
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: Stage,
    frames: u64,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: Stage::Idle,
            frames: 0,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Frames that reached the Gather stage
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Check a transition without taking it
    pub fn check(&self, next: Stage) -> GatherResult<()> {
        if self.current.can_advance(next) {
            Ok(())
        } else {
            Err(GatherError::StageOrder {
                current: self.current,
                requested: next,
            })
        }
    }

    /// Take a transition, returning the barrier that closes the new stage
    pub fn advance(&mut self, next: Stage) -> GatherResult<Option<Barrier>> {
        self.check(next)?;
        self.current = next;
        if next == Stage::Gathered {
            self.frames += 1;
        }
        Ok(next.barrier())
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
