/// Processor buffer set
///
/// A fixed registry of fifteen channels addressed by stable slot numbers
/// (see `constants::channels`). Channels are filled once at construction and
/// never reallocated. Template channels are borrowed from the mesh database;
/// every other channel is owned and destroyed with the set.
use super::category::Category;
use crate::constants::channels::*;
use crate::error::{configuration_error, GatherError, GatherResult};
use std::sync::Arc;

/// Expected update frequency of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageHint {
    /// Written once (templates)
    Static,
    /// Rewritten on demand from the host (input objects)
    Dynamic,
    /// Rewritten by the GPU every frame (counters, LOD records, outputs)
    Stream,
}

/// One registered channel
#[derive(Debug)]
pub struct ChannelBuffer {
    buffer: Arc<wgpu::Buffer>,
    label: String,
    hint: UsageHint,
    owned: bool,
}

impl ChannelBuffer {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn hint(&self) -> UsageHint {
        self.hint
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

/// Channel slot of a category's template buffer
#[inline]
pub fn template_channel(category: Category) -> usize {
    IND_NORMAL + category.index()
}

/// Channel slot of a category's output buffer
#[inline]
pub fn output_channel(category: Category) -> usize {
    OUTPUT_NORMAL + category.index()
}

pub struct BufferSet {
    channels: Vec<Option<ChannelBuffer>>,
}

impl BufferSet {
    pub fn new() -> Self {
        Self {
            channels: (0..CHANNEL_COUNT).map(|_| None).collect(),
        }
    }

    /// Create and register an owned buffer
    pub fn allocate(
        &mut self,
        device: &wgpu::Device,
        channel: usize,
        label: String,
        size: u64,
        usage: wgpu::BufferUsages,
        hint: UsageHint,
    ) -> GatherResult<()> {
        self.check_free(channel)?;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            size,
            usage,
            mapped_at_creation: false,
        });

        log::debug!(
            "[BufferSet::allocate] Channel {} '{}': {} bytes, {:?}",
            channel, label, size, hint
        );

        self.channels[channel] = Some(ChannelBuffer {
            buffer: Arc::new(buffer),
            label,
            hint,
            owned: true,
        });
        Ok(())
    }

    /// Register a buffer owned elsewhere
    pub fn borrow(
        &mut self,
        channel: usize,
        label: String,
        buffer: Arc<wgpu::Buffer>,
        hint: UsageHint,
    ) -> GatherResult<()> {
        self.check_free(channel)?;

        log::debug!(
            "[BufferSet::borrow] Channel {} '{}': {} bytes (borrowed)",
            channel,
            label,
            buffer.size()
        );

        self.channels[channel] = Some(ChannelBuffer {
            buffer,
            label,
            hint,
            owned: false,
        });
        Ok(())
    }

    pub fn get(&self, channel: usize) -> Option<&ChannelBuffer> {
        self.channels.get(channel).and_then(Option::as_ref)
    }

    /// Buffer of a registered channel
    pub fn buffer(&self, channel: usize) -> GatherResult<&wgpu::Buffer> {
        self.get(channel)
            .map(ChannelBuffer::buffer)
            .ok_or(GatherError::MissingChannel { channel })
    }

    pub fn is_present(&self, channel: usize) -> bool {
        self.get(channel).is_some()
    }

    /// Every channel must be registered before any stage runs
    pub fn validate(&self) -> GatherResult<()> {
        match (0..CHANNEL_COUNT).find(|&channel| !self.is_present(channel)) {
            Some(channel) => Err(GatherError::MissingChannel { channel }),
            None => Ok(()),
        }
    }

    /// Bytes held by owned channels
    pub fn owned_bytes(&self) -> u64 {
        self.channels
            .iter()
            .flatten()
            .filter(|c| c.owned)
            .map(ChannelBuffer::size)
            .sum()
    }

    /// Destroy owned buffers and forget borrowed ones
    pub fn release(&mut self) {
        for channel in self.channels.iter_mut() {
            if let Some(entry) = channel.take() {
                if entry.owned {
                    entry.buffer.destroy();
                }
            }
        }
    }

    fn check_free(&self, channel: usize) -> GatherResult<()> {
        match self.channels.get(channel) {
            None => Err(configuration_error(format!(
                "channel {} outside the {} fixed slots",
                channel, CHANNEL_COUNT
            ))),
            Some(Some(existing)) => Err(configuration_error(format!(
                "channel {} already holds '{}'",
                channel, existing.label
            ))),
            Some(None) => Ok(()),
        }
    }
}

impl Default for BufferSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BufferSet {
    fn drop(&mut self) {
        self.release();
    }
}
