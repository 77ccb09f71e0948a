use super::category::{Category, PerCategory};
use crate::gpu::buffer_layouts::InputObject;

/// Object database feeding the processor
///
/// Sizing queries are read once at construction; `input_objects` is read by
/// every `update`.
pub trait ObjectSource {
    /// Current input objects, in upload order
    fn input_objects(&self) -> &[InputObject];

    /// Upper bound on objects pushed in one update; sizes the input channel
    fn max_object_count(&self) -> u32;

    /// Upper bound on survivors of one category; sizes its output channel
    fn max_category_count(&self, category: Category) -> u32;

    fn input_count(&self) -> u32 {
        self.input_objects().len() as u32
    }
}

/// Host-side object list with fixed sizing limits
#[derive(Debug, Clone)]
pub struct ObjectTable {
    objects: Vec<InputObject>,
    max_objects: u32,
    max_per_category: PerCategory<u32>,
}

impl ObjectTable {
    pub fn new(max_objects: u32, max_per_category: PerCategory<u32>) -> Self {
        Self {
            objects: Vec::with_capacity(max_objects as usize),
            max_objects,
            max_per_category,
        }
    }

    /// Every category may hold every object
    pub fn uniform(max_objects: u32) -> Self {
        Self::new(max_objects, PerCategory([max_objects; 5]))
    }

    /// Add an object; returns its index, or None when the table is full
    pub fn push(&mut self, object: InputObject) -> Option<u32> {
        if self.objects.len() as u32 >= self.max_objects {
            return None;
        }

        self.objects.push(object);
        Some(self.objects.len() as u32 - 1)
    }

    /// Add objects in batch, keeping as many as fit
    pub fn extend_from_slice(&mut self, objects: &[InputObject]) -> usize {
        let available = (self.max_objects as usize).saturating_sub(self.objects.len());
        let accepted = objects.len().min(available);
        self.objects.extend_from_slice(&objects[..accepted]);

        if accepted < objects.len() {
            log::warn!(
                "[ObjectTable::extend_from_slice] Rejected {} objects, table holds {}",
                objects.len() - accepted,
                self.max_objects
            );
        }
        accepted
    }

    /// Replace an object in place
    pub fn set(&mut self, index: u32, object: InputObject) {
        if let Some(slot) = self.objects.get_mut(index as usize) {
            *slot = object;
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectSource for ObjectTable {
    fn input_objects(&self) -> &[InputObject] {
        &self.objects
    }

    fn max_object_count(&self) -> u32 {
        self.max_objects
    }

    fn max_category_count(&self, category: Category) -> u32 {
        self.max_per_category[category]
    }
}
