//! Allocation accounting for delegation objects.
//!
//! Objects are reference counted and reclaimed by `Rc`. The heap keeps a
//! running estimate of what the live objects of a realm occupy and enforces an
//! optional ceiling. Every accounted object carries a [`HeapReservation`] that
//! gives its bytes back when the object is dropped.

use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

use crate::runner::ds::error::ErrorType;
use crate::runner::ds::object::ObjectBase;
use crate::runner::ds::object_property::PropertyDescriptor;

/// Configuration for the heap manager.
#[derive(Debug, Clone)]
pub struct HeapConfig {
    /// Maximum heap size in bytes. None means unlimited.
    pub max_bytes: Option<usize>,
}

impl HeapConfig {
    /// Create a new heap configuration with no memory limit.
    pub fn unlimited() -> Self {
        HeapConfig { max_bytes: None }
    }

    /// Create a new heap configuration with a memory limit.
    pub fn with_limit(max_bytes: usize) -> Self {
        HeapConfig {
            max_bytes: Some(max_bytes),
        }
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Estimated footprint of an object carrying `property_count` own records.
pub fn estimate_object_bytes(property_count: usize) -> usize {
    mem::size_of::<ObjectBase>()
        + property_count * (mem::size_of::<PropertyDescriptor>() + mem::size_of::<String>())
}

#[derive(Debug)]
pub struct Heap {
    config: HeapConfig,
    allocated_bytes: usize,
    allocated_objects: usize,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Self {
        Heap {
            config,
            allocated_bytes: 0,
            allocated_objects: 0,
        }
    }

    /// Reserve room for one object.
    ///
    /// Returns an error if the allocation would exceed the memory limit.
    pub fn allocate_object(&mut self, property_count: usize) -> Result<(), ErrorType> {
        let bytes = estimate_object_bytes(property_count);
        if !self.can_allocate(bytes) {
            return Err(ErrorType::RangeError("Out of memory".to_string()));
        }
        self.allocated_bytes += bytes;
        self.allocated_objects += 1;
        Ok(())
    }

    /// Release one object's worth of `bytes`.
    pub fn deallocate(&mut self, bytes: usize) {
        self.allocated_bytes = self.allocated_bytes.saturating_sub(bytes);
        self.allocated_objects = self.allocated_objects.saturating_sub(1);
    }

    pub fn get_allocated(&self) -> usize {
        self.allocated_bytes
    }

    pub fn get_allocated_objects(&self) -> usize {
        self.allocated_objects
    }

    pub fn can_allocate(&self, bytes: usize) -> bool {
        if let Some(max_bytes) = self.config.max_bytes {
            self.allocated_bytes + bytes <= max_bytes
        } else {
            true
        }
    }

    /// Get the remaining available bytes, if limited.
    pub fn available_bytes(&self) -> Option<usize> {
        self.config
            .max_bytes
            .map(|max| max.saturating_sub(self.allocated_bytes))
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

pub type HeapRef = Rc<RefCell<Heap>>;

/// Bytes held on a heap by one live object.
///
/// Only a weak link to the heap is kept, so objects may outlive their realm.
pub struct HeapReservation {
    heap: Weak<RefCell<Heap>>,
    bytes: usize,
}
impl HeapReservation {
    /// Accounts for an object with `property_count` own records on `heap`.
    pub fn reserve(heap: &HeapRef, property_count: usize) -> Result<Self, ErrorType> {
        heap.borrow_mut().allocate_object(property_count)?;
        Ok(HeapReservation {
            heap: Rc::downgrade(heap),
            bytes: estimate_object_bytes(property_count),
        })
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}
impl Drop for HeapReservation {
    fn drop(&mut self) {
        if let Some(heap) = self.heap.upgrade() {
            match heap.try_borrow_mut() {
                Ok(mut heap) => heap.deallocate(self.bytes),
                Err(_) => log::warn!("heap: release of {} bytes skipped, heap is borrowed", self.bytes),
            };
        }
    }
}
