use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::compiler::CONSTRUCTOR;
use crate::runner::ds::error::ErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::heap::{Heap, HeapConfig, HeapRef, HeapReservation};
use crate::runner::ds::object::{object_create, ObjectRef};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::value::Value;

#[derive(Debug, Clone, Default)]
pub struct RealmConfig {
    pub heap: HeapConfig,
}

/// Owner of the framework root: the object every delegation chain built
/// through this realm ends in, and the default parent for `copy`.
pub struct Realm {
    root: ObjectRef,
    heap: HeapRef,
}
impl Realm {
    pub fn new() -> Self {
        Self::with_config(RealmConfig::default())
    }

    pub fn with_config(config: RealmConfig) -> Self {
        let root = object_create(None);
        install_root_properties(&root);
        Realm {
            root,
            heap: Rc::new(RefCell::new(Heap::new(config.heap))),
        }
    }

    pub fn root(&self) -> ObjectRef {
        self.root.clone()
    }

    pub fn allocated_bytes(&self) -> usize {
        self.heap.borrow().get_allocated()
    }

    pub fn allocated_objects(&self) -> usize {
        self.heap.borrow().get_allocated_objects()
    }

    /// Accounts for and creates an empty delegate of `prototype`. The
    /// reservation is released when the object is dropped.
    pub(crate) fn allocate_object(
        &self,
        prototype: Option<ObjectRef>,
        property_count: usize,
    ) -> Result<ObjectRef, ErrorType> {
        let reservation = HeapReservation::reserve(&self.heap, property_count)?;
        let o = object_create(prototype);
        (*o).borrow_mut().attach_reservation(reservation);
        Ok(o)
    }
}
impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

/// The root's constructor seals its receiver. Objects whose chain provides
/// another constructor that never reaches this one stay open.
fn install_root_properties(root: &ObjectRef) {
    let constructor = FunctionObject::new_constructor_function("Object", |this, _| {
        log::debug!("sealing {}", (**this).borrow().id());
        (**this).borrow_mut().seal();
        Ok(Value::Undefined)
    });
    (**root).borrow_mut().define_own_property(
        CONSTRUCTOR.to_string(),
        PropertyDescriptor::new_hidden_data(Value::Function(constructor)),
    );
}
