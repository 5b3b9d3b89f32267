use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::runner::ds::heap::HeapReservation;
use crate::runner::ds::object_property::{same_function, PropertyDescriptor};
use crate::runner::ds::operations::test_and_comparison::{same_object, same_value};

pub type ObjectRef = Rc<RefCell<ObjectBase>>;

/// Where the next upward dispatch from an object resolves.
///
/// `Unset` until the first dispatch; afterwards `At(grandparent)` whenever no
/// dispatch is in flight. `At(None)` means the chain is exhausted.
#[derive(Clone)]
pub enum SuperCursor {
    Unset,
    At(Option<ObjectRef>),
}
impl SuperCursor {
    pub fn is_unset(&self) -> bool {
        matches!(self, SuperCursor::Unset)
    }

    pub fn target(&self) -> Option<&ObjectRef> {
        match self {
            SuperCursor::At(Some(o)) => Some(o),
            _ => None,
        }
    }
}
impl fmt::Debug for SuperCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuperCursor::Unset => write!(f, "SuperCursor::Unset"),
            SuperCursor::At(None) => write!(f, "SuperCursor::At(None)"),
            SuperCursor::At(Some(o)) => write!(f, "SuperCursor::At({})", (**o).borrow().id()),
        }
    }
}

pub struct ObjectBase {
    id: Uuid,
    properties: IndexMap<String, PropertyDescriptor>,
    is_extensible: bool,
    prototype: Option<ObjectRef>,
    super_cursor: SuperCursor,
    /// Heap accounting for objects allocated through a realm.
    reservation: Option<HeapReservation>,
}
impl ObjectBase {
    pub fn new(prototype: Option<ObjectRef>) -> Self {
        ObjectBase {
            id: Uuid::new_v4(),
            properties: IndexMap::new(),
            is_extensible: true,
            prototype,
            super_cursor: SuperCursor::Unset,
            reservation: None,
        }
    }

    pub(crate) fn attach_reservation(&mut self, reservation: HeapReservation) {
        self.reservation = Some(reservation);
    }

    pub fn id(&self) -> String {
        self.id.to_hyphenated().to_string()
    }

    pub fn get_prototype_of(&self) -> Option<ObjectRef> {
        self.prototype.clone()
    }

    pub fn is_extensible(&self) -> bool {
        self.is_extensible
    }

    pub fn prevent_extensions(&mut self) -> bool {
        self.is_extensible = false;
        true
    }

    /// Forbids adding or removing own properties. Irreversible.
    pub fn seal(&mut self) {
        self.is_extensible = false;
        for (_, descriptor) in self.properties.iter_mut() {
            descriptor.set_configurable(false);
        }
    }

    pub fn is_sealed(&self) -> bool {
        !self.is_extensible && self.properties.values().all(|d| !d.is_configurable())
    }

    pub fn get_own_property(&self, property: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(property)
    }

    pub fn has_own_property(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    pub fn define_own_property(&mut self, property: String, descriptor: PropertyDescriptor) -> bool {
        ordinary_define_own_property(self, property, descriptor)
    }

    pub fn delete(&mut self, property: &str) -> bool {
        match self.get_own_property(property) {
            None => true,
            Some(pd) => {
                if pd.is_configurable() {
                    self.properties.shift_remove(property);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Own names in definition order; non-enumerable ones only when
    /// `include_hidden` is set.
    pub fn own_property_keys(&self, include_hidden: bool) -> Vec<String> {
        self.properties
            .iter()
            .filter(|(_, d)| include_hidden || d.is_enumerable())
            .map(|(k, _)| k.to_string())
            .collect()
    }

    /// Snapshot of every own record, hidden ones included.
    pub fn own_properties(&self) -> Vec<(String, PropertyDescriptor)> {
        self.properties
            .iter()
            .map(|(k, d)| (k.to_string(), d.clone()))
            .collect()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub(crate) fn super_cursor(&self) -> &SuperCursor {
        &self.super_cursor
    }

    pub(crate) fn replace_super_cursor(&mut self, cursor: SuperCursor) -> SuperCursor {
        std::mem::replace(&mut self.super_cursor, cursor)
    }
}
impl fmt::Debug for ObjectBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBase")
            .field("id", &self.id())
            .field("keys", &self.own_property_keys(true))
            .field("is_extensible", &self.is_extensible)
            .finish()
    }
}

pub fn object_create(prototype: Option<ObjectRef>) -> ObjectRef {
    Rc::new(RefCell::new(ObjectBase::new(prototype)))
}

/// Re-links `o` under `prototype`. Refused for non-extensible objects and for
/// links that would close a cycle. A successful change forgets the super
/// cursor, which was derived from the old chain.
pub fn set_prototype_of(o: &ObjectRef, prototype: Option<ObjectRef>) -> bool {
    {
        let base = (**o).borrow();
        let unchanged = match (&base.prototype, &prototype) {
            (None, None) => true,
            (Some(current), Some(p)) => same_object(current, p),
            _ => false,
        };
        if unchanged {
            return true;
        }
        if !base.is_extensible() {
            return false;
        }
    }
    let mut p = prototype.clone();
    while let Some(some_p) = p {
        if same_object(&some_p, o) {
            // To prevent circular chain
            return false;
        }
        p = (*some_p).borrow().get_prototype_of();
    }
    let mut base = (**o).borrow_mut();
    base.prototype = prototype;
    base.super_cursor = SuperCursor::Unset;
    true
}

/// `o`, its parent, its grandparent, ... up to the root.
pub fn prototype_chain(o: &ObjectRef) -> Vec<ObjectRef> {
    let mut chain = vec![o.clone()];
    let mut p = (**o).borrow().get_prototype_of();
    while let Some(some_p) = p {
        p = (*some_p).borrow().get_prototype_of();
        chain.push(some_p);
    }
    chain
}

pub fn ordinary_define_own_property(
    o: &mut ObjectBase,
    property: String,
    descriptor: PropertyDescriptor,
) -> bool {
    if !o.has_own_property(&property) {
        return if o.is_extensible() {
            o.properties.insert(property, descriptor);
            true
        } else {
            false
        };
    }
    let current_descriptor = match o.get_own_property(&property) {
        Some(current) => current,
        None => return false,
    };
    if current_descriptor == &descriptor {
        return true;
    }
    if !current_descriptor.is_configurable() {
        if descriptor.is_configurable()
            || current_descriptor.is_enumerable() != descriptor.is_enumerable()
        {
            return false;
        }
        match (current_descriptor, &descriptor) {
            (
                PropertyDescriptor::Data {
                    value: current_value,
                    writable: current_writable,
                    ..
                },
                PropertyDescriptor::Data {
                    value: desc_value,
                    writable: desc_writable,
                    ..
                },
            ) => {
                if !*current_writable && (*desc_writable || !same_value(current_value, desc_value))
                {
                    return false;
                }
            }
            (
                PropertyDescriptor::Accessor {
                    get: current_get,
                    set: current_set,
                    ..
                },
                PropertyDescriptor::Accessor {
                    get: desc_get,
                    set: desc_set,
                    ..
                },
            ) => {
                if !same_function(current_get, desc_get) || !same_function(current_set, desc_set) {
                    return false;
                }
            }
            // Switching between data and accessor form needs a configurable property.
            _ => return false,
        }
    }
    o.properties.insert(property, descriptor);
    true
}
