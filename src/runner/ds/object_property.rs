use std::rc::Rc;

use crate::runner::ds::function_object::FunctionRef;
use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::value::Value;

/// Normalized attribute record of a single property.
///
/// A record is either a data record or an accessor record; the accessor form
/// has no value and the data form has no getter/setter.
#[derive(Debug, Clone)]
pub enum PropertyDescriptor {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<FunctionRef>,
        set: Option<FunctionRef>,
        enumerable: bool,
        configurable: bool,
    },
}
impl PropertyDescriptor {
    /// Plain assignment semantics: writable, enumerable, configurable.
    pub fn new_data(value: Value) -> Self {
        PropertyDescriptor::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn new_hidden_data(value: Value) -> Self {
        PropertyDescriptor::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { enumerable, .. } => *enumerable,
            PropertyDescriptor::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { configurable, .. } => *configurable,
            PropertyDescriptor::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Accessors count as non-writable; writes go through their setter.
    pub fn is_writable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { writable, .. } => *writable,
            PropertyDescriptor::Accessor { .. } => false,
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        match self {
            PropertyDescriptor::Data { .. } => true,
            PropertyDescriptor::Accessor { .. } => false,
        }
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        !self.is_data_descriptor()
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            PropertyDescriptor::Data { value, .. } => Some(value),
            PropertyDescriptor::Accessor { .. } => None,
        }
    }

    pub fn getter(&self) -> Option<&FunctionRef> {
        match self {
            PropertyDescriptor::Accessor { get, .. } => get.as_ref(),
            PropertyDescriptor::Data { .. } => None,
        }
    }

    pub fn setter(&self) -> Option<&FunctionRef> {
        match self {
            PropertyDescriptor::Accessor { set, .. } => set.as_ref(),
            PropertyDescriptor::Data { .. } => None,
        }
    }

    pub(crate) fn set_configurable(&mut self, flag: bool) {
        match self {
            PropertyDescriptor::Data { configurable, .. } => *configurable = flag,
            PropertyDescriptor::Accessor { configurable, .. } => *configurable = flag,
        }
    }

    /// Same record with `value` swapped; accessors are returned untouched.
    pub(crate) fn with_value(&self, new_value: Value) -> Self {
        match self {
            PropertyDescriptor::Data {
                writable,
                enumerable,
                configurable,
                ..
            } => PropertyDescriptor::Data {
                value: new_value,
                writable: *writable,
                enumerable: *enumerable,
                configurable: *configurable,
            },
            accessor => accessor.clone(),
        }
    }
}
impl PartialEq for PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                PropertyDescriptor::Data {
                    value,
                    writable,
                    enumerable,
                    configurable,
                },
                PropertyDescriptor::Data {
                    value: other_value,
                    writable: other_writable,
                    enumerable: other_enumerable,
                    configurable: other_configurable,
                },
            ) => {
                same_value(value, other_value)
                    && writable == other_writable
                    && enumerable == other_enumerable
                    && configurable == other_configurable
            }
            (
                PropertyDescriptor::Accessor {
                    get,
                    set,
                    enumerable,
                    configurable,
                },
                PropertyDescriptor::Accessor {
                    get: other_get,
                    set: other_set,
                    enumerable: other_enumerable,
                    configurable: other_configurable,
                },
            ) => {
                same_function(get, other_get)
                    && same_function(set, other_set)
                    && enumerable == other_enumerable
                    && configurable == other_configurable
            }
            _ => false,
        }
    }
}

pub(crate) fn same_function(a: &Option<FunctionRef>, b: &Option<FunctionRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}
