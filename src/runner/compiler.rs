//! Descriptor compiler: turns a raw property map, whose keys may carry
//! annotations such as `"(hidden get) name"`, into normalized attribute
//! records ready to be installed on an object.
//!
//! The compiler is total. Keys it cannot read as annotated names are used as
//! literal names.

use indexmap::IndexMap;

use crate::parser::ast::{Flag, FlagSet};
use crate::parser::AnnotationParser;
use crate::runner::dispatch::dispatch;
use crate::runner::ds::function_object::{first_arg, FunctionObject, FunctionRef};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::object::{get, put};
use crate::runner::ds::value::Value;

/// Raw input: names (annotated or not) to values.
pub type PropertyMap = IndexMap<String, Value>;

/// Output: bare names to attribute records, in first-seen order.
pub type CompiledProperties = IndexMap<String, PropertyDescriptor>;

pub const CONSTRUCTOR: &str = "constructor";
pub const PRIVATE_NAME_MARKER: char = '_';

/// Caller-supplied attribute baseline. Unset fields default to `true`.
///
/// An explicit `enumerable: Some(true)` also disables the implicit hiding of
/// function values and `_`-prefixed names.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttributeDefaults {
    pub enumerable: Option<bool>,
    pub writable: Option<bool>,
    pub configurable: Option<bool>,
}
impl AttributeDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enumerable(mut self, flag: bool) -> Self {
        self.enumerable = Some(flag);
        self
    }

    pub fn writable(mut self, flag: bool) -> Self {
        self.writable = Some(flag);
        self
    }

    pub fn configurable(mut self, flag: bool) -> Self {
        self.configurable = Some(flag);
        self
    }

    fn keeps_everything_visible(&self) -> bool {
        self.enumerable == Some(true)
    }
}

/// Everything gathered for one bare name before it is resolved.
#[derive(Default)]
struct PendingProperty {
    flags: FlagSet,
    value: Option<Value>,
    getter: Option<FunctionRef>,
    setter: Option<FunctionRef>,
}
impl PendingProperty {
    fn resolve(self, name: &str, defaults: &AttributeDefaults) -> PropertyDescriptor {
        let flags = self.flags;
        let mut enumerable = defaults.enumerable.unwrap_or(true);
        let mut writable = defaults.writable.unwrap_or(true);
        let mut configurable = defaults.configurable.unwrap_or(true);

        if flags.contains(Flag::Const) {
            writable = false;
        }
        if flags.contains(Flag::Final) {
            writable = false;
            configurable = false;
        }
        if flags.contains(Flag::Writable) {
            writable = true;
        }
        if flags.contains(Flag::Hidden) {
            enumerable = false;
        }

        let implicitly_hidden = name.starts_with(PRIVATE_NAME_MARKER)
            || (self.getter.is_none()
                && self.setter.is_none()
                && self.value.as_ref().map_or(false, Value::is_function));
        if implicitly_hidden && !defaults.keeps_everything_visible() {
            enumerable = false;
        }

        if self.getter.is_some() || self.setter.is_some() {
            PropertyDescriptor::Accessor {
                get: self.getter,
                set: self.setter,
                enumerable,
                configurable,
            }
        } else {
            PropertyDescriptor::Data {
                value: self.value.unwrap_or(Value::Undefined),
                writable,
                enumerable,
                configurable,
            }
        }
    }
}

/// Compiles `raw` into attribute records.
///
/// Entries naming the same bare name (e.g. `"(get) x"` and `"(set) x"`) merge
/// into one record and their flags are unioned. A data entry is ignored for a
/// name that also has an accessor entry.
pub fn compile(raw: &PropertyMap, defaults: Option<&AttributeDefaults>) -> CompiledProperties {
    let defaults = defaults.copied().unwrap_or_default();
    let mut pending: IndexMap<String, PendingProperty> = IndexMap::new();

    for (key, value) in raw {
        let (name, flags) = match AnnotationParser::parse_annotated_name(key) {
            Some(annotated) => (annotated.name, annotated.flags),
            None => (key.to_string(), FlagSet::empty()),
        };
        let entry = pending.entry(name.clone()).or_default();
        entry.flags = entry.flags.union(flags);

        if flags.contains(Flag::Get) {
            entry.getter = Some(getter_from(&name, value));
        }
        if flags.contains(Flag::Set) {
            entry.setter = Some(setter_from(&name, value));
        }
        if !flags.is_accessor() {
            entry.value = Some(data_value(&name, value));
        }
    }

    pending
        .into_iter()
        .map(|(name, property)| {
            let descriptor = property.resolve(&name, &defaults);
            (name, descriptor)
        })
        .collect()
}

fn data_value(name: &str, value: &Value) -> Value {
    match value {
        Value::String(constructor_name) if name == CONSTRUCTOR => {
            Value::Function(delegating_constructor(constructor_name))
        }
        other => other.clone(),
    }
}

/// A string getter forwards to the property of that name on the receiver.
/// Non-function, non-string values become a getter returning that value.
fn getter_from(name: &str, value: &Value) -> FunctionRef {
    match value {
        Value::Function(f) => f.clone(),
        Value::String(target) => {
            let target = target.to_string();
            FunctionObject::new_getter_function(name, move |this, _| get(this, &target))
        }
        other => {
            let constant = other.clone();
            FunctionObject::new_getter_function(name, move |_, _| Ok(constant.clone()))
        }
    }
}

/// A string setter writes to the property of that name on the receiver.
/// Any other non-function value produces a setter that discards its input.
fn setter_from(name: &str, value: &Value) -> FunctionRef {
    match value {
        Value::Function(f) => f.clone(),
        Value::String(target) => {
            let target = target.to_string();
            FunctionObject::new_setter_function(name, move |this, args| {
                put(this, &target, first_arg(args))?;
                Ok(Value::Undefined)
            })
        }
        _ => FunctionObject::new_setter_function(name, |_, _| Ok(Value::Undefined)),
    }
}

/// Named constructor whose only job is to hand over to the next constructor
/// up the chain.
pub fn delegating_constructor(name: &str) -> FunctionRef {
    FunctionObject::new_synthesized_constructor_function(name, |this, args| {
        dispatch(this, CONSTRUCTOR, args)
    })
}
