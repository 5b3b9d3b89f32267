use crate::runner::ds::error::ErrorType;
use crate::runner::ds::function_object::FunctionRef;
use crate::runner::ds::object::ObjectRef;
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::test_and_comparison::same_object;
use crate::runner::ds::value::Value;

/// First object in the chain starting at `start` (inclusive) that owns
/// `property`, with a copy of its record. No borrow is held on return.
pub fn lookup_from(
    start: Option<ObjectRef>,
    property: &str,
) -> Option<(ObjectRef, PropertyDescriptor)> {
    let mut current = start;
    while let Some(o) = current {
        let found = (*o).borrow().get_own_property(property).cloned();
        if let Some(descriptor) = found {
            return Some((o, descriptor));
        }
        current = (*o).borrow().get_prototype_of();
    }
    None
}

pub fn lookup_property(o: &ObjectRef, property: &str) -> Option<(ObjectRef, PropertyDescriptor)> {
    lookup_from(Some(o.clone()), property)
}

/// Reads `property` through the chain; getters run with `o` as receiver.
pub fn get(o: &ObjectRef, property: &str) -> Result<Value, ErrorType> {
    match lookup_property(o, property) {
        None => Ok(Value::Undefined),
        Some((_, PropertyDescriptor::Data { value, .. })) => Ok(value),
        Some((_, PropertyDescriptor::Accessor { get, .. })) => match get {
            None => Ok(Value::Undefined),
            Some(getter) => getter.call(o, Vec::new()),
        },
    }
}

/// Assignment: runs an inherited or own setter, updates an own writable
/// value, or adds a fresh own data property on `o`.
pub fn put(o: &ObjectRef, property: &str, value: Value) -> Result<(), ErrorType> {
    match lookup_property(o, property) {
        Some((_, PropertyDescriptor::Accessor { set, .. })) => match set {
            Some(setter) => {
                setter.call(o, vec![value])?;
                Ok(())
            }
            None => Err(ErrorType::IllegalMutation(format!(
                "'{}' has a getter but no setter",
                property
            ))),
        },
        Some((owner, descriptor)) => {
            if !descriptor.is_writable() {
                return Err(ErrorType::IllegalMutation(format!(
                    "'{}' is not writable",
                    property
                )));
            }
            if same_object(&owner, o) {
                define_property_or_throw(o, property, descriptor.with_value(value))
            } else {
                define_property_or_throw(o, property, PropertyDescriptor::new_data(value))
            }
        }
        None => define_property_or_throw(o, property, PropertyDescriptor::new_data(value)),
    }
}

pub fn define_property_or_throw(
    o: &ObjectRef,
    property: &str,
    descriptor: PropertyDescriptor,
) -> Result<(), ErrorType> {
    let mut base = (**o).borrow_mut();
    if base.define_own_property(property.to_string(), descriptor) {
        Ok(())
    } else if !base.has_own_property(property) {
        Err(ErrorType::IllegalMutation(format!(
            "cannot add property '{}', object is not extensible",
            property
        )))
    } else {
        Err(ErrorType::IllegalMutation(format!(
            "cannot redefine property '{}'",
            property
        )))
    }
}

pub fn delete_property_or_throw(o: &ObjectRef, property: &str) -> Result<(), ErrorType> {
    if (**o).borrow_mut().delete(property) {
        Ok(())
    } else {
        Err(ErrorType::IllegalMutation(format!(
            "cannot delete property '{}'",
            property
        )))
    }
}

pub fn get_method(o: &ObjectRef, property: &str) -> Result<FunctionRef, ErrorType> {
    match get(o, property)? {
        Value::Function(f) => Ok(f),
        Value::Undefined => Err(ErrorType::NoSuchMethod(property.to_string())),
        other => Err(ErrorType::TypeError(format!(
            "'{}' is a {}, not a function",
            property,
            other.type_str()
        ))),
    }
}

/// Calls the method `property` with `o` as receiver.
pub fn invoke(o: &ObjectRef, property: &str, args: Vec<Value>) -> Result<Value, ErrorType> {
    let method = get_method(o, property)?;
    method.call(o, args)
}
