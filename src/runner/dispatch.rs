//! Super dispatch: calling the like-named method one level further up the
//! delegation chain than the one currently executing.
//!
//! Every object carries a lazily initialised [`SuperCursor`]. A dispatch reads
//! the cursor, finds the next owner of the method at or above it, moves the
//! cursor just past that owner for the duration of the call and puts it back
//! afterwards through a [`CursorGuard`]. Nested dispatches therefore keep
//! climbing, and sequential dispatches from the same level land on the same
//! target.
//!
//! Callbacks that run after the triggering call returned capture the cursor
//! with [`Continuation::capture`] and reinstate it while they run.

use crate::runner::ds::error::ErrorType;
use crate::runner::ds::function_object::{FunctionObject, FunctionRef};
use crate::runner::ds::object::{ObjectRef, SuperCursor};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::object::lookup_from;
use crate::runner::ds::value::Value;

/// Moves an object's cursor and restores the previous position on drop,
/// whichever way the scope is left.
pub struct CursorGuard {
    object: ObjectRef,
    saved: Option<SuperCursor>,
}
impl CursorGuard {
    pub fn acquire(object: &ObjectRef, cursor: SuperCursor) -> Self {
        let saved = (**object).borrow_mut().replace_super_cursor(cursor);
        CursorGuard {
            object: object.clone(),
            saved: Some(saved),
        }
    }
}
impl Drop for CursorGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            match self.object.try_borrow_mut() {
                Ok(mut base) => {
                    log::trace!("dispatch: restoring cursor of {} to {:?}", base.id(), saved);
                    base.replace_super_cursor(saved);
                }
                Err(_) => log::warn!("dispatch: cursor restore skipped, object is borrowed"),
            }
        }
    }
}

/// Current cursor of `object`, initialised to its grandparent on first use.
pub fn current_cursor(object: &ObjectRef) -> SuperCursor {
    let mut base = (**object).borrow_mut();
    if base.super_cursor().is_unset() {
        let grandparent = match base.get_prototype_of() {
            Some(parent) => {
                let grandparent = (*parent).borrow().get_prototype_of();
                grandparent
            }
            None => None,
        };
        base.replace_super_cursor(SuperCursor::At(grandparent));
    }
    base.super_cursor().clone()
}

/// Invokes `name` on the next level up from where `object`'s current call
/// stands, with `object` as receiver.
///
/// The first dispatch on an object starts at its grandparent, which assumes
/// the method running on `object` came from its parent. When it came from
/// further up, the start level can be the running method's own owner and that
/// method runs again. With `receiver <- instance <- B(m) <- A(m)`, calling `m`
/// on `receiver` runs B, then B again from the dispatch, then A.
pub fn dispatch(object: &ObjectRef, name: &str, args: Vec<Value>) -> Result<Value, ErrorType> {
    let start = current_cursor(object).target().cloned();
    let (owner, descriptor) = match lookup_from(start, name) {
        Some(found) => found,
        None => return Err(ErrorType::NoSuchMethod(name.to_string())),
    };
    let method = resolve_method(object, name, descriptor)?;
    let next = (*owner).borrow().get_prototype_of();
    log::trace!(
        "dispatch: {} resolved on {}, cursor moves to {:?}",
        name,
        (*owner).borrow().id(),
        next.as_ref().map(|n| (**n).borrow().id())
    );
    let _guard = CursorGuard::acquire(object, SuperCursor::At(next));
    method.call(object, args)
}

fn resolve_method(
    object: &ObjectRef,
    name: &str,
    descriptor: PropertyDescriptor,
) -> Result<FunctionRef, ErrorType> {
    let value = match descriptor {
        PropertyDescriptor::Data { value, .. } => value,
        PropertyDescriptor::Accessor { get: Some(getter), .. } => getter.call(object, Vec::new())?,
        PropertyDescriptor::Accessor { get: None, .. } => Value::Undefined,
    };
    match value {
        Value::Function(f) => Ok(f),
        Value::Undefined => Err(ErrorType::NoSuchMethod(name.to_string())),
        other => Err(ErrorType::TypeError(format!(
            "'{}' is a {}, not a function",
            name,
            other.type_str()
        ))),
    }
}

/// A callback bound to the cursor position that was live when it was created.
#[derive(Clone)]
pub struct Continuation {
    object: ObjectRef,
    captured: SuperCursor,
    callback: FunctionRef,
}
impl Continuation {
    pub fn capture(object: &ObjectRef, callback: FunctionRef) -> Self {
        let captured = (**object).borrow().super_cursor().clone();
        Continuation {
            object: object.clone(),
            captured,
            callback,
        }
    }

    /// Runs the callback with the captured cursor in place; the cursor live
    /// just before the call is restored afterwards.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, ErrorType> {
        let _guard = CursorGuard::acquire(&self.object, self.captured.clone());
        self.callback.call(&self.object, args)
    }

    /// Wraps the continuation as an ordinary function value. The receiver it
    /// is later called with is ignored in favour of the captured object.
    pub fn into_function(self) -> FunctionRef {
        let name = format!("bound {}", self.callback.name());
        FunctionObject::new_normal_function(&name, move |_, args| self.call(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::object_create;
    use crate::runner::ds::object_property::PropertyDescriptor;
    use crate::runner::ds::operations::object::{define_property_or_throw, invoke};
    use crate::runner::ds::operations::test_and_comparison::same_optional_object;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn method<F>(o: &ObjectRef, name: &str, body: F)
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
    {
        let f = FunctionObject::new_normal_function(name, body);
        define_property_or_throw(o, name, PropertyDescriptor::new_hidden_data(Value::Function(f)))
            .unwrap();
    }

    #[test]
    fn test_cursor_starts_at_grandparent() {
        let a = object_create(None);
        let b = object_create(Some(a.clone()));
        let c = object_create(Some(b));
        let cursor = current_cursor(&c);
        assert!(same_optional_object(&cursor.target().cloned(), &Some(a)));
    }

    #[test]
    fn test_missing_method_is_lookup_failure() {
        let a = object_create(None);
        let b = object_create(Some(a));
        let c = object_create(Some(b));
        assert_eq!(
            dispatch(&c, "m", vec![]),
            Err(ErrorType::NoSuchMethod("m".to_string()))
        );
    }

    #[test]
    fn test_cursor_restored_after_error() {
        let a = object_create(None);
        method(&a, "m", |_, _| Err(ErrorType::TypeError("boom".to_string())));
        let b = object_create(Some(a.clone()));
        method(&b, "m", |this, args| dispatch(this, "m", args));
        let instance = object_create(Some(b));
        let before = current_cursor(&instance).target().cloned();
        assert!(invoke(&instance, "m", vec![]).is_err());
        let after = (*instance).borrow().super_cursor().target().cloned();
        assert!(same_optional_object(&before, &after));
        assert!(same_optional_object(&after, &Some(a)));
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let a = object_create(None);
        let b = object_create(Some(a.clone()));
        {
            let _guard = CursorGuard::acquire(&b, SuperCursor::At(Some(a)));
            assert!((*b).borrow().super_cursor().target().is_some());
        }
        assert!((*b).borrow().super_cursor().is_unset());
    }

    #[test]
    fn test_clone_of_instance_reruns_the_inherited_method() {
        let log = Rc::new(RefCell::new(vec![]));
        let a = object_create(None);
        let l = log.clone();
        method(&a, "m", move |_, _| {
            l.borrow_mut().push("A");
            Ok(Value::Undefined)
        });
        let b = object_create(Some(a));
        let l = log.clone();
        method(&b, "m", move |this, args| {
            l.borrow_mut().push("B");
            dispatch(this, "m", args)
        });
        let instance = object_create(Some(b));
        let receiver = object_create(Some(instance));
        invoke(&receiver, "m", vec![]).unwrap();
        assert_eq!(*log.borrow(), vec!["B", "B", "A"]);
    }

    #[test]
    fn test_sequential_dispatches_reach_the_same_level() {
        let log = Rc::new(RefCell::new(vec![]));
        let a = object_create(None);
        let l = log.clone();
        method(&a, "m", move |_, _| {
            l.borrow_mut().push("A");
            Ok(Value::Undefined)
        });
        let b = object_create(Some(a));
        let l = log.clone();
        method(&b, "m", move |this, args| {
            l.borrow_mut().push("B");
            dispatch(this, "m", args.clone())?;
            dispatch(this, "m", args)
        });
        let instance = object_create(Some(b));
        invoke(&instance, "m", vec![]).unwrap();
        assert_eq!(*log.borrow(), vec!["B", "A", "A"]);
    }
}
