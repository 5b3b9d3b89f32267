//! Integration tests for super dispatch.
//!
//! Chains are built through a realm the way user code builds them, then
//! methods call `dispatch` to reach the next implementation up the chain.

extern crate protean;

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use protean::runner::compiler::PropertyMap;
use protean::runner::dispatch::{dispatch, Continuation};
use protean::runner::ds::error::ErrorType;
use protean::runner::ds::function_object::FunctionObject;
use protean::runner::ds::object::ObjectRef;
use protean::runner::ds::operations::object::{get, invoke, put};
use protean::runner::ds::operations::test_and_comparison::same_object;
use protean::runner::ds::value::Value;
use protean::runner::realm::Realm;

type Log = Rc<RefCell<Vec<String>>>;

/// Helper to make a single-method property map.
fn method_map<F>(name: &str, body: F) -> PropertyMap
where
    F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
{
    let mut props = PropertyMap::new();
    props.insert(
        name.to_string(),
        Value::Function(FunctionObject::new_normal_function(name, body)),
    );
    props
}

/// Level whose `m` records `label` and then dispatches upward, treating the
/// end of the chain as success.
fn logging_level(realm: &Realm, parent: &ObjectRef, label: &str, log: &Log) -> ObjectRef {
    let log = log.clone();
    let label = label.to_string();
    let props = method_map("m", move |this, args| {
        log.borrow_mut().push(label.clone());
        match dispatch(this, "m", args) {
            Err(ErrorType::NoSuchMethod(_)) => Ok(Value::Undefined),
            other => other,
        }
    });
    realm.clone_object(parent, Some(&props), None).unwrap()
}

/// Level whose `m` records `label` and returns.
fn terminal_level(realm: &Realm, parent: &ObjectRef, label: &str, log: &Log) -> ObjectRef {
    let log = log.clone();
    let label = label.to_string();
    let props = method_map("m", move |_, _| {
        log.borrow_mut().push(label.clone());
        Ok(Value::from(label.as_str()))
    });
    realm.clone_object(parent, Some(&props), None).unwrap()
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

// ============================================================================
// Chain walking
// ============================================================================

#[test]
fn test_dispatch_walks_each_level_once() {
    let realm = Realm::new();
    let log: Log = Rc::new(RefCell::new(vec![]));
    let a = logging_level(&realm, &realm.root(), "A", &log);
    let b = logging_level(&realm, &a, "B", &log);
    let c = logging_level(&realm, &b, "C", &log);
    let instance = realm.clone_object(&c, None, None).unwrap();

    invoke(&instance, "m", vec![]).unwrap();
    assert_eq!(entries(&log), vec!["C", "B", "A"]);

    // A second top-level call sees the same chain.
    log.borrow_mut().clear();
    invoke(&instance, "m", vec![]).unwrap();
    assert_eq!(entries(&log), vec!["C", "B", "A"]);
}

#[test]
fn test_sequential_dispatches_from_one_level_reach_the_same_target() {
    let realm = Realm::new();
    let log: Log = Rc::new(RefCell::new(vec![]));
    let a = terminal_level(&realm, &realm.root(), "A", &log);
    let l = log.clone();
    let b_props = method_map("m", move |this, args| {
        l.borrow_mut().push("B".to_string());
        dispatch(this, "m", args.clone())?;
        dispatch(this, "m", args)
    });
    let b = realm.clone_object(&a, Some(&b_props), None).unwrap();
    let c = logging_level(&realm, &b, "C", &log);
    let instance = realm.clone_object(&c, None, None).unwrap();

    let result = invoke(&instance, "m", vec![]).unwrap();
    assert_eq!(result, Value::from("A"));
    assert_eq!(entries(&log), vec!["C", "B", "A", "A"]);
}

#[test]
fn test_dispatch_skips_levels_without_the_method() {
    let realm = Realm::new();
    let log: Log = Rc::new(RefCell::new(vec![]));
    let a = terminal_level(&realm, &realm.root(), "A", &log);
    let gap = realm.clone_object(&a, None, None).unwrap();
    let c = logging_level(&realm, &gap, "C", &log);
    let instance = realm.clone_object(&c, None, None).unwrap();

    invoke(&instance, "m", vec![]).unwrap();
    assert_eq!(entries(&log), vec!["C", "A"]);
}

#[test]
fn test_missing_method_is_propagated() {
    let realm = Realm::new();
    let a = realm.clone_object(&realm.root(), None, None).unwrap();
    let b = realm
        .clone_object(&a, Some(&method_map("m", |this, args| dispatch(this, "m", args))), None)
        .unwrap();
    let instance = realm.clone_object(&b, None, None).unwrap();

    assert_eq!(
        invoke(&instance, "m", vec![]),
        Err(ErrorType::NoSuchMethod("m".to_string()))
    );
}

#[test]
fn test_failed_call_leaves_chain_usable() {
    let realm = Realm::new();
    let fail = Rc::new(RefCell::new(true));
    let f = fail.clone();
    let a = realm
        .clone_object(
            &realm.root(),
            Some(&method_map("m", move |_, _| {
                if *f.borrow() {
                    Err(ErrorType::TypeError("boom".to_string()))
                } else {
                    Ok(Value::from("A"))
                }
            })),
            None,
        )
        .unwrap();
    let log: Log = Rc::new(RefCell::new(vec![]));
    let b = logging_level(&realm, &a, "B", &log);
    let c = logging_level(&realm, &b, "C", &log);
    let instance = realm.clone_object(&c, None, None).unwrap();

    assert!(invoke(&instance, "m", vec![]).is_err());
    *fail.borrow_mut() = false;
    log.borrow_mut().clear();
    assert_eq!(invoke(&instance, "m", vec![]).unwrap(), Value::from("A"));
    assert_eq!(entries(&log), vec!["C", "B"]);
}

// ============================================================================
// Continuations
// ============================================================================

#[test]
fn test_continuation_dispatches_from_captured_position() {
    let realm = Realm::new();
    let log: Log = Rc::new(RefCell::new(vec![]));
    let a = terminal_level(&realm, &realm.root(), "A", &log);

    let pending: Rc<RefCell<Option<Continuation>>> = Rc::new(RefCell::new(None));
    let p = pending.clone();
    let l = log.clone();
    let b_props = method_map("m", move |this, _| {
        l.borrow_mut().push("B".to_string());
        let later = FunctionObject::new_normal_function("later", |this, args| {
            dispatch(this, "m", args)
        });
        *p.borrow_mut() = Some(Continuation::capture(this, later));
        Ok(Value::from("B"))
    });
    let b = realm.clone_object(&a, Some(&b_props), None).unwrap();
    let c = logging_level(&realm, &b, "C", &log);
    let instance = realm.clone_object(&c, None, None).unwrap();

    invoke(&instance, "m", vec![]).unwrap();
    assert_eq!(entries(&log), vec!["C", "B"]);

    // The triggering call is over; the continuation still resumes above B.
    let continuation = pending.borrow_mut().take().unwrap();
    assert_eq!(continuation.call(vec![]).unwrap(), Value::from("A"));
    assert_eq!(entries(&log), vec!["C", "B", "A"]);

    // Outside the continuation the cursor is back where it was.
    assert_eq!(dispatch(&instance, "m", vec![]).unwrap(), Value::from("B"));
}

#[test]
fn test_continuation_as_function_value() {
    let realm = Realm::new();
    let log: Log = Rc::new(RefCell::new(vec![]));
    let a = terminal_level(&realm, &realm.root(), "A", &log);
    let b = terminal_level(&realm, &a, "B", &log);
    let instance = realm.clone_object(&b, None, None).unwrap();
    let other = realm.clone_object(&realm.root(), None, None).unwrap();

    let callback =
        FunctionObject::new_normal_function("cb", |this, args| dispatch(this, "m", args));
    let bound = Continuation::capture(&instance, callback).into_function();
    assert_eq!(bound.name(), "bound cb");
    // The receiver passed in is ignored in favour of the captured object.
    assert_eq!(bound.call(&other, vec![]).unwrap(), Value::from("A"));
}

// ============================================================================
// Constructors
// ============================================================================

#[test]
fn test_synthesized_constructor_hands_over_to_parent() {
    let realm = Realm::new();
    let mut base_props = PropertyMap::new();
    base_props.insert(
        "constructor".to_string(),
        Value::Function(FunctionObject::new_constructor_function(
            "Base",
            |this, args| {
                put(this, "initialized", Value::from(true))?;
                put(this, "size", args.into_iter().next().unwrap_or(Value::Undefined))?;
                Ok(Value::Undefined)
            },
        )),
    );
    let base = realm.clone_object(&realm.root(), Some(&base_props), None).unwrap();

    let mut derived_props = PropertyMap::new();
    derived_props.insert("constructor".to_string(), Value::from("Derived"));
    let derived = realm.clone_object(&base, Some(&derived_props), None).unwrap();

    let ctor = get(&derived, "constructor").unwrap();
    let ctor = ctor.as_function().unwrap();
    assert_eq!(ctor.name(), "Derived");
    assert!(same_object(&ctor.get_prototype().unwrap(), &base));

    let created = realm.create(&derived, vec![Value::from(3)]).unwrap();
    let created = created.as_object().unwrap();
    assert_eq!(get(created, "initialized").unwrap(), Value::from(true));
    assert_eq!(get(created, "size").unwrap(), Value::from(3));
    // Base never reached the root constructor, so the object stays open.
    assert!(!(**created).borrow().is_sealed());
}

/// `base` has a `Base` constructor recording its argument; `derived` carries a
/// constructor synthesized from the name `"Derived"`.
fn constructor_pair(realm: &Realm) -> (ObjectRef, ObjectRef) {
    let mut base_props = PropertyMap::new();
    base_props.insert(
        "constructor".to_string(),
        Value::Function(FunctionObject::new_constructor_function(
            "Base",
            |this, args| {
                put(this, "size", args.into_iter().next().unwrap_or(Value::Undefined))?;
                Ok(Value::Undefined)
            },
        )),
    );
    let base = realm.clone_object(&realm.root(), Some(&base_props), None).unwrap();
    let mut derived_props = PropertyMap::new();
    derived_props.insert("constructor".to_string(), Value::from("Derived"));
    let derived = realm.clone_object(&base, Some(&derived_props), None).unwrap();
    (base, derived)
}

#[test]
fn test_construct_builds_delegates_of_the_linked_parent() {
    let realm = Realm::new();
    let (base, derived) = constructor_pair(&realm);
    let ctor = get(&derived, "constructor").unwrap();
    let ctor = ctor.as_function().unwrap();

    let built = realm.construct(ctor, vec![Value::from(7)]).unwrap();
    let built = built.as_object().unwrap();
    let parent = (**built).borrow().get_prototype_of().unwrap();
    assert!(same_object(&parent, &base));
    // The synthesized body handed over to Base.
    assert_eq!(get(built, "size").unwrap(), Value::from(7));
    assert!(!(**built).borrow().is_sealed());
}

#[test]
fn test_caller_supplied_constructor_is_not_relinked() {
    let realm = Realm::new();
    let shared = FunctionObject::new_constructor_function("Shared", |_, _| Ok(Value::Undefined));
    let mut raw = PropertyMap::new();
    raw.insert("constructor".to_string(), Value::Function(shared.clone()));
    let first = realm.clone_object(&realm.root(), Some(&raw), None).unwrap();
    let _second = realm.clone_object(&first, Some(&raw), None).unwrap();

    assert!(!shared.is_synthesized());
    assert!(shared.get_prototype().is_none());
    assert!(matches!(
        realm.construct(&shared, vec![]),
        Err(ErrorType::TypeError(_))
    ));
}
