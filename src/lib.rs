//! # protean - prototype-based object composition in Rust
//!
//! Objects are made by cloning other objects and inherit their behaviour by
//! delegation rather than by class instantiation. The crate provides:
//! - A PEG grammar (pest) for annotated property keys such as `"(hidden get) size"`
//! - A descriptor compiler turning annotated property maps into attribute records
//! - A delegation engine with `clone`, `create`, `copy` and `mix`
//! - Super dispatch: calling the like-named method one level further up the chain,
//!   reentrantly and from deferred callbacks
//!
//! ## Quick Start
//!
//! ```
//! use protean::runner::compiler::PropertyMap;
//! use protean::runner::ds::operations::object::get;
//! use protean::runner::ds::value::Value;
//! use protean::runner::realm::Realm;
//!
//! let realm = Realm::new();
//! let mut props = PropertyMap::new();
//! props.insert("(final) answer".to_string(), Value::from(42));
//! props.insert("(get) alias".to_string(), Value::from("answer"));
//!
//! let base = realm.clone_object(&realm.root(), Some(&props), None).unwrap();
//! let derived = realm.clone_object(&base, None, None).unwrap();
//! assert_eq!(get(&derived, "alias").unwrap(), Value::from(42));
//! ```
//!
//! ## Super Dispatch
//!
//! ```
//! use protean::runner::compiler::PropertyMap;
//! use protean::runner::dispatch::dispatch;
//! use protean::runner::ds::function_object::FunctionObject;
//! use protean::runner::ds::operations::object::invoke;
//! use protean::runner::ds::value::Value;
//! use protean::runner::realm::Realm;
//!
//! let realm = Realm::new();
//!
//! let mut animal = PropertyMap::new();
//! animal.insert(
//!     "speak".to_string(),
//!     Value::Function(FunctionObject::new_normal_function("speak", |_, _| {
//!         Ok(Value::from("..."))
//!     })),
//! );
//! let animal = realm.clone_object(&realm.root(), Some(&animal), None).unwrap();
//!
//! let mut dog = PropertyMap::new();
//! dog.insert(
//!     "speak".to_string(),
//!     Value::Function(FunctionObject::new_normal_function("speak", |this, args| {
//!         let inherited = dispatch(this, "speak", args)?;
//!         Ok(Value::from(format!("woof {}", inherited.as_str().unwrap_or(""))))
//!     })),
//! );
//! let dog = realm.clone_object(&animal, Some(&dog), None).unwrap();
//!
//! let rex = realm.create(&dog, vec![]).unwrap();
//! let rex = rex.as_object().unwrap();
//! assert_eq!(invoke(rex, "speak", vec![]).unwrap(), Value::from("woof ..."));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - Annotated property key grammar
//! - **[`runner`]** - Object model and operations
//!   - **[`runner::ds`]** - Values, objects, property descriptors, heap accounting
//!   - **[`runner::compiler`]** - Descriptor compiler
//!   - **[`runner::delegation`]** - clone / create / copy / mix
//!   - **[`runner::dispatch`]** - Super dispatch and continuations
//!   - **[`runner::realm`]** - The framework root object

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
