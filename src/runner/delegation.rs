//! Delegation engine: building new objects out of existing ones.
//!
//! - [`Realm::clone_object`] makes a delegate of a prototype and installs
//!   compiled properties on it.
//! - [`Realm::create`] clones and runs the constructor found on the chain.
//! - [`Realm::copy`] detaches an object (and some ancestors) from its chain.
//! - [`Realm::mix`] layers the own properties of several sources over a
//!   receiver.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runner::compiler::{
    compile, AttributeDefaults, CompiledProperties, PropertyMap, CONSTRUCTOR,
};
use crate::runner::dispatch::CursorGuard;
use crate::runner::ds::error::ErrorType;
use crate::runner::ds::function_object::FunctionRef;
use crate::runner::ds::object::{ObjectBase, ObjectRef, SuperCursor};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::object::{define_property_or_throw, invoke};
use crate::runner::ds::operations::test_and_comparison::same_object;
use crate::runner::ds::value::Value;
use crate::runner::realm::Realm;

/// What happens to object-valued data properties during `copy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeepMode {
    /// Share the nested object.
    None,
    /// Copy the nested object with the same options.
    Copy,
    /// Replace the nested object with a fresh delegate of it.
    Clone,
}
impl Default for DeepMode {
    fn default() -> Self {
        DeepMode::None
    }
}
impl From<&str> for DeepMode {
    fn from(mode: &str) -> Self {
        match mode {
            "copy" => DeepMode::Copy,
            "clone" => DeepMode::Clone,
            _ => DeepMode::None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    pub deep_mode: DeepMode,
    /// Parent of the detached copy. `None` means the realm root.
    pub root_parent: Option<ObjectRef>,
    /// How many ancestors to copy along with the source. `None` walks up to
    /// (but not including) the realm root or `root_parent`.
    pub parent_depth: Option<usize>,
    /// Flatten all copied levels into a single object.
    pub mix_parents: bool,
}
impl CopyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deep_mode(mut self, mode: DeepMode) -> Self {
        self.deep_mode = mode;
        self
    }

    pub fn root_parent(mut self, parent: ObjectRef) -> Self {
        self.root_parent = Some(parent);
        self
    }

    pub fn parent_depth(mut self, depth: usize) -> Self {
        self.parent_depth = Some(depth);
        self
    }

    pub fn mix_parents(mut self, flag: bool) -> Self {
        self.mix_parents = flag;
        self
    }

    /// Reads options from loosely typed arguments in any order: a string
    /// selects the deep mode, an object the root parent, a number the depth
    /// (positive infinity for unbounded) and a boolean the mix flag. Other
    /// values are ignored.
    pub fn from_values(args: &[Value]) -> Self {
        let mut options = CopyOptions::new();
        for arg in args {
            match arg {
                Value::String(mode) => options.deep_mode = DeepMode::from(mode.as_str()),
                Value::Object(parent) => options.root_parent = Some(parent.clone()),
                Value::Number(n) => {
                    options.parent_depth = if n.is_infinite() && *n > 0.0 {
                        None
                    } else if n.is_nan() || *n <= 0.0 {
                        Some(0)
                    } else {
                        Some(*n as usize)
                    }
                }
                Value::Boolean(flag) => options.mix_parents = *flag,
                _ => {}
            }
        }
        options
    }
}

type CopyMemo = HashMap<*const RefCell<ObjectBase>, ObjectRef>;

impl Realm {
    /// New object delegating to `parent`, carrying `compile(raw, defaults)`.
    ///
    /// A constructor synthesized from a string entry is linked to `parent`, so
    /// [`Realm::construct`] builds delegates of `parent` through it.
    /// Caller-supplied constructors are never relinked.
    pub fn clone_object(
        &self,
        parent: &ObjectRef,
        raw: Option<&PropertyMap>,
        defaults: Option<&AttributeDefaults>,
    ) -> Result<ObjectRef, ErrorType> {
        let compiled = match raw {
            Some(raw) => compile(raw, defaults),
            None => CompiledProperties::new(),
        };
        let o = self.allocate_object(Some(parent.clone()), compiled.len())?;
        for (name, descriptor) in compiled {
            if name == CONSTRUCTOR {
                if let Some(Value::Function(f)) = descriptor.value() {
                    if f.is_synthesized() && f.get_prototype().is_none() {
                        f.set_prototype(Some(parent.clone()));
                    }
                }
            }
            define_property_or_throw(&o, &name, descriptor)?;
        }
        log::debug!(
            "clone: {} delegates to {}",
            (*o).borrow().id(),
            (**parent).borrow().id()
        );
        Ok(o)
    }

    /// `clone_object(parent)` followed by its constructor. A constructor that
    /// returns something other than `Undefined` replaces the clone.
    pub fn create(&self, parent: &ObjectRef, args: Vec<Value>) -> Result<Value, ErrorType> {
        let o = self.clone_object(parent, None, None)?;
        let result = invoke(&o, CONSTRUCTOR, args)?;
        Ok(if result.is_undefined() {
            Value::Object(o)
        } else {
            result
        })
    }

    /// Builds an instance through a constructor value: a fresh delegate of the
    /// constructor's prototype link with the constructor run on it. The
    /// constructor stands one level below that prototype, so a dispatch from
    /// its body resolves at the prototype.
    pub fn construct(
        &self,
        constructor: &FunctionRef,
        args: Vec<Value>,
    ) -> Result<Value, ErrorType> {
        let prototype = match constructor.get_prototype() {
            Some(prototype) => prototype,
            None => {
                return Err(ErrorType::TypeError(format!(
                    "'{}' is not linked to a prototype",
                    constructor.name()
                )))
            }
        };
        let o = self.allocate_object(Some(prototype.clone()), 0)?;
        let result = {
            let _guard = CursorGuard::acquire(&o, SuperCursor::At(Some(prototype)));
            constructor.call(&o, args)?
        };
        log::debug!("construct: {} built by {}", (*o).borrow().id(), constructor.name());
        Ok(if result.is_undefined() {
            Value::Object(o)
        } else {
            result
        })
    }

    /// Detaches `source` from its live chain.
    pub fn copy(&self, source: &ObjectRef, options: &CopyOptions) -> Result<ObjectRef, ErrorType> {
        let mut memo = CopyMemo::new();
        let copied = self.copy_with_memo(source, options, &mut memo)?;
        log::debug!(
            "copy: {} detached as {} ({:?}, mix_parents={})",
            (**source).borrow().id(),
            (*copied).borrow().id(),
            options.deep_mode,
            options.mix_parents
        );
        Ok(copied)
    }

    fn copy_with_memo(
        &self,
        source: &ObjectRef,
        options: &CopyOptions,
        memo: &mut CopyMemo,
    ) -> Result<ObjectRef, ErrorType> {
        if let Some(done) = memo.get(&Rc::as_ptr(source)) {
            return Ok(done.clone());
        }
        let root_parent = options.root_parent.clone().unwrap_or_else(|| self.root());
        let levels = self.collect_levels(source, options.parent_depth, &root_parent);

        if options.mix_parents {
            let merged = merge_levels(&levels);
            let o = self.allocate_object(Some(root_parent), merged.len())?;
            memo.insert(Rc::as_ptr(source), o.clone());
            self.install_copied(&o, merged, options, memo)?;
            return Ok(o);
        }

        // Allocate the whole chain first so cycles back to `source` resolve.
        let mut parent = root_parent;
        let mut targets = Vec::with_capacity(levels.len());
        for level in levels.iter().rev() {
            let count = (**level).borrow().property_count();
            let o = self.allocate_object(Some(parent), count)?;
            parent = o.clone();
            targets.push((level.clone(), o));
        }
        memo.insert(Rc::as_ptr(source), parent.clone());
        for (level, target) in targets {
            let properties = (*level).borrow().own_properties();
            self.install_copied(&target, properties, options, memo)?;
        }
        Ok(parent)
    }

    fn install_copied(
        &self,
        target: &ObjectRef,
        properties: Vec<(String, PropertyDescriptor)>,
        options: &CopyOptions,
        memo: &mut CopyMemo,
    ) -> Result<(), ErrorType> {
        for (name, descriptor) in properties {
            let nested = descriptor.value().and_then(Value::as_object).cloned();
            let descriptor = match (options.deep_mode, nested) {
                (DeepMode::Copy, Some(nested)) => {
                    let copied = self.copy_with_memo(&nested, options, memo)?;
                    descriptor.with_value(Value::Object(copied))
                }
                (DeepMode::Clone, Some(nested)) => {
                    let cloned = self.clone_object(&nested, None, None)?;
                    descriptor.with_value(Value::Object(cloned))
                }
                _ => descriptor,
            };
            define_property_or_throw(target, &name, descriptor)?;
        }
        Ok(())
    }

    /// Builds a delegate of `receiver` holding the own properties of every
    /// source and of up to `parent_depth` ancestors of each. Later sources
    /// and more-derived levels win. With `preserve_nesting` every source gets
    /// its own level, so dispatch can climb from one mixed-in source to the
    /// previous one.
    pub fn mix(
        &self,
        receiver: &ObjectRef,
        sources: &[ObjectRef],
        parent_depth: usize,
        preserve_nesting: bool,
    ) -> Result<ObjectRef, ErrorType> {
        let mixed = if preserve_nesting && !sources.is_empty() {
            let mut current = receiver.clone();
            for source in sources {
                let levels = self.collect_levels(source, Some(parent_depth), receiver);
                let merged = merge_levels(&levels);
                let hop = self.allocate_object(Some(current), merged.len())?;
                install(&hop, merged)?;
                current = hop;
            }
            current
        } else {
            let mut merged = IndexMap::new();
            for source in sources {
                let levels = self.collect_levels(source, Some(parent_depth), receiver);
                for (name, descriptor) in merge_levels(&levels) {
                    merged.insert(name, descriptor);
                }
            }
            let o = self.allocate_object(Some(receiver.clone()), merged.len())?;
            install(&o, merged.into_iter().collect())?;
            o
        };
        log::debug!(
            "mix: {} source(s) over {} (preserve_nesting={})",
            sources.len(),
            (**receiver).borrow().id(),
            preserve_nesting
        );
        Ok(mixed)
    }

    /// `source` followed by up to `depth` ancestors, stopping before the
    /// realm root and before `stop_at`.
    fn collect_levels(
        &self,
        source: &ObjectRef,
        depth: Option<usize>,
        stop_at: &ObjectRef,
    ) -> Vec<ObjectRef> {
        let root = self.root();
        let mut levels = vec![source.clone()];
        let mut p = (**source).borrow().get_prototype_of();
        while let Some(ancestor) = p {
            if depth.map_or(false, |d| levels.len() > d)
                || same_object(&ancestor, &root)
                || same_object(&ancestor, stop_at)
            {
                break;
            }
            p = (*ancestor).borrow().get_prototype_of();
            levels.push(ancestor);
        }
        levels
    }
}

/// Own records of `levels` (most-derived first) merged so that lower levels
/// override their ancestors.
fn merge_levels(levels: &[ObjectRef]) -> Vec<(String, PropertyDescriptor)> {
    let mut merged: IndexMap<String, PropertyDescriptor> = IndexMap::new();
    for level in levels.iter().rev() {
        for (name, descriptor) in (**level).borrow().own_properties() {
            merged.insert(name, descriptor);
        }
    }
    merged.into_iter().collect()
}

fn install(
    target: &ObjectRef,
    properties: Vec<(String, PropertyDescriptor)>,
) -> Result<(), ErrorType> {
    for (name, descriptor) in properties {
        define_property_or_throw(target, &name, descriptor)?;
    }
    Ok(())
}
