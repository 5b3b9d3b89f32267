use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runner::ds::error::ErrorType;
use crate::runner::ds::object::ObjectRef;
use crate::runner::ds::value::Value;

/// Signature of every callable: receiver first, then the arguments.
pub type NativeFunction = dyn Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType>;

pub type FunctionRef = Rc<FunctionObject>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunctionKind {
    Normal,
    Getter,
    Setter,
    Constructor,
}

pub struct FunctionObject {
    name: String,
    kind: FunctionKind,
    body: Box<NativeFunction>,
    /// Made by the descriptor compiler rather than supplied by the caller.
    synthesized: bool,
    /// For synthesized constructors: the object instances built through this
    /// constructor delegate to.
    prototype: RefCell<Option<ObjectRef>>,
}
impl FunctionObject {
    fn new<F>(name: String, kind: FunctionKind, body: F) -> FunctionRef
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
    {
        Rc::new(FunctionObject {
            name,
            kind,
            body: Box::new(body),
            synthesized: false,
            prototype: RefCell::new(None),
        })
    }

    pub fn new_normal_function<F>(name: &str, body: F) -> FunctionRef
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
    {
        Self::new(name.to_string(), FunctionKind::Normal, body)
    }

    pub fn new_getter_function<F>(name: &str, body: F) -> FunctionRef
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
    {
        Self::new(format!("get {}", name), FunctionKind::Getter, body)
    }

    pub fn new_setter_function<F>(name: &str, body: F) -> FunctionRef
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
    {
        Self::new(format!("set {}", name), FunctionKind::Setter, body)
    }

    pub fn new_constructor_function<F>(name: &str, body: F) -> FunctionRef
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
    {
        Self::new(name.to_string(), FunctionKind::Constructor, body)
    }

    /// Constructor whose prototype link is set by the object it is installed
    /// on.
    pub fn new_synthesized_constructor_function<F>(name: &str, body: F) -> FunctionRef
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, ErrorType> + 'static,
    {
        Rc::new(FunctionObject {
            name: name.to_string(),
            kind: FunctionKind::Constructor,
            body: Box::new(body),
            synthesized: true,
            prototype: RefCell::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    pub fn get_prototype(&self) -> Option<ObjectRef> {
        self.prototype.borrow().clone()
    }

    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        *self.prototype.borrow_mut() = prototype;
    }

    pub fn call(&self, this: &ObjectRef, args: Vec<Value>) -> Result<Value, ErrorType> {
        (self.body)(this, args)
    }
}
impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionObject({:?}, {:?})", self.name, self.kind)
    }
}

/// First argument or `Undefined`.
pub fn first_arg(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Undefined)
}
