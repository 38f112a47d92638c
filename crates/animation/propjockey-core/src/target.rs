//! Animated objects and their identity.
//!
//! The timing pool keys in-progress work by object identity, not by value: two
//! [`ObjectRef`]s are equal only when they point at the same object.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::CallbackResult;
use crate::value::Value;

/// Something a setter can write animated values into.
pub trait Target {
    fn set_property(&mut self, name: &str, value: Value) -> CallbackResult<()>;

    fn property(&self, name: &str) -> Option<Value>;
}

/// Plain property map; the default object type for data-only hosts and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyBag {
    values: IndexMap<String, Value>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Target for PropertyBag {
    fn set_property(&mut self, name: &str, value: Value) -> CallbackResult<()> {
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Shared, identity-compared handle to an animated object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<dyn Target>>);

impl ObjectRef {
    pub fn new<T: Target + 'static>(target: T) -> Self {
        Self(Rc::new(RefCell::new(target)))
    }

    /// Wrap an object the host keeps its own typed handle to.
    pub fn from_rc<T: Target + 'static>(target: Rc<RefCell<T>>) -> Self {
        Self(target)
    }

    /// Read a property through the object's [`Target`] impl.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().property(name)
    }

    /// Read a numeric property; `None` when missing or not a number.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.as_number())
    }

    pub fn with<R>(&self, f: impl FnOnce(&dyn Target) -> R) -> R {
        f(&*self.0.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut dyn Target) -> R) -> R {
        f(&mut *self.0.borrow_mut())
    }

    #[inline]
    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", self.addr())
    }
}
