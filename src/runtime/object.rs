//! Object representation
//!
//! Every non-primitive dynamic value is a `JSObject` behind a shared,
//! interior-mutable `ObjectRef`. An object has a class (plain, array or
//! function), an optional prototype and a property table.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::runtime::array::ValueArray;
use crate::runtime::function::FunctionKind;
use crate::runtime::property::PropertyTable;

/// Object class IDs
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassId {
    /// Plain object
    Object = 0,
    /// Dynamic array
    Array = 1,
    /// Native or external function
    Function = 2,
}

/// Class-specific payload of an object
#[derive(Debug)]
pub enum ObjectClass {
    Plain,
    Array(ValueArray),
    Function(FunctionKind),
}

/// A dynamic object
#[derive(Debug)]
pub struct JSObject {
    class: ObjectClass,
    proto: Option<ObjectRef>,
    props: PropertyTable,
}

impl JSObject {
    /// Create a plain object
    pub fn new(proto: Option<ObjectRef>) -> Self {
        JSObject {
            class: ObjectClass::Plain,
            proto,
            props: PropertyTable::new(),
        }
    }

    /// Create an array object
    pub fn new_array(array: ValueArray, proto: Option<ObjectRef>) -> Self {
        JSObject {
            class: ObjectClass::Array(array),
            proto,
            props: PropertyTable::new(),
        }
    }

    /// Create a function object
    pub fn new_function(kind: FunctionKind, proto: Option<ObjectRef>) -> Self {
        JSObject {
            class: ObjectClass::Function(kind),
            proto,
            props: PropertyTable::new(),
        }
    }

    #[inline]
    pub fn class_id(&self) -> ClassId {
        match self.class {
            ObjectClass::Plain => ClassId::Object,
            ObjectClass::Array(_) => ClassId::Array,
            ObjectClass::Function(_) => ClassId::Function,
        }
    }

    #[inline]
    pub fn class(&self) -> &ObjectClass {
        &self.class
    }

    #[inline]
    pub fn as_array(&self) -> Option<&ValueArray> {
        match &self.class {
            ObjectClass::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut ValueArray> {
        match &mut self.class {
            ObjectClass::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    pub fn as_function(&self) -> Option<&FunctionKind> {
        match &self.class {
            ObjectClass::Function(kind) => Some(kind),
            _ => None,
        }
    }

    /// Prototype link (`None` is a null prototype)
    #[inline]
    pub fn proto(&self) -> Option<&ObjectRef> {
        self.proto.as_ref()
    }

    #[inline]
    pub fn set_proto(&mut self, proto: Option<ObjectRef>) {
        self.proto = proto;
    }

    #[inline]
    pub fn props(&self) -> &PropertyTable {
        &self.props
    }

    #[inline]
    pub fn props_mut(&mut self) -> &mut PropertyTable {
        &mut self.props
    }
}

/// Shared handle to an object
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<JSObject>>);

impl ObjectRef {
    pub fn new(obj: JSObject) -> Self {
        ObjectRef(Rc::new(RefCell::new(obj)))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, JSObject> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, JSObject> {
        self.0.borrow_mut()
    }

    /// Check if two handles refer to the same object
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the object, stable for its lifetime
    #[inline]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not recurse: property graphs may be cyclic
        match self.0.try_borrow() {
            Ok(obj) => write!(f, "ObjectRef({:?} @ {:#x})", obj.class_id(), self.addr()),
            Err(_) => write!(f, "ObjectRef(<borrowed> @ {:#x})", self.addr()),
        }
    }
}
