//! External references
//!
//! An external reference is an ordinary object carrying two hidden,
//! non-enumerable number properties: `@tag` (the `ExtRefTag`) and `@ref`
//! (the host handle). External functions are function objects whose
//! payload also records the host function and its environment, so they
//! can be invoked through the callback dispatcher.

use crate::context::DynContext;
use crate::error::{DynError, DynResult};
use crate::runtime::function::FunctionKind;
use crate::runtime::object::{JSObject, ObjectRef};
use crate::runtime::property::{PropertyFlags, PropertySlot};
use crate::value::{DynValue, TypeTag, Value};

/// Hidden property holding the external kind
pub const EXTREF_TAG: &str = "@tag";
/// Hidden property holding the host handle
pub const EXTREF_REF: &str = "@ref";

/// External kinds as stored in `@tag`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtRefTag {
    ExtObj = 0,
    ExtFunc = 1,
    ExtInfc = 2,
    ExtArray = 3,
}

impl ExtRefTag {
    pub fn from_type_tag(tag: TypeTag) -> Option<Self> {
        match tag {
            TypeTag::ExternalObject => Some(ExtRefTag::ExtObj),
            TypeTag::ExternalFunction => Some(ExtRefTag::ExtFunc),
            TypeTag::ExternalInterface => Some(ExtRefTag::ExtInfc),
            TypeTag::ExternalArray => Some(ExtRefTag::ExtArray),
            _ => None,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ExtRefTag::ExtObj),
            1 => Some(ExtRefTag::ExtFunc),
            2 => Some(ExtRefTag::ExtInfc),
            3 => Some(ExtRefTag::ExtArray),
            _ => None,
        }
    }

    pub fn type_tag(self) -> TypeTag {
        match self {
            ExtRefTag::ExtObj => TypeTag::ExternalObject,
            ExtRefTag::ExtFunc => TypeTag::ExternalFunction,
            ExtRefTag::ExtInfc => TypeTag::ExternalInterface,
            ExtRefTag::ExtArray => TypeTag::ExternalArray,
        }
    }
}

impl DynContext {
    /// Number stored in a hidden property, searched along the prototype chain
    fn hidden_number(&self, obj: &ObjectRef, name: &str) -> Option<f64> {
        let found = self.lookup_property(obj, name).ok()??;
        match found.slot {
            PropertySlot::Data(v) => v.as_number(),
            _ => None,
        }
    }

    /// External tag of an object or of the nearest prototype carrying one
    fn extref_tag(&self, obj: &ObjectRef) -> Option<ExtRefTag> {
        let tag = self.hidden_number(obj, EXTREF_TAG)?;
        ExtRefTag::from_u8(tag as u8)
    }

    /// Create an external reference to host object `ptr`
    ///
    /// `tag` must be one of the four external kinds. For
    /// `ExternalFunction`, `ptr` is the host function and `opaque` the
    /// environment it runs in.
    pub fn new_external_reference(
        &self,
        ptr: usize,
        tag: TypeTag,
        opaque: usize,
    ) -> DynResult<DynValue> {
        let ext_tag = ExtRefTag::from_type_tag(tag)
            .ok_or_else(|| DynError::type_error(format!("{:?} is not an external kind", tag)))?;

        let mut obj = match ext_tag {
            ExtRefTag::ExtFunc => JSObject::new_function(
                FunctionKind::External {
                    vfunc: ptr,
                    env: opaque,
                },
                None,
            ),
            _ => JSObject::new(None),
        };

        let hidden = PropertyFlags::NONE;
        let props = obj.props_mut();
        props.define(
            EXTREF_TAG,
            PropertySlot::Data(Value::Number(ext_tag as u8 as f64)),
            hidden,
        );
        props.define(EXTREF_REF, PropertySlot::Data(Value::Number(ptr as f64)), hidden);

        Ok(DynValue::new(Value::Object(ObjectRef::new(obj))))
    }

    /// Check if a value is an external reference
    pub fn is_extref(&self, v: &DynValue) -> bool {
        v.as_object().and_then(|o| self.extref_tag(o)).is_some()
    }

    /// Kind and host handle of an external reference
    pub fn to_extref(&self, v: &DynValue) -> DynResult<(TypeTag, usize)> {
        let obj = v
            .as_object()
            .ok_or_else(|| DynError::type_error("value is not an external reference"))?;
        let tag = self
            .extref_tag(obj)
            .ok_or_else(|| DynError::type_error("value is not an external reference"))?;
        let handle = self
            .hidden_number(obj, EXTREF_REF)
            .ok_or_else(|| DynError::exception("external reference has no handle"))?;
        Ok((tag.type_tag(), handle as usize))
    }

    /// Type tag of a value
    ///
    /// External references report their external kind rather than `Object`.
    pub fn typeof_value(&self, v: &DynValue) -> TypeTag {
        if let Some(tag) = v.as_object().and_then(|o| self.extref_tag(o)) {
            return tag.type_tag();
        }
        v.tag()
    }

    /// Source-level `typeof` string of a value
    pub fn typeof_name(&self, v: &DynValue) -> &'static str {
        if v.is_function() {
            return "function";
        }
        self.typeof_value(v).typeof_name()
    }
}
