//! Property access operations
//!
//! Reads and writes follow the prototype chain. Accessor properties run
//! their getter/setter with the receiver as `this`. Dynamic arrays expose
//! `length` and their index-named elements as virtual own properties.

use crate::context::DynContext;
use crate::error::{DynError, DynResult};
use crate::runtime::object::ObjectRef;
use crate::runtime::property::{PropertyFlags, PropertySlot};
use crate::runtime::MAX_ARRAY_LENGTH;
use crate::util::parse_array_index;
use crate::value::{DynValue, Value};

/// Fields read from a descriptor object
#[derive(Debug, Default)]
struct Descriptor {
    value: Option<Value>,
    writable: Option<bool>,
    get: Option<Value>,
    set: Option<Value>,
    enumerable: Option<bool>,
    configurable: Option<bool>,
}

impl Descriptor {
    fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }
}

/// Same value for redefinition checks (NaN equals itself)
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.same(b),
    }
}

/// Accessor half as stored: `undefined` means absent
fn accessor_half(v: Option<&Value>) -> Option<Value> {
    v.filter(|v| !v.is_undefined()).cloned()
}

fn same_half(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (accessor_half(a), accessor_half(b)) {
        (None, None) => true,
        (Some(x), Some(y)) => x.same(&y),
        _ => false,
    }
}

fn expect_object<'a>(obj: &'a DynValue) -> DynResult<&'a ObjectRef> {
    obj.as_object()
        .ok_or_else(|| DynError::type_error("not an object"))
}

/// Validate a new array length value
fn array_length(value: &Value) -> DynResult<u32> {
    match value {
        Value::Number(n)
            if *n >= 0.0 && n.fract() == 0.0 && *n <= MAX_ARRAY_LENGTH as f64 =>
        {
            Ok(*n as u32)
        }
        _ => Err(DynError::exception("invalid array length")),
    }
}

impl DynContext {
    /// Assign a property, creating an own data property when needed
    pub fn set_property(&self, obj: &DynValue, name: &str, value: &DynValue) -> DynResult<()> {
        let target = expect_object(obj)?;

        if self.set_array_property(target, name, value.value())? {
            return Ok(());
        }

        if let Some(found) = self.lookup_property(target, name)? {
            match found.slot {
                PropertySlot::Accessor {
                    setter: Some(setter),
                    ..
                } => {
                    self.call_value(&setter, obj, std::slice::from_ref(value))?;
                    return Ok(());
                }
                PropertySlot::Accessor { setter: None, .. } => {
                    return Err(DynError::exception(format!(
                        "property '{}' has only a getter",
                        name
                    )));
                }
                PropertySlot::Data(_) if !found.flags.writable() => {
                    return Err(DynError::exception(format!(
                        "property '{}' is read-only",
                        name
                    )));
                }
                PropertySlot::Data(_) => {}
            }
        }

        target
            .borrow_mut()
            .props_mut()
            .set(name, value.value().clone());
        Ok(())
    }

    /// Writes to `length` and indices of a dynamic array
    ///
    /// Returns false when `name` is not one of the array's virtual properties.
    fn set_array_property(&self, target: &ObjectRef, name: &str, value: &Value) -> DynResult<bool> {
        let mut obj = target.borrow_mut();
        let Some(arr) = obj.as_array_mut() else {
            return Ok(false);
        };
        if name == "length" {
            let len = array_length(value)?;
            self.check_array_length(len as u64)?;
            arr.set_length(len)?;
            return Ok(true);
        }
        let Some(idx) = parse_array_index(name) else {
            return Ok(false);
        };
        self.check_array_length(idx as u64 + 1)?;
        arr.set(idx, value.clone())?;
        Ok(true)
    }

    /// Reject dense array lengths past the configured limit
    pub(crate) fn check_array_length(&self, len: u64) -> DynResult<()> {
        let limit = self.config().max_array_length.min(MAX_ARRAY_LENGTH);
        if len > limit as u64 {
            return Err(DynError::exception(format!(
                "array length {} exceeds the limit of {}",
                len, limit
            )));
        }
        Ok(())
    }

    /// Read a property through the prototype chain
    ///
    /// Returns `Ok(None)` when no object on the chain has the property.
    pub fn get_property(&self, obj: &DynValue, name: &str) -> DynResult<Option<DynValue>> {
        let target = expect_object(obj)?;
        let Some(found) = self.lookup_property(target, name)? else {
            return Ok(None);
        };
        match found.slot {
            PropertySlot::Data(v) => Ok(Some(DynValue::new(v))),
            PropertySlot::Accessor {
                getter: Some(getter),
                ..
            } => self.call_value(&getter, obj, &[]).map(Some),
            PropertySlot::Accessor { getter: None, .. } => Ok(Some(self.new_undefined())),
        }
    }

    /// Check for a property on the object or its prototypes
    pub fn has_property(&self, obj: &DynValue, name: &str) -> DynResult<bool> {
        let target = expect_object(obj)?;
        Ok(self.lookup_property(target, name)?.is_some())
    }

    /// Delete an own property
    ///
    /// Returns `false` when the property is absent or not configurable.
    /// Array lengths and elements are not configurable.
    pub fn delete_property(&self, obj: &DynValue, name: &str) -> DynResult<bool> {
        let Some(target) = obj.as_object() else {
            return Ok(false);
        };
        if !self.has_property(obj, name)? {
            return Ok(false);
        }

        let mut o = target.borrow_mut();
        if o.as_array().is_some() && (name == "length" || parse_array_index(name).is_some()) {
            return Ok(false);
        }
        let configurable = match o.props().get(name) {
            Some(prop) => prop.flags().configurable(),
            // Only inherited: nothing to delete on the receiver
            None => return Ok(true),
        };
        if !configurable {
            return Ok(false);
        }
        o.props_mut().delete(name);
        Ok(true)
    }

    /// Define or redefine an own property from a descriptor object
    ///
    /// The descriptor is fully validated before the object is touched.
    pub fn define_property(&self, obj: &DynValue, name: &str, desc: &DynValue) -> DynResult<()> {
        let target = expect_object(obj)?;
        if !desc.is_object() {
            return Err(DynError::type_error("property descriptor is not an object"));
        }
        let desc = self.read_descriptor(desc)?;

        if desc.is_accessor() && desc.is_data() {
            return Err(DynError::exception(
                "invalid property descriptor: accessors cannot have a value or be writable",
            ));
        }
        for half in [&desc.get, &desc.set].into_iter().flatten() {
            if !half.is_undefined() && !half.is_function() {
                return Err(DynError::exception("getter or setter is not a function"));
            }
        }

        let is_array_slot = {
            let o = target.borrow();
            o.as_array().is_some() && (name == "length" || parse_array_index(name).is_some())
        };
        if is_array_slot {
            if desc.is_accessor() {
                return Err(DynError::exception("cannot define an accessor on an array element"));
            }
            if let Some(value) = &desc.value {
                self.set_array_property(target, name, value)?;
            }
            return Ok(());
        }

        let mut o = target.borrow_mut();
        let current = o
            .props()
            .get(name)
            .map(|prop| (prop.slot().clone(), prop.flags()));

        let (slot, flags) = match current {
            None => {
                let slot = if desc.is_accessor() {
                    PropertySlot::Accessor {
                        getter: accessor_half(desc.get.as_ref()),
                        setter: accessor_half(desc.set.as_ref()),
                    }
                } else {
                    PropertySlot::Data(desc.value.clone().unwrap_or_default())
                };
                let flags = PropertyFlags::NONE
                    .with(PropertyFlags::WRITABLE, desc.writable.unwrap_or(false))
                    .with(PropertyFlags::ENUMERABLE, desc.enumerable.unwrap_or(false))
                    .with(PropertyFlags::CONFIGURABLE, desc.configurable.unwrap_or(false));
                (slot, flags)
            }
            Some((cur_slot, cur_flags)) => {
                if !cur_flags.configurable() {
                    Self::check_redefinition(name, &desc, &cur_slot, cur_flags)?;
                }
                Self::merge_descriptor(&desc, cur_slot, cur_flags)
            }
        };

        o.props_mut().define(name, slot, flags);
        Ok(())
    }

    fn read_descriptor(&self, desc: &DynValue) -> DynResult<Descriptor> {
        let field = |name: &str| -> DynResult<Option<Value>> {
            if !self.has_property(desc, name)? {
                return Ok(None);
            }
            Ok(Some(
                self.get_property(desc, name)?
                    .map(|v| v.value().clone())
                    .unwrap_or_default(),
            ))
        };
        let flag = |name: &str| -> DynResult<Option<bool>> {
            Ok(field(name)?.map(|v| !v.is_falsy()))
        };
        Ok(Descriptor {
            value: field("value")?,
            writable: flag("writable")?,
            get: field("get")?,
            set: field("set")?,
            enumerable: flag("enumerable")?,
            configurable: flag("configurable")?,
        })
    }

    /// Changes a non-configurable property refuses
    fn check_redefinition(
        name: &str,
        desc: &Descriptor,
        cur_slot: &PropertySlot,
        cur_flags: PropertyFlags,
    ) -> DynResult<()> {
        let refuse = || Err(DynError::exception(format!("cannot redefine property '{}'", name)));

        if desc.configurable == Some(true) {
            return refuse();
        }
        if desc.enumerable.is_some_and(|e| e != cur_flags.enumerable()) {
            return refuse();
        }
        match cur_slot {
            PropertySlot::Data(_) if desc.is_accessor() => refuse(),
            PropertySlot::Accessor { .. } if desc.is_data() => refuse(),
            PropertySlot::Data(cur) => {
                if cur_flags.writable() {
                    return Ok(());
                }
                if desc.writable == Some(true) {
                    return refuse();
                }
                match &desc.value {
                    Some(v) if !same_value(v, cur) => refuse(),
                    _ => Ok(()),
                }
            }
            PropertySlot::Accessor { getter, setter } => {
                if desc.get.is_some() && !same_half(desc.get.as_ref(), getter.as_ref()) {
                    return refuse();
                }
                if desc.set.is_some() && !same_half(desc.set.as_ref(), setter.as_ref()) {
                    return refuse();
                }
                Ok(())
            }
        }
    }

    /// Apply a descriptor over an existing property
    fn merge_descriptor(
        desc: &Descriptor,
        cur_slot: PropertySlot,
        cur_flags: PropertyFlags,
    ) -> (PropertySlot, PropertyFlags) {
        let (slot, writable) = match cur_slot {
            PropertySlot::Accessor { getter, setter } if desc.is_accessor() => (
                PropertySlot::Accessor {
                    getter: desc.get.as_ref().map_or(getter, |g| accessor_half(Some(g))),
                    setter: desc.set.as_ref().map_or(setter, |s| accessor_half(Some(s))),
                },
                false,
            ),
            _ if desc.is_accessor() => (
                PropertySlot::Accessor {
                    getter: accessor_half(desc.get.as_ref()),
                    setter: accessor_half(desc.set.as_ref()),
                },
                false,
            ),
            PropertySlot::Data(cur) if desc.is_data() => (
                PropertySlot::Data(desc.value.clone().unwrap_or(cur)),
                desc.writable.unwrap_or(cur_flags.writable()),
            ),
            PropertySlot::Accessor { .. } if desc.is_data() => (
                PropertySlot::Data(desc.value.clone().unwrap_or_default()),
                desc.writable.unwrap_or(false),
            ),
            // Generic descriptor: keep the current slot
            slot => (slot, cur_flags.writable()),
        };

        let flags = cur_flags
            .with(PropertyFlags::WRITABLE, writable)
            .with(
                PropertyFlags::ENUMERABLE,
                desc.enumerable.unwrap_or(cur_flags.enumerable()),
            )
            .with(
                PropertyFlags::CONFIGURABLE,
                desc.configurable.unwrap_or(cur_flags.configurable()),
            );
        (slot, flags)
    }

    /// Store an element of a dynamic array, extending it with `undefined`
    pub fn set_elem(&self, arr: &DynValue, index: i64, value: &DynValue) -> DynResult<()> {
        let target = arr
            .as_object()
            .filter(|_| arr.is_array())
            .ok_or_else(|| DynError::type_error("not an array"))?;
        if index < 0 {
            return Err(DynError::type_error("negative array index"));
        }
        self.check_array_length(index as u64 + 1)?;
        let mut o = target.borrow_mut();
        let arr = o
            .as_array_mut()
            .ok_or_else(|| DynError::type_error("not an array"))?;
        arr.set(index as u32, value.value().clone())
    }

    /// Read an element of a dynamic array; out of range reads `undefined`
    pub fn get_elem(&self, arr: &DynValue, index: i64) -> DynResult<DynValue> {
        let target = arr
            .as_object()
            .filter(|_| arr.is_array())
            .ok_or_else(|| DynError::type_error("not an array"))?;
        let elem = u32::try_from(index).ok().and_then(|idx| {
            let o = target.borrow();
            o.as_array().and_then(|a| a.get(idx).cloned())
        });
        Ok(match elem {
            Some(v) => DynValue::new(v),
            None => self.new_undefined(),
        })
    }
}
