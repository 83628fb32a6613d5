//! Dynamic value engine context
//!
//! The `DynContext` is the handle every engine operation goes through. It
//! owns the `undefined`/`null` singleton boxes, the pending exception, the
//! callback dispatcher for external functions, the registry of growable
//! array element kinds and the engine configuration.
//!
//! A context is constructed once by the embedder and passed by reference;
//! there is no process-wide instance.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builtins::{ArrayTypeRegistry, ElemKind};
use crate::error::{DynError, DynResult};
use crate::runtime::function::CallbackDispatcher;
use crate::runtime::object::{JSObject, ObjectRef};
use crate::runtime::{ValueArray, MAX_ARRAY_LENGTH};
use crate::value::{DynValue, SymbolData, Value};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Element kinds that have a registered growable array type
    pub array_kinds: Vec<ElemKind>,
    /// Longest prototype chain any walk will follow
    pub max_prototype_depth: usize,
    /// Largest length a dynamic array may be padded to
    pub max_array_length: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            array_kinds: ElemKind::ALL.to_vec(),
            max_prototype_depth: 1024,
            max_array_length: MAX_ARRAY_LENGTH,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document; missing fields take their defaults
    pub fn from_json(text: &str) -> DynResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| DynError::exception(format!("invalid engine config: {}", e)))
    }
}

/// Dynamic value engine context
pub struct DynContext {
    /// Shared `undefined` box
    undefined: DynValue,
    /// Shared `null` box
    null: DynValue,
    /// Host hook for external functions
    pub(crate) dispatcher: RefCell<Option<Rc<dyn CallbackDispatcher>>>,
    /// Pending exception (if any)
    exception: RefCell<Option<DynValue>>,
    array_types: ArrayTypeRegistry,
    config: EngineConfig,
}

impl DynContext {
    /// Create a context with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a context with a custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        debug!(
            array_kinds = config.array_kinds.len(),
            max_prototype_depth = config.max_prototype_depth,
            "dynamic context created"
        );
        DynContext {
            undefined: DynValue::new(Value::Undefined),
            null: DynValue::new(Value::Null),
            dispatcher: RefCell::new(None),
            exception: RefCell::new(None),
            array_types: ArrayTypeRegistry::from_kinds(&config.array_kinds),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registry of growable array element kinds
    #[inline]
    pub fn array_types(&self) -> &ArrayTypeRegistry {
        &self.array_types
    }

    // Construction

    pub fn new_number(&self, value: f64) -> DynValue {
        DynValue::new(Value::Number(value))
    }

    pub fn new_boolean(&self, value: bool) -> DynValue {
        DynValue::new(Value::Bool(value))
    }

    pub fn new_string(&self, s: &str) -> DynValue {
        DynValue::new(Value::string(s))
    }

    /// Create a string from the first `len` bytes of `bytes`
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn new_string_with_length(&self, bytes: &[u8], len: usize) -> DynValue {
        let prefix = &bytes[..len.min(bytes.len())];
        DynValue::new(Value::string(&String::from_utf8_lossy(prefix)))
    }

    /// Handle to the shared `undefined` box
    pub fn new_undefined(&self) -> DynValue {
        self.undefined.clone()
    }

    /// Handle to the shared `null` box
    pub fn new_null(&self) -> DynValue {
        self.null.clone()
    }

    /// Create a symbol with an optional description
    pub fn new_symbol(&self, description: Option<&str>) -> DynValue {
        DynValue::new(Value::Symbol(Rc::new(SymbolData {
            description: description.map(Rc::from),
        })))
    }

    /// Create an empty plain object with a null prototype
    pub fn new_object(&self) -> DynValue {
        DynValue::new(Value::Object(ObjectRef::new(JSObject::new(None))))
    }

    /// Create an empty dynamic array
    pub fn new_array(&self) -> DynValue {
        DynValue::new(Value::Object(ObjectRef::new(JSObject::new_array(
            ValueArray::new(),
            None,
        ))))
    }

    /// Create a dynamic array of `len` undefined elements
    pub fn new_array_with_length(&self, len: u32) -> DynResult<DynValue> {
        self.check_array_length(len as u64)?;
        Ok(DynValue::new(Value::Object(ObjectRef::new(JSObject::new_array(
            ValueArray::with_length(len)?,
            None,
        )))))
    }

    /// Build a value tree from a JSON document
    pub fn parse_json(&self, text: &str) -> DynResult<DynValue> {
        let doc: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| DynError::exception(format!("JSON parse error: {}", e)))?;
        Ok(DynValue::new(json_to_value(&doc)))
    }

    // Lifetime

    /// Take another handle to a box
    #[inline]
    pub fn hold(&self, v: &DynValue) -> DynValue {
        v.clone()
    }

    /// Drop a handle; the box is freed with its last handle
    #[inline]
    pub fn release(&self, v: Option<DynValue>) {
        drop(v);
    }

    // Exceptions

    /// Record a pending exception, replacing any previous one
    pub fn throw_exception(&self, v: DynValue) {
        *self.exception.borrow_mut() = Some(v);
    }

    /// Take and clear the pending exception
    pub fn take_exception(&self) -> Option<DynValue> {
        self.exception.borrow_mut().take()
    }

    pub fn has_exception(&self) -> bool {
        self.exception.borrow().is_some()
    }

    // Type predicates

    #[inline]
    pub fn is_undefined(&self, v: &DynValue) -> bool {
        v.is_undefined()
    }

    #[inline]
    pub fn is_null(&self, v: &DynValue) -> bool {
        v.is_null()
    }

    #[inline]
    pub fn is_bool(&self, v: &DynValue) -> bool {
        v.is_bool()
    }

    #[inline]
    pub fn is_number(&self, v: &DynValue) -> bool {
        v.is_number()
    }

    #[inline]
    pub fn is_string(&self, v: &DynValue) -> bool {
        v.is_string()
    }

    #[inline]
    pub fn is_symbol(&self, v: &DynValue) -> bool {
        v.is_symbol()
    }

    #[inline]
    pub fn is_object(&self, v: &DynValue) -> bool {
        v.is_object()
    }

    pub fn is_array(&self, v: &DynValue) -> bool {
        v.is_array()
    }

    pub fn is_function(&self, v: &DynValue) -> bool {
        v.is_function()
    }

    pub fn is_falsy(&self, v: &DynValue) -> bool {
        v.is_falsy()
    }

    // Conversions

    pub fn to_number(&self, v: &DynValue) -> DynResult<f64> {
        v.as_number()
            .ok_or_else(|| DynError::type_error("value is not a number"))
    }

    pub fn to_bool(&self, v: &DynValue) -> DynResult<bool> {
        v.as_bool()
            .ok_or_else(|| DynError::type_error("value is not a boolean"))
    }

    /// String conversion of any value
    pub fn to_string(&self, v: &DynValue) -> String {
        v.value().to_string()
    }

    /// Inspection dump of a value
    pub fn dump_value(&self, v: &DynValue) -> String {
        v.inspect()
    }

    /// Write the inspection dump into `buf`
    ///
    /// Returns the number of bytes written; output that does not fit is cut.
    pub fn dump_value_buffer(&self, v: &DynValue, buf: &mut [u8]) -> usize {
        let dump = v.inspect();
        let n = dump.len().min(buf.len());
        buf[..n].copy_from_slice(&dump.as_bytes()[..n]);
        n
    }
}

impl Default for DynContext {
    fn default() -> Self {
        Self::new()
    }
}

fn json_to_value(doc: &serde_json::Value) -> Value {
    match doc {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => {
            let values = items.iter().map(json_to_value).collect();
            Value::Object(ObjectRef::new(JSObject::new_array(
                ValueArray::from_values(values),
                None,
            )))
        }
        serde_json::Value::Object(map) => {
            let mut obj = JSObject::new(None);
            for (key, item) in map {
                obj.props_mut().set(key, json_to_value(item));
            }
            Value::Object(ObjectRef::new(obj))
        }
    }
}
