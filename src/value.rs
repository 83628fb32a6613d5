//! Dynamic value representation
//!
//! A `Value` is the tagged union stored in property slots and dynamic array
//! cells. Compiled code never holds a `Value` directly: it holds a `DynValue`,
//! a shared box around one value plus its cached type tag.
//!
//! Heap kinds (string, symbol, object) keep their payload behind an `Rc`, so
//! the payload stays alive as long as any box, property slot or array cell
//! refers to it.

use std::fmt::{self, Write};
use std::ops::Deref;
use std::rc::Rc;

use crate::runtime::object::{ObjectClass, ObjectRef};
use crate::runtime::property::PropertySlot;
use crate::util::dtoa;

/// Nesting depth after which dumps print a placeholder
const MAX_DUMP_DEPTH: usize = 4;

/// Type tags reported by `typeof_value`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Undefined = 0,
    Null = 1,
    Boolean = 2,
    Number = 3,
    String = 4,
    Object = 5,
    Symbol = 6,
    ExternalObject = 7,
    ExternalFunction = 8,
    ExternalInterface = 9,
    ExternalArray = 10,
    Unknown = 11,
}

impl TypeTag {
    /// Check if this tag names an external reference kind
    #[inline]
    pub fn is_external(self) -> bool {
        matches!(
            self,
            TypeTag::ExternalObject
                | TypeTag::ExternalFunction
                | TypeTag::ExternalInterface
                | TypeTag::ExternalArray
        )
    }

    /// Source-level `typeof` string for this tag
    pub fn typeof_name(self) -> &'static str {
        match self {
            TypeTag::Undefined | TypeTag::Unknown => "undefined",
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Symbol => "symbol",
            TypeTag::ExternalFunction => "function",
            TypeTag::Null
            | TypeTag::Object
            | TypeTag::ExternalObject
            | TypeTag::ExternalInterface
            | TypeTag::ExternalArray => "object",
        }
    }
}

/// Payload of a symbol value
#[derive(Debug)]
pub struct SymbolData {
    pub description: Option<Rc<str>>,
}

/// A dynamically typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Symbol(Rc<SymbolData>),
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    #[inline]
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    /// Primitive tag of this value (external references report `Object`)
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Undefined => TypeTag::Undefined,
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Symbol(_) => TypeTag::Symbol,
            Value::Object(_) => TypeTag::Object,
        }
    }

    /// Check if this is undefined
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this is null
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is a boolean
    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Check if this is a number
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Check if this is a string
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this is a symbol
    #[inline]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    /// Check if this is an object (arrays and functions included)
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if this is a dynamic array
    pub fn is_array(&self) -> bool {
        self.as_object().is_some_and(|o| o.borrow().as_array().is_some())
    }

    /// Check if this is a callable object
    pub fn is_function(&self) -> bool {
        self.as_object().is_some_and(|o| o.borrow().as_function().is_some())
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the payload lives on the heap and is shared by count
    #[inline]
    pub fn is_counted(&self) -> bool {
        matches!(self, Value::String(_) | Value::Symbol(_) | Value::Object(_))
    }

    /// Falsiness: `undefined`, `null`, `false`, `0`, `NaN` and `""`
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => *n == 0.0 || n.is_nan(),
            Value::String(s) => s.is_empty(),
            Value::Symbol(_) | Value::Object(_) => false,
        }
    }

    /// Strict identity: heap kinds by pointer, primitives by value
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Symbol(a), Value::Symbol(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Write the string conversion of this value
    fn write_string<W: Write>(&self, out: &mut W, depth: usize) -> fmt::Result {
        match self {
            Value::Undefined => out.write_str("undefined"),
            Value::Null => out.write_str("null"),
            Value::Bool(b) => write!(out, "{}", b),
            Value::Number(n) => out.write_str(&dtoa::number_to_string(*n)),
            Value::String(s) => out.write_str(s),
            Value::Symbol(sym) => write_symbol(out, sym),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match obj.class() {
                    ObjectClass::Array(arr) => {
                        if depth >= MAX_DUMP_DEPTH {
                            return Ok(());
                        }
                        for (i, elem) in arr.iter().enumerate() {
                            if i > 0 {
                                out.write_char(',')?;
                            }
                            if !matches!(elem, Value::Undefined | Value::Null) {
                                elem.write_string(out, depth + 1)?;
                            }
                        }
                        Ok(())
                    }
                    ObjectClass::Function(_) => out.write_str("function () { [native code] }"),
                    ObjectClass::Plain => out.write_str("[object Object]"),
                }
            }
        }
    }

    /// Write an inspection dump of this value (strings quoted, objects expanded)
    fn write_inspect<W: Write>(&self, out: &mut W, depth: usize) -> fmt::Result {
        let obj = match self {
            Value::String(s) => return write!(out, "{:?}", s),
            Value::Object(obj) => obj.borrow(),
            other => return other.write_string(out, depth),
        };

        match obj.class() {
            ObjectClass::Function(_) => return out.write_str("[Function]"),
            ObjectClass::Array(_) if depth >= MAX_DUMP_DEPTH => return out.write_str("[Array]"),
            ObjectClass::Plain if depth >= MAX_DUMP_DEPTH => return out.write_str("[Object]"),
            ObjectClass::Array(arr) => {
                out.write_char('[')?;
                for (i, elem) in arr.iter().enumerate() {
                    out.write_str(if i > 0 { ", " } else { " " })?;
                    elem.write_inspect(out, depth + 1)?;
                }
                return out.write_str(if arr.is_empty() { "]" } else { " ]" });
            }
            ObjectClass::Plain => {}
        }

        out.write_char('{')?;
        let mut first = true;
        for prop in obj.props().iter().filter(|p| p.flags().enumerable()) {
            out.write_str(if first { " " } else { ", " })?;
            first = false;
            write!(out, "{}: ", prop.key())?;
            match prop.slot() {
                PropertySlot::Data(v) => v.write_inspect(out, depth + 1)?,
                PropertySlot::Accessor { .. } => out.write_str("[Getter/Setter]")?,
            }
        }
        out.write_str(if first { "}" } else { " }" })
    }

    /// Inspection dump as an owned string
    pub fn inspect(&self) -> String {
        let mut s = String::new();
        // Writing to a String cannot fail
        let _ = self.write_inspect(&mut s, 0);
        s
    }
}

fn write_symbol<W: Write>(out: &mut W, sym: &SymbolData) -> fmt::Result {
    match &sym.description {
        Some(desc) => write!(out, "Symbol({})", desc),
        None => out.write_str("Symbol()"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_string(f, 0)
    }
}

#[derive(Debug)]
struct ValueBox {
    value: Value,
    /// Primitive tag cached at boxing time
    tag: TypeTag,
}

/// Value box handle held by compiled code
///
/// Cloning a handle shares the box; the box is freed when its last handle
/// is dropped. Identity of the box (not of the value) is what `ptr_eq`
/// compares.
#[derive(Clone)]
pub struct DynValue(Rc<ValueBox>);

impl DynValue {
    /// Box a value
    pub fn new(value: Value) -> Self {
        let tag = value.tag();
        DynValue(Rc::new(ValueBox { value, tag }))
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.0.value
    }

    /// Cached primitive tag
    #[inline]
    pub fn tag(&self) -> TypeTag {
        self.0.tag
    }

    /// Check if two handles refer to the same box
    #[inline]
    pub fn ptr_eq(a: &DynValue, b: &DynValue) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Number of live handles to this box
    #[inline]
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl Deref for DynValue {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0.value
    }
}

impl From<Value> for DynValue {
    fn from(value: Value) -> Self {
        DynValue::new(value)
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynValue").field(&self.0.value).finish()
    }
}

impl fmt::Display for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.value.write_string(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::array::ValueArray;
    use crate::runtime::object::JSObject;

    #[test]
    fn test_tags() {
        assert_eq!(Value::Undefined.tag(), TypeTag::Undefined);
        assert_eq!(Value::Null.tag(), TypeTag::Null);
        assert_eq!(Value::Bool(true).tag(), TypeTag::Boolean);
        assert_eq!(Value::Number(1.5).tag(), TypeTag::Number);
        assert_eq!(Value::string("a").tag(), TypeTag::String);
        assert_eq!(TypeTag::ExternalArray as u8, 10);
        assert!(TypeTag::ExternalInterface.is_external());
        assert!(!TypeTag::Object.is_external());
    }

    #[test]
    fn test_typeof_names() {
        assert_eq!(TypeTag::Null.typeof_name(), "object");
        assert_eq!(TypeTag::ExternalFunction.typeof_name(), "function");
        assert_eq!(TypeTag::ExternalArray.typeof_name(), "object");
        assert_eq!(TypeTag::Symbol.typeof_name(), "symbol");
    }

    #[test]
    fn test_falsy() {
        assert!(Value::Undefined.is_falsy());
        assert!(Value::Null.is_falsy());
        assert!(Value::Number(0.0).is_falsy());
        assert!(Value::Number(f64::NAN).is_falsy());
        assert!(Value::string("").is_falsy());
        assert!(!Value::string("0").is_falsy());
        assert!(!Value::Number(-1.0).is_falsy());
        assert!(!Value::Object(ObjectRef::new(JSObject::new(None))).is_falsy());
    }

    #[test]
    fn test_same() {
        let o = ObjectRef::new(JSObject::new(None));
        assert!(Value::Object(o.clone()).same(&Value::Object(o)));
        assert!(!Value::Object(ObjectRef::new(JSObject::new(None)))
            .same(&Value::Object(ObjectRef::new(JSObject::new(None)))));
        assert!(Value::string("ab").same(&Value::string("ab")));
        assert!(!Value::Number(f64::NAN).same(&Value::Number(f64::NAN)));
        assert!(!Value::Null.same(&Value::Undefined));
    }

    #[test]
    fn test_box_identity() {
        let a = DynValue::new(Value::Number(1.0));
        let b = a.clone();
        let c = DynValue::new(Value::Number(1.0));
        assert!(DynValue::ptr_eq(&a, &b));
        assert!(!DynValue::ptr_eq(&a, &c));
        assert_eq!(a.handle_count(), 2);
        drop(b);
        assert_eq!(a.handle_count(), 1);
        assert!(!a.is_counted());
        assert!(DynValue::new(Value::string("s")).is_counted());
    }

    #[test]
    fn test_to_string() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Bool(false).to_string(), "false");
        let arr = ValueArray::from_values(vec![
            Value::Number(1.0),
            Value::Null,
            Value::string("x"),
        ]);
        let v = Value::Object(ObjectRef::new(JSObject::new_array(arr, None)));
        assert_eq!(v.to_string(), "1,,x");
        assert_eq!(
            Value::Object(ObjectRef::new(JSObject::new(None))).to_string(),
            "[object Object]"
        );
    }

    #[test]
    fn test_inspect() {
        let obj = ObjectRef::new(JSObject::new(None));
        obj.borrow_mut().props_mut().set("a", Value::Number(1.0));
        obj.borrow_mut().props_mut().set("b", Value::string("x"));
        assert_eq!(Value::Object(obj).inspect(), "{ a: 1, b: \"x\" }");

        let arr = ValueArray::from_values(vec![Value::Bool(true), Value::Undefined]);
        let v = Value::Object(ObjectRef::new(JSObject::new_array(arr, None)));
        assert_eq!(v.inspect(), "[ true, undefined ]");
        assert_eq!(
            Value::Object(ObjectRef::new(JSObject::new_array(ValueArray::new(), None))).inspect(),
            "[]"
        );
    }
}
