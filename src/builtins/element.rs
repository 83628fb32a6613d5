//! Element kinds of growable arrays
//!
//! Every algorithm in the array engine is written once, generic over
//! `ArrayElement`. The trait carries what differs between kinds: equality
//! used by `index_of`/`includes`, unpacking of callback results and boxing
//! into a dynamic value.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::builtins::callback::Ret;
use crate::context::DynContext;
use crate::error::DynResult;
use crate::value::{DynValue, TypeTag, Value};

/// Element kind of a growable array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElemKind {
    F64,
    F32,
    I64,
    I32,
    Bool,
    /// Dynamic values
    Any,
    /// String-like host objects
    Str,
    /// Reference-like host objects
    Ref,
}

impl ElemKind {
    pub const ALL: [ElemKind; 8] = [
        ElemKind::F64,
        ElemKind::F32,
        ElemKind::I64,
        ElemKind::I32,
        ElemKind::Bool,
        ElemKind::Any,
        ElemKind::Str,
        ElemKind::Ref,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ElemKind::F64 => "f64",
            ElemKind::F32 => "f32",
            ElemKind::I64 => "i64",
            ElemKind::I32 => "i32",
            ElemKind::Bool => "bool",
            ElemKind::Any => "any",
            ElemKind::Str => "str",
            ElemKind::Ref => "ref",
        }
    }
}

/// A string owned by the host
///
/// Compared by content: lengths first, then bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct HostString(Rc<[u8]>);

impl HostString {
    pub fn new(s: &str) -> Self {
        HostString(Rc::from(s.as_bytes()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        HostString(Rc::from(bytes))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Handle of an object owned by the host, compared by identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HostRef(pub usize);

/// Per-kind behaviour of array elements
pub trait ArrayElement: Clone + fmt::Debug + 'static {
    const KIND: ElemKind;

    /// Value stored in dead slots
    fn filler() -> Self;

    /// Equality used by `index_of`, `last_index_of` and `includes`
    fn same(&self, other: &Self) -> bool;

    /// Unpack a callback result of this kind
    fn from_ret(ret: Ret) -> Option<Self>;

    /// Box into a dynamic value
    fn to_dyn(&self, ctx: &DynContext) -> DynResult<DynValue>;
}

macro_rules! number_element {
    ($ty:ty, $kind:ident) => {
        impl ArrayElement for $ty {
            const KIND: ElemKind = ElemKind::$kind;

            fn filler() -> Self {
                0 as $ty
            }

            fn same(&self, other: &Self) -> bool {
                self == other
            }

            fn from_ret(ret: Ret) -> Option<Self> {
                match ret {
                    Ret::$kind(v) => Some(v),
                    _ => None,
                }
            }

            fn to_dyn(&self, ctx: &DynContext) -> DynResult<DynValue> {
                Ok(ctx.new_number(*self as f64))
            }
        }
    };
}

number_element!(f64, F64);
number_element!(f32, F32);
number_element!(i64, I64);
number_element!(i32, I32);

impl ArrayElement for bool {
    const KIND: ElemKind = ElemKind::Bool;

    fn filler() -> Self {
        false
    }

    fn same(&self, other: &Self) -> bool {
        self == other
    }

    fn from_ret(ret: Ret) -> Option<Self> {
        match ret {
            Ret::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn to_dyn(&self, ctx: &DynContext) -> DynResult<DynValue> {
        Ok(ctx.new_boolean(*self))
    }
}

impl ArrayElement for DynValue {
    const KIND: ElemKind = ElemKind::Any;

    fn filler() -> Self {
        DynValue::new(Value::Undefined)
    }

    fn same(&self, other: &Self) -> bool {
        self.value().same(other.value())
    }

    fn from_ret(ret: Ret) -> Option<Self> {
        match ret {
            Ret::Any(v) => Some(v),
            _ => None,
        }
    }

    fn to_dyn(&self, _ctx: &DynContext) -> DynResult<DynValue> {
        Ok(self.clone())
    }
}

impl ArrayElement for HostString {
    const KIND: ElemKind = ElemKind::Str;

    fn filler() -> Self {
        HostString::from_bytes(&[])
    }

    fn same(&self, other: &Self) -> bool {
        self.len() == other.len() && self.as_bytes() == other.as_bytes()
    }

    fn from_ret(ret: Ret) -> Option<Self> {
        match ret {
            Ret::Str(s) => Some(s),
            _ => None,
        }
    }

    fn to_dyn(&self, ctx: &DynContext) -> DynResult<DynValue> {
        Ok(ctx.new_string_with_length(self.as_bytes(), self.len()))
    }
}

impl ArrayElement for HostRef {
    const KIND: ElemKind = ElemKind::Ref;

    fn filler() -> Self {
        HostRef(0)
    }

    fn same(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    fn from_ret(ret: Ret) -> Option<Self> {
        match ret {
            Ret::Ref(r) => Some(r),
            _ => None,
        }
    }

    fn to_dyn(&self, ctx: &DynContext) -> DynResult<DynValue> {
        ctx.new_external_reference(self.0, TypeTag::ExternalObject, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(<f64 as ArrayElement>::KIND, ElemKind::F64);
        assert_eq!(<HostString as ArrayElement>::KIND.name(), "str");
        let json = serde_json::to_string(&ElemKind::ALL).unwrap();
        assert_eq!(json, r#"["f64","f32","i64","i32","bool","any","str","ref"]"#);
        let kind: ElemKind = serde_json::from_str(r#""bool""#).unwrap();
        assert_eq!(kind, ElemKind::Bool);
    }

    #[test]
    fn test_string_equality() {
        let a = HostString::new("hello");
        let b = HostString::new("hello");
        assert!(a.same(&b));
        assert!(!a.same(&HostString::new("hell")));
        assert!(!a.same(&HostString::new("world")));
        assert_eq!(a.to_string(), "hello");
    }

    #[test]
    fn test_dyn_equality() {
        let ctx = DynContext::new();
        let obj = ctx.new_object();
        assert!(obj.same(&ctx.hold(&obj)));
        assert!(!obj.same(&ctx.new_object()));
        assert!(ctx.new_number(2.0).same(&ctx.new_number(2.0)));
        assert!(!ctx.new_number(f64::NAN).same(&ctx.new_number(f64::NAN)));
    }

    #[test]
    fn test_boxing() {
        let ctx = DynContext::new();
        assert_eq!(3i32.to_dyn(&ctx).unwrap().as_number(), Some(3.0));
        assert_eq!(true.to_dyn(&ctx).unwrap().as_bool(), Some(true));
        assert_eq!(HostString::new("ab").to_dyn(&ctx).unwrap().as_str(), Some("ab"));
        let r = HostRef(77).to_dyn(&ctx).unwrap();
        assert_eq!(ctx.to_extref(&r).unwrap(), (TypeTag::ExternalObject, 77));
    }

    #[test]
    fn test_from_ret() {
        assert_eq!(f64::from_ret(Ret::F64(1.5)), Some(1.5));
        assert_eq!(f64::from_ret(Ret::I32(1)), None);
        assert_eq!(HostRef::from_ret(Ret::Ref(HostRef(3))), Some(HostRef(3)));
    }
}
