//! Callback invocation
//!
//! Every higher-order array method calls its user closure the same way:
//! the argument list is, in order, the closure context, the current element,
//! the current index as an `f64` and the receiver array. `reduce` passes the
//! accumulator before the element and the sort comparator receives only
//! the context, the pivot and the element. The result comes back as a `Ret`
//! of the kind the closure declares.

use std::fmt;
use std::rc::Rc;

use crate::builtins::array::ArrayRef;
use crate::builtins::element::{ArrayElement, ElemKind, HostRef, HostString};
use crate::context::DynContext;
use crate::error::{ArrayError, ArrayResult};
use crate::value::{DynValue, Value};

/// One callback argument
#[derive(Debug, Clone)]
pub enum Arg<T: ArrayElement> {
    /// Opaque closure context
    Context(usize),
    Elem(T),
    Index(f64),
    Array(ArrayRef<T>),
}

impl<T: ArrayElement> Arg<T> {
    pub fn as_elem(&self) -> Option<&T> {
        match self {
            Arg::Elem(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<f64> {
        match self {
            Arg::Index(i) => Some(*i),
            _ => None,
        }
    }
}

/// Callback result
#[derive(Debug, Clone)]
pub enum Ret {
    Void,
    F64(f64),
    F32(f32),
    I64(i64),
    I32(i32),
    Bool(bool),
    Any(DynValue),
    Str(HostString),
    Ref(HostRef),
}

impl Ret {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Ret::Void => "void",
            Ret::F64(_) => "f64",
            Ret::F32(_) => "f32",
            Ret::I64(_) => "i64",
            Ret::I32(_) => "i32",
            Ret::Bool(_) => "bool",
            Ret::Any(_) => "any",
            Ret::Str(_) => "str",
            Ret::Ref(_) => "ref",
        }
    }

    /// Predicate result of `every`, `some`, `filter`, `find` and `find_index`
    pub fn truthy(&self) -> ArrayResult<bool> {
        match self {
            Ret::Bool(b) => Ok(*b),
            Ret::I32(n) => Ok(*n != 0),
            Ret::Any(v) => Ok(!v.is_falsy()),
            other => Err(ArrayError::CallbackReturn {
                expected: "bool",
                found: other.kind_name(),
            }),
        }
    }

    /// Comparator result of `sort`
    pub fn number(&self) -> ArrayResult<f64> {
        match self {
            Ret::F64(n) => Ok(*n),
            Ret::F32(n) => Ok(*n as f64),
            Ret::I64(n) => Ok(*n as f64),
            Ret::I32(n) => Ok(*n as f64),
            Ret::Any(v) if v.is_number() => Ok(v.as_number().unwrap_or(f64::NAN)),
            other => Err(ArrayError::CallbackReturn {
                expected: "f64",
                found: other.kind_name(),
            }),
        }
    }

    /// Convert the result of a dynamic function to the declared kind
    fn from_dyn(ctx: &DynContext, v: DynValue, kind: ElemKind) -> ArrayResult<Ret> {
        Ok(match kind {
            ElemKind::F64 => Ret::F64(ctx.to_number(&v)?),
            ElemKind::F32 => Ret::F32(ctx.to_number(&v)? as f32),
            ElemKind::I64 => Ret::I64(ctx.to_number(&v)? as i64),
            ElemKind::I32 => Ret::I32(ctx.to_number(&v)? as i32),
            ElemKind::Bool => Ret::Bool(!v.is_falsy()),
            ElemKind::Any => Ret::Any(v),
            ElemKind::Str => Ret::Str(HostString::new(&ctx.to_string(&v))),
            ElemKind::Ref => Ret::Ref(HostRef(ctx.to_extref(&v)?.1)),
        })
    }
}

pub type CallbackFn<T> = dyn Fn(&DynContext, &[Arg<T>]) -> ArrayResult<Ret>;

/// A closure passed to a higher-order array method
pub struct Closure<T: ArrayElement> {
    pub context: usize,
    pub function: Rc<CallbackFn<T>>,
    /// Declared result kind
    pub returns: ElemKind,
}

impl<T: ArrayElement> Closure<T> {
    pub fn new<F>(context: usize, returns: ElemKind, function: F) -> Self
    where
        F: Fn(&DynContext, &[Arg<T>]) -> ArrayResult<Ret> + 'static,
    {
        Closure {
            context,
            function: Rc::new(function),
            returns,
        }
    }

    /// Wrap a dynamic function value
    ///
    /// Elements and indices are boxed and passed in order with `this` set to
    /// `undefined`; the closure context and the receiver array are not
    /// passed. The result is converted to `returns`.
    pub fn from_function(func: DynValue, returns: ElemKind) -> Self {
        let context = func.as_object().map_or(0, |o| o.addr());
        Closure::new(context, returns, move |ctx: &DynContext, args: &[Arg<T>]| {
            let mut boxed = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Arg::Elem(e) => boxed.push(e.to_dyn(ctx)?),
                    Arg::Index(i) => boxed.push(ctx.new_number(*i)),
                    Arg::Context(_) | Arg::Array(_) => {}
                }
            }
            let this = DynValue::new(Value::Undefined);
            let result = ctx.call_function(&func, &this, &boxed)?;
            Ret::from_dyn(ctx, result, returns)
        })
    }

    #[inline]
    pub(crate) fn call(&self, ctx: &DynContext, args: &[Arg<T>]) -> ArrayResult<Ret> {
        (self.function)(ctx, args)
    }

    /// Call with the `(context, element, index, array)` convention
    pub(crate) fn call_elem(
        &self,
        ctx: &DynContext,
        elem: T,
        index: usize,
        array: &ArrayRef<T>,
    ) -> ArrayResult<Ret> {
        self.call(
            ctx,
            &[
                Arg::Context(self.context),
                Arg::Elem(elem),
                Arg::Index(index as f64),
                Arg::Array(array.clone()),
            ],
        )
    }
}

impl<T: ArrayElement> Clone for Closure<T> {
    fn clone(&self) -> Self {
        Closure {
            context: self.context,
            function: self.function.clone(),
            returns: self.returns,
        }
    }
}

impl<T: ArrayElement> fmt::Debug for Closure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("context", &format_args!("{:#x}", self.context))
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DynResult;

    #[test]
    fn test_argument_order() {
        let ctx = DynContext::new();
        let arr = ArrayRef::from_vec(vec![10.0, 20.0]);
        let closure = Closure::new(0xC0, ElemKind::Bool, |_ctx: &DynContext, args: &[Arg<f64>]| {
            assert!(matches!(args[0], Arg::Context(0xC0)));
            assert_eq!(args[1].as_elem(), Some(&20.0));
            assert_eq!(args[2].as_index(), Some(1.0));
            assert!(matches!(&args[3], Arg::Array(a) if a.len() == 2));
            Ok(Ret::Bool(true))
        });
        let ret = closure.call_elem(&ctx, 20.0, 1, &arr).unwrap();
        assert!(ret.truthy().unwrap());
    }

    #[test]
    fn test_result_checks() {
        assert!(Ret::I32(1).truthy().unwrap());
        assert!(!Ret::I32(0).truthy().unwrap());
        assert!(matches!(
            Ret::F64(1.0).truthy(),
            Err(ArrayError::CallbackReturn { expected: "bool", found: "f64" })
        ));
        assert_eq!(Ret::I32(-2).number().unwrap(), -2.0);
        assert!(Ret::Void.number().is_err());
    }

    fn double(ctx: &DynContext, _this: &DynValue, args: &[DynValue]) -> DynResult<DynValue> {
        Ok(ctx.new_number(ctx.to_number(&args[0])? * 2.0))
    }

    #[test]
    fn test_wraps_dynamic_function() {
        let ctx = DynContext::new();
        let func = ctx.new_native_function("double", double);
        let closure: Closure<i32> = Closure::from_function(func, ElemKind::F64);
        let arr = ArrayRef::from_vec(vec![4]);
        let ret = closure.call_elem(&ctx, 4, 0, &arr).unwrap();
        assert!(matches!(ret, Ret::F64(n) if n == 8.0));
    }

    #[test]
    fn test_wrapped_non_function_fails() {
        let ctx = DynContext::new();
        let closure: Closure<f64> = Closure::from_function(ctx.new_object(), ElemKind::F64);
        let arr = ArrayRef::from_vec(vec![1.0]);
        assert!(matches!(
            closure.call_elem(&ctx, 1.0, 0, &arr),
            Err(ArrayError::Dyn(_))
        ));
    }
}
