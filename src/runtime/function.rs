//! Function values
//!
//! Two kinds of callable objects exist:
//! - native functions: a Rust function pointer called directly
//! - external functions: an opaque host function invoked through the
//!   context's callback dispatcher

use std::rc::Rc;

use tracing::{debug, warn};

use crate::context::DynContext;
use crate::error::{DynError, DynResult};
use crate::runtime::object::{JSObject, ObjectRef};
use crate::value::{DynValue, Value};

/// Native function signature
///
/// Native functions take the context, the `this` value and the arguments.
pub type NativeFn = fn(ctx: &DynContext, this: &DynValue, args: &[DynValue]) -> DynResult<DynValue>;

/// Callable payload of a function object
#[derive(Debug, Clone)]
pub enum FunctionKind {
    Native { name: Rc<str>, func: NativeFn },
    /// Host function pointer plus its execution environment
    External { vfunc: usize, env: usize },
}

/// Host hook used to invoke external functions
///
/// The engine cannot call a host function pointer itself; every invocation
/// of an external function is routed through the registered dispatcher.
pub trait CallbackDispatcher {
    fn dispatch(
        &self,
        ctx: &DynContext,
        env: usize,
        vfunc: usize,
        this: &DynValue,
        args: &[DynValue],
    ) -> DynResult<DynValue>;
}

impl<F> CallbackDispatcher for F
where
    F: Fn(&DynContext, usize, usize, &DynValue, &[DynValue]) -> DynResult<DynValue>,
{
    fn dispatch(
        &self,
        ctx: &DynContext,
        env: usize,
        vfunc: usize,
        this: &DynValue,
        args: &[DynValue],
    ) -> DynResult<DynValue> {
        self(ctx, env, vfunc, this, args)
    }
}

impl DynContext {
    /// Register the dispatcher for external functions, replacing any previous one
    pub fn set_callback_dispatcher<D: CallbackDispatcher + 'static>(&self, dispatcher: D) {
        debug!("callback dispatcher registered");
        *self.dispatcher.borrow_mut() = Some(Rc::new(dispatcher));
    }

    /// Create a native function object
    pub fn new_native_function(&self, name: &str, func: NativeFn) -> DynValue {
        let kind = FunctionKind::Native {
            name: Rc::from(name),
            func,
        };
        DynValue::new(Value::Object(ObjectRef::new(JSObject::new_function(kind, None))))
    }

    /// Invoke a function value
    pub fn call_function(
        &self,
        func: &DynValue,
        this: &DynValue,
        args: &[DynValue],
    ) -> DynResult<DynValue> {
        self.call_value(func.value(), this, args)
    }

    pub(crate) fn call_value(
        &self,
        func: &Value,
        this: &DynValue,
        args: &[DynValue],
    ) -> DynResult<DynValue> {
        // Release the borrow before the call: the callee may touch the function object
        let kind = func
            .as_object()
            .and_then(|obj| obj.borrow().as_function().cloned())
            .ok_or_else(|| DynError::type_error("value is not a function"))?;

        match kind {
            FunctionKind::Native { func, .. } => func(self, this, args),
            FunctionKind::External { vfunc, env } => {
                let dispatcher = self.dispatcher.borrow().clone();
                match dispatcher {
                    Some(dispatcher) => dispatcher.dispatch(self, env, vfunc, this, args),
                    None => {
                        warn!(vfunc = vfunc, "external function invoked without a callback dispatcher");
                        let msg = "no callback dispatcher registered";
                        self.throw_exception(self.new_string(msg));
                        Err(DynError::exception(msg))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeTag;

    fn add(ctx: &DynContext, _this: &DynValue, args: &[DynValue]) -> DynResult<DynValue> {
        let mut sum = 0.0;
        for arg in args {
            sum += ctx.to_number(arg)?;
        }
        Ok(ctx.new_number(sum))
    }

    fn this_of(_ctx: &DynContext, this: &DynValue, _args: &[DynValue]) -> DynResult<DynValue> {
        Ok(this.clone())
    }

    #[test]
    fn test_native_call() {
        let ctx = DynContext::new();
        let f = ctx.new_native_function("add", add);
        assert!(ctx.is_function(&f));
        let args = [ctx.new_number(1.0), ctx.new_number(2.5)];
        let r = ctx.call_function(&f, &ctx.new_undefined(), &args).unwrap();
        assert_eq!(ctx.to_number(&r).unwrap(), 3.5);
    }

    #[test]
    fn test_call_passes_this() {
        let ctx = DynContext::new();
        let f = ctx.new_native_function("thisOf", this_of);
        let obj = ctx.new_object();
        let r = ctx.call_function(&f, &obj, &[]).unwrap();
        assert!(DynValue::ptr_eq(&r, &obj));
    }

    #[test]
    fn test_call_non_function() {
        let ctx = DynContext::new();
        let err = ctx
            .call_function(&ctx.new_number(1.0), &ctx.new_undefined(), &[])
            .unwrap_err();
        assert!(matches!(err, DynError::TypeError(_)));
    }

    #[test]
    fn test_external_without_dispatcher() {
        let ctx = DynContext::new();
        let f = ctx
            .new_external_reference(0x40, TypeTag::ExternalFunction, 7)
            .unwrap();
        let err = ctx.call_function(&f, &ctx.new_undefined(), &[]).unwrap_err();
        assert!(matches!(err, DynError::Exception(_)));
        assert!(ctx.has_exception());
        let exc = ctx.take_exception().unwrap();
        assert_eq!(exc.as_str(), Some("no callback dispatcher registered"));
        assert!(!ctx.has_exception());
    }

    #[test]
    fn test_external_through_dispatcher() {
        let ctx = DynContext::new();
        ctx.set_callback_dispatcher(
            |ctx: &DynContext, env: usize, vfunc: usize, _this: &DynValue, args: &[DynValue]|
             -> DynResult<DynValue> {
                Ok(ctx.new_number((env + vfunc + args.len()) as f64))
            },
        );
        let f = ctx
            .new_external_reference(0x40, TypeTag::ExternalFunction, 2)
            .unwrap();
        let r = ctx
            .call_function(&f, &ctx.new_null(), &[ctx.new_boolean(true)])
            .unwrap();
        assert_eq!(ctx.to_number(&r).unwrap(), (0x40 + 2 + 1) as f64);
    }
}
