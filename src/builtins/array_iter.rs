//! Higher-order array methods
//!
//! Traversals visit indices up to the length the array had on entry. The
//! record is borrowed again for every element and released before the
//! callback runs: callbacks may push, pop or splice the receiver. A
//! traversal stops early once the array has shrunk below the next index.

use crate::builtins::array::ArrayRef;
use crate::builtins::callback::{Arg, Closure};
use crate::builtins::element::ArrayElement;
use crate::context::DynContext;
use crate::error::{ArrayError, ArrayResult};
use crate::value::DynValue;

impl<T: ArrayElement> ArrayRef<T> {
    /// Visit live elements in order until `visit` returns false
    fn traverse<F>(&self, mut visit: F) -> ArrayResult<()>
    where
        F: FnMut(usize, T) -> ArrayResult<bool>,
    {
        let len = self.len();
        for i in 0..len {
            let Some(elem) = self.get(i) else {
                break;
            };
            if !visit(i, elem)? {
                break;
            }
        }
        Ok(())
    }

    /// Check if the callback is truthy for every element
    ///
    /// An empty array answers `true` without invoking the callback.
    pub fn every(&self, ctx: &DynContext, closure: &Closure<T>) -> ArrayResult<bool> {
        let mut all = true;
        self.traverse(|i, elem| {
            all = closure.call_elem(ctx, elem, i, self)?.truthy()?;
            Ok(all)
        })?;
        Ok(all)
    }

    /// Check if the callback is truthy for some element
    pub fn some(&self, ctx: &DynContext, closure: &Closure<T>) -> ArrayResult<bool> {
        let mut any = false;
        self.traverse(|i, elem| {
            any = closure.call_elem(ctx, elem, i, self)?.truthy()?;
            Ok(!any)
        })?;
        Ok(any)
    }

    pub fn for_each(&self, ctx: &DynContext, closure: &Closure<T>) -> ArrayResult<()> {
        self.traverse(|i, elem| {
            closure.call_elem(ctx, elem, i, self)?;
            Ok(true)
        })
    }

    /// New array of the callback results
    ///
    /// The closure's declared result kind must have a registered growable
    /// array type and match `U`.
    pub fn map<U: ArrayElement>(
        &self,
        ctx: &DynContext,
        closure: &Closure<T>,
    ) -> ArrayResult<ArrayRef<U>> {
        if !ctx.array_types().has(closure.returns) {
            return Err(ArrayError::MissingArrayType(closure.returns));
        }
        if closure.returns != U::KIND {
            return Err(ArrayError::CallbackReturn {
                expected: U::KIND.name(),
                found: closure.returns.name(),
            });
        }

        let mut out = Vec::new();
        let len = self.len();
        out.try_reserve_exact(len)
            .map_err(|_| ArrayError::AllocationFailed { requested: len })?;
        self.traverse(|i, elem| {
            let ret = closure.call_elem(ctx, elem, i, self)?;
            let found = ret.kind_name();
            let value = U::from_ret(ret).ok_or(ArrayError::CallbackReturn {
                expected: U::KIND.name(),
                found,
            })?;
            out.push(value);
            Ok(true)
        })?;
        Ok(ArrayRef::from_vec(out))
    }

    /// New array of the elements the callback is truthy for
    pub fn filter(&self, ctx: &DynContext, closure: &Closure<T>) -> ArrayResult<ArrayRef<T>> {
        let mut kept = Vec::new();
        self.traverse(|i, elem| {
            if closure.call_elem(ctx, elem.clone(), i, self)?.truthy()? {
                kept.push(elem);
            }
            Ok(true)
        })?;
        Ok(ArrayRef::from_vec(kept))
    }

    /// Left-to-right fold starting from `initial`
    pub fn reduce(&self, ctx: &DynContext, closure: &Closure<T>, initial: T) -> ArrayResult<T> {
        let len = self.len();
        self.fold(ctx, closure, initial, 0..len)
    }

    /// Right-to-left fold starting from `initial`
    pub fn reduce_right(
        &self,
        ctx: &DynContext,
        closure: &Closure<T>,
        initial: T,
    ) -> ArrayResult<T> {
        let len = self.len();
        self.fold(ctx, closure, initial, (0..len).rev())
    }

    fn fold<I>(&self, ctx: &DynContext, closure: &Closure<T>, initial: T, order: I) -> ArrayResult<T>
    where
        I: Iterator<Item = usize>,
    {
        let mut acc = initial;
        for i in order {
            let Some(elem) = self.get(i) else {
                continue;
            };
            let ret = closure.call(
                ctx,
                &[
                    Arg::Context(closure.context),
                    Arg::Elem(acc),
                    Arg::Elem(elem),
                    Arg::Index(i as f64),
                    Arg::Array(self.clone()),
                ],
            )?;
            let found = ret.kind_name();
            acc = T::from_ret(ret).ok_or(ArrayError::CallbackReturn {
                expected: T::KIND.name(),
                found,
            })?;
        }
        Ok(acc)
    }

    /// First element the callback is truthy for, boxed; `undefined` when none
    pub fn find(&self, ctx: &DynContext, closure: &Closure<T>) -> ArrayResult<DynValue> {
        let mut found = None;
        self.traverse(|i, elem| {
            if closure.call_elem(ctx, elem.clone(), i, self)?.truthy()? {
                found = Some(elem);
                return Ok(false);
            }
            Ok(true)
        })?;
        match found {
            Some(elem) => Ok(elem.to_dyn(ctx)?),
            None => Ok(ctx.new_undefined()),
        }
    }

    /// Index of the first element the callback is truthy for
    pub fn find_index(&self, ctx: &DynContext, closure: &Closure<T>) -> ArrayResult<Option<usize>> {
        let mut found = None;
        self.traverse(|i, elem| {
            if closure.call_elem(ctx, elem, i, self)?.truthy()? {
                found = Some(i);
                return Ok(false);
            }
            Ok(true)
        })?;
        Ok(found)
    }
}
