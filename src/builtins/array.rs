//! Growable arrays
//!
//! A growable array is a `{storage, length}` record over a fixed-capacity
//! `HostArray`. Slots at or past `length` are dead. When a mutation needs
//! more room than the storage has, a new storage of `new_length +
//! GROWTH_SLACK` slots (capped at `MAX_ARRAY_LENGTH`) is allocated, the
//! live elements are copied and only then is the new storage swapped in;
//! a failed allocation leaves the record untouched.
//!
//! Index arguments follow the source language's `Array` rules: they are
//! truncated toward zero, negative values count from the end and results
//! are clamped to `[0, length]`.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::builtins::element::{ArrayElement, HostString};
use crate::builtins::host_array::HostArray;
use crate::error::{ArrayError, ArrayResult};
use crate::runtime::MAX_ARRAY_LENGTH;
use crate::util::to_integer;

/// Extra slots allocated whenever storage grows
pub const GROWTH_SLACK: usize = 16;

/// Storage size allocated when `new_len` live elements no longer fit
fn grown_capacity(new_len: usize) -> usize {
    (new_len + GROWTH_SLACK).min(MAX_ARRAY_LENGTH as usize)
}

/// Resolve a relative index against `len`
fn relative_index(idx: f64, len: usize) -> usize {
    let idx = to_integer(idx);
    if idx < 0.0 {
        (len as f64 + idx).max(0.0) as usize
    } else {
        idx.min(len as f64) as usize
    }
}

/// Resolve an index for `copy_within`; `None` when it lies past the end
fn bounded_index(idx: f64, len: usize) -> Option<usize> {
    let idx = to_integer(idx);
    let len_f = len as f64;
    if idx < 0.0 {
        Some((len_f + idx).max(0.0) as usize)
    } else if idx >= len_f {
        None
    } else {
        Some(idx as usize)
    }
}

/// Storage record of a growable array
#[derive(Debug)]
pub struct GrowableArray<T> {
    storage: HostArray<T>,
    length: usize,
}

impl<T: ArrayElement> GrowableArray<T> {
    pub fn new() -> Self {
        GrowableArray {
            storage: HostArray::from_vec(Vec::new()),
            length: 0,
        }
    }

    pub fn from_vec(values: Vec<T>) -> Self {
        let length = values.len();
        GrowableArray {
            storage: HostArray::from_vec(values),
            length,
        }
    }

    /// Array of `len` copies of `init`
    pub fn with_length(len: usize, init: T) -> ArrayResult<Self> {
        Ok(GrowableArray {
            storage: HostArray::new(len, init)?,
            length: len,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Live element at `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.length {
            Some(self.storage.get(index))
        } else {
            None
        }
    }

    /// Live elements
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.storage.as_slice()[..self.length]
    }

    /// Make room for `new_len` live elements
    fn reserve(&mut self, new_len: usize) -> ArrayResult<()> {
        if new_len <= self.capacity() {
            return Ok(());
        }
        if new_len > MAX_ARRAY_LENGTH as usize {
            return Err(ArrayError::AllocationFailed { requested: new_len });
        }
        let capacity = grown_capacity(new_len);
        let mut storage = HostArray::new(capacity, T::filler())?;
        HostArray::copy(&mut storage, 0, &self.storage, 0, self.length);
        trace!(
            kind = T::KIND.name(),
            old_capacity = self.capacity(),
            new_capacity = capacity,
            "growable array storage reallocated"
        );
        self.storage = storage;
        Ok(())
    }

    /// Drop the references held by dead slots in `[from, to)`
    fn clear_dead(&mut self, from: usize, to: usize) {
        if from < to {
            self.storage.fill(from, to, &T::filler());
        }
    }

    fn set_length(&mut self, new_len: usize) {
        let old = self.length;
        self.length = new_len;
        self.clear_dead(new_len, old);
    }
}

impl<T: ArrayElement> Default for GrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a growable array
///
/// This is what compiled code and callbacks hold. Methods borrow the record
/// for the duration of one step only, so a callback may mutate the array
/// it is called from.
pub struct ArrayRef<T>(Rc<RefCell<GrowableArray<T>>>);

impl<T> Clone for ArrayRef<T> {
    fn clone(&self) -> Self {
        ArrayRef(self.0.clone())
    }
}

impl<T: ArrayElement> fmt::Debug for ArrayRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(arr) => f.debug_list().entries(arr.as_slice()).finish(),
            Err(_) => f.write_str("[<borrowed>]"),
        }
    }
}

impl<T: ArrayElement> Default for ArrayRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ArrayElement> From<Vec<T>> for ArrayRef<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

impl<T: ArrayElement> ArrayRef<T> {
    pub fn new() -> Self {
        Self::wrap(GrowableArray::new())
    }

    pub fn from_vec(values: Vec<T>) -> Self {
        Self::wrap(GrowableArray::from_vec(values))
    }

    pub fn with_length(len: usize, init: T) -> ArrayResult<Self> {
        Ok(Self::wrap(GrowableArray::with_length(len, init)?))
    }

    fn wrap(arr: GrowableArray<T>) -> Self {
        ArrayRef(Rc::new(RefCell::new(arr)))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, GrowableArray<T>> {
        self.0.borrow()
    }

    #[inline]
    fn borrow_mut(&self) -> RefMut<'_, GrowableArray<T>> {
        self.0.borrow_mut()
    }

    /// Check if two handles refer to the same array
    #[inline]
    pub fn ptr_eq(&self, other: &ArrayRef<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.borrow().is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.borrow().capacity()
    }

    /// Copy of the live element at `index`
    pub fn get(&self, index: usize) -> Option<T> {
        self.borrow().get(index).cloned()
    }

    /// Overwrite a live element; returns false past the end
    pub fn set(&self, index: usize, value: T) -> bool {
        let mut arr = self.borrow_mut();
        if index < arr.length {
            arr.storage.set(index, value);
            true
        } else {
            false
        }
    }

    /// Exchange two live elements
    pub(crate) fn swap(&self, a: usize, b: usize) {
        let mut arr = self.borrow_mut();
        if a < arr.length && b < arr.length {
            arr.storage.swap(a, b);
        }
    }

    /// Copy of the live elements
    pub fn to_vec(&self) -> Vec<T> {
        self.borrow().as_slice().to_vec()
    }

    /// Append all elements of `items`, returning the new length
    pub fn push(&self, items: &ArrayRef<T>) -> ArrayResult<usize> {
        let items = items.to_vec();
        let mut arr = self.borrow_mut();
        let len = arr.length;
        let new_len = len + items.len();
        arr.reserve(new_len)?;
        arr.storage.write(len, &items);
        arr.length = new_len;
        Ok(new_len)
    }

    /// Remove the last element
    pub fn pop(&self) -> ArrayResult<T> {
        let mut arr = self.borrow_mut();
        if arr.length == 0 {
            return Err(ArrayError::EmptyArray);
        }
        let last = arr.length - 1;
        let value = arr.storage.replace(last, T::filler());
        arr.length = last;
        Ok(value)
    }

    /// Remove the first element
    ///
    /// The storage is replaced by one exactly as long as the remaining
    /// elements.
    pub fn shift(&self) -> ArrayResult<T> {
        let mut arr = self.borrow_mut();
        if arr.length == 0 {
            return Err(ArrayError::EmptyArray);
        }
        let rest = arr.length - 1;
        let mut storage = HostArray::new(rest, T::filler())?;
        HostArray::copy(&mut storage, 0, &arr.storage, 1, rest);
        let first = arr.storage.get(0).clone();
        arr.storage = storage;
        arr.length = rest;
        Ok(first)
    }

    /// Prepend all elements of `items`, returning the new length
    pub fn unshift(&self, items: &ArrayRef<T>) -> ArrayResult<usize> {
        let items = items.to_vec();
        let mut arr = self.borrow_mut();
        let len = arr.length;
        let new_len = len + items.len();
        arr.reserve(new_len)?;
        arr.storage.copy_within(0, items.len(), len);
        arr.storage.write(0, &items);
        arr.length = new_len;
        Ok(new_len)
    }

    /// Remove `delete_count` elements at `start` and insert `items` in their place
    ///
    /// Returns the removed elements. An absent `delete_count` removes nothing.
    pub fn splice(
        &self,
        start: f64,
        delete_count: Option<f64>,
        items: Option<&ArrayRef<T>>,
    ) -> ArrayResult<ArrayRef<T>> {
        let items = items.map(ArrayRef::to_vec).unwrap_or_default();
        let mut arr = self.borrow_mut();
        let len = arr.length;
        let start = relative_index(start, len);
        let delete_count = match delete_count {
            Some(n) => (to_integer(n).max(0.0) as usize).min(len - start),
            None => 0,
        };
        let removed = arr.as_slice()[start..start + delete_count].to_vec();

        let new_len = len - delete_count + items.len();
        arr.reserve(new_len)?;
        let tail = len - start - delete_count;
        arr.storage
            .copy_within(start + delete_count, start + items.len(), tail);
        arr.storage.write(start, &items);
        arr.set_length(new_len);

        Ok(ArrayRef::from_vec(removed))
    }

    /// Shallow copy of `[start, end)`; an absent `end` is the length
    pub fn slice(&self, start: f64, end: Option<f64>) -> ArrayRef<T> {
        let arr = self.borrow();
        let len = arr.length;
        let start = relative_index(start, len);
        let end = end.map_or(len, |e| relative_index(e, len));
        if end <= start {
            return ArrayRef::new();
        }
        ArrayRef::from_vec(arr.as_slice()[start..end].to_vec())
    }

    /// New array of this array's elements followed by those of `other`
    pub fn concat(&self, other: &ArrayRef<T>) -> ArrayResult<ArrayRef<T>> {
        let mut values = Vec::new();
        let total = self.len() + other.len();
        values
            .try_reserve_exact(total)
            .map_err(|_| ArrayError::AllocationFailed { requested: total })?;
        values.extend_from_slice(self.borrow().as_slice());
        values.extend_from_slice(other.borrow().as_slice());
        Ok(ArrayRef::from_vec(values))
    }

    /// Reverse in place
    pub fn reverse(&self) {
        let mut arr = self.borrow_mut();
        let len = arr.length;
        for i in 0..len / 2 {
            arr.storage.swap(i, len - 1 - i);
        }
    }

    /// Overwrite `[start, end)` with `value`; an absent `end` is the length
    pub fn fill(&self, value: T, start: f64, end: Option<f64>) {
        let mut arr = self.borrow_mut();
        let len = arr.length;
        let start = relative_index(start, len);
        let end = end.map_or(len, |e| relative_index(e, len));
        if start < end {
            arr.storage.fill(start, end, &value);
        }
    }

    /// Copy `[start, end)` to `target` in place
    ///
    /// A `target` or `start` past the end leaves the array unchanged, as
    /// does an empty source range.
    pub fn copy_within(&self, target: f64, start: f64, end: Option<f64>) {
        let mut arr = self.borrow_mut();
        let len = arr.length;
        let Some(target) = bounded_index(target, len) else {
            return;
        };
        let Some(start) = bounded_index(start, len) else {
            return;
        };
        let end = end.and_then(|e| bounded_index(e, len)).unwrap_or(len);
        if end <= start {
            return;
        }
        let count = (end - start).min(len - start).min(len - target);
        arr.storage.copy_within(start, target, count);
    }

    /// First index of `search` at or after `from`
    pub fn index_of(&self, search: &T, from: Option<f64>) -> Option<usize> {
        let arr = self.borrow();
        let len = arr.length;
        let from = to_integer(from.unwrap_or(0.0));
        if from >= len as f64 {
            return None;
        }
        let start = relative_index(from, len);
        arr.as_slice()[start..]
            .iter()
            .position(|e| e.same(search))
            .map(|i| i + start)
    }

    /// Last index of `search` at or before `from`; an absent `from` searches
    /// the whole array
    pub fn last_index_of(&self, search: &T, from: Option<f64>) -> Option<usize> {
        let arr = self.borrow();
        let len = arr.length;
        if len == 0 {
            return None;
        }
        let last = match from.map(to_integer) {
            None => len - 1,
            Some(f) if f < -(len as f64) => return None,
            Some(f) if f < 0.0 => (len as f64 + f) as usize,
            Some(f) => (f as usize).min(len - 1),
        };
        arr.as_slice()[..=last].iter().rposition(|e| e.same(search))
    }

    /// Check if `search` occurs at or after `from`; a negative `from` is 0
    pub fn includes(&self, search: &T, from: Option<f64>) -> bool {
        let arr = self.borrow();
        let from = to_integer(from.unwrap_or(0.0)).max(0.0);
        if from >= arr.length as f64 {
            return false;
        }
        arr.as_slice()[from as usize..].iter().any(|e| e.same(search))
    }
}

impl ArrayRef<HostString> {
    /// Concatenate the strings with `separator` (`","` when absent)
    pub fn join(&self, separator: Option<&str>) -> HostString {
        let sep = separator.unwrap_or(",").as_bytes();
        let arr = self.borrow();
        let parts = arr.as_slice();
        let total = parts.iter().map(HostString::len).sum::<usize>()
            + sep.len() * parts.len().saturating_sub(1);
        let mut out = Vec::with_capacity(total);
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(sep);
            }
            out.extend_from_slice(part.as_bytes());
        }
        HostString::from_bytes(&out)
    }
}
