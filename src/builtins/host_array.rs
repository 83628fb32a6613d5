//! Fixed-capacity host arrays
//!
//! The storage behind every growable array. A host array never changes
//! length; growing means allocating a new one and copying. Index discipline
//! belongs to the caller.

use crate::error::{ArrayError, ArrayResult};
use crate::runtime::MAX_ARRAY_LENGTH;

/// Fixed-length array of elements
#[derive(Debug, Clone)]
pub struct HostArray<T> {
    data: Box<[T]>,
}

impl<T: Clone> HostArray<T> {
    /// Allocate `len` slots initialized to `init`
    pub fn new(len: usize, init: T) -> ArrayResult<Self> {
        if len > MAX_ARRAY_LENGTH as usize {
            return Err(ArrayError::AllocationFailed { requested: len });
        }
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ArrayError::AllocationFailed { requested: len })?;
        data.resize(len, init);
        Ok(HostArray {
            data: data.into_boxed_slice(),
        })
    }

    pub fn from_vec(values: Vec<T>) -> Self {
        HostArray {
            data: values.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> &T {
        &self.data[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    /// Replace a slot, returning its previous content
    #[inline]
    pub fn replace(&mut self, index: usize, value: T) -> T {
        std::mem::replace(&mut self.data[index], value)
    }

    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
    }

    /// Copy `count` elements of `src` starting at `src_off` into `dst` at `dst_off`
    pub fn copy(dst: &mut Self, dst_off: usize, src: &Self, src_off: usize, count: usize) {
        dst.data[dst_off..dst_off + count].clone_from_slice(&src.data[src_off..src_off + count]);
    }

    /// Copy a block inside this array; the ranges may overlap
    pub fn copy_within(&mut self, src_off: usize, dst_off: usize, count: usize) {
        if src_off == dst_off || count == 0 {
            return;
        }
        if dst_off < src_off {
            for i in 0..count {
                self.data[dst_off + i] = self.data[src_off + i].clone();
            }
        } else {
            for i in (0..count).rev() {
                self.data[dst_off + i] = self.data[src_off + i].clone();
            }
        }
    }

    /// Copy `values` into this array at `dst_off`
    pub fn write(&mut self, dst_off: usize, values: &[T]) {
        self.data[dst_off..dst_off + values.len()].clone_from_slice(values);
    }

    /// Fill `[start, end)` with `value`
    pub fn fill(&mut self, start: usize, end: usize, value: &T) {
        for slot in &mut self.data[start..end] {
            *slot = value.clone();
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_access() {
        let mut arr = HostArray::new(4, 0i32).unwrap();
        assert_eq!(arr.len(), 4);
        arr.set(2, 7);
        assert_eq!(*arr.get(2), 7);
        assert_eq!(arr.replace(2, 1), 7);
        assert_eq!(arr.as_slice(), &[0, 0, 1, 0]);
    }

    #[test]
    fn test_oversized_allocation() {
        let too_big = MAX_ARRAY_LENGTH as usize + 1;
        assert!(matches!(
            HostArray::new(too_big, 0u8),
            Err(ArrayError::AllocationFailed { requested }) if requested == too_big
        ));
    }

    #[test]
    fn test_copy_between_arrays() {
        let src = HostArray::from_vec(vec![1, 2, 3, 4]);
        let mut dst = HostArray::new(6, 0).unwrap();
        HostArray::copy(&mut dst, 1, &src, 2, 2);
        assert_eq!(dst.as_slice(), &[0, 3, 4, 0, 0, 0]);
    }

    #[test]
    fn test_overlapping_copy_within() {
        let mut arr = HostArray::from_vec(vec![1, 2, 3, 4, 5]);
        arr.copy_within(0, 2, 3);
        assert_eq!(arr.as_slice(), &[1, 2, 1, 2, 3]);

        let mut arr = HostArray::from_vec(vec![1, 2, 3, 4, 5]);
        arr.copy_within(2, 0, 3);
        assert_eq!(arr.as_slice(), &[3, 4, 5, 4, 5]);
    }

    #[test]
    fn test_write_and_fill() {
        let mut arr = HostArray::new(5, 0).unwrap();
        arr.write(1, &[8, 9]);
        arr.fill(3, 5, &6);
        assert_eq!(arr.as_slice(), &[0, 8, 9, 6, 6]);
    }
}
