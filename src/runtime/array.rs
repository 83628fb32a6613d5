//! Element storage of dynamic array objects
//!
//! Arrays are dense: every index below the length holds a value, and
//! growing the length pads with `undefined`. The virtual `length` and index
//! properties in `access` read and write through here.

use crate::error::{DynError, DynResult};
use crate::value::Value;

/// Maximum array length (2^30 - 1)
pub const MAX_ARRAY_LENGTH: u32 = (1 << 30) - 1;

#[derive(Debug, Default)]
pub struct ValueArray {
    elements: Vec<Value>,
}

impl ValueArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// `len` undefined elements
    pub fn with_length(len: u32) -> DynResult<Self> {
        let mut arr = Self::new();
        arr.set_length(len)?;
        Ok(arr)
    }

    pub fn from_values(mut values: Vec<Value>) -> Self {
        values.truncate(MAX_ARRAY_LENGTH as usize);
        ValueArray { elements: values }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.elements.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&Value> {
        self.elements.get(index as usize)
    }

    /// Store at `index`, padding any gap with `undefined`
    pub fn set(&mut self, index: u32, value: Value) -> DynResult<()> {
        if index >= MAX_ARRAY_LENGTH {
            return Err(DynError::exception("array index out of range"));
        }
        if index >= self.len() {
            self.set_length(index + 1)?;
        }
        self.elements[index as usize] = value;
        Ok(())
    }

    /// Truncate or pad with `undefined`
    ///
    /// Padding memory is reserved up front; a failed reservation leaves the
    /// array unchanged.
    pub fn set_length(&mut self, len: u32) -> DynResult<()> {
        if len > MAX_ARRAY_LENGTH {
            return Err(DynError::exception(format!("invalid array length {}", len)));
        }
        let len = len as usize;
        if len > self.elements.len() {
            let extra = len - self.elements.len();
            self.elements.try_reserve_exact(extra).map_err(|_| {
                DynError::exception(format!("cannot allocate array of length {}", len))
            })?;
        }
        self.elements.resize(len, Value::Undefined);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_length() {
        let arr = ValueArray::with_length(3).unwrap();
        assert_eq!(arr.len(), 3);
        assert!(arr.iter().all(Value::is_undefined));
        assert!(ValueArray::new().is_empty());
    }

    #[test]
    fn test_set_pads_gap() {
        let mut arr = ValueArray::new();
        arr.set(4, Value::Number(1.0)).unwrap();
        assert_eq!(arr.len(), 5);
        assert!(arr.get(2).unwrap().is_undefined());
        assert_eq!(arr.get(4).and_then(Value::as_number), Some(1.0));
        assert!(arr.get(5).is_none());
        assert!(matches!(
            arr.set(MAX_ARRAY_LENGTH, Value::Null),
            Err(DynError::Exception(_))
        ));
        assert_eq!(arr.len(), 5);
    }

    #[test]
    fn test_set_length() {
        let mut arr = ValueArray::from_values(vec![Value::Number(1.0), Value::Number(2.0)]);
        arr.set_length(1).unwrap();
        assert_eq!(arr.len(), 1);
        arr.set_length(3).unwrap();
        assert!(arr.get(2).unwrap().is_undefined());
        assert!(arr.set_length(MAX_ARRAY_LENGTH + 1).is_err());
        assert_eq!(arr.len(), 3);
    }
}
