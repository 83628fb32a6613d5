//! Error types
//!
//! Every engine operation reports failure inline through a `Result`; nothing
//! unwinds across the engine boundary. `ResultCode` is the integer encoding
//! used when a status has to cross into compiled code.

use thiserror::Error;

use crate::builtins::ElemKind;

/// Status codes shared with compiled code
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success = 0,
    Exception = -1,
    TypeError = -2,
    /// Negative answer, distinct from a boolean `false` result
    False = -3,
}

impl ResultCode {
    /// Encode a tri-state answer: 1 for true, 0 for false, a negative code on failure
    pub fn tri_state(result: &DynResult<bool>) -> i32 {
        match result {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(e) => e.code() as i32,
        }
    }

    /// Status of a yes/no operation: `False` for a negative answer
    pub fn status(result: &DynResult<bool>) -> ResultCode {
        match result {
            Ok(true) => ResultCode::Success,
            Ok(false) => ResultCode::False,
            Err(e) => e.code(),
        }
    }

    /// Status of a unit-returning operation
    pub fn of<T>(result: &DynResult<T>) -> ResultCode {
        match result {
            Ok(_) => ResultCode::Success,
            Err(e) => e.code(),
        }
    }
}

/// Dynamic value engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DynError {
    /// Operation applied to a value of the wrong kind
    #[error("TypeError: {0}")]
    TypeError(String),

    /// The value store rejected the operation
    #[error("Exception: {0}")]
    Exception(String),
}

impl DynError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        DynError::TypeError(msg.into())
    }

    pub fn exception(msg: impl Into<String>) -> Self {
        DynError::Exception(msg.into())
    }

    /// Wire code for this error
    pub fn code(&self) -> ResultCode {
        match self {
            DynError::TypeError(_) => ResultCode::TypeError,
            DynError::Exception(_) => ResultCode::Exception,
        }
    }
}

pub type DynResult<T> = Result<T, DynError>;

/// Growable array engine errors
#[derive(Debug, Error)]
pub enum ArrayError {
    #[error("array is empty")]
    EmptyArray,

    /// Storage could not be allocated; the receiver is left untouched
    #[error("failed to allocate storage for {requested} elements")]
    AllocationFailed { requested: usize },

    /// `map` needs a growable array type for the callback's result kind
    #[error("no growable array type registered for {0:?} elements")]
    MissingArrayType(ElemKind),

    #[error("callback returned {found}, expected {expected}")]
    CallbackReturn {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Dyn(#[from] DynError),
}

pub type ArrayResult<T> = Result<T, ArrayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ResultCode::Success as i32, 0);
        assert_eq!(DynError::type_error("x").code() as i32, -2);
        assert_eq!(DynError::exception("x").code() as i32, -1);
        assert_eq!(ResultCode::False as i32, -3);
    }

    #[test]
    fn test_tri_state() {
        assert_eq!(ResultCode::tri_state(&Ok(true)), 1);
        assert_eq!(ResultCode::tri_state(&Ok(false)), 0);
        assert_eq!(ResultCode::tri_state(&Err(DynError::exception("boom"))), -1);
        assert_eq!(ResultCode::of(&Ok::<(), DynError>(())), ResultCode::Success);
    }

    #[test]
    fn test_status_reports_false() {
        assert_eq!(ResultCode::status(&Ok(true)), ResultCode::Success);
        assert_eq!(ResultCode::status(&Ok(false)), ResultCode::False);
        assert_eq!(
            ResultCode::status(&Err(DynError::type_error("x"))),
            ResultCode::TypeError
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DynError::type_error("not an object").to_string(), "TypeError: not an object");
        let e: ArrayError = DynError::exception("bad").into();
        assert_eq!(e.to_string(), "Exception: bad");
        assert_eq!(ArrayError::EmptyArray.to_string(), "array is empty");
    }
}
