//! Runtime support
//!
//! This module contains the object model behind dynamic values:
//! - Object representation (JSObject, properties)
//! - Dynamic array storage (ValueArray)
//! - Function values and the callback dispatcher
//! - Property access, prototypes and subtyping
//! - Comparison and external references

pub mod access;
pub mod array;
pub mod compare;
pub mod extref;
pub mod function;
pub mod object;
pub mod property;
pub mod proto;

pub use array::{ValueArray, MAX_ARRAY_LENGTH};
pub use compare::{CmpOperator, ExternalTable};
pub use extref::{EXTREF_REF, EXTREF_TAG, ExtRefTag};
pub use function::{CallbackDispatcher, FunctionKind, NativeFn};
pub use object::{ClassId, JSObject, ObjectClass, ObjectRef};
pub use property::{PropertyFlags, PropertySlot, PropertyTable};
