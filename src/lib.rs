//! dyntype - a dynamic value engine with typed growable arrays
//!
//! Host code manipulates JavaScript-style dynamic values through a
//! `DynContext`: primitives, objects with prototype chains, arrays,
//! external references to host-owned data and functions. Alongside it,
//! `builtins` provides typed growable arrays with the usual `push`/`splice`/
//! `map`/`sort` family, calling user closures through a fixed argument
//! protocol.
//!
//! # Features
//! - Reference-counted dynamic values with explicit hold/release
//! - Prototype chains and property descriptors
//! - External references tagged by kind
//! - Typed comparison across dynamic and external values
//! - Growable arrays with geometric slack over fixed host storage
//!
//! # Example
//! ```
//! use dyntype::DynContext;
//!
//! let ctx = DynContext::new();
//! let obj = ctx.new_object();
//! ctx.set_property(&obj, "answer", &ctx.new_number(42.0)).unwrap();
//! let got = ctx.get_property(&obj, "answer").unwrap().unwrap();
//! assert_eq!(ctx.to_number(&got).unwrap(), 42.0);
//! ```

// Core modules
pub mod value;
pub mod context;
pub mod error;

// Growable arrays and callbacks
pub mod builtins;

// Objects, properties and comparisons
pub mod runtime;

// Utilities
pub mod util;

// Re-export main types
pub use builtins::{ArrayRef, Closure, ElemKind};
pub use context::{DynContext, EngineConfig};
pub use error::{ArrayError, ArrayResult, DynError, DynResult, ResultCode};
pub use runtime::{CmpOperator, ExtRefTag};
pub use value::{DynValue, TypeTag, Value};
