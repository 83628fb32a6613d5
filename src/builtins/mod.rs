//! Growable arrays
//!
//! Typed, growable arrays over fixed-capacity host storage, together with
//! the callback protocol used by their higher-order methods and an
//! in-place quicksort.

pub mod array;
pub mod array_iter;
pub mod callback;
pub mod element;
pub mod host_array;
pub mod registry;
pub mod sort;

pub use array::{ArrayRef, GROWTH_SLACK, GrowableArray};
pub use callback::{Arg, CallbackFn, Closure, Ret};
pub use element::{ArrayElement, ElemKind, HostRef, HostString};
pub use host_array::HostArray;
pub use registry::ArrayTypeRegistry;
