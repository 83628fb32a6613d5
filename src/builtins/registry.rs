//! Array kind registry
//!
//! `map` produces a new array whose element kind is the closure's declared
//! result kind. The kinds a context can build are fixed by its
//! configuration; a `map` to any other kind fails with
//! `ArrayError::MissingArrayType`.

use rustc_hash::FxHashSet;

use crate::builtins::element::ElemKind;

#[derive(Debug, Clone, Default)]
pub struct ArrayTypeRegistry {
    kinds: FxHashSet<ElemKind>,
}

impl ArrayTypeRegistry {
    pub fn from_kinds(kinds: &[ElemKind]) -> Self {
        ArrayTypeRegistry {
            kinds: kinds.iter().copied().collect(),
        }
    }

    #[inline]
    pub fn has(&self, kind: ElemKind) -> bool {
        self.kinds.contains(&kind)
    }
}
