//! Equality and ordering of dynamic values
//!
//! `cmp` compares two values of the same kind; the kind of the left operand
//! selects the rule. `cmp_boundary` is the layer compiled code calls: it
//! also handles operands of different kinds and compares external references
//! by the host object they resolve to.

use std::cmp::Ordering;

use tracing::warn;

use crate::context::DynContext;
use crate::value::{DynValue, TypeTag, Value};

/// Comparison operators, numbered as the compiler's token kinds
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOperator {
    LessThan = 29,
    GreaterThan = 31,
    LessThanEquals = 32,
    GreaterThanEquals = 33,
    EqualsEquals = 34,
    ExclamationEquals = 35,
    EqualsEqualsEquals = 36,
    ExclamationEqualsEquals = 37,
}

impl CmpOperator {
    /// Decode a token kind
    pub fn from_token(token: i32) -> Option<Self> {
        Some(match token {
            29 => CmpOperator::LessThan,
            31 => CmpOperator::GreaterThan,
            32 => CmpOperator::LessThanEquals,
            33 => CmpOperator::GreaterThanEquals,
            34 => CmpOperator::EqualsEquals,
            35 => CmpOperator::ExclamationEquals,
            36 => CmpOperator::EqualsEqualsEquals,
            37 => CmpOperator::ExclamationEqualsEquals,
            _ => return None,
        })
    }

    /// `==`, `===`, `<=` and `>=`: operators that hold for identical operands
    #[inline]
    pub fn has_equal_token(self) -> bool {
        matches!(
            self,
            CmpOperator::EqualsEquals
                | CmpOperator::EqualsEqualsEquals
                | CmpOperator::LessThanEquals
                | CmpOperator::GreaterThanEquals
        )
    }

    /// `!=` and `!==`
    #[inline]
    pub fn is_not_equal(self) -> bool {
        matches!(
            self,
            CmpOperator::ExclamationEquals | CmpOperator::ExclamationEqualsEquals
        )
    }

    /// `<`, `>`, `<=` and `>=`
    #[inline]
    pub fn is_ordering(self) -> bool {
        (self as i32) < CmpOperator::EqualsEquals as i32
    }

    /// Apply the operator to an ordering (`None` is unordered, e.g. NaN)
    fn test(self, ord: Option<Ordering>) -> bool {
        match self {
            CmpOperator::LessThan => ord == Some(Ordering::Less),
            CmpOperator::GreaterThan => ord == Some(Ordering::Greater),
            CmpOperator::LessThanEquals => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            CmpOperator::GreaterThanEquals => {
                matches!(ord, Some(Ordering::Greater | Ordering::Equal))
            }
            CmpOperator::EqualsEquals | CmpOperator::EqualsEqualsEquals => {
                ord == Some(Ordering::Equal)
            }
            CmpOperator::ExclamationEquals | CmpOperator::ExclamationEqualsEquals => {
                ord != Some(Ordering::Equal)
            }
        }
    }
}

/// Host table resolving external reference handles
pub trait ExternalTable {
    /// Identity of the host object behind `handle`; `None` for an empty slot
    fn resolve(&self, handle: usize) -> Option<usize>;
}

impl<F> ExternalTable for F
where
    F: Fn(usize) -> Option<usize>,
{
    fn resolve(&self, handle: usize) -> Option<usize> {
        self(handle)
    }
}

impl DynContext {
    /// Check if two values have the same `typeof_value` tag
    pub fn type_eq(&self, lhs: &DynValue, rhs: &DynValue) -> bool {
        self.typeof_value(lhs) == self.typeof_value(rhs)
    }

    /// Compare two values
    ///
    /// The left operand's kind selects the rule and the right operand is
    /// converted to it (`0`, `false` or its string form when it is of
    /// another kind):
    /// - booleans, numbers: native ordering
    /// - strings: byte-wise ordering
    /// - `null`: every operator in `has_equal_token` holds, whatever the
    ///   right operand is
    /// - `undefined`: only `==` and `===` hold
    /// - objects: identity only
    pub fn cmp(&self, lhs: &DynValue, rhs: &DynValue, op: CmpOperator) -> bool {
        if DynValue::ptr_eq(lhs, rhs) {
            return op.has_equal_token();
        }

        match self.typeof_value(lhs) {
            TypeTag::Boolean => {
                let l = lhs.as_bool().unwrap_or(false);
                let r = rhs.as_bool().unwrap_or(false);
                op.test(Some(l.cmp(&r)))
            }
            TypeTag::Number => {
                let l = lhs.as_number().unwrap_or(0.0);
                let r = rhs.as_number().unwrap_or(0.0);
                op.test(l.partial_cmp(&r))
            }
            TypeTag::String => {
                let l = lhs.as_str().unwrap_or_default();
                let r = match rhs.value() {
                    Value::String(s) => s.to_string(),
                    other => other.to_string(),
                };
                op.test(Some(l.as_bytes().cmp(r.as_bytes())))
            }
            TypeTag::Null => op.has_equal_token(),
            TypeTag::Undefined => {
                matches!(op, CmpOperator::EqualsEquals | CmpOperator::EqualsEqualsEquals)
            }
            TypeTag::Object => {
                if op.is_ordering() {
                    warn!(?op, "ordering comparison between two objects");
                }
                let same = match (lhs.as_object(), rhs.as_object()) {
                    (Some(l), Some(r)) => l.ptr_eq(r),
                    _ => false,
                };
                if op.is_not_equal() { !same } else { same }
            }
            _ => false,
        }
    }

    /// Compare two values as compiled code sees them
    ///
    /// Operands of the same kind go through `cmp`. When that answer is
    /// false the operands are reconsidered: `undefined` against another
    /// kind is only unequal; a plain value against another kind is unequal;
    /// null and external references compare by the host object `table`
    /// resolves them to.
    pub fn cmp_boundary(
        &self,
        lhs: &DynValue,
        rhs: &DynValue,
        op: CmpOperator,
        table: &dyn ExternalTable,
    ) -> bool {
        let type_l = self.typeof_value(lhs);
        let type_r = self.typeof_value(rhs);

        if type_l == type_r && self.cmp(lhs, rhs, op) {
            return true;
        }

        if type_l != type_r && (type_l == TypeTag::Undefined || type_r == TypeTag::Undefined) {
            return op.is_not_equal();
        }

        let l_plain = !lhs.is_null() && !type_l.is_external();
        let r_plain = !rhs.is_null() && !type_r.is_external();
        if l_plain || r_plain {
            return type_l != type_r && op.is_not_equal();
        }

        let resolve = |v: &DynValue| -> Option<usize> {
            if v.is_null() {
                return None;
            }
            self.to_extref(v).ok().and_then(|(_, handle)| table.resolve(handle))
        };
        let same = resolve(lhs) == resolve(rhs);
        if op.is_not_equal() { !same } else { same }
    }
}
