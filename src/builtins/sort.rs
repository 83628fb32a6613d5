//! In-place quicksort driven by a comparator closure
//!
//! Hoare partitioning around the value of the middle element. The
//! comparator is called as `(context, pivot, element)` and must return a
//! number: positive when the element sorts before the pivot, negative when
//! it sorts after. The sort is not stable.

use crate::builtins::array::ArrayRef;
use crate::builtins::callback::{Arg, Closure};
use crate::builtins::element::ArrayElement;
use crate::context::DynContext;
use crate::error::ArrayResult;

impl<T: ArrayElement> ArrayRef<T> {
    /// Sort in place
    pub fn sort(&self, ctx: &DynContext, comparator: &Closure<T>) -> ArrayResult<()> {
        let len = self.len();
        if len > 1 {
            quick_sort(ctx, self, 0, len - 1, comparator)?;
        }
        Ok(())
    }
}

fn compare<T: ArrayElement>(
    ctx: &DynContext,
    comparator: &Closure<T>,
    pivot: &T,
    elem: T,
) -> ArrayResult<f64> {
    comparator
        .call(
            ctx,
            &[
                Arg::Context(comparator.context),
                Arg::Elem(pivot.clone()),
                Arg::Elem(elem),
            ],
        )?
        .number()
}

fn quick_sort<T: ArrayElement>(
    ctx: &DynContext,
    arr: &ArrayRef<T>,
    l: usize,
    r: usize,
    comparator: &Closure<T>,
) -> ArrayResult<()> {
    if l >= r {
        return Ok(());
    }
    let Some(pivot) = arr.get(l + (r - l) / 2) else {
        return Ok(());
    };

    // Scan positions are kept in [l, r] so an inconsistent comparator
    // cannot run them out of range
    let mut i = l as isize - 1;
    let mut j = r as isize + 1;
    loop {
        loop {
            i += 1;
            if i >= r as isize {
                break;
            }
            let Some(elem) = arr.get(i as usize) else {
                return Ok(());
            };
            if compare(ctx, comparator, &pivot, elem)? <= 0.0 {
                break;
            }
        }
        loop {
            j -= 1;
            if j <= l as isize {
                break;
            }
            let Some(elem) = arr.get(j as usize) else {
                return Ok(());
            };
            if compare(ctx, comparator, &pivot, elem)? >= 0.0 {
                break;
            }
        }
        if i >= j {
            break;
        }
        arr.swap(i as usize, j as usize);
    }

    let split = (j as usize).min(r - 1);
    quick_sort(ctx, arr, l, split, comparator)?;
    quick_sort(ctx, arr, split + 1, r, comparator)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::builtins::callback::Ret;
    use crate::builtins::element::{ElemKind, HostString};
    use crate::error::ArrayError;

    fn ascending() -> Closure<f64> {
        Closure::new(0, ElemKind::F64, |_ctx: &DynContext, args: &[Arg<f64>]| {
            let pivot = args[1].as_elem().copied().unwrap_or_default();
            let elem = args[2].as_elem().copied().unwrap_or_default();
            Ok(Ret::F64(pivot - elem))
        })
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let ctx = DynContext::new();
        let arr = ArrayRef::from_vec(values.to_vec());
        arr.sort(&ctx, &ascending()).unwrap();
        arr.to_vec()
    }

    #[test]
    fn test_sort_scenario() {
        assert_eq!(sorted(&[5.0, 3.0, 8.0, 1.0]), vec![1.0, 3.0, 5.0, 8.0]);
    }

    #[test]
    fn test_sort_edge_sizes() {
        assert_eq!(sorted(&[]), Vec::<f64>::new());
        assert_eq!(sorted(&[4.0]), vec![4.0]);
        assert_eq!(sorted(&[2.0, 1.0]), vec![1.0, 2.0]);
        assert_eq!(sorted(&[1.0, 1.0, 1.0]), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sort_is_permutation() {
        let mut input = Vec::new();
        let mut x = 7u32;
        for _ in 0..200 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            input.push(((x >> 16) % 50) as f64);
        }
        let out = sorted(&input);
        let mut expected = input.clone();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_sort_reverse_sorted_and_sorted() {
        let desc: Vec<f64> = (0..64).rev().map(f64::from).collect();
        let asc: Vec<f64> = (0..64).map(f64::from).collect();
        assert_eq!(sorted(&desc), asc);
        assert_eq!(sorted(&asc), asc);
    }

    #[test]
    fn test_descending_comparator() {
        let ctx = DynContext::new();
        let desc = Closure::new(0, ElemKind::I32, |_ctx: &DynContext, args: &[Arg<i32>]| {
            let pivot = *args[1].as_elem().unwrap();
            let elem = *args[2].as_elem().unwrap();
            Ok(Ret::I32(elem - pivot))
        });
        let arr = ArrayRef::from_vec(vec![3, 9, 1, 4]);
        arr.sort(&ctx, &desc).unwrap();
        assert_eq!(arr.to_vec(), vec![9, 4, 3, 1]);
    }

    #[test]
    fn test_sort_strings() {
        let ctx = DynContext::new();
        let by_bytes = Closure::new(0, ElemKind::F64, |_ctx: &DynContext, args: &[Arg<HostString>]| {
            let pivot = args[1].as_elem().unwrap();
            let elem = args[2].as_elem().unwrap();
            Ok(Ret::F64(match pivot.as_bytes().cmp(elem.as_bytes()) {
                std::cmp::Ordering::Less => -1.0,
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Greater => 1.0,
            }))
        });
        let arr = ArrayRef::from_vec(vec![
            HostString::new("pear"),
            HostString::new("apple"),
            HostString::new("fig"),
        ]);
        arr.sort(&ctx, &by_bytes).unwrap();
        assert_eq!(arr.join(Some(" ")).to_string(), "apple fig pear");
    }

    #[test]
    fn test_comparator_receives_context() {
        let ctx = DynContext::new();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let cmp = Closure::new(0xAB, ElemKind::F64, move |_ctx: &DynContext, args: &[Arg<f64>]| {
            assert_eq!(args.len(), 3);
            assert!(matches!(args[0], Arg::Context(0xAB)));
            seen.set(seen.get() + 1);
            Ok(Ret::F64(args[1].as_elem().unwrap() - args[2].as_elem().unwrap()))
        });
        ArrayRef::from_vec(vec![2.0, 1.0]).sort(&ctx, &cmp).unwrap();
        assert!(calls.get() > 0);
    }

    #[test]
    fn test_inconsistent_comparator_terminates() {
        let ctx = DynContext::new();
        let always = Closure::new(0, ElemKind::F64, |_ctx: &DynContext, _args: &[Arg<f64>]| {
            Ok(Ret::F64(1.0))
        });
        let arr = ArrayRef::from_vec(vec![3.0, 1.0, 2.0, 5.0, 4.0]);
        arr.sort(&ctx, &always).unwrap();
        let mut out = arr.to_vec();
        out.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_comparator_must_return_number() {
        let ctx = DynContext::new();
        let bad = Closure::new(0, ElemKind::Bool, |_ctx: &DynContext, _args: &[Arg<f64>]| {
            Ok(Ret::Bool(true))
        });
        let arr = ArrayRef::from_vec(vec![2.0, 1.0]);
        assert!(matches!(
            arr.sort(&ctx, &bad),
            Err(ArrayError::CallbackReturn { expected: "f64", .. })
        ));
    }
}
