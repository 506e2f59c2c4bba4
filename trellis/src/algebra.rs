//! Solution-sequence algebra.
//!
//! Pure functions over binding slices. Ordering is part of the contract:
//! join and left join are left-major, union is left then right. The
//! evaluator layers hooks around these; nothing here knows about them.

use std::convert::Infallible;

use crate::binding::Binding;

/// Natural join. Rows come out left-order major, right-order minor.
#[must_use]
pub fn join(left: &[Binding], right: &[Binding]) -> Vec<Binding> {
    let mut out = Vec::new();
    for l in left {
        out.extend(right.iter().filter_map(|r| l.merge(r)));
    }
    out
}

/// Left join.
///
/// Every left row is kept: joined with each compatible right row that
/// passes `accept`, or unchanged when none does.
pub fn left_join(
    left: &[Binding],
    right: &[Binding],
    mut accept: impl FnMut(&Binding) -> bool,
) -> Vec<Binding> {
    match try_left_join::<Infallible>(left, right, |merged| Ok(accept(merged))) {
        Ok(rows) => rows,
        Err(never) => match never {},
    }
}

/// Left join with a fallible filter.
///
/// Same as [`left_join`] but the filter may fail; the first error aborts.
pub fn try_left_join<E>(
    left: &[Binding],
    right: &[Binding],
    mut accept: impl FnMut(&Binding) -> Result<bool, E>,
) -> Result<Vec<Binding>, E> {
    let mut out = Vec::with_capacity(left.len());
    for l in left {
        let before = out.len();
        for r in right {
            if let Some(merged) = l.merge(r) {
                if accept(&merged)? {
                    out.push(merged);
                }
            }
        }
        if out.len() == before {
            out.push(l.clone());
        }
    }
    Ok(out)
}

/// SPARQL MINUS: drop a left row only when some right row is compatible
/// with it and shares at least one variable.
#[must_use]
pub fn minus(left: &[Binding], right: &[Binding]) -> Vec<Binding> {
    left.iter()
        .filter(|l| !right.iter().any(|r| l.shares_variable(r) && l.is_compatible(r)))
        .cloned()
        .collect()
}

/// Bag union: left rows, then right rows, duplicates kept.
#[must_use]
pub fn union(left: &[Binding], right: &[Binding]) -> Vec<Binding> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    out.extend_from_slice(left);
    out.extend_from_slice(right);
    out
}
