//! Solution modifiers: grouping and aggregation, projection, HAVING,
//! ORDER BY, DISTINCT, OFFSET and LIMIT, in that order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use super::evaluator::{DistinctKey, EnvId, SoftResult};
use super::{ExprError, Evaluator};
use crate::binding::{Binding, Bindings};
use crate::error::QueryError;
use crate::graph::GraphScope;
use crate::hook::{HookArg, HookKind};
use crate::overload;
use crate::query::{CompiledQuery, Modifiers};
use crate::types::{self, Term};

/// A solution and, in an aggregate query, the group it stands for.
type Entry = (Binding, Option<Vec<Binding>>);

/// Stable merge sort with a fallible comparator.
///
/// `slice::sort_by` requires a total order; user comparisons do not
/// guarantee one.
fn merge_sort<T, E>(
    mut items: Vec<T>,
    cmp: &mut impl FnMut(&T, &T) -> Result<Ordering, E>,
) -> Result<Vec<T>, E> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp)?;
    let right = merge_sort(right, cmp)?;
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => {
                if cmp(r, l)? == Ordering::Less {
                    out.extend(right.next());
                } else {
                    out.extend(left.next());
                }
            }
            (Some(_), None) => {
                out.extend(left);
                break;
            }
            (None, _) => {
                out.extend(right);
                break;
            }
        }
    }
    Ok(out)
}

fn group(modifiers: &Modifiers, rows: Vec<Binding>) -> Vec<Entry> {
    let mut index: HashMap<Vec<Option<Term>>, usize> = HashMap::new();
    let mut groups: Vec<Entry> = Vec::new();
    for row in rows {
        let key: Vec<Option<Term>> = modifiers.group_by.iter().map(|v| row.get(v).cloned()).collect();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((row.project(&modifiers.group_by), Some(Vec::new())));
            groups.len() - 1
        });
        if let Some((_, Some(members))) = groups.get_mut(slot) {
            members.push(row);
        }
    }
    if groups.is_empty() && modifiers.group_by.is_empty() {
        groups.push((Binding::new(), Some(Vec::new())));
    }
    groups
}

impl Evaluator<'_> {
    pub(super) fn apply_modifiers(
        &mut self,
        query: &Arc<CompiledQuery>,
        env: EnvId,
        scope: &GraphScope,
        rows: Vec<Binding>,
        out: &mut Bindings,
    ) -> Result<(), QueryError> {
        let modifiers = &query.modifiers;
        let visitor = self.visitor();

        let mut entries: Vec<Entry> = if modifiers.is_aggregate() {
            group(modifiers, rows)
        } else {
            rows.into_iter().map(|row| (row, None)).collect()
        };

        for (row, members) in &mut entries {
            for projection in &modifiers.projection {
                let Some(expr) = &projection.expr else {
                    continue;
                };
                let value = self.eval_expr(expr, row, scope, members.as_deref()).soft()?;
                let value = visitor
                    .value(
                        HookKind::Select,
                        &[HookArg::Expr(expr), HookArg::Term(value.as_ref())],
                    )?
                    .or(value);
                if let Some(term) = value {
                    *row = row.with(projection.variable.clone(), term);
                }
            }
        }

        if !modifiers.having.is_empty() {
            let mut kept = Vec::with_capacity(entries.len());
            'entries: for (row, members) in entries {
                for expr in &modifiers.having {
                    let default = match self.eval_expr(expr, &row, scope, members.as_deref()) {
                        Ok(term) => term.effective_boolean().unwrap_or(false),
                        Err(ExprError::Fatal(e)) => return Err(*e),
                        Err(_) => false,
                    };
                    let args = [HookArg::Expr(expr), HookArg::Bool(default)];
                    if !visitor.decide(HookKind::Having, &args, default)? {
                        continue 'entries;
                    }
                }
                kept.push((row, members));
            }
            entries = kept;
        }

        let mut rows: Vec<Binding> = if modifiers.order_by.is_empty() {
            entries.into_iter().map(|(row, _)| row).collect()
        } else {
            self.order(modifiers, scope, entries)?
        };
        if !modifiers.order_by.is_empty() && visitor.is_active(HookKind::OrderBy) {
            let all = Bindings::with_rows(query, rows);
            rows = match visitor.solutions(HookKind::OrderBy, &[HookArg::Bindings(&all)])? {
                Some(reordered) => reordered,
                None => all.into_rows(),
            };
        }

        if !modifiers.projection.is_empty() {
            let selected = modifiers.selected();
            rows = rows.iter().map(|row| row.project(&selected)).collect();
            out.set_select(selected);
        }

        if modifiers.distinct {
            let custom = visitor.is_active(HookKind::Distinct);
            let seen = self.distinct.entry(env).or_default();
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                let key = if custom {
                    visitor
                        .value(HookKind::Distinct, &[HookArg::Query(query), HookArg::Binding(&row)])?
                        .map(DistinctKey::Custom)
                } else {
                    None
                };
                if seen.insert(key.unwrap_or_else(|| DistinctKey::Row(row.clone()))) {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        for row in rows.into_iter().skip(modifiers.offset) {
            if modifiers.limit.is_some_and(|limit| out.len() >= limit) {
                break;
            }
            if !visitor.decide(
                HookKind::Result,
                &[HookArg::Bindings(out), HookArg::Binding(&row)],
                true,
            )? {
                continue;
            }
            out.push(row);
            if !visitor.decide(HookKind::Limit, &[HookArg::Bindings(out)], true)? {
                tracing::debug!("limit hook stopped after {} solutions", out.len());
                break;
            }
        }
        Ok(())
    }

    fn order(
        &mut self,
        modifiers: &Modifiers,
        scope: &GraphScope,
        entries: Vec<Entry>,
    ) -> Result<Vec<Binding>, QueryError> {
        let mut keyed: Vec<(Vec<Option<Term>>, Binding)> = Vec::with_capacity(entries.len());
        for (row, members) in entries {
            let mut keys = Vec::with_capacity(modifiers.order_by.len());
            for key in &modifiers.order_by {
                keys.push(self.eval_expr(&key.expr, &row, scope, members.as_deref()).soft()?);
            }
            keyed.push((keys, row));
        }
        let (session, state) = (self.session, self.state);
        let mut cmp = |a: &(Vec<Option<Term>>, Binding),
                       b: &(Vec<Option<Term>>, Binding)|
         -> Result<Ordering, QueryError> {
            for ((x, y), key) in a.0.iter().zip(&b.0).zip(&modifiers.order_by) {
                let ordering = match (x, y) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(x), Some(y)) => match types::compare(x, y) {
                        Ok(ordering) => ordering,
                        Err(_) => overload::compare(session, state, x, y)?.unwrap_or(Ordering::Equal),
                    },
                };
                let ordering = if key.descending { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return Ok(ordering);
                }
            }
            Ok(Ordering::Equal)
        };
        Ok(merge_sort(keyed, &mut cmp)?.into_iter().map(|(_, row)| row).collect())
    }
}
