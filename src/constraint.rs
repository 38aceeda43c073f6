//! Constraint evaluation.
//!
//! A constraint goal filters the current environment: both operands are
//! walked to their values, then compared. Type mismatches (including a
//! still-unbound variable on either side) are logical failures, never
//! errors; the branch simply yields nothing.

use crate::env::Env;
use crate::symbol::SymbolStore;
use crate::term::{CmpOp, Constraint, Term};
use std::borrow::Cow;

/// Evaluate a constraint under the environment.
pub fn eval(constraint: &Constraint, env: &Env, symbols: &SymbolStore) -> bool {
    let lhs = env.walk(constraint.lhs);
    let rhs = env.walk(constraint.rhs);

    if constraint.op == CmpOp::In {
        return match (stringify(lhs, symbols), stringify(rhs, symbols)) {
            (Some(needle), Some(haystack)) => haystack.contains(needle.as_ref()),
            _ => false,
        };
    }

    match (lhs, rhs) {
        (Term::Int(l), Term::Int(r)) => compare(constraint.op, &l, &r),
        (Term::Str(l), Term::Str(r)) => match (symbols.resolve(l), symbols.resolve(r)) {
            (Some(l), Some(r)) => compare(constraint.op, &l, &r),
            _ => false,
        },
        _ => false,
    }
}

/// Ordered comparison for operands of one primitive type.
/// Strings order lexicographically, integers numerically.
fn compare<T: Ord>(op: CmpOp, lhs: &T, rhs: &T) -> bool {
    match op {
        CmpOp::Eq => lhs == rhs,
        CmpOp::Ne => lhs != rhs,
        CmpOp::Lt => lhs < rhs,
        CmpOp::Le => lhs <= rhs,
        CmpOp::Gt => lhs > rhs,
        CmpOp::Ge => lhs >= rhs,
        // handled before dispatch
        CmpOp::In => false,
    }
}

/// The `in` operator sees both operands as text: strings as-is,
/// integers in base 10. Variables and wildcards have no text.
fn stringify(term: Term, symbols: &SymbolStore) -> Option<Cow<'_, str>> {
    match term {
        Term::Int(n) => Some(Cow::Owned(n.to_string())),
        Term::Str(id) => symbols.resolve(id).map(Cow::Borrowed),
        Term::Var(_) | Term::Wildcard => None,
    }
}
