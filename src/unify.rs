//! Unification of scalar terms under a substitution environment.
//!
//! Terms here are flat (constants, variables, wildcards), so the only
//! recursion is chasing variable chains; a loop handles that without
//! stack growth. There is no occurs-check: the surface grammar cannot
//! construct cyclic bindings.

use crate::env::Env;
use crate::term::Term;

/// Try to make `lhs` and `rhs` equal, recording new bindings in `env`.
///
/// Rule order, checked on every iteration of the chase loop:
/// structural equality, wildcard on either side, bound-variable chase,
/// unbound-variable bind, then failure.
///
/// On failure `env` may hold bindings from earlier argument positions;
/// callers branch on a clone.
pub fn unify(lhs: Term, rhs: Term, env: &mut Env) -> bool {
    let mut lhs = lhs;
    let mut rhs = rhs;
    loop {
        if lhs == rhs {
            return true;
        }
        if lhs == Term::Wildcard || rhs == Term::Wildcard {
            return true;
        }
        if let Term::Var(v) = lhs {
            match env.lookup(v) {
                Some(bound) => {
                    lhs = bound;
                    continue;
                }
                None => {
                    env.bind(v, rhs);
                    return true;
                }
            }
        }
        if let Term::Var(v) = rhs {
            match env.lookup(v) {
                Some(bound) => {
                    rhs = bound;
                    continue;
                }
                None => {
                    env.bind(v, lhs);
                    return true;
                }
            }
        }
        return false;
    }
}

/// Unify two argument sequences position by position, left to right.
/// Fails on length mismatch without touching the environment.
pub fn unify_all(lhs: &[Term], rhs: &[Term], env: &mut Env) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    lhs.iter()
        .zip(rhs.iter())
        .all(|(l, r)| unify(*l, *r, env))
}
