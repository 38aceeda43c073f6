//! One resolution step.
//!
//! A [`Task`] is a branch of the search: the goals still to satisfy
//! (leftmost first) and the environment accumulated so far. Stepping a
//! task with no goals left yields its environment as a solution;
//! otherwise the first goal expands into zero or more child tasks.
//!
//! Atom goals bump the generation counter and fork one child per index
//! candidate, each on its own copy of the environment; matched rules
//! prepend their body to the continuation, which keeps body evaluation
//! left-to-right within a branch while branches stay independent.

use std::collections::VecDeque;

use crate::constraint;
use crate::engine::EngineError;
use crate::env::Env;
use crate::index::Index;
use crate::symbol::SymbolStore;
use crate::term::{Atom, Fact, Goal, Term};
use crate::unify::unify_all;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// One branch of the resolution search.
#[derive(Debug, Clone)]
pub(crate) struct Task {
    /// Remaining goals, leftmost first.
    goals: VecDeque<Goal>,
    env: Env,
}

impl Task {
    /// The initial task of a query.
    pub(crate) fn root(query: Atom) -> Task {
        Task {
            goals: VecDeque::from([Goal::Atom(query)]),
            env: Env::new(),
        }
    }
}

/// Outcome of stepping a task.
pub(crate) enum Step {
    /// Child branches to explore; empty means the branch is a dead end.
    Expand(Vec<Task>),
    /// All goals satisfied: the branch's final environment.
    Solved(Env),
}

/// Step a task once against a read-only index.
pub(crate) fn step(
    mut task: Task,
    index: &Index,
    symbols: &SymbolStore,
) -> Result<Step, EngineError> {
    let Some(goal) = task.goals.pop_front() else {
        return Ok(Step::Solved(task.env));
    };
    match goal {
        Goal::Atom(query) => expand_atom(query, task.goals, task.env, index),
        // a rule in goal position resolves through its head
        Goal::Rule(rule) => expand_atom(rule.head, task.goals, task.env, index),
        Goal::Constraint(c) => {
            if constraint::eval(&c, &task.env, symbols) {
                Ok(Step::Expand(vec![task]))
            } else {
                Ok(Step::Expand(Vec::new()))
            }
        }
    }
}

/// Fork one child task per unifiable index candidate.
fn expand_atom(
    query: Atom,
    rest: VecDeque<Goal>,
    mut env: Env,
    index: &Index,
) -> Result<Step, EngineError> {
    // fresh generation for everything matched here; no caller at any
    // depth shares it
    let gen = env.next_generation();

    let candidates = index.find(&query);
    #[cfg(feature = "tracing")]
    trace!(candidates = candidates.len(), gen, "expand_atom");

    let mut children = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match candidate.renamed(gen) {
            Fact::Atom(fact) => {
                let mut child_env = env.clone();
                if unify_all(&query.args, &fact.args, &mut child_env) {
                    children.push(Task {
                        goals: rest.clone(),
                        env: child_env,
                    });
                }
            }
            Fact::Rule(rule) => {
                let mut child_env = env.clone();
                if unify_all(&query.args, &rule.head.args, &mut child_env) {
                    if rule.body.is_empty() {
                        return Err(EngineError::EmptyRuleBody);
                    }
                    let mut goals = rest.clone();
                    for goal in rule.body.into_iter().rev() {
                        goals.push_front(goal);
                    }
                    children.push(Task {
                        goals,
                        env: child_env,
                    });
                }
            }
        }
    }
    Ok(Step::Expand(children))
}

/// Build the result atom of a successful branch: query variables are
/// replaced by their bound values, unbound ones pass through. The
/// environment must already be collapsed.
pub(crate) fn materialize(query: &Atom, env: &Env) -> Atom {
    Atom {
        pred: query.pred,
        args: query
            .args
            .iter()
            .map(|arg| match arg {
                Term::Var(v) => env.lookup(*v).unwrap_or(*arg),
                other => *other,
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/resolve.rs"]
mod tests;
