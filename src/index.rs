//! The fact index: a trie keyed by predicate name at the root and by
//! successive argument positions below.
//!
//! The spine from a top node to a leaf spells out the argument sequence
//! of one stored clause; the leaf carries the clause itself. Variable
//! and wildcard arguments are stored as wildcards, so clauses differing
//! only in variable names share a spine:
//!
//! ```text
//!  foo(a, b, c).  foo(a, X).  foo(a, b, d).
//!
//!          a
//!         / \
//!        b   _
//!       / \   \
//!      c   d  foo(a, X)
//!     /     \
//!  foo(a,b,c)  foo(a,b,d)
//! ```

use crate::symbol::SymId;
use crate::term::{Args, Atom, Fact, Term};
use hashbrown::HashMap;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;

#[cfg(feature = "tracing")]
use crate::trace::trace;

type FxBuild = BuildHasherDefault<FxHasher>;

/// Variables lose their identity in storage keys; they are re-renamed
/// when the clause is drawn out during resolution.
fn normalize(term: Term) -> Term {
    match term {
        Term::Var(_) | Term::Wildcard => Term::Wildcard,
        other => other,
    }
}

/// Conservative match filter: true when either side is a variable or
/// wildcard, or both are equal constants. Prunes the trie walk; full
/// unification decides later.
pub fn maybe_unifies(lhs: Term, rhs: Term) -> bool {
    if matches!(lhs, Term::Var(_) | Term::Wildcard) {
        return true;
    }
    if matches!(rhs, Term::Var(_) | Term::Wildcard) {
        return true;
    }
    lhs == rhs
}

/// One trie node: an argument key with children, or a leaf clause.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Arg { key: Term, children: Vec<Node> },
    Leaf(Fact),
}

impl Node {
    /// Fresh spine for the remaining arguments, ending in the clause.
    fn spine(args: &[Term], fact: &Fact) -> Node {
        match args.split_first() {
            None => Node::Leaf(fact.clone()),
            Some((first, rest)) => Node::Arg {
                key: normalize(*first),
                children: vec![Node::spine(rest, fact)],
            },
        }
    }

    /// Try to merge the clause into this spine. Returns false when the
    /// first argument does not belong here.
    fn add(&mut self, args: &[Term], fact: &Fact) -> bool {
        let Node::Arg { key, children } = self else {
            return false;
        };
        let Some((first, rest)) = args.split_first() else {
            return false;
        };
        if *key != normalize(*first) {
            return false;
        }
        if rest.is_empty() {
            let duplicate = children
                .iter()
                .any(|c| matches!(c, Node::Leaf(existing) if existing == fact));
            if !duplicate {
                children.push(Node::Leaf(fact.clone()));
            }
        } else if !children.iter_mut().any(|c| c.add(rest, fact)) {
            children.push(Node::spine(rest, fact));
        }
        true
    }

    /// Drop the leaf holding an atom structurally equal to `atom`.
    /// Sibling order is not preserved.
    fn remove(&mut self, args: &[Term], atom: &Atom) {
        let Node::Arg { key, children } = self else {
            return;
        };
        let Some((first, rest)) = args.split_first() else {
            return;
        };
        if !maybe_unifies(*key, *first) {
            return;
        }
        if rest.is_empty() {
            if let Some(i) = children
                .iter()
                .position(|c| matches!(c, Node::Leaf(Fact::Atom(a)) if a == atom))
            {
                children.swap_remove(i);
            }
        } else {
            for child in children.iter_mut() {
                child.remove(rest, atom);
            }
        }
    }

    /// Collect every clause whose spine may unify with the query path.
    fn find(&self, args: &[Term], out: &mut Vec<Fact>) {
        match self {
            Node::Leaf(fact) => {
                if args.is_empty() {
                    out.push(fact.clone());
                }
            }
            Node::Arg { key, children } => {
                if let Some((first, rest)) = args.split_first() {
                    if maybe_unifies(*first, *key) {
                        for child in children {
                            child.find(rest, out);
                        }
                    }
                }
            }
        }
    }

    fn count_leaves(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Arg { children, .. } => children.iter().map(Node::count_leaves).sum(),
        }
    }
}

/// The deduplicating fact store. Read-only during resolution; writes
/// are serialized with respect to queries by the caller.
#[derive(Debug, Clone, Default)]
pub struct Index {
    roots: HashMap<SymId, Vec<Node>, FxBuild>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a clause, sharing spines and deduplicating structurally
    /// equal entries.
    pub fn assert(&mut self, fact: Fact) {
        #[cfg(feature = "tracing")]
        trace!(key = ?fact.key(), "index_assert");

        let args: Args = fact.spine_args().iter().copied().collect();
        let nodes = self.roots.entry(fact.key()).or_default();
        if args.is_empty() {
            // the grammar cannot produce zero arity; handled anyway
            if !nodes
                .iter()
                .any(|n| matches!(n, Node::Leaf(existing) if *existing == fact))
            {
                nodes.push(Node::Leaf(fact));
            }
            return;
        }
        if !nodes.iter_mut().any(|n| n.add(&args, &fact)) {
            nodes.push(Node::spine(&args, &fact));
        }
    }

    /// Remove the stored atom structurally equal to `atom`, if any.
    pub fn remove(&mut self, atom: &Atom) {
        if let Some(nodes) = self.roots.get_mut(&atom.pred) {
            for node in nodes.iter_mut() {
                node.remove(&atom.args, atom);
            }
        }
    }

    /// Clauses whose spines may unify with the query's argument path.
    /// A predicate with no entries yields an empty list, not an error.
    pub fn find(&self, query: &Atom) -> Vec<Fact> {
        let mut out = Vec::new();
        if let Some(nodes) = self.roots.get(&query.pred) {
            for node in nodes {
                node.find(&query.args, &mut out);
            }
        }
        #[cfg(feature = "tracing")]
        trace!(key = ?query.pred, candidates = out.len(), "index_find");
        out
    }

    /// Total number of stored clauses.
    pub fn fact_count(&self) -> usize {
        self.roots
            .values()
            .flat_map(|nodes| nodes.iter().map(Node::count_leaves))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fact_count() == 0
    }
}
