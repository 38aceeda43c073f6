//! Engine - top-level clause dispatch over the fact index.
//!
//! The engine owns the symbol store and the index. Assertions and
//! retractions mutate the index through `Arc::make_mut`; a query clones
//! the `Arc` and resolves against that snapshot, so a live result
//! stream never observes later writes. Writes are serialized with
//! respect to queries at the top level by the caller.

use std::fmt;
use std::sync::Arc;

use crate::index::Index;
use crate::pool::{self, PoolConfig, QueryResults};
use crate::symbol::SymbolStore;
use crate::term::{Atom, Clause, Fact, Goal};

#[cfg(feature = "tracing")]
use crate::trace::debug;

/// Fatal evaluation errors. Unification failure, constraint falsity
/// and empty result sets are not errors; they just produce no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Assertion of something that is not an atom or a rule.
    CannotStore,
    /// A rule with an empty body was discovered during resolution.
    EmptyRuleBody,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::CannotStore => write!(f, "constraint cannot be stored in database"),
            EngineError::EmptyRuleBody => write!(f, "rule's body cannot be empty"),
        }
    }
}

impl std::error::Error for EngineError {}

/// The deductive database: clause dispatch, fact storage, queries.
pub struct Engine {
    symbols: Arc<SymbolStore>,
    index: Arc<Index>,
    config: PoolConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            symbols: Arc::new(SymbolStore::new()),
            index: Arc::new(Index::new()),
            config,
        }
    }

    /// The shared symbol store; the parser interns through this.
    pub fn symbols(&self) -> &Arc<SymbolStore> {
        &self.symbols
    }

    /// Number of clauses currently stored.
    pub fn fact_count(&self) -> usize {
        self.index.fact_count()
    }

    /// Dispatch one clause. Queries return a result stream; assertions
    /// and retractions return `None`.
    pub fn eval(&mut self, clause: Clause) -> Result<Option<QueryResults>, EngineError> {
        match clause {
            Clause::Assert(Goal::Atom(atom)) => {
                self.assert_fact(Fact::Atom(atom));
                Ok(None)
            }
            Clause::Assert(Goal::Rule(rule)) => {
                self.assert_fact(Fact::Rule(*rule));
                Ok(None)
            }
            Clause::Assert(Goal::Constraint(_)) => Err(EngineError::CannotStore),
            Clause::Retract(atom) => {
                self.retract(&atom);
                Ok(None)
            }
            Clause::Query(atom) => Ok(Some(self.query(atom))),
        }
    }

    /// Store an atom or rule, deduplicating structural equals.
    pub fn assert_fact(&mut self, fact: Fact) {
        #[cfg(feature = "tracing")]
        debug!(key = ?fact.key(), "assert");
        Arc::make_mut(&mut self.index).assert(fact);
    }

    /// Remove the stored atom structurally equal to `atom`, if any.
    pub fn retract(&mut self, atom: &Atom) {
        #[cfg(feature = "tracing")]
        debug!(key = ?atom.pred, "retract");
        Arc::make_mut(&mut self.index).remove(atom);
    }

    /// Open the lazy, unordered stream of ground atoms entailed for
    /// `query` by the current database.
    pub fn query(&self, query: Atom) -> QueryResults {
        pool::spawn_query(
            query,
            Arc::clone(&self.index),
            Arc::clone(&self.symbols),
            &self.config,
        )
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/engine.rs"]
mod tests;
