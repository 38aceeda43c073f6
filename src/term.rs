//! The data model: terms, atoms, rules, constraints, goals, clauses.
//!
//! Every name (predicate, string constant, variable) is interned in a
//! [`SymbolStore`](crate::symbol::SymbolStore), so all values here are
//! cheap to copy and compare. Rendering back to text goes through the
//! store; see [`format_atom`] and friends.

use crate::symbol::{SymId, SymbolStore};
use smallvec::SmallVec;

/// A logic variable: interned name plus a generation counter.
///
/// Two variables are equal iff both name and generation match.
/// Generation 0 is a source-level variable; positive generations are
/// fresh renames produced while resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var {
    pub name: SymId,
    pub gen: u32,
}

impl Var {
    /// A source-level variable (generation 0).
    pub fn source(name: SymId) -> Self {
        Self { name, gen: 0 }
    }
}

/// An atomic value: constant, variable, or wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    /// Signed integer constant.
    Int(i64),
    /// String constant (also covers symbol atoms like `socrates`).
    Str(SymId),
    /// Named logic variable.
    Var(Var),
    /// Anonymous variable; unifies with anything, binds nothing.
    Wildcard,
}

impl Term {
    /// Stamp the generation onto a variable; other terms pass through.
    pub fn renamed(self, gen: u32) -> Term {
        match self {
            Term::Var(v) => Term::Var(Var { name: v.name, gen }),
            other => other,
        }
    }

    /// A term is ground when it is a constant.
    pub fn is_ground(self) -> bool {
        matches!(self, Term::Int(_) | Term::Str(_))
    }
}

/// Argument lists are short in practice; four inline slots cover
/// typical predicates without heap allocation.
pub type Args = SmallVec<[Term; 4]>;

/// A predicate applied to arguments: `parent(xerces, brooke)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub pred: SymId,
    pub args: Args,
}

impl Atom {
    pub fn new(pred: SymId, args: impl IntoIterator<Item = Term>) -> Self {
        Self {
            pred,
            args: args.into_iter().collect(),
        }
    }

    /// Arity of the atom.
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Copy of this atom with every variable stamped to `gen`.
    pub fn renamed(&self, gen: u32) -> Atom {
        Atom {
            pred: self.pred,
            args: self.args.iter().map(|t| t.renamed(gen)).collect(),
        }
    }

    /// True when no argument is a variable or wildcard.
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(|t| t.is_ground())
    }
}

/// Comparison operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Substring containment: `lhs in rhs`.
    In,
}

impl CmpOp {
    /// Parse an operator token. Returns None for anything else, which
    /// the surface grammar reports as an unexpected token.
    pub fn from_token(token: &str) -> Option<CmpOp> {
        match token {
            "=" => Some(CmpOp::Eq),
            "!=" => Some(CmpOp::Ne),
            "<" => Some(CmpOp::Lt),
            "<=" => Some(CmpOp::Le),
            ">" => Some(CmpOp::Gt),
            ">=" => Some(CmpOp::Ge),
            "in" => Some(CmpOp::In),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
        }
    }
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary comparison restricting variable bindings, evaluated after
/// the body goals that bind its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub op: CmpOp,
    pub lhs: Term,
    pub rhs: Term,
}

impl Constraint {
    pub fn renamed(self, gen: u32) -> Constraint {
        Constraint {
            op: self.op,
            lhs: self.lhs.renamed(gen),
            rhs: self.rhs.renamed(gen),
        }
    }
}

/// One element of a rule body.
///
/// Rules can appear in goal position for uniformity; they resolve
/// through their head like a query (source rules only ever occur as
/// database entries).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Goal {
    Atom(Atom),
    Rule(Box<Rule>),
    Constraint(Constraint),
}

impl Goal {
    pub fn renamed(&self, gen: u32) -> Goal {
        match self {
            Goal::Atom(a) => Goal::Atom(a.renamed(gen)),
            Goal::Rule(r) => Goal::Rule(Box::new(r.renamed(gen))),
            Goal::Constraint(c) => Goal::Constraint(c.renamed(gen)),
        }
    }
}

/// A Horn clause: head atom and a non-empty conjunctive body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: Atom,
    pub body: Vec<Goal>,
}

impl Rule {
    pub fn new(head: Atom, body: Vec<Goal>) -> Self {
        Self { head, body }
    }

    pub fn renamed(&self, gen: u32) -> Rule {
        Rule {
            head: self.head.renamed(gen),
            body: self.body.iter().map(|g| g.renamed(gen)).collect(),
        }
    }
}

/// What the index stores: a ground-or-variable atom, or a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fact {
    Atom(Atom),
    Rule(Rule),
}

impl Fact {
    /// The predicate name the index keys this fact under.
    pub fn key(&self) -> SymId {
        match self {
            Fact::Atom(a) => a.pred,
            Fact::Rule(r) => r.head.pred,
        }
    }

    /// The argument sequence that forms the index spine.
    pub fn spine_args(&self) -> &[Term] {
        match self {
            Fact::Atom(a) => &a.args,
            Fact::Rule(r) => &r.head.args,
        }
    }

    pub fn renamed(&self, gen: u32) -> Fact {
        match self {
            Fact::Atom(a) => Fact::Atom(a.renamed(gen)),
            Fact::Rule(r) => Fact::Rule(r.renamed(gen)),
        }
    }
}

/// A top-level clause submitted to the engine.
///
/// `Assert` carries the full [`Goal`] sum: asserting a constraint is
/// representable but rejected at evaluation ("cannot be stored").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Assert(Goal),
    Retract(Atom),
    Query(Atom),
}

// ---------- rendering ----------

fn is_alphanumeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric())
}

fn push_term(out: &mut String, term: Term, symbols: &SymbolStore) {
    match term {
        Term::Int(n) => out.push_str(&n.to_string()),
        Term::Str(id) => {
            let s = symbols.resolve(id).unwrap_or("?");
            if is_alphanumeric(s) {
                out.push_str(s);
            } else {
                out.push('"');
                out.push_str(s);
                out.push('"');
            }
        }
        Term::Var(v) => {
            out.push_str(symbols.resolve(v.name).unwrap_or("?"));
            if v.gen != 0 {
                out.push('.');
                out.push_str(&v.gen.to_string());
            }
        }
        Term::Wildcard => out.push('_'),
    }
}

/// Render a term through the symbol store.
pub fn format_term(term: Term, symbols: &SymbolStore) -> String {
    let mut out = String::new();
    push_term(&mut out, term, symbols);
    out
}

fn push_atom(out: &mut String, atom: &Atom, symbols: &SymbolStore) {
    out.push_str(symbols.resolve(atom.pred).unwrap_or("?"));
    out.push('(');
    for (i, arg) in atom.args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_term(out, *arg, symbols);
    }
    out.push(')');
}

/// Render an atom as `name(arg, …)`.
pub fn format_atom(atom: &Atom, symbols: &SymbolStore) -> String {
    let mut out = String::new();
    push_atom(&mut out, atom, symbols);
    out
}

/// Render a constraint as `lhs op rhs`.
pub fn format_constraint(c: &Constraint, symbols: &SymbolStore) -> String {
    let mut out = String::new();
    push_term(&mut out, c.lhs, symbols);
    out.push(' ');
    out.push_str(c.op.as_str());
    out.push(' ');
    push_term(&mut out, c.rhs, symbols);
    out
}

/// Render a goal.
pub fn format_goal(goal: &Goal, symbols: &SymbolStore) -> String {
    match goal {
        Goal::Atom(a) => format_atom(a, symbols),
        Goal::Rule(r) => format_rule(r, symbols),
        Goal::Constraint(c) => format_constraint(c, symbols),
    }
}

/// Render a rule as `head(…) :- goal, goal, …`.
pub fn format_rule(rule: &Rule, symbols: &SymbolStore) -> String {
    let mut out = String::new();
    push_atom(&mut out, &rule.head, symbols);
    out.push_str(" :- ");
    for (i, goal) in rule.body.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format_goal(goal, symbols));
    }
    out
}

/// Render an index entry.
pub fn format_fact(fact: &Fact, symbols: &SymbolStore) -> String {
    match fact {
        Fact::Atom(a) => format_atom(a, symbols),
        Fact::Rule(r) => format_rule(r, symbols),
    }
}
