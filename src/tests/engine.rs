use super::*;
use crate::term::{format_atom, CmpOp, Constraint, Rule, Term, Var};

fn s(engine: &Engine, name: &str) -> Term {
    Term::Str(engine.symbols().intern(name))
}

fn v(engine: &Engine, name: &str) -> Term {
    Term::Var(Var::source(engine.symbols().intern(name)))
}

fn atom(engine: &Engine, name: &str, args: &[Term]) -> Atom {
    Atom::new(engine.symbols().intern(name), args.iter().copied())
}

fn query_sorted(engine: &Engine, query: Atom) -> Vec<String> {
    let mut out: Vec<String> = engine
        .query(query)
        .try_collect()
        .unwrap()
        .iter()
        .map(|a| format_atom(a, engine.symbols()))
        .collect();
    out.sort();
    out
}

// ========== CLAUSE DISPATCH ==========

#[test]
fn assert_and_query_round_trip() {
    let mut engine = Engine::new();
    let fact = atom(&engine, "human", &[s(&engine, "socrates")]);
    engine
        .eval(Clause::Assert(Goal::Atom(fact.clone())))
        .unwrap();

    assert_eq!(engine.fact_count(), 1);
    assert_eq!(query_sorted(&engine, fact), vec!["human(socrates)"]);
}

#[test]
fn assertions_do_not_open_a_stream() {
    let mut engine = Engine::new();
    let fact = atom(&engine, "foo", &[Term::Int(1)]);
    let outcome = engine.eval(Clause::Assert(Goal::Atom(fact))).unwrap();
    assert!(outcome.is_none());
}

#[test]
fn asserting_a_constraint_cannot_be_stored() {
    let mut engine = Engine::new();
    let constraint = Constraint {
        op: CmpOp::Eq,
        lhs: Term::Int(1),
        rhs: Term::Int(1),
    };
    assert!(matches!(
        engine.eval(Clause::Assert(Goal::Constraint(constraint))),
        Err(EngineError::CannotStore)
    ));
    // the engine stays usable for the next clause
    let fact = atom(&engine, "foo", &[Term::Int(1)]);
    assert!(engine.eval(Clause::Assert(Goal::Atom(fact))).is_ok());
}

#[test]
fn retraction_removes_exact_match() {
    let mut engine = Engine::new();
    for name in ["ok", "wrong", "fine"] {
        let fact = atom(&engine, "foo", &[s(&engine, name)]);
        engine.eval(Clause::Assert(Goal::Atom(fact))).unwrap();
    }
    engine
        .eval(Clause::Retract(atom(&engine, "foo", &[s(&engine, "wrong")])))
        .unwrap();

    let query = atom(&engine, "foo", &[v(&engine, "X")]);
    assert_eq!(query_sorted(&engine, query), vec!["foo(fine)", "foo(ok)"]);
}

#[test]
fn retract_then_query_is_empty() {
    let mut engine = Engine::new();
    let fact = atom(&engine, "foo", &[Term::Int(1)]);
    engine
        .eval(Clause::Assert(Goal::Atom(fact.clone())))
        .unwrap();
    engine.eval(Clause::Retract(fact.clone())).unwrap();

    assert!(query_sorted(&engine, fact).is_empty());
}

// ========== QUERIES ==========

#[test]
fn rules_resolve_recursively() {
    let mut engine = Engine::new();
    let x = v(&engine, "X");
    let y = v(&engine, "Y");
    let z = v(&engine, "Z");

    for (parent, child) in [("xerces", "brooke"), ("brooke", "damocles")] {
        let fact = atom(&engine, "parent", &[s(&engine, parent), s(&engine, child)]);
        engine.eval(Clause::Assert(Goal::Atom(fact))).unwrap();
    }
    engine
        .eval(Clause::Assert(Goal::Rule(Box::new(Rule::new(
            atom(&engine, "ancestor", &[x, y]),
            vec![Goal::Atom(atom(&engine, "parent", &[x, y]))],
        )))))
        .unwrap();
    engine
        .eval(Clause::Assert(Goal::Rule(Box::new(Rule::new(
            atom(&engine, "ancestor", &[x, y]),
            vec![
                Goal::Atom(atom(&engine, "parent", &[x, z])),
                Goal::Atom(atom(&engine, "ancestor", &[z, y])),
            ],
        )))))
        .unwrap();

    let query = atom(&engine, "ancestor", &[s(&engine, "xerces"), x]);
    assert_eq!(
        query_sorted(&engine, query),
        vec!["ancestor(xerces, brooke)", "ancestor(xerces, damocles)"]
    );
}

#[test]
fn query_snapshot_ignores_later_writes() {
    let mut engine = Engine::new();
    let first = atom(&engine, "foo", &[Term::Int(1)]);
    engine
        .eval(Clause::Assert(Goal::Atom(first)))
        .unwrap();

    let query = atom(&engine, "foo", &[v(&engine, "X")]);
    let stream = engine.query(query.clone());

    // a write landing after the stream opened
    let second = atom(&engine, "foo", &[Term::Int(2)]);
    engine.eval(Clause::Assert(Goal::Atom(second))).unwrap();

    assert_eq!(stream.try_collect().unwrap().len(), 1);
    assert_eq!(engine.query(query).try_collect().unwrap().len(), 2);
}

#[test]
fn result_order_is_unspecified_but_set_is_stable() {
    let mut engine = Engine::new();
    for i in 0..20 {
        let fact = atom(&engine, "foo", &[Term::Int(i)]);
        engine.eval(Clause::Assert(Goal::Atom(fact))).unwrap();
    }
    let query = atom(&engine, "foo", &[v(&engine, "X")]);

    let first = query_sorted(&engine, query.clone());
    let second = query_sorted(&engine, query);
    assert_eq!(first.len(), 20);
    assert_eq!(first, second);
}

#[test]
fn empty_body_rule_surfaces_fatal_error() {
    let mut engine = Engine::new();
    let x = v(&engine, "X");
    engine
        .eval(Clause::Assert(Goal::Rule(Box::new(Rule {
            head: atom(&engine, "bad", &[x]),
            body: Vec::new(),
        }))))
        .unwrap();

    let results = engine.query(atom(&engine, "bad", &[Term::Int(1)]));
    assert_eq!(results.try_collect(), Err(EngineError::EmptyRuleBody));
}
