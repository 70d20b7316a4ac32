//! Pattern evaluation
//!
//! Clauses are evaluated left to right over a relation of partial bindings,
//! starting from a single empty binding. Simple clauses join against the
//! store, predicates filter, functions extend, and negations drop every
//! binding for which their inner clauses can still be satisfied. The final
//! relation is projected onto the pattern's exported variables with set
//! semantics: each distinct tuple is reported once, in discovery order.

use std::collections::{HashMap, HashSet};

use crate::db::{Db, EntityId, EntityRef};
use crate::pattern::{Clause, FunctionOp, Match, PredicateOp, SiftingPattern, Term};
use crate::value::Value;

type Row = HashMap<String, Value>;

impl Db {
    /// Raw result tuples of `pattern` over the current contents.
    pub fn query(&self, pattern: &SiftingPattern) -> Vec<Vec<Value>> {
        if self.is_empty() {
            return Vec::new();
        }

        let rows = eval_all(self, pattern.clauses(), vec![Row::new()]);

        let mut seen = HashSet::new();
        let mut tuples = Vec::new();
        for row in rows {
            let tuple: Vec<Value> = pattern
                .lvars()
                .iter()
                .map(|v| row.get(v).cloned().unwrap_or(Value::Nil))
                .collect();
            if seen.insert(tuple.clone()) {
                tuples.push(tuple);
            }
        }

        tracing::trace!(
            pattern = pattern.name(),
            entities = self.len(),
            tuples = tuples.len(),
            "pattern evaluated"
        );
        tuples
    }
}

impl SiftingPattern {
    /// Named bindings for every match of this pattern in `db`.
    pub fn matches(&self, db: &Db) -> Vec<Match> {
        db.query(self).iter().map(|t| self.bind(t)).collect()
    }
}

fn eval_all(db: &Db, clauses: &[Clause], mut rows: Vec<Row>) -> Vec<Row> {
    for clause in clauses {
        if rows.is_empty() {
            break;
        }
        rows = eval(db, clause, rows);
    }
    rows
}

fn eval(db: &Db, clause: &Clause, rows: Vec<Row>) -> Vec<Row> {
    match clause {
        Clause::Simple {
            entity,
            attr,
            value,
        } => rows
            .iter()
            .flat_map(|row| match_simple(db, entity, attr.as_ref(), value.as_ref(), row))
            .collect(),
        Clause::Predicate { op, args } => rows
            .into_iter()
            .filter(|row| test_predicate(*op, args, row))
            .collect(),
        Clause::Function { op, args, binding } => rows
            .into_iter()
            .filter_map(|row| {
                let result = apply_function(*op, args, &row)?;
                unify(&row, &Term::Var(binding.clone()), &result)
            })
            .collect(),
        Clause::And(clauses) => eval_all(db, clauses, rows),
        Clause::Or(branches) => rows
            .iter()
            .flat_map(|row| {
                branches
                    .iter()
                    .flat_map(move |branch| eval(db, branch, vec![row.clone()]))
            })
            .collect(),
        Clause::Not(clauses) => rows
            .into_iter()
            .filter(|row| eval_all(db, clauses, vec![row.clone()]).is_empty())
            .collect(),
        Clause::NotJoin { join_vars, clauses } => rows
            .into_iter()
            .filter(|row| {
                let seed: Row = join_vars
                    .iter()
                    .filter_map(|v| row.get(v).map(|x| (v.clone(), x.clone())))
                    .collect();
                eval_all(db, clauses, vec![seed]).is_empty()
            })
            .collect(),
    }
}

fn resolve(term: &Term, row: &Row) -> Option<Value> {
    match term {
        Term::Const(v) => Some(v.clone()),
        Term::Var(name) => row.get(name).cloned(),
    }
}

/// Extends `row` so that `term` equals `value`, or fails on conflict.
fn unify(row: &Row, term: &Term, value: &Value) -> Option<Row> {
    match term {
        Term::Const(c) => (c == value).then(|| row.clone()),
        Term::Var(name) => match row.get(name) {
            Some(bound) => (bound == value).then(|| row.clone()),
            None => {
                let mut next = row.clone();
                next.insert(name.clone(), value.clone());
                Some(next)
            }
        },
    }
}

fn match_simple(
    db: &Db,
    entity: &Term,
    attr: Option<&Term>,
    value: Option<&Term>,
    row: &Row,
) -> Vec<Row> {
    let candidates: Vec<EntityRef<'_>> = match resolve(entity, row) {
        Some(v) => EntityId::from_value(&v)
            .and_then(|id| db.entity(id))
            .into_iter()
            .collect(),
        None => db.entities().collect(),
    };

    let mut out = Vec::new();
    for ent in candidates {
        let Some(base) = unify(row, entity, &ent.id().as_value()) else {
            continue;
        };

        let Some(attr) = attr else {
            if ent.attrs().next().is_some() {
                out.push(base);
            }
            continue;
        };

        let pairs: Vec<(&str, &[Value])> = match resolve(attr, &base) {
            Some(Value::Str(name)) => ent
                .attrs()
                .filter(|(a, _)| *a == name.as_str())
                .collect(),
            Some(_) => Vec::new(),
            None => ent.attrs().collect(),
        };

        for (name, values) in pairs {
            let Some(with_attr) = unify(&base, attr, &Value::Str(name.to_string())) else {
                continue;
            };
            match value {
                None => out.push(with_attr),
                Some(term) => {
                    out.extend(values.iter().filter_map(|v| unify(&with_attr, term, v)));
                }
            }
        }
    }
    out
}

fn test_predicate(op: PredicateOp, args: &[Term], row: &Row) -> bool {
    let (Some(a), Some(b)) = (
        args.first().and_then(|t| resolve(t, row)),
        args.get(1).and_then(|t| resolve(t, row)),
    ) else {
        return false;
    };

    use std::cmp::Ordering::*;
    match op {
        PredicateOp::Eq => a == b,
        PredicateOp::Ne => a != b,
        PredicateOp::Lt => a.compare(&b) == Some(Less),
        PredicateOp::Gt => a.compare(&b) == Some(Greater),
        PredicateOp::Le => matches!(a.compare(&b), Some(Less | Equal)),
        PredicateOp::Ge => matches!(a.compare(&b), Some(Greater | Equal)),
    }
}

fn apply_function(op: FunctionOp, args: &[Term], row: &Row) -> Option<Value> {
    let values = args
        .iter()
        .map(|t| resolve(t, row))
        .collect::<Option<Vec<_>>>()?;
    let (first, rest) = values.split_first()?;

    rest.iter().try_fold(first.clone(), |acc, next| match op {
        FunctionOp::Min => match acc.compare(next)? {
            std::cmp::Ordering::Greater => Some(next.clone()),
            _ => Some(acc),
        },
        FunctionOp::Max => match acc.compare(next)? {
            std::cmp::Ordering::Less => Some(next.clone()),
            _ => Some(acc),
        },
        _ => arithmetic(op, &acc, next),
    })
}

fn arithmetic(op: FunctionOp, a: &Value, b: &Value) -> Option<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => match op {
            FunctionOp::Add => x.checked_add(*y),
            FunctionOp::Sub => x.checked_sub(*y),
            FunctionOp::Mul => x.checked_mul(*y),
            _ => None,
        }
        .map(Value::Int),
        _ => {
            let x = as_float(a)?;
            let y = as_float(b)?;
            match op {
                FunctionOp::Add => Some(Value::Float(x + y)),
                FunctionOp::Sub => Some(Value::Float(x - y)),
                FunctionOp::Mul => Some(Value::Float(x * y)),
                _ => None,
            }
        }
    }
}

fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{EntityIds, Record};
    use crate::schema::Schema;

    fn db_with(records: Vec<Record>) -> Db {
        let mut db = Db::new(Schema::new().many("tag"));
        let mut ids = EntityIds::new();
        for r in records {
            db.insert(ids.next_id(), r).unwrap();
        }
        db
    }

    fn act(actor: &str, target: &str, tag: &str) -> Record {
        Record::new()
            .with("actor", actor)
            .with("target", target)
            .with("tag", tag)
    }

    #[test]
    fn test_empty_store_yields_nothing() {
        let db = Db::new(Schema::new());
        let p = SiftingPattern::compile("any", &["?e actor ?a"]).unwrap();
        assert!(db.query(&p).is_empty());
        assert!(p.matches(&db).is_empty());
    }

    #[test]
    fn test_join_on_shared_variable() {
        let db = db_with(vec![act("A", "B", "rude"), act("B", "A", "rude"), act("C", "A", "nice")]);
        let p = SiftingPattern::compile(
            "mutual",
            &["?e1 actor ?a", "?e1 target ?b", "?e2 actor ?b", "?e2 target ?a"],
        )
        .unwrap();
        let matches = p.matches(&db);
        assert_eq!(matches.len(), 2);
        assert!(matches
            .iter()
            .any(|m| m.get("a") == Some(&Value::from("A")) && m.get("b") == Some(&Value::from("B"))));
    }

    #[test]
    fn test_duplicate_tuples_collapse() {
        let db = db_with(vec![
            Record::new().with("actor", "A").with_all("tag", ["rude", "flirty"]),
        ]);
        let p = SiftingPattern::compile("actors", &["?e actor ?a", "?e tag ?t", "[?e2 actor ?a]"])
            .unwrap();
        // ?t is exported, so two distinct tuples
        assert_eq!(db.query(&p).len(), 2);

        let p = SiftingPattern::compile("actors", &["?e actor ?a", "(or [?e tag rude] [?e tag flirty])"])
            .unwrap();
        assert_eq!(db.query(&p).len(), 1);
    }

    #[test]
    fn test_not_join_with_ordering() {
        // ids: 1 A->B flirty, 2 A->B flirty, 3 B->A flirty
        let db = db_with(vec![
            act("A", "B", "flirty"),
            act("A", "B", "flirty"),
            act("B", "A", "flirty"),
        ]);
        let p = SiftingPattern::compile(
            "crush",
            &[
                "?e1 actor ?a",
                "?e1 target ?b",
                "?e1 tag flirty",
                "?e2 actor ?a",
                "?e2 target ?b",
                "?e2 tag flirty",
                "(< ?e1 ?e2)",
                "(not-join [?a ?b ?e2] [?e3 actor ?b] [?e3 target ?a] [?e3 tag flirty] [(> ?e3 ?e2)])",
            ],
        )
        .unwrap();
        assert!(p.matches(&db).is_empty());

        // Reply came before the second advance: still unrequited.
        let db = db_with(vec![
            act("A", "B", "flirty"),
            act("B", "A", "flirty"),
            act("A", "B", "flirty"),
        ]);
        let matches = p.matches(&db);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("e1"), Some(&Value::Int(1)));
        assert_eq!(matches[0].get("e2"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_plain_not() {
        let db = db_with(vec![act("A", "B", "rude"), act("C", "D", "rude"), act("D", "C", "nice")]);
        let p = SiftingPattern::compile(
            "unanswered",
            &["?e actor ?a", "?e target ?b", "(not [?r actor ?b] [?r target ?a])"],
        )
        .unwrap();
        let matches = p.matches(&db);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("a"), Some(&Value::from("A")));
    }

    #[test]
    fn test_function_and_predicates() {
        let db = db_with(vec![
            Record::new().with("day", 3i64),
            Record::new().with("day", 4i64),
            Record::new().with("day", 9i64),
        ]);
        let p = SiftingPattern::compile(
            "consecutive",
            &["?e1 day ?d1", "(+ ?d1 1) ?d2", "?e2 day ?d2"],
        )
        .unwrap();
        let matches = p.matches(&db);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("d1"), Some(&Value::Int(3)));

        let p = SiftingPattern::compile("late", &["?e day ?d", "(>= ?d 4)"]).unwrap();
        assert_eq!(p.matches(&db).len(), 2);
    }

    #[test]
    fn test_variable_attribute() {
        let db = db_with(vec![Record::new().with("actor", "A").with("place", "B1")]);
        let p = SiftingPattern::compile("attrs", &["?e ?attr A"]).unwrap();
        let matches = p.matches(&db);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("attr"), Some(&Value::from("actor")));
    }

    #[test]
    fn test_entity_only_clause() {
        let db = db_with(vec![Record::new().with("actor", "A"), Record::new().with("actor", "B")]);
        let p = SiftingPattern::compile("all", &["?e"]).unwrap();
        assert_eq!(p.matches(&db).len(), 2);
    }
}
