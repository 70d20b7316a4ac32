//! Sifting pattern compiler
//!
//! A pattern is an ordered list of clause strings. Each line is either a
//! *simple* clause of one to three terms (`?e1 actor ?a`), or a *complex*
//! clause opening with `(`:
//!
//! ```text
//! ?e1 actionType chat
//! ?e1 tag rude
//! (< ?e1 ?e2)
//! (+ ?day 1) ?nextDay
//! (or [?e tag rude] [?e tag flirty])
//! (not [?e target ?a])
//! (not-join [?a ?b ?e2] [?e3 actor ?b] [?e3 target ?a] [(> ?e3 ?e2)])
//! ```
//!
//! Bare words that are not variables, `true`/`false`/`nil` or numbers are
//! string literals; quote them when they contain spaces.
//!
//! Compilation parses every line into a [`Clause`], checks that predicates
//! and negations only use variables bound by an earlier clause, and computes
//! the exported variable list: every variable in first-occurrence order,
//! minus the ones that only ever occur inside `or`, `not` or `not-join`.

use std::collections::HashSet;
use std::fmt;

use crate::error::PatternError;
use crate::reader::{read_all, Sexp};
use crate::value::Value;

/// A clause position: either a logic variable or a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Var(String),
    Const(Value),
}

impl Term {
    pub fn var_name(&self) -> Option<&str> {
        match self {
            Term::Var(name) => Some(name),
            Term::Const(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "?{}", name),
            Term::Const(Value::Str(s)) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            Term::Const(v) => write!(f, "{}", v),
        }
    }
}

/// Binary comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl PredicateOp {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "<" => PredicateOp::Lt,
            ">" => PredicateOp::Gt,
            "<=" => PredicateOp::Le,
            ">=" => PredicateOp::Ge,
            "=" => PredicateOp::Eq,
            "!=" | "not=" => PredicateOp::Ne,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PredicateOp::Lt => "<",
            PredicateOp::Gt => ">",
            PredicateOp::Le => "<=",
            PredicateOp::Ge => ">=",
            PredicateOp::Eq => "=",
            PredicateOp::Ne => "!=",
        }
    }
}

/// Functions whose result is bound to a fresh variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOp {
    Add,
    Sub,
    Mul,
    Min,
    Max,
}

impl FunctionOp {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "+" => FunctionOp::Add,
            "-" => FunctionOp::Sub,
            "*" => FunctionOp::Mul,
            "min" => FunctionOp::Min,
            "max" => FunctionOp::Max,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            FunctionOp::Add => "+",
            FunctionOp::Sub => "-",
            FunctionOp::Mul => "*",
            FunctionOp::Min => "min",
            FunctionOp::Max => "max",
        }
    }
}

/// One normalized clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `[entity attr? value?]`
    Simple {
        entity: Term,
        attr: Option<Term>,
        value: Option<Term>,
    },
    /// Union of branches. Variables only used inside stay local.
    Or(Vec<Clause>),
    /// Conjunction; used for multi-clause `or` branches.
    And(Vec<Clause>),
    /// Drops bindings for which every inner clause can be satisfied.
    Not(Vec<Clause>),
    /// Like `Not`, but only `join_vars` are carried into the inner scope.
    NotJoin {
        join_vars: Vec<String>,
        clauses: Vec<Clause>,
    },
    Predicate {
        op: PredicateOp,
        args: Vec<Term>,
    },
    Function {
        op: FunctionOp,
        args: Vec<Term>,
        binding: String,
    },
}

impl Clause {
    /// Every variable referenced by this clause, in order of appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk_vars(false, &mut |name, _| {
            if !out.iter().any(|v: &String| v == name) {
                out.push(name.to_string());
            }
        });
        out
    }

    /// Visits each variable reference with a flag telling whether the
    /// reference sits inside an `or`/`not`/`not-join` scope.
    fn walk_vars(&self, hidden: bool, visit: &mut dyn FnMut(&str, bool)) {
        match self {
            Clause::Simple {
                entity,
                attr,
                value,
            } => {
                for term in std::iter::once(entity).chain(attr).chain(value) {
                    if let Some(name) = term.var_name() {
                        visit(name, hidden);
                    }
                }
            }
            Clause::Predicate { args, .. } => {
                for name in args.iter().filter_map(Term::var_name) {
                    visit(name, hidden);
                }
            }
            Clause::Function { args, binding, .. } => {
                for name in args.iter().filter_map(Term::var_name) {
                    visit(name, hidden);
                }
                visit(binding, hidden);
            }
            Clause::And(clauses) => {
                for c in clauses {
                    c.walk_vars(hidden, visit);
                }
            }
            Clause::Or(clauses) | Clause::Not(clauses) => {
                for c in clauses {
                    c.walk_vars(true, visit);
                }
            }
            Clause::NotJoin { join_vars, clauses } => {
                for name in join_vars {
                    visit(name, true);
                }
                for c in clauses {
                    c.walk_vars(true, visit);
                }
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, clauses: &[Clause]) -> fmt::Result {
    for c in clauses {
        write!(f, " {}", c)?;
    }
    Ok(())
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Simple {
                entity,
                attr,
                value,
            } => {
                write!(f, "[{}", entity)?;
                if let Some(a) = attr {
                    write!(f, " {}", a)?;
                }
                if let Some(v) = value {
                    write!(f, " {}", v)?;
                }
                write!(f, "]")
            }
            Clause::Or(cs) => {
                write!(f, "(or")?;
                write_joined(f, cs)?;
                write!(f, ")")
            }
            Clause::And(cs) => {
                write!(f, "(and")?;
                write_joined(f, cs)?;
                write!(f, ")")
            }
            Clause::Not(cs) => {
                write!(f, "(not")?;
                write_joined(f, cs)?;
                write!(f, ")")
            }
            Clause::NotJoin { join_vars, clauses } => {
                let vars: Vec<String> = join_vars.iter().map(|v| format!("?{}", v)).collect();
                write!(f, "(not-join [{}]", vars.join(" "))?;
                write_joined(f, clauses)?;
                write!(f, ")")
            }
            Clause::Predicate { op, args } => {
                write!(f, "[({}", op.symbol())?;
                for a in args {
                    write!(f, " {}", a)?;
                }
                write!(f, ")]")
            }
            Clause::Function { op, args, binding } => {
                write!(f, "[({}", op.symbol())?;
                for a in args {
                    write!(f, " {}", a)?;
                }
                write!(f, ") ?{}]", binding)
            }
        }
    }
}

/// Variable → value bindings for one result tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    bindings: Vec<(String, Value)>,
}

impl Match {
    pub fn get(&self, var: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A compiled, immutable sifting pattern.
#[derive(Debug, Clone)]
pub struct SiftingPattern {
    name: String,
    source: Vec<String>,
    clauses: Vec<Clause>,
    lvars: Vec<String>,
}

impl SiftingPattern {
    /// Compiles `lines` into a pattern, rejecting it on the first bad clause.
    pub fn compile<S: AsRef<str>>(
        name: impl Into<String>,
        lines: &[S],
    ) -> Result<Self, PatternError> {
        let source: Vec<String> = lines
            .iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if source.is_empty() {
            return Err(PatternError::Empty);
        }

        let clauses = source
            .iter()
            .map(|line| parse_line(line))
            .collect::<Result<Vec<_>, _>>()?;

        let mut bound = HashSet::new();
        for (clause, line) in clauses.iter().zip(&source) {
            check_bindings(clause, &mut bound, line)?;
        }

        let lvars = exported_vars(&clauses);
        if lvars.is_empty() {
            return Err(PatternError::NoOutputVariables);
        }

        Ok(Self {
            name: name.into(),
            source,
            clauses,
            lvars,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The clause lines as written.
    pub fn source(&self) -> &[String] {
        &self.source
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Exported variables; index `i` names position `i` of every tuple.
    pub fn lvars(&self) -> &[String] {
        &self.lvars
    }

    pub fn var_index(&self, var: &str) -> Option<usize> {
        self.lvars.iter().position(|v| v == var)
    }

    /// Datalog rendering of the whole query, for logs.
    pub fn query_text(&self) -> String {
        let find: Vec<String> = self.lvars.iter().map(|v| format!("?{}", v)).collect();
        let wheres: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        format!("[:find {} :where {}]", find.join(" "), wheres.join(" "))
    }

    /// Pairs a raw tuple with the exported variable names.
    pub fn bind(&self, tuple: &[Value]) -> Match {
        Match {
            bindings: self
                .lvars
                .iter()
                .cloned()
                .zip(tuple.iter().cloned())
                .collect(),
        }
    }
}

fn exported_vars(clauses: &[Clause]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut exported: HashSet<String> = HashSet::new();
    for clause in clauses {
        clause.walk_vars(false, &mut |name, hidden| {
            if !order.iter().any(|v| v == name) {
                order.push(name.to_string());
            }
            if !hidden {
                exported.insert(name.to_string());
            }
        });
    }
    order.retain(|v| exported.contains(v));
    order
}

fn check_bindings(
    clause: &Clause,
    bound: &mut HashSet<String>,
    line: &str,
) -> Result<(), PatternError> {
    let require = |name: &str, bound: &HashSet<String>| {
        if bound.contains(name) {
            Ok(())
        } else {
            Err(PatternError::UnboundVariable {
                var: name.to_string(),
                clause: line.to_string(),
            })
        }
    };

    match clause {
        Clause::Simple { .. } => {
            bound.extend(clause.variables());
        }
        Clause::Predicate { args, .. } => {
            for name in args.iter().filter_map(Term::var_name) {
                require(name, bound)?;
            }
        }
        Clause::Function { args, binding, .. } => {
            for name in args.iter().filter_map(Term::var_name) {
                require(name, bound)?;
            }
            bound.insert(binding.clone());
        }
        Clause::And(clauses) => {
            for c in clauses {
                check_bindings(c, bound, line)?;
            }
        }
        Clause::Or(branches) => {
            let mut common: Option<HashSet<String>> = None;
            for branch in branches {
                let mut inner = bound.clone();
                check_bindings(branch, &mut inner, line)?;
                let added: HashSet<String> = inner.difference(bound).cloned().collect();
                common = Some(match common {
                    Some(c) => c.intersection(&added).cloned().collect(),
                    None => added,
                });
            }
            bound.extend(common.unwrap_or_default());
        }
        Clause::Not(clauses) => {
            if !clause.variables().iter().any(|v| bound.contains(v)) {
                return Err(PatternError::DisconnectedNegation {
                    clause: line.to_string(),
                });
            }
            let mut inner = bound.clone();
            for c in clauses {
                check_bindings(c, &mut inner, line)?;
            }
        }
        Clause::NotJoin { join_vars, clauses } => {
            for name in join_vars {
                require(name, bound)?;
            }
            let mut inner: HashSet<String> = join_vars.iter().cloned().collect();
            for c in clauses {
                check_bindings(c, &mut inner, line)?;
            }
        }
    }
    Ok(())
}

fn syntax(message: impl Into<String>, line: &str) -> PatternError {
    PatternError::Syntax {
        message: message.into(),
        clause: line.to_string(),
    }
}

fn parse_line(line: &str) -> Result<Clause, PatternError> {
    let forms = read_all(line).map_err(|m| syntax(m, line))?;

    if line.starts_with('(') {
        match forms.as_slice() {
            [Sexp::List(items)] => parse_list(items, None, line),
            [Sexp::List(items), result] => parse_list(items, Some(result), line),
            _ => Err(syntax("expected a single parenthesized clause", line)),
        }
    } else if line.starts_with('[') {
        match forms.as_slice() {
            [Sexp::Vector(items)] => parse_vector(items, line),
            _ => Err(syntax("expected a single bracketed clause", line)),
        }
    } else {
        parse_simple(&forms, line)
    }
}

fn parse_form(form: &Sexp, line: &str) -> Result<Clause, PatternError> {
    match form {
        Sexp::Vector(items) => parse_vector(items, line),
        Sexp::List(items) => parse_list(items, None, line),
        _ => Err(syntax("expected a clause inside complex clause", line)),
    }
}

fn parse_vector(items: &[Sexp], line: &str) -> Result<Clause, PatternError> {
    match items {
        [Sexp::List(call)] => parse_list(call, None, line),
        [Sexp::List(call), result] => parse_list(call, Some(result), line),
        _ => parse_simple(items, line),
    }
}

fn parse_simple(items: &[Sexp], line: &str) -> Result<Clause, PatternError> {
    if items.is_empty() || items.len() > 3 {
        return Err(PatternError::BadArity {
            count: items.len(),
            clause: line.to_string(),
        });
    }
    let mut terms = items
        .iter()
        .map(|item| parse_term(item, line))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let entity = terms
        .next()
        .ok_or_else(|| syntax("missing entity term", line))?;
    Ok(Clause::Simple {
        entity,
        attr: terms.next(),
        value: terms.next(),
    })
}

fn parse_clauses(items: &[Sexp], line: &str) -> Result<Vec<Clause>, PatternError> {
    if items.is_empty() {
        return Err(syntax("complex clause needs at least one inner clause", line));
    }
    items.iter().map(|item| parse_form(item, line)).collect()
}

fn parse_list(items: &[Sexp], result: Option<&Sexp>, line: &str) -> Result<Clause, PatternError> {
    let head = match items.first() {
        Some(Sexp::Atom(head)) => head.as_str(),
        _ => return Err(syntax("complex clause must start with a symbol", line)),
    };
    let rest = &items[1..];

    let scoped = matches!(head, "or" | "and" | "not" | "not-join");
    if scoped && result.is_some() {
        return Err(syntax(format!("`{}` cannot bind a result", head), line));
    }

    match head {
        "or" => Ok(Clause::Or(parse_clauses(rest, line)?)),
        "and" => Ok(Clause::And(parse_clauses(rest, line)?)),
        "not" => Ok(Clause::Not(parse_clauses(rest, line)?)),
        "not-join" => {
            let join_vars = match rest.first() {
                Some(Sexp::Vector(vars)) => vars
                    .iter()
                    .map(|v| match parse_term(v, line)? {
                        Term::Var(name) => Ok(name),
                        Term::Const(_) => Err(syntax("not-join binds only variables", line)),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(syntax("not-join needs a [?var ...] vector", line)),
            };
            Ok(Clause::NotJoin {
                join_vars,
                clauses: parse_clauses(&rest[1..], line)?,
            })
        }
        op => {
            let args = rest
                .iter()
                .map(|a| parse_term(a, line))
                .collect::<Result<Vec<_>, _>>()?;
            match result {
                None => {
                    let op = PredicateOp::parse(op).ok_or_else(|| {
                        if FunctionOp::parse(op).is_some() {
                            syntax(format!("function `{}` needs a result variable", op), line)
                        } else {
                            PatternError::UnknownOperator {
                                op: op.to_string(),
                                clause: line.to_string(),
                            }
                        }
                    })?;
                    if args.len() != 2 {
                        return Err(syntax(format!("`{}` takes two arguments", op.symbol()), line));
                    }
                    Ok(Clause::Predicate { op, args })
                }
                Some(result) => {
                    let op = FunctionOp::parse(op).ok_or_else(|| PatternError::UnknownOperator {
                        op: op.to_string(),
                        clause: line.to_string(),
                    })?;
                    if args.len() < 2 {
                        return Err(syntax(
                            format!("`{}` takes at least two arguments", op.symbol()),
                            line,
                        ));
                    }
                    let binding = match parse_term(result, line)? {
                        Term::Var(name) => name,
                        Term::Const(_) => {
                            return Err(syntax("function result must be a variable", line))
                        }
                    };
                    Ok(Clause::Function { op, args, binding })
                }
            }
        }
    }
}

fn parse_term(item: &Sexp, line: &str) -> Result<Term, PatternError> {
    match item {
        Sexp::Quoted(s) => Ok(Term::Const(Value::Str(s.clone()))),
        Sexp::Atom(token) => parse_atom(token, line),
        _ => Err(syntax("nested clause where a term was expected", line)),
    }
}

fn parse_atom(token: &str, line: &str) -> Result<Term, PatternError> {
    if let Some(name) = token.strip_prefix('?') {
        if !is_var_name(name) {
            return Err(PatternError::InvalidVariable {
                token: token.to_string(),
                clause: line.to_string(),
            });
        }
        return Ok(Term::Var(name.to_string()));
    }

    let value = match token {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "nil" => Value::Nil,
        _ if looks_numeric(token) => match token.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => match token.parse::<f64>() {
                Ok(x) => Value::Float(x),
                Err(_) => Value::Str(token.to_string()),
            },
        },
        _ => Value::Str(token.to_string()),
    };
    Ok(Term::Const(value))
}

fn is_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn looks_numeric(token: &str) -> bool {
    let digits = token.trim_start_matches(|c| c == '-' || c == '+');
    let digits = digits.strip_prefix('.').unwrap_or(digits);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(lines: &[&str]) -> Result<SiftingPattern, PatternError> {
        SiftingPattern::compile("test", lines)
    }

    #[test]
    fn test_simple_terms() {
        let p = compile(&[r#"?e actor "C1""#, "?e day 3", "?e seen true", "?e weight 0.5"]).unwrap();
        assert_eq!(
            p.clauses()[0],
            Clause::Simple {
                entity: Term::Var("e".into()),
                attr: Some(Term::Const(Value::from("actor"))),
                value: Some(Term::Const(Value::from("C1"))),
            }
        );
        match &p.clauses()[1] {
            Clause::Simple { value, .. } => assert_eq!(value, &Some(Term::Const(Value::Int(3)))),
            other => panic!("unexpected {:?}", other),
        }
        match &p.clauses()[2] {
            Clause::Simple { value, .. } => {
                assert_eq!(value, &Some(Term::Const(Value::Bool(true))))
            }
            other => panic!("unexpected {:?}", other),
        }
        match &p.clauses()[3] {
            Clause::Simple { value, .. } => {
                assert_eq!(value, &Some(Term::Const(Value::Float(0.5))))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_repeated_variable_exported_once_in_order() {
        let p = compile(&["?e1 actor ?a", "?e1 target ?b", "?e2 actor ?b", "?e2 target ?a"])
            .unwrap();
        assert_eq!(p.lvars(), &["e1", "a", "b", "e2"]);
    }

    #[test]
    fn test_scoped_only_variables_excluded() {
        let p = compile(&[
            "?e1 actor ?a",
            "(or [?e1 tag rude] [?e1 tag ?anyTag])",
            "(not [?x target ?a])",
            "(not-join [?e1] [?y action ?e1])",
        ])
        .unwrap();
        assert_eq!(p.lvars(), &["e1", "a"]);
    }

    #[test]
    fn test_shared_variable_keeps_first_position() {
        let p = compile(&["?e tag ?t", "(not [?e target ?who])", "?e actor ?who"]).unwrap();
        assert_eq!(p.lvars(), &["e", "t", "who"]);
    }

    #[test]
    fn test_bad_variable_rejected() {
        let err = compile(&["?e actor ?1abc"]).unwrap_err();
        assert!(matches!(err, PatternError::InvalidVariable { .. }));
        let err = compile(&["? actor x"]).unwrap_err();
        assert!(matches!(err, PatternError::InvalidVariable { .. }));
    }

    #[test]
    fn test_arity_rejected() {
        let err = compile(&["?e actor ?a extra"]).unwrap_err();
        assert!(matches!(err, PatternError::BadArity { count: 4, .. }));
        let err = compile(&["[]"]).unwrap_err();
        assert!(matches!(err, PatternError::BadArity { count: 0, .. }));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = compile(&["?e day ?d", "(frobnicate ?d 3)"]).unwrap_err();
        assert!(matches!(err, PatternError::UnknownOperator { .. }));
    }

    #[test]
    fn test_predicate_needs_bound_vars() {
        let err = compile(&["(< ?e1 ?e2)", "?e1 actor ?a", "?e2 actor ?a"]).unwrap_err();
        assert!(matches!(err, PatternError::UnboundVariable { .. }));
    }

    #[test]
    fn test_not_join_vars_must_be_bound() {
        let err = compile(&["?e actor ?a", "(not-join [?b] [?x actor ?b])"]).unwrap_err();
        assert!(matches!(err, PatternError::UnboundVariable { .. }));
    }

    #[test]
    fn test_disconnected_not_rejected() {
        let err = compile(&["?e actor ?a", "(not [?x tag rude])"]).unwrap_err();
        assert!(matches!(err, PatternError::DisconnectedNegation { .. }));
    }

    #[test]
    fn test_only_hidden_vars_is_error() {
        let err = compile(&["(not [?x tag rude])"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_function_binding() {
        let p = compile(&["?e day ?d", "(+ ?d 1) ?next"]).unwrap();
        assert_eq!(p.lvars(), &["e", "d", "next"]);
        assert!(compile(&["?e day ?d", "(+ ?d 1)"]).is_err());
    }

    #[test]
    fn test_normalized_rendering() {
        let p = compile(&[
            "?e1 tag rude",
            "?e2 tag rude",
            "(< ?e1 ?e2)",
            "(not-join [?e2] [?e3 tag flirty] [(> ?e3 ?e2)])",
        ])
        .unwrap();
        assert_eq!(p.clauses()[0].to_string(), r#"[?e1 "tag" "rude"]"#);
        assert_eq!(p.clauses()[2].to_string(), "[(< ?e1 ?e2)]");
        assert_eq!(
            p.clauses()[3].to_string(),
            r#"(not-join [?e2] [?e3 "tag" "flirty"] [(> ?e3 ?e2)])"#
        );
        assert!(p.query_text().starts_with("[:find ?e1 ?e2 :where"));
    }

    #[test]
    fn test_bind_positions() {
        let p = compile(&["?e actor ?a"]).unwrap();
        let m = p.bind(&[Value::Int(4), Value::from("C2")]);
        assert_eq!(m.get("a"), Some(&Value::from("C2")));
        assert_eq!(m.get("e"), Some(&Value::Int(4)));
        assert_eq!(p.var_index("a"), Some(1));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let p = compile(&["", "?e actor ?a", "   "]).unwrap();
        assert_eq!(p.source().len(), 1);
        assert_eq!(compile(&[""]).unwrap_err(), PatternError::Empty);
    }
}
