//! Terms, atoms and literals.
//!
//! These are plain structural values: equality, hashing and ordering are
//! derived from their content, so two literals written the same way are the
//! same literal everywhere in the engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::rule::Rule;

/// A term appearing as an argument of an atom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Term {
    /// `true` or `false`.
    Boolean(bool),
    /// A signed integer constant.
    Integer(i64),
    /// A floating point constant.
    Real(f64),
    /// A symbolic constant, written as a lowercase identifier or a quoted string.
    String(String),
    /// A variable, written with a leading uppercase letter or underscore.
    Variable(String),
}

impl Term {
    /// Creates a symbolic constant.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::String(name.into())
    }

    /// Creates a variable.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Returns `true` if this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Returns `true` if a name would be read as a variable in program text.
    pub fn is_variable_name(name: &str) -> bool {
        name.chars()
            .next()
            .map(|c| c == '_' || c.is_ascii_uppercase())
            .unwrap_or(false)
    }

    /// Rank of the variant, used to order terms of different types.
    fn rank(&self) -> u8 {
        match self {
            Self::Boolean(_) => 0,
            Self::Integer(_) => 1,
            Self::Real(_) => 2,
            Self::String(_) => 3,
            Self::Variable(_) => 4,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Term {}

impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Boolean(b) => b.hash(state),
            Self::Integer(i) => i.hash(state),
            // total_cmp equality is bitwise equality
            Self::Real(f) => f.to_bits().hash(state),
            Self::String(s) | Self::Variable(s) => s.hash(state),
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Real(a), Self::Real(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Variable(a), Self::Variable(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => {
                let text = format!("{:?}", r);
                // Keep a fractional part so the value reads back as a real.
                match text.find(|c: char| c == 'e' || c == 'E') {
                    Some(pos) if !text[..pos].contains('.') => {
                        write!(f, "{}.0{}", &text[..pos], &text[pos..])
                    }
                    _ => f.write_str(&text),
                }
            }
            Self::String(s) => write_symbol(f, s),
            Self::Variable(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Term {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<&str> for Term {
    /// Reads the name the way program text does: uppercase or `_` initial is a variable.
    fn from(s: &str) -> Self {
        if Term::is_variable_name(s) {
            Self::Variable(s.to_string())
        } else {
            Self::String(s.to_string())
        }
    }
}

/// Writes a symbol bare when it reads back as an identifier, quoted otherwise.
fn write_symbol(f: &mut fmt::Formatter<'_>, symbol: &str) -> fmt::Result {
    if is_identifier(symbol) {
        f.write_str(symbol)
    } else if symbol.contains('"') {
        write!(f, "'{}'", symbol)
    } else {
        write!(f, "\"{}\"", symbol)
    }
}

/// Lowercase-initial identifier that is not a boolean keyword.
fn is_identifier(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    let starts_lower = chars.next().map(|c| c.is_ascii_lowercase()).unwrap_or(false);
    starts_lower
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !symbol.eq_ignore_ascii_case("true")
        && !symbol.eq_ignore_ascii_case("false")
}

/// A predicate applied to an ordered list of terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    /// Predicate name.
    pub functor: String,
    /// Arguments, in order.
    pub terms: Vec<Term>,
}

impl Atom {
    /// Creates a new atom.
    pub fn new(functor: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            functor: functor.into(),
            terms,
        }
    }

    /// Creates a zero-arity atom.
    pub fn proposition(functor: impl Into<String>) -> Self {
        Self::new(functor, Vec::new())
    }

    /// Number of arguments.
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if no argument is a variable.
    pub fn is_ground(&self) -> bool {
        !self.terms.iter().any(Term::is_variable)
    }

    /// Matches this atom, used as a pattern, against a ground atom.
    ///
    /// Returns the bindings of the pattern's variables, or `None` when the
    /// functors, arities or constants differ, or a repeated variable would
    /// need two different values.
    pub fn unify(&self, ground: &Atom) -> Option<Substitution> {
        if self.functor != ground.functor || self.arity() != ground.arity() {
            return None;
        }

        let mut subs = Substitution::new();
        for (pattern, value) in self.terms.iter().zip(&ground.terms) {
            match pattern {
                Term::Variable(name) => {
                    if !subs.bind(name, value.clone()) {
                        return None;
                    }
                }
                constant if constant != value => return None,
                _ => {}
            }
        }

        Some(subs)
    }

    /// Replaces bound variables with their values; unbound variables are kept.
    pub fn substitute(&self, subs: &Substitution) -> Atom {
        let terms = self
            .terms
            .iter()
            .map(|term| match term {
                Term::Variable(name) => subs.get(name).cloned().unwrap_or_else(|| term.clone()),
                other => other.clone(),
            })
            .collect();

        Atom::new(self.functor.clone(), terms)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_symbol(f, &self.functor)?;
        if !self.terms.is_empty() {
            f.write_str("(")?;
            for (i, term) in self.terms.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", term)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// An atom or its strong negation.
///
/// Literals order by atom first, so a literal sorts next to its complement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    /// The underlying atom.
    pub atom: Atom,
    /// `true` for `~atom`.
    pub negated: bool,
}

impl Literal {
    /// Creates a literal.
    pub fn new(negated: bool, atom: Atom) -> Self {
        Self { atom, negated }
    }

    /// Creates a positive literal.
    pub fn positive(atom: Atom) -> Self {
        Self::new(false, atom)
    }

    /// Creates a negated literal.
    pub fn negative(atom: Atom) -> Self {
        Self::new(true, atom)
    }

    /// The predicate name.
    pub fn functor(&self) -> &str {
        &self.atom.functor
    }

    /// The arguments.
    pub fn terms(&self) -> &[Term] {
        &self.atom.terms
    }

    /// Returns `true` if no argument is a variable.
    pub fn is_ground(&self) -> bool {
        self.atom.is_ground()
    }

    /// The same atom with the opposite polarity.
    pub fn complement(&self) -> Literal {
        Literal::new(!self.negated, self.atom.clone())
    }

    /// Matches this literal, used as a pattern, against a ground literal of the same polarity.
    pub fn unify(&self, ground: &Literal) -> Option<Substitution> {
        if self.negated != ground.negated {
            return None;
        }
        self.atom.unify(&ground.atom)
    }

    /// Applies a substitution to the atom.
    pub fn substitute(&self, subs: &Substitution) -> Literal {
        Literal::new(self.negated, self.atom.substitute(subs))
    }

    /// This literal as a strict rule with an empty body.
    pub fn as_fact(&self) -> Rule {
        Rule::fact(self.clone())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("~")?;
        }
        write!(f, "{}", self.atom)
    }
}

/// Variable bindings produced while matching patterns against ground literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Substitution {
    bindings: BTreeMap<String, Term>,
}

impl Substitution {
    /// Creates an empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a variable. Returns `false` if it is already bound to a different value.
    pub fn bind(&mut self, variable: impl Into<String>, value: Term) -> bool {
        let variable = variable.into();
        match self.bindings.get(&variable) {
            Some(bound) => *bound == value,
            None => {
                self.bindings.insert(variable, value);
                true
            }
        }
    }

    /// Gets the value bound to a variable.
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.bindings.get(variable)
    }

    /// Combines two substitutions, failing if a shared variable has conflicting values.
    pub fn join(&self, other: &Substitution) -> Option<Substitution> {
        let mut joined = self.clone();
        for (variable, value) in &other.bindings {
            if !joined.bind(variable.as_str(), value.clone()) {
                return None;
            }
        }
        Some(joined)
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over the bindings in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Term)> {
        self.bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn atom(functor: &str, terms: &[&str]) -> Atom {
        Atom::new(functor, terms.iter().map(|t| Term::from(*t)).collect())
    }

    #[test]
    fn test_term_variable_detection() {
        assert!(Term::from("X").is_variable());
        assert!(Term::from("_tmp").is_variable());
        assert!(!Term::from("tina").is_variable());
        assert!(Term::is_variable_name("Abc"));
        assert!(!Term::is_variable_name(""));
    }

    #[test]
    fn test_term_equality_and_hash() {
        let mut set = HashSet::new();
        set.insert(Term::Real(1.5));
        set.insert(Term::Real(1.5));
        set.insert(Term::Integer(1));
        set.insert(Term::Boolean(true));
        assert_eq!(set.len(), 3);
        assert_ne!(Term::Integer(1), Term::Real(1.0));
    }

    #[test]
    fn test_term_ordering_by_type() {
        let mut terms = vec![
            Term::variable("X"),
            Term::constant("a"),
            Term::Real(0.5),
            Term::Integer(3),
            Term::Boolean(false),
        ];
        terms.sort();
        assert_eq!(terms[0], Term::Boolean(false));
        assert_eq!(terms[4], Term::variable("X"));
    }

    #[test]
    fn test_term_display() {
        assert_eq!(Term::Real(2.0).to_string(), "2.0");
        assert_eq!(Term::Real(1e20).to_string(), "1.0e20");
        assert_eq!(Term::constant("tina").to_string(), "tina");
        assert_eq!(Term::constant("Hello world").to_string(), "\"Hello world\"");
        assert_eq!(Term::constant("true").to_string(), "\"true\"");
        assert_eq!(Term::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_unify_matching() {
        let pattern = atom("x", &[]);
        assert_eq!(pattern.unify(&atom("x", &[])), Some(Substitution::new()));
        assert_eq!(pattern.unify(&atom("y", &[])), None);
    }

    #[test]
    fn test_unify_binds_variables() {
        let pattern = Atom::new("x", vec![Term::variable("X"), Term::variable("Y")]);
        let ground = Atom::new("x", vec![Term::Integer(5), Term::constant("b")]);
        let subs = pattern.unify(&ground).unwrap();
        assert_eq!(subs.get("X"), Some(&Term::Integer(5)));
        assert_eq!(subs.get("Y"), Some(&Term::constant("b")));
    }

    #[test]
    fn test_unify_repeated_variable_conflict() {
        let pattern = Atom::new("x", vec![Term::variable("X"), Term::variable("X")]);
        let ground = Atom::new("x", vec![Term::Integer(5), Term::Integer(7)]);
        assert!(pattern.unify(&ground).is_none());

        let same = Atom::new("x", vec![Term::Integer(5), Term::Integer(5)]);
        assert_eq!(pattern.unify(&same).unwrap().len(), 1);
    }

    #[test]
    fn test_literal_unify_respects_polarity() {
        let pattern = Literal::negative(atom("flies", &["X"]));
        assert!(pattern.unify(&Literal::positive(atom("flies", &["tina"]))).is_none());
        assert!(pattern.unify(&Literal::negative(atom("flies", &["tina"]))).is_some());
    }

    #[test]
    fn test_literal_complement() {
        let lit = Literal::positive(atom("flies", &["tina"]));
        assert_eq!(lit.complement().to_string(), "~flies(tina)");
        assert_eq!(lit.complement().complement(), lit);
    }

    #[test]
    fn test_substitute_keeps_unbound() {
        let lit = Literal::positive(atom("p", &["X", "Y"]));
        let mut subs = Substitution::new();
        subs.bind("X", Term::constant("a"));
        let result = lit.substitute(&subs);
        assert_eq!(result.to_string(), "p(a, Y)");
        assert!(!result.is_ground());
    }

    #[test]
    fn test_substitution_join() {
        let mut left = Substitution::new();
        left.bind("X", Term::constant("a"));
        let mut right = Substitution::new();
        right.bind("Y", Term::constant("b"));
        assert_eq!(left.join(&right).unwrap().len(), 2);

        let mut conflicting = Substitution::new();
        conflicting.bind("X", Term::constant("c"));
        assert!(left.join(&conflicting).is_none());
    }
}
