//! Rule definitions for the defeasible engine
//!
//! A rule concludes its head literal from the literals of its body. Strict
//! rules always hold; defeasible rules hold unless a better argument says
//! otherwise. A strict rule with no body is a fact and a defeasible rule with
//! no body is a presumption.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::term::Literal;

/// The strength of a `Rule`.
///
/// Kinds are ordered: `Strict < Defeasible`. A rule index built for a kind
/// admits every rule whose kind is less than or equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKind {
    /// Unconditionally valid given its body; never defeated.
    Strict,
    /// Typically valid given its body; can be defeated.
    Defeasible,
}

impl RuleKind {
    /// Returns the arrow used for this kind in program text.
    pub fn symbol(&self) -> &'static str {
        match self {
            RuleKind::Strict => "<-",
            RuleKind::Defeasible => "-<",
        }
    }

    /// Returns a human-readable description of the rule kind.
    pub fn description(&self) -> &'static str {
        match self {
            RuleKind::Strict => "Holds whenever its body holds",
            RuleKind::Defeasible => "Holds unless defeated by a preferable argument",
        }
    }

    /// Returns `true` if an index built for `self` admits rules of `kind`.
    pub fn admits(&self, kind: RuleKind) -> bool {
        kind <= *self
    }
}

/// A strict or defeasible rule.
///
/// The body is kept sorted and free of duplicates, so rules that differ only
/// in the order or repetition of body literals are the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rule {
    head: Literal,
    kind: RuleKind,
    body: Vec<Literal>,
    salience: i32,
}

impl Rule {
    /// Creates a new rule with salience 0.
    pub fn new(head: Literal, kind: RuleKind, body: impl IntoIterator<Item = Literal>) -> Self {
        let mut body: Vec<Literal> = body.into_iter().collect();
        body.sort();
        body.dedup();
        Self {
            head,
            kind,
            body,
            salience: 0,
        }
    }

    /// Creates a strict rule.
    pub fn strict(head: Literal, body: impl IntoIterator<Item = Literal>) -> Self {
        Self::new(head, RuleKind::Strict, body)
    }

    /// Creates a defeasible rule.
    pub fn defeasible(head: Literal, body: impl IntoIterator<Item = Literal>) -> Self {
        Self::new(head, RuleKind::Defeasible, body)
    }

    /// Creates a fact (strict, empty body).
    pub fn fact(head: Literal) -> Self {
        Self::new(head, RuleKind::Strict, Vec::new())
    }

    /// Creates a presumption (defeasible, empty body).
    pub fn presumption(head: Literal) -> Self {
        Self::new(head, RuleKind::Defeasible, Vec::new())
    }

    /// Starts a `RuleBuilder` for the given head.
    pub fn builder(head: Literal) -> RuleBuilder {
        RuleBuilder::new(head)
    }

    /// The concluded literal.
    pub fn head(&self) -> &Literal {
        &self.head
    }

    /// The rule kind.
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// The body literals, sorted.
    pub fn body(&self) -> &[Literal] {
        &self.body
    }

    /// Priority used to break ties between equi-specific arguments.
    pub fn salience(&self) -> i32 {
        self.salience
    }

    /// Returns a copy with another salience.
    pub fn with_salience(mut self, salience: i32) -> Self {
        self.salience = salience;
        self
    }

    /// Returns `true` for a strict rule.
    pub fn is_strict(&self) -> bool {
        self.kind == RuleKind::Strict
    }

    /// Returns `true` for a defeasible rule.
    pub fn is_defeasible(&self) -> bool {
        self.kind == RuleKind::Defeasible
    }

    /// Returns `true` for a strict rule with an empty body.
    pub fn is_fact(&self) -> bool {
        self.is_strict() && self.body.is_empty()
    }

    /// Returns `true` for a defeasible rule with an empty body.
    pub fn is_presumption(&self) -> bool {
        self.is_defeasible() && self.body.is_empty()
    }

    /// Returns `true` if the head and every body literal are ground.
    pub fn is_ground(&self) -> bool {
        self.head.is_ground() && self.body.iter().all(Literal::is_ground)
    }

    /// The head followed by the body literals.
    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        std::iter::once(&self.head).chain(self.body.iter())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() || self.is_defeasible() {
            write!(f, " {} ", self.kind.symbol())?;
        }
        for (i, literal) in self.body.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", literal)?;
        }
        f.write_str(".")
    }
}

/// A builder for creating `Rule`s using a fluent API.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    head: Literal,
    kind: RuleKind,
    body: Vec<Literal>,
    salience: i32,
}

impl RuleBuilder {
    /// Creates a new `RuleBuilder` for a strict rule with the given head.
    pub fn new(head: Literal) -> Self {
        Self {
            head,
            kind: RuleKind::Strict,
            body: Vec::new(),
            salience: 0,
        }
    }

    /// Makes the rule strict.
    pub fn strict(mut self) -> Self {
        self.kind = RuleKind::Strict;
        self
    }

    /// Makes the rule defeasible.
    pub fn defeasible(mut self) -> Self {
        self.kind = RuleKind::Defeasible;
        self
    }

    /// Adds a body literal.
    pub fn when(mut self, literal: Literal) -> Self {
        self.body.push(literal);
        self
    }

    /// Sets the salience of the rule.
    pub fn salience(mut self, salience: i32) -> Self {
        self.salience = salience;
        self
    }

    /// Builds and returns the final `Rule`.
    pub fn build(self) -> Rule {
        Rule::new(self.head, self.kind, self.body).with_salience(self.salience)
    }
}
