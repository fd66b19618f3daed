//! Arguments and their comparison
//!
//! A `Structure` pairs a conclusion with the defeasible rules some derivation
//! of it needs. The `Comparator` orders structures of one ground program by
//! generalized specificity, falling back to rule salience when two
//! structures are equi-specific.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use log::trace;

use crate::derivation::RuleIndex;
use crate::program::Program;
use crate::rule::{Rule, RuleKind};
use crate::term::Literal;

/// An argument: a conclusion and the defeasible rules supporting it.
///
/// A structure with no rules is strict: its conclusion follows from strict
/// knowledge alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Structure {
    conclusion: Literal,
    rules: BTreeSet<Rule>,
}

impl Structure {
    /// Creates a structure.
    pub fn new(conclusion: Literal, rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            conclusion,
            rules: rules.into_iter().collect(),
        }
    }

    /// The supported literal.
    pub fn conclusion(&self) -> &Literal {
        &self.conclusion
    }

    /// The defeasible rules used.
    pub fn rules(&self) -> &BTreeSet<Rule> {
        &self.rules
    }

    /// Returns `true` if no defeasible rule is needed.
    pub fn is_strict(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns `true` if every rule of `self` is a rule of `other`.
    pub fn is_subargument_of(&self, other: &Structure) -> bool {
        self.rules.is_subset(&other.rules)
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rules.is_empty() {
            return write!(f, "<∅, {}>", self.conclusion);
        }
        let rules: Vec<String> = self.rules.iter().map(|r| r.to_string()).collect();
        write!(f, "<{{{}}}, {}>", rules.join("; "), self.conclusion)
    }
}

/// Compares structures of one ground program.
///
/// Results depend only on the program, so they are cached for the lifetime
/// of the comparator.
#[derive(Debug)]
pub struct Comparator {
    /// Strict rules with a body, open to defeasible extensions.
    strict_rules: RuleIndex,
    /// Strict rules and facts, open to defeasible extensions.
    strict_knowledge: RuleIndex,
    /// Literals with a derivation in the program.
    derivable: Vec<Literal>,
    premises: HashMap<Literal, BTreeSet<Literal>>,
    activations: HashMap<(Structure, Literal), bool>,
    specificity: HashMap<(Structure, Structure), bool>,
}

impl Comparator {
    /// Creates a comparator for a ground program.
    pub fn new(program: &Program) -> Self {
        let strict_rules = RuleIndex::new(program.strict_rules(), RuleKind::Defeasible);
        let strict_knowledge = RuleIndex::new(
            program.rules().iter().filter(|r| r.is_strict()),
            RuleKind::Defeasible,
        );
        let derivable = RuleIndex::new(program.rules(), RuleKind::Defeasible)
            .closure()
            .into_iter()
            .collect();

        Self {
            strict_rules,
            strict_knowledge,
            derivable,
            premises: HashMap::new(),
            activations: HashMap::new(),
            specificity: HashMap::new(),
        }
    }

    /// Strict rules and facts of the program.
    pub fn strict_knowledge(&self) -> &RuleIndex {
        &self.strict_knowledge
    }

    /// Returns `true` if the rules of `structure` do not contradict the strict knowledge.
    ///
    /// Only consistent structures take part in the argumentation.
    pub fn is_consistent(&self, structure: &Structure) -> bool {
        structure.is_strict()
            || !self
                .strict_knowledge
                .extended(structure.rules())
                .is_contradictory()
    }

    /// Returns `true` if `first` and `second` cannot be told apart by specificity.
    ///
    /// That is the case when they use the same rules, or when each
    /// conclusion strictly follows from the other.
    pub fn equi_specific(&self, first: &Structure, second: &Structure) -> bool {
        if first.rules == second.rules {
            return true;
        }
        self.strict_knowledge
            .with_facts([first.conclusion()])
            .derives(second.conclusion())
            && self
                .strict_knowledge
                .with_facts([second.conclusion()])
                .derives(first.conclusion())
    }

    /// Returns `true` if `first` is strictly more specific than `second`.
    ///
    /// Every derivable literal `H` is tried as a premise. `H` counts for
    /// `first` when `second`'s rules are needed to reach its conclusion from
    /// `H` while `first`'s rules do not reach theirs; any `H` showing the
    /// symmetric situation rules `first` out.
    pub fn is_strictly_more_specific(&mut self, first: &Structure, second: &Structure) -> bool {
        if self.equi_specific(first, second) {
            return false;
        }

        let key = (first.clone(), second.clone());
        if let Some(&cached) = self.specificity.get(&key) {
            return cached;
        }

        let mut witnessed = false;
        let mut refuted = false;
        for premise in self.derivable.clone() {
            let first_alone = self.follows(&premise, first.conclusion());
            let second_alone = self.follows(&premise, second.conclusion());
            let first_active = self.activates(first, &premise);
            let second_active = self.activates(second, &premise);

            if first_active && !first_alone && !second_active {
                refuted = true;
                break;
            }
            if second_active && !second_alone && !first_active {
                witnessed = true;
            }
        }

        let result = witnessed && !refuted;
        trace!("{} more specific than {}: {}", first, second, result);
        self.specificity.insert(key, result);
        result
    }

    /// Returns `true` if `first` outranks `second` by salience.
    ///
    /// Both must use rules; every rule of `first` must be at least as salient
    /// as every rule of `second`, and one pair strictly more.
    pub fn is_more_salient(&self, first: &Structure, second: &Structure) -> bool {
        if first.rules.is_empty() || second.rules.is_empty() {
            return false;
        }

        let mut strictly = false;
        for a in &first.rules {
            for b in &second.rules {
                if a.salience() < b.salience() {
                    return false;
                }
                if a.salience() > b.salience() {
                    strictly = true;
                }
            }
        }
        strictly
    }

    /// Returns `true` if `first` should prevail over `second`.
    ///
    /// Salience decides between equi-specific structures, specificity otherwise.
    pub fn is_preferable(&mut self, first: &Structure, second: &Structure) -> bool {
        if self.equi_specific(first, second) {
            self.is_more_salient(first, second)
        } else {
            self.is_strictly_more_specific(first, second)
        }
    }

    /// Whether `literal` follows from the strict rules and `premise`.
    fn follows(&mut self, premise: &Literal, literal: &Literal) -> bool {
        let strict_rules = &self.strict_rules;
        self.premises
            .entry(premise.clone())
            .or_insert_with(|| strict_rules.with_facts([premise]).closure())
            .contains(literal)
    }

    /// Whether the structure's conclusion follows from its rules, the strict rules and `premise`.
    fn activates(&mut self, structure: &Structure, premise: &Literal) -> bool {
        let key = (structure.clone(), premise.clone());
        if let Some(&cached) = self.activations.get(&key) {
            return cached;
        }

        let result = self
            .strict_rules
            .extended(structure.rules.iter())
            .with_facts([premise])
            .closure()
            .contains(structure.conclusion());
        self.activations.insert(key, result);
        result
    }
}
