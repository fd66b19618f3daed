//! Programs: immutable collections of rules
//!
//! A `Program` is validated when it is built (its strict part must not be
//! contradictory) and computes its ground form lazily, once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use log::debug;

use crate::derivation::RuleIndex;
use crate::error::{Error, Result};
use crate::grounder::Grounder;
use crate::rule::{Rule, RuleKind};
use crate::term::{Atom, Literal};

/// Links the rules of a ground program back to the rules they were instantiated from.
#[derive(Debug, Clone)]
struct Provenance {
    source: Arc<[Rule]>,
    origins: Vec<usize>,
}

/// A deduplicated, sorted collection of rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct Program {
    rules: Arc<[Rule]>,
    provenance: Option<Provenance>,
    ground: OnceLock<Arc<Program>>,
}

impl Program {
    /// Creates a program from rules, rejecting contradictory strict knowledge.
    ///
    /// # Errors
    ///
    /// Returns `Error::ContradictoryProgram` if the strict rules and facts
    /// derive some literal together with its complement.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self> {
        let mut rules: Vec<Rule> = rules.into_iter().collect();
        rules.sort();
        rules.dedup();

        let program = Self::unchecked(rules, None);
        program.check_strict_core()?;
        debug!("Program accepted with {} rules", program.len());
        Ok(program)
    }

    /// Parses program text.
    pub fn parse(text: &str) -> Result<Self> {
        crate::parser::parse_program(text)
    }

    /// Builds a program from already normalized rules, without validation.
    pub(crate) fn unchecked(rules: Vec<Rule>, provenance: Option<(Arc<[Rule]>, Vec<usize>)>) -> Self {
        Self {
            rules: rules.into(),
            provenance: provenance.map(|(source, origins)| Provenance { source, origins }),
            ground: OnceLock::new(),
        }
    }

    /// Shared handle on the rules, used as provenance by derived programs.
    pub(crate) fn shared_rules(&self) -> Arc<[Rule]> {
        Arc::clone(&self.rules)
    }

    /// All rules, sorted.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the program has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns `true` if the program contains the rule.
    pub fn contains(&self, rule: &Rule) -> bool {
        self.rules.binary_search(rule).is_ok()
    }

    /// Strict rules with an empty body.
    pub fn facts(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_fact())
    }

    /// Defeasible rules with an empty body.
    pub fn presumptions(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_presumption())
    }

    /// Strict rules with a body.
    pub fn strict_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_strict() && !r.is_fact())
    }

    /// Defeasible rules with a body.
    pub fn defeasible_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .filter(|r| r.is_defeasible() && !r.is_presumption())
    }

    /// Returns `true` if the program has at least one fact.
    pub fn has_facts(&self) -> bool {
        self.facts().next().is_some()
    }

    /// The literals concluded by some rule.
    pub fn heads(&self) -> BTreeSet<&Literal> {
        self.rules.iter().map(Rule::head).collect()
    }

    /// Every literal occurring in a head or a body.
    pub fn literals(&self) -> BTreeSet<&Literal> {
        self.rules.iter().flat_map(Rule::literals).collect()
    }

    /// Returns `true` if every rule is ground.
    pub fn is_ground(&self) -> bool {
        self.rules.iter().all(Rule::is_ground)
    }

    /// Returns the ground form of the program, computing it on first use.
    ///
    /// A program that is already ground is its own ground form.
    pub fn ground_program(&self) -> &Program {
        if self.is_ground() {
            return self;
        }
        self.ground
            .get_or_init(|| Arc::new(Grounder::new().ground_unbounded(self)))
    }

    /// For a rule of a ground program, the rule it was instantiated from.
    ///
    /// Returns `None` when the rule is not part of this program or the program
    /// was not produced by grounding.
    pub fn source_of(&self, rule: &Rule) -> Option<&Rule> {
        let provenance = self.provenance.as_ref()?;
        let position = self.rules.binary_search(rule).ok()?;
        let origin = *provenance.origins.get(position)?;
        provenance.source.get(origin)
    }

    /// Grounds the strict part and fails if it derives a literal and its complement.
    fn check_strict_core(&self) -> Result<()> {
        let strict: Vec<Rule> = self.rules.iter().filter(|r| r.is_strict()).cloned().collect();
        let ground = if strict.iter().all(Rule::is_ground) {
            strict
        } else {
            let core = Program::unchecked(strict, None);
            Grounder::new().ground_unbounded(&core).rules().to_vec()
        };

        let index = RuleIndex::new(&ground, RuleKind::Strict);
        if let Some(literal) = index.contradiction() {
            return Err(Error::ContradictoryProgram {
                complement: literal.complement().to_string(),
                literal: literal.to_string(),
            });
        }
        Ok(())
    }
}

impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

impl Eq for Program {}

impl TryFrom<Vec<Rule>> for Program {
    type Error = Error;

    fn try_from(rules: Vec<Rule>) -> Result<Self> {
        Program::new(rules)
    }
}

impl From<Program> for Vec<Rule> {
    fn from(program: Program) -> Self {
        program.rules.to_vec()
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Program::parse(s)
    }
}

/// Groups rules by head atom, sorted, one per line.
fn section<'a>(rules: impl Iterator<Item = &'a Rule>) -> String {
    let mut grouped: BTreeMap<&Atom, BTreeSet<&Rule>> = BTreeMap::new();
    for rule in rules {
        grouped.entry(&rule.head().atom).or_default().insert(rule);
    }
    grouped
        .values()
        .flatten()
        .map(|rule| rule.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        let strict = section(self.strict_rules());
        if !strict.is_empty() {
            parts.push(format!("# Strict rules\n{}", strict));
        }

        let facts = section(self.facts());
        if !facts.is_empty() {
            parts.push(format!("# Facts\n{}", facts));
        }

        let defeasible: Vec<String> = [
            section(self.defeasible_rules()),
            section(self.presumptions()),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
        if !defeasible.is_empty() {
            parts.push(format!("# Defeasible knowledge\n{}", defeasible.join("\n")));
        }

        f.write_str(&parts.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIRDS: &str = "
        bird(X) <- chicken(X).
        bird(X) <- penguin(X).
        ~flies(X) <- penguin(X).
        chicken(tina).
        penguin(tweety).
        scared(tina).
        flies(X) -< bird(X).
        flies(X) -< chicken(X), scared(X).
        nests_in_trees(X) -< flies(X).
        ~flies(X) -< chicken(X).
    ";

    #[test]
    fn test_contradictory_facts_rejected() {
        let err = Program::parse("a. ~a.").unwrap_err();
        assert!(matches!(err, Error::ContradictoryProgram { .. }));
    }

    #[test]
    fn test_contradiction_through_variables_rejected() {
        let err = Program::parse("p(a). ~q(X) <- p(X). q(X) <- p(X).").unwrap_err();
        match err {
            Error::ContradictoryProgram { literal, complement } => {
                assert_eq!(literal, "q(a)");
                assert_eq!(complement, "~q(a)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defeasible_conflict_is_allowed() {
        let program = Program::parse("a -< b. ~a -< b. b.").unwrap();
        assert_eq!(program.len(), 3);
    }

    #[test]
    fn test_rules_are_deduplicated() {
        let program = Program::parse("a. a. b <- a. b <- a, a.").unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_categories() {
        let program = Program::parse(BIRDS).unwrap();
        assert_eq!(program.facts().count(), 3);
        assert_eq!(program.strict_rules().count(), 3);
        assert_eq!(program.defeasible_rules().count(), 4);
        assert_eq!(program.presumptions().count(), 0);
        assert!(!program.is_ground());
        assert!(program.has_facts());
    }

    #[test]
    fn test_ground_program_is_cached() {
        let program = Program::parse(BIRDS).unwrap();
        let first = program.ground_program() as *const Program;
        let second = program.ground_program() as *const Program;
        assert_eq!(first, second);
        assert!(program.ground_program().is_ground());
    }

    #[test]
    fn test_ground_program_of_ground_program_is_itself() {
        let program = Program::parse("a -< b. b.").unwrap();
        assert!(std::ptr::eq(program.ground_program(), &program));
    }

    #[test]
    fn test_provenance() {
        let program = Program::parse(BIRDS).unwrap();
        let ground = program.ground_program();
        let instance: Rule = "bird(tina) <- chicken(tina).".parse().unwrap();
        let source: Rule = "bird(X) <- chicken(X).".parse().unwrap();
        assert_eq!(ground.source_of(&instance), Some(&source));
        assert_eq!(program.source_of(&source), None);
    }

    #[test]
    fn test_display_sections() {
        let program = Program::parse("b <- a. a. c -< b. d -< .").unwrap();
        assert_eq!(
            program.to_string(),
            "# Strict rules\nb <- a.\n\n# Facts\na.\n\n# Defeasible knowledge\nc -< b.\nd -< ."
        );
    }

    #[test]
    fn test_serde_validates() {
        let program = Program::parse("a. b -< a.").unwrap();
        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(program, back);

        let bad = serde_json::to_string(&vec![
            "a.".parse::<Rule>().unwrap(),
            "~a.".parse::<Rule>().unwrap(),
        ])
        .unwrap();
        assert!(serde_json::from_str::<Program>(&bad).is_err());
    }
}
