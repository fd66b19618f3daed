//! Derivation search, contradiction and disagreement
//!
//! A `RuleIndex` maps every concluded literal to the ground rules supporting
//! it. `DerivationSearch` enumerates all derivations of a literal over an
//! index and memoizes them per literal.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::argument::Structure;
use crate::rule::{Rule, RuleKind};
use crate::term::Literal;

/// Ground rules indexed by head, restricted to a rule kind.
#[derive(Debug, Clone)]
pub struct RuleIndex {
    kind: RuleKind,
    by_head: BTreeMap<Literal, Vec<Rule>>,
}

impl RuleIndex {
    /// Indexes the rules admitted by `kind`.
    ///
    /// With `RuleKind::Strict` only strict rules and facts are kept; with
    /// `RuleKind::Defeasible` every rule is kept.
    pub fn new<'a>(rules: impl IntoIterator<Item = &'a Rule>, kind: RuleKind) -> Self {
        let mut index = Self {
            kind,
            by_head: BTreeMap::new(),
        };
        for rule in rules {
            index.insert(rule.clone());
        }
        index
    }

    fn insert(&mut self, rule: Rule) {
        if !self.kind.admits(rule.kind()) {
            return;
        }
        let rules = self.by_head.entry(rule.head().clone()).or_default();
        if let Err(position) = rules.binary_search(&rule) {
            rules.insert(position, rule);
        }
    }

    /// A copy of this index extended with the given rules.
    pub fn extended<'a>(&self, rules: impl IntoIterator<Item = &'a Rule>) -> Self {
        let mut index = self.clone();
        for rule in rules {
            index.insert(rule.clone());
        }
        index
    }

    /// A copy of this index with the given literals added as facts.
    pub fn with_facts<'a>(&self, literals: impl IntoIterator<Item = &'a Literal>) -> Self {
        let mut index = self.clone();
        for literal in literals {
            index.insert(literal.as_fact());
        }
        index
    }

    /// The rule kind this index admits.
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// The rules concluding `literal`.
    pub fn rules_for(&self, literal: &Literal) -> &[Rule] {
        self.by_head.get(literal).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if some rule concludes `literal`.
    pub fn contains_head(&self, literal: &Literal) -> bool {
        self.by_head.contains_key(literal)
    }

    /// The concluded literals, sorted.
    pub fn heads(&self) -> impl Iterator<Item = &Literal> {
        self.by_head.keys()
    }

    /// Every literal derivable from the index (its least fixpoint).
    pub fn closure(&self) -> BTreeSet<Literal> {
        let rules: Vec<&Rule> = self.by_head.values().flatten().collect();

        let mut waiting: HashMap<&Literal, Vec<usize>> = HashMap::new();
        let mut missing: Vec<usize> = Vec::with_capacity(rules.len());
        let mut agenda: Vec<&Literal> = Vec::new();
        for (i, rule) in rules.iter().enumerate() {
            missing.push(rule.body().len());
            if rule.body().is_empty() {
                agenda.push(rule.head());
            }
            for literal in rule.body() {
                waiting.entry(literal).or_default().push(i);
            }
        }

        let mut derived = BTreeSet::new();
        while let Some(literal) = agenda.pop() {
            if !derived.insert(literal.clone()) {
                continue;
            }
            for &i in waiting.get(literal).map(Vec::as_slice).unwrap_or(&[]) {
                missing[i] -= 1;
                if missing[i] == 0 {
                    agenda.push(rules[i].head());
                }
            }
        }
        derived
    }

    /// Returns `true` if `literal` is derivable from the index.
    pub fn derives(&self, literal: &Literal) -> bool {
        self.contains_head(literal) && self.closure().contains(literal)
    }

    /// The first derivable literal, in sorted order, whose complement is also derivable.
    pub fn contradiction(&self) -> Option<Literal> {
        let closure = self.closure();
        closure
            .iter()
            .find(|literal| closure.contains(&literal.complement()))
            .cloned()
    }

    /// Returns `true` if some literal and its complement are both derivable.
    pub fn is_contradictory(&self) -> bool {
        self.contradiction().is_some()
    }
}

/// Returns `true` if two literals cannot both hold.
///
/// They disagree when they are complements, or when adding both as facts to
/// the strict knowledge in `strict` makes it contradictory.
pub fn disagree(first: &Literal, second: &Literal, strict: &RuleIndex) -> bool {
    if first.complement() == *second {
        return true;
    }

    RuleIndex::new(strict.by_head.values().flatten(), RuleKind::Strict)
        .with_facts([first, second])
        .is_contradictory()
}

/// An ordered list of rules proving a literal, root first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Derivation {
    conclusion: Literal,
    rules: Vec<Rule>,
}

impl Derivation {
    fn from_steps(conclusion: &Literal, rules: Vec<Rule>) -> Self {
        Self {
            conclusion: conclusion.clone(),
            rules,
        }
    }

    /// The derived literal, head of the first rule.
    pub fn conclusion(&self) -> &Literal {
        &self.conclusion
    }

    /// The rules applied, root first.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns `true` if any rule used is defeasible.
    pub fn is_defeasible(&self) -> bool {
        self.rules.iter().any(Rule::is_defeasible)
    }

    /// The argument supported by this derivation: its defeasible rules.
    pub fn structure(&self) -> Structure {
        Structure::new(
            self.conclusion.clone(),
            self.rules.iter().filter(|r| r.is_defeasible()).cloned(),
        )
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rules.is_empty() {
            f.write_str("∅")?;
        } else {
            let heads: Vec<String> = self.rules.iter().rev().map(|r| r.head().to_string()).collect();
            f.write_str(&heads.join(", "))?;
        }
        let symbol = if self.is_defeasible() { "|~" } else { "|-" };
        write!(f, " {} {}", symbol, self.conclusion)
    }
}

/// Result of one search step: derivations and the shallowest path position a cycle cut reached.
struct Found {
    derivations: Arc<Vec<Vec<Rule>>>,
    low: usize,
}

/// Memoized enumeration of derivations over one `RuleIndex`.
///
/// A literal already on the current search path is cut, so cyclic rule sets
/// terminate. A result is cached only when no cut above it influenced it,
/// so answers do not depend on the order of earlier queries.
#[derive(Debug)]
pub struct DerivationSearch {
    index: RuleIndex,
    cache: HashMap<Literal, Arc<Vec<Vec<Rule>>>>,
    cache_hits: usize,
}

impl DerivationSearch {
    /// Creates a search over `index` with an empty cache.
    pub fn new(index: RuleIndex) -> Self {
        Self {
            index,
            cache: HashMap::new(),
            cache_hits: 0,
        }
    }

    /// The searched index.
    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    /// Number of lookups answered from the cache.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits
    }

    /// Number of literals with cached derivations.
    pub fn cached_literals(&self) -> usize {
        self.cache.len()
    }

    /// All derivations of `literal`; empty when it has none.
    pub fn derivations(&mut self, literal: &Literal) -> Vec<Derivation> {
        let found = self.search(literal, &mut Vec::new());
        found
            .derivations
            .iter()
            .map(|steps| Derivation::from_steps(literal, steps.clone()))
            .collect()
    }

    fn search(&mut self, literal: &Literal, path: &mut Vec<Literal>) -> Found {
        if let Some(cached) = self.cache.get(literal) {
            self.cache_hits += 1;
            trace!("Derivation cache hit: {}", literal);
            return Self::restrict(cached, path);
        }

        if let Some(position) = path.iter().position(|l| l == literal) {
            trace!("Cycle cut at {}", literal);
            return Found {
                derivations: Arc::new(Vec::new()),
                low: position,
            };
        }

        let depth = path.len();
        path.push(literal.clone());

        let mut low = usize::MAX;
        let mut results: IndexSet<Vec<Rule>> = IndexSet::new();
        let candidates = self.index.rules_for(literal).to_vec();
        'rules: for rule in candidates {
            let mut partials: Vec<Vec<Rule>> = vec![vec![rule.clone()]];
            for body_literal in rule.body() {
                let found = self.search(body_literal, path);
                low = low.min(found.low);
                if found.derivations.is_empty() {
                    continue 'rules;
                }

                let mut merged: IndexSet<Vec<Rule>> = IndexSet::new();
                for partial in &partials {
                    for completion in found.derivations.iter() {
                        let mut steps = partial.clone();
                        for step in completion {
                            if !steps.contains(step) {
                                steps.push(step.clone());
                            }
                        }
                        merged.insert(steps);
                    }
                }
                partials = merged.into_iter().collect();
            }
            results.extend(partials);
        }

        path.pop();

        let derivations = Arc::new(results.into_iter().collect::<Vec<_>>());
        if low >= depth {
            self.cache.insert(literal.clone(), Arc::clone(&derivations));
            low = usize::MAX;
        }

        Found { derivations, low }
    }

    /// Drops cached derivations that pass through a literal on the current path.
    ///
    /// Cached entries hold every acyclic derivation; below a path they must
    /// not re-derive any literal of that path.
    fn restrict(cached: &Arc<Vec<Vec<Rule>>>, path: &[Literal]) -> Found {
        let mut low = usize::MAX;
        let mut kept = Vec::new();
        for steps in cached.iter() {
            let reached = steps
                .iter()
                .filter_map(|rule| path.iter().position(|l| l == rule.head()))
                .min();
            match reached {
                Some(position) => low = low.min(position),
                None => kept.push(steps.clone()),
            }
        }

        if low == usize::MAX {
            Found {
                derivations: Arc::clone(cached),
                low,
            }
        } else {
            Found {
                derivations: Arc::new(kept),
                low,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;

    fn literal(text: &str) -> Literal {
        text.parse().unwrap()
    }

    fn search(text: &str, kind: RuleKind) -> DerivationSearch {
        let program = Program::parse(text).unwrap();
        let ground = program.ground_program();
        DerivationSearch::new(RuleIndex::new(ground.rules(), kind))
    }

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
    fn test_fact_derivation() {
        let mut search = search("a.", RuleKind::Defeasible);
        let derivations = search.derivations(&literal("a"));
        assert_eq!(derivations.len(), 1);
        assert_eq!(derivations[0].rules().len(), 1);
        assert_eq!(derivations[0].to_string(), "a |- a");
    }

    #[test]
    fn test_missing_literal_has_no_derivations() {
        let mut search = search("a.", RuleKind::Defeasible);
        assert!(search.derivations(&literal("b")).is_empty());
    }

    #[test]
    fn test_bird_tina_strictly() {
        let mut search = search(BIRDS, RuleKind::Strict);
        let derivations = search.derivations(&literal("bird(tina)"));
        assert_eq!(derivations.len(), 1);
        assert_eq!(
            derivations[0].to_string(),
            "chicken(tina), bird(tina) |- bird(tina)"
        );
        assert!(search.derivations(&literal("flies(tina)")).is_empty());
    }

    #[test]
    fn test_flies_tina_defeasibly() {
        let mut search = search(BIRDS, RuleKind::Defeasible);
        let derivations = search.derivations(&literal("flies(tina)"));
        assert_eq!(derivations.len(), 2);
        assert!(derivations.iter().all(Derivation::is_defeasible));
        let arguments: Vec<String> = derivations.iter().map(|d| d.structure().to_string()).collect();
        assert!(arguments.contains(&"<{flies(tina) -< bird(tina).}, flies(tina)>".to_string()));
        assert!(arguments
            .contains(&"<{flies(tina) -< chicken(tina), scared(tina).}, flies(tina)>".to_string()));
    }

    #[test]
    fn test_cross_product_of_body_derivations() {
        let mut search = search("a -< b, c. b -< d. b -< e. c. d. e.", RuleKind::Defeasible);
        let derivations = search.derivations(&literal("a"));
        assert_eq!(derivations.len(), 2);
        for derivation in &derivations {
            assert_eq!(derivation.rules()[0].to_string(), "a -< b, c.");
            assert_eq!(derivation.rules().len(), 4);
        }
    }

    #[test]
    fn test_cycles_terminate() {
        let mut search = search("a -< b. b -< a. b.", RuleKind::Defeasible);
        let a = search.derivations(&literal("a"));
        assert_eq!(a.len(), 1);
        let b = search.derivations(&literal("b"));
        assert_eq!(b.len(), 1);
        assert!(b[0].rules()[0].is_fact());
    }

    #[test]
    fn test_cycle_without_base_has_no_derivation() {
        let mut search = search("a -< b. b -< c. c -< a. d.", RuleKind::Defeasible);
        assert!(search.derivations(&literal("a")).is_empty());
        assert!(search.derivations(&literal("c")).is_empty());
    }

    #[test]
    fn test_cache_is_used() {
        let mut search = search(BIRDS, RuleKind::Defeasible);
        search.derivations(&literal("nests_in_trees(tina)"));
        let before = search.cache_hits();
        search.derivations(&literal("nests_in_trees(tina)"));
        assert!(search.cache_hits() > before);
        assert!(search.cached_literals() > 0);
    }

    #[test]
    fn test_closure_and_contradiction() {
        let program = Program::parse(BIRDS).unwrap();
        let ground = program.ground_program();

        let strict = RuleIndex::new(ground.rules(), RuleKind::Strict);
        assert!(!strict.is_contradictory());
        assert!(strict.derives(&literal("~flies(tweety)")));
        assert!(!strict.derives(&literal("flies(tina)")));

        let defeasible = RuleIndex::new(ground.rules(), RuleKind::Defeasible);
        assert!(defeasible.is_contradictory());
    }

    #[test]
    fn test_disagree() {
        let empty = RuleIndex::new(std::iter::empty(), RuleKind::Strict);
        assert!(disagree(&literal("a"), &literal("~a"), &empty));

        let program = Program::parse("~h <- b. h <- a.").unwrap();
        let strict = RuleIndex::new(program.rules(), RuleKind::Strict);
        assert!(disagree(&literal("a"), &literal("b"), &strict));
        assert!(!disagree(&literal("a"), &literal("c"), &strict));
    }
}
