//! Query interpreter
//!
//! The `Interpreter` binds one ground program for its whole lifetime and owns
//! every cache built while answering queries about it: derivations per rule
//! kind, the defeater relation, and answers per literal.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use log::{debug, trace};

use crate::argument::{Comparator, Structure};
use crate::config::EngineConfig;
use crate::defeat::{Defeat, DefeaterSummary};
use crate::derivation::{Derivation, DerivationSearch, RuleIndex};
use crate::dialectical::DialecticalTree;
use crate::error::{Error, Result};
use crate::grounder::Grounder;
use crate::program::Program;
use crate::rule::{Rule, RuleKind};
use crate::term::Literal;

/// The answer to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Answer {
    /// The literal is warranted.
    Yes,
    /// The complement of the literal is warranted.
    No,
    /// Neither the literal nor its complement is warranted.
    Undecided,
    /// The literal is not the head of any rule.
    Unknown,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Answer::Yes => "YES",
            Answer::No => "NO",
            Answer::Undecided => "UNDECIDED",
            Answer::Unknown => "UNKNOWN",
        };
        f.write_str(text)
    }
}

/// An answer together with the rules that justify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The queried literal.
    pub literal: Literal,
    /// The answer.
    pub answer: Answer,
    /// The rules of the undefeated argument for the literal (`Yes`) or its
    /// complement (`No`); `None` otherwise.
    pub warrant: Option<BTreeSet<Rule>>,
}

impl QueryResult {
    fn new(literal: &Literal, answer: Answer, warrant: Option<BTreeSet<Rule>>) -> Self {
        Self {
            literal: literal.clone(),
            answer,
            warrant,
        }
    }

    /// Returns `true` if the literal is warranted.
    pub fn is_warranted(&self) -> bool {
        self.answer == Answer::Yes
    }

    /// The result as JSON, with literal and rules in program syntax.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "literal": self.literal.to_string(),
            "answer": self.answer,
            "warrant": self
                .warrant
                .as_ref()
                .map(|rules| rules.iter().map(Rule::to_string).collect::<Vec<_>>()),
        })
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.literal, self.answer)?;
        if let Some(rules) = &self.warrant {
            let rules: Vec<String> = rules.iter().map(Rule::to_string).collect();
            write!(f, " {{{}}}", rules.join("; "))?;
        }
        Ok(())
    }
}

/// Counters describing the work an `Interpreter` has done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterStats {
    /// Rules of the bound ground program.
    pub ground_rules: usize,
    /// Queries answered, including cached ones.
    pub queries: usize,
    /// Queries answered from the answer cache.
    pub answer_cache_hits: usize,
    /// Derivation lookups answered from a derivation cache.
    pub derivation_cache_hits: usize,
    /// Structures in the defeater relation, once computed.
    pub structures: usize,
    /// Defeats in the defeater relation, once computed.
    pub defeats: usize,
}

/// Answers queries about one ground program.
#[derive(Debug)]
pub struct Interpreter {
    program: Program,
    config: EngineConfig,
    has_facts: bool,
    strict: DerivationSearch,
    defeasible: DerivationSearch,
    comparator: Comparator,
    summary: Option<DefeaterSummary>,
    answers: HashMap<Literal, QueryResult>,
    trees: Vec<DialecticalTree>,
    queries: usize,
    answer_cache_hits: usize,
}

impl Interpreter {
    /// Creates an interpreter for `program` with the default configuration.
    pub fn new(program: &Program) -> Result<Self> {
        Self::with_config(program, EngineConfig::default())
    }

    /// Creates an interpreter for `program`.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to reason about; it is grounded here.
    /// * `config` - Engine options.
    ///
    /// # Errors
    ///
    /// Returns `Error::GroundingLimitExceeded` if grounding produces more rules
    /// than `config.max_ground_rules`.
    pub fn with_config(program: &Program, config: EngineConfig) -> Result<Self> {
        let ground = match config.max_ground_rules {
            Some(limit) => Grounder::with_limit(Some(limit)).ground(program)?,
            None => program.ground_program().clone(),
        };
        debug!("Interpreter bound to {} ground rules", ground.len());

        Ok(Self {
            has_facts: ground.has_facts(),
            strict: DerivationSearch::new(RuleIndex::new(ground.rules(), RuleKind::Strict)),
            defeasible: DerivationSearch::new(RuleIndex::new(ground.rules(), RuleKind::Defeasible)),
            comparator: Comparator::new(&ground),
            summary: None,
            answers: HashMap::new(),
            trees: Vec::new(),
            queries: 0,
            answer_cache_hits: 0,
            program: ground,
            config,
        })
    }

    /// The ground program queries are answered against.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answers a query.
    ///
    /// Returns `Yes` with a warrant if some argument for `literal` is
    /// undefeated, `No` with a warrant if some argument for its complement
    /// is, `Unknown` if no rule concludes `literal`, and `Undecided`
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::NonGroundLiteral` if `literal` contains variables.
    pub fn query(&mut self, literal: &Literal) -> Result<QueryResult> {
        Self::require_ground(literal)?;
        self.queries += 1;

        if self.config.memoize_answers {
            if let Some(cached) = self.answers.get(literal) {
                self.answer_cache_hits += 1;
                return Ok(cached.clone());
            }
        }

        self.trees.clear();
        let result = if !self.defeasible.index().contains_head(literal) {
            QueryResult::new(literal, Answer::Unknown, None)
        } else if let Some(rules) = self.warrant(literal) {
            QueryResult::new(literal, Answer::Yes, Some(rules))
        } else if let Some(rules) = self.warrant(&literal.complement()) {
            QueryResult::new(literal, Answer::No, Some(rules))
        } else {
            QueryResult::new(literal, Answer::Undecided, None)
        };
        debug!("Query {} answered {}", literal, result.answer);

        if self.config.memoize_answers {
            self.answers.insert(literal.clone(), result.clone());
        }
        Ok(result)
    }

    /// Parses a literal and answers a query about it.
    pub fn query_str(&mut self, literal: &str) -> Result<QueryResult> {
        let literal: Literal = literal.parse()?;
        self.query(&literal)
    }

    /// All derivations of `literal` using rules admitted by `kind`.
    pub fn derivations(&mut self, literal: &Literal, kind: RuleKind) -> Result<Vec<Derivation>> {
        Self::require_ground(literal)?;
        if !self.has_facts {
            return Ok(Vec::new());
        }
        Ok(match kind {
            RuleKind::Strict => self.strict.derivations(literal),
            RuleKind::Defeasible => self.defeasible.derivations(literal),
        })
    }

    /// Every argument of the program, sorted.
    pub fn structures(&mut self) -> &[Structure] {
        self.defeat_relation().structures()
    }

    /// The defeaters of `structure`.
    pub fn defeaters_of(&mut self, structure: &Structure) -> Vec<Defeat> {
        self.defeat_relation().defeaters_of(structure)
    }

    /// The dialectical trees of every argument for `literal`.
    pub fn dialectical_trees(&mut self, literal: &Literal) -> Result<Vec<DialecticalTree>> {
        Self::require_ground(literal)?;
        let roots = self.arguments_for(literal);
        let summary = self.defeat_relation();
        Ok(roots
            .iter()
            .map(|root| DialecticalTree::build(root, summary))
            .collect())
    }

    /// The trees built while answering the last computed query.
    ///
    /// Empty unless `collect_trees` is set in the configuration.
    pub fn last_trees(&self) -> &[DialecticalTree] {
        &self.trees
    }

    /// Returns `true` if rules admitted by `kind` derive some literal and its complement.
    pub fn is_contradictory(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::Strict => self.strict.index().is_contradictory(),
            RuleKind::Defeasible => self.defeasible.index().is_contradictory(),
        }
    }

    /// Current statistics.
    pub fn stats(&self) -> InterpreterStats {
        InterpreterStats {
            ground_rules: self.program.len(),
            queries: self.queries,
            answer_cache_hits: self.answer_cache_hits,
            derivation_cache_hits: self.strict.cache_hits() + self.defeasible.cache_hits(),
            structures: self.summary.as_ref().map(|s| s.structures().len()).unwrap_or(0),
            defeats: self.summary.as_ref().map(DefeaterSummary::len).unwrap_or(0),
        }
    }

    fn require_ground(literal: &Literal) -> Result<()> {
        if literal.is_ground() {
            Ok(())
        } else {
            Err(Error::NonGroundLiteral(literal.to_string()))
        }
    }

    /// The defeater relation, computed on first use.
    fn defeat_relation(&mut self) -> &DefeaterSummary {
        let Self {
            summary,
            defeasible,
            comparator,
            has_facts,
            ..
        } = self;
        summary.get_or_insert_with(|| {
            let structures = all_structures(defeasible, comparator, *has_facts);
            DefeaterSummary::compute(structures, comparator)
        })
    }

    /// Distinct consistent arguments for `literal`, in derivation order.
    fn arguments_for(&mut self, literal: &Literal) -> Vec<Structure> {
        if !self.has_facts {
            return Vec::new();
        }
        let comparator = &self.comparator;
        let arguments: IndexSet<Structure> = self
            .defeasible
            .derivations(literal)
            .iter()
            .map(Derivation::structure)
            .filter(|structure| comparator.is_consistent(structure))
            .collect();
        arguments.into_iter().collect()
    }

    /// The rules of the first undefeated argument for `literal`.
    fn warrant(&mut self, literal: &Literal) -> Option<BTreeSet<Rule>> {
        let arguments = self.arguments_for(literal);
        if arguments.is_empty() {
            return None;
        }

        let collect = self.config.collect_trees;
        self.defeat_relation();
        let summary = self.summary.as_ref()?;

        let mut built = Vec::new();
        let mut warrant = None;
        for argument in &arguments {
            let tree = DialecticalTree::build(argument, summary);
            let warranted = tree.is_warranted();
            if collect {
                built.push(tree);
            }
            if warranted {
                warrant = Some(argument.rules().clone());
                break;
            }
        }

        self.trees.extend(built);
        warrant
    }
}

/// Every argument supported by some derivation and consistent with the
/// strict knowledge, sorted.
fn all_structures(
    search: &mut DerivationSearch,
    comparator: &Comparator,
    has_facts: bool,
) -> Vec<Structure> {
    if !has_facts {
        return Vec::new();
    }
    let literals: Vec<Literal> = search.index().closure().into_iter().collect();
    let structures: BTreeSet<Structure> = literals
        .iter()
        .flat_map(|literal| search.derivations(literal))
        .map(|derivation| derivation.structure())
        .collect();
    structures
        .into_iter()
        .filter(|structure| {
            let consistent = comparator.is_consistent(structure);
            if !consistent {
                trace!("Discarding {}: contradicts the strict knowledge", structure);
            }
            consistent
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> Literal {
        text.parse().unwrap()
    }

    fn interpreter(text: &str) -> Interpreter {
        Interpreter::new(&Program::parse(text).unwrap()).unwrap()
    }

    #[test]
    fn test_answer_display_and_json() {
        assert_eq!(Answer::Undecided.to_string(), "UNDECIDED");
        assert_eq!(serde_json::to_string(&Answer::Yes).unwrap(), "\"YES\"");
    }

    #[test]
    fn test_fact_is_warranted_with_empty_warrant() {
        let mut engine = interpreter("a.");
        let result = engine.query(&literal("a")).unwrap();
        assert_eq!(result.answer, Answer::Yes);
        assert_eq!(result.warrant, Some(BTreeSet::new()));
    }

    #[test]
    fn test_unknown_literal() {
        let mut engine = interpreter("a.");
        let result = engine.query(&literal("b")).unwrap();
        assert_eq!(result.answer, Answer::Unknown);
        assert_eq!(result.warrant, None);
    }

    #[test]
    fn test_non_ground_query_is_rejected() {
        let mut engine = interpreter("p(a).");
        let err = engine.query(&literal("p(X)")).unwrap_err();
        assert_eq!(err, Error::NonGroundLiteral("p(X)".to_string()));
    }

    #[test]
    fn test_answers_are_memoized() {
        let mut engine = interpreter("a -< b. b.");
        let first = engine.query(&literal("a")).unwrap();
        let second = engine.query(&literal("a")).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.stats().queries, 2);
        assert_eq!(engine.stats().answer_cache_hits, 1);
    }

    #[test]
    fn test_memoization_can_be_disabled() {
        let program = Program::parse("a -< b. b.").unwrap();
        let config = EngineConfig::default().with_memoization(false);
        let mut engine = Interpreter::with_config(&program, config).unwrap();
        engine.query(&literal("a")).unwrap();
        engine.query(&literal("a")).unwrap();
        assert_eq!(engine.stats().answer_cache_hits, 0);
    }

    #[test]
    fn test_grounding_limit() {
        let program = Program::parse("b(X) <- a(X). a(1). a(2).").unwrap();
        let err = Interpreter::with_config(&program, EngineConfig::bounded(2)).unwrap_err();
        assert_eq!(err, Error::GroundingLimitExceeded { limit: 2 });
        assert!(Interpreter::with_config(&program, EngineConfig::bounded(4)).is_ok());
    }

    #[test]
    fn test_result_json() {
        let mut engine = interpreter("a -< b. b.");
        let json = engine.query(&literal("a")).unwrap().to_json();
        assert_eq!(json["literal"], "a");
        assert_eq!(json["answer"], "YES");
        assert_eq!(json["warrant"][0], "a -< b.");

        let json = engine.query(&literal("c")).unwrap().to_json();
        assert!(json["warrant"].is_null());
    }

    #[test]
    fn test_result_display() {
        let mut engine = interpreter("a -< b. b.");
        let result = engine.query_str("a").unwrap();
        assert_eq!(result.to_string(), "a: YES {a -< b.}");
    }

    #[test]
    fn test_arguments_against_facts_are_discarded() {
        let mut engine = interpreter("p0. p1. p3 -< p0. p5 -< p0, p1. ~p1 -< p0. ~p3 <- p0.");

        assert_eq!(engine.query_str("p1").unwrap().answer, Answer::Yes);
        assert_eq!(engine.query_str("~p1").unwrap().answer, Answer::No);
        assert_eq!(engine.query_str("p3").unwrap().answer, Answer::No);
        assert_eq!(engine.query_str("~p3").unwrap().answer, Answer::Yes);

        let result = engine.query_str("p5").unwrap();
        assert_eq!(result.answer, Answer::Yes);
        let warrant: Rule = "p5 -< p0, p1.".parse().unwrap();
        assert_eq!(result.warrant, Some(BTreeSet::from([warrant])));

        let conclusions: Vec<String> = engine
            .structures()
            .iter()
            .filter(|s| !s.is_strict())
            .map(|s| s.conclusion().to_string())
            .collect();
        assert_eq!(conclusions, vec!["p5"]);
    }

    #[test]
    fn test_collect_trees() {
        let program = Program::parse("a -< b. ~a -< c. b. c.").unwrap();
        let config = EngineConfig::default().with_trees(true);
        let mut engine = Interpreter::with_config(&program, config).unwrap();
        let result = engine.query(&literal("a")).unwrap();
        assert_eq!(result.answer, Answer::Undecided);
        assert_eq!(engine.last_trees().len(), 2);
        assert!(engine.last_trees().iter().all(|t| !t.is_warranted()));
    }
}
