//! Rete-style grounding
//!
//! The grounder compiles the rules of a program into a discrimination
//! network and pushes ground literals through it until no new literal
//! appears:
//!
//! ```text
//!   ground literal ──► Alpha(p(X)) ──┐
//!                                    ├──► Beta ──► Beta ──► Leaf(rule) ──► head instance
//!   ground literal ──► Alpha(q(X,Y))─┘      ▲                                  │
//!                                           └── Alpha(r(Y)) ◄── agenda ◄───────┘
//! ```
//!
//! Alpha nodes match one body pattern, beta nodes join two compatible partial
//! matches, and one leaf per rule instantiates the rule under the joined
//! substitution. Every node remembers the payloads it has seen, so each
//! combination is processed once and the fixpoint is reached on a finite
//! constant universe.

use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::program::Program;
use crate::rule::Rule;
use crate::term::{Literal, Substitution};

type NodeId = usize;

/// Ground body literals matched so far and the bindings they produced.
type Payload = (Vec<Literal>, Substitution);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Only,
}

#[derive(Debug)]
enum NodeKind {
    Alpha { pattern: Literal },
    Beta { left: NodeId, right: NodeId },
    Leaf { rule: usize },
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    memory: IndexSet<Payload>,
    successors: Vec<(NodeId, Side)>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            memory: IndexSet::new(),
            successors: Vec::new(),
        }
    }
}

/// The compiled network for one program and the instances it has produced.
struct Network<'p> {
    rules: &'p [Rule],
    nodes: Vec<Node>,
    alphas: IndexMap<Literal, NodeId>,
    betas: HashMap<(NodeId, NodeId), NodeId>,
    agenda: VecDeque<Literal>,
    seen: HashSet<Literal>,
    produced: IndexMap<Rule, usize>,
    limit: Option<usize>,
    truncated: bool,
}

impl<'p> Network<'p> {
    fn compile(rules: &'p [Rule], limit: Option<usize>) -> Self {
        let mut network = Self {
            rules,
            nodes: Vec::new(),
            alphas: IndexMap::new(),
            betas: HashMap::new(),
            agenda: VecDeque::new(),
            seen: HashSet::new(),
            produced: IndexMap::new(),
            limit,
            truncated: false,
        };

        for (origin, rule) in rules.iter().enumerate() {
            if rule.body().is_empty() {
                network.seed(origin, rule);
            } else {
                network.add_rule(origin, rule);
            }
        }

        network
    }

    fn seed(&mut self, origin: usize, rule: &Rule) {
        if !rule.is_ground() {
            warn!("Skipping non-ground {}: {}", if rule.is_fact() { "fact" } else { "presumption" }, rule);
            return;
        }
        self.emit(rule.clone(), origin);
    }

    fn add_rule(&mut self, origin: usize, rule: &Rule) {
        let mut body = rule.body().iter();
        let Some(first) = body.next() else {
            return;
        };

        let mut current = self.alpha(first);
        for literal in body {
            let right = self.alpha(literal);
            current = self.beta(current, right);
        }

        let leaf = self.push(NodeKind::Leaf { rule: origin });
        self.nodes[current].successors.push((leaf, Side::Only));
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        self.nodes.len() - 1
    }

    fn alpha(&mut self, pattern: &Literal) -> NodeId {
        if let Some(&id) = self.alphas.get(pattern) {
            return id;
        }
        let id = self.push(NodeKind::Alpha {
            pattern: pattern.clone(),
        });
        self.alphas.insert(pattern.clone(), id);
        id
    }

    fn beta(&mut self, left: NodeId, right: NodeId) -> NodeId {
        if let Some(&id) = self.betas.get(&(left, right)) {
            return id;
        }
        let id = self.push(NodeKind::Beta { left, right });
        self.nodes[left].successors.push((id, Side::Left));
        self.nodes[right].successors.push((id, Side::Right));
        self.betas.insert((left, right), id);
        id
    }

    /// Records a ground rule instance and schedules its head.
    fn emit(&mut self, rule: Rule, origin: usize) {
        if self.produced.contains_key(&rule) {
            return;
        }
        if let Some(limit) = self.limit {
            if self.produced.len() >= limit {
                self.truncated = true;
                return;
            }
        }

        let head = rule.head().clone();
        self.produced.insert(rule, origin);
        if self.seen.insert(head.clone()) {
            self.agenda.push_back(head);
        }
    }

    fn run(&mut self) {
        while let Some(literal) = self.agenda.pop_front() {
            if self.truncated {
                break;
            }
            let matches: Vec<(NodeId, Substitution)> = self
                .alphas
                .values()
                .filter_map(|&id| match &self.nodes[id].kind {
                    NodeKind::Alpha { pattern } => pattern.unify(&literal).map(|subs| (id, subs)),
                    _ => None,
                })
                .collect();
            for (id, subs) in matches {
                self.activate(id, (vec![literal.clone()], subs));
            }
        }
    }

    fn activate(&mut self, id: NodeId, payload: Payload) {
        if !self.nodes[id].memory.insert(payload.clone()) {
            return;
        }

        let successors = self.nodes[id].successors.clone();
        for (successor, side) in successors {
            match self.nodes[successor].kind {
                NodeKind::Beta { left, right } => {
                    let other = if side == Side::Left { right } else { left };
                    let partners: Vec<Payload> = self.nodes[other].memory.iter().cloned().collect();
                    for partner in partners {
                        let (left_payload, right_payload) = if side == Side::Left {
                            (&payload, &partner)
                        } else {
                            (&partner, &payload)
                        };
                        if let Some(joined) = join(left_payload, right_payload) {
                            self.activate(successor, joined);
                        }
                    }
                }
                NodeKind::Leaf { rule } => {
                    if self.nodes[successor].memory.insert(payload.clone()) {
                        self.fire(rule, &payload.1);
                    }
                }
                NodeKind::Alpha { .. } => {}
            }
        }
    }

    fn fire(&mut self, origin: usize, subs: &Substitution) {
        let Some(source) = self.rules.get(origin) else {
            return;
        };
        let head = source.head().substitute(subs);
        if !head.is_ground() {
            warn!("Skipping instance of {} with unbound head {}", source, head);
            return;
        }

        let body = source.body().iter().map(|literal| literal.substitute(subs));
        let instance = Rule::new(head, source.kind(), body).with_salience(source.salience());
        trace!("Instantiated {}", instance);
        self.emit(instance, origin);
    }

    fn into_parts(self) -> (Vec<Rule>, Vec<usize>) {
        let mut pairs: Vec<(Rule, usize)> = self.produced.into_iter().collect();
        pairs.sort();
        pairs.into_iter().unzip()
    }
}

fn join(left: &Payload, right: &Payload) -> Option<Payload> {
    let subs = left.1.join(&right.1)?;
    let mut literals = left.0.clone();
    literals.extend(right.0.iter().cloned());
    Some((literals, subs))
}

/// Produces the ground form of a program.
#[derive(Debug, Clone, Default)]
pub struct Grounder {
    limit: Option<usize>,
}

impl Grounder {
    /// Creates a grounder without an instance limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grounder that fails once more than `limit` ground rules are produced.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self { limit }
    }

    /// The configured instance limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Grounds `program`.
    ///
    /// A program that is already ground is returned unchanged. Each rule of
    /// the result remembers the rule it was instantiated from.
    ///
    /// # Errors
    ///
    /// Returns `Error::GroundingLimitExceeded` when the configured limit is reached.
    pub fn ground(&self, program: &Program) -> Result<Program> {
        if program.is_ground() {
            return Ok(program.clone());
        }

        let mut network = Network::compile(program.rules(), self.limit);
        network.run();
        if network.truncated {
            let limit = self.limit.unwrap_or_default();
            debug!("Grounding stopped at the limit of {} rules", limit);
            return Err(Error::GroundingLimitExceeded { limit });
        }
        Ok(Self::finish(program, network))
    }

    /// Grounds `program` ignoring any limit.
    pub fn ground_unbounded(&self, program: &Program) -> Program {
        let mut network = Network::compile(program.rules(), None);
        network.run();
        Self::finish(program, network)
    }

    fn finish(program: &Program, network: Network<'_>) -> Program {
        let nodes = network.nodes.len();
        let (rules, origins) = network.into_parts();
        debug!(
            "Grounded {} rules into {} instances using {} network nodes",
            program.len(),
            rules.len(),
            nodes
        );
        Program::unchecked(rules, Some((program.shared_rules(), origins)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(text: &str) -> Rule {
        text.parse().unwrap()
    }

    fn rendered(program: &Program) -> Vec<String> {
        program.rules().iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_ground_simple_chain() {
        let program = Program::parse("b(X) <- a(X). c(X) -< b(X). a(1). a(2).").unwrap();
        let ground = Grounder::new().ground(&program).unwrap();

        assert!(ground.is_ground());
        assert_eq!(ground.len(), 6);
        assert!(ground.contains(&rule("b(1) <- a(1).")));
        assert!(ground.contains(&rule("c(2) -< b(2).")));
    }

    #[test]
    fn test_join_requires_shared_bindings() {
        let program = Program::parse(
            "grandparent(X, Z) <- parent(X, Y), parent(Y, Z).
             parent(ann, bob). parent(bob, cid). parent(dan, eve).",
        )
        .unwrap();
        let ground = Grounder::new().ground(&program).unwrap();

        let instances: Vec<&Rule> = ground.rules().iter().filter(|r| !r.is_fact()).collect();
        assert_eq!(instances.len(), 1);
        assert_eq!(
            instances[0].to_string(),
            "grandparent(ann, cid) <- parent(ann, bob), parent(bob, cid)."
        );
    }

    #[test]
    fn test_repeated_variable_in_pattern() {
        let program = Program::parse("loop(X) <- edge(X, X). edge(a, a). edge(a, b).").unwrap();
        let ground = Grounder::new().ground(&program).unwrap();
        assert!(ground.contains(&rule("loop(a) <- edge(a, a).")));
        assert_eq!(ground.rules().iter().filter(|r| !r.is_fact()).count(), 1);
    }

    #[test]
    fn test_recursive_rules_reach_fixpoint() {
        let program = Program::parse(
            "path(X, Y) <- edge(X, Y).
             path(X, Z) <- edge(X, Y), path(Y, Z).
             edge(a, b). edge(b, c). edge(c, a).",
        )
        .unwrap();
        let ground = Grounder::new().ground(&program).unwrap();
        assert!(ground.contains(&rule("path(a, a) <- edge(a, b), path(b, a).")));
        assert_eq!(ground.heads().iter().filter(|l| l.functor() == "path").count(), 9);
    }

    #[test]
    fn test_rules_share_alpha_nodes() {
        let program = Program::parse("b(X) <- a(X). c(X) -< a(X). a(1).").unwrap();
        let network = Network::compile(program.rules(), None);
        assert_eq!(network.alphas.len(), 1);
        for (key, &id) in &network.alphas {
            assert!(matches!(&network.nodes[id].kind, NodeKind::Alpha { pattern } if pattern == key));
        }

        let ground = Grounder::new().ground(&program).unwrap();
        assert!(ground.contains(&rule("b(1) <- a(1).")));
        assert!(ground.contains(&rule("c(1) -< a(1).")));
    }

    #[test]
    fn test_no_facts_grounds_nothing() {
        let program = Program::parse("b(X) -< a(X). c(X) <- b(X).").unwrap();
        let ground = Grounder::new().ground(&program).unwrap();
        assert!(ground.is_empty());
    }

    #[test]
    fn test_unbound_head_is_skipped() {
        let program = Program::parse("p(X, Y) -< q(X). q(a).").unwrap();
        let ground = Grounder::new().ground(&program).unwrap();
        assert_eq!(rendered(&ground), vec!["q(a)."]);
    }

    #[test]
    fn test_salience_is_preserved() {
        let head: Literal = "f(X)".parse().unwrap();
        let body: Literal = "g(X)".parse().unwrap();
        let weighted = Rule::builder(head).defeasible().when(body).salience(4).build();
        let program = Program::new(vec![weighted, rule("g(a).")]).unwrap();

        let ground = Grounder::new().ground(&program).unwrap();
        let instance = ground.rules().iter().find(|r| r.is_defeasible()).unwrap();
        assert_eq!(instance.salience(), 4);
    }

    #[test]
    fn test_limit() {
        let program = Program::parse("b(X) <- a(X). a(1). a(2). a(3).").unwrap();
        let err = Grounder::with_limit(Some(4)).ground(&program).unwrap_err();
        assert_eq!(err, Error::GroundingLimitExceeded { limit: 4 });

        let ground = Grounder::with_limit(Some(6)).ground(&program).unwrap();
        assert_eq!(ground.len(), 6);
    }

    #[test]
    fn test_network_is_idempotent_on_ground_output() {
        let program = Program::parse(
            "bird(X) <- chicken(X). flies(X) -< bird(X). chicken(tina). ~flies(X) -< chicken(X).",
        )
        .unwrap();
        let ground = Grounder::new().ground(&program).unwrap();
        let again = Grounder::new().ground_unbounded(&ground);
        assert_eq!(ground, again);
        assert_eq!(Grounder::new().ground(&ground).unwrap(), ground);
    }

    #[test]
    fn test_provenance_points_to_source() {
        let program = Program::parse("b(X) <- a(X). a(1).").unwrap();
        let ground = Grounder::new().ground(&program).unwrap();
        assert_eq!(ground.source_of(&rule("b(1) <- a(1).")), Some(&rule("b(X) <- a(X).")));
        assert_eq!(ground.source_of(&rule("a(1).")), Some(&rule("a(1).")));
    }
}
