//! Counter-arguments and defeat
//!
//! An argument `A` attacks an argument `S` at a sub-argument `D` of `S` when
//! the conclusions of `A` and `D` disagree. The attack is a proper defeat if
//! `A` is preferable to `D`, and a blocking defeat if neither is preferable
//! to the other.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};

use crate::argument::{Comparator, Structure};
use crate::derivation::disagree;
use crate::term::Literal;

/// How a defeater prevails over the argument it attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefeaterKind {
    /// The defeater is preferable to the attacked sub-argument.
    Proper,
    /// Neither side is preferable.
    Blocking,
}

impl DefeaterKind {
    /// Returns a human-readable description of the defeat.
    pub fn description(&self) -> &'static str {
        match self {
            DefeaterKind::Proper => "Preferable to the attacked sub-argument",
            DefeaterKind::Blocking => "Incomparable with the attacked sub-argument",
        }
    }
}

impl fmt::Display for DefeaterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefeaterKind::Proper => f.write_str("proper"),
            DefeaterKind::Blocking => f.write_str("blocking"),
        }
    }
}

/// A defeat of one structure by another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Defeat {
    /// The attacking structure.
    pub defeater: Structure,
    /// Proper or blocking.
    pub kind: DefeaterKind,
    /// The sub-argument of the attacked structure the attack is aimed at.
    pub disagreement: Structure,
}

impl fmt::Display for Defeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} defeater at {})",
            self.defeater, self.kind, self.disagreement
        )
    }
}

/// One entry of the defeater relation, by structure position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub defeater: usize,
    pub kind: DefeaterKind,
    pub disagreement: usize,
}

/// The complete defeater relation over the structures of a program.
#[derive(Debug, Clone, Default)]
pub struct DefeaterSummary {
    structures: Vec<Structure>,
    positions: HashMap<Structure, usize>,
    edges: Vec<Vec<Edge>>,
}

impl DefeaterSummary {
    /// Computes every defeat among `structures`.
    ///
    /// Only structures that use defeasible rules attack or are attacked.
    pub fn compute(structures: Vec<Structure>, comparator: &mut Comparator) -> Self {
        let positions = structures
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        let mut conflicts: HashMap<(Literal, Literal), bool> = HashMap::new();
        let mut edges = vec![Vec::new(); structures.len()];
        let mut count = 0;

        for (target, attacked) in structures.iter().enumerate() {
            if attacked.is_strict() {
                continue;
            }
            let subarguments: Vec<usize> = structures
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_subargument_of(attacked))
                .map(|(i, _)| i)
                .collect();

            for (source, attacker) in structures.iter().enumerate() {
                if source == target || attacker.is_strict() {
                    continue;
                }

                let points: Vec<usize> = subarguments
                    .iter()
                    .copied()
                    .filter(|&d| {
                        let key = (
                            attacker.conclusion().clone(),
                            structures[d].conclusion().clone(),
                        );
                        *conflicts.entry(key).or_insert_with(|| {
                            disagree(
                                attacker.conclusion(),
                                structures[d].conclusion(),
                                comparator.strict_knowledge(),
                            )
                        })
                    })
                    .collect();
                if points.is_empty() {
                    continue;
                }

                if let Some(edge) = classify(source, &points, &structures, comparator) {
                    trace!(
                        "{} is a {} defeater of {}",
                        attacker,
                        edge.kind,
                        attacked
                    );
                    edges[target].push(edge);
                    count += 1;
                }
            }
        }

        debug!(
            "Computed {} defeats among {} structures",
            count,
            structures.len()
        );
        Self {
            structures,
            positions,
            edges,
        }
    }

    /// The structures the relation is defined over, sorted.
    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    /// Position of a structure, if it belongs to the relation.
    pub fn position(&self, structure: &Structure) -> Option<usize> {
        self.positions.get(structure).copied()
    }

    pub(crate) fn edges(&self, target: usize) -> &[Edge] {
        self.edges.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn structure(&self, position: usize) -> &Structure {
        &self.structures[position]
    }

    /// The defeaters of `structure`.
    pub fn defeaters_of(&self, structure: &Structure) -> Vec<Defeat> {
        let Some(target) = self.position(structure) else {
            return Vec::new();
        };
        self.edges(target)
            .iter()
            .map(|edge| Defeat {
                defeater: self.structures[edge.defeater].clone(),
                kind: edge.kind,
                disagreement: self.structures[edge.disagreement].clone(),
            })
            .collect()
    }

    /// Returns `true` if `defeater` defeats `structure`, properly or by blocking.
    pub fn is_defeater_for(&self, defeater: &Structure, structure: &Structure) -> bool {
        self.kind_of(defeater, structure).is_some()
    }

    /// How `defeater` defeats `structure`, if it does.
    pub fn kind_of(&self, defeater: &Structure, structure: &Structure) -> Option<DefeaterKind> {
        let source = self.position(defeater)?;
        let target = self.position(structure)?;
        self.edges(target)
            .iter()
            .find(|edge| edge.defeater == source)
            .map(|edge| edge.kind)
    }

    /// Total number of defeats.
    pub fn len(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// Returns `true` if no structure is defeated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decides how `attacker` defeats a structure with the given disagreement points.
///
/// A proper defeat at any point wins over blocking ones; the first point in
/// structure order is kept.
fn classify(
    attacker: usize,
    points: &[usize],
    structures: &[Structure],
    comparator: &mut Comparator,
) -> Option<Edge> {
    let candidate = &structures[attacker];

    for &point in points {
        if comparator.is_preferable(candidate, &structures[point]) {
            return Some(Edge {
                defeater: attacker,
                kind: DefeaterKind::Proper,
                disagreement: point,
            });
        }
    }

    for &point in points {
        let other = &structures[point];
        if !comparator.is_preferable(candidate, other) && !comparator.is_preferable(other, candidate) {
            return Some(Edge {
                defeater: attacker,
                kind: DefeaterKind::Blocking,
                disagreement: point,
            });
        }
    }

    None
}
