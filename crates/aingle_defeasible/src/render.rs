//! Rendering of engine values
//!
//! Everything the engine can show to a user is one variant of `Element`, so
//! a front end renders values with a single exhaustive match.

use std::fmt;

use crate::argument::Structure;
use crate::derivation::Derivation;
use crate::interpreter::Answer;
use crate::program::Program;
use crate::rule::Rule;
use crate::term::{Atom, Literal};

/// A renderable engine value.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Atom(&'a Atom),
    Literal(&'a Literal),
    Rule(&'a Rule),
    Program(&'a Program),
    Derivation(&'a Derivation),
    Structure(&'a Structure),
    Answer(Answer),
}

impl Element<'_> {
    /// Name of the kind of value.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Atom(_) => "atom",
            Element::Literal(_) => "literal",
            Element::Rule(_) => "rule",
            Element::Program(_) => "program",
            Element::Derivation(_) => "derivation",
            Element::Structure(_) => "structure",
            Element::Answer(_) => "answer",
        }
    }
}

impl fmt::Display for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Atom(atom) => fmt::Display::fmt(atom, f),
            Element::Literal(literal) => fmt::Display::fmt(literal, f),
            Element::Rule(rule) => fmt::Display::fmt(rule, f),
            Element::Program(program) => fmt::Display::fmt(program, f),
            Element::Derivation(derivation) => fmt::Display::fmt(derivation, f),
            Element::Structure(structure) => fmt::Display::fmt(structure, f),
            Element::Answer(answer) => fmt::Display::fmt(answer, f),
        }
    }
}

macro_rules! element_from {
    ($($variant:ident),*) => {
        $(
            impl<'a> From<&'a $variant> for Element<'a> {
                fn from(value: &'a $variant) -> Self {
                    Element::$variant(value)
                }
            }
        )*
    };
}

element_from!(Atom, Literal, Rule, Program, Derivation, Structure);

impl From<Answer> for Element<'_> {
    fn from(answer: Answer) -> Self {
        Element::Answer(answer)
    }
}

/// Renders any engine value.
pub fn render<'a>(element: impl Into<Element<'a>>) -> String {
    element.into().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_each_kind() {
        let literal: Literal = "~flies(tina)".parse().unwrap();
        let rule: Rule = "~flies(tina) -< chicken(tina).".parse().unwrap();
        let program = Program::parse("chicken(tina). ~flies(tina) -< chicken(tina).").unwrap();
        let structure = Structure::new(literal.clone(), vec![rule.clone()]);

        assert_eq!(render(&literal.atom), "flies(tina)");
        assert_eq!(render(&literal), "~flies(tina)");
        assert_eq!(render(&rule), "~flies(tina) -< chicken(tina).");
        assert_eq!(
            render(&program),
            "# Facts\nchicken(tina).\n\n# Defeasible knowledge\n~flies(tina) -< chicken(tina)."
        );
        assert_eq!(render(&structure), "<{~flies(tina) -< chicken(tina).}, ~flies(tina)>");
        assert_eq!(render(Answer::No), "NO");
    }

    #[test]
    fn test_kind() {
        let literal: Literal = "a".parse().unwrap();
        assert_eq!(Element::from(&literal).kind(), "literal");
        assert_eq!(Element::from(Answer::Yes).kind(), "answer");
    }
}
