//! AIngle Defeasible - Defeasible Logic Programming Engine
//!
//! This crate decides whether a proposition is warranted by a program of
//! strict rules, defeasible rules and facts. Conclusions are backed by
//! arguments; arguments attack each other, and a conclusion is warranted only
//! when one of its arguments survives every line of attack.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Defeasible Engine                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                   Program                             │   │
//! │  │  Parser │ Validation │ Rete Grounder │ Provenance     │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                   Derivations                         │   │
//! │  │  Memoized Search │ Contradiction │ Disagreement       │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                   Argumentation                       │   │
//! │  │  Specificity │ Defeat │ Dialectical Trees │ Marking   │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                   Interpreter                         │   │
//! │  │  YES │ NO │ UNDECIDED │ UNKNOWN + Warrant            │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use aingle_defeasible::{Answer, Interpreter, Program};
//!
//! let program = Program::parse(
//!     "bird(X) <- chicken(X).
//!      chicken(tina).
//!      flies(X) -< bird(X).
//!      ~flies(X) -< chicken(X).",
//! )?;
//!
//! let mut interpreter = Interpreter::new(&program)?;
//! let result = interpreter.query(&"flies(tina)".parse()?)?;
//! assert_eq!(result.answer, Answer::No);
//! ```

pub mod argument;
pub mod config;
pub mod defeat;
pub mod derivation;
pub mod dialectical;
pub mod error;
pub mod grounder;
pub mod interpreter;
pub mod parser;
pub mod program;
pub mod render;
pub mod rule;
pub mod term;

// Re-exports
pub use argument::{Comparator, Structure};
pub use config::EngineConfig;
pub use defeat::{Defeat, DefeaterKind, DefeaterSummary};
pub use derivation::{disagree, Derivation, DerivationSearch, RuleIndex};
pub use dialectical::{DialecticalTree, Mark, TreeNode};
pub use error::{Error, Result};
pub use grounder::Grounder;
pub use interpreter::{Answer, Interpreter, InterpreterStats, QueryResult};
pub use parser::{parse_literal, parse_program, parse_rule, parse_rules};
pub use program::Program;
pub use render::{render, Element};
pub use rule::{Rule, RuleBuilder, RuleKind};
pub use term::{Atom, Literal, Substitution, Term};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
