//! Program text parser
//!
//! ```text
//! program  := rule*
//! rule     := literal ( ("<-" | "-<") literal ("," literal)* )? "."
//! literal  := "~"* atom
//! atom     := functor ( "(" term ("," term)* ")" )?
//! term     := boolean | integer | real | string | identifier | variable
//! ```
//!
//! An odd number of `~` negates a literal. `%` or `#` starts a comment that
//! runs to the end of the line; comments and whitespace may appear between
//! any two tokens. Printed programs use `#` for their section headers.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char as nomchar, digit1, multispace1, not_line_ending, one_of, satisfy},
    combinator::{map, map_res, opt, recognize, value, verify},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many0_count, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use std::str::FromStr;

use log::debug;

use crate::error::{Error, Result};
use crate::program::Program;
use crate::rule::{Rule, RuleKind};
use crate::term::{Atom, Literal, Term};

pub type IResult<I, O, E = VerboseError<I>> = std::result::Result<(I, O), nom::Err<E>>;

type In<'a> = &'a str;

/// Skips whitespace and comments.
fn skip(s: In) -> IResult<In, ()> {
    let comment = value((), pair(one_of("%#"), not_line_ending));
    value((), many0_count(alt((value((), multispace1), comment))))(s)
}

fn wsl<'a, F, O>(inner: F) -> impl FnMut(In<'a>) -> IResult<In<'a>, O>
where
    F: FnMut(In<'a>) -> IResult<In<'a>, O>,
{
    preceded(skip, inner)
}

fn identifier(s: In) -> IResult<In, In> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(s)
}

fn quoted(s: In) -> IResult<In, In> {
    alt((
        delimited(nomchar('"'), take_while(|c: char| c != '"'), nomchar('"')),
        delimited(nomchar('\''), take_while(|c: char| c != '\''), nomchar('\'')),
    ))(s)
}

fn number(s: In) -> IResult<In, Term> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(nomchar('.'), digit1)))),
        recognize(pair(nomchar('.'), digit1)),
    ));
    let text = recognize(tuple((
        opt(nomchar('-')),
        mantissa,
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )));
    map_res(text, |t: &str| -> std::result::Result<Term, String> {
        if t.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
            t.parse::<f64>().map(Term::Real).map_err(|e| e.to_string())
        } else {
            t.parse::<i64>().map(Term::Integer).map_err(|e| e.to_string())
        }
    })(s)
}

/// A bare word: boolean keyword, variable or symbolic constant.
fn word(s: In) -> IResult<In, Term> {
    map(identifier, |w: &str| {
        if w.eq_ignore_ascii_case("true") {
            Term::Boolean(true)
        } else if w.eq_ignore_ascii_case("false") {
            Term::Boolean(false)
        } else if Term::is_variable_name(w) {
            Term::variable(w)
        } else {
            Term::constant(w)
        }
    })(s)
}

fn term(s: In) -> IResult<In, Term> {
    context(
        "term",
        wsl(alt((map(quoted, Term::constant), number, word))),
    )(s)
}

fn functor(s: In) -> IResult<In, In> {
    context(
        "predicate name",
        wsl(alt((quoted, verify(identifier, |w: &str| !Term::is_variable_name(w))))),
    )(s)
}

fn atom(s: In) -> IResult<In, Atom> {
    let arguments = delimited(
        wsl(nomchar('(')),
        separated_list0(wsl(nomchar(',')), term),
        wsl(nomchar(')')),
    );
    map(pair(functor, opt(arguments)), |(name, terms)| {
        Atom::new(name, terms.unwrap_or_default())
    })(s)
}

fn literal(s: In) -> IResult<In, Literal> {
    context(
        "literal",
        map(pair(many0_count(wsl(nomchar('~'))), atom), |(tildes, atom)| {
            Literal::new(tildes % 2 == 1, atom)
        }),
    )(s)
}

fn arrow(s: In) -> IResult<In, RuleKind> {
    wsl(alt((
        value(RuleKind::Strict, tag("<-")),
        value(RuleKind::Defeasible, tag("-<")),
    )))(s)
}

fn rule(s: In) -> IResult<In, Rule> {
    let body = pair(arrow, separated_list0(wsl(nomchar(',')), literal));
    map(
        terminated(pair(literal, opt(body)), context("'.'", wsl(nomchar('.')))),
        |(head, body)| match body {
            Some((kind, body)) => Rule::new(head, kind, body),
            None => Rule::fact(head),
        },
    )(s)
}

/// Converts a nom error into `Error::Parse` with a 1-based position in `text`.
fn to_error(text: &str, err: nom::Err<VerboseError<In>>) -> Error {
    let errors = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.errors,
        nom::Err::Incomplete(_) => Vec::new(),
    };

    let (offset, message) = match errors.first() {
        Some((rest, kind)) => {
            let message = match kind {
                VerboseErrorKind::Char(c) => format!("expected '{}'", c),
                VerboseErrorKind::Context(ctx) => format!("expected {}", ctx),
                VerboseErrorKind::Nom(kind) => format!("unexpected input ({:?})", kind),
            };
            let outer = errors.iter().find_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(ctx) => Some(*ctx),
                _ => None,
            });
            let message = match outer {
                Some(ctx) if !message.ends_with(ctx) => format!("{} in {}", message, ctx),
                _ => message,
            };
            (text.len() - rest.len(), message)
        }
        None => (text.len(), "unexpected end of input".to_string()),
    };

    let consumed = &text[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0)
        + 1;
    Error::Parse {
        line,
        column,
        message,
    }
}

/// Fails unless only whitespace and comments remain.
fn finish(text: &str, rest: In) -> Result<()> {
    let (rest, _) = skip(rest).map_err(|e| to_error(text, e))?;
    if rest.is_empty() {
        Ok(())
    } else {
        let offset = text.len() - rest.len();
        Err(to_error(
            text,
            nom::Err::Error(VerboseError {
                errors: vec![(&text[offset..], VerboseErrorKind::Context("end of input"))],
            }),
        ))
    }
}

/// Parses the rules of a program without validating it.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();
    let mut input = text;
    loop {
        let (rest, _) = skip(input).map_err(|e| to_error(text, e))?;
        if rest.is_empty() {
            break;
        }
        let (rest, parsed) = rule(rest).map_err(|e| to_error(text, e))?;
        rules.push(parsed);
        input = rest;
    }
    Ok(rules)
}

/// Parses and validates a program.
///
/// # Errors
///
/// Returns `Error::Parse` for malformed text and `Error::ContradictoryProgram`
/// when the strict part of the program is contradictory.
pub fn parse_program(text: &str) -> Result<Program> {
    let rules = parse_rules(text)?;
    debug!("Parsed {} rules", rules.len());
    Program::new(rules)
}

/// Parses exactly one rule.
pub fn parse_rule(text: &str) -> Result<Rule> {
    let (rest, parsed) = rule(text).map_err(|e| to_error(text, e))?;
    finish(text, rest)?;
    Ok(parsed)
}

/// Parses exactly one literal.
pub fn parse_literal(text: &str) -> Result<Literal> {
    let (rest, parsed) = literal(text).map_err(|e| to_error(text, e))?;
    finish(text, rest)?;
    Ok(parsed)
}

impl FromStr for Rule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_rule(s)
    }
}

impl FromStr for Literal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_literal(s)
    }
}
