//! Clause syntax.
//!
//! ```text
//! clause := term [":-" term] "."
//! term   := name ["(" [term {sep term}] ")"]
//! sep    := "," | whitespace
//! ```
//!
//! A name is any run of bytes other than whitespace, `(`, `)`, `,`, `.` and
//! `%`, ending before any `:-`; one starting with an ASCII uppercase letter
//! is a variable. Since `:-` is an ordinary name, the prefix form
//! `:-(head, body).` is accepted too.
//! `%` starts a comment running to the end of the line.

use bstr::ByteSlice;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_while_m_n};
use nom::character::complete::{char, multispace1};
use nom::combinator::{all_consuming, cut, not, opt, recognize, value};
use nom::multi::{many0, many0_count, many1_count, separated_list0};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::{IResult, Offset};

use crate::database::{RawTerm, RULE_CONNECTIVE};
use crate::error::ParseError;
use crate::symbols::{SymbolTable, VARIABLE_ARITY};

/// Parse every clause of `source`, in order.
///
/// # Errors
///
/// Returns the position of the first syntax error.
pub fn parse_program(source: &[u8], symbols: &mut SymbolTable) -> Result<Vec<RawTerm>, ParseError> {
    let (_, clauses) = program(source).map_err(|err| syntax_error(source, err))?;
    let mut lowering = Lowering { source, symbols };
    clauses
        .iter()
        .map(|clause| lowering.clause(clause))
        .collect()
}

/// Parse a single goal; the trailing `.` is optional.
///
/// # Errors
///
/// Returns the position of the first syntax error.
pub fn parse_term(source: &[u8], symbols: &mut SymbolTable) -> Result<RawTerm, ParseError> {
    let (_, node) = goal(source).map_err(|err| syntax_error(source, err))?;
    Lowering { source, symbols }.term(&node)
}

#[derive(Debug)]
struct Node<'a> {
    name: &'a [u8],
    /// `None` without parentheses, so `X` and `X()` can be told apart.
    args: Option<Vec<Node<'a>>>,
}

#[derive(Debug)]
struct ClauseSyntax<'a> {
    head: Node<'a>,
    body: Option<Node<'a>>,
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b',' | b'.' | b'%') || byte.is_ascii_whitespace()
}

fn comment(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(char('%'), take_till(|b| b == b'\n')))(input)
}

fn ws(input: &[u8]) -> IResult<&[u8], ()> {
    value((), many0_count(alt((multispace1, comment))))(input)
}

fn ws1(input: &[u8]) -> IResult<&[u8], ()> {
    value((), many1_count(alt((multispace1, comment))))(input)
}

fn name_byte(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while_m_n(1, 1, |b| !is_delimiter(b))(input)
}

/// A name stops where `:-` begins, so `main:-go.` is a rule; a leading `:-`
/// is the connective's own name.
fn name(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let connective = RULE_CONNECTIVE.as_bytes();
    recognize(pair(
        alt((tag(connective), name_byte)),
        many0_count(preceded(not(tag(connective)), name_byte)),
    ))(input)
}

fn separator(input: &[u8]) -> IResult<&[u8], ()> {
    alt((value((), tuple((ws, char(','), ws))), ws1))(input)
}

fn arguments(input: &[u8]) -> IResult<&[u8], Vec<Node<'_>>> {
    terminated(
        preceded(ws, separated_list0(separator, term)),
        pair(ws, char(')')),
    )(input)
}

fn term(input: &[u8]) -> IResult<&[u8], Node<'_>> {
    let (input, name) = name(input)?;
    let (input, args) = opt(preceded(char('('), cut(arguments)))(input)?;
    Ok((input, Node { name, args }))
}

fn clause(input: &[u8]) -> IResult<&[u8], ClauseSyntax<'_>> {
    let (input, head) = term(input)?;
    let (input, body) = opt(preceded(delimited(ws, tag(":-"), ws), cut(term)))(input)?;
    let (input, _) = preceded(ws, cut(char('.')))(input)?;
    Ok((input, ClauseSyntax { head, body }))
}

fn program(input: &[u8]) -> IResult<&[u8], Vec<ClauseSyntax<'_>>> {
    all_consuming(preceded(ws, many0(terminated(clause, ws))))(input)
}

fn goal(input: &[u8]) -> IResult<&[u8], Node<'_>> {
    all_consuming(delimited(ws, term, tuple((ws, opt(char('.')), ws))))(input)
}

fn syntax_error(source: &[u8], err: nom::Err<nom::error::Error<&[u8]>>) -> ParseError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let rest = e.input;
            let message = if rest.is_empty() {
                "unexpected end of input".to_owned()
            } else {
                let line = rest.lines().next().unwrap_or(rest);
                format!("unexpected `{}`", line[..line.len().min(24)].as_bstr())
            };
            ParseError::at(source, source.offset(rest), message)
        }
        nom::Err::Incomplete(_) => ParseError::at(source, source.len(), "unexpected end of input"),
    }
}

/// Interns the names of a parsed tree.
struct Lowering<'s> {
    source: &'s [u8],
    symbols: &'s mut SymbolTable,
}

impl Lowering<'_> {
    fn clause(&mut self, clause: &ClauseSyntax<'_>) -> Result<RawTerm, ParseError> {
        let head = self.term(&clause.head)?;
        match &clause.body {
            None => Ok(head),
            Some(body) => {
                let body = self.term(body)?;
                let connective = self.symbols.intern(RULE_CONNECTIVE, 2);
                Ok(RawTerm::Compound(connective, vec![head, body]))
            }
        }
    }

    fn term(&mut self, node: &Node<'_>) -> Result<RawTerm, ParseError> {
        let name = node.name.to_str_lossy();
        if node.name.first().is_some_and(u8::is_ascii_uppercase) {
            if node.args.is_some() {
                return Err(ParseError::at(
                    self.source,
                    self.source.offset(node.name),
                    format!("variable `{name}` cannot take arguments"),
                ));
            }
            return Ok(RawTerm::Var(self.symbols.intern(&name, VARIABLE_ARITY)));
        }

        let args = node
            .args
            .iter()
            .flatten()
            .map(|arg| self.term(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let arity = i32::try_from(args.len()).map_err(|_| {
            ParseError::at(self.source, self.source.offset(node.name), "too many arguments")
        })?;
        Ok(RawTerm::Compound(self.symbols.intern(&name, arity), args))
    }
}
