/*!

This module reads atoms from text, one atom per line, as the front end writes them out.

The language is given by the following EBNF:
    ```
    <atoms>   ::=  (<line> '\n')*
    <line>    ::=  <atom>? <comment>?
    <atom>    ::=  '(' <opcode> (',' <slot>)* ')'
    <opcode>  ::=  <alpha>+
    <slot>    ::=  [^,)\n]*
    <comment> ::=  '#' .*
    ```

Whitespace around tokens is ignored, as are blank lines. Opcodes are matched without regard to
case. Empty slots may be left blank, and trailing empty slots may be left out altogether, so
`(JMP, , , , , l0)` needs all its commas but `(MOV, 5, , x)` stops after the destination.

*/

use std::str::FromStr;

use log::debug;
use nom::{
  character::complete::{
    alpha1,
    char as one_char,
    space0
  },
  bytes::complete::is_not,
  combinator::{
    all_consuming,
    map,
    opt
  },
  multi::many0,
  sequence::{
    delimited,
    pair,
    preceded
  },
  IResult
};

use crate::atom::{Atom, AtomKind};
use crate::error::{AtomError, CompileError};

/// Reads every atom in `text`. Stops at the first malformed line.
pub fn parse(text: &str) -> Result<Vec<Atom>, CompileError> {
  let mut atoms = Vec::new();

  for (index, line) in text.lines().enumerate() {
    let line = strip_comment(line).trim();
    if line.is_empty() {
      continue;
    }
    let atom = parse_atom(line).map_err(|error| CompileError::Atom { line: index + 1, error })?;
    atoms.push(atom);
  }

  debug!("Read {} atoms.", atoms.len());
  Ok(atoms)
}

/// Reads a single atom. The text must hold the atom and nothing else besides whitespace.
pub fn parse_atom(text: &str) -> Result<Atom, AtomError> {
  let (name, slots) = match all_consuming(patom)(text) {
    Ok((_, parsed)) => parsed,
    Err(_)          => return Err(AtomError::Syntax(text.trim().to_string()))
  };
  let kind = AtomKind::from_str(name).map_err(|_| AtomError::UnknownAtom(name.to_string()))?;
  Atom::from_slots(kind, &slots)
}

impl FromStr for Atom {
  type Err = AtomError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    parse_atom(text)
  }
}

fn strip_comment(line: &str) -> &str {
  match line.find('#') {
    Some(start) => &line[..start],
    None        => line
  }
}

/// <atom> ::= '(' <opcode> (',' <slot>)* ')'
fn patom(input: &str) -> IResult<&str, (&str, Vec<Option<&str>>)> {
  delimited(
    pair(space0, one_char('(')),
    pair(
      delimited(space0, alpha1, space0),
      many0(preceded(one_char(','), pslot))
    ),
    pair(one_char(')'), space0)
  )(input)
}

/// <slot> ::= [^,)\n]*
fn pslot(input: &str) -> IResult<&str, Option<&str>> {
  map(
    opt(is_not(",)\r\n")),
    |text: Option<&str>| text.map(str::trim).filter(|t| !t.is_empty())
  )(input)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::Comparison;

  #[test]
  fn single_atoms(){
    assert_eq!(parse_atom("(ADD, x, 3, y)"), Ok(Atom::add("x", 3.0, "y")));
    assert_eq!(parse_atom("  (mov,5,,x)  "), Ok(Atom::mov(5.0, "x")));
    assert_eq!(parse_atom("(JMP, , , , , l0)"), Ok(Atom::jmp("l0")));
    assert_eq!(parse_atom("(LBL, , , , , l0)"), Ok(Atom::lbl("l0")));
    assert_eq!(
      parse_atom("(TST, a, b, , 2, l3)"),
      Ok(Atom::tst("a", "b", Comparison::Lesser, "l3"))
    );
    assert_eq!(parse_atom("(NEG, -1.5, , t)"), Ok(Atom::neg(-1.5, "t")));
  }

  #[test]
  fn from_str_reads_display_output(){
    let atoms = vec![
      Atom::sub(1.0, "y", "z"),
      Atom::div("a", 0.25, "b"),
      Atom::tst(0.0, "q", Comparison::GreaterOrEqual, "done"),
      Atom::jmp("done"),
    ];
    for atom in atoms {
      assert_eq!(atom.to_string().parse::<Atom>(), Ok(atom));
    }
  }

  #[test]
  fn malformed_atoms(){
    assert!(matches!(parse_atom("ADD, x, 3, y"), Err(AtomError::Syntax(_))));
    assert!(matches!(parse_atom("(ADD, x, 3, y"), Err(AtomError::Syntax(_))));
    assert!(matches!(parse_atom("(ADD, x, 3, y) trailing"), Err(AtomError::Syntax(_))));
    assert_eq!(parse_atom("(NOP, , , , , l0)"), Err(AtomError::UnknownAtom("NOP".to_string())));
    assert!(matches!(parse_atom("(ADD, x)"), Err(AtomError::MissingOperand { slot: 1, .. })));
  }

  #[test]
  fn program_with_comments_and_blank_lines(){
    let text = "
      # initialise
      (MOV, 5, , x)   # x = 5

      (ADD, x, 3, y)
    ";
    let atoms = parse(text).unwrap();
    assert_eq!(atoms, vec![Atom::mov(5.0, "x"), Atom::add("x", 3.0, "y")]);
  }

  #[test]
  fn errors_carry_line_numbers(){
    let text = "(MOV, 5, , x)\n\n(LBL, , , , , 9)\n";
    match parse(text) {
      Err(CompileError::Atom { line, error: AtomError::KindMismatch { .. } }) => {
        assert_eq!(line, 3)
      }
      other => panic!("expected a kind mismatch on line 3, got {:?}", other),
    }
  }
}
