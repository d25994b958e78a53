/*!
  Atoms are the intermediate representation handed from the parser to the backend: one
  three-operand operation each. The textual form the parser writes has an opcode followed by five
  operand slots, most of them empty:

  ```text
  (ADD, left, right, result)
  (NEG, operand, , result)
  (MOV, source, , destination)
  (JMP, , , , , label)
  (LBL, , , , , label)
  (TST, left, right, , cmp, label)
  ```

  In memory, each opcode is its own `Atom` variant carrying exactly the operands it uses, so an
  atom with an operand of the wrong kind cannot exist. The slot view is still available through
  `Atom::operands`, which is what the allocator walks.
*/

use std::fmt::{Display, Formatter};

use string_cache::DefaultAtom;
use strum_macros::{Display as StrumDisplay, IntoStaticStr, EnumString, EnumIter};

use crate::bytecode::Comparison;
use crate::error::AtomError;

/// Variable and label names are interned.
pub type Name = DefaultAtom;

pub const SLOT_COUNT: usize = 5;

#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter,
  Clone,        Copy,          Eq,         PartialEq, Debug, Hash
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AtomKind {
  Add,
  Sub,
  Mul,
  Div,
  Neg,
  Mov,
  Jmp,
  Lbl,
  Tst,
}

impl AtomKind {

  /// The number of instructions the emitter produces for an atom of this kind.
  pub fn instruction_count(&self) -> u32 {
    match self {
      | AtomKind::Add
      | AtomKind::Sub
      | AtomKind::Mul
      | AtomKind::Div
      | AtomKind::Tst => 3,
      | AtomKind::Jmp
      | AtomKind::Mov => 2,
      AtomKind::Neg   => 4,
      AtomKind::Lbl   => 0,
    }
  }

  /// The operand slots this kind uses. All of them are required.
  pub fn slots(&self) -> &'static [usize] {
    match self {
      | AtomKind::Add
      | AtomKind::Sub
      | AtomKind::Mul
      | AtomKind::Div => &[0, 1, 2],
      | AtomKind::Neg
      | AtomKind::Mov => &[0, 2],
      | AtomKind::Jmp
      | AtomKind::Lbl => &[4],
      AtomKind::Tst   => &[0, 1, 3, 4],
    }
  }

}

/// An operand that may be either a constant or a variable.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Constant(f32),
  Variable(Name)
}

impl Value {

  /**
    Decides once, from the operand's text, whether it is a constant or a variable: anything that
    parses as a float is a constant. Text starting with a letter or `_` is always a name, so
    identifiers like `inf` and `nan` stay variables.
  */
  pub fn classify(text: &str) -> Value {
    let text = text.trim();
    if text.starts_with(|c: char| c.is_alphabetic() || c == '_') {
      return Value::Variable(Name::from(text));
    }
    match text.parse::<f32>() {
      Ok(value) => Value::Constant(value),
      Err(_)    => Value::Variable(Name::from(text))
    }
  }

  pub fn to_operand(&self) -> Operand {
    match self {
      Value::Constant(value) => Operand::Constant(*value),
      Value::Variable(name)  => Operand::Variable(name.clone())
    }
  }

}

impl From<f32> for Value {
  fn from(value: f32) -> Self {
    Value::Constant(value)
  }
}

// Unsuffixed float literals are `f64`.
impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Constant(value as f32)
  }
}

impl From<&str> for Value {
  fn from(name: &str) -> Self {
    Value::Variable(Name::from(name))
  }
}

impl Display for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_operand())
  }
}

/// The tagged value held in one operand slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
  Variable(Name),
  Constant(f32),
  LabelDefinition(Name),
  LabelUse(Name),
  Cmp(Comparison)
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      | Operand::Variable(name)
      | Operand::LabelDefinition(name)
      | Operand::LabelUse(name)  => write!(f, "{}", name),
      Operand::Constant(value)   => write!(f, "{}", value),
      Operand::Cmp(comparison)   => write!(f, "{}", comparison.code())
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
  Add { lhs: Value, rhs: Value, result: Name },
  Sub { lhs: Value, rhs: Value, result: Name },
  Mul { lhs: Value, rhs: Value, result: Name },
  Div { lhs: Value, rhs: Value, result: Name },
  Neg { operand: Value, result: Name },
  Mov { source: Value, destination: Name },
  Jmp { label: Name },
  Lbl { label: Name },
  Tst { lhs: Value, rhs: Value, comparison: Comparison, label: Name },
}

impl Atom {

  // region Constructors

  pub fn add(lhs: impl Into<Value>, rhs: impl Into<Value>, result: &str) -> Atom {
    Atom::Add { lhs: lhs.into(), rhs: rhs.into(), result: Name::from(result) }
  }

  pub fn sub(lhs: impl Into<Value>, rhs: impl Into<Value>, result: &str) -> Atom {
    Atom::Sub { lhs: lhs.into(), rhs: rhs.into(), result: Name::from(result) }
  }

  pub fn mul(lhs: impl Into<Value>, rhs: impl Into<Value>, result: &str) -> Atom {
    Atom::Mul { lhs: lhs.into(), rhs: rhs.into(), result: Name::from(result) }
  }

  pub fn div(lhs: impl Into<Value>, rhs: impl Into<Value>, result: &str) -> Atom {
    Atom::Div { lhs: lhs.into(), rhs: rhs.into(), result: Name::from(result) }
  }

  pub fn neg(operand: impl Into<Value>, result: &str) -> Atom {
    Atom::Neg { operand: operand.into(), result: Name::from(result) }
  }

  pub fn mov(source: impl Into<Value>, destination: &str) -> Atom {
    Atom::Mov { source: source.into(), destination: Name::from(destination) }
  }

  pub fn jmp(label: &str) -> Atom {
    Atom::Jmp { label: Name::from(label) }
  }

  pub fn lbl(label: &str) -> Atom {
    Atom::Lbl { label: Name::from(label) }
  }

  pub fn tst(lhs: impl Into<Value>, rhs: impl Into<Value>, comparison: Comparison, label: &str)
    -> Atom
  {
    Atom::Tst {
      lhs        : lhs.into(),
      rhs        : rhs.into(),
      comparison,
      label      : Name::from(label)
    }
  }

  /**
    Builds an atom from the text of its operand slots, classifying constant-or-variable operands
    and checking that every slot holds what the opcode expects. Empty slots may be given as `None`
    or as blank text; slots past the end of `slots` are empty.
  */
  pub fn from_slots(kind: AtomKind, slots: &[Option<&str>]) -> Result<Atom, AtomError> {
    if slots.len() > SLOT_COUNT {
      return Err(AtomError::TooManyOperands { kind, count: slots.len() });
    }

    let text_at = |slot: usize| {
      slots.get(slot).copied().flatten().map(str::trim).filter(|t| !t.is_empty())
    };

    for slot in 0..slots.len() {
      if let Some(text) = text_at(slot) {
        if !kind.slots().contains(&slot) {
          return Err(AtomError::UnexpectedOperand { kind, slot, text: text.to_string() });
        }
      }
    }

    let required = |slot: usize| text_at(slot).ok_or(AtomError::MissingOperand { kind, slot });
    let value = |slot: usize| -> Result<Value, AtomError> {
      Ok(Value::classify(required(slot)?))
    };
    let name = |slot: usize, expected: &'static str| -> Result<Name, AtomError> {
      let text = required(slot)?;
      match Value::classify(text) {
        Value::Variable(name) => Ok(name),
        Value::Constant(_)    => Err(AtomError::KindMismatch {
          kind, slot, expected, text: text.to_string()
        })
      }
    };
    let comparison = |slot: usize| -> Result<Comparison, AtomError> {
      let text = required(slot)?;
      match text.parse::<u8>() {
        Ok(code @ 1..=6) => Comparison::try_from(code)
                              .map_err(|_| AtomError::UnknownComparison(text.to_string())),
        _                => Err(AtomError::UnknownComparison(text.to_string()))
      }
    };

    let atom = match kind {
      AtomKind::Add => Atom::Add { lhs: value(0)?, rhs: value(1)?, result: name(2, "variable")? },
      AtomKind::Sub => Atom::Sub { lhs: value(0)?, rhs: value(1)?, result: name(2, "variable")? },
      AtomKind::Mul => Atom::Mul { lhs: value(0)?, rhs: value(1)?, result: name(2, "variable")? },
      AtomKind::Div => Atom::Div { lhs: value(0)?, rhs: value(1)?, result: name(2, "variable")? },
      AtomKind::Neg => Atom::Neg { operand: value(0)?, result: name(2, "variable")? },
      AtomKind::Mov => Atom::Mov { source: value(0)?, destination: name(2, "variable")? },
      AtomKind::Jmp => Atom::Jmp { label: name(4, "label")? },
      AtomKind::Lbl => Atom::Lbl { label: name(4, "label")? },
      AtomKind::Tst => Atom::Tst {
        lhs        : value(0)?,
        rhs        : value(1)?,
        comparison : comparison(3)?,
        label      : name(4, "label")?
      },
    };
    Ok(atom)
  }

  // endregion

  pub fn kind(&self) -> AtomKind {
    match self {
      Atom::Add { .. } => AtomKind::Add,
      Atom::Sub { .. } => AtomKind::Sub,
      Atom::Mul { .. } => AtomKind::Mul,
      Atom::Div { .. } => AtomKind::Div,
      Atom::Neg { .. } => AtomKind::Neg,
      Atom::Mov { .. } => AtomKind::Mov,
      Atom::Jmp { .. } => AtomKind::Jmp,
      Atom::Lbl { .. } => AtomKind::Lbl,
      Atom::Tst { .. } => AtomKind::Tst,
    }
  }

  /// The operands in their slots.
  pub fn operands(&self) -> [Option<Operand>; SLOT_COUNT] {
    let mut slots: [Option<Operand>; SLOT_COUNT] = Default::default();
    match self {
      | Atom::Add { lhs, rhs, result }
      | Atom::Sub { lhs, rhs, result }
      | Atom::Mul { lhs, rhs, result }
      | Atom::Div { lhs, rhs, result } => {
        slots[0] = Some(lhs.to_operand());
        slots[1] = Some(rhs.to_operand());
        slots[2] = Some(Operand::Variable(result.clone()));
      }
      Atom::Neg { operand: source, result: destination }
      | Atom::Mov { source, destination } => {
        slots[0] = Some(source.to_operand());
        slots[2] = Some(Operand::Variable(destination.clone()));
      }
      Atom::Jmp { label } => {
        slots[4] = Some(Operand::LabelUse(label.clone()));
      }
      Atom::Lbl { label } => {
        slots[4] = Some(Operand::LabelDefinition(label.clone()));
      }
      Atom::Tst { lhs, rhs, comparison, label } => {
        slots[0] = Some(lhs.to_operand());
        slots[1] = Some(rhs.to_operand());
        slots[3] = Some(Operand::Cmp(*comparison));
        slots[4] = Some(Operand::LabelUse(label.clone()));
      }
    }
    slots
  }

  /// The label this atom jumps to, if any.
  pub fn label_use(&self) -> Option<&Name> {
    match self {
      Atom::Jmp { label } | Atom::Tst { label, .. } => Some(label),
      _                                             => None
    }
  }

}

impl Display for Atom {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let slots = self.operands();
    let used = slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
    let mut parts = vec![self.kind().to_string()];
    parts.extend(
      slots[..used]
        .iter()
        .map(|slot| slot.as_ref().map_or(String::new(), |operand| operand.to_string()))
    );
    write!(f, "({})", parts.join(", "))
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn classify_numbers_and_names(){
    assert_eq!(Value::classify("5"), Value::Constant(5.0));
    assert_eq!(Value::classify(" -2.5 "), Value::Constant(-2.5));
    assert_eq!(Value::classify(".5"), Value::Constant(0.5));
    assert_eq!(Value::classify("x"), Value::from("x"));
    assert_eq!(Value::classify("t0"), Value::from("t0"));
    assert_eq!(Value::classify("inf"), Value::from("inf"));
    assert_eq!(Value::classify("NaN"), Value::from("NaN"));
  }

  #[test]
  fn kind_from_text(){
    assert_eq!(AtomKind::from_str("TST"), Ok(AtomKind::Tst));
    assert_eq!(AtomKind::from_str("mov"), Ok(AtomKind::Mov));
    assert!(AtomKind::from_str("NOP").is_err());
  }

  #[test]
  fn instruction_counts(){
    assert_eq!(AtomKind::Add.instruction_count(), 3);
    assert_eq!(AtomKind::Tst.instruction_count(), 3);
    assert_eq!(AtomKind::Mov.instruction_count(), 2);
    assert_eq!(AtomKind::Jmp.instruction_count(), 2);
    assert_eq!(AtomKind::Neg.instruction_count(), 4);
    assert_eq!(AtomKind::Lbl.instruction_count(), 0);
  }

  #[test]
  fn build_from_slots(){
    let atom = Atom::from_slots(AtomKind::Add, &[Some("x"), Some("3"), Some("y")]).unwrap();
    assert_eq!(atom, Atom::add("x", 3.0, "y"));

    let atom = Atom::from_slots(AtomKind::Mov, &[Some("5"), None, Some("x")]).unwrap();
    assert_eq!(atom, Atom::mov(5.0, "x"));

    let atom = Atom::from_slots(
      AtomKind::Tst, &[Some("a"), Some("1"), None, Some("6"), Some("l0")]
    ).unwrap();
    assert_eq!(atom, Atom::tst("a", 1.0, Comparison::Unequal, "l0"));

    let atom = Atom::from_slots(AtomKind::Jmp, &[None, Some(" "), None, None, Some("l1")]).unwrap();
    assert_eq!(atom, Atom::jmp("l1"));
  }

  #[test]
  fn slot_errors(){
    assert_eq!(
      Atom::from_slots(AtomKind::Add, &[Some("x"), Some("y")]),
      Err(AtomError::MissingOperand { kind: AtomKind::Add, slot: 2 })
    );
    assert!(matches!(
      Atom::from_slots(AtomKind::Mov, &[Some("x"), Some("y"), Some("z")]),
      Err(AtomError::UnexpectedOperand { slot: 1, .. })
    ));
    assert!(matches!(
      Atom::from_slots(AtomKind::Lbl, &[None, None, None, None, Some("7")]),
      Err(AtomError::KindMismatch { expected: "label", .. })
    ));
    assert!(matches!(
      Atom::from_slots(AtomKind::Mov, &[Some("x"), None, Some("2")]),
      Err(AtomError::KindMismatch { expected: "variable", .. })
    ));
    assert_eq!(
      Atom::from_slots(AtomKind::Tst, &[Some("a"), Some("b"), None, Some("0"), Some("l")]),
      Err(AtomError::UnknownComparison("0".to_string()))
    );
    assert_eq!(
      Atom::from_slots(AtomKind::Tst, &[Some("a"), Some("b"), None, Some("7"), Some("l")]),
      Err(AtomError::UnknownComparison("7".to_string()))
    );
    assert!(matches!(
      Atom::from_slots(AtomKind::Jmp, &[None, None, None, None, Some("l"), Some("m")]),
      Err(AtomError::TooManyOperands { count: 6, .. })
    ));
  }

  #[test]
  fn operand_slots(){
    let slots = Atom::tst("a", 2.0, Comparison::Lesser, "l0").operands();
    assert_eq!(slots[0], Some(Operand::Variable(Name::from("a"))));
    assert_eq!(slots[1], Some(Operand::Constant(2.0)));
    assert_eq!(slots[2], None);
    assert_eq!(slots[3], Some(Operand::Cmp(Comparison::Lesser)));
    assert_eq!(slots[4], Some(Operand::LabelUse(Name::from("l0"))));

    let slots = Atom::lbl("l0").operands();
    assert_eq!(slots[4], Some(Operand::LabelDefinition(Name::from("l0"))));
  }

  #[test]
  fn display_matches_slot_text(){
    assert_eq!(Atom::add("x", 3.0, "y").to_string(), "(ADD, x, 3, y)");
    assert_eq!(Atom::mov(5.0, "x").to_string(), "(MOV, 5, , x)");
    assert_eq!(Atom::neg("a", "b").to_string(), "(NEG, a, , b)");
    assert_eq!(Atom::jmp("l0").to_string(), "(JMP, , , , , l0)");
    assert_eq!(Atom::tst("a", 1.0, Comparison::Unequal, "l1").to_string(), "(TST, a, 1, , 6, l1)");
  }
}
