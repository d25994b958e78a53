//! Error types for every stage of the pipeline. Each stage aborts on its first error; nothing here
//! is recoverable, so the variants carry as much context as the stage has at hand.

use std::fmt::{Display, Formatter};

use crate::atom::AtomKind;
use crate::bytecode::{Field, Word};

/// A field handed to the instruction codec does not fit its bit width.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EncodeError {
  FieldOutOfRange {
    field : Field,
    value : u32,
    max   : u32
  }
}

impl Display for EncodeError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      EncodeError::FieldOutOfRange { field, value, max } => {
        write!(f, "{} field value {} is out of range (maximum {})", field, value, max)
      }
    }
  }
}

impl std::error::Error for EncodeError {}

/// A word does not decode to an instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
  InvalidOpcode {
    word   : Word,
    opcode : u32
  },
  InvalidComparison {
    word       : Word,
    comparison : u32
  }
}

impl Display for DecodeError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      DecodeError::InvalidOpcode { word, opcode } => {
        write!(f, "word {:08x} has unknown opcode {}", word, opcode)
      }
      DecodeError::InvalidComparison { word, comparison } => {
        write!(f, "word {:08x} has unknown comparison kind {}", word, comparison)
      }
    }
  }
}

impl std::error::Error for DecodeError {}

/// An atom could not be built, either from its text or from its operand slots.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AtomError {
  /// The line is not of the form `(OPCODE, slot, ...)`.
  Syntax(String),
  UnknownAtom(String),
  MissingOperand {
    kind : AtomKind,
    slot : usize
  },
  /// A slot the opcode does not use holds a value.
  UnexpectedOperand {
    kind : AtomKind,
    slot : usize,
    text : String
  },
  TooManyOperands {
    kind  : AtomKind,
    count : usize
  },
  /// A slot holds a value of the wrong kind, e.g. a number where a label is expected.
  KindMismatch {
    kind     : AtomKind,
    slot     : usize,
    expected : &'static str,
    text     : String
  },
  UnknownComparison(String),
}

impl Display for AtomError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      AtomError::Syntax(text) => write!(f, "malformed atom: {}", text),
      AtomError::UnknownAtom(name) => write!(f, "unknown atom: {}", name),
      AtomError::MissingOperand { kind, slot } => {
        write!(f, "{} atom is missing its operand in slot {}", kind, slot)
      }
      AtomError::UnexpectedOperand { kind, slot, text } => {
        write!(f, "{} atom does not use slot {}, but it holds '{}'", kind, slot, text)
      }
      AtomError::TooManyOperands { kind, count } => {
        write!(f, "{} atom given {} operand slots, at most 5 are allowed", kind, count)
      }
      AtomError::KindMismatch { kind, slot, expected, text } => {
        write!(f, "{} atom expects a {} in slot {}, found '{}'", kind, expected, slot, text)
      }
      AtomError::UnknownComparison(text) => write!(f, "unknown comparison kind: {}", text),
    }
  }
}

impl std::error::Error for AtomError {}

/// Errors raised while turning atoms into a memory image.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
  /// An atom in the input text is malformed. Lines count from 1.
  Atom {
    line  : usize,
    error : AtomError
  },
  UndefinedLabel {
    label      : String,
    atom_index : usize,
    atom       : String
  },
  /// A constant or variable missing from the tables it should have been allocated in.
  UnresolvedSymbol {
    operand : String
  },
  /// Label definitions and comparison kinds have no memory address.
  NotAddressable {
    operand : String
  },
  Encode {
    atom_index : Option<usize>,
    error      : EncodeError
  }
}

impl Display for CompileError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      CompileError::Atom { line, error } => write!(f, "line {}: {}", line, error),
      CompileError::UndefinedLabel { label, atom_index, atom } => {
        write!(f, "undefined label '{}' in atom {} {}", label, atom_index, atom)
      }
      CompileError::UnresolvedSymbol { operand } => {
        write!(f, "operand {} has no allocated address", operand)
      }
      CompileError::NotAddressable { operand } => {
        write!(f, "operand {} does not name a memory address", operand)
      }
      CompileError::Encode { atom_index: Some(index), error } => {
        write!(f, "cannot encode atom {}: {}", index, error)
      }
      CompileError::Encode { atom_index: None, error } => write!(f, "cannot encode: {}", error),
    }
  }
}

impl std::error::Error for CompileError {}

impl From<EncodeError> for CompileError {
  fn from(error: EncodeError) -> Self {
    CompileError::Encode { atom_index: None, error }
  }
}

/// Runtime faults. Running out of cycles is not one of them; see `vm::Outcome`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VmError {
  InvalidInstruction {
    pc    : usize,
    error : DecodeError
  },
  AddressOutOfRange {
    pc      : usize,
    address : usize
  },
  ProgramCounterOutOfRange(usize),
}

impl Display for VmError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      VmError::InvalidInstruction { pc, error } => {
        write!(f, "fatal exception at pc {:04x}: {}", pc, error)
      }
      VmError::AddressOutOfRange { pc, address } => {
        write!(f, "fatal exception at pc {:04x}: address {:x} is outside memory", pc, address)
      }
      VmError::ProgramCounterOutOfRange(pc) => {
        write!(f, "fatal exception: pc {:x} is outside memory", pc)
      }
    }
  }
}

impl std::error::Error for VmError {}
