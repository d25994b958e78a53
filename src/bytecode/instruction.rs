use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, IntoStaticStr, EnumString, EnumIter};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::address::{Address, AddressNumberType};
use crate::error::EncodeError;
use super::binary::{check_field, Field, MAX_REGISTER, MAX_ABSOLUTE_ADDRESS, MAX_DISPLACEMENT};

/**
  Opcodes of the virtual machine.

  The discriminants are the values stored in the opcode field, so the order the opcodes are
  listed below is significant. The variant names are the assembly mnemonics.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[repr(u8)]
pub enum Opcode {
  Clr,    // fp[r] <- 0
  Add,    // fp[r] <- fp[r] + mem[a]
  Sub,    // fp[r] <- fp[r] - mem[a]
  Mul,    // fp[r] <- fp[r] * mem[a]
  Div,    // fp[r] <- fp[r] / mem[a]
  Jmp,    // pc <- a, if flag
  Cmp,    // flag <- fp[r] cmp mem[a]
  Lod,    // fp[r] <- mem[a]
  Sto,    // mem[a] <- fp[r]
  Hlt,
}

/// The comparison kind of a `CMP` instruction. Meaningless for every other opcode.
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Comparison {
  Always,
  Equal,
  Lesser,
  Greater,
  LesserOrEqual,
  GreaterOrEqual,
  Unequal,
}

#[derive(
  StrumDisplay, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,             Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
pub enum Mode {
  Absolute,
  Displacement,
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Whether the address field of this opcode names a memory operand or jump target.
  pub fn uses_address(&self) -> bool {
    !matches!(self, Opcode::Clr | Opcode::Hlt)
  }
}

impl Comparison {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /**
    The logical complement. Each kind's complement is its mirror across 3.5, that is
    `7 - code`, so `EQUAL` and `UNEQUAL` swap, as do `LESSER` and `GREATER_OR_EQUAL`, and
    `GREATER` and `LESSER_OR_EQUAL`. `ALWAYS` has no complement in the set.
  */
  pub fn negate(&self) -> Option<Comparison> {
    match self {
      Comparison::Always => None,
      _                  => Comparison::try_from(7 - self.code()).ok()
    }
  }

  pub fn evaluate(&self, lhs: f32, rhs: f32) -> bool {
    match self {
      Comparison::Always         => true,
      Comparison::Equal          => lhs == rhs,
      Comparison::Lesser         => lhs <  rhs,
      Comparison::Greater        => lhs >  rhs,
      Comparison::LesserOrEqual  => lhs <= rhs,
      Comparison::GreaterOrEqual => lhs >= rhs,
      Comparison::Unequal        => lhs != rhs,
    }
  }
}

/// Holds the unpacked components of an instruction. Only constructed with in-range fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Instruction {
  opcode     : Opcode,
  comparison : Comparison,
  register   : u8,
  address    : Address
}

impl Instruction {

  /**
    Checks every field against its width. The comparison kind is only kept for `CMP`; every
    other opcode stores `ALWAYS`.
  */
  pub fn new(opcode: Opcode, comparison: Comparison, register: u32, address: Address)
    -> Result<Instruction, EncodeError>
  {
    let register = check_field(Field::Register, register, MAX_REGISTER)? as u8;
    check_address(&address)?;
    let comparison = match opcode {
      Opcode::Cmp => comparison,
      _           => Comparison::Always
    };
    Ok(Instruction { opcode, comparison, register, address })
  }

  /// An absolute mode instruction without a comparison.
  pub fn absolute(opcode: Opcode, register: u32, address: AddressNumberType)
    -> Result<Instruction, EncodeError>
  {
    Instruction::new(opcode, Comparison::Always, register, Address::Absolute(address))
  }

  pub fn compare(comparison: Comparison, register: u32, address: AddressNumberType)
    -> Result<Instruction, EncodeError>
  {
    Instruction::new(Opcode::Cmp, comparison, register, Address::Absolute(address))
  }

  pub fn halt() -> Instruction {
    Instruction {
      opcode     : Opcode::Hlt,
      comparison : Comparison::Always,
      register   : 0,
      address    : Address::Absolute(0)
    }
  }

  /// For words that have already been unpacked by `try_decode_instruction`, whose fields are in
  /// range by construction. As in `new`, comparison bits on anything but `CMP` read as `ALWAYS`.
  pub(crate) fn from_decoded(
    opcode     : Opcode,
    comparison : Comparison,
    register   : u8,
    address    : Address
  ) -> Instruction {
    let comparison = match opcode {
      Opcode::Cmp => comparison,
      _           => Comparison::Always
    };
    Instruction { opcode, comparison, register, address }
  }

  pub fn opcode(&self) -> Opcode {
    self.opcode
  }

  pub fn comparison(&self) -> Comparison {
    self.comparison
  }

  pub fn register(&self) -> u8 {
    self.register
  }

  pub fn address(&self) -> Address {
    self.address
  }

  pub fn mode(&self) -> Mode {
    self.address.mode()
  }

  /// The same instruction pointing somewhere else.
  pub fn with_address(&self, address: Address) -> Result<Instruction, EncodeError> {
    check_address(&address)?;
    Ok(Instruction { address, ..*self })
  }

}

fn check_address(address: &Address) -> Result<(), EncodeError> {
  match address {
    Address::Absolute(a) => {
      check_field(Field::Address, *a, MAX_ABSOLUTE_ADDRESS)?;
    }
    Address::Displacement { base, offset } => {
      check_field(Field::Base, *base, MAX_REGISTER)?;
      check_field(Field::Address, *offset, MAX_DISPLACEMENT)?;
    }
  }
  Ok(())
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.opcode {

      Opcode::Hlt => {
        write!(f, "{}", self.opcode)
      }

      Opcode::Clr => {
        write!(f, "{} r{}", self.opcode, self.register)
      }

      Opcode::Cmp => {
        write!(f, "{} {} r{}, {}", self.opcode, self.comparison, self.register, self.address)
      }

      _ => {
        write!(f, "{} r{}, {}", self.opcode, self.register, self.address)
      }

    }
  }
}
