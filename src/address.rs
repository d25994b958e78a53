//! An `Either` type for the address operand of an instruction: an absolute memory address or a
//! displacement from the value of a second register, with some convenience functions.

use std::fmt::{Display, Formatter};
use std::ops::Add;

use crate::bytecode::Mode;

/// Addresses index words, not bytes.
pub type AddressNumberType = u32;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Address {
  /// An index into memory.
  Absolute(AddressNumberType),
  /// `offset + R[base]`, resolved by the VM at execution time.
  Displacement {
    base   : AddressNumberType,
    offset : AddressNumberType
  }
}

impl Address {

  pub fn mode(&self) -> Mode {
    match self {
      Address::Absolute(_)         => Mode::Absolute,
      Address::Displacement { .. } => Mode::Displacement
    }
  }

  /// The address if it is known at compile time.
  pub fn absolute(&self) -> Option<AddressNumberType> {
    match self {
      Address::Absolute(a) => Some(*a),
      _                    => None
    }
  }

  /// Resolves the address against the VM's integer registers.
  pub fn effective(&self, registers: &[i32]) -> i64 {
    match self {
      Address::Absolute(a) => *a as i64,
      Address::Displacement { base, offset } => {
        let base_value = registers.get(*base as usize).copied().unwrap_or(0);
        *offset as i64 + base_value as i64
      }
    }
  }

}

impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Address::Absolute(a) => {
        write!(f, "{}", a)
      },
      Address::Displacement { base, offset } => {
        write!(f, "{}(r{})", offset, base)
      }
    }
  }
}

// Advance an address. A displacement moves its offset, not its base register.
impl Add<AddressNumberType> for Address {
  type Output = Address;
  fn add(self, rhs: AddressNumberType) -> Address {
    match self {
      Address::Absolute(a) => {
        Address::Absolute(a + rhs)
      },
      Address::Displacement { base, offset } => {
        Address::Displacement { base, offset: offset + rhs }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absolute_ignores_registers(){
    let registers = [7; 16];
    assert_eq!(Address::Absolute(12).effective(&registers), 12);
  }

  #[test]
  fn displacement_adds_base_register(){
    let mut registers = [0; 16];
    registers[2] = 40;
    let address = Address::Displacement { base: 2, offset: 5 };
    assert_eq!(address.effective(&registers), 45);
    assert_eq!(address.mode(), Mode::Displacement);
    assert_eq!(address.absolute(), None);
  }

  #[test]
  fn display_forms(){
    assert_eq!(format!("{}", Address::Absolute(3)), "3");
    assert_eq!(format!("{}", Address::Displacement { base: 1, offset: 4 }), "4(r1)");
  }

  #[test]
  fn add_moves_offset(){
    assert_eq!(Address::Absolute(3) + 2, Address::Absolute(5));
    assert_eq!(
      Address::Displacement { base: 1, offset: 4 } + 1,
      Address::Displacement { base: 1, offset: 5 }
    );
  }
}
