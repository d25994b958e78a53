/*!
  The symbol tables of one compilation: constants, variables and labels mapped to addresses in the
  combined address space (data segment first, code after it). They are built once by
  `compiler::allocate` and never mutated afterward. The optimizer, which moves code around, gets a
  renumbered copy through `with_label_shift`.

  The constant and variable tables are `BiMap`s, so a listing can go from an address back to the
  symbol stored there. Labels are a plain map, since two labels may name the same address.
*/

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use bimap::BiMap;
use prettytable::Table;

use crate::atom::{Name, Operand};
use crate::bytecode::Word;
use crate::error::CompileError;
use crate::tables::TABLE_DISPLAY_FORMAT;

/// Constants are keyed by bit pattern, with both zeros folded into `+0.0`.
fn constant_key(value: f32) -> u32 {
  match value == 0.0 {
    true  => 0.0f32.to_bits(),
    false => value.to_bits()
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolTables {
  constants : BiMap<u32, Word>,
  variables : BiMap<Name, Word>,
  labels    : HashMap<Name, Word>,
  data_size : Word
}

impl SymbolTables {

  /**
    Assembles finished tables. The caller has already assigned every address; `data_size` is the
    size of the data segment, which is also the address of the first instruction.
  */
  pub(crate) fn new(
    constants : BiMap<u32, Word>,
    variables : BiMap<Name, Word>,
    labels    : HashMap<Name, Word>,
    data_size : Word
  ) -> SymbolTables {
    SymbolTables { constants, variables, labels, data_size }
  }

  pub(crate) fn key_for(value: f32) -> u32 {
    constant_key(value)
  }

  pub fn constant_address(&self, value: f32) -> Option<Word> {
    self.constants.get_by_left(&constant_key(value)).copied()
  }

  pub fn variable_address(&self, name: &str) -> Option<Word> {
    self.variables.get_by_left(&Name::from(name)).copied()
  }

  pub fn label_address(&self, name: &str) -> Option<Word> {
    self.labels.get(&Name::from(name)).copied()
  }

  /// The number of words in the data segment: one for the boot pc, then constants and variables.
  pub fn data_size(&self) -> Word {
    self.data_size
  }

  /// The address of the first instruction.
  pub fn code_base(&self) -> Word {
    self.data_size
  }

  /// Constants in address order.
  pub fn constants(&self) -> Vec<(f32, Word)> {
    let mut constants: Vec<(f32, Word)> =
      self.constants.iter().map(|(bits, address)| (f32::from_bits(*bits), *address)).collect();
    constants.sort_by_key(|(_, address)| *address);
    constants
  }

  /// Variables in address order.
  pub fn variables(&self) -> Vec<(Name, Word)> {
    let mut variables: Vec<(Name, Word)> =
      self.variables.iter().map(|(name, address)| (name.clone(), *address)).collect();
    variables.sort_by_key(|(_, address)| *address);
    variables
  }

  /// Labels in address order, ties broken by name.
  pub fn labels(&self) -> Vec<(Name, Word)> {
    let mut labels: Vec<(Name, Word)> =
      self.labels.iter().map(|(name, address)| (name.clone(), *address)).collect();
    labels.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    labels
  }

  /// Names of the labels pointing at `address`, sorted.
  pub fn labels_at(&self, address: Word) -> Vec<Name> {
    let mut names: Vec<Name> = self.labels
      .iter()
      .filter(|(_, a)| **a == address)
      .map(|(name, _)| name.clone())
      .collect();
    names.sort();
    names
  }

  pub fn is_label_target(&self, address: Word) -> bool {
    self.labels.values().any(|a| *a == address)
  }

  /// The constant or variable stored at a data address, as it appears in the atoms.
  pub fn symbol_at(&self, address: Word) -> Option<String> {
    if let Some(bits) = self.constants.get_by_right(&address) {
      return Some(f32::from_bits(*bits).to_string());
    }
    self.variables.get_by_right(&address).map(|name| name.to_string())
  }

  /**
    The address an operand refers to. Constants, variables and label uses resolve through their
    tables; label definitions and comparison kinds name no address.
  */
  pub fn resolve(&self, operand: &Operand) -> Result<Word, CompileError> {
    let address = match operand {
      Operand::Constant(value)  => self.constant_address(*value),
      Operand::Variable(name)   => self.variables.get_by_left(name).copied(),
      Operand::LabelUse(name)   => self.labels.get(name).copied(),
      | Operand::LabelDefinition(_)
      | Operand::Cmp(_) => {
        return Err(CompileError::NotAddressable { operand: operand.to_string() });
      }
    };
    address.ok_or_else(|| CompileError::UnresolvedSymbol { operand: operand.to_string() })
  }

  /// A copy with every label address passed through `shift`. Data addresses are untouched.
  pub fn with_label_shift<F>(&self, shift: F) -> SymbolTables
    where F: Fn(Word) -> Word
  {
    SymbolTables {
      labels: self.labels.iter().map(|(name, address)| (name.clone(), shift(*address))).collect(),
      ..self.clone()
    }
  }

}

impl Display for SymbolTables {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Symbol", ubl->"Kind"]);

    table.add_row(row![r->"0", "(boot pc)", format!("= {}", self.data_size)]);
    for (value, address) in self.constants() {
      table.add_row(row![r->address, value, "constant"]);
    }
    for (name, address) in self.variables() {
      table.add_row(row![r->address, name, "variable"]);
    }
    for (name, address) in self.labels() {
      table.add_row(row![r->address, name, "label"]);
    }

    write!(f, "{}", table)
  }
}
