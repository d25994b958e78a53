/*!
  Assigns every constant, variable and label in a program its address.

  The data segment is laid out as

  ```text
  0         boot pc, the address of the first instruction
  1..1+C    constants, in order of first use
  1+C..S    variables, in order of first use
  ```

  and code starts at `S`. A label's address is the count of instructions emitted before its
  definition, plus `S`.
*/

use std::collections::hash_map::{Entry, HashMap};
use std::collections::HashSet;

use bimap::BiMap;
use log::{debug, warn};

use crate::atom::{Atom, Name, Operand};
use crate::bytecode::Word;
use crate::symboltable::SymbolTables;

pub fn allocate(atoms: &[Atom]) -> SymbolTables {
  let mut constants : Vec<f32>            = Vec::new();
  let mut variables : Vec<Name>           = Vec::new();
  let mut labels    : HashMap<Name, Word> = HashMap::new();
  let mut pc        : Word                = 0;

  let mut seen_constants : HashSet<u32>  = HashSet::new();
  let mut seen_variables : HashSet<Name> = HashSet::new();

  for atom in atoms {
    for operand in atom.operands().iter().flatten() {
      match operand {

        Operand::Constant(value) => {
          if seen_constants.insert(SymbolTables::key_for(*value)) {
            constants.push(*value);
          }
        }

        Operand::Variable(name) => {
          if seen_variables.insert(name.clone()) {
            variables.push(name.clone());
          }
        }

        Operand::LabelDefinition(name) => {
          match labels.entry(name.clone()) {
            Entry::Occupied(first) => {
              warn!("Label {} is defined again at pc {}; keeping pc {}.", name, pc, first.get());
            }
            Entry::Vacant(slot) => {
              slot.insert(pc);
            }
          }
        }

        | Operand::LabelUse(_)
        | Operand::Cmp(_) => {}

      } // end match on operand
    }
    pc += atom.kind().instruction_count();
  }

  let data_size = (constants.len() + variables.len() + 1) as Word;

  let mut constant_table = BiMap::new();
  for (offset, value) in constants.iter().enumerate() {
    constant_table.insert(SymbolTables::key_for(*value), 1 + offset as Word);
  }
  let mut variable_table = BiMap::new();
  for (offset, name) in variables.into_iter().enumerate() {
    variable_table.insert(name, 1 + (constants.len() + offset) as Word);
  }
  let label_table = labels.into_iter().map(|(name, pc)| (name, pc + data_size)).collect();

  debug!(
    "Allocated {} constants and {} variables; code starts at {}.",
    constants.len(), variable_table.len(), data_size
  );
  SymbolTables::new(constant_table, variable_table, label_table, data_size)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::Comparison;

  #[test]
  fn mov_then_add(){
    let tables = allocate(&[Atom::mov(5.0, "x"), Atom::add("x", 3.0, "y")]);
    assert_eq!(tables.constant_address(5.0), Some(1));
    assert_eq!(tables.constant_address(3.0), Some(2));
    assert_eq!(tables.variable_address("x"), Some(3));
    assert_eq!(tables.variable_address("y"), Some(4));
    assert_eq!(tables.data_size(), 5);
  }

  #[test]
  fn duplicates_share_an_address(){
    let tables = allocate(&[
      Atom::add("a", 2.0, "a"),
      Atom::mul(2.0, "a", "b"),
      Atom::sub(0.0, -0.0, "b"),
    ]);
    assert_eq!(tables.constants(), vec![(2.0, 1), (0.0, 2)]);
    assert_eq!(tables.variable_address("a"), Some(3));
    assert_eq!(tables.variable_address("b"), Some(4));
    assert_eq!(tables.data_size(), 2 + 2 + 1);
  }

  #[test]
  fn many_symbols_keep_first_use_order(){
    let atoms: Vec<Atom> = (0..400)
      .map(|i| Atom::add(format!("v{}", i % 200).as_str(), (i % 50) as f32, "total"))
      .collect();
    let tables = allocate(&atoms);
    assert_eq!(tables.constants().len(), 50);
    assert_eq!(tables.constant_address(49.0), Some(50));
    assert_eq!(tables.variable_address("v0"), Some(51));
    assert_eq!(tables.variable_address("total"), Some(52));
    assert_eq!(tables.variable_address("v199"), Some(51 + 200));
    assert_eq!(tables.data_size(), 1 + 50 + 201);
  }

  #[test]
  fn labels_count_instructions(){
    let tables = allocate(&[
      Atom::lbl("start"),                                // pc 0
      Atom::neg("x", "y"),                               // 4 instructions
      Atom::lbl("after_neg"),                            // pc 4
      Atom::tst("x", "y", Comparison::Lesser, "start"),  // 3
      Atom::mov("y", "x"),                               // 2
      Atom::jmp("start"),                                // 2
      Atom::lbl("end"),                                  // pc 11
    ]);
    let s = tables.data_size();
    assert_eq!(s, 3);
    assert_eq!(tables.label_address("start"), Some(s));
    assert_eq!(tables.label_address("after_neg"), Some(s + 4));
    assert_eq!(tables.label_address("end"), Some(s + 11));
  }

  #[test]
  fn redefined_label_keeps_first_definition(){
    let tables = allocate(&[
      Atom::lbl("l"),
      Atom::mov(1.0, "x"),
      Atom::lbl("l"),
    ]);
    assert_eq!(tables.label_address("l"), Some(tables.data_size()));
  }

  #[test]
  fn empty_program(){
    let tables = allocate(&[]);
    assert_eq!(tables.data_size(), 1);
    assert!(tables.labels().is_empty());
  }
}
