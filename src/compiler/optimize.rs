/*!
  A peephole pass over the code segment. A `STO` right after a `LOD` of the same register and
  address, or a `LOD` right after such a `STO`, does nothing the pair's first instruction has not
  already done, so it is removed. The emitter produces such pairs wherever one atom's result is
  the next atom's first operand.

  Removing instructions moves everything after them. All removals are applied at once through the
  cumulative shift

  ```text
  shift(a) = a - |{ removed r : r < a }|
  ```

  which is applied to every label and to every absolute address field that points into the code
  segment. Data addresses lie below every removed instruction, so they are fixed points of the
  shift.
*/

use log::{debug, trace};

use crate::address::Address;
use crate::bytecode::{Instruction, Opcode, Word};
use crate::error::CompileError;
use super::compile::Compilation;

/// Whether `second` is redundant after `first`.
fn is_redundant_pair(first: &Instruction, second: &Instruction) -> bool {
  let opcodes_match = matches!(
    (first.opcode(), second.opcode()),
    (Opcode::Lod, Opcode::Sto) | (Opcode::Sto, Opcode::Lod)
  );
  opcodes_match
    && first.register() == second.register()
    && first.address()  == second.address()
}

/// Addresses of the instructions to remove, in increasing order. Pairs are taken from the code as
/// emitted, so a chain like `STO x; LOD x; STO x` loses everything after its first instruction.
fn find_removals(compilation: &Compilation) -> Vec<Word> {
  let tables = compilation.tables();
  let base   = compilation.code_base();

  let mut removed: Vec<Word> = Vec::new();
  for (offset, pair) in compilation.code().windows(2).enumerate() {
    let address = base + offset as Word + 1;
    // A jump may arrive at a label target with anything in the register.
    if is_redundant_pair(&pair[0], &pair[1]) && !tables.is_label_target(address) {
      trace!("Removing {} at {}, redundant after {}.", pair[1], address, pair[0]);
      removed.push(address);
    }
  }
  removed
}

/// The cumulative shift for `removed`, which must be sorted.
fn shift(removed: &[Word], address: Word) -> Word {
  address - removed.partition_point(|r| *r < address) as Word
}

/**
  Returns a new, shorter compilation with redundant `LOD`/`STO` pairs collapsed and every label
  and jump target renumbered. The input is left as it was. Fails only if a renumbered address no
  longer fits its field, which cannot happen for addresses that only move down.
*/
pub fn optimize(compilation: &Compilation) -> Result<Compilation, CompileError> {
  let removed = find_removals(compilation);
  let base    = compilation.code_base();

  let mut code: Vec<Instruction> = Vec::with_capacity(compilation.code().len() - removed.len());
  for (offset, instruction) in compilation.code().iter().enumerate() {
    let address = base + offset as Word;
    if removed.binary_search(&address).is_ok() {
      continue;
    }
    let instruction = match instruction.address() {
      Address::Absolute(target) if target >= base => {
        instruction.with_address(Address::Absolute(shift(&removed, target)))?
      }
      _ => *instruction
    };
    code.push(instruction);
  }

  let tables = compilation.tables().with_label_shift(|address| shift(&removed, address));

  debug!("Optimizer removed {} of {} instructions.", removed.len(), compilation.code().len());
  Ok(Compilation::from_parts(code, tables))
}
