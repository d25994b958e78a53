/*!
  Functions to produce a compilation artifact from atoms: the symbol tables, the data segment and
  the instructions, which together make up a memory image for the VM.

  The compilation pipeline is this:
  ```text
  text -> [`parser::parse`] -> `Atom`s ->⋯

  ⋯-> [`eliminate_unreachable`] -> `Atom`s -> [`allocate`] -> `SymbolTables` ->⋯

  ⋯-> [`Compilation::compile`] -> `Instruction`s -> [`optimize`] -> `Instruction`s ->⋯

  ⋯-> [`Compilation::image`] -> `Word`s
  ```
  The bracketed passes `eliminate_unreachable` and `optimize` are optional; see `CompileOptions`.

  Every atom is translated by a fixed template through working register 0:

  | Atom            | Instructions                                   |
  |-----------------|------------------------------------------------|
  | ADD/SUB/MUL/DIV | `LOD r0, lhs`; `ADD r0, rhs`; `STO r0, result`  |
  | MOV             | `LOD r0, source`; `STO r0, destination`         |
  | NEG             | `LOD r0, x`; `SUB r0, x`; `SUB r0, x`; `STO r0, result` |
  | JMP             | `CMP ALWAYS r0, 0`; `JMP label`                 |
  | TST             | `LOD r0, lhs`; `CMP cmp r0, rhs`; `JMP label`   |
  | LBL             | nothing                                        |

  A `HLT` follows the last atom's instructions.
*/

use log::{debug, trace};

use crate::atom::{Atom, Name, Operand, Value};
use crate::bytecode::{
  encode_instruction,
  listing,
  words_to_bytes,
  Comparison,
  Instruction,
  Opcode,
  Word
};
use crate::error::{CompileError, EncodeError};
use crate::symboltable::SymbolTables;
use super::allocate::allocate;
use super::optimize::optimize;
use super::parser::parse;
use super::unreachable::eliminate_unreachable;

/// Every template computes in this register.
pub const WORKING_REGISTER: u32 = 0;

/// Optional passes. Both are off by default.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct CompileOptions {
  /// Drop atoms between an unconditional jump and the next label before allocating.
  pub eliminate_unreachable : bool,
  /// Run the peephole optimizer over the emitted code.
  pub optimize              : bool
}

/// A `Compilation` is the result of executing `Compilation::compile(atoms)`: the final symbol
/// tables and the instructions of the code segment. The data segment follows from the tables.
#[derive(Clone, Debug, PartialEq)]
pub struct Compilation {
  code   : Vec<Instruction>,
  tables : SymbolTables
}

impl Compilation {

  /// Allocates addresses for the atoms and emits their instructions.
  pub fn compile(atoms: &[Atom]) -> Result<Compilation, CompileError> {
    let tables = allocate(atoms);
    let mut code: Vec<Instruction> = Vec::new();

    for (index, atom) in atoms.iter().enumerate() {
      let instructions = translate(atom, index, &tables)?;
      trace!("{:>4} {:30} -> {} instructions", index, atom.to_string(), instructions.len());
      code.extend(instructions);
    }
    code.push(Instruction::halt());

    debug!("Emitted {} instructions for {} atoms.", code.len(), atoms.len());
    let compilation = Compilation { code, tables };

    #[cfg(feature = "trace_computation")]
      {
        println!("% Assembly Code Instructions\n{}", compilation.listing());
      }

    Ok(compilation)
  }

  /// `compile` with the optional passes `options` asks for.
  pub fn compile_with(atoms: &[Atom], options: &CompileOptions)
    -> Result<Compilation, CompileError>
  {
    let compilation = match options.eliminate_unreachable {
      true  => Compilation::compile(&eliminate_unreachable(atoms))?,
      false => Compilation::compile(atoms)?
    };
    match options.optimize {
      true  => optimize(&compilation),
      false => Ok(compilation)
    }
  }

  /// Reads atoms from text, then compiles them as `compile_with` does.
  pub fn compile_text(text: &str, options: &CompileOptions) -> Result<Compilation, CompileError> {
    let atoms = parse(text)?;
    Compilation::compile_with(&atoms, options)
  }

  pub(crate) fn from_parts(code: Vec<Instruction>, tables: SymbolTables) -> Compilation {
    Compilation { code, tables }
  }

  pub fn code(&self) -> &[Instruction] {
    &self.code
  }

  pub fn tables(&self) -> &SymbolTables {
    &self.tables
  }

  /// The address of the first instruction, which is also the size of the data segment.
  pub fn code_base(&self) -> Word {
    self.tables.code_base()
  }

  /// Word 0 holds the boot pc, then come the constants, then zeroed variable slots.
  pub fn data(&self) -> Vec<Word> {
    let mut data = vec![0 as Word; self.tables.data_size() as usize];
    data[0] = self.tables.data_size();
    for (value, address) in self.tables.constants() {
      data[address as usize] = value.to_bits();
    }
    data
  }

  /// The complete memory image: data segment, then code.
  pub fn image(&self) -> Vec<Word> {
    let mut image = self.data();
    image.extend(self.code.iter().map(encode_instruction));
    image
  }

  /// The memory image serialized most significant byte first.
  pub fn to_bytes(&self) -> Vec<u8> {
    words_to_bytes(&self.image())
  }

  pub fn listing(&self) -> String {
    listing(&self.tables, &self.code)
  }

}

/// The instructions for one atom. `index` is the atom's position, for error messages.
fn translate(atom: &Atom, index: usize, tables: &SymbolTables)
  -> Result<Vec<Instruction>, CompileError>
{
  let value    = |v: &Value| tables.resolve(&v.to_operand());
  let variable = |name: &Name| tables.resolve(&Operand::Variable(name.clone()));
  let label    = |name: &Name| {
    tables.label_address(name).ok_or_else(|| CompileError::UndefinedLabel {
      label      : name.to_string(),
      atom_index : index,
      atom       : atom.to_string()
    })
  };
  let checked = |instruction: Result<Instruction, EncodeError>| {
    instruction.map_err(|error| CompileError::Encode { atom_index: Some(index), error })
  };
  let absolute = |opcode: Opcode, address: Word| {
    checked(Instruction::absolute(opcode, WORKING_REGISTER, address))
  };
  let arithmetic = |opcode: Opcode, lhs: &Value, rhs: &Value, result: &Name|
    -> Result<Vec<Instruction>, CompileError>
  {
    Ok(vec![
      absolute(Opcode::Lod, value(lhs)?)?,
      absolute(opcode,      value(rhs)?)?,
      absolute(Opcode::Sto, variable(result)?)?,
    ])
  };

  match atom {

    Atom::Add { lhs, rhs, result } => arithmetic(Opcode::Add, lhs, rhs, result),
    Atom::Sub { lhs, rhs, result } => arithmetic(Opcode::Sub, lhs, rhs, result),
    Atom::Mul { lhs, rhs, result } => arithmetic(Opcode::Mul, lhs, rhs, result),
    Atom::Div { lhs, rhs, result } => arithmetic(Opcode::Div, lhs, rhs, result),

    // x - x - x = -x
    Atom::Neg { operand, result } => {
      let source = value(operand)?;
      Ok(vec![
        absolute(Opcode::Lod, source)?,
        absolute(Opcode::Sub, source)?,
        absolute(Opcode::Sub, source)?,
        absolute(Opcode::Sto, variable(result)?)?,
      ])
    }

    Atom::Mov { source, destination } => {
      Ok(vec![
        absolute(Opcode::Lod, value(source)?)?,
        absolute(Opcode::Sto, variable(destination)?)?,
      ])
    }

    Atom::Jmp { label: target } => {
      let target = label(target)?;
      Ok(vec![
        checked(Instruction::compare(Comparison::Always, WORKING_REGISTER, 0))?,
        absolute(Opcode::Jmp, target)?,
      ])
    }

    Atom::Tst { lhs, rhs, comparison, label: target } => {
      let target = label(target)?;
      Ok(vec![
        absolute(Opcode::Lod, value(lhs)?)?,
        checked(Instruction::compare(*comparison, WORKING_REGISTER, value(rhs)?))?,
        absolute(Opcode::Jmp, target)?,
      ])
    }

    Atom::Lbl { .. } => Ok(vec![]),

  } // end match on atom
}
