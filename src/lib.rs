/*!
  A backend for a small imperative language and the virtual machine it targets.

  The front end hands over a sequence of `Atom`s, three-operand operations on named variables and
  float constants. The compiler lays out a data segment for the constants and variables, emits
  packed 32 bit instructions for each atom, and optionally runs a peephole pass over them. The
  result is a memory image that `MiniVm` boots and executes.

  ```
  use minivm::{Atom, Compilation, MiniVm, VmConfig};

  let atoms = [Atom::mov(5.0, "x"), Atom::add("x", 3.0, "y")];
  let compilation = Compilation::compile(&atoms).unwrap();
  let mut vm = MiniVm::new(&compilation.image(), VmConfig::default());
  assert!(vm.execute().unwrap().halted());
  assert_eq!(vm.read_float(4), Some(8.0));
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod atom;
pub mod bytecode;
pub mod compiler;
pub mod error;
pub mod symboltable;
mod tables;
pub mod vm;

pub use atom::{Atom, AtomKind, Operand, Value};
pub use compiler::{Compilation, CompileOptions};
pub use error::{AtomError, CompileError, DecodeError, EncodeError, VmError};
pub use symboltable::SymbolTables;
pub use vm::{MiniVm, Outcome, State, VmConfig};
