//! The MiniVM: sixteen integer registers, sixteen float registers, a comparison flag and a flat
//! memory of words holding both the program and its data.

use std::fmt::{Display, Formatter};

use log::{debug, trace};
use prettytable::Table;
use strum_macros::Display as StrumDisplay;

use crate::bytecode::{
  bytes_to_words,
  encode_instruction,
  try_decode_instruction,
  Instruction,
  Opcode,
  Word
};
use crate::error::VmError;
use crate::tables::{make_register_table, TABLE_DISPLAY_FORMAT};

pub const REGISTER_COUNT     : usize = 16;
pub const MEMORY_SIZE        : usize = 0xFFFF;
/// The boot program counter lives at this address.
pub const START_ADDRESS      : usize = 0;
/// Integer register 1 is the program counter, so `n(r1)` addresses relative to the pc.
pub const PC_REGISTER        : usize = 1;
pub const DEFAULT_MAX_CYCLES : usize = 1000;

const TRACE_BEHIND : usize = 3;
const TRACE_AHEAD  : usize = 7;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct VmConfig {
  /// `execute` stops after this many instructions, halted or not.
  pub max_cycles : usize,
  /// Print the machine state after every instruction.
  pub verbose    : bool
}

impl Default for VmConfig {
  fn default() -> Self {
    VmConfig {
      max_cycles : DEFAULT_MAX_CYCLES,
      verbose    : cfg!(feature = "trace_computation")
    }
  }
}

#[derive(StrumDisplay, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[strum(serialize_all = "UPPERCASE")]
pub enum State {
  Boot,
  Running,
  Halted
}

/// How a call to `execute` ended. Neither outcome is an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Outcome {
  /// A `HLT` was executed. `cycles` counts it.
  Halted { cycles: usize },
  /// The cycle budget ran out before any `HLT`.
  CycleBudgetExhausted { cycles: usize }
}

impl Outcome {
  pub fn cycles(&self) -> usize {
    match self {
      | Outcome::Halted { cycles }
      | Outcome::CycleBudgetExhausted { cycles } => *cycles
    }
  }

  pub fn halted(&self) -> bool {
    matches!(self, Outcome::Halted { .. })
  }
}

impl Display for Outcome {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Outcome::Halted { cycles } => write!(f, "halted after {} cycles", cycles),
      Outcome::CycleBudgetExhausted { cycles } => {
        write!(f, "did not halt within {} cycles", cycles)
      }
    }
  }
}

pub struct MiniVm {

  // Memory store
  memory    : Vec<Word>,
  load      : usize,  // Number of words of the image loaded into memory

  // Registers
  registers : [i32; REGISTER_COUNT],
  fp        : [f32; REGISTER_COUNT],
  flag      : bool,
  ir        : Option<Instruction>,  // The instruction most recently executed

  state     : State,
  cycles    : usize,
  config    : VmConfig

}

impl MiniVm {

  // region Construction

  /// Loads `image` at address 0. Words past the end of memory are dropped.
  pub fn new(image: &[Word], config: VmConfig) -> MiniVm {
    let load = image.len().min(MEMORY_SIZE);
    let mut memory = vec![0 as Word; MEMORY_SIZE];
    memory[..load].copy_from_slice(&image[..load]);

    if load < image.len() {
      debug!("Image of {} words truncated to {}.", image.len(), load);
    }

    MiniVm {
      memory,
      load,
      registers : [0; REGISTER_COUNT],
      fp        : [0.0; REGISTER_COUNT],
      flag      : false,
      ir        : None,
      state     : State::Boot,
      cycles    : 0,
      config
    }
  }

  /// Loads a big-endian byte image. A trailing partial word is ignored.
  pub fn from_bytes(bytes: &[u8], config: VmConfig) -> MiniVm {
    MiniVm::new(&bytes_to_words(bytes), config)
  }

  // endregion

  // region Accessors

  pub fn memory(&self) -> &[Word] {
    &self.memory
  }

  pub fn word(&self, address: usize) -> Option<Word> {
    self.memory.get(address).copied()
  }

  /// The word at `address` reinterpreted as a float.
  pub fn read_float(&self, address: usize) -> Option<f32> {
    self.word(address).map(f32::from_bits)
  }

  pub fn register(&self, index: usize) -> Option<i32> {
    self.registers.get(index).copied()
  }

  pub fn fp_register(&self, index: usize) -> Option<f32> {
    self.fp.get(index).copied()
  }

  pub fn flag(&self) -> bool {
    self.flag
  }

  pub fn pc(&self) -> i32 {
    self.registers[PC_REGISTER]
  }

  pub fn state(&self) -> State {
    self.state
  }

  pub fn cycles(&self) -> usize {
    self.cycles
  }

  pub fn config(&self) -> &VmConfig {
    &self.config
  }

  // endregion

  // region Execution

  fn boot(&mut self) {
    self.registers[PC_REGISTER] = self.memory[START_ADDRESS] as i32;
    self.state = State::Running;
    debug!("Booting at pc {}.", self.pc());

    if self.config.verbose {
      print_banner("BOOT");
      println!("{}\n{}", self, self.make_memory_table(0, self.load));
    }
  }

  /// The effective address of the current instruction's operand, checked against memory.
  fn operand_address(&self, instruction: &Instruction, pc: usize) -> Result<usize, VmError> {
    let address = instruction.address().effective(&self.registers);
    match address >= 0 && (address as usize) < self.memory.len() {
      true  => Ok(address as usize),
      false => Err(VmError::AddressOutOfRange { pc, address: address as usize })
    }
  }

  fn operand_value(&self, instruction: &Instruction, pc: usize) -> Result<f32, VmError> {
    Ok(f32::from_bits(self.memory[self.operand_address(instruction, pc)?]))
  }

  /**
    Executes one instruction, booting first if the machine has not started. Returns the state
    afterward. A halted machine stays halted and executes nothing.
  */
  pub fn step(&mut self) -> Result<State, VmError> {
    match self.state {
      State::Boot    => self.boot(),
      State::Halted  => return Ok(State::Halted),
      State::Running => {}
    }

    let pc = self.registers[PC_REGISTER] as u32 as usize;
    let word = *self.memory.get(pc).ok_or(VmError::ProgramCounterOutOfRange(pc))?;
    let instruction =
      try_decode_instruction(word).map_err(|error| VmError::InvalidInstruction { pc, error })?;
    let r = instruction.register() as usize;
    let mut jumped = false;

    trace!("{:04x}: {}", pc, instruction);

    match instruction.opcode() {

      Opcode::Clr => {
        self.fp[r] = 0.0;
      }

      Opcode::Add => {
        let value = self.operand_value(&instruction, pc)?;
        self.fp[r] += value;
      }

      Opcode::Sub => {
        let value = self.operand_value(&instruction, pc)?;
        self.fp[r] -= value;
      }

      Opcode::Mul => {
        let value = self.operand_value(&instruction, pc)?;
        self.fp[r] *= value;
      }

      Opcode::Div => {
        let value = self.operand_value(&instruction, pc)?;
        self.fp[r] /= value;
      }

      Opcode::Jmp => {
        if self.flag {
          self.registers[PC_REGISTER] = self.operand_address(&instruction, pc)? as i32;
          jumped = true;
        }
      }

      Opcode::Cmp => {
        let rhs = self.operand_value(&instruction, pc)?;
        self.flag = instruction.comparison().evaluate(self.fp[r], rhs);
      }

      Opcode::Lod => {
        self.fp[r] = self.operand_value(&instruction, pc)?;
      }

      Opcode::Sto => {
        let address = self.operand_address(&instruction, pc)?;
        self.memory[address] = self.fp[r].to_bits();
      }

      Opcode::Hlt => {
        self.state = State::Halted;
      }

    } // end match on opcode

    self.ir = Some(instruction);
    self.cycles += 1;

    if self.state == State::Running && !jumped {
      self.registers[PC_REGISTER] += 1;
    }

    if self.config.verbose {
      print_banner(format!("CYCLE = {}", self.cycles - 1).as_str());
      println!("{}\n{}", self, self.make_memory_table(0, self.load));
    }

    Ok(self.state)
  }

  /// Runs until `HLT` or until `max_cycles` instructions have executed in total.
  pub fn execute(&mut self) -> Result<Outcome, VmError> {
    let outcome = loop {
      if self.state == State::Halted {
        break Outcome::Halted { cycles: self.cycles };
      }
      if self.cycles >= self.config.max_cycles {
        break Outcome::CycleBudgetExhausted { cycles: self.cycles };
      }
      self.step()?;
    };

    if self.config.verbose {
      print_banner("HALT");
    }
    debug!("Machine {}.", outcome);
    Ok(outcome)
  }

  // endregion

  // region Display methods

  /// Memory from `low` to `high`, four words to a row, as hex and as floats.
  pub fn make_memory_table(&self, low: usize, high: usize) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"+0", ubl->"+1", ubl->"+2", ubl->"+3"]);

    let low  = low / 4 * 4;
    let high = ((high + 4) / 4 * 4).min(self.memory.len());
    for start in (low..high).step_by(4) {
      let mut cells: Vec<String> = Vec::with_capacity(4);
      for address in start..start + 4 {
        cells.push(match self.word(address) {
          Some(word) => format!("{:08x}\n{:e}", word, f32::from_bits(word)),
          None       => String::new()
        });
      }
      table.add_row(row![
        r->format!("mem[{:04x}:{:04x}]", start, start + 3), cells[0], cells[1], cells[2], cells[3]
      ]);
    }
    table
  }

  /// The words around the pc, decoded.
  pub fn make_trace_table(&self, behind: usize, ahead: usize) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Word", ubl->"Instruction"]);

    let pc    = self.pc().max(0) as usize;
    let start = pc.saturating_sub(behind);
    let end   = (pc + ahead).min(self.memory.len());

    for address in start..end {
      let word = self.memory[address];
      let text = try_decode_instruction(word).map_or_else(|_| "-".to_string(), |i| i.to_string());
      match address == pc {

        true  => {
          table.add_row(
            row![r->format!("* --> mem[{:04x}]", address), format!("{:08x}", word), text]
          );
        }

        false => {
          table.add_row(
            row![r->format!("mem[{:04x}]", address), format!("{:08x}", word), text]
          );
        }

      } // end match on pc
    }
    table
  }

  // endregion

}

fn print_banner(title: &str) {
  let rule = "=".repeat(64);
  println!("{}\n{}\n{}\n", rule, title, rule);
}

impl Display for MiniVm {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let integer_cells: Vec<String> =
      self.registers.iter().map(|r| format!("{:08x} = {}", r, r)).collect();
    let float_cells: Vec<String> =
      self.fp.iter().map(|v| format!("{:08x} = {:e}", v.to_bits(), v)).collect();

    let r_table     = make_register_table("reg",   &integer_cells, PC_REGISTER,    0);
    let fp_table    = make_register_table("fpreg", &float_cells,   REGISTER_COUNT, 0);
    let trace_table = self.make_trace_table(TRACE_BEHIND, TRACE_AHEAD);

    let mut combined_table = table!([trace_table, r_table, fp_table]);
    combined_table.set_titles(row![ub->"Trace", ub->"Registers", ub->"Float Registers"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let ir = match &self.ir {
      Some(instruction) => format!("{:08x} = {}", encode_instruction(instruction), instruction),
      None              => "none".to_string()
    };

    write!(
      f,
      "State: {}\tCycles: {}\tFlag: {}\tir = {}\n{}",
      self.state, self.cycles, self.flag, ir, combined_table
    )
  }
}
