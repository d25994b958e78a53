/*!
  Human readable listings of a memory image. Each line is one word: the assembly text, then a
  `%` comment with the encoded word and the symbol the address field refers to. Lines naming a
  label precede the instruction the label points at.

  ```text
  % Data segment
  3                             % 00000003 boot pc
  5                             % 40a00000 constant
  x                             % 00000000 variable
  % Code segment
  LOD r0, 1                     % 70000001 5
  l0:
  STO r0, 2                     % 80000002 x
  ```
*/

use super::{encode_instruction, Instruction, Opcode};
use crate::symboltable::SymbolTables;

/// The symbol an instruction's address field names, if it names one.
pub fn instruction_comment(instruction: &Instruction, tables: &SymbolTables) -> String {
  if !instruction.opcode().uses_address() {
    return String::new();
  }
  let address = match instruction.address().absolute() {
    Some(address) => address,
    None          => return format!("pc relative {}", instruction.address())
  };

  match address < tables.code_base() {

    true  => {
      tables.symbol_at(address).unwrap_or_else(|| format!("mem[{}]", address))
    }

    false => {
      let names = tables.labels_at(address);
      match names.is_empty() {
        true  => format!("code[{}]", address - tables.code_base()),
        false => names.iter().map(|n| n.to_string()).collect::<Vec<String>>().join(", ")
      }
    }

  } // end match on segment
}

/// The full listing of a data segment described by `tables` followed by `code`.
pub fn listing(tables: &SymbolTables, code: &[Instruction]) -> String {
  let mut buffer = String::new();

  buffer.push_str("% Data segment\n");
  buffer.push_str(
    format!("{:30}% {:08x} boot pc\n", tables.data_size(), tables.data_size()).as_str()
  );
  for (value, _) in tables.constants() {
    buffer.push_str(format!("{:30}% {:08x} constant\n", value, value.to_bits()).as_str());
  }
  for (name, _) in tables.variables() {
    buffer.push_str(format!("{:30}% {:08x} variable\n", name.to_string(), 0).as_str());
  }

  buffer.push_str("% Code segment\n");
  for (offset, instruction) in code.iter().enumerate() {
    let address = tables.code_base() + offset as u32;
    for label in tables.labels_at(address) {
      buffer.push_str(format!("{}:\n", label).as_str());
    }
    let comment = match instruction.opcode() {
      Opcode::Hlt if offset + 1 == code.len() => "End Program".to_string(),
      _                                       => instruction_comment(instruction, tables)
    };
    let line = format!(
      "{:30}% {:08x} {}",
      format!("{}", instruction),
      encode_instruction(instruction),
      comment
    );
    buffer.push_str(line.trim_end());
    buffer.push('\n');
  }

  // Labels past the last instruction.
  let end = tables.code_base() + code.len() as u32;
  for (label, address) in tables.labels() {
    if address >= end {
      buffer.push_str(format!("{}:\n", label).as_str());
    }
  }

  buffer
}
