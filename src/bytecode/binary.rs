/*!
  This module is responsible for the encoding and decoding of binary instructions.
*/
use strum_macros::Display as StrumDisplay;

use super::{Comparison, Instruction, Mode, Opcode};
use crate::address::Address;
use crate::error::{DecodeError, EncodeError};

// If you change this you must also change the shifts and masks below.
pub type Word = u32;

const OPCODE_SHIFT     : u32 = 28;
const MODE_SHIFT       : u32 = 27;
const COMPARISON_SHIFT : u32 = 24;
const REGISTER_SHIFT   : u32 = 20;
const BASE_SHIFT       : u32 = 16;

const OPCODE_MASK       : Word = 0xF000_0000;
const MODE_MASK         : Word = 0x0800_0000;
const COMPARISON_MASK   : Word = 0x0700_0000;
const REGISTER_MASK     : Word = 0x00F0_0000;
const BASE_MASK         : Word = 0x000F_0000;
const ADDRESS_MASK      : Word = 0x000F_FFFF;
const DISPLACEMENT_MASK : Word = 0x0000_FFFF;

pub const MAX_OPCODE           : u32 = 9;
pub const MAX_COMPARISON       : u32 = 6;
pub const MAX_REGISTER         : u32 = 15;
pub const MAX_ABSOLUTE_ADDRESS : u32 = ADDRESS_MASK;
pub const MAX_DISPLACEMENT     : u32 = DISPLACEMENT_MASK;

/// Names the instruction fields in error messages.
#[derive(StrumDisplay, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
  Opcode,
  Mode,
  Comparison,
  Register,
  Base,
  Address,
}

/**
  The raw numeric fields of an instruction word. `base` is only meaningful in displacement mode;
  in absolute mode it is ignored when encoding and zero when decoding.
*/
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Fields {
  pub opcode     : u32,
  pub mode       : u32,
  pub comparison : u32,
  pub register   : u32,
  pub base       : u32,
  pub address    : u32
}

/// Returns `value` if it is at most `max`.
pub fn check_field(field: Field, value: u32, max: u32) -> Result<u32, EncodeError> {
  match value <= max {
    true  => Ok(value),
    false => Err(EncodeError::FieldOutOfRange { field, value, max })
  }
}

/// Packs raw fields into a word, checking each against its width.
pub fn encode(fields: &Fields) -> Result<Word, EncodeError> {
  let opcode     = check_field(Field::Opcode,     fields.opcode,     MAX_OPCODE)?;
  let mode       = check_field(Field::Mode,       fields.mode,       1)?;
  let comparison = check_field(Field::Comparison, fields.comparison, MAX_COMPARISON)?;
  let register   = check_field(Field::Register,   fields.register,   MAX_REGISTER)?;

  let mut word =
      (opcode     << OPCODE_SHIFT    ) |
      (mode       << MODE_SHIFT      ) |
      (comparison << COMPARISON_SHIFT) |
      (register   << REGISTER_SHIFT  );

  word |= match mode {
    0 => check_field(Field::Address, fields.address, MAX_ABSOLUTE_ADDRESS)?,
    _ => {
      let base = check_field(Field::Base, fields.base, MAX_REGISTER)?;
      let displacement = check_field(Field::Address, fields.address, MAX_DISPLACEMENT)?;
      (base << BASE_SHIFT) | displacement
    }
  };

  Ok(word)
}

/// Unpacks a word into its raw fields. Never fails; the fields may not name a valid instruction.
pub fn decode(word: Word) -> Fields {
  let mode = (word & MODE_MASK) >> MODE_SHIFT;
  let (base, address) = match mode {
    0 => (0, word & ADDRESS_MASK),
    _ => ((word & BASE_MASK) >> BASE_SHIFT, word & DISPLACEMENT_MASK)
  };

  Fields {
    opcode     : (word & OPCODE_MASK) >> OPCODE_SHIFT,
    mode,
    comparison : (word & COMPARISON_MASK) >> COMPARISON_SHIFT,
    register   : (word & REGISTER_MASK) >> REGISTER_SHIFT,
    base,
    address
  }
}

/// Encodes the instruction into bytecode. The instruction's constructors have already checked
/// every field, so this cannot fail.
pub fn encode_instruction(instruction: &Instruction) -> Word {
  let (mode, base, address) = match instruction.address() {
    Address::Absolute(a)                   => (Mode::Absolute, 0, a),
    Address::Displacement { base, offset } => (Mode::Displacement, base, offset)
  };

  (Into::<u8>::into(instruction.opcode())     as Word) << OPCODE_SHIFT     |
  (Into::<u8>::into(mode)                     as Word) << MODE_SHIFT       |
  (Into::<u8>::into(instruction.comparison()) as Word) << COMPARISON_SHIFT |
  (instruction.register()                     as Word) << REGISTER_SHIFT   |
  match mode {
    Mode::Absolute     => address & ADDRESS_MASK,
    Mode::Displacement => ((base << BASE_SHIFT) & BASE_MASK) | (address & DISPLACEMENT_MASK)
  }
}

pub fn try_decode_instruction(word: Word) -> Result<Instruction, DecodeError> {
  let fields = decode(word);

  let opcode = Opcode::try_from(fields.opcode as u8)
    .map_err(|_| DecodeError::InvalidOpcode { word, opcode: fields.opcode })?;
  let comparison = Comparison::try_from(fields.comparison as u8)
    .map_err(|_| DecodeError::InvalidComparison { word, comparison: fields.comparison })?;
  let address = match fields.mode {
    0 => Address::Absolute(fields.address),
    _ => Address::Displacement { base: fields.base, offset: fields.address }
  };

  Ok(Instruction::from_decoded(opcode, comparison, fields.register as u8, address))
}

/// Serializes a memory image, most significant byte first.
pub fn words_to_bytes(words: &[Word]) -> Vec<u8> {
  words.iter().flat_map(|w| w.to_be_bytes().to_vec()).collect()
}

/// The inverse of `words_to_bytes`. Trailing bytes that do not fill a word are dropped.
pub fn bytes_to_words(bytes: &[u8]) -> Vec<Word> {
  bytes
    .chunks_exact(4)
    .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    .collect()
}

/// The word in binary with the fields separated: `oooo m ccc rrrr aaaaaaaaaaaaaaaaaaaa`.
pub fn pretty_bits(word: Word) -> String {
  let fields = decode(word);
  format!(
    "{:04b} {:01b} {:03b} {:04b} {:020b}",
    fields.opcode,
    fields.mode,
    fields.comparison,
    fields.register,
    word & ADDRESS_MASK
  )
}
