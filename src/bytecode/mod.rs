/*!

  The MiniVM uses a 32 bit word for everything: instructions, float constants, and variable
  storage. Memory is a flat array of words and addresses index words, not bytes. Every
  instruction is exactly one word, packed big end first:

    Opcode:       4 bits   (31..28)
    Mode:         1 bit    (27)
    Comparison:   3 bits   (26..24)
    Register:     4 bits   (23..20)
    Address:     20 bits   (19..0)    absolute mode
      or
    Base:         4 bits   (19..16)   displacement mode
    Displacement 16 bits   (15..0)

  Labels, variables and constants do not appear in the bytecode. They are symbolic names for
  addresses, resolved during compilation through the tables in `crate::symboltable` and kept
  around afterward only for listings.

  As in the rest of the crate, an instruction has an unpacked form (`Instruction`), whose
  constructors check every field against its width, and the packed `Word`. Packing a valid
  `Instruction` cannot fail; unpacking a word can, because four opcode bits and three comparison
  bits have more values than there are opcodes and comparison kinds.

*/

mod binary;
mod instruction;
mod assembly;

pub use binary::{
  encode, decode, encode_instruction, try_decode_instruction, words_to_bytes, bytes_to_words,
  pretty_bits, check_field, Field, Fields, Word,
  MAX_OPCODE, MAX_COMPARISON, MAX_REGISTER, MAX_ABSOLUTE_ADDRESS, MAX_DISPLACEMENT
};
pub use instruction::{Instruction, Opcode, Comparison, Mode};
pub use assembly::{listing, instruction_comment};
