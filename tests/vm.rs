//! Running hand-assembled images on the MiniVM.

use minivm::address::Address;
use minivm::bytecode::{encode_instruction, words_to_bytes, Comparison, Instruction, Opcode, Word};
use minivm::{MiniVm, Outcome, State, VmConfig, VmError};

fn assemble(data: &[f32], code: &[Instruction]) -> Vec<Word> {
  let mut image = vec![(data.len() + 1) as Word];
  image.extend(data.iter().map(|v| v.to_bits()));
  image.extend(code.iter().map(encode_instruction));
  image
}

#[test]
fn counts_down_with_a_pc_relative_constant(){
  // The decrement 1.0 sits past the HLT and is reached relative to the pc.
  //   0: boot pc, 2
  //   1: counter, 3.0
  //   2: LOD r0, 1
  //   3: SUB r0, 5(r1)       reads word 3 + 5 = 8
  //   4: STO r0, 1
  //   5: CMP GREATER r0, 9
  //   6: JMP r0, 2
  //   7: HLT
  //   8: 1.0
  //   9: 0.0
  let relative = |opcode: Opcode, offset: u32| {
    Instruction::new(opcode, Comparison::Always, 0, Address::Displacement { base: 1, offset })
      .unwrap()
  };
  let code = [
    Instruction::absolute(Opcode::Lod, 0, 1).unwrap(),
    relative(Opcode::Sub, 5),
    Instruction::absolute(Opcode::Sto, 0, 1).unwrap(),
    Instruction::compare(Comparison::Greater, 0, 9).unwrap(),
    Instruction::absolute(Opcode::Jmp, 0, 2).unwrap(),
    Instruction::halt(),
  ];
  let mut image = assemble(&[3.0], &code);
  image.push(1.0f32.to_bits()); // word 8
  image.push(0.0f32.to_bits()); // word 9

  let mut vm = MiniVm::new(&image, VmConfig::default());
  let outcome = vm.execute().unwrap();
  assert!(outcome.halted());
  assert_eq!(vm.read_float(1), Some(0.0));
  // Three passes of five instructions, then HLT.
  assert_eq!(outcome, Outcome::Halted { cycles: 16 });
}

#[test]
fn budget_is_configurable(){
  let image = assemble(&[], &[
    Instruction::compare(Comparison::Always, 0, 0).unwrap(),
    Instruction::absolute(Opcode::Jmp, 0, 1).unwrap(),
  ]);
  let config = VmConfig { max_cycles: 10, verbose: false };
  let mut vm = MiniVm::from_bytes(&words_to_bytes(&image), config);
  assert_eq!(vm.execute(), Ok(Outcome::CycleBudgetExhausted { cycles: 10 }));
  assert_eq!(vm.state(), State::Running);

  // Another call has no budget left.
  assert_eq!(vm.execute(), Ok(Outcome::CycleBudgetExhausted { cycles: 10 }));
}

#[test]
fn storing_outside_memory_is_a_fault(){
  let image = assemble(&[], &[
    Instruction::new(
      Opcode::Sto, Comparison::Always, 0, Address::Displacement { base: 1, offset: 0xFFFE }
    ).unwrap(),
  ]);
  let mut vm = MiniVm::new(&image, VmConfig::default());
  assert_eq!(vm.execute(), Err(VmError::AddressOutOfRange { pc: 1, address: 0xFFFF }));
}

#[test]
fn running_off_into_zeroed_memory_clears_forever(){
  // Zero words decode as `CLR r0`, so an image without HLT spins until the budget runs out.
  let image = assemble(&[], &[]);
  let mut vm = MiniVm::new(&image, VmConfig { max_cycles: 50, verbose: false });
  assert_eq!(vm.execute(), Ok(Outcome::CycleBudgetExhausted { cycles: 50 }));
  assert_eq!(vm.pc(), 51);
}
