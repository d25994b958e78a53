//! Atoms in, memory image out, then run on the VM.

use minivm::bytecode::{encode_instruction, try_decode_instruction, Comparison, Instruction, Opcode};
use minivm::{Atom, Compilation, CompileError, CompileOptions, MiniVm, Outcome, VmConfig};

fn run(compilation: &Compilation) -> (MiniVm, Outcome) {
  let mut vm = MiniVm::new(&compilation.image(), VmConfig::default());
  let outcome = vm.execute().unwrap();
  (vm, outcome)
}

#[test]
fn mov_then_add(){
  let compilation =
    Compilation::compile(&[Atom::mov(5.0, "x"), Atom::add("x", 3.0, "y")]).unwrap();
  let tables = compilation.tables();

  assert_eq!(tables.constant_address(5.0), Some(1));
  assert_eq!(tables.constant_address(3.0), Some(2));
  assert_eq!(tables.variable_address("x"), Some(3));
  assert_eq!(tables.variable_address("y"), Some(4));
  assert_eq!(tables.data_size(), 5);

  let image = compilation.image();
  assert_eq!(image[0], 5);

  let expected = [
    Instruction::absolute(Opcode::Lod, 0, 1).unwrap(),
    Instruction::absolute(Opcode::Sto, 0, 3).unwrap(),
    Instruction::absolute(Opcode::Lod, 0, 3).unwrap(),
    Instruction::absolute(Opcode::Add, 0, 2).unwrap(),
    Instruction::absolute(Opcode::Sto, 0, 4).unwrap(),
    Instruction::halt(),
  ];
  let code: Vec<Instruction> =
    image[5..].iter().map(|w| try_decode_instruction(*w).unwrap()).collect();
  assert_eq!(code, expected.to_vec());

  let (vm, outcome) = run(&compilation);
  assert_eq!(outcome, Outcome::Halted { cycles: 6 });
  assert_eq!(vm.word(4), Some(8.0f32.to_bits()));
  assert_eq!(vm.read_float(3), Some(5.0));
}

#[test]
fn data_size_counts_distinct_symbols(){
  let atoms = [
    Atom::add("a", 1.0, "b"),
    Atom::add("b", 1.0, "a"),
    Atom::mul("a", 2.5, "c"),
    Atom::mov(1.0, "c"),
  ];
  let compilation = Compilation::compile(&atoms).unwrap();
  // constants 1.0, 2.5; variables a, b, c
  assert_eq!(compilation.tables().data_size(), 2 + 3 + 1);
  assert_eq!(compilation.image()[0], 6);
}

#[test]
fn loop_from_text(){
  let text = "
    (MOV, 0, , sum)
    (MOV, 1, , i)
    (LBL, , , , , loop)
    (TST, i, 5, , 3, end)
    (ADD, sum, i, sum)
    (ADD, i, 1, i)
    (JMP, , , , , loop)
    (LBL, , , , , end)
  ";
  let compilation = Compilation::compile_text(text, &CompileOptions::default()).unwrap();
  let (vm, outcome) = run(&compilation);
  assert!(outcome.halted());

  let sum = compilation.tables().variable_address("sum").unwrap() as usize;
  let i = compilation.tables().variable_address("i").unwrap() as usize;
  assert_eq!(vm.read_float(sum), Some(15.0));
  assert_eq!(vm.read_float(i), Some(6.0));
}

#[test]
fn negation_and_division(){
  let atoms = [
    Atom::neg(4.0, "a"),
    Atom::div("a", 8.0, "b"),
    Atom::sub("b", "a", "c"),
  ];
  let compilation = Compilation::compile(&atoms).unwrap();
  let (vm, _) = run(&compilation);
  let tables = compilation.tables();
  let read = |name: &str| vm.read_float(tables.variable_address(name).unwrap() as usize);
  assert_eq!(read("a"), Some(-4.0));
  assert_eq!(read("b"), Some(-0.5));
  assert_eq!(read("c"), Some(3.5));
}

#[test]
fn every_comparison_branches_correctly(){
  // Each test jumps over the store of 1.0 into `taken` when its comparison holds.
  let cases = [
    (Comparison::Equal,          2.0, 2.0, true),
    (Comparison::Equal,          2.0, 3.0, false),
    (Comparison::Lesser,         1.0, 3.0, true),
    (Comparison::Greater,        1.0, 3.0, false),
    (Comparison::LesserOrEqual,  3.0, 3.0, true),
    (Comparison::GreaterOrEqual, 2.0, 3.0, false),
    (Comparison::Unequal,        2.0, 3.0, true),
  ];
  for (comparison, lhs, rhs, holds) in cases.iter() {
    let atoms = [
      Atom::mov(*lhs, "l"),
      Atom::mov(0.0, "skipped"),
      Atom::tst("l", *rhs, *comparison, "over"),
      Atom::mov(1.0, "skipped"),
      Atom::lbl("over"),
    ];
    let compilation = Compilation::compile(&atoms).unwrap();
    let (vm, _) = run(&compilation);
    let address = compilation.tables().variable_address("skipped").unwrap() as usize;
    let expected = match holds { true => 0.0, false => 1.0 };
    assert_eq!(vm.read_float(address), Some(expected), "{} {} {}", lhs, comparison, rhs);
  }
}

#[test]
fn self_loop_runs_out_of_cycles(){
  let compilation = Compilation::compile(&[Atom::lbl("l"), Atom::jmp("l")]).unwrap();
  let (vm, outcome) = run(&compilation);
  assert_eq!(outcome, Outcome::CycleBudgetExhausted { cycles: 1000 });
  assert!(!outcome.halted());
  assert_eq!(vm.cycles(), 1000);
}

#[test]
fn jump_to_undefined_label_fails(){
  let result = Compilation::compile(&[Atom::jmp("missing")]);
  match result {
    Err(CompileError::UndefinedLabel { label, atom_index, .. }) => {
      assert_eq!(label, "missing");
      assert_eq!(atom_index, 0);
    }
    other => panic!("expected an undefined label, got {:?}", other),
  }
}

#[test]
fn duplicates_share_addresses(){
  let compilation = Compilation::compile(&[
    Atom::add("x", 7.0, "x"),
    Atom::mul(7.0, "x", "x"),
  ]).unwrap();
  assert_eq!(compilation.tables().constants().len(), 1);
  assert_eq!(compilation.tables().variables().len(), 1);
  assert_eq!(compilation.tables().data_size(), 3);
}

#[test]
fn image_survives_serialization(){
  let compilation =
    Compilation::compile(&[Atom::mov(5.0, "x"), Atom::add("x", 3.0, "y")]).unwrap();
  let bytes = compilation.to_bytes();
  assert_eq!(&bytes[..4], &[0, 0, 0, 5]);

  let mut vm = MiniVm::from_bytes(&bytes, VmConfig::default());
  assert!(vm.execute().unwrap().halted());
  assert_eq!(vm.read_float(4), Some(8.0));
}

#[test]
fn halt_ends_the_image(){
  let compilation = Compilation::compile(&[Atom::mov(1.0, "x")]).unwrap();
  let last = *compilation.image().last().unwrap();
  assert_eq!(last, encode_instruction(&Instruction::halt()));
}
