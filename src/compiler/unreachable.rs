//! Drops atoms control can never reach: everything after an unconditional jump up to the next
//! label definition.

use log::debug;

use crate::atom::Atom;

pub fn eliminate_unreachable(atoms: &[Atom]) -> Vec<Atom> {
  let mut kept: Vec<Atom> = Vec::with_capacity(atoms.len());
  let mut reachable = true;

  for atom in atoms {
    match atom {
      Atom::Lbl { .. } => {
        reachable = true;
        kept.push(atom.clone());
      }
      Atom::Jmp { .. } if reachable => {
        reachable = false;
        kept.push(atom.clone());
      }
      _ if reachable => kept.push(atom.clone()),
      _              => {}
    }
  }

  debug!("Removed {} unreachable atoms.", atoms.len() - kept.len());
  kept
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::Comparison;

  #[test]
  fn drops_atoms_between_jump_and_label(){
    let atoms = vec![
      Atom::mov(1.0, "x"),
      Atom::jmp("end"),
      Atom::add("x", 1.0, "x"),
      Atom::jmp("elsewhere"),
      Atom::lbl("end"),
      Atom::mov("x", "y"),
    ];
    let kept = eliminate_unreachable(&atoms);
    assert_eq!(kept, vec![
      Atom::mov(1.0, "x"),
      Atom::jmp("end"),
      Atom::lbl("end"),
      Atom::mov("x", "y"),
    ]);
  }

  #[test]
  fn conditional_jumps_keep_the_fall_through(){
    let atoms = vec![
      Atom::tst("x", 0.0, Comparison::Equal, "end"),
      Atom::mov(2.0, "x"),
      Atom::lbl("end"),
    ];
    assert_eq!(eliminate_unreachable(&atoms), atoms);
  }

  #[test]
  fn trailing_code_after_jump_is_dropped(){
    let atoms = vec![Atom::lbl("top"), Atom::jmp("top"), Atom::mov(1.0, "x")];
    assert_eq!(eliminate_unreachable(&atoms), vec![Atom::lbl("top"), Atom::jmp("top")]);
  }
}
