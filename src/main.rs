use std::io::BufRead;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use minivm::bytecode::pretty_bits;
use minivm::{Compilation, CompileOptions, MiniVm, State, VmConfig};

/// Sums 1 through 5 into `sum`.
const DEMO_PROGRAM: &str = "
# sum = 0; i = 1; while i <= 5 { sum = sum + i; i = i + 1 }
(MOV, 0, , sum)
(MOV, 1, , i)
(LBL, , , , , loop)
(TST, i, 5, , 3, end)       # i > 5
(ADD, sum, i, sum)
(ADD, i, 1, i)
(JMP, , , , , loop)
(LBL, , , , , end)
";

#[derive(Parser, Debug)]
#[command(name = "minivm", about = "Compiles atoms to MiniVM instructions and runs them")]
struct Args {
  /// File of atoms, one per line. Runs a built-in demo program if omitted.
  atoms: Option<PathBuf>,

  /// Collapse redundant load/store pairs.
  #[arg(long)]
  optimize: bool,

  /// Drop atoms between an unconditional jump and the next label.
  #[arg(long)]
  eliminate_unreachable: bool,

  /// Write the memory image to this file, big-endian.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Print the assembly listing and symbol tables.
  #[arg(short, long)]
  listing: bool,

  /// Print the machine state after every instruction.
  #[arg(short, long)]
  verbose: bool,

  /// Wait for Enter before every instruction.
  #[arg(long)]
  step: bool,

  /// Stop after this many instructions.
  #[arg(long, default_value_t = minivm::vm::DEFAULT_MAX_CYCLES)]
  max_cycles: usize,
}

pub fn main() -> Result<(), String> {
  env_logger::init();
  let args = Args::parse();

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let text = match &args.atoms {
    Some(path) => {
      std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?
    }
    None => {
      println!("Atoms:{}", DEMO_PROGRAM);
      DEMO_PROGRAM.to_string()
    }
  };

  let options = CompileOptions {
    eliminate_unreachable : args.eliminate_unreachable,
    optimize              : args.optimize
  };
  let compilation = Compilation::compile_text(&text, &options).map_err(|e| e.to_string())?;
  info!("Compiled to {} words.", compilation.image().len());

  if args.listing {
    println!("{}\n{}", compilation.tables(), compilation.listing());
    for word in compilation.image() {
      println!("{:08x}  {}", word, pretty_bits(word));
    }
    println!();
  }

  if let Some(path) = &args.output {
    std::fs::write(path, compilation.to_bytes())
      .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    println!("Wrote {} bytes to {}.", compilation.to_bytes().len(), path.display());
  }

  let config = VmConfig {
    max_cycles : args.max_cycles,
    verbose    : args.verbose || VmConfig::default().verbose
  };
  let mut machine = MiniVm::new(&compilation.image(), config);

  if args.step {
    let stdin = std::io::stdin();
    let mut line = String::new();
    while machine.state() != State::Halted && machine.cycles() < config.max_cycles {
      println!("Press Enter to step...");
      line.clear();
      stdin.lock().read_line(&mut line).map_err(|e| e.to_string())?;
      machine.step().map_err(|e| e.to_string())?;
    }
  }

  let outcome = machine.execute().map_err(|e| e.to_string())?;
  println!("Machine {}.", outcome);

  for (name, address) in compilation.tables().variables() {
    if let Some(value) = machine.read_float(address as usize) {
      println!("{:>12} = {}", name.to_string(), value);
    }
  }

  Ok(())
}
