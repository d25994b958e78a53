//! Turns atoms into a memory image for the VM. See `compile` for the pipeline.

mod allocate;
mod compile;
mod optimize;
mod parser;
mod unreachable;

pub use allocate::allocate;
pub use compile::*;
pub use optimize::optimize;
pub use parser::{parse, parse_atom};
pub use unreachable::eliminate_unreachable;
