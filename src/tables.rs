//! Table formatting shared by the VM's state dumps and the symbol table listing.

use std::fmt::Display;

use prettytable::{format as TableFormat, Table};

lazy_static! {
  pub(crate) static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

/**
  One row per register, titled `name[i]`, starting the numbering at `start`. The row at
  `highlight` is marked with an arrow; pass a value past the end to mark nothing.
*/
pub(crate) fn make_register_table<T>(
    name      : &str,
    registers : &[T],
    highlight : usize,
    start     : usize
  ) -> Table
  where T: Display
{
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Register", ubl->"Contents"]);

  for (i, value) in registers.iter().enumerate() {
    match i == highlight {

      true  => {
        table.add_row(row![r->format!("* --> {}[{}] =", name, i + start), format!("{}", value)]);
      }

      false => {
        table.add_row(row![r->format!("{}[{}] =", name, i + start), format!("{}", value)]);
      }

    } // end match on highlight
  }
  table
}
