//! Tree output

use anyhow::Result;
use std::io::{self, Write};

/// Write rendered tree lines, one per line
pub fn write_tree<W: Write>(out: &mut W, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Print rendered tree lines to stdout
pub fn print_tree(lines: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_tree(&mut handle, lines)
}
