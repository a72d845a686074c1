use std::fmt::Display;
use std::io::{self, Write};

use ushuffle_core::format::{header_line, row_line};
use ushuffle_core::User;

/// Writes the human-readable run log: step banners, table dumps and outcome
/// lines.
pub struct Reporter<W> {
    out: W,
    started: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
        }
    }

    /// `*** <title>`, separated from earlier output by a blank line.
    pub fn banner(&mut self, title: &str) -> io::Result<()> {
        if self.started {
            writeln!(self.out)?;
        }
        self.started = true;
        writeln!(self.out, "*** {}", title)
    }

    pub fn dump(&mut self, users: &[User]) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", header_line())?;
        for user in users {
            writeln!(self.out, "{}", row_line(user))?;
        }
        Ok(())
    }

    pub fn outcome(&mut self, outcome: &impl Display) -> io::Result<()> {
        writeln!(self.out, "\t{}", outcome)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
