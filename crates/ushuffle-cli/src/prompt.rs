use std::io::{BufRead, Write};

use anyhow::Context;
use ushuffle_core::BackendKind;

pub fn menu() -> String {
    let mut text = String::from("\n    Choose a database system:\n\n");
    for kind in BackendKind::ALL {
        text.push_str("    ");
        text.push_str(kind.menu_label());
        text.push('\n');
    }
    text.push_str("\n    Enter choice: ");
    text
}

/// Shows the backend menu and reads one answer line.
pub fn choose_backend<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<BackendKind> {
    output.write_all(menu().as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read backend choice")?;
    if read == 0 {
        anyhow::bail!("no backend chosen");
    }
    let kind = BackendKind::from_choice(&line)?;
    Ok(kind)
}
