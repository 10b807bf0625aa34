use csv_to_opd::{RowDecision, RowErrorHandler, RowStructureError};
use std::io::{self, BufRead, Stderr, StdinLock, Write};

/// Asks on the terminal whether to go on after a bad row.
///
/// The question goes to stderr so stdout only carries the result.
pub struct PromptHandler<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl PromptHandler<StdinLock<'static>, Stderr> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptHandler<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, row: usize) -> io::Result<bool> {
        write!(
            self.output,
            "There was an error converting row {}. Do you want to continue? [y/N] ",
            row
        )?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

impl<R: BufRead, W: Write> RowErrorHandler for PromptHandler<R, W> {
    fn on_row_error(&mut self, error: &RowStructureError) -> RowDecision {
        tracing::warn!("{}", error);
        match self.ask(error.row) {
            Ok(true) => RowDecision::Continue,
            Ok(false) => RowDecision::Abort,
            Err(e) => {
                // Unreadable input counts as a no.
                tracing::error!("Failed to read answer: {}", e);
                RowDecision::Abort
            }
        }
    }
}
