//! Line-oriented presentation host.
//!
//! Every input line is either a query or a command:
//!
//! - `:select N` (or `:n N`) highlights row N
//! - `:confirm` (or `:ok`) picks the highlighted row
//! - `:cancel` (or `:q`) dismisses the lookup
//!
//! End of input closes the lookup as cancelled.

use anyhow::Result;
use lookup_core::{
    LookupError, QueryProvider, ResultRow, RowFormatter, SelectionPayload, SelectionSession,
    SourceSet,
};
use std::io::{BufRead, Write};

#[derive(Debug, PartialEq, Eq)]
enum HostCommand {
    Query(String),
    Select(usize),
    Confirm,
    Cancel,
    Invalid(String),
}

fn parse_command(line: &str) -> HostCommand {
    let Some(command) = line.strip_prefix(':') else {
        return HostCommand::Query(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("select" | "n"), Some(index)) => match index.parse() {
            Ok(index) => HostCommand::Select(index),
            Err(_) => HostCommand::Invalid(format!("Not a row number: {}", index)),
        },
        (Some("confirm" | "ok"), None) => HostCommand::Confirm,
        (Some("cancel" | "q"), None) => HostCommand::Cancel,
        _ => HostCommand::Invalid(format!("Unknown command: {}", line)),
    }
}

/// Drives a selection session from line input.
pub struct TerminalHost<'f, R, W> {
    input: R,
    output: W,
    formatter: &'f dyn RowFormatter,
}

impl<'f, R: BufRead, W: Write> TerminalHost<'f, R, W> {
    pub fn new(input: R, output: W, formatter: &'f dyn RowFormatter) -> Self {
        Self {
            input,
            output,
            formatter,
        }
    }

    pub fn print_rows(&mut self, rows: &[ResultRow]) -> Result<()> {
        for (i, row) in rows.iter().enumerate() {
            writeln!(self.output, "[{}] {}", i, self.formatter.format(row))?;
        }
        Ok(())
    }

    pub fn print_payload(&mut self, payload: &SelectionPayload) -> Result<()> {
        writeln!(self.output, "{}", serde_json::to_string_pretty(payload)?)?;
        Ok(())
    }

    /// Run `session` until the user confirms, cancels or input ends.
    pub fn run<P, S>(
        &mut self,
        mut session: SelectionSession<'_, P, S>,
        initial_text: Option<&str>,
        initial_index: Option<usize>,
    ) -> Result<SelectionPayload>
    where
        P: QueryProvider,
        S: SourceSet + ?Sized,
    {
        session.open(initial_text, initial_index)?;
        if !session.rows().is_empty() {
            self.print_rows(session.rows())?;
        }

        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }

            match parse_command(line.trim_end_matches(['\r', '\n'])) {
                HostCommand::Query(text) => {
                    let rows = session.set_query_text(&text)?.to_vec();
                    self.print_rows(&rows)?;
                }
                HostCommand::Select(index) => match session.select_row(index) {
                    Ok(()) => writeln!(self.output, "Selected row {}", index)?,
                    Err(e @ LookupError::InvalidSelection { .. }) => {
                        writeln!(self.output, "{}", e)?
                    }
                    Err(e) => return Err(e.into()),
                },
                HostCommand::Confirm => {
                    session.confirm()?;
                    break;
                }
                HostCommand::Cancel => {
                    session.cancel()?;
                    break;
                }
                HostCommand::Invalid(message) => writeln!(self.output, "{}", message)?,
            }
        }

        Ok(session.close()?)
    }
}
