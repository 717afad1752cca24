//! Numbered-menu shell
//!
//! Reads from any `BufRead` and writes to any `Write`, so the same loop
//! drives stdin/stdout and the tests.

use console::style;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::app::StudyMate;
use crate::error::Result;
use crate::types::{ChatAnswer, IngestReport};

const MENU: &str = "
StudyMate CLI Menu
-----------------
1) Create new session
2) Add documents to a session
3) List all sessions
4) Select active session (chat)
5) Delete a session
6) Exit
";

/// Interactive menu loop over one [`StudyMate`]
pub struct Shell<'a, R, W> {
    app: &'a StudyMate,
    input: R,
    output: W,
}

/// Whether the loop should keep going after an action
enum Flow {
    Continue,
    Exit,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(app: &'a StudyMate, input: R, output: W) -> Self {
        Self { app, input, output }
    }

    /// Run until the user picks Exit or input ends
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Welcome to StudyMate")?;
        writeln!(self.output, "--------------------")?;

        loop {
            write!(self.output, "{}", MENU)?;
            let Some(choice) = self.prompt("Enter your choice: ")? else {
                writeln!(self.output)?;
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.create_session().await?,
                "2" => self.add_documents().await?,
                "3" => {
                    self.list_sessions()?;
                    Flow::Continue
                }
                "4" => self.chat().await?,
                "5" => self.delete_session().await?,
                "6" => {
                    writeln!(self.output, "Exiting StudyMate. Goodbye!")?;
                    Flow::Exit
                }
                _ => {
                    writeln!(self.output, "Invalid option. Please try again.")?;
                    Flow::Continue
                }
            };

            if let Flow::Exit = flow {
                break;
            }
        }

        self.output.flush()?;
        Ok(())
    }

    /// Print `text`, read one trimmed line; `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_error(&mut self, err: &crate::Error) -> Result<()> {
        writeln!(self.output, "{} {}", style("Error:").red().bold(), err)?;
        Ok(())
    }

    /// Numbered session list; returns false when there are none
    fn list_sessions(&mut self) -> Result<bool> {
        let sessions = self.app.list_sessions();
        if sessions.is_empty() {
            writeln!(self.output, "Session list is empty. First add some sessions.")?;
            return Ok(false);
        }

        writeln!(self.output, "List of all Session Names")?;
        writeln!(self.output, "-------------------------")?;
        for (i, name) in sessions.iter().enumerate() {
            writeln!(self.output, "Session no {}: {}", i + 1, name)?;
        }
        writeln!(self.output, "-------------------------")?;
        Ok(true)
    }

    /// List sessions and read a registered name; `None` on end of input or
    /// when there is nothing to choose
    fn select_session(&mut self, text: &str) -> Result<Option<String>> {
        if !self.list_sessions()? {
            return Ok(None);
        }

        let Some(name) = self.prompt(text)? else {
            return Ok(None);
        };
        if !self.app.has_session(&name) {
            writeln!(self.output, "Session '{}' does not exist.", name)?;
            return Ok(None);
        }
        Ok(Some(name))
    }

    async fn create_session(&mut self) -> Result<Flow> {
        let Some(name) = self.prompt("Enter the session name (no spaces allowed): ")? else {
            return Ok(Flow::Exit);
        };

        match self.app.create_session(&name).await {
            Ok(()) => writeln!(
                self.output,
                "{}",
                style(format!("Session '{}' created successfully!", name)).green()
            )?,
            Err(e) => self.print_error(&e)?,
        }
        Ok(Flow::Continue)
    }

    async fn add_documents(&mut self) -> Result<Flow> {
        let Some(session) = self.select_session("Write the session name to add documents to: ")? else {
            return Ok(Flow::Continue);
        };

        let mut paths = Vec::new();
        loop {
            let Some(line) = self.prompt("PDF path (or type done to finish): ")? else {
                break;
            };
            if line.eq_ignore_ascii_case("done") {
                break;
            }
            if !line.is_empty() {
                paths.push(PathBuf::from(line));
            }
        }

        if paths.is_empty() {
            writeln!(self.output, "No documents given.")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "Adding {} document(s) to '{}'...", paths.len(), session)?;
        match self.app.add_documents(&session, &paths).await {
            Ok(outcomes) => {
                for (path, outcome) in outcomes {
                    match outcome {
                        Ok(report) => writeln!(self.output, "  {}", format_report(&report))?,
                        Err(e) => writeln!(
                            self.output,
                            "  {} {}: {}",
                            style("failed").red(),
                            path.display(),
                            e
                        )?,
                    }
                }
            }
            Err(e) => self.print_error(&e)?,
        }
        Ok(Flow::Continue)
    }

    async fn chat(&mut self) -> Result<Flow> {
        let Some(session) = self.select_session("Write the session name to start the chat: ")? else {
            return Ok(Flow::Continue);
        };

        loop {
            let Some(question) = self.prompt("Ask (or type quit to stop): ")? else {
                return Ok(Flow::Exit);
            };
            if question.eq_ignore_ascii_case("quit") {
                writeln!(self.output, "Going back to main menu.")?;
                return Ok(Flow::Continue);
            }
            if question.is_empty() {
                continue;
            }

            match self.app.ask(&session, &question).await {
                Ok(answer) => self.print_answer(&answer)?,
                Err(e) => self.print_error(&e)?,
            }
        }
    }

    fn print_answer(&mut self, answer: &ChatAnswer) -> Result<()> {
        writeln!(self.output, "Answer: {}", answer.answer)?;

        if self.app.config().retrieval.show_sources && answer.had_context() {
            writeln!(self.output, "{}", style("Sources:").dim())?;
            for citation in &answer.citations {
                writeln!(self.output, "  - {}", citation.format_inline())?;
            }
        }
        Ok(())
    }

    async fn delete_session(&mut self) -> Result<Flow> {
        let Some(name) = self.select_session("Write the session name to delete: ")? else {
            return Ok(Flow::Continue);
        };

        match self.app.delete_session(&name).await {
            Ok(()) => writeln!(self.output, "Session '{}' deleted successfully.", name)?,
            Err(e) => self.print_error(&e)?,
        }
        Ok(Flow::Continue)
    }
}

/// One-line summary of an ingested document
pub fn format_report(report: &IngestReport) -> String {
    let mut line = format!(
        "{}: {} page(s), {} chunk(s)",
        report.filename, report.pages, report.chunks
    );
    if report.duplicate {
        line.push_str(" (already present, stored again)");
    }
    line
}
