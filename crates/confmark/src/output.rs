//! Terminal output.

use console::{Term, style};

/// Status messages on stderr, documents on stdout.
pub(crate) struct Output {
    stderr: Term,
    stdout: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            stderr: Term::stderr(),
            stdout: Term::stdout(),
        }
    }

    /// Plain status line.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.stderr.write_line(msg);
    }

    /// Yellow status line.
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.stderr.write_line(&style(msg).yellow().for_stderr().to_string());
    }

    /// Red status line.
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.stderr.write_line(&style(msg).red().for_stderr().to_string());
    }

    /// Bold heading line, such as a page title.
    pub(crate) fn heading(&self, msg: &str) {
        let _ = self.stderr.write_line(&style(msg).bold().for_stderr().to_string());
    }

    /// Write a converted document to stdout.
    pub(crate) fn document(&self, text: &str) -> std::io::Result<()> {
        self.stdout.write_str(text)?;
        self.stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines_without_terminal() {
        let output = Output::new();
        output.info("info");
        output.warning("warning");
        output.error("error");
        output.heading("Page (id=1)");
    }
}
