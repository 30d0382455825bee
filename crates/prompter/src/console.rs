use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Marker printed before every line of input.
pub const INPUT_MARKER: &str = ">>> ";

/// Line-oriented terminal the prompts talk to.
pub trait Console {
    /// Prints one line of output.
    fn say(&mut self, text: &str) -> io::Result<()>;

    /// Prints `marker` and reads one line without its line ending.
    ///
    /// Returns `None` once input is exhausted.
    fn read_line(&mut self, marker: &str) -> io::Result<Option<String>>;
}

/// Console backed by the process stdin/stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn say(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text)
    }

    fn read_line(&mut self, marker: &str) -> io::Result<Option<String>> {
        {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{}", marker)?;
            stdout.flush()?;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }
}

/// Console that replays queued input lines and records everything shown.
#[derive(Debug, Default, Clone)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Every line printed or read so far; reads are prefixed with their marker.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Transcript joined with newlines.
    pub fn output(&self) -> String {
        self.transcript.join("\n")
    }

    /// Number of queued input lines not yet consumed.
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for ScriptedConsole {
    fn say(&mut self, text: &str) -> io::Result<()> {
        self.transcript.push(text.to_string());
        Ok(())
    }

    fn read_line(&mut self, marker: &str) -> io::Result<Option<String>> {
        let line = self.inputs.pop_front();
        if let Some(line) = &line {
            self.transcript.push(format!("{}{}", marker, line));
        }
        Ok(line)
    }
}

fn strip_line_ending(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_unix_and_windows_line_endings() {
        assert_eq!(strip_line_ending("abc\n".into()), "abc");
        assert_eq!(strip_line_ending("abc\r\n".into()), "abc");
        assert_eq!(strip_line_ending(" abc ".into()), " abc ");
    }

    #[test]
    fn scripted_console_records_reads_and_runs_dry() {
        let mut console = ScriptedConsole::new(["first"]);
        console.say("question").unwrap();
        assert_eq!(console.read_line(INPUT_MARKER).unwrap().as_deref(), Some("first"));
        assert_eq!(console.read_line(INPUT_MARKER).unwrap(), None);
        assert_eq!(console.transcript(), ["question", ">>> first"]);
        assert_eq!(console.remaining(), 0);
    }
}
