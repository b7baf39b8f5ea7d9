//! Line editor abstraction for the console.
//!
//! The console talks to a [`LineEditor`], so tests can drive it with
//! scripted input while the binary uses rustyline.

use std::borrow::Cow;

use diceling_foundation::{Error, ErrorKind, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator};

/// Result of reading a line from the editor.
#[derive(Debug)]
pub enum ReadResult {
    /// A line was successfully read.
    Line(String),
    /// User pressed Ctrl+C.
    Interrupted,
    /// User pressed Ctrl+D (EOF).
    Eof,
}

/// Abstraction over line editing functionality.
pub trait LineEditor {
    /// Read a line with the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Add a line to history.
    fn add_history(&mut self, line: &str);

    /// Set the command prefixes and keywords offered for completion.
    fn set_completions(&mut self, prefixes: Vec<String>, keywords: Vec<String>);
}

/// Helper for rustyline that provides completion, hints and prompt colors.
#[derive(Helper, Completer, Hinter, Validator)]
struct ConsoleHelper {
    #[rustyline(Completer)]
    completer: CommandCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl Highlighter for ConsoleHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

/// Completes `<prefix><keyword>` at the start of a line.
#[derive(Default)]
struct CommandCompleter {
    prefixes: Vec<String>,
    keywords: Vec<String>,
}

impl CommandCompleter {
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let word = &line[..pos];
        if word.contains(char::is_whitespace) {
            return (pos, Vec::new());
        }
        let Some(prefix) = self
            .prefixes
            .iter()
            .find(|p| !p.is_empty() && word.starts_with(p.as_str()))
        else {
            return (pos, Vec::new());
        };

        let typed = word[prefix.len()..].to_lowercase();
        let mut candidates: Vec<Pair> = self
            .keywords
            .iter()
            .filter(|kw| kw.starts_with(&typed))
            .map(|kw| Pair {
                display: kw.clone(),
                replacement: format!("{prefix}{kw} "),
            })
            .collect();
        candidates.sort_by(|a, b| a.display.cmp(&b.display));
        (0, candidates)
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

/// Line editor implementation using rustyline.
pub struct RustylineEditor {
    editor: Editor<ConsoleHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates a new rustyline-based editor.
    ///
    /// # Errors
    ///
    /// Returns an error if rustyline initialization fails.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?
            .build();

        let helper = ConsoleHelper {
            completer: CommandCompleter::default(),
            hinter: HistoryHinter::new(),
        };

        let mut editor = Editor::with_config(config)
            .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?;
        editor.set_helper(Some(helper));

        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::new(ErrorKind::Internal(e.to_string()))),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn set_completions(&mut self, prefixes: Vec<String>, keywords: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer.prefixes = prefixes;
            helper.completer.keywords = keywords;
        }
    }
}
