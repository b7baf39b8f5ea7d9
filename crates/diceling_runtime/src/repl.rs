//! The interactive console.
//!
//! Each line is handed to a [`Session`] as a message from a local user, as
//! if it had arrived from a chat platform.

use std::io::{self, Write};

use diceling_foundation::Result;
use diceling_language::DiceSource;

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::{Message, Session};

/// Identifier of the console user.
pub const CONSOLE_USER_ID: &str = "console:0";

/// The interactive console.
pub struct Repl<E: LineEditor = RustylineEditor, D = diceling_language::RngDice> {
    /// The line editor for input.
    editor: E,

    /// Session handling every line.
    session: Session<D>,

    /// Display name of the local user.
    user_name: String,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a console over `session` with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new(session: Session) -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor, session))
    }
}

impl<E: LineEditor, D: DiceSource> Repl<E, D> {
    /// Creates a console with the given editor.
    pub fn with_editor(mut editor: E, session: Session<D>) -> Self {
        editor.set_completions(
            session.config().prefixes.clone(),
            session.keywords().to_vec(),
        );
        Self {
            editor,
            session,
            user_name: "You".to_string(),
            show_banner: true,
            prompt: "🎲> ".to_string(),
        }
    }

    /// Disables the welcome banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Sets the display name used in replies.
    #[must_use]
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session<D> {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session<D> {
        &mut self.session
    }

    /// Runs the console loop until end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }

        loop {
            let line = match self.editor.read_line(&self.prompt)? {
                ReadResult::Line(line) => line,
                ReadResult::Interrupted => continue,
                ReadResult::Eof => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            self.editor.add_history(&line);

            match self.handle_line(&line) {
                Some(reply) => println!("{reply}"),
                None => println!("\x1b[2m(not a command; try .help)\x1b[0m"),
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    /// Handles one console line, returning the bot's reply.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let message = Message::new(line).from_sender(CONSOLE_USER_ID, self.user_name.as_str());
        self.session.handle(&message)
    }

    /// Prints the welcome banner.
    fn print_banner(&self) {
        println!(
            "\x1b[1;36mDiceling console v{}\x1b[0m",
            env!("CARGO_PKG_VERSION")
        );
        let prefix = self
            .session
            .config()
            .prefixes
            .first()
            .map_or(".", String::as_str);
        println!("Type {prefix}help for commands. Use Ctrl+D to exit.\n");

        let _ = io::stdout().flush();
    }
}
