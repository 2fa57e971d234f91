//! Line input on a dedicated thread.
//!
//! Besides submitted lines, the reader reports every change of the line being
//! edited so the session can drive the local typing indicator.

use std::{borrow::Cow, cell::RefCell, thread};

use rustyline::{
    Editor, Helper, completion::Completer, error::ReadlineError, highlight::Highlighter,
    hint::Hinter, history::DefaultHistory, validate::Validator,
};
use tokio::sync::{mpsc, watch};

/// Event produced by the line reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The line being edited changed
    Edited(String),
    /// A line was submitted with Enter
    Submitted(String),
    /// Ctrl+C, Ctrl+D, or a terminal error
    Closed,
}

/// A parsed submitted line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// `/join <workspace>`
    Join(String),
    /// `/quit`
    Quit,
    /// Anything that is not a command
    Say(String),
    /// A malformed command, with a usage hint
    Invalid(String),
}

impl InputCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("quit"), None, _) => Self::Quit,
            (Some("join"), Some(workspace), None) => Self::Join(workspace.to_string()),
            (Some("join"), _, _) => Self::Invalid("usage: /join <workspace>".to_string()),
            _ => Self::Invalid(format!("unknown command: /{}", command)),
        }
    }
}

/// Rustyline helper that forwards the edited line on every change
struct EditObserver {
    events: mpsc::UnboundedSender<InputEvent>,
    last: RefCell<String>,
}

impl EditObserver {
    fn observe(&self, line: &str) {
        let mut last = self.last.borrow_mut();
        if *last != line {
            line.clone_into(&mut last);
            let _ = self.events.send(InputEvent::Edited(line.to_string()));
        }
    }

    fn reset(&self) {
        self.last.borrow_mut().clear();
    }
}

impl Highlighter for EditObserver {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        self.observe(line);
        Cow::Borrowed(line)
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        self.observe(line);
        false
    }
}

impl Completer for EditObserver {
    type Candidate = String;
}

impl Hinter for EditObserver {
    type Hint = String;
}

impl Validator for EditObserver {}

impl Helper for EditObserver {}

/// Spawn the blocking line reader. `prompt` is re-read before every line.
pub fn spawn_line_reader(
    events: mpsc::UnboundedSender<InputEvent>,
    prompt: watch::Receiver<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rl = match Editor::<EditObserver, DefaultHistory>::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                let _ = events.send(InputEvent::Closed);
                return;
            }
        };
        rl.set_helper(Some(EditObserver {
            events: events.clone(),
            last: RefCell::new(String::new()),
        }));

        loop {
            let label = prompt.borrow().clone();
            match rl.readline(&label) {
                Ok(line) => {
                    if let Some(observer) = rl.helper() {
                        observer.reset();
                    }
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if events.send(InputEvent::Submitted(line.to_string())).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    let _ = events.send(InputEvent::Closed);
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    let _ = events.send(InputEvent::Closed);
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    let _ = events.send(InputEvent::Closed);
                    break;
                }
            }
        }
    })
}
