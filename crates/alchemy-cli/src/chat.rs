//! Interactive console over the session service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use alchemy_models::{SessionState, Status};
use alchemy_orchestrator::SessionService;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::runtime::Handle;

use crate::commands::Result;

/// Line-based chat that answers follow-up questions until the session ends.
pub struct ChatConsole {
    sessions: Arc<SessionService>,
    runtime: Handle,
    editor: DefaultEditor,
    history_path: PathBuf,
}

impl ChatConsole {
    /// Create a console. Line history is kept in `state_dir`.
    pub fn new(sessions: Arc<SessionService>, runtime: Handle, state_dir: &Path) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        let history_path = state_dir.join("chat_history.txt");
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }

        Ok(Self {
            sessions,
            runtime,
            editor,
            history_path,
        })
    }

    /// Run one session to completion or until the user leaves.
    pub fn run(&mut self, description: Option<String>) -> Result<()> {
        let description = match description {
            Some(description) => description,
            None => match self.read_line("Describe the UI component you want to create: ")? {
                Some(line) => line,
                None => return Ok(()),
            },
        };

        println!("Working on it...");
        let mut state = self.runtime.block_on(self.sessions.create(&description))?;

        while let Some(questions) = state.pending_questions.clone() {
            println!("\n--- UI Alchemy Needs More Information ---");
            println!("{}", questions);

            let sentinel = self
                .sessions
                .controller()
                .config()
                .force_generate_sentinel
                .clone();
            let prompt = format!("\nYour response (or type '{}' to proceed anyway): ", sentinel);
            let Some(reply) = self.read_line(&prompt)? else {
                println!(
                    "Session {} saved. Resume it with POST /sessions/{}/messages.",
                    state.id, state.id
                );
                self.save_history();
                return Ok(());
            };

            println!("Working on it...");
            state = self
                .runtime
                .block_on(self.sessions.send_message(&state.id, &reply))?;
        }

        println!("{}", render_outcome(&state));
        self.save_history();
        Ok(())
    }

    /// Read a non-empty line; `None` on Ctrl-C or Ctrl-D.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(line)?;
                    return Ok(Some(line.to_string()));
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = self.editor.save_history(&self.history_path);
    }
}

/// Human-readable summary of a finished session.
pub fn render_outcome(state: &SessionState) -> String {
    let mut out = String::from("\n--- Result ---\n");
    out.push_str(&format!("Session: {}\n", state.id));
    out.push_str(&format!("Status: {}\n", state.status));

    match state.status {
        Status::ValidationFailure => out.push_str(&format!(
            "Review feedback: {}\n",
            state.validation_feedback.trim()
        )),
        Status::Error => {
            if let Some(error) = &state.error {
                out.push_str(&format!("Error: {}\n", error));
            }
        }
        Status::Success | Status::Pending => {}
    }

    if let Some(component) = &state.component_data {
        out.push_str("\n--- Generated Component ---\n");
        if let Some(description) = &component.description {
            out.push_str(&format!("Description: {}\n", description));
        }
        if let Some(install) = &component.install_script {
            out.push_str(&format!("Install Script: {}\n", install));
        }
        if let Some(imports) = &component.imports {
            out.push_str(&format!("Imports:\n{}\n", imports));
        }
        out.push_str(&format!("Code:\n{}\n", component.code));
    }

    out
}
