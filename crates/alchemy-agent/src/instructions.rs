//! System instructions shared by every agent prompt.

use std::path::Path;

use tracing::{debug, warn};

const DEFAULT_INSTRUCTIONS: &str = "\
You are UI Alchemy, an assistant that designs and writes React components \
using Material UI (MUI).

Guidelines:
- Produce complete, self-contained components that render on their own.
- Use functional components and hooks; avoid class components.
- Import everything the component uses from @mui/material, @mui/icons-material \
or React itself.
- Inline any sample data the component needs instead of relying on props or \
external variables.
- Export the component as the default export.
- Keep answers concise and focused on the requested component.";

/// System prompt text given to every agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInstructions {
    text: String,
}

impl Default for SystemInstructions {
    fn default() -> Self {
        Self {
            text: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }
}

impl SystemInstructions {
    /// Use `text` verbatim.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Load instructions from `path`, falling back to the built-in text.
    ///
    /// A missing, unreadable or blank file is logged and never fails the caller.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(text) if !text.trim().is_empty() => {
                debug!(path = %path.display(), "Loaded system instructions");
                Self::new(text)
            }
            Ok(_) => {
                warn!(path = %path.display(), "Instructions file is empty, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not read instructions file, using defaults"
                );
                Self::default()
            }
        }
    }

    /// The instruction text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}
