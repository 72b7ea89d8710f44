//! Persistence layer for UI Alchemy sessions.
//!
//! Sessions are stored as flat JSON records keyed by session id. The file
//! store writes atomically (temp file, then rename) so a crash mid-write
//! never leaves a half-written session behind.
//!
//! # Example
//!
//! ```no_run
//! use alchemy_models::{ComponentSchema, SessionId, SessionRecord, SessionState};
//! use alchemy_persistence::{FileSessionStore, SessionStore};
//!
//! let store = FileSessionStore::new("/home/user/.ui-alchemy");
//!
//! let state = SessionState::new(SessionId::new(), "Create a button", ComponentSchema::Full);
//! let record = SessionRecord::new(state);
//! store.save(&record).unwrap();
//!
//! let loaded = store.load(&record.state.id).unwrap();
//! ```

pub mod atomic;
pub mod error;
pub mod session_store;

pub use error::{PersistenceError, Result};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
