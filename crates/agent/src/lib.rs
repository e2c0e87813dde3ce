//! Conversation runtime for rate lookups.
//!
//! Each chat turn runs the same loop:
//! 1. **Extraction** (`conversation`) - normalize the message and pull slot values out of it
//! 2. **Session merge** (`session`) - fold them into the per-session slot set, first write wins
//! 3. **Dialogue** - ask for the next missing required slot, in priority order
//! 4. **Lookup** - build the filtered query, run it against the record source and render the
//!    result table, then reset the session
//!
//! Extraction is substring and regex matching only. The record source decides what
//! countries exist; the runtime never invents one.

pub mod conversation;
pub mod runtime;
pub mod session;

pub use runtime::{AgentRuntime, ReplyKind, RuntimeSettings, TurnError, TurnReply};
pub use session::{InMemorySessionStore, SessionStore};
