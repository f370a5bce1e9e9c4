use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the session owned by a [`super::SessionManager`]
///
/// ```text
/// Uninitialized -> Initializing -> Ready -> Destroyed
///                        |                      ^
///                        +---- (failure) -------+
/// ```
///
/// `initialize` may be called again from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session has been requested yet
    Uninitialized,
    /// Engine load and schema execution in progress
    Initializing,
    /// A database is live and accepts queries
    Ready,
    /// The last session was released, or failed to build
    Destroyed,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}
