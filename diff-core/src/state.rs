use std::fmt;

/// Where a [`crate::DiffSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    LoadingStructure,
    LoadingNodes,
    Done,
    /// The two snapshots have no meaningful differences.
    Empty,
    Error,
}

impl SessionState {
    /// Text shown to the operator.
    pub fn message(self) -> &'static str {
        match self {
            SessionState::LoadingStructure => "Loading Structure",
            SessionState::LoadingNodes => "Loading Nodes",
            SessionState::Done => "Done",
            SessionState::Empty => "No meaningful differences.",
            SessionState::Error => "Error loading diff",
        }
    }

    /// No further polling happens from a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Done | SessionState::Empty | SessionState::Error
        )
    }

    pub fn is_loading(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_what_operators_see() {
        assert_eq!(SessionState::LoadingStructure.to_string(), "Loading Structure");
        assert_eq!(SessionState::LoadingNodes.to_string(), "Loading Nodes");
        assert_eq!(SessionState::Done.to_string(), "Done");
        assert_eq!(SessionState::Empty.to_string(), "No meaningful differences.");
        assert_eq!(SessionState::Error.to_string(), "Error loading diff");
    }

    #[test]
    fn terminal_states() {
        assert!(!SessionState::LoadingStructure.is_terminal());
        assert!(!SessionState::LoadingNodes.is_terminal());
        assert!(SessionState::Done.is_terminal());
        assert!(SessionState::Empty.is_terminal());
        assert!(SessionState::Error.is_terminal());
    }
}
