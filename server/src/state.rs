//! Application lifecycle states.

/// Application operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Built but background refresh not started.
    Starting,
    /// Background refresh running, serving requests.
    Running,
    /// Stopping background refresh.
    ShuttingDown,
    /// Stopped.
    Stopped,
}

impl AppState {
    /// Check if the application is serving requests.
    pub fn accepts_requests(&self) -> bool {
        matches!(self, AppState::Running)
    }

    /// Check if the application is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppState::Stopped)
    }
}
