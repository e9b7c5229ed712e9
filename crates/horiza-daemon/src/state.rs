// crates/horiza-daemon/src/state.rs
//
// Node state machine for the Horiza Protocol daemon.
//
// Valid transitions:
//   Initializing -> Recovering -> Ready -> Advancing -> Ready
//   Any state -> ShuttingDown

use std::fmt;

use crate::error::{DaemonError, DaemonResult};

/// Lifecycle states of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Loading configuration.
    Initializing,
    /// Restoring persisted engine state or building genesis.
    Recovering,
    /// Serving RPC requests.
    Ready,
    /// The scheduler is advancing an epoch and distributing emission.
    Advancing,
    /// Draining the RPC server and persisting state.
    ShuttingDown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Recovering => write!(f, "Recovering"),
            NodeState::Ready => write!(f, "Ready"),
            NodeState::Advancing => write!(f, "Advancing"),
            NodeState::ShuttingDown => write!(f, "ShuttingDown"),
        }
    }
}

/// State machine for managing daemon lifecycle transitions.
#[derive(Debug)]
pub struct NodeStateMachine {
    pub current: NodeState,
}

impl NodeStateMachine {
    /// Create a new state machine starting in the Initializing state.
    pub fn new() -> Self {
        Self {
            current: NodeState::Initializing,
        }
    }

    /// Attempt to transition to a new state.
    pub fn transition(&mut self, new_state: NodeState) -> DaemonResult<()> {
        let valid = matches!(
            (self.current, new_state),
            (_, NodeState::ShuttingDown)
                | (NodeState::Initializing, NodeState::Recovering)
                | (NodeState::Recovering, NodeState::Ready)
                | (NodeState::Ready, NodeState::Advancing)
                | (NodeState::Advancing, NodeState::Ready)
        );

        if !valid {
            return Err(DaemonError::InvalidTransition {
                from: self.current,
                to: new_state,
            });
        }

        tracing::info!("State transition: {} -> {}", self.current, new_state);
        self.current = new_state;
        Ok(())
    }
}

impl Default for NodeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_and_advance_cycle() {
        let mut sm = NodeStateMachine::new();
        sm.transition(NodeState::Recovering).unwrap();
        sm.transition(NodeState::Ready).unwrap();
        sm.transition(NodeState::Advancing).unwrap();
        sm.transition(NodeState::Ready).unwrap();
        assert_eq!(sm.current, NodeState::Ready);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut sm = NodeStateMachine::new();
        let err = sm.transition(NodeState::Advancing).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition: Initializing -> Advancing"
        );
        assert_eq!(sm.current, NodeState::Initializing);
    }

    #[test]
    fn test_shutdown_from_any_state() {
        let mut sm = NodeStateMachine::new();
        sm.transition(NodeState::ShuttingDown).unwrap();
        assert_eq!(sm.current, NodeState::ShuttingDown);
    }
}
