use serde::{Deserialize, Serialize};
use std::fmt;

/// Network SDK initialization state (one per network, process wide)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitState {
    /// Nobody asked for the SDK yet
    NotStarted,
    /// The single init call has been issued
    InProgress,
    Success,
    Failed(String),
}

impl InitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitState::NotStarted => "NOT_STARTED",
            InitState::InProgress => "IN_PROGRESS",
            InitState::Success => "SUCCESS",
            InitState::Failed(_) => "FAILED",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: &InitState) -> bool {
        use InitState::*;

        matches!(
            (self, target),
            (NotStarted, InProgress) | (InProgress, Success) | (InProgress, Failed(_))
        )
    }

    /// Success and Failed are final for the process lifetime
    pub fn is_terminal(&self) -> bool {
        matches!(self, InitState::Success | InitState::Failed(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InitState::Success)
    }

    /// The outcome to hand to waiters, once there is one
    pub fn outcome(&self) -> Option<InitOutcome> {
        match self {
            InitState::Success => Some(InitOutcome::Success),
            InitState::Failed(reason) => Some(InitOutcome::Failed(reason.clone())),
            InitState::NotStarted | InitState::InProgress => None,
        }
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitState::Failed(reason) => write!(f, "{}({})", self.as_str(), reason),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

/// Terminal result of network initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitOutcome {
    Success,
    Failed(String),
}

impl InitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InitOutcome::Success)
    }
}

impl From<InitOutcome> for InitState {
    fn from(outcome: InitOutcome) -> Self {
        match outcome {
            InitOutcome::Success => InitState::Success,
            InitOutcome::Failed(reason) => InitState::Failed(reason),
        }
    }
}

/// Why a placement ended up in `Terminal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalReason {
    InitFailed,
    LoadFailed,
    ShowFailed,
    Closed,
}

impl TerminalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalReason::InitFailed => "INIT_FAILED",
            TerminalReason::LoadFailed => "LOAD_FAILED",
            TerminalReason::ShowFailed => "SHOW_FAILED",
            TerminalReason::Closed => "CLOSED",
        }
    }
}

/// Per-placement ad lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdUnitState {
    /// Registered, nothing in flight
    Idle,
    /// Waiting for network init to resolve
    AwaitingInit,
    /// Load issued for the current ad object
    Loading,
    /// Current ad object loaded and showable
    Ready,
    /// Show forwarded to the SDK
    Showing,
    Terminal(TerminalReason),
}

impl AdUnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdUnitState::Idle => "IDLE",
            AdUnitState::AwaitingInit => "AWAITING_INIT",
            AdUnitState::Loading => "LOADING",
            AdUnitState::Ready => "READY",
            AdUnitState::Showing => "SHOWING",
            AdUnitState::Terminal(_) => "TERMINAL",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: AdUnitState) -> bool {
        use AdUnitState::*;

        match (self, target) {
            // From Idle
            (Idle, AwaitingInit) => true,
            (Idle, Loading) => true,
            (Idle, Terminal(TerminalReason::InitFailed)) => true, // init already failed

            // From AwaitingInit
            (AwaitingInit, Idle) => true,    // init succeeded, nothing to load
            (AwaitingInit, Loading) => true, // init succeeded, deferred load
            (AwaitingInit, Terminal(TerminalReason::InitFailed)) => true,

            // From Loading
            (Loading, Loading) => true, // superseded by a newer load
            (Loading, Ready) => true,
            (Loading, Terminal(TerminalReason::LoadFailed)) => true,

            // From Ready
            (Ready, Showing) => true,
            (Ready, Loading) => true, // reload, e.g. a new bid
            (Ready, Idle) => true,    // ad expired

            // From Showing
            (Showing, Loading) => true, // load while show
            (Showing, Terminal(TerminalReason::Closed)) => true,
            (Showing, Terminal(TerminalReason::ShowFailed)) => true,

            // From Terminal
            (Terminal(TerminalReason::InitFailed), _) => false,
            (Terminal(_), Idle) => true,    // re-armed after close
            (Terminal(_), Loading) => true, // retry

            // All other transitions are invalid
            _ => false,
        }
    }

    /// Get valid next states from current state
    pub fn valid_transitions(&self) -> Vec<AdUnitState> {
        use AdUnitState::*;

        match self {
            Idle => vec![AwaitingInit, Loading, Terminal(TerminalReason::InitFailed)],
            AwaitingInit => vec![Idle, Loading, Terminal(TerminalReason::InitFailed)],
            Loading => vec![Loading, Ready, Terminal(TerminalReason::LoadFailed)],
            Ready => vec![Showing, Loading, Idle],
            Showing => vec![
                Loading,
                Terminal(TerminalReason::Closed),
                Terminal(TerminalReason::ShowFailed),
            ],
            Terminal(TerminalReason::InitFailed) => vec![],
            Terminal(_) => vec![Idle, Loading],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AdUnitState::Terminal(_))
    }

    /// Is a load or init pending for this placement?
    pub fn is_pending(&self) -> bool {
        matches!(self, AdUnitState::AwaitingInit | AdUnitState::Loading)
    }
}

impl fmt::Display for AdUnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdUnitState::Terminal(reason) => write!(f, "TERMINAL({})", reason.as_str()),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

/// State transition event (for logging/debugging)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: AdUnitState,
    pub to: AdUnitState,
    pub reason: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StateTransition {
    pub fn new(from: AdUnitState, to: AdUnitState, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}
