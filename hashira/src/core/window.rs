use crate::platform::{SubscriptionId, TimerId};
use hashira_ipc::{WindowPhase, WindowRule};

pub type WindowId = u32;
pub type WorkspaceId = u32;

/// Workspace value used by windows shown on every workspace.
pub const ALL_WORKSPACES: WorkspaceId = u32::MAX;

/// The two window behaviors managed by rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Behavior {
    pub above: bool,
    pub sticky: bool,
}

impl Behavior {
    pub const NONE: Behavior = Behavior {
        above: false,
        sticky: false,
    };

    pub fn new(above: bool, sticky: bool) -> Self {
        Self { above, sticky }
    }

    pub fn from_rule(rule: &WindowRule) -> Self {
        Self {
            above: rule.above,
            sticky: rule.sticky,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Observed and subscribed, not evaluated yet.
    Tracked,
    /// A delayed evaluation is pending.
    Debounced,
    Reconciled,
}

impl From<Phase> for WindowPhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Tracked => WindowPhase::Tracked,
            Phase::Debounced => WindowPhase::Debounced,
            Phase::Reconciled => WindowPhase::Reconciled,
        }
    }
}

/// Per-window bookkeeping. Never holds the window itself, only handles
/// issued by the platform for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub subscription: Option<SubscriptionId>,
    pub debounce: Option<TimerId>,
    /// True while the last applied rule's behavior is ours to retract.
    pub owns_behavior: bool,
    pub phase: Phase,
}

impl WindowState {
    pub fn new(subscription: SubscriptionId) -> Self {
        Self {
            subscription: Some(subscription),
            debounce: None,
            owns_behavior: false,
            phase: Phase::Tracked,
        }
    }
}
