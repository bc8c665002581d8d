use serde::{Deserialize, Serialize};

use crate::rule::WindowRule;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Rule operations
    ListRules,
    AddRule { rule: WindowRule },
    RemoveRule { index: usize },
    MoveRule { from: usize, to: usize },
    Reload,

    // Queries
    ListWindows,
    GetState,

    // Control
    Quit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Rules { rules: Vec<WindowRule> },
    Windows { windows: Vec<WindowInfo> },
    State { state: StateInfo },
}

/// Lifecycle phase of a tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    Tracked,
    Debounced,
    Reconciled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: u32,
    pub title: Option<String>,
    pub class: Option<String>,
    pub above: bool,
    pub sticky: bool,
    pub owns_behavior: bool,
    pub phase: WindowPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateInfo {
    pub rule_count: usize,
    pub tracked_windows: usize,
    pub owned_windows: usize,
    pub pending_timers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::MatchField;

    #[test]
    fn test_command_list_rules_serialization() {
        let json = serde_json::to_string(&Command::ListRules).unwrap();
        assert_eq!(json, "{\"type\":\"list_rules\"}");
    }

    #[test]
    fn test_command_add_rule_serialization() {
        let cmd = Command::AddRule {
            rule: WindowRule::new("^Calculator$", MatchField::Title, false, true),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"add_rule\""));

        let deserialized: Command = serde_json::from_str(&json).unwrap();
        match deserialized {
            Command::AddRule { rule } => {
                assert_eq!(rule.pattern, "^Calculator$");
                assert_eq!(rule.field, MatchField::Title);
                assert!(rule.above);
                assert!(!rule.sticky);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_command_move_rule_serialization() {
        let cmd = Command::MoveRule { from: 2, to: 0 };
        let json = serde_json::to_string(&cmd).unwrap();

        let deserialized: Command = serde_json::from_str(&json).unwrap();
        match deserialized {
            Command::MoveRule { from, to } => {
                assert_eq!(from, 2);
                assert_eq!(to, 0);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_response_ok_serialization() {
        let resp = Response::Ok;
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, "{\"type\":\"ok\"}");

        let deserialized: Response = serde_json::from_str(&json).unwrap();
        assert!(matches!(deserialized, Response::Ok));
    }

    #[test]
    fn test_response_error_serialization() {
        let resp = Response::Error {
            message: "rule index 4 out of range".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();

        let deserialized: Response = serde_json::from_str(&json).unwrap();
        match deserialized {
            Response::Error { message } => assert_eq!(message, "rule index 4 out of range"),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_response_windows_serialization() {
        let resp = Response::Windows {
            windows: vec![WindowInfo {
                id: 0x0240_0007,
                title: Some("Calculator".to_string()),
                class: None,
                above: true,
                sticky: false,
                owns_behavior: true,
                phase: WindowPhase::Reconciled,
            }],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"phase\":\"reconciled\""));

        let deserialized: Response = serde_json::from_str(&json).unwrap();
        match deserialized {
            Response::Windows { windows } => {
                assert_eq!(windows.len(), 1);
                assert_eq!(windows[0].title.as_deref(), Some("Calculator"));
                assert!(windows[0].class.is_none());
                assert!(windows[0].owns_behavior);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_response_state_serialization() {
        let resp = Response::State {
            state: StateInfo {
                rule_count: 3,
                tracked_windows: 7,
                owned_windows: 2,
                pending_timers: 1,
            },
        };
        let json = serde_json::to_string(&resp).unwrap();

        let deserialized: Response = serde_json::from_str(&json).unwrap();
        match deserialized {
            Response::State { state } => {
                assert_eq!(state.rule_count, 3);
                assert_eq!(state.tracked_windows, 7);
                assert_eq!(state.owned_windows, 2);
                assert_eq!(state.pending_timers, 1);
            }
            _ => panic!("Wrong variant"),
        }
    }
}
