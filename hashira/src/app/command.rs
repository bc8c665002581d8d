use crate::core::LifecycleCoordinator;
use crate::platform::{Timers, WindowManipulator, WindowSystem};
use crate::rules_store::RulesStore;
use hashira_ipc::{Command, Response, StateInfo, WindowInfo, WindowRule};

/// Handles one IPC command against the running coordinator. Rule edits are
/// persisted first and applied to every known window right away.
pub fn process_command<S, M, T>(
    coordinator: &mut LifecycleCoordinator<S, M, T>,
    rules_store: &RulesStore,
    cmd: &Command,
) -> Response
where
    S: WindowSystem,
    M: WindowManipulator,
    T: Timers,
{
    match cmd {
        Command::ListRules => Response::Rules {
            rules: coordinator.rules().to_vec(),
        },
        Command::AddRule { rule } => edit_rules(coordinator, rules_store, |rules| {
            rules.push(rule.clone());
            Ok(())
        }),
        Command::RemoveRule { index } => edit_rules(coordinator, rules_store, |rules| {
            check_index(*index, rules.len())?;
            let removed = rules.remove(*index);
            tracing::info!("Removing rule \"{}\"", removed.pattern);
            Ok(())
        }),
        Command::MoveRule { from, to } => edit_rules(coordinator, rules_store, |rules| {
            check_index(*from, rules.len())?;
            check_index(*to, rules.len())?;
            let rule = rules.remove(*from);
            rules.insert(*to, rule);
            Ok(())
        }),
        Command::Reload => match rules_store.load() {
            Ok(rules) => {
                coordinator.update_rules(rules);
                Response::Ok
            }
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },
        Command::ListWindows => Response::Windows {
            windows: list_windows(coordinator),
        },
        Command::GetState => {
            let store = coordinator.store();
            Response::State {
                state: StateInfo {
                    rule_count: coordinator.rules().len(),
                    tracked_windows: store.len(),
                    owned_windows: store.owned_count(),
                    pending_timers: coordinator.timers().pending(),
                },
            }
        }
        Command::Quit => {
            tracing::info!("Quit command received");
            Response::Ok
        }
    }
}

fn check_index(index: usize, len: usize) -> Result<(), String> {
    if index < len {
        Ok(())
    } else {
        Err(format!("Rule index {} out of range ({} rules)", index, len))
    }
}

fn edit_rules<S, M, T, F>(
    coordinator: &mut LifecycleCoordinator<S, M, T>,
    rules_store: &RulesStore,
    edit: F,
) -> Response
where
    S: WindowSystem,
    M: WindowManipulator,
    T: Timers,
    F: FnOnce(&mut Vec<WindowRule>) -> Result<(), String>,
{
    let mut rules = coordinator.rules().to_vec();
    if let Err(message) = edit(&mut rules) {
        return Response::Error { message };
    }
    if let Err(e) = rules_store.save(&rules) {
        tracing::warn!("Failed to save rules: {}", e);
        return Response::Error {
            message: e.to_string(),
        };
    }
    coordinator.update_rules(rules);
    Response::Ok
}

fn list_windows<S, M, T>(coordinator: &LifecycleCoordinator<S, M, T>) -> Vec<WindowInfo>
where
    S: WindowSystem,
    M: WindowManipulator,
    T: Timers,
{
    let store = coordinator.store();
    store
        .ids()
        .into_iter()
        .filter_map(|id| {
            let state = store.get(id)?;
            let info = coordinator.window_system().window_info(id);
            let behavior = info.as_ref().map(|i| i.behavior).unwrap_or_default();
            Some(WindowInfo {
                id,
                title: info.as_ref().and_then(|i| i.title.clone()),
                class: info.as_ref().and_then(|i| i.class.clone()),
                above: behavior.above,
                sticky: behavior.sticky,
                owns_behavior: state.owns_behavior,
                phase: state.phase.into(),
            })
        })
        .collect()
}
