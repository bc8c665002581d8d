use crate::core::{Behavior, WindowId};
use crate::platform::{PlatformError, WindowManipulator};

/// A single behavior mutation on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Stick,
    Unstick,
    MakeAbove,
    UnmakeAbove,
}

impl Effect {
    /// Mutations needed to move a window from `current` to `desired`.
    /// Behaviors already in the desired state produce nothing.
    pub fn plan(current: Behavior, desired: Behavior) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);

        match (current.sticky, desired.sticky) {
            (false, true) => effects.push(Effect::Stick),
            (true, false) => effects.push(Effect::Unstick),
            _ => {}
        }

        match (current.above, desired.above) {
            (false, true) => effects.push(Effect::MakeAbove),
            (true, false) => effects.push(Effect::UnmakeAbove),
            _ => {}
        }

        effects
    }

    pub fn name(self) -> &'static str {
        match self {
            Effect::Stick => "stick",
            Effect::Unstick => "unstick",
            Effect::MakeAbove => "make above",
            Effect::UnmakeAbove => "unmake above",
        }
    }
}

/// Execute effects in order. A failing mutation is logged and the rest
/// still run; the errors are returned to the caller.
pub fn execute_effects<M: WindowManipulator>(
    manipulator: &M,
    window_id: WindowId,
    effects: &[Effect],
) -> Vec<PlatformError> {
    let mut errors = Vec::new();

    for &effect in effects {
        let result = match effect {
            Effect::Stick => manipulator.stick(window_id),
            Effect::Unstick => manipulator.unstick(window_id),
            Effect::MakeAbove => manipulator.make_above(window_id),
            Effect::UnmakeAbove => manipulator.unmake_above(window_id),
        };

        match result {
            Ok(()) => tracing::debug!("Applied {} to window {:#x}", effect.name(), window_id),
            Err(e) => {
                tracing::warn!(
                    "Failed to {} window {:#x}: {}",
                    effect.name(),
                    window_id,
                    e
                );
                errors.push(e);
            }
        }
    }

    errors
}
