//! Per-thread lifecycle transitions.
//!
//! Each actuator thread owns one [`LifecycleMachine`] and publishes
//! every applied transition through its [`exo_common::state::LifecycleCell`].
//! The machine is the single place the legal state graph lives:
//! Calibrating → Paused ↔ Active → Stopping → Stopped, with a critical
//! fault path into Stopping from every live state. Events are derived
//! once per cycle from the session signal snapshot, so the thread never
//! acts on two modes within one cycle.

use exo_common::state::LifecycleState;

/// Result of a lifecycle transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition applied; the new state.
    Ok(LifecycleState),
    /// Transition rejected; reason.
    Rejected(&'static str),
}

/// Event that can move a control thread between lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Encoder zeroing finished and offsets are locked.
    ZeroingComplete,
    /// Session mode observed as Running while paused.
    Resume,
    /// Session mode observed as Standby while active.
    Pause,
    /// Session shutdown observed, ordered teardown begins.
    ShutdownRequested,
    /// A CRITICAL fault flag was raised this cycle.
    CriticalFault,
    /// Final cycle drained, motor stopped, device released.
    StopComplete,
}

/// Lifecycle state machine of one actuator control thread.
#[derive(Debug, Clone)]
pub struct LifecycleMachine {
    state: LifecycleState,
}

impl LifecycleMachine {
    /// New threads start in Calibrating.
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Calibrating,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> TransitionResult {
        use LifecycleEvent::*;
        use LifecycleState::*;

        let next = match (self.state, event) {
            // Zeroing hands over to the paused hold; the next cycle's
            // Resume promotes to Active if the session is already Running.
            (Calibrating, ZeroingComplete) => Paused,

            (Paused, Resume) => Active,
            (Active, Pause) => Paused,

            // Ordered teardown from every live state.
            (Calibrating, ShutdownRequested) => Stopping,
            (Paused, ShutdownRequested) => Stopping,
            (Active, ShutdownRequested) => Stopping,

            // Critical faults drain through the same stop path.
            (Calibrating, CriticalFault) => Stopping,
            (Paused, CriticalFault) => Stopping,
            (Active, CriticalFault) => Stopping,
            // Already draining; a second fault changes nothing.
            (Stopping, CriticalFault) => Stopping,

            (Stopping, StopComplete) => Stopped,

            _ => {
                return TransitionResult::Rejected(invalid_transition_reason(self.state, event));
            }
        };

        self.state = next;
        TransitionResult::Ok(next)
    }
}

impl Default for LifecycleMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_transition_reason(state: LifecycleState, event: LifecycleEvent) -> &'static str {
    use LifecycleEvent::*;
    use LifecycleState::*;
    match (state, event) {
        (Stopped, _) => "Stopped is terminal",
        (_, ZeroingComplete) => "zeroing can only complete from Calibrating",
        (_, StopComplete) => "stop can only complete from Stopping",
        (Calibrating, _) => "Calibrating: only zeroing completion or teardown",
        (Stopping, _) => "Stopping: only stop completion",
        (Paused, _) => "Paused: invalid event for current state",
        (Active, _) => "Active: invalid event for current state",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
