//! State machine enums for the exo session and its control threads.
//!
//! All enums use `#[repr(u8)]` for compact memory layout and atomic
//! publication. Includes the session-wide coordination signals shared by
//! every thread and the per-thread lifecycle cell each control thread
//! publishes its state through.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::info;

// ─── Body Side ──────────────────────────────────────────────────────

/// Anatomical side an actuator is worn on.
///
/// Doubles as the index into all per-side arrays (`left = 0`, `right = 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    Left = 0,
    Right = 1,
}

/// Number of sides a session can drive.
pub const SIDE_COUNT: usize = 2;

impl Side {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }

    /// Array index for per-side storage.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase label used in file names, thread names and logs.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Both sides, in index order.
    #[inline]
    pub const fn both() -> [Self; SIDE_COUNT] {
        [Self::Left, Self::Right]
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            other => Err(format!("unknown side '{other}' (expected 'left' or 'right')")),
        }
    }
}

// ─── Session Mode ───────────────────────────────────────────────────

/// Session-wide operating mode, set by the operator or remote client.
///
/// Only one mode is active at any time. `Shutdown` is terminal for the
/// session — once requested it is never cleared back to another mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SessionMode {
    /// Threads alive, actuators paused at bias current.
    Standby = 0,
    /// Torque assistance active.
    Running = 1,
    /// Ordered teardown of every thread.
    Shutdown = 2,
}

impl SessionMode {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Standby),
            1 => Some(Self::Running),
            2 => Some(Self::Shutdown),
            _ => None,
        }
    }
}

impl Default for SessionMode {
    fn default() -> Self {
        Self::Standby
    }
}

// ─── Thread Lifecycle ───────────────────────────────────────────────

/// Lifecycle state of a single control thread.
///
/// Published through a [`LifecycleCell`] so the supervisor and remote
/// clients can observe progress without locking. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LifecycleState {
    /// One-time device bring-up and encoder zeroing.
    Calibrating = 0,
    /// Holding bias current, no torque commands.
    Paused = 1,
    /// Full torque pipeline running.
    Active = 2,
    /// Draining the final cycle and releasing the device.
    Stopping = 3,
    /// Thread exited.
    Stopped = 4,
}

impl LifecycleState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Calibrating),
            1 => Some(Self::Paused),
            2 => Some(Self::Active),
            3 => Some(Self::Stopping),
            4 => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Returns true once the thread can no longer produce cycles.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while the thread owns a live device handle.
    #[inline]
    pub const fn is_cycling(&self) -> bool {
        matches!(self, Self::Paused | Self::Active)
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::Calibrating
    }
}

// ─── Coordination Cells ─────────────────────────────────────────────

/// Point-in-time view of the session signals, taken once per cycle.
///
/// Control threads act on a snapshot so every decision within a cycle
/// sees one consistent mode even if the operator flips it mid-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub mode: SessionMode,
    pub log_enabled: bool,
}

/// Session-wide coordination signals shared by every thread.
///
/// Lock-free: writers are the supervisor, signal handlers and the remote
/// boundary; readers are the control threads at each cycle boundary.
#[derive(Debug)]
pub struct SessionSignals {
    mode: AtomicU8,
    log_enabled: AtomicBool,
}

impl SessionSignals {
    pub fn new() -> Self {
        Self {
            mode: AtomicU8::new(SessionMode::Standby as u8),
            log_enabled: AtomicBool::new(false),
        }
    }

    /// Current session mode.
    #[inline]
    pub fn mode(&self) -> SessionMode {
        // The cell only ever holds values written via `set_mode`.
        SessionMode::from_u8(self.mode.load(Ordering::SeqCst)).unwrap_or(SessionMode::Shutdown)
    }

    /// Set the session mode. Shutdown is sticky and cannot be revoked.
    pub fn set_mode(&self, mode: SessionMode) {
        let previous = self.mode();
        if previous == SessionMode::Shutdown && mode != SessionMode::Shutdown {
            return;
        }
        if previous != mode {
            info!("session mode: {:?} -> {:?}", previous, mode);
        }
        self.mode.store(mode as u8, Ordering::SeqCst);
    }

    /// Request ordered teardown of the whole session.
    pub fn request_shutdown(&self) {
        self.set_mode(SessionMode::Shutdown);
    }

    /// Returns true while threads are expected to keep cycling.
    #[inline]
    pub fn should_continue(&self) -> bool {
        self.mode() != SessionMode::Shutdown
    }

    /// Returns true while torque assistance is requested.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.mode() == SessionMode::Running
    }

    /// Whether per-cycle records should be appended to the sink.
    #[inline]
    pub fn log_enabled(&self) -> bool {
        self.log_enabled.load(Ordering::SeqCst)
    }

    /// Enable or disable record appending.
    pub fn set_log_enabled(&self, enabled: bool) {
        self.log_enabled.store(enabled, Ordering::SeqCst);
    }

    /// One consistent view for this cycle.
    #[inline]
    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            mode: self.mode(),
            log_enabled: self.log_enabled(),
        }
    }
}

impl Default for SessionSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Atomic cell a control thread publishes its [`LifecycleState`] through.
#[derive(Debug)]
pub struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Calibrating as u8))
    }

    /// Last state published by the owning thread.
    #[inline]
    pub fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::SeqCst)).unwrap_or(LifecycleState::Stopped)
    }

    /// Publish a new state. Only the owning thread writes here.
    #[inline]
    pub fn store(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Round-trip u8 → enum → u8 ──

    #[test]
    fn side_roundtrip() {
        for v in 0..=1u8 {
            let side = Side::from_u8(v).unwrap();
            assert_eq!(side as u8, v);
            assert_eq!(side.index(), v as usize);
        }
        assert!(Side::from_u8(2).is_none());
        assert!(Side::from_u8(255).is_none());
    }

    #[test]
    fn side_parses_labels() {
        assert_eq!("left".parse::<Side>().unwrap(), Side::Left);
        assert_eq!("Right".parse::<Side>().unwrap(), Side::Right);
        assert_eq!("r".parse::<Side>().unwrap(), Side::Right);
        assert!("center".parse::<Side>().is_err());
    }

    #[test]
    fn session_mode_roundtrip() {
        for v in 0..=2u8 {
            let mode = SessionMode::from_u8(v).unwrap();
            assert_eq!(mode as u8, v);
        }
        assert!(SessionMode::from_u8(3).is_none());
    }

    #[test]
    fn lifecycle_state_roundtrip() {
        for v in 0..=4u8 {
            let state = LifecycleState::from_u8(v).unwrap();
            assert_eq!(state as u8, v);
        }
        assert!(LifecycleState::from_u8(5).is_none());
    }

    #[test]
    fn lifecycle_state_predicates() {
        assert!(!LifecycleState::Calibrating.is_terminal());
        assert!(!LifecycleState::Stopping.is_terminal());
        assert!(LifecycleState::Stopped.is_terminal());
        assert!(LifecycleState::Paused.is_cycling());
        assert!(LifecycleState::Active.is_cycling());
        assert!(!LifecycleState::Calibrating.is_cycling());
        assert!(!LifecycleState::Stopped.is_cycling());
    }

    // ── Coordination cells ──

    #[test]
    fn signals_default_to_standby_without_logging() {
        let signals = SessionSignals::new();
        assert_eq!(signals.mode(), SessionMode::Standby);
        assert!(!signals.log_enabled());
        assert!(signals.should_continue());
        assert!(!signals.is_running());
    }

    #[test]
    fn signals_run_and_pause() {
        let signals = SessionSignals::new();
        signals.set_mode(SessionMode::Running);
        assert!(signals.is_running());
        signals.set_mode(SessionMode::Standby);
        assert!(!signals.is_running());
        assert!(signals.should_continue());
    }

    #[test]
    fn shutdown_is_sticky() {
        let signals = SessionSignals::new();
        signals.request_shutdown();
        assert_eq!(signals.mode(), SessionMode::Shutdown);
        assert!(!signals.should_continue());

        // A late Running request must not resurrect the session.
        signals.set_mode(SessionMode::Running);
        assert_eq!(signals.mode(), SessionMode::Shutdown);
    }

    #[test]
    fn snapshot_is_consistent_copy() {
        let signals = SessionSignals::new();
        signals.set_mode(SessionMode::Running);
        signals.set_log_enabled(true);
        let snap = signals.snapshot();
        assert_eq!(snap.mode, SessionMode::Running);
        assert!(snap.log_enabled);

        // Later writes do not alter an existing snapshot.
        signals.set_log_enabled(false);
        assert!(snap.log_enabled);
    }

    #[test]
    fn lifecycle_cell_publishes_states() {
        let cell = LifecycleCell::new();
        assert_eq!(cell.load(), LifecycleState::Calibrating);
        cell.store(LifecycleState::Active);
        assert_eq!(cell.load(), LifecycleState::Active);
        cell.store(LifecycleState::Stopped);
        assert!(cell.load().is_terminal());
    }
}
